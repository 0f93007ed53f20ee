//! Headless herd demo
//!
//! Loads a herd file and runs it at a fixed 60 Hz with a scripted viewer
//! strolling through the meadow. Set `RUST_LOG=debug` to watch individual
//! decisions.
//!
//! Usage: `fauna [HERD] [SECONDS]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fauna::prelude::*;

const STEP: f32 = 1.0 / 60.0;
const SUMMARY_EVERY: u64 = 600;

/// Run a herd file headless with a strolling viewer
#[derive(Parser)]
#[command(name = "fauna")]
#[command(about = "Headless herd demo", long_about = None)]
#[command(version)]
struct Args {
    /// Herd file (.ron or .json)
    #[arg(default_value = "demos/meadow.ron")]
    herd: PathBuf,

    /// Simulated seconds to run
    #[arg(default_value_t = 120.0, value_parser = positive_seconds)]
    seconds: f32,
}

fn positive_seconds(arg: &str) -> Result<f32, String> {
    match arg.parse::<f32>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        Ok(_) => Err(format!("{arg} is not a positive number")),
        Err(e) => Err(e.to_string()),
    }
}

/// Viewer walking a fixed route at constant speed, then standing still
struct Stroll {
    route: Vec<Vec3>,
    speed: f32,
    walked: f32,
}

impl Stroll {
    fn through_meadow() -> Self {
        Self {
            route: vec![
                Vec3::new(-40.0, 1.7, 20.0),
                Vec3::new(-21.0, 1.7, 36.0),
                Vec3::new(-15.0, 1.7, 42.0),
                Vec3::new(10.0, 1.7, 30.0),
                Vec3::new(30.0, 1.7, 10.0),
            ],
            speed: 1.4,
            walked: 0.0,
        }
    }

    fn advance(&mut self, dt: f32) {
        self.walked += self.speed * dt;
    }
}

impl Viewer for Stroll {
    fn position(&self) -> Vec3 {
        let mut left = self.walked;
        for leg in self.route.windows(2) {
            let length = leg[0].distance(leg[1]);
            if left <= length {
                return leg[0].lerp(leg[1], left / length);
            }
            left -= length;
        }
        self.route.last().copied().unwrap_or(Vec3::ZERO)
    }
}

fn summarize(herd: &Herd) {
    for &entity in herd.handles() {
        if let Some(agent) = herd.get(entity) {
            log::info!(
                "  {:<8} {:<9} at {:.1}",
                agent.name(),
                agent.activity().to_string(),
                agent.position()
            );
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let path = args.herd.display();
    let seconds = args.seconds;

    let config = match HerdConfig::load(&args.herd) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut herd = match Herd::from_config(&config) {
        Ok(herd) => herd,
        Err(e) => {
            log::error!("Failed to build herd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut viewer = Stroll::through_meadow();
    let frames = (seconds / STEP).ceil() as u64;
    let poke_at = frames / 2;
    let mut threats = 0;
    let mut arrivals = 0;

    log::info!("Running '{}' for {seconds} s ({frames} frames)", config.name);

    for frame in 0..frames {
        if frame == poke_at
            && let Some(cat) = herd.find("cat1")
        {
            log::info!("Poking cat1");
            herd.click(cat);
        }

        viewer.advance(STEP);
        herd.tick(STEP, &viewer);

        for event in herd.drain_events() {
            match event.kind {
                EventKind::Threatened { viewer } => {
                    threats += 1;
                    log::info!("{:?} spooked by viewer at {viewer:.1}", event.agent);
                }
                EventKind::Arrived { .. } => arrivals += 1,
                _ => {}
            }
        }

        if herd.frame() % SUMMARY_EVERY == 0 {
            log::info!("t = {:.0} s", herd.frame() as f32 * STEP);
            summarize(&herd);
        }
    }

    log::info!("Done: {arrivals} arrivals, {threats} threats");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_seconds() {
        assert_eq!(positive_seconds("2.5"), Ok(2.5));
        assert!(positive_seconds("0").is_err());
        assert!(positive_seconds("-3").is_err());
        assert!(positive_seconds("inf").is_err());
        assert!(positive_seconds("soon").is_err());
    }

    #[test]
    fn test_args_defaults_and_overrides() {
        let args = Args::try_parse_from(["fauna"]).unwrap();
        assert_eq!(args.herd, PathBuf::from("demos/meadow.ron"));
        assert_eq!(args.seconds, 120.0);

        let args = Args::try_parse_from(["fauna", "pond.json", "30"]).unwrap();
        assert_eq!(args.herd, PathBuf::from("pond.json"));
        assert_eq!(args.seconds, 30.0);

        assert!(Args::try_parse_from(["fauna", "pond.json", "-1"]).is_err());
    }
}
