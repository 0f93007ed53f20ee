//! Clip lifecycle control
//!
//! Decides which of an agent's clips is playing and for how long. At most
//! one clip is active at a time: activating a clip silences the previous one,
//! since overlapping clips would fight over the same skeletal channels.

use rustc_hash::FxHashMap;

use super::clip::{Clip, ClipId, ClipSet};

/// Playback state of a single clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Clip is playing
    Playing,
    /// Clip was playing and has been silenced
    Paused,
    /// Clip has never been started
    #[default]
    Stopped,
}

/// How long the active clip should run before it counts as finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipDuration {
    /// Finished once elapsed time exceeds this many seconds
    Fixed(f32),
    /// Never finishes by time; ended by the owner (movement clips)
    Unbounded,
}

/// Per-clip playback channel, as seen by the renderer
#[derive(Debug, Clone, Copy, Default)]
struct Track {
    state: PlaybackState,
    /// Play position in seconds
    position: f32,
    /// Blend weight (0 = silent)
    weight: f32,
}

/// Controller owning an agent's clips and the single active one
#[derive(Debug)]
pub struct ClipController {
    /// Available clips
    clips: ClipSet,
    /// Playback channel per clip that has ever been started
    tracks: FxHashMap<ClipId, Track>,
    /// Currently active clip
    active: Option<ClipId>,
    /// Seconds since the active clip was activated
    elapsed: f32,
    /// Nominal duration of the active clip
    duration: ClipDuration,
    /// Whether completion has been reported for this activation
    completed: bool,
}

impl ClipController {
    /// Create a controller with nothing playing
    #[must_use]
    pub fn new(clips: ClipSet) -> Self {
        Self {
            clips,
            tracks: FxHashMap::default(),
            active: None,
            elapsed: 0.0,
            duration: ClipDuration::Unbounded,
            completed: false,
        }
    }

    /// Make `id` the only active clip, restarting its timer.
    ///
    /// Returns `false` (and changes nothing) if the set has no such clip.
    pub fn activate(&mut self, id: ClipId, duration: ClipDuration) -> bool {
        if self.clips.get(id).is_none() {
            return false;
        }

        self.deactivate();

        let track = self.tracks.entry(id).or_default();
        track.state = PlaybackState::Playing;
        track.position = 0.0;
        track.weight = 1.0;

        self.active = Some(id);
        self.elapsed = 0.0;
        self.duration = duration;
        self.completed = false;
        true
    }

    /// Pause and zero the active clip. Returns the clip that was active.
    pub fn deactivate(&mut self) -> Option<ClipId> {
        let id = self.active.take()?;

        if let Some(track) = self.tracks.get_mut(&id) {
            track.state = PlaybackState::Paused;
            track.position = 0.0;
            track.weight = 0.0;
        }

        self.elapsed = 0.0;
        self.completed = false;
        Some(id)
    }

    /// Advance the active clip.
    ///
    /// Returns `true` exactly once per activation: on the first tick where
    /// elapsed time exceeds a fixed duration. Unbounded clips never report.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(id) = self.active else {
            return false;
        };

        let speed = self.clips.get(id).map_or(1.0, |clip| clip.speed);
        if let Some(track) = self.tracks.get_mut(&id) {
            track.position += dt * speed;
        }

        let ClipDuration::Fixed(limit) = self.duration else {
            return false;
        };

        if self.completed {
            return false;
        }

        self.elapsed += dt;
        if self.elapsed > limit {
            self.completed = true;
            return true;
        }
        false
    }

    /// Check if a clip is active and has not yet reported completion
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.active.is_some() && !self.completed
    }

    /// Get the active clip id
    #[must_use]
    pub const fn active(&self) -> Option<ClipId> {
        self.active
    }

    /// Get the active clip
    #[must_use]
    pub fn active_clip(&self) -> Option<&Clip> {
        self.active.and_then(|id| self.clips.get(id))
    }

    /// Number of clips currently in the playing state
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.tracks
            .values()
            .filter(|track| track.state == PlaybackState::Playing)
            .count()
    }

    /// Get the playback state of a clip
    #[must_use]
    pub fn state_of(&self, id: ClipId) -> PlaybackState {
        self.tracks.get(&id).map_or(PlaybackState::Stopped, |track| track.state)
    }

    /// Get the blend weight of a clip
    #[must_use]
    pub fn weight_of(&self, id: ClipId) -> f32 {
        self.tracks.get(&id).map_or(0.0, |track| track.weight)
    }

    /// Get the play position of a clip in seconds
    #[must_use]
    pub fn position_of(&self, id: ClipId) -> f32 {
        self.tracks.get(&id).map_or(0.0, |track| track.position)
    }

    /// Seconds since the active clip was activated
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Nominal duration of the active clip
    #[must_use]
    pub const fn duration(&self) -> ClipDuration {
        self.duration
    }

    /// Get the clip set
    #[must_use]
    pub fn clips(&self) -> &ClipSet {
        &self.clips
    }
}

impl Default for ClipController {
    fn default() -> Self {
        Self::new(ClipSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_activate_sets_single_active() {
        let mut controller = ClipController::default();

        assert!(controller.activate(ClipId::Idle(0), ClipDuration::Fixed(8.0)));
        assert_eq!(controller.active(), Some(ClipId::Idle(0)));
        assert_eq!(controller.state_of(ClipId::Idle(0)), PlaybackState::Playing);
        assert_eq!(controller.weight_of(ClipId::Idle(0)), 1.0);

        assert!(controller.activate(ClipId::Walk, ClipDuration::Unbounded));
        assert_eq!(controller.active(), Some(ClipId::Walk));
        assert_eq!(controller.state_of(ClipId::Idle(0)), PlaybackState::Paused);
        assert_eq!(controller.weight_of(ClipId::Idle(0)), 0.0);
        assert_eq!(controller.playing_count(), 1);
    }

    #[test]
    fn test_activate_unknown_clip() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Run, ClipDuration::Unbounded);

        assert!(!controller.activate(ClipId::Idle(9), ClipDuration::Fixed(1.0)));
        assert_eq!(controller.active(), Some(ClipId::Run));
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Attack, ClipDuration::Fixed(5.0));
        controller.tick(1.0);

        assert_eq!(controller.deactivate(), Some(ClipId::Attack));
        assert_eq!(controller.deactivate(), None);
        assert_eq!(controller.state_of(ClipId::Attack), PlaybackState::Paused);
        assert_eq!(controller.position_of(ClipId::Attack), 0.0);
        assert_eq!(controller.playing_count(), 0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_completion_fires_once() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Attack, ClipDuration::Fixed(1.0));

        assert!(!controller.tick(0.5));
        assert!(!controller.tick(0.5)); // exactly at the limit, not past it
        assert!(controller.tick(0.25));
        assert!(!controller.is_animating());
        assert!(!controller.tick(0.25));
        assert!(!controller.tick(10.0));
    }

    #[test]
    fn test_reactivation_rearms_completion() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Idle(1), ClipDuration::Fixed(0.5));
        assert!(controller.tick(1.0));

        controller.activate(ClipId::Idle(1), ClipDuration::Fixed(0.5));
        assert!(controller.is_animating());
        assert_eq!(controller.elapsed(), 0.0);
        assert!(controller.tick(1.0));
    }

    #[test]
    fn test_unbounded_never_completes() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Run, ClipDuration::Unbounded);

        for _ in 0..100 {
            assert!(!controller.tick(1.0));
        }
        assert!(controller.is_animating());
        assert!(controller.position_of(ClipId::Run) > 0.0);
    }

    #[test]
    fn test_idle_position_uses_clip_speed() {
        let mut controller = ClipController::default();
        controller.activate(ClipId::Idle(0), ClipDuration::Fixed(8.0));
        controller.tick(1.0);

        assert!((controller.position_of(ClipId::Idle(0)) - 0.8).abs() < 1e-5);
        assert!((controller.elapsed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_at_most_one_playing() {
        let mut controller = ClipController::default();
        let ids: Vec<_> = controller.clips().ids().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..1000 {
            match rng.gen_range(0..3) {
                0 => {
                    let id = ids[rng.gen_range(0..ids.len())];
                    controller.activate(id, ClipDuration::Fixed(1.0));
                }
                1 => {
                    controller.deactivate();
                }
                _ => {
                    controller.tick(0.3);
                }
            }
            assert!(controller.playing_count() <= 1);
            assert_eq!(controller.playing_count(), usize::from(controller.active().is_some()));
        }
    }
}
