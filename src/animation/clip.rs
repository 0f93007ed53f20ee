//! Animation clips
//!
//! Named clip requests for an agent's model. Keyframe data and playback
//! live in the renderer; here a clip is just what to play and how.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Idle clip names used when a model declares none
pub const DEFAULT_IDLE_CLIPS: [&str; 2] = ["idle_1", "idle_2"];

/// Playback speed for idle clips
pub const IDLE_CLIP_SPEED: f32 = 0.8;

/// How a clip behaves when it reaches its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Playback {
    /// Restart from the beginning
    #[default]
    Looping,
    /// Play once and hold
    OneShot,
}

/// A named animation clip on a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Clip name as stored in the model
    pub name: String,
    /// Loop or one-shot
    pub playback: Playback,
    /// Playback speed multiplier
    pub speed: f32,
}

impl Clip {
    /// Create a new clip at normal speed
    #[must_use]
    pub fn new(name: impl Into<String>, playback: Playback) -> Self {
        Self {
            name: name.into(),
            playback,
            speed: 1.0,
        }
    }

    /// Create a looping clip
    #[must_use]
    pub fn looping(name: impl Into<String>) -> Self {
        Self::new(name, Playback::Looping)
    }

    /// Create a one-shot clip
    #[must_use]
    pub fn one_shot(name: impl Into<String>) -> Self {
        Self::new(name, Playback::OneShot)
    }

    /// Set the playback speed
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Check if the clip loops
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.playback == Playback::Looping
    }
}

/// Identifies a clip within a [`ClipSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipId {
    /// One of the idle variants
    Idle(usize),
    /// Walk cycle
    Walk,
    /// Run cycle
    Run,
    /// Attack
    Attack,
}

/// Every clip an agent can play
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSet {
    idle: SmallVec<[Clip; 4]>,
    walk: Clip,
    run: Clip,
    attack: Clip,
}

impl ClipSet {
    /// Build the standard set for a model whose clips share a name prefix
    /// (e.g. `"Cat_arm|"`).
    ///
    /// Falls back to [`DEFAULT_IDLE_CLIPS`] when `idle_names` is empty.
    #[must_use]
    pub fn with_prefix<N: AsRef<str>>(prefix: &str, idle_names: &[N]) -> Self {
        let idle = if idle_names.is_empty() {
            DEFAULT_IDLE_CLIPS
                .iter()
                .map(|name| Self::idle_clip(prefix, name))
                .collect()
        } else {
            idle_names
                .iter()
                .map(|name| Self::idle_clip(prefix, name.as_ref()))
                .collect()
        };

        Self {
            idle,
            walk: Clip::looping(format!("{prefix}walk")),
            run: Clip::looping(format!("{prefix}run")),
            attack: Clip::one_shot(format!("{prefix}attack")),
        }
    }

    fn idle_clip(prefix: &str, name: &str) -> Clip {
        Clip::looping(format!("{prefix}{name}")).with_speed(IDLE_CLIP_SPEED)
    }

    /// Look up a clip
    #[must_use]
    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        match id {
            ClipId::Idle(index) => self.idle.get(index),
            ClipId::Walk => Some(&self.walk),
            ClipId::Run => Some(&self.run),
            ClipId::Attack => Some(&self.attack),
        }
    }

    /// Number of idle variants (always at least one)
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Iterate over every clip id in the set
    pub fn ids(&self) -> impl Iterator<Item = ClipId> + '_ {
        (0..self.idle.len())
            .map(ClipId::Idle)
            .chain([ClipId::Walk, ClipId::Run, ClipId::Attack])
    }
}

impl Default for ClipSet {
    fn default() -> Self {
        Self::with_prefix::<&str>("", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_set_prefix() {
        let clips = ClipSet::with_prefix("Arm_rabbit|", &["idle_1", "eat"]);

        assert_eq!(clips.idle_count(), 2);
        assert_eq!(clips.get(ClipId::Idle(1)).unwrap().name, "Arm_rabbit|eat");
        assert_eq!(clips.get(ClipId::Walk).unwrap().name, "Arm_rabbit|walk");
        assert_eq!(clips.get(ClipId::Run).unwrap().name, "Arm_rabbit|run");
        assert_eq!(clips.get(ClipId::Attack).unwrap().name, "Arm_rabbit|attack");
        assert!(clips.get(ClipId::Idle(2)).is_none());
    }

    #[test]
    fn test_clip_set_default_idles() {
        let clips = ClipSet::with_prefix::<String>("cat|", &[]);

        assert_eq!(clips.idle_count(), 2);
        assert_eq!(clips.get(ClipId::Idle(0)).unwrap().name, "cat|idle_1");
        assert_eq!(clips.get(ClipId::Idle(1)).unwrap().name, "cat|idle_2");
    }

    #[test]
    fn test_clip_playback_kinds() {
        let clips = ClipSet::default();

        assert!(clips.get(ClipId::Walk).unwrap().is_looping());
        assert!(clips.get(ClipId::Run).unwrap().is_looping());
        assert!(!clips.get(ClipId::Attack).unwrap().is_looping());

        let idle = clips.get(ClipId::Idle(0)).unwrap();
        assert!(idle.is_looping());
        assert!((idle.speed - IDLE_CLIP_SPEED).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clip_ids() {
        let clips = ClipSet::with_prefix("", &["a", "b", "c"]);
        let ids: Vec<_> = clips.ids().collect();

        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0], ClipId::Idle(0));
        assert_eq!(ids[5], ClipId::Attack);
    }
}
