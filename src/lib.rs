//! Autonomous agent behavior for real-time 3D scenes
//!
//! This crate provides:
//! - A generic guarded state machine with wildcard edges and re-entrant actions
//! - Waypoint navigation (random without repeats, or sequential)
//! - Clip lifecycle control with a single active clip per agent
//! - Behavior agents that idle, wander, flee from the viewer and attack
//! - A herd driver over a hecs world, with RON/JSON herd files
//!
//! Rendering and clip playback are left to the host: the agents only decide
//! which clip should play, for how long, and where they stand.

pub mod ai;
pub mod animation;
pub mod core;
pub mod ecs;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{Activity, Agent, AgentParams, Navigator, StateMachine, Traversal};
    pub use crate::animation::{ClipController, ClipDuration, ClipId, ClipSet};
    pub use crate::core::{
        AgentConfig, AgentEvent, ConfigError, EventKind, Herd, HerdConfig, Viewer,
    };
    pub use crate::ecs::{Name, Transform};
    pub use glam::{Quat, Vec3};
}
