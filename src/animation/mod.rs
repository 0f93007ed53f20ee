//! Animation module
//!
//! Decides which clip an agent should be playing and for how long. Actual
//! playback (keyframes, skinning, blending) belongs to the renderer.

mod clip;
mod controller;

pub use clip::{Clip, ClipId, ClipSet, DEFAULT_IDLE_CLIPS, IDLE_CLIP_SPEED, Playback};
pub use controller::{ClipController, ClipDuration, PlaybackState};
