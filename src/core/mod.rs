//! Core module
//!
//! The herd driver that ticks agents, the outbound event queue, and herd
//! configuration files.

mod config;
mod driver;
mod events;

pub use config::{AgentConfig, ConfigError, HERD_VERSION, HerdConfig};
pub use driver::{Herd, Viewer};
pub use events::{AgentEvent, EventKind, EventQueue};
