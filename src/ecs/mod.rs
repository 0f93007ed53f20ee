//! Entity Component System module
//!
//! Agents live in a hecs world; these are the plain components they carry
//! besides their behavior state.

mod components;

pub use components::{Name, Transform};
