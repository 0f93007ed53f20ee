//! Common ECS components

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Horizontal distance below which an agent keeps its current heading
const MIN_FACING_DISTANCE: f32 = 1e-4;

/// Transform component for position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Transform {
    /// Create a new transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set a uniform scale
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Get the forward direction (negative Z in local space)
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Turn about the vertical axis so that forward points at `target`.
    ///
    /// Height differences are ignored; agents stay upright. Does nothing when
    /// the target is directly above or below.
    pub fn face_towards(&mut self, target: Vec3) {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        if dx * dx + dz * dz < MIN_FACING_DISTANCE * MIN_FACING_DISTANCE {
            return;
        }
        self.rotation = Quat::from_rotation_y(f32::atan2(-dx, -dz));
    }

    /// Heading about the vertical axis in radians (0 = facing -Z)
    #[must_use]
    pub fn yaw(&self) -> f32 {
        let forward = self.forward();
        f32::atan2(-forward.x, -forward.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Name component for lookup and logging
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_transform_default() {
        let t = Transform::new();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(approx(t.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_transform_with_scale() {
        let t = Transform::from_position(Vec3::X).with_scale(0.01);
        assert_eq!(t.position, Vec3::X);
        assert_eq!(t.scale, Vec3::splat(0.01));
    }

    #[test]
    fn test_face_towards_cardinal_directions() {
        let mut t = Transform::new();

        t.face_towards(Vec3::new(5.0, 0.0, 0.0));
        assert!(approx(t.forward(), Vec3::X));

        t.face_towards(Vec3::new(0.0, 0.0, 3.0));
        assert!(approx(t.forward(), Vec3::Z));

        t.face_towards(Vec3::new(-2.0, 0.0, 0.0));
        assert!(approx(t.forward(), Vec3::NEG_X));
    }

    #[test]
    fn test_face_towards_ignores_height() {
        let mut t = Transform::from_position(Vec3::new(1.0, 0.0, 1.0));
        t.face_towards(Vec3::new(1.0, 10.0, -4.0));

        assert!(approx(t.forward(), Vec3::NEG_Z));
        assert!(t.forward().y.abs() < 1e-5);
    }

    #[test]
    fn test_face_towards_same_spot_keeps_heading() {
        let mut t = Transform::new();
        t.face_towards(Vec3::X);
        let before = t.rotation;

        t.face_towards(Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(t.rotation, before);
        t.face_towards(Vec3::ZERO);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn test_yaw() {
        let mut t = Transform::new();
        assert!(t.yaw().abs() < 1e-5);

        t.face_towards(Vec3::new(-1.0, 0.0, 0.0));
        assert!((t.yaw() - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_name_display() {
        let name = Name::new("rabbit_1");
        assert_eq!(name.to_string(), "rabbit_1");
        assert_eq!(name.as_str(), "rabbit_1");
    }
}
