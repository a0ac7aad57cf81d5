//! Mathematical types shared between controller and host.
//!
//! These are the canonical representations used in every payload.

use serde::{Deserialize, Serialize};

/// 3D Vector - location, velocity, direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
}

/// Euler rotation in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    /// Pitch
    pub pitch: f32,
    /// Yaw
    pub yaw: f32,
    /// Roll
    pub roll: f32,
}

/// RGBA colour used by debug rendering.
///
/// The default is fully transparent black.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Creates a colour from all four channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Fully transparent
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Black
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// White
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Grey
    pub const GREY: Self = Self::rgb(128, 128, 128);
    /// Blue
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Red
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Green
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    /// Lime
    pub const LIME: Self = Self::rgb(0, 255, 0);
    /// Yellow
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    /// Orange
    pub const ORANGE: Self = Self::rgb(225, 128, 0);
    /// Cyan
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    /// Pink
    pub const PINK: Self = Self::rgb(255, 0, 255);
    /// Purple
    pub const PURPLE: Self = Self::rgb(128, 0, 128);
    /// Teal
    pub const TEAL: Self = Self::rgb(0, 128, 128);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_constructor() {
        assert_eq!(Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(Vec3::default(), Vec3::ZERO);
    }

    #[test]
    fn test_color_defaults() {
        assert_eq!(Color::default(), Color::TRANSPARENT);
        assert_eq!(Color::GREY.a, 255);
        assert_eq!(Color::rgb(1, 2, 3), Color::rgba(1, 2, 3, 255));
    }
}
