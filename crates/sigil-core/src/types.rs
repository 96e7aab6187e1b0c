//! Color type shared by effects and particles

use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// RGBA color with float channels in `[0, 1]`.
///
/// Instruction streams pack colors as four bytes; `from_packed` unpacks them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a little-endian word laid out as bytes `r, g, b, a`.
    pub fn from_packed(word: u32) -> Self {
        let [r, g, b, a] = word.to_le_bytes();
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub fn to_packed(&self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        u32::from_le_bytes([q(self.r), q(self.g), q(self.b), q(self.a)])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn clamped(&self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Mul for Rgba {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Self {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_roundtrip_channels() {
        let c = Rgba::from_packed(u32::from_le_bytes([255, 128, 0, 64]));
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.502).abs() < 0.01);
        assert!(c.b.abs() < 0.01);
        assert!((c.a - 0.251).abs() < 0.01);
        assert_eq!(c.to_packed().to_le_bytes(), [255, 128, 0, 64]);
    }

    #[test]
    fn test_multiply_and_lerp() {
        let half = Rgba::new(0.5, 0.5, 0.5, 0.5);
        let m = Rgba::WHITE * half;
        assert_eq!(m, half);
        let mid = Rgba::TRANSPARENT.lerp(&Rgba::WHITE, 0.25);
        assert!((mid.a - 0.25).abs() < 1e-6);
    }
}
