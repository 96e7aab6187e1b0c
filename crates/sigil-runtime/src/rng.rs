//! Lightweight xorshift32 PRNG shared by every activation

use glam::Vec3;
use sigil_core::Rgba;

#[derive(Debug, Clone)]
pub struct EffectRng {
    state: u32,
}

impl EffectRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits keep the result strictly below one
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Integer in `[0, bound)`; zero when `bound <= 0`
    pub fn below(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        (self.next_u32() % bound as u32) as i32
    }

    /// Uniform draw in `[0, variance]` frames, as used for interval and age variance
    pub fn variance(&mut self, variance: u16) -> f32 {
        if variance == 0 {
            return 0.0;
        }
        self.below(variance as i32 + 1) as f32
    }

    /// Symmetric jitter in `[-extent, extent)` per axis
    pub fn jitter(&mut self, extent: Vec3) -> Vec3 {
        Vec3::new(
            self.range(-extent.x, extent.x),
            self.range(-extent.y, extent.y),
            self.range(-extent.z, extent.z),
        )
    }

    /// Symmetric jitter per color channel
    pub fn jitter_color(&mut self, extent: Rgba) -> Rgba {
        Rgba::new(
            self.range(-extent.r, extent.r),
            self.range(-extent.g, extent.g),
            self.range(-extent.b, extent.b),
            self.range(-extent.a, extent.a),
        )
    }

    /// Returns a random unit direction vector (uniformly on sphere surface)
    pub fn random_direction(&mut self) -> Vec3 {
        // Marsaglia method for uniform sphere sampling
        loop {
            let x = self.range(-1.0, 1.0);
            let y = self.range(-1.0, 1.0);
            let s = x * x + y * y;
            if s < 1.0 {
                let factor = 2.0 * (1.0 - s).sqrt();
                return Vec3::new(x * factor, y * factor, 1.0 - 2.0 * s);
            }
        }
    }

    /// Point uniformly inside a sphere of `radius`
    pub fn in_sphere(&mut self, radius: f32) -> Vec3 {
        self.random_direction() * self.next_f32().cbrt() * radius
    }
}
