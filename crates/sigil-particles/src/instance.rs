//! GPU instance packing for live particles

use crate::particle::Particle;
use bytemuck::{Pod, Zeroable};

/// One rendered particle, 64 bytes as four vec4 rows.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position_age: [f32; 4],  // xyz = world position, w = normalized age
    pub scale_provider: [f32; 4], // xyz = world scale, w = provider id bits
    pub color: [f32; 4],
    /// World rotation quaternion, xyzw
    pub rotation: [f32; 4],
}

impl ParticleInstance {
    pub fn from_particle(p: &Particle) -> Self {
        let position = p.world_position();
        let scale = p.world_scale();
        Self {
            position_age: [position.x, position.y, position.z, p.normalized_age()],
            scale_provider: [scale.x, scale.y, scale.z, f32::from_bits(p.provider.to_word())],
            color: p.render_color().to_array(),
            rotation: p.world_rotation().to_array(),
        }
    }

    /// Provider id recovered from the packed row
    pub fn provider_word(&self) -> u32 {
        self.scale_provider[3].to_bits()
    }
}

/// View a packed instance list as raw bytes for upload
pub fn instance_bytes(instances: &[ParticleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_is_four_vec4_rows() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 64);
        let instances = [ParticleInstance::zeroed(); 3];
        assert_eq!(instance_bytes(&instances).len(), 192);
    }

    #[test]
    fn provider_bits_survive_packing() {
        let mut instance = ParticleInstance::zeroed();
        instance.scale_provider[3] = f32::from_bits(0x6B6C_6966);
        assert_eq!(instance.provider_word(), 0x6B6C_6966);
    }
}
