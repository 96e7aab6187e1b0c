//! Sigil Particles - Particle generator virtual machine
//!
//! Provides the runtime half of particle generator resources:
//! - Attachment resolution from a binding to a world-space anchor
//! - Per-particle data slots keyed by allocation offset
//! - Initializer, updater and expiration-handler execution
//! - Frame-countdown emission, batched carriers and nested child generators
//! - GPU instance packing for instanced draw calls

pub mod attach;
pub mod curves;
pub mod data;
pub mod generator;
pub mod instance;
pub mod particle;

#[cfg(test)]
mod testing;

pub use attach::{resolve_anchor, sun_direction, Anchor, AttachSpec, FollowPath, SkyParams};
pub use data::{ParticleData, ParticleSlots};
pub use generator::ParticleGenerator;
pub use instance::{instance_bytes, ParticleInstance};
pub use particle::Particle;
