//! Particle table: initializers, updaters and expiration handlers
//!
//! One flat table covers all three families; the family is fixed by opcode
//! range. Initializers run once when a particle is built, updaters every
//! frame, expiration handlers once when the particle expires. Instructions
//! that carry per-particle state allocate a data slot at the header's
//! allocation offset; instructions that read or modify that state address
//! the same offset.

use crate::cursor::ByteCursor;
use crate::dispatch::Parser;
use crate::header::InstructionHeader;
use glam::Vec3;
use serde::Serialize;
use sigil_core::{ResourceId, Result, Rgba};

/// A decoded particle instruction together with its slot offset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleInstruction<K> {
    pub opcode: u8,
    pub alloc_offset: u32,
    pub op: K,
}

/// Instruction families of the particle table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticleFamily {
    Initializer,
    Updater,
    Expiration,
}

impl ParticleFamily {
    pub fn of_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0x01..=0x3F => Some(ParticleFamily::Initializer),
            0x40..=0x7F => Some(ParticleFamily::Updater),
            0x80..=0xBF => Some(ParticleFamily::Expiration),
            _ => None,
        }
    }
}

/// Which property a key-frame set drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyFrameChannel {
    Alpha,
    Scale,
    Height,
    ColorMultiplier,
}

impl KeyFrameChannel {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(KeyFrameChannel::Alpha),
            1 => Some(KeyFrameChannel::Scale),
            2 => Some(KeyFrameChannel::Height),
            3 => Some(KeyFrameChannel::ColorMultiplier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum Initializer {
    Position {
        offset: Vec3,
    },
    PositionJitter {
        extent: Vec3,
    },
    /// Allocates the velocity slot
    Velocity {
        velocity: Vec3,
    },
    /// Perturbs the velocity slot at the same offset
    VelocityJitter {
        extent: Vec3,
    },
    /// Sets the acceleration of the velocity slot at the same offset
    Gravity {
        acceleration: Vec3,
    },
    Rotation {
        euler: Vec3,
    },
    AngularVelocity {
        rate: Vec3,
    },
    Scale {
        scale: Vec3,
    },
    ScaleVelocity {
        rate: Vec3,
    },
    Color {
        color: Rgba,
    },
    ColorJitter {
        extent: Rgba,
    },
    ColorTransform {
        target: Rgba,
        frames: u32,
    },
    KeyFrames {
        set: ResourceId,
        channel: KeyFrameChannel,
    },
    Mesh {
        provider: ResourceId,
    },
    ChildGenerator {
        generator: ResourceId,
    },
    Orbit {
        radius: f32,
        speed: f32,
        phase_jitter: f32,
    },
    Sound {
        sound: ResourceId,
        volume: f32,
    },
    /// Keep the particle positioned relative to the live anchor
    AnchorRelative,
}

impl Initializer {
    /// Whether this initializer creates a data slot at its offset
    pub fn allocates(&self) -> bool {
        matches!(
            self,
            Initializer::Velocity { .. }
                | Initializer::AngularVelocity { .. }
                | Initializer::ScaleVelocity { .. }
                | Initializer::ColorTransform { .. }
                | Initializer::KeyFrames { .. }
                | Initializer::Orbit { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum Updater {
    ApplyVelocity,
    Damping { factor: f32 },
    ApplyAngularVelocity,
    ApplyScaleVelocity,
    ApplyColorTransform,
    ApplyKeyFrames,
    ApplyOrbit,
    FadeOut { frames: u32 },
    FadeIn { frames: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum ExpirationHandler {
    SpawnGenerator { generator: ResourceId },
    PlaySound { sound: ResourceId, volume: f32 },
    /// Reset the particle's age, up to `times` times
    Restart { times: u32 },
}

/// One decoded entry of the particle table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParticleOp {
    Init(Initializer),
    Update(Updater),
    Expire(ExpirationHandler),
}

impl ParticleOp {
    pub fn family(&self) -> ParticleFamily {
        match self {
            ParticleOp::Init(_) => ParticleFamily::Initializer,
            ParticleOp::Update(_) => ParticleFamily::Updater,
            ParticleOp::Expire(_) => ParticleFamily::Expiration,
        }
    }
}

/// The particle opcode table.
pub fn particle_table(opcode: u8) -> Option<Parser<ParticleOp>> {
    let parser: Parser<ParticleOp> = match opcode {
        0x01 => init_position,
        0x02 => init_position_jitter,
        0x03 => init_velocity,
        0x04 => init_velocity_jitter,
        0x05 => init_gravity,
        0x06 => init_rotation,
        0x07 => init_angular_velocity,
        0x08 => init_scale,
        0x09 => init_scale_velocity,
        0x0A => init_color,
        0x0B => init_color_jitter,
        0x0C => init_color_transform,
        0x0D => init_key_frames,
        0x0E => init_mesh,
        0x0F => init_child_generator,
        0x10 => init_orbit,
        0x11 => init_sound,
        0x12 => init_anchor_relative,

        0x40 => update_velocity,
        0x41 => update_damping,
        0x42 => update_angular_velocity,
        0x43 => update_scale_velocity,
        0x44 => update_color_transform,
        0x45 => update_key_frames,
        0x46 => update_orbit,
        0x47 => update_fade_out,
        0x48 => update_fade_in,

        0x80 => expire_spawn_generator,
        0x81 => expire_play_sound,
        0x82 => expire_restart,
        _ => return None,
    };
    Some(parser)
}

fn init_position(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Position {
        offset: c.read_vec3()?,
    }))
}

fn init_position_jitter(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::PositionJitter {
        extent: c.read_vec3()?,
    }))
}

fn init_velocity(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Velocity {
        velocity: c.read_vec3()?,
    }))
}

fn init_velocity_jitter(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::VelocityJitter {
        extent: c.read_vec3()?,
    }))
}

fn init_gravity(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Gravity {
        acceleration: c.read_vec3()?,
    }))
}

fn init_rotation(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Rotation {
        euler: c.read_vec3()?,
    }))
}

fn init_angular_velocity(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::AngularVelocity {
        rate: c.read_vec3()?,
    }))
}

fn init_scale(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Scale {
        scale: c.read_vec3()?,
    }))
}

fn init_scale_velocity(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::ScaleVelocity {
        rate: c.read_vec3()?,
    }))
}

fn init_color(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Color {
        color: c.read_rgba()?,
    }))
}

fn init_color_jitter(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::ColorJitter {
        extent: c.read_rgba()?,
    }))
}

fn init_color_transform(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    let target = c.read_rgba()?;
    let frames = c.read_u32()?;
    Ok(ParticleOp::Init(Initializer::ColorTransform { target, frames }))
}

fn init_key_frames(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<ParticleOp> {
    let set = c.read_id()?;
    let code = c.read_u32()?;
    let channel = KeyFrameChannel::from_code(code).unwrap_or_else(|| {
        tracing::warn!(
            set = %set,
            channel = code,
            alloc_offset = h.alloc_offset,
            "unknown key-frame channel, driving alpha"
        );
        KeyFrameChannel::Alpha
    });
    Ok(ParticleOp::Init(Initializer::KeyFrames { set, channel }))
}

fn init_mesh(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::Mesh {
        provider: c.read_id()?,
    }))
}

fn init_child_generator(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::ChildGenerator {
        generator: c.read_id()?,
    }))
}

fn init_orbit(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    let radius = c.read_f32()?;
    let speed = c.read_f32()?;
    let phase_jitter = c.read_f32()?;
    Ok(ParticleOp::Init(Initializer::Orbit {
        radius,
        speed,
        phase_jitter,
    }))
}

fn init_sound(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    let sound = c.read_id()?;
    let volume = c.read_f32()?;
    Ok(ParticleOp::Init(Initializer::Sound { sound, volume }))
}

fn init_anchor_relative(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Init(Initializer::AnchorRelative))
}

fn update_velocity(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyVelocity))
}

fn update_damping(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::Damping {
        factor: c.read_f32()?,
    }))
}

fn update_angular_velocity(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyAngularVelocity))
}

fn update_scale_velocity(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyScaleVelocity))
}

fn update_color_transform(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyColorTransform))
}

fn update_key_frames(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyKeyFrames))
}

fn update_orbit(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::ApplyOrbit))
}

fn update_fade_out(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::FadeOut {
        frames: c.read_u32()?,
    }))
}

fn update_fade_in(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Update(Updater::FadeIn {
        frames: c.read_u32()?,
    }))
}

fn expire_spawn_generator(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Expire(ExpirationHandler::SpawnGenerator {
        generator: c.read_id()?,
    }))
}

fn expire_play_sound(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    let sound = c.read_id()?;
    let volume = c.read_f32()?;
    Ok(ParticleOp::Expire(ExpirationHandler::PlaySound { sound, volume }))
}

fn expire_restart(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<ParticleOp> {
    Ok(ParticleOp::Expire(ExpirationHandler::Restart {
        times: c.read_u32()?,
    }))
}
