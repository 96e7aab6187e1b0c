//! Per-particle data slots
//!
//! Instructions that carry state allocate a slot at their allocation offset.
//! Each offset is written once per particle; later instructions read or
//! modify the slot through typed accessors that report a missing slot or a
//! slot of the wrong kind.

use glam::Vec3;
use sigil_core::{ResourceId, Result, Rgba, SigilError};
use sigil_decode::{KeyFrameChannel, KeyFrameSet};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySlot {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransformSlot {
    pub from: Rgba,
    pub to: Rgba,
    pub frames: f32,
    pub elapsed: f32,
}

impl ColorTransformSlot {
    pub fn current(&self) -> Rgba {
        let t = if self.frames <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.frames).min(1.0)
        };
        self.from.lerp(&self.to, t)
    }
}

/// Key-frame binding; the set is looked up on first use and cached
#[derive(Debug, Clone)]
pub struct KeyFrameSlot {
    pub set_id: ResourceId,
    pub channel: KeyFrameChannel,
    pub set: Option<Arc<KeyFrameSet>>,
    /// Lookup already failed once
    pub unresolved: bool,
}

impl KeyFrameSlot {
    pub fn new(set_id: ResourceId, channel: KeyFrameChannel) -> Self {
        Self {
            set_id,
            channel,
            set: None,
            unresolved: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSlot {
    pub radius: f32,
    pub speed: f32,
    pub phase: f32,
}

#[derive(Debug, Clone)]
pub enum ParticleData {
    Velocity(VelocitySlot),
    AngularVelocity(Vec3),
    ScaleVelocity(Vec3),
    ColorTransform(ColorTransformSlot),
    KeyFrames(KeyFrameSlot),
    Orbit(OrbitSlot),
}

impl ParticleData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParticleData::Velocity(_) => "velocity",
            ParticleData::AngularVelocity(_) => "angular-velocity",
            ParticleData::ScaleVelocity(_) => "scale-velocity",
            ParticleData::ColorTransform(_) => "color-transform",
            ParticleData::KeyFrames(_) => "key-frames",
            ParticleData::Orbit(_) => "orbit",
        }
    }
}

/// Slot map keyed by allocation offset
#[derive(Debug, Clone, Default)]
pub struct ParticleSlots {
    slots: BTreeMap<u32, ParticleData>,
}

fn mismatch(offset: u32, expected: &'static str, found: &ParticleData) -> SigilError {
    SigilError::SlotTypeMismatch {
        offset,
        expected,
        found: found.kind_name(),
    }
}

impl ParticleSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot. A second allocation at the same offset is rejected
    /// and leaves the existing slot untouched.
    pub fn allocate(&mut self, offset: u32, data: ParticleData) -> Result<()> {
        if self.slots.contains_key(&offset) {
            return Err(SigilError::DuplicateAllocation { offset });
        }
        self.slots.insert(offset, data);
        Ok(())
    }

    pub fn get(&self, offset: u32) -> Result<&ParticleData> {
        self.slots
            .get(&offset)
            .ok_or(SigilError::MissingSlot { offset })
    }

    fn slot_mut(&mut self, offset: u32) -> Result<&mut ParticleData> {
        self.slots
            .get_mut(&offset)
            .ok_or(SigilError::MissingSlot { offset })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn velocity_mut(&mut self, offset: u32) -> Result<&mut VelocitySlot> {
        match self.slot_mut(offset)? {
            ParticleData::Velocity(v) => Ok(v),
            other => Err(mismatch(offset, "velocity", other)),
        }
    }

    pub fn angular_velocity(&self, offset: u32) -> Result<Vec3> {
        match self.get(offset)? {
            ParticleData::AngularVelocity(rate) => Ok(*rate),
            other => Err(mismatch(offset, "angular-velocity", other)),
        }
    }

    pub fn scale_velocity(&self, offset: u32) -> Result<Vec3> {
        match self.get(offset)? {
            ParticleData::ScaleVelocity(rate) => Ok(*rate),
            other => Err(mismatch(offset, "scale-velocity", other)),
        }
    }

    pub fn color_transform_mut(&mut self, offset: u32) -> Result<&mut ColorTransformSlot> {
        match self.slot_mut(offset)? {
            ParticleData::ColorTransform(t) => Ok(t),
            other => Err(mismatch(offset, "color-transform", other)),
        }
    }

    pub fn key_frames_mut(&mut self, offset: u32) -> Result<&mut KeyFrameSlot> {
        match self.slot_mut(offset)? {
            ParticleData::KeyFrames(k) => Ok(k),
            other => Err(mismatch(offset, "key-frames", other)),
        }
    }

    pub fn orbit_mut(&mut self, offset: u32) -> Result<&mut OrbitSlot> {
        match self.slot_mut(offset)? {
            ParticleData::Orbit(o) => Ok(o),
            other => Err(mismatch(offset, "orbit", other)),
        }
    }
}
