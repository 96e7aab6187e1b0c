//! Outbound side effects: audio, animation and render commands
//!
//! The VMs never play a sound or touch an actor themselves. They submit
//! commands to an [`EffectSink`] owned by the host.

use glam::Vec3;
use sigil_core::{ActorId, ResourceId, Rgba};
use std::collections::HashMap;

/// Handle to a sound started through a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorLock {
    Movement,
    Facing,
    Animation,
}

/// A command submitted by a routine or particle
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    PlayAnimation {
        actor: ActorId,
        animation: ResourceId,
        loops: u8,
        transition: u16,
    },
    StopAnimation {
        actor: ActorId,
        animation: ResourceId,
    },
    PlaySound {
        handle: SoundHandle,
        sound: ResourceId,
        position: Vec3,
        volume: f32,
        follow: Option<ActorId>,
    },
    StopSound {
        sound: ResourceId,
    },
    Lock {
        actor: ActorId,
        lock: ActorLock,
        frames: u16,
    },
    Face {
        actor: ActorId,
        toward: ActorId,
    },
    ScreenFlash {
        color: Rgba,
        frames: u16,
    },
    Knockback {
        actor: ActorId,
        animation: ResourceId,
    },
    Flinch {
        actor: ActorId,
    },
    ModelTransform {
        actor: ActorId,
        translation: Vec3,
        rotation: Vec3,
        scale: Vec3,
        frames: u16,
    },
    Fade {
        actor: ActorId,
        from: f32,
        to: f32,
        frames: u16,
    },
    Wrap {
        actor: ActorId,
        color: Rgba,
        frames: u16,
    },
    WeaponTrace {
        actor: ActorId,
        color: Rgba,
        frames: u16,
    },
    CameraShake {
        intensity: f32,
        frames: u16,
    },
    PointLight {
        position: Vec3,
        color: Rgba,
        radius: f32,
        frames: u16,
    },
    SetVisibility {
        actor: ActorId,
        visible: bool,
    },
}

impl SideEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SideEffect::PlayAnimation { .. } => "play-animation",
            SideEffect::StopAnimation { .. } => "stop-animation",
            SideEffect::PlaySound { .. } => "play-sound",
            SideEffect::StopSound { .. } => "stop-sound",
            SideEffect::Lock { .. } => "lock",
            SideEffect::Face { .. } => "face",
            SideEffect::ScreenFlash { .. } => "screen-flash",
            SideEffect::Knockback { .. } => "knockback",
            SideEffect::Flinch { .. } => "flinch",
            SideEffect::ModelTransform { .. } => "model-transform",
            SideEffect::Fade { .. } => "fade",
            SideEffect::Wrap { .. } => "wrap",
            SideEffect::WeaponTrace { .. } => "weapon-trace",
            SideEffect::CameraShake { .. } => "camera-shake",
            SideEffect::PointLight { .. } => "point-light",
            SideEffect::SetVisibility { .. } => "set-visibility",
        }
    }
}

/// Receiver for everything the VMs want done outside themselves
pub trait EffectSink {
    /// Queue a fire-and-forget command
    fn submit(&mut self, effect: SideEffect);

    /// Start a sound and return a handle that can be polled
    fn play_sound(
        &mut self,
        sound: ResourceId,
        position: Vec3,
        volume: f32,
        follow: Option<ActorId>,
    ) -> SoundHandle;

    fn is_sound_playing(&self, handle: SoundHandle) -> bool;
}

/// A sink that records every command, for tools and tests.
///
/// Sounds count as playing for a fixed number of frames after they start;
/// call [`RecordingSink::advance`] once per tick to age them.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    effects: Vec<SideEffect>,
    sounds: HashMap<SoundHandle, f32>,
    sound_frames: f32,
    next_handle: u64,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::with_sound_length(30.0)
    }

    pub fn with_sound_length(frames: f32) -> Self {
        Self {
            effects: Vec::new(),
            sounds: HashMap::new(),
            sound_frames: frames,
            next_handle: 1,
        }
    }

    /// Age playing sounds by `frames`
    pub fn advance(&mut self, frames: f32) {
        for remaining in self.sounds.values_mut() {
            *remaining -= frames;
        }
        self.sounds.retain(|_, remaining| *remaining > 0.0);
    }

    /// Drain all recorded commands
    pub fn drain(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn effects(&self) -> &[SideEffect] {
        &self.effects
    }

    pub fn count(&self, name: &str) -> usize {
        self.effects.iter().filter(|e| e.name() == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }
}

impl EffectSink for RecordingSink {
    fn submit(&mut self, effect: SideEffect) {
        if let SideEffect::StopSound { sound } = &effect {
            let stopped: Vec<SoundHandle> = self
                .effects
                .iter()
                .filter_map(|e| match e {
                    SideEffect::PlaySound {
                        handle, sound: s, ..
                    } if s == sound => Some(*handle),
                    _ => None,
                })
                .collect();
            for handle in stopped {
                self.sounds.remove(&handle);
            }
        }
        self.effects.push(effect);
    }

    fn play_sound(
        &mut self,
        sound: ResourceId,
        position: Vec3,
        volume: f32,
        follow: Option<ActorId>,
    ) -> SoundHandle {
        let handle = SoundHandle(self.next_handle);
        self.next_handle += 1;
        if self.sound_frames > 0.0 {
            self.sounds.insert(handle, self.sound_frames);
        }
        self.effects.push(SideEffect::PlaySound {
            handle,
            sound,
            position,
            volume,
            follow,
        });
        handle
    }

    fn is_sound_playing(&self, handle: SoundHandle) -> bool {
        self.sounds.contains_key(&handle)
    }
}
