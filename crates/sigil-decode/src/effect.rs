//! Effect routine instruction set

use glam::Vec3;
use serde::Serialize;
use sigil_core::{ResourceId, Rgba};

/// One routine instruction: timing plus the operation itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Effect {
    pub opcode: u8,
    /// Frames to wait before executing
    pub delay: u16,
    /// Frames the effect lasts, where meaningful
    pub duration: u16,
    pub kind: EffectKind,
}

impl Effect {
    pub fn new(opcode: u8, delay: u16, duration: u16, kind: EffectKind) -> Self {
        Self {
            opcode,
            delay,
            duration,
            kind,
        }
    }

    /// Block boundaries execute even inside skipped regions so nesting stays balanced.
    pub fn is_block_boundary(&self) -> bool {
        matches!(self.kind, EffectKind::BeginBlock | EffectKind::EndBlock)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Which actor of an actor binding an instruction addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorTarget {
    Source,
    Target,
}

impl ActorTarget {
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => ActorTarget::Target,
            _ => ActorTarget::Source,
        }
    }
}

/// Where a `Condition` instruction takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionSource {
    Constant(i32),
    /// Live game state, keyed by input code
    GameState(i32),
    /// Uniform draw in `[0, bound)`
    Random(i32),
    /// Tag byte the decoder does not recognise; evaluates to zero
    Unknown { tag: u8, value: i32 },
}

impl ConditionSource {
    pub fn from_tag(tag: u8, value: i32) -> Self {
        match tag {
            0 => ConditionSource::Constant(value),
            1 => ConditionSource::GameState(value),
            2 => ConditionSource::Random(value),
            _ => ConditionSource::Unknown { tag, value },
        }
    }
}

/// Live game-state values a condition can read, by input code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStateInput {
    HitType,
    OnHitEffect,
    Retaliation,
    Critical,
    Missed,
    Guarded,
    TargetIsSource,
}

impl GameStateInput {
    /// The input code table. Codes outside it have no live value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(GameStateInput::HitType),
            1 => Some(GameStateInput::OnHitEffect),
            2 => Some(GameStateInput::Retaliation),
            3 => Some(GameStateInput::Critical),
            4 => Some(GameStateInput::Missed),
            5 => Some(GameStateInput::Guarded),
            6 => Some(GameStateInput::TargetIsSource),
            _ => None,
        }
    }
}

/// Every operation an effect routine can perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum EffectKind {
    SpawnGenerator {
        generator: ResourceId,
    },
    StopGenerator {
        generator: ResourceId,
    },
    SpawnRoutine {
        routine: ResourceId,
        blocking: bool,
    },
    /// Like `SpawnRoutine` but resolved from the global root
    LinkRoutine {
        routine: ResourceId,
        blocking: bool,
    },
    RandomRoutine {
        choices: Vec<ResourceId>,
    },
    StopRoutine {
        routine: ResourceId,
    },
    PlaySound {
        sound: ResourceId,
        volume: f32,
        follow: bool,
    },
    StopSound {
        sound: ResourceId,
    },
    PlayAnimation {
        animation: ResourceId,
        target: ActorTarget,
        loops: u8,
        transition: u16,
    },
    StopAnimation {
        animation: ResourceId,
        target: ActorTarget,
    },
    LockMovement {
        target: ActorTarget,
    },
    LockFacing {
        target: ActorTarget,
    },
    LockAnimation {
        target: ActorTarget,
    },
    FaceTarget,
    BeginBlock,
    EndBlock,
    Condition {
        register: u8,
        source: ConditionSource,
    },
    /// `when_true` selects the true-branch polarity
    Branch {
        when_true: bool,
    },
    ModelTransform {
        target: ActorTarget,
        translation: Vec3,
        rotation: Vec3,
        scale: Vec3,
    },
    ActorFade {
        target: ActorTarget,
        from: f32,
        to: f32,
    },
    ActorWrap {
        target: ActorTarget,
        color: Rgba,
    },
    WeaponTrace {
        color: Rgba,
    },
    FollowPoints {
        generator: ResourceId,
        points: u32,
        arc_height: f32,
    },
    ScreenFlash {
        color: Rgba,
    },
    Knockback {
        target: ActorTarget,
        animation: ResourceId,
    },
    PlaybackRate {
        rate: f32,
    },
    LoopRoutine,
    TimeOfDayGate {
        start_minute: u16,
        end_minute: u16,
    },
    BroadcastOverride {
        enabled: bool,
    },
    Snapshot {
        position: bool,
        joints: bool,
    },
    Wait,
    CameraShake {
        intensity: f32,
    },
    PointLight {
        color: Rgba,
        radius: f32,
    },
    SetVisibility {
        target: ActorTarget,
        visible: bool,
    },
    StopAllGenerators,
    Flinch {
        target: ActorTarget,
    },
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::SpawnGenerator { .. } => "spawn-generator",
            EffectKind::StopGenerator { .. } => "stop-generator",
            EffectKind::SpawnRoutine { .. } => "spawn-routine",
            EffectKind::LinkRoutine { .. } => "link-routine",
            EffectKind::RandomRoutine { .. } => "random-routine",
            EffectKind::StopRoutine { .. } => "stop-routine",
            EffectKind::PlaySound { .. } => "play-sound",
            EffectKind::StopSound { .. } => "stop-sound",
            EffectKind::PlayAnimation { .. } => "play-animation",
            EffectKind::StopAnimation { .. } => "stop-animation",
            EffectKind::LockMovement { .. } => "lock-movement",
            EffectKind::LockFacing { .. } => "lock-facing",
            EffectKind::LockAnimation { .. } => "lock-animation",
            EffectKind::FaceTarget => "face-target",
            EffectKind::BeginBlock => "begin-block",
            EffectKind::EndBlock => "end-block",
            EffectKind::Condition { .. } => "condition",
            EffectKind::Branch { .. } => "branch",
            EffectKind::ModelTransform { .. } => "model-transform",
            EffectKind::ActorFade { .. } => "actor-fade",
            EffectKind::ActorWrap { .. } => "actor-wrap",
            EffectKind::WeaponTrace { .. } => "weapon-trace",
            EffectKind::FollowPoints { .. } => "follow-points",
            EffectKind::ScreenFlash { .. } => "screen-flash",
            EffectKind::Knockback { .. } => "knockback",
            EffectKind::PlaybackRate { .. } => "playback-rate",
            EffectKind::LoopRoutine => "loop-routine",
            EffectKind::TimeOfDayGate { .. } => "time-of-day-gate",
            EffectKind::BroadcastOverride { .. } => "broadcast-override",
            EffectKind::Snapshot { .. } => "snapshot",
            EffectKind::Wait => "wait",
            EffectKind::CameraShake { .. } => "camera-shake",
            EffectKind::PointLight { .. } => "point-light",
            EffectKind::SetVisibility { .. } => "set-visibility",
            EffectKind::StopAllGenerators => "stop-all-generators",
            EffectKind::Flinch { .. } => "flinch",
        }
    }
}
