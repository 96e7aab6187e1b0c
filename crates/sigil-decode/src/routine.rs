//! Effect routine resources: opcode table and definition decoding
//!
//! A routine resource holds three sections, each closed by a terminator:
//! the main instruction list, the on-complete handlers and the on-stop
//! handlers. Streams that end early leave the later sections empty.

use crate::cursor::ByteCursor;
use crate::dispatch::{decode_section, Parser, SectionEnd};
use crate::effect::{ActorTarget, ConditionSource, Effect, EffectKind};
use crate::header::{HeaderFormat, InstructionHeader};
use serde::Serialize;
use sigil_core::{ResourceId, ResourcePath, Result, SimConfig};

/// Immutable, shareable routine definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectRoutineDefinition {
    pub id: ResourceId,
    pub origin: ResourcePath,
    pub effects: Vec<Effect>,
    pub on_complete: Vec<Effect>,
    pub on_stop: Vec<Effect>,
    /// Inferred: a completion handler loops the routine, or it lives in an auto-play location
    pub auto_run: bool,
}

impl EffectRoutineDefinition {
    /// Build a definition directly from instruction lists, inferring `auto_run`.
    pub fn from_parts(
        id: ResourceId,
        origin: ResourcePath,
        effects: Vec<Effect>,
        on_complete: Vec<Effect>,
        on_stop: Vec<Effect>,
        config: &SimConfig,
    ) -> Self {
        let loops = on_complete
            .iter()
            .any(|e| matches!(e.kind, EffectKind::LoopRoutine));
        let auto_play = origin
            .leaf()
            .map(|leaf| config.is_auto_play_location(&leaf.name()))
            .unwrap_or(false);
        Self {
            id,
            origin,
            effects,
            on_complete,
            on_stop,
            auto_run: loops || auto_play,
        }
    }
}

/// Decode a routine resource.
pub fn decode_effect_routine(
    id: ResourceId,
    origin: ResourcePath,
    bytes: &[u8],
    config: &SimConfig,
) -> Result<EffectRoutineDefinition> {
    let mut cursor = ByteCursor::new(bytes);
    let mut sections: [Vec<Effect>; 3] = Default::default();

    for section in sections.iter_mut() {
        let end = decode_section(
            &mut cursor,
            HeaderFormat::Routine,
            "routine",
            routine_table,
            |_, effect| section.push(effect),
        )?;
        if end == SectionEnd::Exhausted {
            break;
        }
    }

    let [effects, on_complete, on_stop] = sections;
    tracing::debug!(
        routine = %id,
        origin = %origin,
        effects = effects.len(),
        on_complete = on_complete.len(),
        on_stop = on_stop.len(),
        "decoded effect routine"
    );
    Ok(EffectRoutineDefinition::from_parts(
        id,
        origin,
        effects,
        on_complete,
        on_stop,
        config,
    ))
}

/// The routine opcode table.
pub fn routine_table(opcode: u8) -> Option<Parser<Effect>> {
    let parser: Parser<Effect> = match opcode {
        0x01 => spawn_generator,
        0x02 => stop_generator,
        0x03 => spawn_routine,
        0x04 => link_routine,
        0x05 => random_routine,
        0x06 => stop_routine,
        0x07 => play_sound,
        0x08 => stop_sound,
        0x09 => play_animation,
        0x0A => stop_animation,
        0x0B => lock_movement,
        0x0C => lock_facing,
        0x0D => lock_animation,
        0x0E => face_target,
        0x0F => begin_block,
        0x10 => end_block,
        0x11 => condition,
        0x12 => branch_if_true,
        0x13 => branch_if_false,
        0x14 => model_transform,
        0x15 => actor_fade,
        0x16 => actor_wrap,
        0x17 => weapon_trace,
        0x18 => follow_points,
        0x19 => screen_flash,
        0x1A => knockback,
        0x1B => playback_rate,
        0x1C => loop_routine,
        0x1D => time_of_day_gate,
        0x1E => broadcast_override,
        0x1F => snapshot,
        0x20 => wait,
        0x21 => camera_shake,
        0x22 => point_light,
        0x23 => set_visibility,
        0x24 => stop_all_generators,
        0x25 => flinch,
        _ => return None,
    };
    Some(parser)
}

/// The `delay/duration` word every routine instruction carries
struct Timing {
    delay: u16,
    duration: u16,
}

impl Timing {
    fn read(c: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            delay: c.read_u16()?,
            duration: c.read_u16()?,
        })
    }

    fn effect(self, h: &InstructionHeader, kind: EffectKind) -> Effect {
        Effect::new(h.opcode, self.delay, self.duration, kind)
    }
}

fn read_target(c: &mut ByteCursor<'_>) -> Result<ActorTarget> {
    Ok(ActorTarget::from_byte((c.read_u32()? & 0xFF) as u8))
}

fn read_flag(c: &mut ByteCursor<'_>) -> Result<bool> {
    Ok(c.read_u32()? & 1 != 0)
}

fn spawn_generator(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let generator = c.read_id()?;
    Ok(t.effect(h, EffectKind::SpawnGenerator { generator }))
}

fn stop_generator(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let generator = c.read_id()?;
    Ok(t.effect(h, EffectKind::StopGenerator { generator }))
}

fn spawn_routine(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let routine = c.read_id()?;
    let blocking = read_flag(c)?;
    Ok(t.effect(h, EffectKind::SpawnRoutine { routine, blocking }))
}

fn link_routine(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let routine = c.read_id()?;
    let blocking = read_flag(c)?;
    Ok(t.effect(h, EffectKind::LinkRoutine { routine, blocking }))
}

fn random_routine(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let count = c.read_u32()? as usize;
    // Never read past the declared instruction; a bad count shows up as a size mismatch
    let room = (h.size_words as usize).saturating_sub(3);
    let choices = (0..count.min(room))
        .map(|_| c.read_id())
        .collect::<Result<Vec<_>>>()?;
    Ok(t.effect(h, EffectKind::RandomRoutine { choices }))
}

fn stop_routine(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let routine = c.read_id()?;
    Ok(t.effect(h, EffectKind::StopRoutine { routine }))
}

fn play_sound(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let sound = c.read_id()?;
    let volume = c.read_f32()?;
    let follow = read_flag(c)?;
    Ok(t.effect(
        h,
        EffectKind::PlaySound {
            sound,
            volume,
            follow,
        },
    ))
}

fn stop_sound(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let sound = c.read_id()?;
    Ok(t.effect(h, EffectKind::StopSound { sound }))
}

fn play_animation(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let animation = c.read_id()?;
    let target = ActorTarget::from_byte(c.read_u8()?);
    let loops = c.read_u8()?;
    let transition = c.read_u16()?;
    Ok(t.effect(
        h,
        EffectKind::PlayAnimation {
            animation,
            target,
            loops,
            transition,
        },
    ))
}

fn stop_animation(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let animation = c.read_id()?;
    let target = read_target(c)?;
    Ok(t.effect(h, EffectKind::StopAnimation { animation, target }))
}

fn lock_movement(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    Ok(t.effect(h, EffectKind::LockMovement { target }))
}

fn lock_facing(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    Ok(t.effect(h, EffectKind::LockFacing { target }))
}

fn lock_animation(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    Ok(t.effect(h, EffectKind::LockAnimation { target }))
}

fn face_target(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::FaceTarget))
}

fn begin_block(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::BeginBlock))
}

fn end_block(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::EndBlock))
}

fn condition(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let register = c.read_u8()?;
    let tag = c.read_u8()?;
    let _pad = c.read_u16()?;
    let value = c.read_i32()?;
    Ok(t.effect(
        h,
        EffectKind::Condition {
            register,
            source: ConditionSource::from_tag(tag, value),
        },
    ))
}

fn branch_if_true(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::Branch { when_true: true }))
}

fn branch_if_false(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::Branch { when_true: false }))
}

fn model_transform(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    let translation = c.read_vec3()?;
    let rotation = c.read_vec3()?;
    let scale = c.read_vec3()?;
    Ok(t.effect(
        h,
        EffectKind::ModelTransform {
            target,
            translation,
            rotation,
            scale,
        },
    ))
}

fn actor_fade(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    let from = c.read_f32()?;
    let to = c.read_f32()?;
    Ok(t.effect(h, EffectKind::ActorFade { target, from, to }))
}

fn actor_wrap(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    let color = c.read_rgba()?;
    Ok(t.effect(h, EffectKind::ActorWrap { target, color }))
}

fn weapon_trace(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let color = c.read_rgba()?;
    Ok(t.effect(h, EffectKind::WeaponTrace { color }))
}

fn follow_points(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let generator = c.read_id()?;
    let points = c.read_u32()?;
    let arc_height = c.read_f32()?;
    Ok(t.effect(
        h,
        EffectKind::FollowPoints {
            generator,
            points,
            arc_height,
        },
    ))
}

fn screen_flash(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let color = c.read_rgba()?;
    Ok(t.effect(h, EffectKind::ScreenFlash { color }))
}

fn knockback(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    let animation = c.read_id()?;
    Ok(t.effect(h, EffectKind::Knockback { target, animation }))
}

fn playback_rate(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let rate = c.read_f32()?;
    Ok(t.effect(h, EffectKind::PlaybackRate { rate }))
}

fn loop_routine(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::LoopRoutine))
}

fn time_of_day_gate(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let start_minute = c.read_u16()?;
    let end_minute = c.read_u16()?;
    Ok(t.effect(
        h,
        EffectKind::TimeOfDayGate {
            start_minute,
            end_minute,
        },
    ))
}

fn broadcast_override(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let enabled = read_flag(c)?;
    Ok(t.effect(h, EffectKind::BroadcastOverride { enabled }))
}

fn snapshot(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let flags = c.read_u32()?;
    Ok(t.effect(
        h,
        EffectKind::Snapshot {
            position: flags & 1 != 0,
            joints: flags & 2 != 0,
        },
    ))
}

fn wait(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::Wait))
}

fn camera_shake(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let intensity = c.read_f32()?;
    Ok(t.effect(h, EffectKind::CameraShake { intensity }))
}

fn point_light(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let color = c.read_rgba()?;
    let radius = c.read_f32()?;
    Ok(t.effect(h, EffectKind::PointLight { color, radius }))
}

fn set_visibility(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    let visible = read_flag(c)?;
    Ok(t.effect(h, EffectKind::SetVisibility { target, visible }))
}

fn stop_all_generators(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    Ok(Timing::read(c)?.effect(h, EffectKind::StopAllGenerators))
}

fn flinch(c: &mut ByteCursor<'_>, h: &InstructionHeader) -> Result<Effect> {
    let t = Timing::read(c)?;
    let target = read_target(c)?;
    Ok(t.effect(h, EffectKind::Flinch { target }))
}
