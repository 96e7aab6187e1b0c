//! Handlers for instructions that only command the outside world
//!
//! Everything here turns one routine instruction into calls on the
//! `EffectSink`. Instructions that change sequencer state (spawning, control
//! flow, looping, gates) are handled by the sequence itself.

use glam::Vec3;
use sigil_core::ActorId;
use sigil_decode::{ActorTarget, Effect, EffectKind};
use sigil_runtime::{ActorLock, EffectAssociation, EffectContext, SideEffect};

/// Resolve an instruction's actor operand against the binding
pub fn resolve_actor(binding: &EffectAssociation, target: ActorTarget) -> Option<ActorId> {
    match target {
        ActorTarget::Source => binding.source(),
        ActorTarget::Target => binding.target(),
    }
}

/// Where sounds and lights bound to this activation are placed
pub fn binding_position(binding: &EffectAssociation, ctx: &EffectContext<'_>) -> Vec3 {
    match binding {
        EffectAssociation::Actor { source, .. } => ctx
            .world
            .actor_position(*source)
            .unwrap_or_else(|| ctx.world.observer_position()),
        EffectAssociation::Weather => ctx.world.observer_position(),
        EffectAssociation::Zone { link } => ctx
            .world
            .zone_object(*link)
            .map(|o| o.position)
            .unwrap_or_else(|| ctx.world.observer_position()),
    }
}

fn with_actor(
    effect: &Effect,
    binding: &EffectAssociation,
    target: ActorTarget,
    build: impl FnOnce(ActorId) -> SideEffect,
    ctx: &mut EffectContext<'_>,
) {
    match resolve_actor(binding, target) {
        Some(actor) => ctx.sink.submit(build(actor)),
        None => tracing::warn!(
            effect = effect.name(),
            ?target,
            "binding has no actor for instruction"
        ),
    }
}

/// Execute a side-effect instruction. Returns false if `effect` is not one.
pub fn submit_side_effect(
    effect: &Effect,
    binding: &EffectAssociation,
    ctx: &mut EffectContext<'_>,
) -> bool {
    let frames = effect.duration;
    match &effect.kind {
        EffectKind::PlaySound {
            sound,
            volume,
            follow,
        } => {
            let position = binding_position(binding, ctx);
            let follow = if *follow { binding.source() } else { None };
            ctx.sink.play_sound(*sound, position, *volume, follow);
        }
        EffectKind::StopSound { sound } => ctx.sink.submit(SideEffect::StopSound { sound: *sound }),
        EffectKind::PlayAnimation {
            animation,
            target,
            loops,
            transition,
        } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::PlayAnimation {
                actor,
                animation: *animation,
                loops: *loops,
                transition: *transition,
            },
            ctx,
        ),
        EffectKind::StopAnimation { animation, target } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::StopAnimation {
                actor,
                animation: *animation,
            },
            ctx,
        ),
        EffectKind::LockMovement { target } => lock(effect, binding, *target, ActorLock::Movement, ctx),
        EffectKind::LockFacing { target } => lock(effect, binding, *target, ActorLock::Facing, ctx),
        EffectKind::LockAnimation { target } => {
            lock(effect, binding, *target, ActorLock::Animation, ctx)
        }
        EffectKind::FaceTarget => match (binding.source(), binding.target()) {
            (Some(actor), Some(toward)) if actor != toward => {
                ctx.sink.submit(SideEffect::Face { actor, toward })
            }
            _ => tracing::debug!("face-target without a distinct target"),
        },
        EffectKind::ModelTransform {
            target,
            translation,
            rotation,
            scale,
        } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::ModelTransform {
                actor,
                translation: *translation,
                rotation: *rotation,
                scale: *scale,
                frames,
            },
            ctx,
        ),
        EffectKind::ActorFade { target, from, to } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::Fade {
                actor,
                from: *from,
                to: *to,
                frames,
            },
            ctx,
        ),
        EffectKind::ActorWrap { target, color } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::Wrap {
                actor,
                color: *color,
                frames,
            },
            ctx,
        ),
        EffectKind::WeaponTrace { color } => with_actor(
            effect,
            binding,
            ActorTarget::Source,
            |actor| SideEffect::WeaponTrace {
                actor,
                color: *color,
                frames,
            },
            ctx,
        ),
        EffectKind::ScreenFlash { color } => ctx.sink.submit(SideEffect::ScreenFlash {
            color: *color,
            frames,
        }),
        EffectKind::Knockback { target, animation } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::Knockback {
                actor,
                animation: *animation,
            },
            ctx,
        ),
        EffectKind::Flinch { target } => {
            with_actor(effect, binding, *target, |actor| SideEffect::Flinch { actor }, ctx)
        }
        EffectKind::CameraShake { intensity } => ctx.sink.submit(SideEffect::CameraShake {
            intensity: *intensity,
            frames,
        }),
        EffectKind::PointLight { color, radius } => {
            let position = binding_position(binding, ctx);
            ctx.sink.submit(SideEffect::PointLight {
                position,
                color: *color,
                radius: *radius,
                frames,
            })
        }
        EffectKind::SetVisibility { target, visible } => with_actor(
            effect,
            binding,
            *target,
            |actor| SideEffect::SetVisibility {
                actor,
                visible: *visible,
            },
            ctx,
        ),
        _ => return false,
    }
    true
}

fn lock(
    effect: &Effect,
    binding: &EffectAssociation,
    target: ActorTarget,
    lock: ActorLock,
    ctx: &mut EffectContext<'_>,
) {
    let frames = effect.duration;
    with_actor(
        effect,
        binding,
        target,
        |actor| SideEffect::Lock {
            actor,
            lock,
            frames,
        },
        ctx,
    )
}
