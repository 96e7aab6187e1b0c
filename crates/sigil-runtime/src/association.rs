//! Effect bindings and activation context

use crate::world::WorldView;
use glam::Vec3;
use sigil_core::{ActorId, ResourceId};
use sigil_decode::GameStateInput;
use std::ops::RangeInclusive;

/// Actor root; resolves to the actor position
pub const JOINT_ROOT: u8 = 0x00;
/// Weapon mount on the back or hip
pub const JOINT_WEAPON_SHEATHED: u8 = 0x1A;
/// Weapon held in hand, substituted for the sheathed mount in combat stance
pub const JOINT_WEAPON_DRAWN: u8 = 0x1B;
/// Eight joints placed in a ring around the actor
pub const RING_JOINTS: RangeInclusive<u8> = 0xE0..=0xE7;
/// Requests that resolve to whichever ring joint is nearest the opposing actor
pub const RING_REQUESTS: RangeInclusive<u8> = 0xF0..=0xF7;

/// Attack outcome data available to routine conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackContext {
    pub hit_type: i32,
    pub on_hit_effect: i32,
    pub retaliation: bool,
    pub critical: bool,
    pub missed: bool,
    pub guarded: bool,
}

/// Per-activation flags, cloned into every child activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationContext {
    /// Play even when the host would normally suppress remote effects.
    /// Only the host reads this; the VMs just carry it to child activations.
    pub broadcast_override: bool,
    /// Freeze anchors at their first resolved position
    pub snapshot_position: bool,
    /// Freeze joint lookups at their first resolved position
    pub snapshot_joints: bool,
    pub attack: AttackContext,
}

/// What an activation is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum EffectAssociation {
    Actor {
        source: ActorId,
        target: Option<ActorId>,
        context: ActivationContext,
    },
    Weather,
    Zone {
        link: ResourceId,
    },
}

impl EffectAssociation {
    pub fn actor(source: ActorId, target: Option<ActorId>) -> Self {
        EffectAssociation::Actor {
            source,
            target,
            context: ActivationContext::default(),
        }
    }

    pub fn source(&self) -> Option<ActorId> {
        match self {
            EffectAssociation::Actor { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// The target actor, falling back to the source when none is bound
    pub fn target(&self) -> Option<ActorId> {
        match self {
            EffectAssociation::Actor { source, target, .. } => Some(target.unwrap_or(*source)),
            _ => None,
        }
    }

    pub fn context(&self) -> ActivationContext {
        match self {
            EffectAssociation::Actor { context, .. } => *context,
            _ => ActivationContext::default(),
        }
    }

    /// Mutable context; weather and zone bindings carry none.
    pub fn context_mut(&mut self) -> Option<&mut ActivationContext> {
        match self {
            EffectAssociation::Actor { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn zone_link(&self) -> Option<ResourceId> {
        match self {
            EffectAssociation::Zone { link } => Some(*link),
            _ => None,
        }
    }

    /// Live value for a condition's game-state input
    pub fn game_state(&self, input: GameStateInput) -> i32 {
        let ctx = self.context();
        match input {
            GameStateInput::HitType => ctx.attack.hit_type,
            GameStateInput::OnHitEffect => ctx.attack.on_hit_effect,
            GameStateInput::Retaliation => ctx.attack.retaliation as i32,
            GameStateInput::Critical => ctx.attack.critical as i32,
            GameStateInput::Missed => ctx.attack.missed as i32,
            GameStateInput::Guarded => ctx.attack.guarded as i32,
            GameStateInput::TargetIsSource => match self {
                EffectAssociation::Actor { source, target, .. } => {
                    target.map_or(true, |t| t == *source) as i32
                }
                _ => 0,
            },
        }
    }

    /// Substitute the drawn-weapon joint while the actor is in combat stance.
    pub fn remap_joint(&self, actor: ActorId, joint: u8, world: &dyn WorldView) -> u8 {
        if joint == JOINT_WEAPON_SHEATHED && world.in_combat_stance(actor) {
            JOINT_WEAPON_DRAWN
        } else {
            joint
        }
    }

    /// World position of `joint` on `actor`, after remapping.
    ///
    /// Ring requests pick the ring joint closest to `opposing`; without an
    /// opposing actor they map straight onto the matching ring joint. Unknown
    /// joints and the root fall back to the actor position.
    pub fn joint_world_position(
        &self,
        actor: ActorId,
        opposing: Option<ActorId>,
        joint: u8,
        world: &dyn WorldView,
    ) -> Option<Vec3> {
        let joint = self.remap_joint(actor, joint, world);
        if joint == JOINT_ROOT {
            return world.actor_position(actor);
        }

        if RING_REQUESTS.contains(&joint) {
            let toward = opposing
                .filter(|o| *o != actor)
                .and_then(|o| world.actor_position(o));
            let nearest = match toward {
                Some(point) => RING_JOINTS
                    .filter_map(|j| world.joint_position(actor, j))
                    .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point))),
                None => world.joint_position(actor, joint - 0x10),
            };
            return nearest.or_else(|| world.actor_position(actor));
        }

        world
            .joint_position(actor, joint)
            .or_else(|| world.actor_position(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ActorState, SceneWorld};

    fn ring_world() -> SceneWorld {
        let mut world = SceneWorld::new();
        let mut source = ActorState::at(Vec3::ZERO);
        for (i, j) in RING_JOINTS.enumerate() {
            let angle = i as f32 * std::f32::consts::FRAC_PI_4;
            source = source.with_joint(j, Vec3::new(angle.sin(), 0.0, angle.cos()));
        }
        source = source
            .with_joint(JOINT_WEAPON_SHEATHED, Vec3::new(0.0, 1.0, -0.3))
            .with_joint(JOINT_WEAPON_DRAWN, Vec3::new(0.4, 1.0, 0.2));
        world.insert_actor(ActorId(1), source);
        world.insert_actor(ActorId(2), ActorState::at(Vec3::new(10.0, 0.0, 0.0)));
        world
    }

    #[test]
    fn ring_request_picks_joint_facing_opponent() {
        let world = ring_world();
        let binding = EffectAssociation::actor(ActorId(1), Some(ActorId(2)));
        let p = binding
            .joint_world_position(ActorId(1), Some(ActorId(2)), 0xF3, &world)
            .unwrap();
        // Ring joint 0xE2 sits at +X, towards the target
        assert!((p.x - 1.0).abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
    }

    #[test]
    fn ring_request_without_opponent_maps_directly() {
        let world = ring_world();
        let binding = EffectAssociation::actor(ActorId(1), None);
        let p = binding
            .joint_world_position(ActorId(1), None, 0xF4, &world)
            .unwrap();
        // 0xE4 is at angle pi, i.e. -Z
        assert!((p.z + 1.0).abs() < 1e-4);
    }

    #[test]
    fn combat_stance_swaps_weapon_joint() {
        let mut world = ring_world();
        let binding = EffectAssociation::actor(ActorId(1), None);
        assert_eq!(
            binding.remap_joint(ActorId(1), JOINT_WEAPON_SHEATHED, &world),
            JOINT_WEAPON_SHEATHED
        );
        world.actor_mut(ActorId(1)).unwrap().combat_stance = true;
        let p = binding
            .joint_world_position(ActorId(1), None, JOINT_WEAPON_SHEATHED, &world)
            .unwrap();
        assert!((p.x - 0.4).abs() < 1e-4);
    }

    #[test]
    fn unknown_joint_falls_back_to_actor() {
        let world = ring_world();
        let binding = EffectAssociation::actor(ActorId(2), None);
        let p = binding
            .joint_world_position(ActorId(2), None, 0x33, &world)
            .unwrap();
        assert!((p.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn target_is_source_reads_binding() {
        let solo = EffectAssociation::actor(ActorId(1), None);
        assert_eq!(solo.game_state(GameStateInput::TargetIsSource), 1);
        let pair = EffectAssociation::actor(ActorId(1), Some(ActorId(2)));
        assert_eq!(pair.game_state(GameStateInput::TargetIsSource), 0);
        assert_eq!(EffectAssociation::Weather.game_state(GameStateInput::Critical), 0);
    }
}
