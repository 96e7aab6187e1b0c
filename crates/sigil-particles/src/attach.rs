//! Attachment resolution: where a generator sits in the world
//!
//! `resolve_anchor` is a pure function of the attach spec, the binding, the
//! world and the sky parameters. It returns `None` when something it needs
//! (an actor, a zone object) is gone; the caller keeps its last anchor.

use crate::curves::arc_lift;
use glam::{Quat, Vec3};
use sigil_core::{ActorId, ResourceId};
use sigil_decode::{AttachType, ParticleGeneratorDefinition};
use sigil_runtime::{EffectAssociation, WorldView};
use std::f32::consts::TAU;

/// Position, orientation and scale particles are placed relative to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Anchor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Anchor {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Map a point from anchor space to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * (local * self.scale)
    }
}

/// The attachment fields of a generator definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachSpec {
    pub attach: AttachType,
    /// Joint on the source (and single-joint attach types), joint on the target
    pub joints: [u8; 2],
    pub zone_link: ResourceId,
}

impl AttachSpec {
    pub fn of(def: &ParticleGeneratorDefinition) -> Self {
        Self {
            attach: def.attach,
            joints: def.joints,
            zone_link: def.zone_link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyParams {
    pub minutes_of_day: f32,
    /// Distance from the observer at which sky anchors are placed
    pub distance: f32,
}

/// Direction from the observer to the sun. Overhead at noon, below the
/// horizon at midnight, rising in +X.
pub fn sun_direction(minutes_of_day: f32) -> Vec3 {
    let theta = minutes_of_day / (24.0 * 60.0) * TAU;
    Vec3::new(theta.sin(), -theta.cos(), 0.0)
}

fn sky_anchor(direction: Vec3, world: &dyn WorldView, sky: SkyParams) -> Anchor {
    Anchor {
        position: world.observer_position() + direction * sky.distance,
        orientation: Quat::from_rotation_arc(Vec3::Z, -direction),
        scale: Vec3::ONE,
    }
}

fn actor_anchor(actor: ActorId, world: &dyn WorldView) -> Option<Anchor> {
    Some(Anchor {
        position: world.actor_position(actor)?,
        orientation: world.actor_facing(actor).unwrap_or(Quat::IDENTITY),
        scale: Vec3::splat(world.actor_scale(actor).unwrap_or(1.0)),
    })
}

fn joint_anchor(
    binding: &EffectAssociation,
    actor: ActorId,
    opposing: Option<ActorId>,
    joint: u8,
    world: &dyn WorldView,
) -> Option<Anchor> {
    let base = actor_anchor(actor, world)?;
    Some(Anchor {
        position: binding.joint_world_position(actor, opposing, joint, world)?,
        ..base
    })
}

fn zone_anchor(link: ResourceId, world: &dyn WorldView) -> Option<Anchor> {
    let object = world.zone_object(link)?;
    Some(Anchor {
        position: object.position,
        orientation: object.orientation,
        scale: Vec3::splat(object.scale),
    })
}

/// Orientation looking along `from -> to`, with the anchor's z-scale set to
/// the distance so a unit-length effect spans the gap.
fn beam_anchor(from: Vec3, to: Vec3) -> Anchor {
    let delta = to - from;
    let distance = delta.length();
    let orientation = if distance > f32::EPSILON {
        Quat::from_rotation_arc(Vec3::Z, delta / distance)
    } else {
        Quat::IDENTITY
    };
    Anchor {
        position: from,
        orientation,
        scale: Vec3::new(1.0, 1.0, distance),
    }
}

/// The binding's own anchor, used for `AttachType::None`
fn binding_anchor(binding: &EffectAssociation, world: &dyn WorldView) -> Option<Anchor> {
    match binding {
        EffectAssociation::Actor { source, .. } => {
            Some(Anchor::at(world.actor_position(*source)?))
        }
        EffectAssociation::Weather => Some(Anchor::at(world.observer_position())),
        EffectAssociation::Zone { link } => zone_anchor(*link, world),
    }
}

pub fn resolve_anchor(
    spec: AttachSpec,
    binding: &EffectAssociation,
    world: &dyn WorldView,
    sky: SkyParams,
) -> Option<Anchor> {
    let source = binding.source();
    let target = binding.target();
    let [joint_a, joint_b] = spec.joints;

    match spec.attach {
        AttachType::None => binding_anchor(binding, world),
        AttachType::Source => actor_anchor(source?, world),
        AttachType::Target => actor_anchor(target?, world),
        AttachType::SourceJoint => joint_anchor(binding, source?, target, joint_a, world),
        AttachType::TargetJoint => joint_anchor(binding, target?, source, joint_a, world),
        AttachType::SourceToTarget => {
            let (source, target) = (source?, target?);
            let from = binding.joint_world_position(source, Some(target), joint_a, world)?;
            let to = binding.joint_world_position(target, Some(source), joint_b, world)?;
            Some(beam_anchor(from, to))
        }
        AttachType::Sun => Some(sky_anchor(sun_direction(sky.minutes_of_day), world, sky)),
        AttachType::Moon => Some(sky_anchor(-sun_direction(sky.minutes_of_day), world, sky)),
        AttachType::ZoneObject => {
            let link = if spec.zone_link.is_none() {
                binding.zone_link()?
            } else {
                spec.zone_link
            };
            zone_anchor(link, world)
        }
    }
}

/// A path from source to target travelled in `points` discrete hops, lifted
/// by a parabolic arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowPath {
    pub points: u32,
    pub arc_height: f32,
}

impl FollowPath {
    /// Position along the path for `progress` in `[0, 1]`
    pub fn point(&self, from: Vec3, to: Vec3, progress: f32) -> Vec3 {
        let steps = self.points.max(1) as f32;
        let t = ((progress.clamp(0.0, 1.0) * steps).floor() / steps).min(1.0);
        from.lerp(to, t) + Vec3::Y * arc_lift(t, self.arc_height)
    }

    pub fn anchor(
        &self,
        binding: &EffectAssociation,
        world: &dyn WorldView,
        progress: f32,
    ) -> Option<Anchor> {
        let from = world.actor_position(binding.source()?)?;
        let to = world.actor_position(binding.target()?)?;
        let mut anchor = beam_anchor(from, to);
        anchor.position = self.point(from, to, progress);
        anchor.scale = Vec3::ONE;
        Some(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_runtime::{ActorState, SceneWorld, ZoneObject};

    const SKY: SkyParams = SkyParams {
        minutes_of_day: 720.0,
        distance: 100.0,
    };

    fn spec(attach: AttachType) -> AttachSpec {
        AttachSpec {
            attach,
            joints: [0, 0],
            zone_link: ResourceId::NONE,
        }
    }

    fn duel_world() -> SceneWorld {
        let mut world = SceneWorld::new();
        world.insert_actor(
            ActorId(1),
            ActorState::at(Vec3::ZERO).with_joint(4, Vec3::new(0.0, 2.0, 0.0)),
        );
        world.insert_actor(ActorId(2), ActorState::at(Vec3::new(0.0, 0.0, 10.0)));
        world
    }

    #[test]
    fn beam_spans_source_to_target() {
        let world = duel_world();
        let binding = EffectAssociation::actor(ActorId(1), Some(ActorId(2)));
        let anchor = resolve_anchor(spec(AttachType::SourceToTarget), &binding, &world, SKY).unwrap();
        assert!((anchor.scale.z - 10.0).abs() < 1e-4);
        // Unit z in anchor space lands on the target
        let end = anchor.transform_point(Vec3::Z);
        assert!(end.distance(Vec3::new(0.0, 0.0, 10.0)) < 1e-3);
    }

    #[test]
    fn source_joint_uses_joint_position() {
        let world = duel_world();
        let binding = EffectAssociation::actor(ActorId(1), Some(ActorId(2)));
        let mut s = spec(AttachType::SourceJoint);
        s.joints = [4, 0];
        let anchor = resolve_anchor(s, &binding, &world, SKY).unwrap();
        assert!((anchor.position.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn sun_is_overhead_at_noon_and_moon_below() {
        let mut world = SceneWorld::new();
        world.set_observer(Vec3::new(5.0, 0.0, 5.0));
        let sun = resolve_anchor(spec(AttachType::Sun), &EffectAssociation::Weather, &world, SKY).unwrap();
        assert!((sun.position - Vec3::new(5.0, 100.0, 5.0)).length() < 1e-3);
        let moon =
            resolve_anchor(spec(AttachType::Moon), &EffectAssociation::Weather, &world, SKY).unwrap();
        assert!((moon.position.y + 100.0).abs() < 1e-3);
    }

    #[test]
    fn missing_actor_or_object_yields_none() {
        let world = SceneWorld::new();
        let binding = EffectAssociation::actor(ActorId(7), None);
        assert!(resolve_anchor(spec(AttachType::Source), &binding, &world, SKY).is_none());
        let zone = EffectAssociation::Zone {
            link: ResourceId::from_name("lamp"),
        };
        assert!(resolve_anchor(spec(AttachType::ZoneObject), &zone, &world, SKY).is_none());
    }

    #[test]
    fn zone_object_from_binding_link() {
        let mut world = SceneWorld::new();
        world.insert_zone_object(
            ResourceId::from_name("lamp"),
            ZoneObject {
                position: Vec3::new(1.0, 2.0, 3.0),
                orientation: Quat::IDENTITY,
                scale: 2.0,
            },
        );
        let zone = EffectAssociation::Zone {
            link: ResourceId::from_name("lamp"),
        };
        let anchor = resolve_anchor(spec(AttachType::ZoneObject), &zone, &world, SKY).unwrap();
        assert_eq!(anchor.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(anchor.scale, Vec3::splat(2.0));
    }

    #[test]
    fn follow_path_hops_with_arc() {
        let path = FollowPath {
            points: 4,
            arc_height: 1.0,
        };
        let from = Vec3::ZERO;
        let to = Vec3::new(8.0, 0.0, 0.0);
        assert_eq!(path.point(from, to, 0.1), Vec3::ZERO);
        let mid = path.point(from, to, 0.5);
        assert!((mid.x - 4.0).abs() < 1e-4);
        assert!((mid.y - 1.0).abs() < 1e-4);
        assert!((path.point(from, to, 1.0) - to).length() < 1e-4);
    }
}
