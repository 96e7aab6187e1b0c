//! Read-only world queries

use glam::{Quat, Vec3};
use sigil_core::{ActorId, ResourceId};
use std::collections::HashMap;

/// A static world object addressed by a zone link id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneObject {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
}

/// What the effect VMs may ask of the host world.
///
/// Every query can fail: actors despawn and links dangle. Callers fall back
/// rather than abort.
pub trait WorldView {
    fn actor_position(&self, actor: ActorId) -> Option<Vec3>;
    fn actor_facing(&self, actor: ActorId) -> Option<Quat>;
    /// World position of one skeleton joint
    fn joint_position(&self, actor: ActorId, joint: u8) -> Option<Vec3>;
    fn actor_scale(&self, actor: ActorId) -> Option<f32>;
    fn in_combat_stance(&self, actor: ActorId) -> bool;
    fn zone_object(&self, link: ResourceId) -> Option<ZoneObject>;
    /// Camera / listener position, used for sky anchors and distance culling
    fn observer_position(&self) -> Vec3;
}

/// One actor in a [`SceneWorld`]
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    pub position: Vec3,
    pub facing: Quat,
    pub scale: f32,
    pub combat_stance: bool,
    /// Joint offsets in the actor's local space, before scale
    pub joints: HashMap<u8, Vec3>,
}

impl ActorState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            facing: Quat::IDENTITY,
            scale: 1.0,
            combat_stance: false,
            joints: HashMap::new(),
        }
    }

    pub fn with_joint(mut self, joint: u8, offset: Vec3) -> Self {
        self.joints.insert(joint, offset);
        self
    }

    pub fn facing(mut self, facing: Quat) -> Self {
        self.facing = facing;
        self
    }
}

/// In-memory world used by tools and tests
#[derive(Debug, Clone, Default)]
pub struct SceneWorld {
    actors: HashMap<ActorId, ActorState>,
    zone_objects: HashMap<ResourceId, ZoneObject>,
    observer: Vec3,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_actor(&mut self, id: ActorId, actor: ActorState) {
        self.actors.insert(id, actor);
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<ActorState> {
        self.actors.remove(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    pub fn insert_zone_object(&mut self, link: ResourceId, object: ZoneObject) {
        self.zone_objects.insert(link, object);
    }

    pub fn set_observer(&mut self, position: Vec3) {
        self.observer = position;
    }
}

impl WorldView for SceneWorld {
    fn actor_position(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).map(|a| a.position)
    }

    fn actor_facing(&self, actor: ActorId) -> Option<Quat> {
        self.actors.get(&actor).map(|a| a.facing)
    }

    fn joint_position(&self, actor: ActorId, joint: u8) -> Option<Vec3> {
        let state = self.actors.get(&actor)?;
        let offset = state.joints.get(&joint)?;
        Some(state.position + state.facing * (*offset * state.scale))
    }

    fn actor_scale(&self, actor: ActorId) -> Option<f32> {
        self.actors.get(&actor).map(|a| a.scale)
    }

    fn in_combat_stance(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .map(|a| a.combat_stance)
            .unwrap_or(false)
    }

    fn zone_object(&self, link: ResourceId) -> Option<ZoneObject> {
        self.zone_objects.get(&link).copied()
    }

    fn observer_position(&self) -> Vec3 {
        self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_position_applies_facing_and_scale() {
        let mut world = SceneWorld::new();
        let mut actor = ActorState::at(Vec3::new(10.0, 0.0, 0.0))
            .with_joint(5, Vec3::new(0.0, 0.0, 1.0))
            .facing(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        actor.scale = 2.0;
        world.insert_actor(ActorId(1), actor);

        let p = world.joint_position(ActorId(1), 5).unwrap();
        assert!((p.x - 12.0).abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
        assert!(world.joint_position(ActorId(1), 6).is_none());
        assert!(world.joint_position(ActorId(2), 5).is_none());
    }

    #[test]
    fn missing_actor_is_not_in_combat() {
        let world = SceneWorld::new();
        assert!(!world.in_combat_stance(ActorId(9)));
        assert!(world.actor_position(ActorId(9)).is_none());
    }
}
