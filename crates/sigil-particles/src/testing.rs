//! Shared fixtures for the particle tests

use glam::Vec3;
use sigil_core::{ActorId, ResourceId, ResourcePath, SimConfig};
use sigil_decode::{ParticleGeneratorDefinition, ParticleInstruction};
use sigil_runtime::{
    ActorState, EffectAssociation, EffectContext, EffectRng, FrameClock, RecordingSink,
    ResourceDirectory, SceneWorld,
};

pub struct Harness {
    pub resources: ResourceDirectory,
    pub world: SceneWorld,
    pub sink: RecordingSink,
    pub rng: EffectRng,
    pub clock: FrameClock,
    pub config: SimConfig,
}

impl Harness {
    pub fn new() -> Self {
        let mut world = SceneWorld::new();
        world.insert_actor(ActorId(1), ActorState::at(Vec3::ZERO));
        Self {
            resources: ResourceDirectory::new(),
            world,
            sink: RecordingSink::new(),
            rng: EffectRng::new(3),
            clock: FrameClock::new(),
            config: SimConfig::default(),
        }
    }

    pub fn ctx(&mut self) -> EffectContext<'_> {
        EffectContext::new(
            &self.resources,
            &self.world,
            &mut self.sink,
            &mut self.rng,
            &self.clock,
            &self.config,
        )
    }
}

pub fn instr<K>(opcode: u8, alloc_offset: u32, op: K) -> ParticleInstruction<K> {
    ParticleInstruction {
        opcode,
        alloc_offset,
        op,
    }
}

pub fn definition(name: &str) -> ParticleGeneratorDefinition {
    ParticleGeneratorDefinition::new(ResourceId::from_name(name), ResourcePath::root())
}

pub fn binding() -> EffectAssociation {
    EffectAssociation::actor(ActorId(1), None)
}
