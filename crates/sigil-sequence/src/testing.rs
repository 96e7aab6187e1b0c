//! Shared fixtures for the sequencer tests

use glam::Vec3;
use sigil_core::{ActorId, ResourceId, ResourcePath, SimConfig};
use sigil_decode::{Effect, EffectKind, EffectRoutineDefinition, ParticleGeneratorDefinition};
use sigil_runtime::{
    ActorState, EffectContext, EffectRng, FrameClock, RecordingSink, ResourceDirectory, SceneWorld,
};
use std::sync::Arc;

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
        world.insert_actor(ActorId(2), ActorState::at(Vec3::new(0.0, 0.0, 10.0)));
        Self {
            resources: ResourceDirectory::new(),
            world,
            sink: RecordingSink::new(),
            rng: EffectRng::new(11),
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

    pub fn routine(&mut self, name: &str, effects: Vec<Effect>) -> Arc<EffectRoutineDefinition> {
        self.routine_with(name, effects, Vec::new(), Vec::new())
    }

    pub fn routine_with(
        &mut self,
        name: &str,
        effects: Vec<Effect>,
        on_complete: Vec<Effect>,
        on_stop: Vec<Effect>,
    ) -> Arc<EffectRoutineDefinition> {
        let def = EffectRoutineDefinition::from_parts(
            ResourceId::from_name(name),
            ResourcePath::root(),
            effects,
            on_complete,
            on_stop,
            &self.config,
        );
        self.resources.insert_routine(def.clone());
        Arc::new(def)
    }

    /// A generator emitting one particle every `interval` frames
    pub fn generator(&mut self, name: &str, interval: u16) {
        let mut def = ParticleGeneratorDefinition::new(ResourceId::from_name(name), ResourcePath::root());
        def.interval = interval;
        self.resources.insert_generator(def);
    }
}

/// An instruction with no delay or duration
pub fn fx(kind: EffectKind) -> Effect {
    Effect::new(0, 0, 0, kind)
}

pub fn timed(kind: EffectKind, delay: u16, duration: u16) -> Effect {
    Effect::new(0, delay, duration, kind)
}
