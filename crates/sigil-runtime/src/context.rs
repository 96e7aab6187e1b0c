//! The collaborator bundle threaded through every `advance`

use crate::clock::FrameClock;
use crate::resources::ResourceResolver;
use crate::rng::EffectRng;
use crate::sink::EffectSink;
use crate::world::WorldView;
use sigil_core::SimConfig;

/// Everything an activation may consult or command during a tick.
///
/// Only the sink and the RNG are mutable; definitions and world state are
/// read-only for the duration of the tick.
pub struct EffectContext<'a> {
    pub resources: &'a dyn ResourceResolver,
    pub world: &'a dyn WorldView,
    pub sink: &'a mut dyn EffectSink,
    pub rng: &'a mut EffectRng,
    pub clock: &'a FrameClock,
    pub config: &'a SimConfig,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        resources: &'a dyn ResourceResolver,
        world: &'a dyn WorldView,
        sink: &'a mut dyn EffectSink,
        rng: &'a mut EffectRng,
        clock: &'a FrameClock,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            resources,
            world,
            sink,
            rng,
            clock,
            config,
        }
    }

    pub fn minutes_of_day(&self) -> f32 {
        self.clock.minutes_of_day()
    }
}
