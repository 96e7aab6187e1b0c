//! Effect system: owns every running activation
//!
//! Triggers create top-level sequences; `advance` ticks them in trigger
//! order, drops the ones that completed and collects the ones that failed.

use crate::sequence::EffectSequence;
use sigil_core::{ResourceId, SequenceId, SigilError};
use sigil_decode::EffectRoutineDefinition;
use sigil_particles::ParticleInstance;
use sigil_runtime::{EffectAssociation, EffectContext, SearchScope};
use std::sync::Arc;

/// A top-level activation that ended with a fatal error
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationFailure {
    pub sequence: SequenceId,
    pub routine: ResourceId,
    pub error: SigilError,
}

#[derive(Debug, Default)]
pub struct EffectSystem {
    sequences: Vec<EffectSequence>,
    failures: Vec<ActivationFailure>,
}

impl EffectSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `routine` and start it. A missing routine is logged and
    /// yields `None`.
    pub fn trigger(
        &mut self,
        routine: ResourceId,
        scope: SearchScope<'_>,
        binding: EffectAssociation,
        ctx: &EffectContext<'_>,
    ) -> Option<SequenceId> {
        let Some(def) = ctx.resources.resolve_routine(routine, scope) else {
            tracing::warn!(%routine, "trigger for unknown routine");
            return None;
        };
        Some(self.trigger_definition(def, binding, ctx))
    }

    pub fn trigger_definition(
        &mut self,
        def: Arc<EffectRoutineDefinition>,
        binding: EffectAssociation,
        ctx: &EffectContext<'_>,
    ) -> SequenceId {
        let sequence = EffectSequence::new(def, binding, ctx.config.playback_rate);
        let id = sequence.id();
        tracing::debug!(routine = %sequence.routine(), sequence = id.raw(), "triggered");
        self.sequences.push(sequence);
        id
    }

    /// Stop one activation. Returns false if it is not running.
    pub fn stop(&mut self, id: SequenceId, ctx: &mut EffectContext<'_>) -> bool {
        let Some(sequence) = self.sequences.iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        if let Err(error) = sequence.stop(ctx) {
            self.failures.push(ActivationFailure {
                sequence: id,
                routine: sequence.routine(),
                error,
            });
        }
        true
    }

    /// Stop every top-level activation of `routine`
    pub fn stop_routine(&mut self, routine: ResourceId, ctx: &mut EffectContext<'_>) -> usize {
        let ids: Vec<SequenceId> = self
            .sequences
            .iter()
            .filter(|s| s.routine() == routine && !s.is_stopped())
            .map(EffectSequence::id)
            .collect();
        ids.into_iter().filter(|id| self.stop(*id, ctx)).count()
    }

    /// Tick every activation by `elapsed` frames
    pub fn advance(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) {
        for sequence in &mut self.sequences {
            if sequence.is_failed() {
                continue;
            }
            if let Err(error) = sequence.advance(elapsed, ctx) {
                self.failures.push(ActivationFailure {
                    sequence: sequence.id(),
                    routine: sequence.routine(),
                    error,
                });
            }
        }
        self.sequences
            .retain(|s| !s.is_failed() && !s.is_complete());
    }

    /// Failures collected since the last call
    pub fn take_failures(&mut self) -> Vec<ActivationFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn get(&self, id: SequenceId) -> Option<&EffectSequence> {
        self.sequences.iter().find(|s| s.id() == id)
    }

    pub fn sequences(&self) -> &[EffectSequence] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn live_particle_count(&self) -> usize {
        self.sequences
            .iter()
            .map(EffectSequence::live_particle_count)
            .sum()
    }

    /// Render instances for every live particle
    pub fn pack_instances(&self) -> Vec<ParticleInstance> {
        let mut out = Vec::with_capacity(self.live_particle_count());
        for sequence in &self.sequences {
            sequence.pack_instances(&mut out);
        }
        out
    }
}
