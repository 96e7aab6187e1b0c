//! Particle generator runtime
//!
//! One live instance of a `ParticleGeneratorDefinition`: resolves its anchor
//! each frame, runs the generator updaters, emits on a frame countdown and
//! owns the particles it emitted until they complete.

use crate::attach::{resolve_anchor, Anchor, AttachSpec, FollowPath, SkyParams};
use crate::instance::ParticleInstance;
use crate::particle::{Particle, SpawnScope};
use glam::{EulerRot, Quat, Vec3};
use sigil_core::{GeneratorId, Result, SequenceId};
use sigil_decode::{AttachType, GeneratorUpdater, ParticleGeneratorDefinition};
use sigil_runtime::{EffectAssociation, EffectContext};
use std::sync::Arc;

#[derive(Debug)]
pub struct ParticleGenerator {
    id: GeneratorId,
    def: Arc<ParticleGeneratorDefinition>,
    binding: EffectAssociation,
    /// Sequence that spawned this generator, if any
    owner: Option<SequenceId>,
    depth: u8,
    /// Set for generators owned by a particle; replaces attachment
    parent_anchor: Option<Anchor>,
    follow: Option<FollowPath>,
    max_lifetime: f32,
    lifetime: f32,
    countdown: f32,
    interval: f32,
    emitted: u32,
    particles: Vec<Particle>,
    anchor: Anchor,
    anchor_resolved: bool,
    base_offset: Vec3,
    drift: Vec3,
    spin: Vec3,
    jitter: Vec3,
    /// Emission window applies even to auto-run definitions
    windowed: bool,
    stop_requested: bool,
    culled: bool,
    anchor_missing_logged: bool,
}

impl ParticleGenerator {
    pub fn new(def: Arc<ParticleGeneratorDefinition>, binding: EffectAssociation) -> Self {
        let max_lifetime = def.max_age as f32;
        let interval = def.interval as f32;
        Self {
            id: GeneratorId::new(),
            def,
            binding,
            owner: None,
            depth: 0,
            parent_anchor: None,
            follow: None,
            max_lifetime,
            lifetime: 0.0,
            countdown: 0.0,
            interval,
            emitted: 0,
            particles: Vec::new(),
            anchor: Anchor::IDENTITY,
            anchor_resolved: false,
            base_offset: Vec3::ZERO,
            drift: Vec3::ZERO,
            spin: Vec3::ZERO,
            jitter: Vec3::ZERO,
            windowed: false,
            stop_requested: false,
            culled: false,
            anchor_missing_logged: false,
        }
    }

    pub fn with_owner(mut self, owner: SequenceId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Emission window in frames; zero keeps the definition's max age
    pub fn with_max_lifetime(mut self, frames: f32) -> Self {
        if frames > 0.0 {
            self.max_lifetime = frames;
        }
        self
    }

    pub fn with_emission_window(mut self) -> Self {
        self.windowed = true;
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_parent_anchor(mut self, anchor: Anchor) -> Self {
        self.set_parent_anchor(anchor);
        self
    }

    pub fn with_follow_path(mut self, path: FollowPath) -> Self {
        self.follow = Some(path);
        self
    }

    pub fn set_parent_anchor(&mut self, anchor: Anchor) {
        self.parent_anchor = Some(anchor);
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn definition(&self) -> &ParticleGeneratorDefinition {
        &self.def
    }

    pub fn owner(&self) -> Option<SequenceId> {
        self.owner
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn max_lifetime(&self) -> f32 {
        self.max_lifetime
    }

    /// Particles created so far, counting batch sub-particles
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Stop emitting here and in every generator owned by live particles
    pub fn stop_emitting(&mut self) {
        self.stop_requested = true;
        for particle in &mut self.particles {
            particle.stop_generators();
        }
    }

    pub fn done_emitting(&self) -> bool {
        self.stop_requested
            || ((!self.def.flags.auto_run || self.windowed)
                && self.lifetime > self.max_lifetime
                && self.emitted >= 1)
    }

    pub fn is_expired(&self) -> bool {
        self.done_emitting() && self.particles.is_empty()
    }

    /// Live particles, including those owned by nested generators
    pub fn live_particle_count(&self) -> usize {
        self.particles.iter().map(Particle::live_count).sum()
    }

    fn frozen(&self) -> bool {
        let context = self.binding.context();
        let joint_attached = matches!(
            self.def.attach,
            AttachType::SourceJoint | AttachType::TargetJoint | AttachType::SourceToTarget
        );
        self.anchor_resolved
            && (context.snapshot_position
                || (context.snapshot_joints && joint_attached)
                || self
                    .def
                    .generator_updaters
                    .iter()
                    .any(|u| matches!(u, GeneratorUpdater::SnapshotAnchor)))
    }

    fn update_anchor(&mut self, ctx: &EffectContext<'_>) {
        if let Some(parent) = self.parent_anchor {
            self.anchor = parent;
            self.anchor_resolved = true;
            return;
        }
        if self.frozen() {
            return;
        }

        let resolved = match self.follow {
            Some(path) => {
                let progress = if self.max_lifetime > 0.0 {
                    self.lifetime / self.max_lifetime
                } else {
                    1.0
                };
                path.anchor(&self.binding, ctx.world, progress)
            }
            None => {
                let sky = SkyParams {
                    minutes_of_day: ctx.minutes_of_day(),
                    distance: ctx.config.sky_distance,
                };
                resolve_anchor(AttachSpec::of(&self.def), &self.binding, ctx.world, sky)
            }
        };

        match resolved {
            Some(anchor) => {
                self.anchor = anchor;
                self.anchor_resolved = true;
            }
            None if !self.anchor_missing_logged => {
                tracing::warn!(
                    generator = %self.def.id,
                    attach = ?self.def.attach,
                    "anchor unavailable, keeping last position"
                );
                self.anchor_missing_logged = true;
            }
            None => {}
        }
    }

    fn run_generator_updaters(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) {
        let base_interval = self.def.interval as f32;
        for updater in &self.def.generator_updaters {
            match updater {
                GeneratorUpdater::EmissionRamp {
                    target_interval,
                    frames,
                } => {
                    if *frames <= 0.0 {
                        self.interval = *target_interval;
                    } else {
                        let step = (target_interval - base_interval) * elapsed / frames;
                        let next = self.interval + step;
                        self.interval = if step >= 0.0 {
                            next.min(*target_interval)
                        } else {
                            next.max(*target_interval)
                        };
                    }
                }
                GeneratorUpdater::BaseOffset { offset } => self.base_offset = *offset,
                GeneratorUpdater::BaseVelocity { velocity } => self.drift += *velocity * elapsed,
                GeneratorUpdater::BaseSpin { rate } => self.spin += *rate * elapsed,
                GeneratorUpdater::DistanceCull { max_distance } => {
                    let distance = ctx.world.observer_position().distance(self.anchor.position);
                    self.culled = distance > *max_distance;
                }
                GeneratorUpdater::SnapshotAnchor => {}
                GeneratorUpdater::BaseJitter { radius } => self.jitter = ctx.rng.in_sphere(*radius),
            }
        }
    }

    /// Anchor with base offset, drift, spin and jitter applied
    fn emission_anchor(&self) -> Anchor {
        let spin = Quat::from_euler(EulerRot::YXZ, self.spin.y, self.spin.x, self.spin.z);
        Anchor {
            position: self.anchor.position
                + self.anchor.orientation * self.base_offset
                + self.drift
                + self.jitter,
            orientation: self.anchor.orientation * spin,
            scale: self.anchor.scale,
        }
    }

    fn emit(&mut self, anchor: &Anchor, ctx: &mut EffectContext<'_>) -> Result<()> {
        let def: &ParticleGeneratorDefinition = &self.def;
        let scope = SpawnScope {
            def,
            binding: &self.binding,
            depth: self.depth,
        };

        for _ in 0..def.per_emission.max(1) {
            if def.flags.continuous_singleton && !self.particles.is_empty() {
                break;
            }
            if self.particles.len() >= ctx.config.max_particles_per_generator {
                tracing::debug!(generator = %def.id, "particle cap reached, emission dropped");
                break;
            }
            if def.flags.batched {
                let slots = def.batch_slots.max(1);
                let mut children = Vec::with_capacity(slots as usize);
                for _ in 0..slots {
                    let max_age = def.max_age as f32 + ctx.rng.variance(def.max_age_variance);
                    children.push(Particle::spawn(scope, max_age, anchor, ctx)?);
                }
                self.emitted += slots as u32;
                self.particles.push(Particle::carrier(def, anchor, children));
            } else {
                let max_age = def.max_age as f32 + ctx.rng.variance(def.max_age_variance);
                self.particles.push(Particle::spawn(scope, max_age, anchor, ctx)?);
                self.emitted += 1;
            }
        }
        Ok(())
    }

    /// Advance the generator and everything it owns by `elapsed` frames.
    ///
    /// Errors are fatal to the owning activation.
    pub fn advance(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) -> Result<()> {
        self.lifetime += elapsed;
        self.update_anchor(ctx);
        self.run_generator_updaters(elapsed, ctx);
        let anchor = self.emission_anchor();

        let scope = SpawnScope {
            def: &self.def,
            binding: &self.binding,
            depth: self.depth,
        };
        for particle in &mut self.particles {
            particle.advance(elapsed, &anchor, scope, ctx)?;
        }
        self.particles.retain(|p| !p.is_complete());

        if !self.culled && !self.done_emitting() {
            while self.countdown <= 0.0 {
                if self.def.flags.continuous_singleton && !self.particles.is_empty() {
                    break;
                }
                self.emit(&anchor, ctx)?;
                let step = self.interval + ctx.rng.variance(self.def.interval_variance);
                self.countdown += step.max(1.0);
            }
        }
        self.countdown -= elapsed;
        Ok(())
    }

    pub fn pack_instances(&self, out: &mut Vec<ParticleInstance>) {
        for particle in &self.particles {
            particle.pack(out);
        }
    }
}
