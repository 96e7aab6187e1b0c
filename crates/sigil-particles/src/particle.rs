//! Particle runtime state
//!
//! A particle is built by running its generator's initializers once, then
//! advanced every frame by the updater list. Per-particle state that
//! instructions carry lives in the slot map. Batched generators emit a
//! carrier particle whose children are the visible sub-particles.

use crate::attach::Anchor;
use crate::curves::{fade_in, fade_out};
use crate::data::{
    ColorTransformSlot, KeyFrameSlot, OrbitSlot, ParticleData, ParticleSlots, VelocitySlot,
};
use crate::generator::ParticleGenerator;
use crate::instance::ParticleInstance;
use glam::{EulerRot, Quat, Vec3};
use sigil_core::{ResourceId, Result, Rgba, SigilError};
use sigil_decode::{
    ExpirationHandler, Initializer, KeyFrameChannel, ParticleGeneratorDefinition,
    ParticleInstruction, Updater,
};
use sigil_runtime::{EffectAssociation, EffectContext, SearchScope, SoundHandle};

/// What a particle needs from the generator that owns it
#[derive(Clone, Copy)]
pub(crate) struct SpawnScope<'s> {
    pub def: &'s ParticleGeneratorDefinition,
    pub binding: &'s EffectAssociation,
    pub depth: u8,
}

#[derive(Debug)]
pub struct Particle {
    /// Position in anchor space
    pub position: Vec3,
    /// Euler angles in radians, applied Y then X then Z
    pub rotation: Vec3,
    pub scale: Vec3,
    pub color: Rgba,
    pub color_multiplier: Rgba,
    /// Product of fade updaters and the key-framed alpha for this frame
    pub fade: f32,
    pub height_offset: f32,
    pub scale_multiplier: f32,
    pub orbit_offset: Vec3,
    pub provider: ResourceId,
    /// Follow the live anchor instead of the anchor at emission
    pub anchored: bool,
    pub age: f32,
    max_age: f32,
    forced_expired: bool,
    expiration_handled: bool,
    restarts: u32,
    carrier: bool,
    emission_anchor: Anchor,
    slots: ParticleSlots,
    /// Batch sub-particles
    pub children: Vec<Particle>,
    /// Generators spawned by initializers and expiration handlers
    pub generators: Vec<ParticleGenerator>,
    pub sounds: Vec<SoundHandle>,
    world_position: Vec3,
    world_rotation: Quat,
    world_scale: Vec3,
}

impl Particle {
    fn blank(def: &ParticleGeneratorDefinition, max_age: f32, anchor: &Anchor) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::splat(def.base_scale),
            color: Rgba::WHITE,
            color_multiplier: Rgba::WHITE,
            fade: 1.0,
            height_offset: 0.0,
            scale_multiplier: 1.0,
            orbit_offset: Vec3::ZERO,
            provider: def.provider,
            anchored: !def.flags.world_space,
            age: 0.0,
            max_age,
            forced_expired: false,
            expiration_handled: false,
            restarts: 0,
            carrier: false,
            emission_anchor: *anchor,
            slots: ParticleSlots::new(),
            children: Vec::new(),
            generators: Vec::new(),
            sounds: Vec::new(),
            world_position: anchor.position,
            world_rotation: anchor.orientation,
            world_scale: Vec3::ONE,
        }
    }

    /// Build a particle and run the initializers.
    ///
    /// A slot error terminates just this particle; a duplicate allocation is
    /// returned to the caller.
    pub(crate) fn spawn(
        scope: SpawnScope<'_>,
        max_age: f32,
        anchor: &Anchor,
        ctx: &mut EffectContext<'_>,
    ) -> Result<Self> {
        let mut particle = Self::blank(scope.def, max_age, anchor);
        let mut deferred = Vec::new();

        for instr in &scope.def.initializers {
            if let Err(err) = particle.apply_initializer(instr, scope.def, ctx) {
                if err.is_fatal() {
                    return Err(err);
                }
                particle.force_expire(scope.def, &err);
                return Ok(particle);
            }
            if matches!(
                instr.op,
                Initializer::ChildGenerator { .. } | Initializer::Sound { .. }
            ) {
                deferred.push(&instr.op);
            }
        }

        particle.recompute(anchor);
        for op in deferred {
            match op {
                Initializer::ChildGenerator { generator } => {
                    particle.spawn_generator(*generator, false, scope, ctx)
                }
                Initializer::Sound { sound, volume } => {
                    let handle =
                        ctx.sink
                            .play_sound(*sound, particle.world_position, *volume, None);
                    particle.sounds.push(handle);
                }
                _ => {}
            }
        }
        Ok(particle)
    }

    /// An invisible particle holding one emission's batch of sub-particles
    pub(crate) fn carrier(def: &ParticleGeneratorDefinition, anchor: &Anchor, children: Vec<Particle>) -> Self {
        let mut carrier = Self::blank(def, 0.0, anchor);
        carrier.carrier = true;
        carrier.children = children;
        carrier
    }

    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    pub fn is_carrier(&self) -> bool {
        self.carrier
    }

    /// Age in `[0, 1]` over the particle's lifetime
    pub fn normalized_age(&self) -> f32 {
        if self.max_age <= 0.0 {
            1.0
        } else {
            (self.age / self.max_age).clamp(0.0, 1.0)
        }
    }

    pub fn is_expired(&self) -> bool {
        if self.carrier {
            return self.forced_expired || self.children.is_empty();
        }
        self.forced_expired || self.age >= self.max_age
    }

    /// Expired, and nothing it started is still running
    pub fn is_complete(&self) -> bool {
        self.is_expired()
            && (self.carrier || self.expiration_handled)
            && self.children.is_empty()
            && self.generators.is_empty()
            && self.sounds.is_empty()
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    pub fn world_rotation(&self) -> Quat {
        self.world_rotation
    }

    pub fn world_scale(&self) -> Vec3 {
        self.world_scale
    }

    /// Final color with multipliers and fade applied
    pub fn render_color(&self) -> Rgba {
        let mut color = self.color * self.color_multiplier;
        color.a *= self.fade;
        color.clamped()
    }

    /// The particle's transform as an anchor for generators it owns
    pub fn world_anchor(&self) -> Anchor {
        Anchor {
            position: self.world_position,
            orientation: self.world_rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn slots(&self) -> &ParticleSlots {
        &self.slots
    }

    /// Live particles in this subtree, excluding carriers
    pub fn live_count(&self) -> usize {
        let own = usize::from(!self.carrier && !self.is_expired());
        own + self.children.iter().map(Particle::live_count).sum::<usize>()
            + self
                .generators
                .iter()
                .map(ParticleGenerator::live_particle_count)
                .sum::<usize>()
    }

    fn force_expire(&mut self, def: &ParticleGeneratorDefinition, err: &SigilError) {
        tracing::error!(generator = %def.id, age = self.age, error = %err, "particle terminated");
        self.forced_expired = true;
    }

    fn apply_initializer(
        &mut self,
        instr: &ParticleInstruction<Initializer>,
        def: &ParticleGeneratorDefinition,
        ctx: &mut EffectContext<'_>,
    ) -> Result<()> {
        let offset = instr.alloc_offset;
        match &instr.op {
            Initializer::Position { offset: p } => self.position = *p,
            Initializer::PositionJitter { extent } => self.position += ctx.rng.jitter(*extent),
            Initializer::Velocity { velocity } => self.slots.allocate(
                offset,
                ParticleData::Velocity(VelocitySlot {
                    velocity: *velocity,
                    acceleration: Vec3::ZERO,
                }),
            )?,
            Initializer::VelocityJitter { extent } => {
                let jitter = ctx.rng.jitter(*extent);
                self.slots.velocity_mut(offset)?.velocity += jitter;
            }
            Initializer::Gravity { acceleration } => {
                self.slots.velocity_mut(offset)?.acceleration = *acceleration;
            }
            Initializer::Rotation { euler } => self.rotation = *euler,
            Initializer::AngularVelocity { rate } => self
                .slots
                .allocate(offset, ParticleData::AngularVelocity(*rate))?,
            Initializer::Scale { scale } => self.scale = *scale * def.base_scale,
            Initializer::ScaleVelocity { rate } => self
                .slots
                .allocate(offset, ParticleData::ScaleVelocity(*rate))?,
            Initializer::Color { color } => self.color = *color,
            Initializer::ColorJitter { extent } => {
                let j = ctx.rng.jitter_color(*extent);
                let c = self.color;
                self.color = Rgba::new(c.r + j.r, c.g + j.g, c.b + j.b, c.a + j.a).clamped();
            }
            Initializer::ColorTransform { target, frames } => self.slots.allocate(
                offset,
                ParticleData::ColorTransform(ColorTransformSlot {
                    from: self.color,
                    to: *target,
                    frames: *frames as f32,
                    elapsed: 0.0,
                }),
            )?,
            Initializer::KeyFrames { set, channel } => self.slots.allocate(
                offset,
                ParticleData::KeyFrames(KeyFrameSlot::new(*set, *channel)),
            )?,
            Initializer::Mesh { provider } => self.provider = *provider,
            // Run after the first transform is known
            Initializer::ChildGenerator { .. } | Initializer::Sound { .. } => {}
            Initializer::Orbit {
                radius,
                speed,
                phase_jitter,
            } => {
                let phase = ctx.rng.range(0.0, phase_jitter.max(0.0));
                self.slots.allocate(
                    offset,
                    ParticleData::Orbit(OrbitSlot {
                        radius: *radius,
                        speed: *speed,
                        phase,
                    }),
                )?
            }
            Initializer::AnchorRelative => self.anchored = true,
        }
        Ok(())
    }

    fn apply_updater(
        &mut self,
        instr: &ParticleInstruction<Updater>,
        elapsed: f32,
        def: &ParticleGeneratorDefinition,
        ctx: &mut EffectContext<'_>,
    ) -> Result<()> {
        let offset = instr.alloc_offset;
        match &instr.op {
            Updater::ApplyVelocity => {
                let v = self.slots.velocity_mut(offset)?;
                v.velocity += v.acceleration * elapsed;
                self.position += v.velocity * elapsed;
            }
            Updater::Damping { factor } => {
                let v = self.slots.velocity_mut(offset)?;
                v.velocity *= (1.0 - factor * elapsed).max(0.0);
            }
            Updater::ApplyAngularVelocity => {
                self.rotation += self.slots.angular_velocity(offset)? * elapsed;
            }
            Updater::ApplyScaleVelocity => {
                let rate = self.slots.scale_velocity(offset)?;
                self.scale = (self.scale + rate * elapsed).max(Vec3::ZERO);
            }
            Updater::ApplyColorTransform => {
                let t = self.slots.color_transform_mut(offset)?;
                t.elapsed += elapsed;
                self.color = t.current();
            }
            Updater::ApplyKeyFrames => {
                let progress = self.normalized_age();
                let slot = self.slots.key_frames_mut(offset)?;
                if slot.set.is_none() && !slot.unresolved {
                    slot.set = ctx
                        .resources
                        .resolve_key_frames(slot.set_id, SearchScope::Ancestors(&def.origin));
                    if slot.set.is_none() {
                        tracing::warn!(
                            generator = %def.id,
                            set = %slot.set_id,
                            "key-frame set not found"
                        );
                        slot.unresolved = true;
                    }
                }
                let sample = slot
                    .set
                    .as_ref()
                    .map(|set| (slot.channel, set.sample(progress)));
                if let Some((channel, value)) = sample {
                    self.apply_channel(channel, value);
                }
            }
            Updater::ApplyOrbit => {
                let o = self.slots.orbit_mut(offset)?;
                o.phase += o.speed * elapsed;
                self.orbit_offset = Vec3::new(o.phase.cos(), 0.0, o.phase.sin()) * o.radius;
            }
            Updater::FadeOut { frames } => {
                self.fade *= fade_out(self.age, self.max_age, *frames as f32)
            }
            Updater::FadeIn { frames } => self.fade *= fade_in(self.age, *frames as f32),
        }
        Ok(())
    }

    fn apply_channel(&mut self, channel: KeyFrameChannel, value: f32) {
        match channel {
            KeyFrameChannel::Alpha => self.fade *= value,
            KeyFrameChannel::Scale => self.scale_multiplier = value,
            KeyFrameChannel::Height => self.height_offset = value,
            KeyFrameChannel::ColorMultiplier => {
                self.color_multiplier = Rgba::new(value, value, value, 1.0)
            }
        }
    }

    fn recompute(&mut self, anchor: &Anchor) {
        let base = if self.anchored {
            *anchor
        } else {
            self.emission_anchor
        };
        let local = self.position + self.orbit_offset + Vec3::Y * self.height_offset;
        self.world_position = base.transform_point(local);
        self.world_rotation = base.orientation
            * Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z);
        self.world_scale = self.scale * self.scale_multiplier * base.scale;
    }

    /// `windowed` generators run their emission window even when the
    /// definition is auto-run; they are the ones spawned at expiration.
    fn spawn_generator(
        &mut self,
        id: ResourceId,
        windowed: bool,
        scope: SpawnScope<'_>,
        ctx: &mut EffectContext<'_>,
    ) {
        if scope.depth >= ctx.config.max_nesting_depth {
            tracing::warn!(
                generator = %id,
                depth = scope.depth,
                "nesting limit reached, child generator not spawned"
            );
            return;
        }
        let Some(def) = ctx
            .resources
            .resolve_generator(id, SearchScope::Ancestors(&scope.def.origin))
        else {
            tracing::warn!(generator = %id, parent = %scope.def.id, "child generator not found");
            return;
        };
        let mut generator = ParticleGenerator::new(def, scope.binding.clone())
            .with_depth(scope.depth + 1)
            .with_parent_anchor(self.world_anchor());
        if windowed {
            generator = generator.with_emission_window();
        }
        self.generators.push(generator);
    }

    /// Stop emission on every generator this particle or its batch owns
    pub(crate) fn stop_generators(&mut self) {
        for child in &mut self.children {
            child.stop_generators();
        }
        for generator in &mut self.generators {
            generator.stop_emitting();
        }
    }

    fn run_expiration(&mut self, scope: SpawnScope<'_>, ctx: &mut EffectContext<'_>) {
        self.expiration_handled = true;
        if self.forced_expired {
            return;
        }

        let mut restart = false;
        for instr in &scope.def.expiration {
            match &instr.op {
                ExpirationHandler::SpawnGenerator { generator } => {
                    self.spawn_generator(*generator, true, scope, ctx)
                }
                ExpirationHandler::PlaySound { sound, volume } => {
                    let handle = ctx
                        .sink
                        .play_sound(*sound, self.world_position, *volume, None);
                    self.sounds.push(handle);
                }
                ExpirationHandler::Restart { times } => restart |= self.restarts < *times,
            }
        }

        if restart {
            self.restarts += 1;
            self.age = 0.0;
            self.expiration_handled = false;
        }
    }

    /// Advance one frame: children and owned generators first, then this
    /// particle's age and updaters, then expiration.
    pub(crate) fn advance(
        &mut self,
        elapsed: f32,
        anchor: &Anchor,
        scope: SpawnScope<'_>,
        ctx: &mut EffectContext<'_>,
    ) -> Result<()> {
        for child in &mut self.children {
            child.advance(elapsed, anchor, scope, ctx)?;
        }
        self.children.retain(|c| !c.is_complete());

        let own_anchor = self.world_anchor();
        for generator in &mut self.generators {
            generator.set_parent_anchor(own_anchor);
            generator.advance(elapsed, ctx)?;
        }
        self.generators.retain(|g| !g.is_expired());
        self.sounds.retain(|h| ctx.sink.is_sound_playing(*h));

        if self.carrier {
            return Ok(());
        }

        if !self.is_expired() {
            self.age += elapsed;
            self.fade = 1.0;
            for instr in &scope.def.updaters {
                if let Err(err) = self.apply_updater(instr, elapsed, scope.def, ctx) {
                    self.force_expire(scope.def, &err);
                    break;
                }
            }
            self.recompute(anchor);
        }

        if self.is_expired() && !self.expiration_handled {
            self.stop_generators();
            self.run_expiration(scope, ctx);
        }
        Ok(())
    }

    /// Append render instances for this particle and everything it owns
    pub fn pack(&self, out: &mut Vec<ParticleInstance>) {
        if !self.carrier && !self.is_expired() {
            out.push(ParticleInstance::from_particle(self));
        }
        for child in &self.children {
            child.pack(out);
        }
        for generator in &self.generators {
            generator.pack_instances(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{binding, instr, Harness};
    use sigil_core::ResourcePath;
    use sigil_decode::{KeyFrame, KeyFrameSet};
    use sigil_runtime::RecordingSink;

    fn definition() -> ParticleGeneratorDefinition {
        crate::testing::definition("test")
    }

    #[test]
    fn velocity_and_gravity_integrate() {
        let mut def = definition();
        def.initializers = vec![
            instr(
                0x03,
                8,
                Initializer::Velocity {
                    velocity: Vec3::new(1.0, 0.0, 0.0),
                },
            ),
            instr(
                0x05,
                8,
                Initializer::Gravity {
                    acceleration: Vec3::new(0.0, -1.0, 0.0),
                },
            ),
        ];
        def.updaters = vec![instr(0x40, 8, Updater::ApplyVelocity)];

        let mut h = Harness::new();
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut p = Particle::spawn(scope, 10.0, &Anchor::IDENTITY, &mut ctx).unwrap();
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();

        assert!((p.position.x - 2.0).abs() < 1e-5);
        // v.y: -1 then -2, position sums to -3
        assert!((p.position.y + 3.0).abs() < 1e-5);
        assert!((p.age - 2.0).abs() < 1e-6);
    }

    #[test]
    fn duplicate_allocation_is_fatal() {
        let mut def = definition();
        def.initializers = vec![
            instr(0x03, 8, Initializer::Velocity { velocity: Vec3::X }),
            instr(0x07, 8, Initializer::AngularVelocity { rate: Vec3::Y }),
        ];
        let mut h = Harness::new();
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let err = Particle::spawn(scope, 10.0, &Anchor::IDENTITY, &mut h.ctx()).unwrap_err();
        assert_eq!(err, SigilError::DuplicateAllocation { offset: 8 });
    }

    #[test]
    fn missing_slot_expires_only_the_particle() {
        let mut def = definition();
        def.updaters = vec![instr(0x40, 0x30, Updater::ApplyVelocity)];
        let mut h = Harness::new();
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut p = Particle::spawn(scope, 10.0, &Anchor::IDENTITY, &mut ctx).unwrap();
        assert!(!p.is_expired());
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        assert!(p.is_expired());
        assert!(p.is_complete());
        assert!(p.age < p.max_age());
    }

    #[test]
    fn max_age_is_fixed_and_expiry_follows_age() {
        let def = definition();
        let mut h = Harness::new();
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut p = Particle::spawn(scope, 3.0, &Anchor::IDENTITY, &mut ctx).unwrap();
        for _ in 0..2 {
            p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
            assert!(!p.is_expired());
        }
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        assert!(p.is_expired());
        assert!((p.max_age() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn restart_resets_age_a_limited_number_of_times() {
        let mut def = definition();
        def.expiration = vec![instr(0x82, 0, ExpirationHandler::Restart { times: 1 })];
        let mut h = Harness::new();
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut p = Particle::spawn(scope, 2.0, &Anchor::IDENTITY, &mut ctx).unwrap();
        p.advance(2.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        assert!(!p.is_expired(), "first expiry restarts");
        assert_eq!(p.age, 0.0);
        p.advance(2.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        assert!(p.is_complete());
    }

    #[test]
    fn expiration_sound_keeps_particle_alive() {
        let mut def = definition();
        def.expiration = vec![instr(
            0x81,
            0,
            ExpirationHandler::PlaySound {
                sound: ResourceId::from_name("pop"),
                volume: 1.0,
            },
        )];
        let mut h = Harness::new();
        h.sink = RecordingSink::with_sound_length(5.0);
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };

        let mut p = {
            let mut ctx = h.ctx();
            let mut p = Particle::spawn(scope, 1.0, &Anchor::IDENTITY, &mut ctx).unwrap();
            p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
            p
        };
        assert!(p.is_expired());
        assert!(!p.is_complete());

        h.sink.advance(10.0);
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut h.ctx()).unwrap();
        assert!(p.is_complete());
    }

    #[test]
    fn key_frames_resolve_lazily_and_drive_alpha() {
        let mut def = definition();
        def.initializers = vec![instr(
            0x0D,
            4,
            Initializer::KeyFrames {
                set: ResourceId::from_name("fade"),
                channel: KeyFrameChannel::Alpha,
            },
        )];
        def.updaters = vec![instr(0x45, 4, Updater::ApplyKeyFrames)];

        let mut h = Harness::new();
        h.resources.insert_key_frames(
            ResourcePath::root(),
            KeyFrameSet::new(
                ResourceId::from_name("fade"),
                vec![
                    KeyFrame {
                        time: 0.0,
                        value: 1.0,
                    },
                    KeyFrame {
                        time: 1.0,
                        value: 0.0,
                    },
                ],
            ),
        );
        let b = binding();
        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut p = Particle::spawn(scope, 4.0, &Anchor::IDENTITY, &mut ctx).unwrap();
        p.advance(1.0, &Anchor::IDENTITY, scope, &mut ctx).unwrap();
        assert!((p.fade - 0.75).abs() < 1e-5);
        assert!((p.render_color().a - 0.75).abs() < 1e-5);
    }

    #[test]
    fn anchored_particles_follow_and_world_space_ones_stay() {
        let mut def = definition();
        def.initializers = vec![instr(
            0x01,
            0,
            Initializer::Position {
                offset: Vec3::new(0.0, 1.0, 0.0),
            },
        )];
        let mut h = Harness::new();
        let b = binding();
        let start = Anchor::at(Vec3::new(5.0, 0.0, 0.0));
        let moved = Anchor::at(Vec3::new(9.0, 0.0, 0.0));

        let scope = SpawnScope {
            def: &def,
            binding: &b,
            depth: 0,
        };
        let mut ctx = h.ctx();
        let mut anchored = Particle::spawn(scope, 10.0, &start, &mut ctx).unwrap();
        anchored.advance(1.0, &moved, scope, &mut ctx).unwrap();
        assert!((anchored.world_position() - Vec3::new(9.0, 1.0, 0.0)).length() < 1e-5);

        let mut world_def = def.clone();
        world_def.flags.world_space = true;
        let scope = SpawnScope {
            def: &world_def,
            binding: &b,
            depth: 0,
        };
        let mut loose = Particle::spawn(scope, 10.0, &start, &mut ctx).unwrap();
        loose.advance(1.0, &moved, scope, &mut ctx).unwrap();
        assert!((loose.world_position() - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
    }
}
