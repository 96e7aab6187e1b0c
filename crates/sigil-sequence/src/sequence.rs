//! Effect sequence: one running activation of an effect routine
//!
//! Each tick the sequence earns `elapsed × playback_rate` frames of budget
//! and drains its pending queue against it. The head's delay is charged
//! once; if that drives the budget negative the head waits for later ticks.
//! A blocking child halts draining until it completes. When the queue runs
//! dry the on-complete handlers run once, and a looping sequence refills
//! itself at most once per tick.

use crate::control::ControlStack;
use crate::handlers::submit_side_effect;
use sigil_core::{ResourceId, Result, SequenceId, SigilError};
use sigil_decode::{ConditionSource, Effect, EffectKind, EffectRoutineDefinition, GameStateInput};
use sigil_particles::{FollowPath, ParticleGenerator, ParticleInstance};
use sigil_runtime::{EffectAssociation, EffectContext, FrameClock, SearchScope};
use std::collections::VecDeque;
use std::sync::Arc;

/// Queue entry; `charged` records that the delay has been taken from the budget
#[derive(Debug, Clone)]
struct PendingEffect {
    effect: Effect,
    charged: bool,
}

impl PendingEffect {
    fn new(effect: Effect) -> Self {
        Self {
            effect,
            charged: false,
        }
    }
}

/// What the drain loop does after executing one instruction
enum Flow {
    Continue,
    /// Push these instructions onto the front of the queue
    Splice(Vec<Effect>),
    /// Stop draining for this tick
    Yield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// Draining, or waiting out a delay
    Running,
    /// Waiting on a blocking child
    Blocked,
    /// Held by a time-of-day gate
    Scheduled,
    /// Nothing left to execute; owned generators or children still running
    Finishing,
    Complete,
    Failed,
}

#[derive(Debug)]
pub struct EffectSequence {
    id: SequenceId,
    def: Arc<EffectRoutineDefinition>,
    binding: EffectAssociation,
    depth: u8,
    queue: VecDeque<PendingEffect>,
    control: ControlStack,
    budget: f32,
    playback_rate: f32,
    blockers: Vec<SequenceId>,
    children: Vec<EffectSequence>,
    generators: Vec<ParticleGenerator>,
    /// Opening minute of the gate currently holding the queue
    scheduled_start: Option<u16>,
    looping: bool,
    stopped: bool,
    completion_ran: bool,
    refilled_this_tick: bool,
    failure: Option<SigilError>,
}

impl EffectSequence {
    pub fn new(def: Arc<EffectRoutineDefinition>, binding: EffectAssociation, playback_rate: f32) -> Self {
        let queue = def.effects.iter().cloned().map(PendingEffect::new).collect();
        Self {
            id: SequenceId::new(),
            control: ControlStack::new(def.id),
            def,
            binding,
            depth: 0,
            queue,
            budget: 0.0,
            playback_rate,
            blockers: Vec::new(),
            children: Vec::new(),
            generators: Vec::new(),
            scheduled_start: None,
            looping: false,
            stopped: false,
            completion_ran: false,
            refilled_this_tick: false,
            failure: None,
        }
    }

    fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn definition(&self) -> &EffectRoutineDefinition {
        &self.def
    }

    pub fn routine(&self) -> ResourceId {
        self.def.id
    }

    pub fn binding(&self) -> &EffectAssociation {
        &self.binding
    }

    /// Whether the host should present this activation to remote observers
    pub fn broadcasts(&self) -> bool {
        self.binding.context().broadcast_override
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn budget(&self) -> f32 {
        self.budget
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn control(&self) -> &ControlStack {
        &self.control
    }

    pub fn children(&self) -> &[EffectSequence] {
        &self.children
    }

    pub fn generators(&self) -> &[ParticleGenerator] {
        &self.generators
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn failure(&self) -> Option<&SigilError> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Frames until the gate holding this sequence opens, if one is
    pub fn frames_until_start(&self, clock: &FrameClock) -> Option<f32> {
        self.scheduled_start.map(|minute| clock.frames_until(minute))
    }

    /// Queue and blockers are empty and nothing will refill them
    pub fn is_done_executing(&self) -> bool {
        self.queue.is_empty()
            && self.blockers.is_empty()
            && self.scheduled_start.is_none()
            && (self.completion_ran || self.def.on_complete.is_empty() || self.stopped)
            && (!self.looping || self.stopped)
    }

    /// Done executing and everything it started has finished
    pub fn is_complete(&self) -> bool {
        !self.is_failed()
            && self.is_done_executing()
            && self.generators.is_empty()
            && self.children.iter().all(EffectSequence::is_complete)
    }

    pub fn state(&self) -> SequenceState {
        if self.is_failed() {
            SequenceState::Failed
        } else if self.is_complete() {
            SequenceState::Complete
        } else if self.is_done_executing() {
            SequenceState::Finishing
        } else if !self.blockers.is_empty() {
            SequenceState::Blocked
        } else if self.scheduled_start.is_some() {
            SequenceState::Scheduled
        } else {
            SequenceState::Running
        }
    }

    /// Live particles owned by this sequence and its children
    pub fn live_particle_count(&self) -> usize {
        self.generators
            .iter()
            .map(ParticleGenerator::live_particle_count)
            .sum::<usize>()
            + self
                .children
                .iter()
                .map(EffectSequence::live_particle_count)
                .sum::<usize>()
    }

    pub fn pack_instances(&self, out: &mut Vec<ParticleInstance>) {
        for generator in &self.generators {
            generator.pack_instances(out);
        }
        for child in &self.children {
            child.pack_instances(out);
        }
    }

    /// Stop the sequence: pending work is dropped, children are stopped,
    /// owned generators stop emitting and the on-stop handlers run.
    ///
    /// Particles already alive finish naturally.
    pub fn stop(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        if self.stopped || self.is_failed() {
            return Ok(());
        }
        self.stopped = true;
        self.queue.clear();
        self.blockers.clear();
        self.control.clear();
        self.scheduled_start = None;
        for generator in &mut self.generators {
            generator.stop_emitting();
        }
        for child in &mut self.children {
            child.stop(ctx)?;
        }

        tracing::debug!(routine = %self.def.id, handlers = self.def.on_stop.len(), "sequence stopped");
        let handlers = self.def.on_stop.clone();
        let result = self.run_immediate(handlers, ctx);
        if let Err(err) = &result {
            self.fail(err.clone());
        }
        result
    }

    /// Stop child sequences running `routine`. Returns how many were stopped.
    pub fn stop_routine(&mut self, routine: ResourceId, ctx: &mut EffectContext<'_>) -> Result<usize> {
        let mut stopped = 0;
        for child in &mut self.children {
            if child.routine() == routine && !child.is_stopped() {
                child.stop(ctx)?;
                stopped += 1;
            } else {
                stopped += child.stop_routine(routine, ctx)?;
            }
        }
        Ok(stopped)
    }

    fn fail(&mut self, err: SigilError) {
        tracing::error!(routine = %self.def.id, error = %err, "sequence failed");
        self.queue.clear();
        self.blockers.clear();
        for generator in &mut self.generators {
            generator.stop_emitting();
        }
        self.failure = Some(err);
    }

    /// Advance by `elapsed` frames. A returned error has already moved the
    /// sequence to the failed state.
    pub fn advance(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) -> Result<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = self.tick(elapsed, ctx);
        if let Err(err) = &result {
            self.fail(err.clone());
        }
        result
    }

    fn tick(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) -> Result<()> {
        self.refilled_this_tick = false;
        self.advance_children(elapsed, ctx);

        self.budget += elapsed * self.playback_rate;
        self.drain(ctx)?;

        for generator in &mut self.generators {
            generator.advance(elapsed, ctx)?;
        }
        self.generators.retain(|g| !g.is_expired());
        Ok(())
    }

    fn advance_children(&mut self, elapsed: f32, ctx: &mut EffectContext<'_>) {
        for child in &mut self.children {
            if let Err(err) = child.advance(elapsed, ctx) {
                tracing::error!(
                    parent = %self.def.id,
                    child = %child.routine(),
                    error = %err,
                    "child routine failed and was dropped"
                );
            }
        }
        self.children.retain(|c| !c.is_failed() && !c.is_complete());
        let children = &self.children;
        self.blockers
            .retain(|id| children.iter().any(|c| c.id == *id));
    }

    fn drain(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        loop {
            if !self.blockers.is_empty() {
                self.budget = self.budget.min(0.0);
                return Ok(());
            }

            let Some(head) = self.queue.front_mut() else {
                if self.on_exhausted() {
                    continue;
                }
                return Ok(());
            };

            if self.control.is_skipping() && !head.effect.is_block_boundary() {
                if let Some(skipped) = self.queue.pop_front() {
                    tracing::trace!(routine = %self.def.id, effect = skipped.effect.name(), "skipped");
                }
                continue;
            }

            if !head.charged {
                self.budget -= head.effect.delay as f32;
                head.charged = true;
            }
            if self.budget < 0.0 {
                return Ok(());
            }

            let Some(pending) = self.queue.pop_front() else {
                return Ok(());
            };
            match self.execute(pending.effect, ctx)? {
                Flow::Continue => {}
                Flow::Splice(effects) => {
                    for effect in effects.into_iter().rev() {
                        self.queue.push_front(PendingEffect::new(effect));
                    }
                }
                Flow::Yield => {
                    self.budget = self.budget.min(0.0);
                    return Ok(());
                }
            }
        }
    }

    /// Queue ran dry. Returns true if it was refilled.
    fn on_exhausted(&mut self) -> bool {
        if !self.completion_ran {
            self.completion_ran = true;
            if !self.def.on_complete.is_empty() {
                self.enqueue(self.def.on_complete.clone());
                return true;
            }
        }

        if self.looping && !self.stopped && !self.refilled_this_tick {
            self.refilled_this_tick = true;
            self.control.clear();
            for generator in self.generators.iter_mut().filter(|g| g.owner() == Some(self.id)) {
                generator.stop_emitting();
            }
            self.enqueue(self.def.effects.clone());
            return !self.queue.is_empty();
        }
        false
    }

    fn enqueue(&mut self, effects: Vec<Effect>) {
        self.queue.extend(effects.into_iter().map(PendingEffect::new));
    }

    /// Run handlers to completion right away, ignoring delays.
    fn run_immediate(&mut self, effects: Vec<Effect>, ctx: &mut EffectContext<'_>) -> Result<()> {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if self.control.is_skipping() && !effect.is_block_boundary() {
                continue;
            }
            match self.execute(effect, ctx)? {
                Flow::Continue => {}
                Flow::Splice(effects) => {
                    for effect in effects.into_iter().rev() {
                        queue.push_front(effect);
                    }
                }
                // A closed gate drops the rest of the handlers
                Flow::Yield => {
                    self.queue.clear();
                    self.scheduled_start = None;
                    break;
                }
            }
        }
        self.blockers.clear();
        Ok(())
    }

    fn condition_value(&self, source: ConditionSource, ctx: &mut EffectContext<'_>) -> i32 {
        match source {
            ConditionSource::Constant(value) => value,
            ConditionSource::GameState(code) => match GameStateInput::from_code(code) {
                Some(input) => self.binding.game_state(input),
                None => {
                    tracing::warn!(routine = %self.def.id, code, "unknown game-state input");
                    0
                }
            },
            ConditionSource::Random(bound) => ctx.rng.below(bound),
            ConditionSource::Unknown { tag, value } => {
                tracing::warn!(routine = %self.def.id, tag, value, "unknown condition source");
                0
            }
        }
    }

    fn spawn_generator(&mut self, generator: ResourceId, duration: u16, follow: Option<FollowPath>, ctx: &EffectContext<'_>) {
        let Some(def) = ctx
            .resources
            .resolve_generator(generator, SearchScope::Ancestors(&self.def.origin))
        else {
            tracing::warn!(routine = %self.def.id, %generator, "generator not found");
            return;
        };
        let mut instance = ParticleGenerator::new(def, self.binding.clone())
            .with_owner(self.id)
            .with_max_lifetime(duration as f32);
        if let Some(path) = follow {
            instance = instance.with_follow_path(path);
        }
        self.generators.push(instance);
    }

    fn spawn_routine(&mut self, routine: ResourceId, blocking: bool, scope: SearchScope<'_>, ctx: &EffectContext<'_>) {
        if self.depth >= ctx.config.max_nesting_depth {
            tracing::warn!(
                routine = %self.def.id,
                child = %routine,
                depth = self.depth,
                "nesting limit reached, child routine not started"
            );
            return;
        }
        let Some(def) = ctx.resources.resolve_routine(routine, scope) else {
            tracing::warn!(routine = %self.def.id, child = %routine, "routine not found");
            return;
        };
        let child = EffectSequence::new(def, self.binding.clone(), ctx.config.playback_rate)
            .with_depth(self.depth + 1);
        if blocking {
            self.blockers.push(child.id);
        }
        self.children.push(child);
    }

    fn execute(&mut self, effect: Effect, ctx: &mut EffectContext<'_>) -> Result<Flow> {
        tracing::trace!(routine = %self.def.id, effect = effect.name(), budget = self.budget, "execute");
        if submit_side_effect(&effect, &self.binding, ctx) {
            return Ok(Flow::Continue);
        }

        match effect.kind {
            EffectKind::SpawnGenerator { generator } => {
                self.spawn_generator(generator, effect.duration, None, ctx)
            }
            EffectKind::FollowPoints {
                generator,
                points,
                arc_height,
            } => self.spawn_generator(
                generator,
                effect.duration,
                Some(FollowPath { points, arc_height }),
                ctx,
            ),
            EffectKind::StopGenerator { generator } => {
                for instance in self
                    .generators
                    .iter_mut()
                    .filter(|g| g.definition().id == generator)
                {
                    instance.stop_emitting();
                }
            }
            EffectKind::StopAllGenerators => {
                for instance in &mut self.generators {
                    instance.stop_emitting();
                }
            }
            EffectKind::SpawnRoutine { routine, blocking } => {
                let origin = self.def.origin.clone();
                self.spawn_routine(routine, blocking, SearchScope::Ancestors(&origin), ctx)
            }
            EffectKind::LinkRoutine { routine, blocking } => {
                self.spawn_routine(routine, blocking, SearchScope::Global, ctx)
            }
            EffectKind::RandomRoutine { choices } => {
                if choices.is_empty() {
                    tracing::warn!(routine = %self.def.id, "random routine without choices");
                    return Ok(Flow::Continue);
                }
                let pick = choices[ctx.rng.below(choices.len() as i32) as usize];
                let scope = SearchScope::Ancestors(&self.def.origin);
                match ctx.resources.resolve_routine(pick, scope) {
                    Some(chosen) => return Ok(Flow::Splice(chosen.effects.clone())),
                    None => tracing::warn!(routine = %self.def.id, choice = %pick, "routine not found"),
                }
            }
            EffectKind::StopRoutine { routine } => {
                if self.stop_routine(routine, ctx)? == 0 {
                    tracing::debug!(routine = %self.def.id, target = %routine, "no running child to stop");
                }
            }
            EffectKind::BeginBlock => self.control.begin_block(),
            EffectKind::EndBlock => {
                self.control.end_block()?;
            }
            EffectKind::Condition { register, source } => {
                let value = self.condition_value(source, ctx);
                self.control.set_register(register, value)?;
            }
            EffectKind::Branch { when_true } => {
                self.control.branch(when_true)?;
            }
            EffectKind::PlaybackRate { rate } => self.playback_rate = rate.max(0.0),
            EffectKind::LoopRoutine => self.looping = true,
            EffectKind::TimeOfDayGate {
                start_minute,
                end_minute,
            } => {
                if ctx.clock.in_window(start_minute, end_minute) {
                    self.scheduled_start = None;
                } else {
                    if self.scheduled_start.is_none() {
                        tracing::debug!(
                            routine = %self.def.id,
                            start_minute,
                            frames = ctx.clock.frames_until(start_minute),
                            "waiting for time of day"
                        );
                    }
                    self.scheduled_start = Some(start_minute);
                    let gate = EffectKind::TimeOfDayGate {
                        start_minute,
                        end_minute,
                    };
                    self.queue.push_front(PendingEffect {
                        effect: Effect::new(effect.opcode, effect.delay, effect.duration, gate),
                        charged: true,
                    });
                    return Ok(Flow::Yield);
                }
            }
            EffectKind::BroadcastOverride { enabled } => match self.binding.context_mut() {
                Some(context) => context.broadcast_override = enabled,
                None => tracing::debug!(routine = %self.def.id, "binding has no activation context"),
            },
            EffectKind::Snapshot { position, joints } => match self.binding.context_mut() {
                Some(context) => {
                    context.snapshot_position = position;
                    context.snapshot_joints = joints;
                }
                None => tracing::debug!(routine = %self.def.id, "binding has no activation context"),
            },
            // The delay already did the waiting
            EffectKind::Wait => {}
            other => {
                tracing::warn!(routine = %self.def.id, effect = other.name(), "instruction has no handler");
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fx, timed, Harness};
    use sigil_core::ActorId;
    use sigil_runtime::SideEffect;

    fn binding() -> EffectAssociation {
        EffectAssociation::actor(ActorId(1), Some(ActorId(2)))
    }

    fn start(def: Arc<EffectRoutineDefinition>) -> EffectSequence {
        EffectSequence::new(def, binding(), 1.0)
    }

    fn run(seq: &mut EffectSequence, h: &mut Harness, frames: usize) {
        for _ in 0..frames {
            seq.advance(1.0, &mut h.ctx()).unwrap();
            h.sink.advance(1.0);
        }
    }

    fn condition(register: u8, value: i32) -> Effect {
        fx(EffectKind::Condition {
            register,
            source: ConditionSource::Constant(value),
        })
    }

    fn spawn(name: &str) -> Effect {
        timed(
            EffectKind::SpawnGenerator {
                generator: ResourceId::from_name(name),
            },
            0,
            30,
        )
    }

    fn sound(name: &str) -> Effect {
        fx(EffectKind::PlaySound {
            sound: ResourceId::from_name(name),
            volume: 1.0,
            follow: false,
        })
    }

    /// Begin; r0, r1, r2; branch; Begin; spawn; End; End
    fn guarded_spawn(registers: [i32; 3], when_true: bool) -> Vec<Effect> {
        vec![
            fx(EffectKind::BeginBlock),
            condition(0, registers[0]),
            condition(1, registers[1]),
            condition(2, registers[2]),
            fx(EffectKind::Branch { when_true }),
            fx(EffectKind::BeginBlock),
            spawn("spark"),
            fx(EffectKind::EndBlock),
            fx(EffectKind::EndBlock),
        ]
    }

    #[test]
    fn empty_routine_is_immediately_complete() {
        let mut h = Harness::new();
        let seq = start(h.routine("none", Vec::new()));
        assert!(seq.is_complete());
        assert_eq!(seq.state(), SequenceState::Complete);
    }

    #[test]
    fn spawned_generator_emits_fifteen_particles_over_thirty_frames() {
        let mut h = Harness::new();
        h.generator("spark", 2);
        let mut seq = start(h.routine("cast", vec![spawn("spark")]));

        run(&mut seq, &mut h, 30);
        assert_eq!(seq.generators().len(), 1);
        assert_eq!(seq.generators()[0].emitted(), 15);
        assert!(!seq.generators()[0].done_emitting());

        run(&mut seq, &mut h, 1);
        assert!(seq.generators()[0].done_emitting());
        assert_eq!(seq.generators()[0].emitted(), 15);
        assert!(seq.is_done_executing());
        assert!(!seq.is_complete(), "particles are still alive");

        run(&mut seq, &mut h, 40);
        assert!(seq.is_complete());
    }

    #[test]
    fn equal_registers_run_the_true_branch_only() {
        let mut h = Harness::new();
        h.generator("spark", 2);

        let mut taken = start(h.routine("yes", guarded_spawn([5, 5, 0], true)));
        run(&mut taken, &mut h, 1);
        assert_eq!(taken.generators().len(), 1);

        let mut skipped = start(h.routine("no", guarded_spawn([5, 5, 0], false)));
        run(&mut skipped, &mut h, 1);
        assert!(skipped.generators().is_empty());
        assert_eq!(skipped.control().depth(), 0);
        assert!(skipped.is_complete());

        let mut less = start(h.routine("less", guarded_spawn([3, 5, 1], true)));
        run(&mut less, &mut h, 1);
        assert_eq!(less.generators().len(), 1);
    }

    #[test]
    fn skipped_instructions_charge_no_delay() {
        let mut h = Harness::new();
        let mut effects = guarded_spawn([1, 2, 0], true);
        effects[6] = timed(EffectKind::Wait, 50, 0);
        effects.push(sound("after"));
        let mut seq = start(h.routine("skip", effects));

        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
    }

    #[test]
    fn end_block_underflow_fails_the_sequence() {
        let mut h = Harness::new();
        let mut seq = start(h.routine("bad", vec![fx(EffectKind::EndBlock)]));
        let err = seq.advance(1.0, &mut h.ctx()).unwrap_err();
        assert!(matches!(err, SigilError::ControlFlowUnderflow { .. }));
        assert_eq!(seq.state(), SequenceState::Failed);
        assert!(!seq.is_complete());
    }

    #[test]
    fn condition_without_a_block_is_fatal() {
        let mut h = Harness::new();
        let mut seq = start(h.routine("bad", vec![condition(0, 1)]));
        assert!(seq.advance(1.0, &mut h.ctx()).is_err());
        assert!(seq.is_failed());
    }

    #[test]
    fn delays_are_charged_once_against_the_budget() {
        let mut h = Harness::new();
        let mut seq = start(h.routine(
            "slow",
            vec![timed(EffectKind::Wait, 3, 0), sound("late")],
        ));

        run(&mut seq, &mut h, 2);
        assert_eq!(h.sink.count("play-sound"), 0);
        assert!(seq.budget() < 0.0);
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
        assert!(seq.is_complete());
    }

    #[test]
    fn playback_rate_scales_the_budget() {
        let mut h = Harness::new();
        let mut seq = start(h.routine(
            "fast",
            vec![
                fx(EffectKind::PlaybackRate { rate: 2.0 }),
                timed(EffectKind::Wait, 4, 0),
                sound("done"),
            ],
        ));
        run(&mut seq, &mut h, 2);
        assert_eq!(h.sink.count("play-sound"), 0);
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
    }

    #[test]
    fn blocking_child_holds_the_parent() {
        let mut h = Harness::new();
        h.routine("child", vec![timed(EffectKind::Wait, 5, 0)]);
        let mut seq = start(h.routine(
            "parent",
            vec![
                fx(EffectKind::SpawnRoutine {
                    routine: ResourceId::from_name("child"),
                    blocking: true,
                }),
                sound("after"),
            ],
        ));

        run(&mut seq, &mut h, 1);
        assert_eq!(seq.state(), SequenceState::Blocked);
        assert!(seq.budget() <= 0.0);
        run(&mut seq, &mut h, 4);
        assert_eq!(h.sink.count("play-sound"), 0);
        run(&mut seq, &mut h, 2);
        assert_eq!(h.sink.count("play-sound"), 1);
        assert!(seq.is_complete());
    }

    #[test]
    fn non_blocking_child_runs_alongside() {
        let mut h = Harness::new();
        h.routine("child", vec![timed(EffectKind::Wait, 5, 0)]);
        let mut seq = start(h.routine(
            "parent",
            vec![
                fx(EffectKind::SpawnRoutine {
                    routine: ResourceId::from_name("child"),
                    blocking: false,
                }),
                sound("now"),
            ],
        ));
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
        assert_eq!(seq.children().len(), 1);
        assert_eq!(seq.state(), SequenceState::Finishing);
    }

    #[test]
    fn looping_refills_once_per_tick_and_stops_old_generators() {
        let mut h = Harness::new();
        h.generator("spark", 2);
        let mut seq = start(h.routine(
            "loop",
            vec![fx(EffectKind::LoopRoutine), spawn("spark"), sound("tick")],
        ));

        // First pass plus one refill per tick
        run(&mut seq, &mut h, 3);
        assert_eq!(h.sink.count("play-sound"), 4);
        assert!(seq.is_looping());
        let live_emitters = seq.generators().iter().filter(|g| !g.done_emitting()).count();
        assert_eq!(live_emitters, 1);

        seq.stop(&mut h.ctx()).unwrap();
        assert!(seq.is_done_executing());
        assert!(seq.generators().iter().all(|g| g.done_emitting()));
    }

    #[test]
    fn completion_handlers_run_once() {
        let mut h = Harness::new();
        let def = h.routine_with(
            "done",
            vec![sound("main")],
            vec![sound("complete"), fx(EffectKind::LoopRoutine)],
            Vec::new(),
        );
        assert!(def.auto_run);
        let mut seq = start(def);

        run(&mut seq, &mut h, 4);
        let complete_sounds = h
            .sink
            .effects()
            .iter()
            .filter(|e| match e {
                SideEffect::PlaySound { sound, .. } => *sound == ResourceId::from_name("complete"),
                _ => false,
            })
            .count();
        assert_eq!(complete_sounds, 1);
        assert!(h.sink.count("play-sound") >= 4, "main list keeps looping");
    }

    #[test]
    fn stop_runs_stop_handlers_and_clears_the_queue() {
        let mut h = Harness::new();
        let def = h.routine_with(
            "held",
            vec![timed(EffectKind::Wait, 100, 0), sound("never")],
            Vec::new(),
            vec![fx(EffectKind::ScreenFlash {
                color: sigil_core::Rgba::WHITE,
            })],
        );
        let mut seq = start(def);
        run(&mut seq, &mut h, 2);
        seq.stop(&mut h.ctx()).unwrap();

        assert_eq!(h.sink.count("screen-flash"), 1);
        assert_eq!(seq.pending(), 0);
        assert!(seq.is_complete());
        run(&mut seq, &mut h, 200);
        assert_eq!(h.sink.count("play-sound"), 0);
    }

    #[test]
    fn time_gate_waits_for_its_window() {
        let mut h = Harness::new();
        h.clock.set_minutes_of_day(600.0);
        let mut seq = start(h.routine(
            "dusk",
            vec![
                fx(EffectKind::TimeOfDayGate {
                    start_minute: 1080,
                    end_minute: 1200,
                }),
                sound("owl"),
            ],
        ));

        run(&mut seq, &mut h, 3);
        assert_eq!(seq.state(), SequenceState::Scheduled);
        assert!(seq.frames_until_start(&h.clock).is_some());
        assert_eq!(h.sink.count("play-sound"), 0);

        h.clock.set_minutes_of_day(1100.0);
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
        assert!(seq.is_complete());
    }

    #[test]
    fn fixed_comparison_routine_branches_on_r0_alone() {
        let mut h = Harness::new();
        h.generator("spark", 2);
        // r1 and r2 loads are dropped, r0 = 1 compares equal to the pinned r1
        let mut seq = start(h.routine("crtl", guarded_spawn([1, 7, 2], true)));
        run(&mut seq, &mut h, 1);
        assert_eq!(seq.generators().len(), 1);
    }

    #[test]
    fn random_routine_splices_a_choice() {
        let mut h = Harness::new();
        h.routine("a", vec![sound("a")]);
        h.routine("b", vec![sound("b")]);
        let mut seq = start(h.routine(
            "pick",
            vec![
                fx(EffectKind::RandomRoutine {
                    choices: vec![ResourceId::from_name("a"), ResourceId::from_name("b")],
                }),
                fx(EffectKind::FaceTarget),
            ],
        ));
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
        // The chosen routine's instructions run before the rest of the queue
        assert_eq!(h.sink.effects()[0].name(), "play-sound");
        assert_eq!(h.sink.effects()[1].name(), "face");
        assert!(seq.children().is_empty());
    }

    #[test]
    fn failed_child_is_dropped_without_failing_the_parent() {
        let mut h = Harness::new();
        h.routine("broken", vec![fx(EffectKind::EndBlock)]);
        let mut seq = start(h.routine(
            "parent",
            vec![fx(EffectKind::SpawnRoutine {
                routine: ResourceId::from_name("broken"),
                blocking: true,
            })],
        ));
        run(&mut seq, &mut h, 3);
        assert!(!seq.is_failed());
        assert!(seq.children().is_empty());
        assert!(seq.is_complete());
    }

    #[test]
    fn recursive_routines_stop_at_the_nesting_limit() {
        let mut h = Harness::new();
        h.config.max_nesting_depth = 3;
        let mut seq = start(h.routine(
            "self",
            vec![fx(EffectKind::SpawnRoutine {
                routine: ResourceId::from_name("self"),
                blocking: false,
            })],
        ));
        let mut deepest = 0;
        for _ in 0..10 {
            run(&mut seq, &mut h, 1);
            let mut depth = 0;
            let mut node = &seq;
            while let Some(child) = node.children().first() {
                depth += 1;
                node = child;
            }
            deepest = deepest.max(depth);
        }
        assert_eq!(deepest, 3);
        assert!(seq.is_complete());
    }

    #[test]
    fn missing_resources_are_skipped() {
        let mut h = Harness::new();
        let mut seq = start(h.routine(
            "gaps",
            vec![
                spawn("ghost"),
                fx(EffectKind::SpawnRoutine {
                    routine: ResourceId::from_name("nope"),
                    blocking: true,
                }),
                sound("still"),
            ],
        ));
        run(&mut seq, &mut h, 1);
        assert_eq!(h.sink.count("play-sound"), 1);
        assert!(seq.is_complete());
    }

    #[test]
    fn stop_routine_stops_a_running_child() {
        let mut h = Harness::new();
        h.routine("loop", vec![fx(EffectKind::LoopRoutine), timed(EffectKind::Wait, 2, 0)]);
        let mut seq = start(h.routine(
            "parent",
            vec![
                fx(EffectKind::SpawnRoutine {
                    routine: ResourceId::from_name("loop"),
                    blocking: false,
                }),
                timed(
                    EffectKind::StopRoutine {
                        routine: ResourceId::from_name("loop"),
                    },
                    5,
                    0,
                ),
            ],
        ));
        run(&mut seq, &mut h, 4);
        assert_eq!(seq.children().len(), 1);
        run(&mut seq, &mut h, 3);
        assert!(seq.is_complete());
    }

    #[test]
    fn snapshot_updates_the_activation_context() {
        let mut h = Harness::new();
        let mut seq = start(h.routine(
            "snap",
            vec![
                fx(EffectKind::Snapshot {
                    position: true,
                    joints: false,
                }),
                fx(EffectKind::BroadcastOverride { enabled: true }),
            ],
        ));
        run(&mut seq, &mut h, 1);
        let context = seq.binding().context();
        assert!(context.snapshot_position);
        assert!(!context.snapshot_joints);
        assert!(context.broadcast_override);
    }
}
