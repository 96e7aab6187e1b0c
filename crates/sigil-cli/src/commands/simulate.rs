//! Simulate command
//!
//! Runs one routine against a two-actor test scene and reports what it
//! asked the outside world to do.

use super::load_config;
use anyhow::{anyhow, Context, Result};
use glam::{Quat, Vec3};
use serde::Serialize;
use sigil_core::{ActorId, ResourceId};
use sigil_particles::instance_bytes;
use sigil_runtime::{
    ActorState, EffectAssociation, EffectContext, EffectRng, FrameClock, RecordingSink,
    ResourceDirectory, SceneWorld, SearchScope,
};
use sigil_sequence::EffectSystem;
use std::collections::BTreeMap;
use std::path::Path;

pub struct SimulateArgs {
    pub dir: String,
    pub routine: String,
    pub frames: u32,
    pub config: Option<String>,
    pub weather: bool,
    pub distance: f32,
    pub every: u32,
    pub format: String,
}

#[derive(Debug, Serialize)]
struct FrameSample {
    frame: u32,
    sequences: usize,
    particles: usize,
    side_effects: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    routine: String,
    frames: u32,
    completed_at: Option<u32>,
    peak_particles: usize,
    peak_instance_bytes: usize,
    side_effects: BTreeMap<&'static str, usize>,
    failures: Vec<String>,
    samples: Vec<FrameSample>,
}

/// Source at the origin facing +Z, target `distance` ahead facing back
fn test_scene(distance: f32) -> SceneWorld {
    let mut world = SceneWorld::new();
    let mut source = ActorState::at(Vec3::ZERO)
        .with_joint(0x01, Vec3::new(0.0, 1.6, 0.0))
        .with_joint(0x1A, Vec3::new(-0.3, 1.0, -0.2))
        .with_joint(0x1B, Vec3::new(0.4, 1.2, 0.3));
    for (i, joint) in (0xE0u8..=0xE7).enumerate() {
        let angle = i as f32 * std::f32::consts::FRAC_PI_4;
        source = source.with_joint(joint, Vec3::new(angle.sin(), 1.0, angle.cos()));
    }
    world.insert_actor(ActorId(1), source);
    world.insert_actor(
        ActorId(2),
        ActorState::at(Vec3::new(0.0, 0.0, distance))
            .facing(Quat::from_rotation_y(std::f32::consts::PI))
            .with_joint(0x01, Vec3::new(0.0, 1.6, 0.0)),
    );
    world.set_observer(Vec3::new(0.0, 3.0, -8.0));
    world
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let resources = ResourceDirectory::load_dir(Path::new(&args.dir), &config)
        .with_context(|| format!("Failed to load resources from {}", args.dir))?;
    let routine: ResourceId = args
        .routine
        .parse()
        .map_err(|reason: String| anyhow!(reason))?;

    let world = test_scene(args.distance);
    let binding = if args.weather {
        EffectAssociation::Weather
    } else {
        EffectAssociation::actor(ActorId(1), Some(ActorId(2)))
    };
    let mut sink = RecordingSink::new();
    let mut rng = EffectRng::new(config.rng_seed);
    let mut clock = FrameClock::from_config(&config);
    let mut system = EffectSystem::new();

    {
        let ctx = EffectContext::new(&resources, &world, &mut sink, &mut rng, &clock, &config);
        system
            .trigger(routine, SearchScope::Global, binding, &ctx)
            .ok_or_else(|| anyhow!("Routine {} not found in {}", routine, args.dir))?;
    }

    let mut report = Report {
        routine: routine.to_string(),
        frames: 0,
        completed_at: None,
        peak_particles: 0,
        peak_instance_bytes: 0,
        side_effects: BTreeMap::new(),
        failures: Vec::new(),
        samples: Vec::new(),
    };

    for frame in 1..=args.frames {
        let elapsed = clock.tick_frames(1.0);
        {
            let mut ctx =
                EffectContext::new(&resources, &world, &mut sink, &mut rng, &clock, &config);
            system.advance(elapsed, &mut ctx);
        }
        sink.advance(elapsed);

        for failure in system.take_failures() {
            report
                .failures
                .push(format!("frame {}: {} {}", frame, failure.routine, failure.error));
        }

        let instances = system.pack_instances();
        report.peak_particles = report.peak_particles.max(instances.len());
        report.peak_instance_bytes = report
            .peak_instance_bytes
            .max(instance_bytes(&instances).len());
        report.frames = frame;

        if args.every > 0 && frame % args.every == 0 {
            let sample = FrameSample {
                frame,
                sequences: system.len(),
                particles: instances.len(),
                side_effects: sink.len(),
            };
            if args.format == "text" {
                println!(
                    "frame {:>5}  sequences {:>3}  particles {:>5}  side effects {:>5}",
                    sample.frame, sample.sequences, sample.particles, sample.side_effects
                );
            }
            report.samples.push(sample);
        }

        if system.is_empty() {
            tracing::info!(routine = %routine, frame, "all activations finished");
            report.completed_at = Some(frame);
            break;
        }
    }

    for effect in sink.effects() {
        *report.side_effects.entry(effect.name()).or_default() += 1;
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_summary(&report),
        other => anyhow::bail!("Unknown format: {}", other),
    }
    Ok(())
}

fn print_summary(report: &Report) {
    println!("routine {}", report.routine);
    match report.completed_at {
        Some(frame) => println!("  completed at frame {}", frame),
        None => println!("  still running after {} frames", report.frames),
    }
    println!(
        "  peak particles {} ({} instance bytes)",
        report.peak_particles, report.peak_instance_bytes
    );
    for (name, count) in &report.side_effects {
        println!("  {:<16} {}", name, count);
    }
    for failure in &report.failures {
        println!("  failed: {}", failure);
    }
}
