//! Sigil Decode - Instruction decoder for effect resources
//!
//! Turns raw resource byte streams into immutable definitions:
//! - `EffectRoutineDefinition` - ordered effect instructions plus handler sections
//! - `ParticleGeneratorDefinition` - header, generator updaters and particle instructions
//! - `KeyFrameSet` - curves sampled over particle age
//!
//! Each of the three opcode tables is a flat `opcode -> parser` match.
//! Every parser must consume exactly the declared instruction size.

pub mod cursor;
pub mod dispatch;
pub mod effect;
pub mod generator;
pub mod header;
pub mod keyframes;
pub mod particle_ops;
pub mod routine;
pub mod writer;

pub use cursor::ByteCursor;
pub use effect::{ActorTarget, ConditionSource, Effect, EffectKind, GameStateInput};
pub use generator::{
    decode_particle_generator, AttachType, GeneratorFlags, GeneratorUpdater,
    ParticleGeneratorDefinition,
};
pub use header::{HeaderFormat, InstructionHeader};
pub use keyframes::{decode_key_frames, KeyFrame, KeyFrameSet};
pub use particle_ops::{
    ExpirationHandler, Initializer, KeyFrameChannel, ParticleFamily, ParticleInstruction,
    ParticleOp, Updater,
};
pub use routine::{decode_effect_routine, EffectRoutineDefinition};
pub use writer::InstructionWriter;
