//! Sigil Sequence - Effect routine sequencer
//!
//! Provides the top-level interpreter for effect routines:
//! - Frame-budgeted draining of the instruction queue
//! - Register-based branching over nested blocks
//! - Blocking and non-blocking child routines, looping and time-of-day gates
//! - `EffectSystem`, which owns every running activation

pub mod control;
pub mod handlers;
pub mod sequence;
pub mod system;

#[cfg(test)]
mod testing;

pub use control::{Comparator, ControlFrame, ControlStack};
pub use sequence::{EffectSequence, SequenceState};
pub use system::{ActivationFailure, EffectSystem};
