//! Sigil Core - Foundational types for the effect virtual machines
//!
//! This crate provides the types every other Sigil crate depends on:
//! - `ResourceId` / `ResourcePath` - Symbolic resource identifiers and namespace paths
//! - `ActorId`, `SequenceId`, `GeneratorId` - Runtime identifiers
//! - `Rgba` - Packed and float colors
//! - `SimConfig` - TOML-backed simulation settings
//! - Error types and Result alias

mod config;
mod error;
mod id;
mod types;

pub use config::SimConfig;
pub use error::{Result, SigilError};
pub use id::{ActorId, GeneratorId, ResourceId, ResourcePath, SequenceId};
pub use types::Rgba;
