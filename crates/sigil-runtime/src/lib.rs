//! Sigil Runtime - Collaborators shared by the particle VM and the sequencer
//!
//! Provides what an activation runs against:
//! - `EffectAssociation` - the binding (actor pair, weather, zone object)
//! - `WorldView` / `SceneWorld` - read-only actor and world queries
//! - `ResourceResolver` / `ResourceDirectory` - hierarchical resource lookup
//! - `EffectSink` / `RecordingSink` - outbound audio, animation and render commands
//! - `FrameClock`, `EffectRng` and the `EffectContext` bundle passed to every `advance`

mod association;
mod clock;
mod context;
mod resources;
mod rng;
mod sink;
mod world;

pub use association::{
    ActivationContext, AttackContext, EffectAssociation, JOINT_ROOT, JOINT_WEAPON_DRAWN,
    JOINT_WEAPON_SHEATHED, RING_JOINTS, RING_REQUESTS,
};
pub use clock::FrameClock;
pub use context::EffectContext;
pub use resources::{
    decode_resource, Resource, ResourceDirectory, ResourceKind, ResourceResolver, SearchScope,
};
pub use rng::EffectRng;
pub use sink::{ActorLock, EffectSink, RecordingSink, SideEffect, SoundHandle};
pub use world::{ActorState, SceneWorld, WorldView, ZoneObject};
