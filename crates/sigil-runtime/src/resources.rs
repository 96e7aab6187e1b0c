//! Hierarchical resource namespace
//!
//! Resources live in directories addressed by [`ResourcePath`]. Lookups name
//! a scope: the origin directory only, the origin and each of its ancestors up
//! to the root, or every directory starting at the root. A failed lookup is
//! normal and never an error.

use sigil_core::{ResourceId, ResourcePath, Result, SimConfig};
use sigil_decode::{
    decode_effect_routine, decode_key_frames, decode_particle_generator, EffectRoutineDefinition,
    KeyFrameSet, ParticleGeneratorDefinition,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Routine,
    Generator,
    KeyFrames,
}

impl ResourceKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Routine => "routine",
            ResourceKind::Generator => "generator",
            ResourceKind::KeyFrames => "keyframes",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "routine" => Some(ResourceKind::Routine),
            "generator" => Some(ResourceKind::Generator),
            "keyframes" => Some(ResourceKind::KeyFrames),
            _ => None,
        }
    }
}

/// A shared, decoded resource
#[derive(Debug, Clone)]
pub enum Resource {
    Routine(Arc<EffectRoutineDefinition>),
    Generator(Arc<ParticleGeneratorDefinition>),
    KeyFrames(Arc<KeyFrameSet>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Routine(_) => ResourceKind::Routine,
            Resource::Generator(_) => ResourceKind::Generator,
            Resource::KeyFrames(_) => ResourceKind::KeyFrames,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SearchScope<'a> {
    Local(&'a ResourcePath),
    Ancestors(&'a ResourcePath),
    Global,
}

pub trait ResourceResolver {
    fn resolve(&self, id: ResourceId, kind: ResourceKind, scope: SearchScope<'_>) -> Option<Resource>;

    fn resolve_routine(
        &self,
        id: ResourceId,
        scope: SearchScope<'_>,
    ) -> Option<Arc<EffectRoutineDefinition>> {
        match self.resolve(id, ResourceKind::Routine, scope)? {
            Resource::Routine(def) => Some(def),
            _ => None,
        }
    }

    fn resolve_generator(
        &self,
        id: ResourceId,
        scope: SearchScope<'_>,
    ) -> Option<Arc<ParticleGeneratorDefinition>> {
        match self.resolve(id, ResourceKind::Generator, scope)? {
            Resource::Generator(def) => Some(def),
            _ => None,
        }
    }

    fn resolve_key_frames(&self, id: ResourceId, scope: SearchScope<'_>) -> Option<Arc<KeyFrameSet>> {
        match self.resolve(id, ResourceKind::KeyFrames, scope)? {
            Resource::KeyFrames(set) => Some(set),
            _ => None,
        }
    }
}

/// In-memory resource tree
#[derive(Debug, Default, Clone)]
pub struct ResourceDirectory {
    entries: HashMap<ResourcePath, HashMap<(ResourceKind, ResourceId), Resource>>,
}

impl ResourceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: ResourcePath, id: ResourceId, resource: Resource) {
        self.entries
            .entry(path)
            .or_default()
            .insert((resource.kind(), id), resource);
    }

    pub fn insert_routine(&mut self, def: EffectRoutineDefinition) {
        let (path, id) = (def.origin.clone(), def.id);
        self.insert(path, id, Resource::Routine(Arc::new(def)));
    }

    pub fn insert_generator(&mut self, def: ParticleGeneratorDefinition) {
        let (path, id) = (def.origin.clone(), def.id);
        self.insert(path, id, Resource::Generator(Arc::new(def)));
    }

    pub fn insert_key_frames(&mut self, path: ResourcePath, set: KeyFrameSet) {
        let id = set.id;
        self.insert(path, id, Resource::KeyFrames(Arc::new(set)));
    }

    /// Number of resources across all directories
    pub fn len(&self) -> usize {
        self.entries.values().map(|d| d.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every directory path, root first, then in display order
    pub fn directories(&self) -> Vec<ResourcePath> {
        let mut paths: Vec<ResourcePath> = self.entries.keys().cloned().collect();
        paths.sort_by_key(|p| (!p.is_root(), p.to_string()));
        paths
    }

    fn lookup(&self, path: &ResourcePath, kind: ResourceKind, id: ResourceId) -> Option<Resource> {
        self.entries.get(path)?.get(&(kind, id)).cloned()
    }

    /// Load every `<id>.routine`, `<id>.generator` and `<id>.keyframes` file
    /// under `root`. Subdirectory names become path segments.
    ///
    /// Files that fail to decode are logged and skipped; I/O failures abort.
    pub fn load_dir(root: &Path, config: &SimConfig) -> Result<Self> {
        let mut dir = Self::new();
        dir.load_into(root, &ResourcePath::root(), config)?;
        tracing::debug!(root = %root.display(), resources = dir.len(), "loaded resource directory");
        Ok(dir)
    }

    fn load_into(&mut self, fs_dir: &Path, path: &ResourcePath, config: &SimConfig) -> Result<()> {
        let mut entries = std::fs::read_dir(fs_dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let fs_path = entry.path();
            let Some(stem) = fs_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id: ResourceId = match stem.parse() {
                Ok(id) => id,
                Err(reason) => {
                    tracing::warn!(file = %fs_path.display(), %reason, "skipping badly named entry");
                    continue;
                }
            };

            if fs_path.is_dir() {
                self.load_into(&fs_path, &path.child(id), config)?;
                continue;
            }

            let Some(kind) = fs_path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ResourceKind::from_extension)
            else {
                continue;
            };

            let bytes = std::fs::read(&fs_path)?;
            match decode_resource(kind, id, path, &bytes, config) {
                Ok(resource) => self.insert(path.clone(), id, resource),
                Err(err) => tracing::error!(
                    file = %fs_path.display(),
                    error = %err,
                    "failed to decode resource"
                ),
            }
        }
        Ok(())
    }
}

/// Decode one resource file's bytes by kind.
pub fn decode_resource(
    kind: ResourceKind,
    id: ResourceId,
    path: &ResourcePath,
    bytes: &[u8],
    config: &SimConfig,
) -> Result<Resource> {
    Ok(match kind {
        ResourceKind::Routine => Resource::Routine(Arc::new(decode_effect_routine(
            id,
            path.clone(),
            bytes,
            config,
        )?)),
        ResourceKind::Generator => Resource::Generator(Arc::new(decode_particle_generator(
            id,
            path.clone(),
            bytes,
        )?)),
        ResourceKind::KeyFrames => Resource::KeyFrames(Arc::new(decode_key_frames(id, bytes)?)),
    })
}

impl ResourceResolver for ResourceDirectory {
    fn resolve(&self, id: ResourceId, kind: ResourceKind, scope: SearchScope<'_>) -> Option<Resource> {
        if id.is_none() {
            return None;
        }
        match scope {
            SearchScope::Local(origin) => self.lookup(origin, kind, id),
            SearchScope::Ancestors(origin) => {
                let mut current = Some(origin.clone());
                while let Some(path) = current {
                    if let Some(found) = self.lookup(&path, kind, id) {
                        return Some(found);
                    }
                    current = path.parent();
                }
                None
            }
            SearchScope::Global => self
                .directories()
                .iter()
                .find_map(|path| self.lookup(path, kind, id)),
        }
    }
}
