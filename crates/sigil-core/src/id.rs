//! Symbolic resource identifiers and runtime instance identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// A four-byte symbolic resource identifier, displayed as `[abcd]`.
///
/// Resource data files name routines, generators, key-frame sets, sounds and
/// animations by these ids. The all-zero id means "no resource".
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct ResourceId(pub [u8; 4]);

impl ResourceId {
    pub const NONE: Self = Self([0; 4]);

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Build an id from a string of up to four bytes, zero-padded.
    pub fn from_name(name: &str) -> Self {
        let mut bytes = [0u8; 4];
        for (slot, b) in bytes.iter_mut().zip(name.bytes()) {
            *slot = b;
        }
        Self(bytes)
    }

    /// The little-endian word this id occupies in an instruction stream.
    pub fn from_word(word: u32) -> Self {
        Self(word.to_le_bytes())
    }

    pub fn to_word(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub fn is_none(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Name without brackets, trailing zero bytes trimmed.
    pub fn name(&self) -> String {
        self.0
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| {
                if b.is_ascii_graphic() || *b == b' ' {
                    *b as char
                } else {
                    '?'
                }
            })
            .collect()
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name())
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('[').trim_end_matches(']');
        if trimmed.is_empty() || trimmed.len() > 4 {
            return Err(format!("resource id must be 1-4 bytes, got '{s}'"));
        }
        Ok(Self::from_name(trimmed))
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Location of a resource directory inside the hierarchical namespace,
/// from the root downwards. The empty path is the root.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(pub Vec<ResourceId>);

impl ResourcePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, id: ResourceId) -> Self {
        let mut segments = self.0.clone();
        segments.push(id);
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Innermost directory id, `None` at the root.
    pub fn leaf(&self) -> Option<ResourceId> {
        self.0.last().copied()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for id in &self.0 {
            write!(f, "/{}", id.name())?;
        }
        Ok(())
    }
}

/// An actor known to the host world (player, monster, NPC).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Global counters for runtime instance ids
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static NEXT_GENERATOR: AtomicU64 = AtomicU64::new(1);

/// Identifies one running effect sequence.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SequenceId(pub u64);

impl SequenceId {
    pub fn new() -> Self {
        Self(NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq#{}", self.0)
    }
}

/// Identifies one running particle generator.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct GeneratorId(pub u64);

impl GeneratorId {
    pub fn new() -> Self {
        Self(NEXT_GENERATOR.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for GeneratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_display() {
        let id = ResourceId::from_name("crtl");
        assert_eq!(id.to_string(), "[crtl]");
        let short = ResourceId::from_name("ab");
        assert_eq!(short.to_string(), "[ab]");
        assert_eq!(short.0, [b'a', b'b', 0, 0]);
    }

    #[test]
    fn test_resource_id_word_layout() {
        let id = ResourceId::from_name("fire");
        let word = id.to_word();
        assert_eq!(word.to_le_bytes(), *b"fire");
        assert_eq!(ResourceId::from_word(word), id);
    }

    #[test]
    fn test_resource_id_parse() {
        assert_eq!("[crtl]".parse::<ResourceId>().unwrap(), ResourceId::from_name("crtl"));
        assert_eq!("idle".parse::<ResourceId>().unwrap(), ResourceId::from_name("idle"));
        assert!("toolong".parse::<ResourceId>().is_err());
        assert!("".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_path_navigation() {
        let root = ResourcePath::root();
        let zone = root.child(ResourceId::from_name("zone"));
        let idle = zone.child(ResourceId::from_name("idle"));
        assert_eq!(idle.to_string(), "/zone/idle");
        assert_eq!(idle.leaf(), Some(ResourceId::from_name("idle")));
        assert_eq!(idle.parent(), Some(zone.clone()));
        assert_eq!(zone.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn test_runtime_ids_unique() {
        let a = SequenceId::new();
        let b = SequenceId::new();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
        assert_ne!(GeneratorId::new(), GeneratorId::new());
    }
}
