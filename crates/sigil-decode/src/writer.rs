//! Low-level instruction stream writer
//!
//! Used by tests and tooling to build resource byte streams word by word.
//! It knows header layouts and section terminators, nothing about individual
//! opcodes.

use crate::header::{InstructionHeader, MAX_PARTICLE_WORDS};
use sigil_core::ResourceId;

#[derive(Debug, Default, Clone)]
pub struct InstructionWriter {
    bytes: Vec<u8>,
}

impl InstructionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(&mut self, word: u32) -> &mut Self {
        self.bytes.extend_from_slice(&word.to_le_bytes());
        self
    }

    /// Routine instruction: header word, `delay/duration` word, then `args`.
    pub fn routine(&mut self, opcode: u8, delay: u16, duration: u16, args: &[u32]) -> &mut Self {
        let header = InstructionHeader {
            opcode,
            size_words: (args.len() + 2) as u8,
            alloc_offset: 0,
        };
        self.word(header.pack_routine());
        self.word(delay as u32 | ((duration as u32) << 16));
        for &arg in args {
            self.word(arg);
        }
        self
    }

    /// Routine instruction written with an explicit size, for malformed input.
    pub fn routine_raw(&mut self, opcode: u8, size_words: u8, words: &[u32]) -> &mut Self {
        self.word(u32::from_le_bytes([opcode, size_words, 0, 0]));
        for &w in words {
            self.word(w);
        }
        self
    }

    pub fn terminator_routine(&mut self) -> &mut Self {
        self.word(u32::from_le_bytes([0, 1, 0, 0]))
    }

    /// Particle or generator instruction: packed header word, then `args`.
    pub fn particle(&mut self, opcode: u8, alloc_offset: u32, args: &[u32]) -> &mut Self {
        let size = args.len() + 1;
        debug_assert!(size <= MAX_PARTICLE_WORDS as usize);
        let header = InstructionHeader {
            opcode,
            size_words: size as u8,
            alloc_offset,
        };
        self.word(header.pack_particle());
        for &arg in args {
            self.word(arg);
        }
        self
    }

    pub fn terminator_particle(&mut self) -> &mut Self {
        let header = InstructionHeader {
            opcode: 0,
            size_words: 1,
            alloc_offset: 0,
        };
        self.word(header.pack_particle())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Encode an `f32` argument word
pub fn f32_word(value: f32) -> u32 {
    value.to_bits()
}

/// Encode a resource id argument word
pub fn id_word(name: &str) -> u32 {
    ResourceId::from_name(name).to_word()
}
