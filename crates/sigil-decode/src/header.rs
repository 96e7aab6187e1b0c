//! Instruction headers
//!
//! Routine instructions start with a byte-oriented header:
//!
//! ```text
//! byte 0   opcode
//! byte 1   size in 32-bit words, header included
//! byte 2-3 reserved
//! ```
//!
//! Particle and generator instructions pack everything into one word:
//!
//! ```text
//! bits 0..8    opcode
//! bits 8..13   size in 32-bit words, header included (1-31)
//! bits 13..32  allocation offset
//! ```

use crate::cursor::ByteCursor;
use sigil_core::Result;

/// Bytes per instruction word
pub const WORD: usize = 4;

/// Opcode that closes a section in every table
pub const TERMINATOR: u8 = 0x00;

/// Largest size a packed particle header can express
pub const MAX_PARTICLE_WORDS: u8 = 0x1F;

/// Largest allocation offset a packed particle header can express
pub const MAX_ALLOC_OFFSET: u32 = (1 << 19) - 1;

/// Which header layout a table uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    Routine,
    Particle,
}

/// A decoded instruction header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionHeader {
    pub opcode: u8,
    pub size_words: u8,
    /// Always zero for routine instructions
    pub alloc_offset: u32,
}

impl InstructionHeader {
    pub fn read(cursor: &mut ByteCursor<'_>, format: HeaderFormat) -> Result<Self> {
        match format {
            HeaderFormat::Routine => Self::read_routine(cursor),
            HeaderFormat::Particle => Self::read_particle(cursor),
        }
    }

    pub fn read_routine(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let opcode = cursor.read_u8()?;
        let size_words = cursor.read_u8()?;
        let _reserved = cursor.read_u16()?;
        Ok(Self {
            opcode,
            size_words,
            alloc_offset: 0,
        })
    }

    pub fn read_particle(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let word = cursor.read_u32()?;
        Ok(Self::unpack_particle(word))
    }

    pub fn unpack_particle(word: u32) -> Self {
        Self {
            opcode: (word & 0xFF) as u8,
            size_words: ((word >> 8) & 0x1F) as u8,
            alloc_offset: word >> 13,
        }
    }

    pub fn pack_routine(&self) -> u32 {
        u32::from_le_bytes([self.opcode, self.size_words, 0, 0])
    }

    pub fn pack_particle(&self) -> u32 {
        (self.opcode as u32)
            | (((self.size_words & MAX_PARTICLE_WORDS) as u32) << 8)
            | ((self.alloc_offset & MAX_ALLOC_OFFSET) << 13)
    }

    /// Total encoded length of the instruction in bytes
    pub fn byte_len(&self) -> usize {
        self.size_words as usize * WORD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_header_bit_layout() {
        // opcode 0x45, 2 words, offset 0x30
        let word = 0x45 | (2 << 8) | (0x30 << 13);
        let header = InstructionHeader::unpack_particle(word);
        assert_eq!(header.opcode, 0x45);
        assert_eq!(header.size_words, 2);
        assert_eq!(header.alloc_offset, 0x30);
        assert_eq!(header.pack_particle(), word);
        assert_eq!(header.byte_len(), 8);
    }

    #[test]
    fn routine_header_byte_layout() {
        let bytes = [0x14u8, 12, 0xAA, 0xBB];
        let mut cursor = ByteCursor::new(&bytes);
        let header = InstructionHeader::read_routine(&mut cursor).unwrap();
        assert_eq!(header.opcode, 0x14);
        assert_eq!(header.size_words, 12);
        assert_eq!(header.alloc_offset, 0);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn max_offset_survives_packing() {
        let header = InstructionHeader {
            opcode: 0x03,
            size_words: MAX_PARTICLE_WORDS,
            alloc_offset: MAX_ALLOC_OFFSET,
        };
        let back = InstructionHeader::unpack_particle(header.pack_particle());
        assert_eq!(back, header);
    }
}
