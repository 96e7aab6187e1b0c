//! Section walker shared by every opcode table
//!
//! Reads headers, hands each instruction to the table's parser and verifies the
//! parser consumed exactly the declared size. Opcodes the table does not know
//! are logged with their raw words and stepped over.

use crate::cursor::ByteCursor;
use crate::header::{HeaderFormat, InstructionHeader, TERMINATOR, WORD};
use sigil_core::{Result, SigilError};

/// Parses the body of one instruction; the cursor sits just past the header.
pub type Parser<T> = fn(&mut ByteCursor<'_>, &InstructionHeader) -> Result<T>;

/// How a section stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEnd {
    /// A terminator instruction closed the section
    Terminated,
    /// The stream ran out; any later sections are empty
    Exhausted,
}

/// Decode instructions until a terminator or the end of the stream.
///
/// `lookup` is the flat opcode table. Every decoded instruction is passed to
/// `emit` together with its header.
pub fn decode_section<T>(
    cursor: &mut ByteCursor<'_>,
    format: HeaderFormat,
    table_name: &str,
    lookup: fn(u8) -> Option<Parser<T>>,
    mut emit: impl FnMut(InstructionHeader, T),
) -> Result<SectionEnd> {
    loop {
        if cursor.is_at_end() {
            return Ok(SectionEnd::Exhausted);
        }

        let start = cursor.position();
        let header = InstructionHeader::read(cursor, format)?;

        if header.opcode == TERMINATOR {
            let len = header.byte_len().max(WORD);
            if len > cursor.remaining() + WORD {
                return Err(SigilError::TruncatedInstruction {
                    opcode: header.opcode,
                    start,
                    needed: len,
                    available: cursor.remaining() + WORD,
                });
            }
            cursor.seek(start + len);
            return Ok(SectionEnd::Terminated);
        }

        if header.size_words == 0 {
            return Err(SigilError::ZeroSizeInstruction {
                opcode: header.opcode,
                start,
            });
        }

        let declared = header.byte_len();
        let available = cursor.remaining() + WORD;
        if declared > available {
            return Err(SigilError::TruncatedInstruction {
                opcode: header.opcode,
                start,
                needed: declared,
                available,
            });
        }

        match lookup(header.opcode) {
            Some(parse) => {
                let item = parse(cursor, &header)?;
                let actual = cursor.position() - start;
                if actual != declared {
                    return Err(SigilError::InstructionSizeMismatch {
                        opcode: header.opcode,
                        start,
                        declared,
                        actual,
                    });
                }
                emit(header, item);
            }
            None => {
                let words = cursor.read_words(header.size_words as usize - 1)?;
                tracing::warn!(
                    table = table_name,
                    opcode = header.opcode,
                    offset = start,
                    alloc_offset = header.alloc_offset,
                    args = ?words,
                    "unknown opcode, skipping"
                );
            }
        }

        debug_assert_eq!(cursor.position(), start + declared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::InstructionWriter;

    fn read_one(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<u32> {
        c.read_u32()
    }

    // Deliberately reads one word fewer than it is declared with
    fn read_none(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<u32> {
        Ok(0)
    }

    fn echo_table(opcode: u8) -> Option<Parser<u32>> {
        match opcode {
            0x01 => Some(read_one),
            0x02 => Some(read_none),
            _ => None,
        }
    }

    #[test]
    fn unknown_opcode_is_skipped_by_declared_size() {
        let mut w = InstructionWriter::new();
        w.particle(0x7E, 0, &[1, 2, 3]);
        w.particle(0x01, 0, &[42]);
        w.terminator_particle();
        let bytes = w.finish();

        let mut cursor = ByteCursor::new(&bytes);
        let mut seen = Vec::new();
        let end = decode_section(&mut cursor, HeaderFormat::Particle, "test", echo_table, |h, v| {
            seen.push((h.opcode, v))
        })
        .unwrap();

        assert_eq!(end, SectionEnd::Terminated);
        assert_eq!(seen, vec![(0x01, 42)]);
        assert_eq!(cursor.position(), bytes.len());
    }

    #[test]
    fn short_parser_is_a_size_mismatch() {
        let mut w = InstructionWriter::new();
        w.particle(0x02, 0, &[7]);
        let bytes = w.finish();

        let mut cursor = ByteCursor::new(&bytes);
        let err = decode_section(&mut cursor, HeaderFormat::Particle, "test", echo_table, |_, _| {})
            .unwrap_err();
        assert_eq!(
            err,
            SigilError::InstructionSizeMismatch {
                opcode: 0x02,
                start: 0,
                declared: 8,
                actual: 4,
            }
        );
    }

    #[test]
    fn zero_size_and_truncation_are_fatal() {
        let zero = InstructionHeader {
            opcode: 0x01,
            size_words: 0,
            alloc_offset: 0,
        }
        .pack_particle()
        .to_le_bytes();
        let mut cursor = ByteCursor::new(&zero);
        assert!(matches!(
            decode_section(&mut cursor, HeaderFormat::Particle, "test", echo_table, |_, _| {}),
            Err(SigilError::ZeroSizeInstruction { .. })
        ));

        let long = InstructionHeader {
            opcode: 0x01,
            size_words: 4,
            alloc_offset: 0,
        }
        .pack_particle()
        .to_le_bytes();
        let mut cursor = ByteCursor::new(&long);
        assert!(matches!(
            decode_section(&mut cursor, HeaderFormat::Particle, "test", echo_table, |_, _| {}),
            Err(SigilError::TruncatedInstruction { needed: 16, available: 4, .. })
        ));
    }

    #[test]
    fn exhausted_stream_ends_section() {
        let mut w = InstructionWriter::new();
        w.particle(0x01, 0, &[5]);
        let bytes = w.finish();
        let mut cursor = ByteCursor::new(&bytes);
        let end = decode_section(&mut cursor, HeaderFormat::Particle, "test", echo_table, |_, _| {})
            .unwrap();
        assert_eq!(end, SectionEnd::Exhausted);
    }
}
