//! Error types for Sigil

use thiserror::Error;

/// The main error type for Sigil operations
///
/// Only structural failures surface through this type. Missing resources and
/// unknown opcodes are logged and skipped where they occur.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SigilError {
    #[error("Instruction 0x{opcode:02x} at offset {start} consumed {actual} bytes, declared {declared}")]
    InstructionSizeMismatch {
        opcode: u8,
        start: usize,
        declared: usize,
        actual: usize,
    },

    #[error("Instruction 0x{opcode:02x} at offset {start} declares zero size")]
    ZeroSizeInstruction { opcode: u8, start: usize },

    #[error("Instruction 0x{opcode:02x} at offset {start} needs {needed} bytes, {available} remain")]
    TruncatedInstruction {
        opcode: u8,
        start: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unexpected end of data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEnd { offset: usize, wanted: usize },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Allocation offset {offset} written twice on one particle")]
    DuplicateAllocation { offset: u32 },

    #[error("No particle data allocated at offset {offset}")]
    MissingSlot { offset: u32 },

    #[error("Particle data at offset {offset} is {found}, expected {expected}")]
    SlotTypeMismatch {
        offset: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Control-flow stack underflow in routine {routine}")]
    ControlFlowUnderflow { routine: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

impl SigilError {
    /// Whether this error aborts the whole activation or decode, as opposed to
    /// a fault contained to a single particle.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SigilError::MissingSlot { .. } | SigilError::SlotTypeMismatch { .. }
        )
    }
}

/// Result type alias for Sigil operations
pub type Result<T> = std::result::Result<T, SigilError>;

impl From<std::io::Error> for SigilError {
    fn from(err: std::io::Error) -> Self {
        SigilError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for SigilError {
    fn from(err: toml::de::Error) -> Self {
        SigilError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_errors_are_contained() {
        assert!(!SigilError::MissingSlot { offset: 4 }.is_fatal());
        assert!(!SigilError::SlotTypeMismatch {
            offset: 4,
            expected: "velocity",
            found: "orbit",
        }
        .is_fatal());
        assert!(SigilError::DuplicateAllocation { offset: 4 }.is_fatal());
        assert!(SigilError::ControlFlowUnderflow {
            routine: "[crtl]".into()
        }
        .is_fatal());
    }

    #[test]
    fn size_mismatch_message() {
        let err = SigilError::InstructionSizeMismatch {
            opcode: 0x14,
            start: 8,
            declared: 48,
            actual: 44,
        };
        assert_eq!(
            err.to_string(),
            "Instruction 0x14 at offset 8 consumed 44 bytes, declared 48"
        );
    }
}
