//! Control-flow stack for effect routines
//!
//! Routines branch with a small register machine: `Condition` loads one of
//! three registers, `Branch` compares r0 against r1 using the comparator code
//! in r2, and the result decides whether the next block runs. Blocks nest;
//! a block opened while its parent is skipping is skipped as a whole.

use sigil_core::{ResourceId, Result, SigilError};

/// Comparator selected by register r2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    LessThan,
    GreaterThan,
}

impl Comparator {
    pub const EQUAL: i32 = 0;

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 | 3 => Some(Comparator::Equal),
            1 => Some(Comparator::LessThan),
            2 => Some(Comparator::GreaterThan),
            _ => None,
        }
    }

    pub fn evaluate(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Comparator::Equal => lhs == rhs,
            Comparator::LessThan => lhs < rhs,
            Comparator::GreaterThan => lhs > rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFrame {
    /// r0, r1, r2
    pub registers: [i32; 3],
    /// Inherited: an enclosing block is being skipped
    pub skipped: bool,
    /// Set by a failed branch; skips until the next block boundary
    pub skip_next: bool,
}

#[derive(Debug, Clone)]
pub struct ControlStack {
    routine: ResourceId,
    /// Routine-specific register rule: loading r0 also sets r1 = 1 and
    /// r2 = equal, and explicit loads of r1/r2 are dropped.
    fixed_comparison: bool,
    frames: Vec<ControlFrame>,
}

impl ControlStack {
    pub fn new(routine: ResourceId) -> Self {
        Self {
            routine,
            fixed_comparison: routine == ResourceId::from_name("crtl"),
            frames: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&ControlFrame> {
        self.frames.last()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Whether a non-boundary instruction should be skipped right now
    pub fn is_skipping(&self) -> bool {
        self.top().is_some_and(|f| f.skipped || f.skip_next)
    }

    fn underflow(&self) -> SigilError {
        SigilError::ControlFlowUnderflow {
            routine: self.routine.to_string(),
        }
    }

    fn top_mut(&mut self) -> Result<&mut ControlFrame> {
        let err = self.underflow();
        self.frames.last_mut().ok_or(err)
    }

    pub fn begin_block(&mut self) {
        let skipped = match self.frames.last_mut() {
            Some(parent) => {
                let skipped = parent.skipped || parent.skip_next;
                parent.skip_next = false;
                skipped
            }
            None => false,
        };
        self.frames.push(ControlFrame {
            skipped,
            ..ControlFrame::default()
        });
    }

    pub fn end_block(&mut self) -> Result<ControlFrame> {
        let err = self.underflow();
        self.frames.pop().ok_or(err)
    }

    /// Load a register in the innermost frame
    pub fn set_register(&mut self, register: u8, value: i32) -> Result<()> {
        let fixed = self.fixed_comparison;
        let routine = self.routine;
        let frame = self.top_mut()?;
        match (register, fixed) {
            (0, true) => {
                frame.registers = [value, 1, Comparator::EQUAL];
            }
            (1 | 2, true) => {
                tracing::debug!(%routine, register, "register load ignored");
            }
            (0..=2, false) => frame.registers[register as usize] = value,
            _ => {
                tracing::warn!(%routine, register, "condition targets unknown register");
            }
        }
        Ok(())
    }

    /// Compare the innermost frame's registers and arm `skip_next`.
    ///
    /// Returns the comparison result. An unknown comparator code evaluates
    /// to false.
    pub fn branch(&mut self, when_true: bool) -> Result<bool> {
        let routine = self.routine;
        let frame = self.top_mut()?;
        let [r0, r1, r2] = frame.registers;
        let result = match Comparator::from_code(r2) {
            Some(cmp) => cmp.evaluate(r0, r1),
            None => {
                tracing::error!(%routine, code = r2, "unknown comparator");
                false
            }
        };
        frame.skip_next = if when_true { !result } else { result };
        Ok(result)
    }
}
