use crate::constants::{Address, Word, REGISTER_COUNT};

/// Number of memory cells captured from the program counter onwards
pub const TRACE_WINDOW: usize = 3;

/// A snapshot of the computer state, taken between two cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub pc: Address,

    /// Memory cells at `pc`, `pc + 1` and `pc + 2`, `None` past the end of
    /// memory
    pub next: [Option<Word>; TRACE_WINDOW],

    pub registers: [Word; REGISTER_COUNT],
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TRACE: {:02X} |", self.pc)?;

        for cell in &self.next {
            match cell {
                Some(value) => write!(f, " {value:02X}")?,
                None => write!(f, " --")?,
            }
        }

        write!(f, " |")?;

        for value in &self.registers {
            write!(f, " {value:02X}")?;
        }

        Ok(())
    }
}
