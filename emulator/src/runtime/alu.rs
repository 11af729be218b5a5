//! Arithmetic and logic unit
//!
//! Every register-to-register operation goes through [`apply`], which reads
//! both operands from the register file and writes the result back to the
//! destination register.

use parse_display::Display;
use thiserror::Error;
use tracing::debug;

use super::registers::{RegisterError, Registers};
use crate::constants::{Word, ADD, MUL, OPERATION_MASK};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AluError {
    #[error("unsupported ALU operation {0:#07b}")]
    UnsupportedOperation(u8),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Operations implemented by the ALU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum AluOp {
    /// Wrapping addition
    Add,

    /// Wrapping multiplication
    Mul,
}

impl AluOp {
    /// Find the operation identified by the low five bits of an opcode
    ///
    /// # Errors
    ///
    /// Fails if no operation has this tag.
    pub fn from_tag(tag: u8) -> Result<Self, AluError> {
        match tag {
            t if t == ADD & OPERATION_MASK => Ok(Self::Add),
            t if t == MUL & OPERATION_MASK => Ok(Self::Mul),
            t => Err(AluError::UnsupportedOperation(t)),
        }
    }

    /// The tag identifying this operation in opcodes
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Add => ADD & OPERATION_MASK,
            Self::Mul => MUL & OPERATION_MASK,
        }
    }

    fn compute(self, a: Word, b: Word) -> Word {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Mul => a.wrapping_mul(b),
        }
    }
}

/// Compute `dest = dest <op> operand` and return the result
///
/// # Errors
///
/// Fails if any of the register indexes is invalid, in which case no register
/// is modified.
pub fn apply(
    op: AluOp,
    dest: Word,
    operand: Word,
    registers: &mut Registers,
) -> Result<Word, AluError> {
    let a = registers.get(dest)?;
    let b = registers.get(operand)?;
    let res = op.compute(a, b);
    debug!("{} {} {} = {}", a, op, b, res);
    registers.set(dest, res)?;
    Ok(res)
}
