use parse_display::Display;
use thiserror::Error;

use crate::constants::{Word, REGISTER_COUNT};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("register index {0} is out of bounds")]
    OutOfBounds(Word),
}

/// The general purpose register file
///
/// Registers are eight bits wide, arithmetic on them wraps around.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    inner: [Word; REGISTER_COUNT],
}

impl Registers {
    /// Get the value of a register
    ///
    /// # Errors
    ///
    /// Fails if the index does not name a register.
    pub fn get(&self, index: Word) -> Result<Word, RegisterError> {
        self.inner
            .get(usize::from(index))
            .copied()
            .ok_or(RegisterError::OutOfBounds(index))
    }

    /// Set the value of a register
    ///
    /// # Errors
    ///
    /// Fails if the index does not name a register.
    pub fn set(&mut self, index: Word, value: Word) -> Result<(), RegisterError> {
        let cell = self
            .inner
            .get_mut(usize::from(index))
            .ok_or(RegisterError::OutOfBounds(index))?;
        *cell = value;
        Ok(())
    }

    /// All registers, in index order
    #[must_use]
    pub fn values(&self) -> &[Word; REGISTER_COUNT] {
        &self.inner
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, value) in self.inner.iter().enumerate() {
            if index > 0 {
                write!(f, " | ")?;
            }
            write!(f, "r{index} = {value}")?;
        }
        Ok(())
    }
}

/// A valid register name, as typed by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("r{0}")]
pub struct Reg(Word);

impl Reg {
    #[must_use]
    pub const fn index(self) -> Word {
        self.0
    }
}

impl TryFrom<Word> for Reg {
    type Error = RegisterError;

    fn try_from(index: Word) -> Result<Self, Self::Error> {
        if usize::from(index) < REGISTER_COUNT {
            Ok(Self(index))
        } else {
            Err(RegisterError::OutOfBounds(index))
        }
    }
}

#[derive(Error, Debug)]
#[error("could not parse register")]
pub struct RegisterParseError;

impl std::str::FromStr for Reg {
    type Err = RegisterParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_lowercase();
        let digits = s.strip_prefix('r').ok_or(RegisterParseError)?;
        let index: Word = digits.parse().map_err(|_| RegisterParseError)?;
        Reg::try_from(index).map_err(|_| RegisterParseError)
    }
}
