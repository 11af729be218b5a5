use std::str::FromStr;

use ls8_emulator::constants::Address;
use ls8_emulator::parser::{parse_number, LiteralError};
use ls8_emulator::runtime::Reg;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseValueError {
    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error("{0} is too large")]
    TooLarge(u64),
}

/// Parse a number literal, in any base
pub fn parse_value(input: &str) -> Result<u64, ParseValueError> {
    Ok(parse_number(input)?)
}

/// Parse a memory address
pub fn parse_address(input: &str) -> Result<Address, ParseValueError> {
    let value = parse_value(input)?;
    Address::try_from(value).map_err(|_| ParseValueError::TooLarge(value))
}

/// Where the `set` command writes a value
#[derive(Debug, Clone, Copy)]
pub enum AssignmentTarget {
    Address(Address),
    Register(Reg),
    ProgramCounter,
}

#[derive(Debug, Error)]
#[error("expected an address, a register or \"pc\", got {0:?}")]
pub struct ParseTargetError(String);

impl FromStr for AssignmentTarget {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pc") {
            return Ok(Self::ProgramCounter);
        }

        if let Ok(reg) = s.parse() {
            return Ok(Self::Register(reg));
        }

        parse_address(s)
            .map(Self::Address)
            .map_err(|_| ParseTargetError(s.to_owned()))
    }
}
