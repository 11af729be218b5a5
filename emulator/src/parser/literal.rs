//! Parse number literals.
//!
//! It parses base 10, base 16 (prefixed by `0x`), base 8 (prefixed by `0o`) and base 2 (prefixed
//! by `0b`) number literals.

use std::num::ParseIntError;

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    combinator::{all_consuming, map_res},
    error::{FromExternalError, ParseError, VerboseError},
    Finish, IResult,
};
use thiserror::Error;

/// Parse a decimal number
fn from_decimal(input: &str) -> Result<u64, ParseIntError> {
    input.parse()
}

/// Check if character is a decimal digit
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Parse a hexadecimal number
fn from_hexadecimal(input: &str) -> Result<u64, ParseIntError> {
    u64::from_str_radix(input, 16)
}

/// Check if character is a hexadecimal digit
fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Extract a hexadecimal literal
fn take_hexadecimal_literal<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, _) = tag_no_case("0x")(input)?;
    take_while1(is_hex_digit)(input)
}

/// Parse an octal number
fn from_octal(input: &str) -> Result<u64, ParseIntError> {
    u64::from_str_radix(input, 8)
}

/// Check if character is an octal digit
fn is_oct_digit(c: char) -> bool {
    c.is_digit(8)
}

/// Extract an octal literal
fn take_octal_literal<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, _) = tag_no_case("0o")(input)?;
    take_while1(is_oct_digit)(input)
}

/// Parse a binary number
pub(crate) fn from_binary(input: &str) -> Result<u64, ParseIntError> {
    u64::from_str_radix(input, 2)
}

/// Check if character is a binary digit
pub(crate) fn is_bin_digit(c: char) -> bool {
    c == '0' || c == '1'
}

/// Extract a binary literal
fn take_binary_literal<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, _) = tag_no_case("0b")(input)?;
    take_while1(is_bin_digit)(input)
}

/// Parse a number literal
pub fn parse_literal<'a, E>(input: &'a str) -> IResult<&'a str, u64, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    alt((
        map_res(take_hexadecimal_literal, from_hexadecimal),
        map_res(take_octal_literal, from_octal),
        map_res(take_binary_literal, from_binary),
        map_res(take_while1(is_digit), from_decimal),
    ))(input)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid number literal {0:?}")]
pub struct LiteralError(String);

/// Parse a whole string as a number literal
///
/// # Errors
///
/// Fails if the string is not exactly one literal, or if it overflows.
pub fn parse_number(input: &str) -> Result<u64, LiteralError> {
    all_consuming(parse_literal::<VerboseError<&str>>)(input.trim())
        .finish()
        .map(|(_, value)| value)
        .map_err(|_| LiteralError(input.to_owned()))
}
