use nom::bytes::complete::take_while1;
use nom::character::complete::{char, space0};
use nom::combinator::{eof, opt, rest};
use nom::error::ParseError;
use nom::sequence::preceded;
use nom::IResult;

use super::literal::is_bin_digit;

/// Parse a comment, up to the end of the line
fn parse_comment<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, Error> {
    preceded(char('#'), rest)(input)
}

/// Parse one line of a program
///
/// A line holds at most one byte, written in base 2, which can be followed by
/// a comment. Returns the binary digits if there are any.
pub(crate) fn parse_line<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Option<&'a str>, Error> {
    let (rest, _) = space0(input)?;
    let (rest, digits) = opt(take_while1(is_bin_digit))(rest)?;
    let (rest, _) = space0(rest)?;
    let (rest, _) = opt(parse_comment)(rest)?;
    let (rest, _) = eof(rest)?;
    Ok((rest, digits))
}
