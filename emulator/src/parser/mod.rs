//! Program and literal parsing logic
//!
//! The parsing is handled by the `nom` library.

pub(crate) mod line;
pub mod literal;

pub use literal::{parse_literal, parse_number, LiteralError};
