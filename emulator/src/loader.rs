//! Load programs from their text representation.
//!
//! A program file holds one byte per line, written in base 2. Everything
//! after a `#` is a comment, and blank lines are skipped:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Diagnostic, NamedSource, SourceSpan};
use nom::{Finish, Offset};
use thiserror::Error;
use tracing::debug;

use crate::constants::Word;
use crate::parser::line::parse_line;
use crate::parser::literal::from_binary;

#[derive(Debug, Error, Diagnostic)]
pub enum ProgramError {
    #[error("invalid line {line}")]
    #[diagnostic(help("each line holds one byte in base 2, optionally followed by a `#` comment"))]
    InvalidLine {
        line: usize,

        #[source_code]
        source_code: NamedSource<String>,

        #[label("could not parse this line")]
        span: SourceSpan,
    },

    #[error("value on line {line} does not fit in a byte")]
    ValueTooLarge {
        line: usize,

        #[source_code]
        source_code: NamedSource<String>,

        #[label("this is larger than 0b11111111")]
        span: SourceSpan,
    },

    #[error("could not read {path}")]
    Io {
        path: Utf8PathBuf,

        #[source]
        inner: std::io::Error,
    },
}

impl ProgramError {
    /// Line where the error happened, starting at 1
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::InvalidLine { line, .. } | Self::ValueTooLarge { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}

/// A program, ready to be loaded in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<Word>,
}

impl From<Vec<Word>> for Program {
    fn from(bytes: Vec<Word>) -> Self {
        Self { bytes }
    }
}

impl Program {
    /// Parse a program from its text representation
    ///
    /// # Errors
    ///
    /// Fails on the first line which is not a valid byte.
    pub fn parse(source: &str) -> Result<Self, ProgramError> {
        Self::parse_named("<input>", source)
    }

    /// Read and parse a program file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or if it is not a valid program.
    #[tracing::instrument]
    pub fn from_file(path: &Utf8Path) -> Result<Self, ProgramError> {
        let source = std::fs::read_to_string(path).map_err(|inner| ProgramError::Io {
            path: path.to_owned(),
            inner,
        })?;
        Self::parse_named(path.as_str(), &source)
    }

    fn parse_named(name: &str, source: &str) -> Result<Self, ProgramError> {
        let mut bytes = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let named = || NamedSource::new(name, source.to_owned());
            let offset = source.offset(line);

            let (_, digits) = parse_line::<()>(line).finish().map_err(|()| {
                let trimmed = line.trim();
                ProgramError::InvalidLine {
                    line: index + 1,
                    source_code: named(),
                    span: (offset + line.offset(trimmed), trimmed.len()).into(),
                }
            })?;

            let Some(digits) = digits else {
                continue;
            };

            let value = from_binary(digits)
                .ok()
                .and_then(|value| Word::try_from(value).ok())
                .ok_or_else(|| ProgramError::ValueTooLarge {
                    line: index + 1,
                    source_code: named(),
                    span: (offset + line.offset(digits), digits.len()).into(),
                })?;

            bytes.push(value);
        }

        debug!(len = bytes.len(), "Parsed program");
        Ok(Self { bytes })
    }

    #[must_use]
    pub fn bytes(&self) -> &[Word] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
