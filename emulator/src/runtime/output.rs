use std::io::Write;

use crate::constants::Word;

/// Receives the values emitted by the `prn` instruction
pub trait Output {
    /// Emit one value
    ///
    /// # Errors
    ///
    /// Fails if the value could not be written out.
    fn print(&mut self, value: Word) -> std::io::Result<()>;
}

/// Collect the values, in the order they were printed
impl Output for Vec<Word> {
    fn print(&mut self, value: Word) -> std::io::Result<()> {
        self.push(value);
        Ok(())
    }
}

/// Writes each value in decimal, one per line
#[derive(Debug)]
pub struct WriteOutput<W> {
    inner: W,
}

impl<W: Write> WriteOutput<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Output for WriteOutput<W> {
    fn print(&mut self, value: Word) -> std::io::Result<()> {
        writeln!(self.inner, "{value}")?;
        self.inner.flush()
    }
}
