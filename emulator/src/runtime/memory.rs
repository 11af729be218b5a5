use thiserror::Error;

use crate::constants::{Address, Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address is past the end of the memory
    #[error("address {0} is out of bounds")]
    OutOfBounds(Address),
}

/// Holds the memory cells of the computer.
///
/// All cells start zeroed. The capacity is fixed when the memory is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word]>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ capacity: {}, cells: [...] }}", self.inner.len())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MEMORY_SIZE)
    }
}

impl Memory {
    /// Allocate a zeroed memory of `capacity` cells
    #[must_use]
    pub fn new(capacity: Address) -> Self {
        Self {
            inner: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Number of cells in this memory
    #[must_use]
    pub fn capacity(&self) -> Address {
        self.inner.len()
    }

    /// Read the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn read(&self, address: Address) -> Result<Word, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfBounds(address))
    }

    /// Overwrite the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn write(&mut self, address: Address, value: Word) -> Result<(), MemoryError> {
        let cell = self
            .inner
            .get_mut(address)
            .ok_or(MemoryError::OutOfBounds(address))?;
        *cell = value;
        Ok(())
    }

    /// Copy a sequence of bytes in memory, starting at `start`
    ///
    /// Nothing is written if the bytes do not fit.
    ///
    /// # Errors
    ///
    /// It fails with the first address past the end of the memory if the
    /// sequence would not fit.
    pub fn load(&mut self, bytes: &[Word], start: Address) -> Result<(), MemoryError> {
        let capacity = self.capacity();
        let end = start
            .checked_add(bytes.len())
            .ok_or(MemoryError::OutOfBounds(Address::MAX))?;

        if end > capacity {
            return Err(MemoryError::OutOfBounds(start.max(capacity)));
        }

        self.inner[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Iterate over `(address, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        self.inner.iter().copied().enumerate()
    }
}
