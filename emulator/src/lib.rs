//! Emulator for the LS-8, a small eight-bit virtual processor.
//!
//! Programs are loaded with [`Program`], then run on a [`Machine`](runtime::Machine).

pub mod constants;
pub mod loader;
pub mod parser;
pub mod runtime;

pub use self::loader::{Program, ProgramError};
pub use self::runtime::{Machine, ProcessorError, State};
