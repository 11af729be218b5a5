/// Index of a memory cell
pub type Address = usize;

/// Content of a memory cell or of a general purpose register
pub type Word = u8;

/// Default size of the computer memory
pub const MEMORY_SIZE: Address = 64;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Address where programs are loaded and where execution starts
pub const PROGRAM_START: Address = 0;

/// The top two bits of an opcode hold the number of operand bytes
pub(crate) const OPERAND_COUNT_SHIFT: u32 = 6;
pub(crate) const OPERAND_COUNT_MASK: Word = 0b11;

/// Set on instructions writing to a register. Informational only.
pub(crate) const WRITES_REGISTER: Word = 0b0010_0000;

/// The low five bits identify the operation
pub(crate) const OPERATION_MASK: Word = 0b0001_1111;

pub const HLT: Word = 0b0000_0001;
pub const LDI: Word = 0b1000_0010;
pub const PRN: Word = 0b0100_0111;
pub const NOP: Word = 0b0000_0000;
pub const ADD: Word = 0b1010_0000;
pub const MUL: Word = 0b1010_0010;
