use parse_display::Display;
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{self as C, Address, Word};
use crate::loader::Program;

pub mod alu;
mod instructions;
mod memory;
mod output;
mod registers;
mod trace;

pub use self::alu::{AluError, AluOp};
pub use self::instructions::{Instruction, Opcode};
pub use self::memory::{Memory, MemoryError};
pub use self::output::{Output, WriteOutput};
pub use self::registers::{Reg, RegisterError, RegisterParseError, Registers};
pub use self::trace::{Trace, TRACE_WINDOW};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("invalid memory access: {0}")]
    Memory(#[from] MemoryError),

    #[error("invalid register access: {0}")]
    Register(#[from] RegisterError),

    #[error("unsupported ALU operation {0:#07b}")]
    UnsupportedOperation(u8),

    #[error("unknown instruction {opcode:#010b} at address {pc}")]
    UnknownInstruction { opcode: Word, pc: Address },

    #[error("could not write output: {0}")]
    Output(#[from] std::io::Error),
}

// Flatten ALU errors so callers only match on one level
impl From<AluError> for ProcessorError {
    fn from(e: AluError) -> Self {
        match e {
            AluError::UnsupportedOperation(tag) => Self::UnsupportedOperation(tag),
            AluError::Register(e) => Self::Register(e),
        }
    }
}

impl ProcessorError {
    #[must_use]
    pub const fn is_unknown_instruction(&self) -> bool {
        matches!(self, Self::UnknownInstruction { .. })
    }
}

type Result<T> = std::result::Result<T, ProcessorError>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum State {
    #[default]
    Running,
    Halted,
}

/// The whole computer: memory, registers and program counter
#[derive(Debug, Default, Clone)]
pub struct Machine {
    pub memory: Memory,
    pub registers: Registers,

    /// Address of the next instruction to execute
    pub pc: Address,

    pub state: State,

    /// Number of instructions executed so far
    pub cycles: usize,
}

impl Machine {
    /// Build a machine with a non-default memory capacity
    #[must_use]
    pub fn with_memory_size(size: Address) -> Self {
        Self {
            memory: Memory::new(size),
            ..Self::default()
        }
    }

    /// Copy a program in memory, at the start address
    ///
    /// # Errors
    ///
    /// Fails if the program does not fit in memory.
    pub fn load(&mut self, program: &Program) -> std::result::Result<(), MemoryError> {
        self.load_bytes(program.bytes())
    }

    /// Copy raw bytes in memory, at the start address
    ///
    /// # Errors
    ///
    /// Fails if the bytes do not fit in memory.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub fn load_bytes(&mut self, bytes: &[Word]) -> std::result::Result<(), MemoryError> {
        self.memory.load(bytes, C::PROGRAM_START)?;
        debug!("Program loaded");
        Ok(())
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Take a snapshot of the current state, without changing it
    #[must_use]
    pub fn trace(&self) -> Trace {
        Trace {
            pc: self.pc,
            next: std::array::from_fn(|offset| {
                self.pc
                    .checked_add(offset)
                    .and_then(|address| self.memory.read(address).ok())
            }),
            registers: *self.registers.values(),
        }
    }

    /// Fetch, decode and execute one instruction
    ///
    /// On success, `pc` moves past the instruction, [`Instruction::Halt`]
    /// included. On failure, `pc` still points to the faulty instruction.
    /// Stepping a halted machine does nothing.
    ///
    /// # Errors
    ///
    /// Fails on unknown opcodes, on invalid memory or register accesses and
    /// if the output could not be written.
    #[tracing::instrument(skip(self, output), fields(pc = self.pc), level = "debug")]
    pub fn step<O: Output + ?Sized>(&mut self, output: &mut O) -> Result<State> {
        if self.is_halted() {
            return Ok(State::Halted);
        }

        let instruction = Instruction::decode(&self.memory, self.pc)?;
        info!(pc = self.pc, "Executing instruction \"{}\"", instruction);

        let next = self.pc + instruction.opcode().width();
        instruction.execute(self, output)?;
        self.pc = next;
        self.cycles += 1;

        debug!("Register state {}", self.registers);
        Ok(self.state)
    }

    /// Run until the machine halts
    ///
    /// # Errors
    ///
    /// Stops on the first error, see [`Machine::step`].
    #[tracing::instrument(skip(self, output))]
    pub fn run<O: Output + ?Sized>(&mut self, output: &mut O) -> Result<()> {
        while self.step(output)? == State::Running {}
        info!(cycles = self.cycles, "Halted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::constants::{ADD, HLT, LDI, MUL, NOP, PRN};

    /// `ldi r0, 8; ldi r1, 9; mul r0, r1; prn r0; hlt`
    const MULT_PROGRAM: [Word; 12] = [
        0x82, 0x00, 0x08, 0x82, 0x01, 0x09, 0xA2, 0x00, 0x01, 0x47, 0x00, 0x01,
    ];

    fn machine(bytes: &[Word]) -> Machine {
        let mut machine = Machine::default();
        machine.load_bytes(bytes).unwrap();
        machine
    }

    fn run(bytes: &[Word]) -> (Machine, Vec<Word>, Result<()>) {
        let mut machine = machine(bytes);
        let mut output = Vec::new();
        let res = machine.run(&mut output);
        (machine, output, res)
    }

    #[test]
    fn halt_test() {
        let (machine, output, res) = run(&[HLT]);
        res.unwrap();
        assert_eq!(machine.state, State::Halted);
        assert_eq!(machine.pc, 1);
        assert_eq!(machine.cycles, 1);
        assert!(output.is_empty());
    }

    #[test]
    fn pc_after_halt_test() {
        let (machine, _, res) = run(&[NOP, LDI, 0, 8, PRN, 0, HLT, 0xFF]);
        res.unwrap();
        assert!(machine.is_halted());
        assert_eq!(machine.pc, 7);
    }

    #[test]
    fn load_print_test() {
        for value in [0, 1, 42, 255] {
            let (_, output, res) = run(&[LDI, 5, value, PRN, 5, HLT]);
            res.unwrap();
            assert_eq!(output, vec![value]);
        }
    }

    #[test]
    fn multiply_commutative_test() {
        let (machine, output, res) = run(&[LDI, 0, 3, LDI, 1, 4, MUL, 0, 1, PRN, 0, HLT]);
        res.unwrap();
        assert_eq!(output, vec![12]);
        assert_eq!(machine.registers.get(1), Ok(4));

        let (machine, output, res) = run(&[LDI, 0, 3, LDI, 1, 4, MUL, 1, 0, PRN, 1, HLT]);
        res.unwrap();
        assert_eq!(output, vec![12]);
        assert_eq!(machine.registers.get(0), Ok(3));
    }

    #[test]
    fn add_test() {
        let (_, output, res) = run(&[LDI, 2, 40, LDI, 3, 2, ADD, 2, 3, PRN, 2, HLT]);
        res.unwrap();
        assert_eq!(output, vec![42]);
    }

    #[test]
    fn arithmetic_wraps_test() {
        // 200 * 2 = 400 = 144 mod 256, then 144 + 200 = 344 = 88 mod 256
        let (_, output, res) = run(&[
            LDI, 0, 200, LDI, 1, 2, LDI, 2, 200, MUL, 0, 1, PRN, 0, ADD, 0, 2, PRN, 0, HLT,
        ]);
        res.unwrap();
        assert_eq!(output, vec![144, 88]);
    }

    #[test]
    fn mult_program_test() {
        let (machine, output, res) = run(&MULT_PROGRAM);
        res.unwrap();
        assert_eq!(output, vec![72]);
        assert!(machine.is_halted());
        assert_eq!(machine.pc, MULT_PROGRAM.len());
        assert_eq!(machine.pc, 12);
        assert_eq!(machine.cycles, 5);
    }

    #[test]
    fn mult_program_without_halt_test() {
        // The rest of the memory is zero, which decodes as `nop`, until the
        // program counter falls off the end of memory
        let (machine, output, res) = run(&MULT_PROGRAM[..11]);
        assert!(matches!(
            res,
            Err(ProcessorError::Memory(MemoryError::OutOfBounds(C::MEMORY_SIZE)))
        ));
        assert_eq!(output, vec![72]);
        assert!(!machine.is_halted());
        assert_eq!(machine.pc, C::MEMORY_SIZE);
    }

    #[test]
    fn mult_program_into_garbage_test() {
        let mut program = MULT_PROGRAM;
        program[11] = 0b1111_1111;
        let (machine, output, res) = run(&program);
        assert!(matches!(
            res,
            Err(ProcessorError::UnknownInstruction {
                opcode: 0b1111_1111,
                pc: 11
            })
        ));
        assert!(res.unwrap_err().is_unknown_instruction());
        assert_eq!(output, vec![72]);
        assert_eq!(machine.state, State::Running);
        assert_eq!(machine.pc, 11);
        assert_eq!(machine.cycles, 4);
    }

    #[test]
    fn unsupported_alu_operation_test() {
        let (machine, output, res) = run(&[LDI, 0, 1, PRN, 0, 0b1010_0111, 0, 1, HLT]);
        assert!(matches!(res, Err(ProcessorError::UnsupportedOperation(0b00111))));
        assert_eq!(output, vec![1]);
        assert_eq!(machine.pc, 5);
        assert_eq!(machine.state, State::Running);
        assert_eq!(machine.cycles, 2);
    }

    #[test]
    fn unknown_instruction_does_not_advance_test() {
        let mut machine = machine(&[0b1111_1111]);
        let mut output = Vec::new();
        for _ in 0..3 {
            assert!(matches!(
                machine.step(&mut output),
                Err(ProcessorError::UnknownInstruction { pc: 0, .. })
            ));
            assert_eq!(machine.pc, 0);
        }
        assert_eq!(machine.cycles, 0);
    }

    #[test]
    fn width_advance_test() {
        // One instruction for each operand count, `00`, `01` and `10`
        let program = [NOP, HLT, PRN, 0, LDI, 0, 1, MUL, 0, 0, ADD, 0, 0];
        let mut machine = machine(&program);
        let mut output = Vec::new();

        let mut pc = 0;
        while pc < program.len() {
            let width = Opcode(program[pc]).width();
            machine.pc = pc;
            machine.state = State::Running;
            machine.step(&mut output).unwrap();
            assert_eq!(machine.pc, pc + width, "at address {pc}");
            pc += width;
        }

        assert_eq!(Opcode(NOP).width(), 1);
        assert_eq!(Opcode(HLT).width(), 1);
        assert_eq!(Opcode(PRN).width(), 2);
        assert_eq!(Opcode(LDI).width(), 3);
        assert_eq!(Opcode(MUL).width(), 3);
    }

    #[test]
    fn invalid_register_test() {
        let (machine, _, res) = run(&[NOP, LDI, 8, 1, HLT]);
        assert!(matches!(
            res,
            Err(ProcessorError::Register(RegisterError::OutOfBounds(8)))
        ));
        assert_eq!(machine.pc, 1);
        assert_eq!(machine.registers, Registers::default());

        let (_, output, res) = run(&[PRN, 200, HLT]);
        assert!(matches!(
            res,
            Err(ProcessorError::Register(RegisterError::OutOfBounds(200)))
        ));
        assert!(output.is_empty());

        let (_, _, res) = run(&[MUL, 0, 12, HLT]);
        assert!(matches!(
            res,
            Err(ProcessorError::Register(RegisterError::OutOfBounds(12)))
        ));
    }

    #[test]
    fn truncated_instruction_test() {
        let mut machine = Machine::with_memory_size(2);
        machine.load_bytes(&[NOP, LDI]).unwrap();
        let res = machine.run(&mut Vec::new());
        assert!(matches!(
            res,
            Err(ProcessorError::Memory(MemoryError::OutOfBounds(2)))
        ));
        assert_eq!(machine.pc, 1);
    }

    #[test]
    fn step_when_halted_test() {
        let mut machine = machine(&[HLT, LDI, 0, 1]);
        let mut output = Vec::new();
        assert_eq!(machine.step(&mut output).unwrap(), State::Halted);
        assert_eq!(machine.step(&mut output).unwrap(), State::Halted);
        assert_eq!(machine.pc, 1);
        assert_eq!(machine.cycles, 1);
        assert_eq!(machine.registers.get(0), Ok(0));
    }

    #[test]
    fn step_test() {
        let mut machine = machine(&MULT_PROGRAM);
        let mut output = Vec::new();

        assert_eq!(machine.step(&mut output).unwrap(), State::Running);
        assert_eq!(machine.pc, 3);
        assert_eq!(machine.registers.values(), &[8, 0, 0, 0, 0, 0, 0, 0]);

        machine.step(&mut output).unwrap();
        assert_eq!(machine.pc, 6);
        assert_eq!(machine.registers.values(), &[8, 9, 0, 0, 0, 0, 0, 0]);

        machine.step(&mut output).unwrap();
        assert_eq!(machine.pc, 9);
        assert_eq!(machine.registers.values(), &[72, 9, 0, 0, 0, 0, 0, 0]);
        assert!(output.is_empty());

        machine.step(&mut output).unwrap();
        assert_eq!(machine.pc, 11);
        assert_eq!(output, vec![72]);

        assert_eq!(machine.step(&mut output).unwrap(), State::Halted);
        assert_eq!(machine.pc, 12);
    }

    #[test]
    fn output_error_test() {
        struct Broken;

        impl Output for Broken {
            fn print(&mut self, _value: Word) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
        }

        let mut machine = machine(&[PRN, 0, HLT]);
        let res = machine.run(&mut Broken);
        assert!(matches!(res, Err(ProcessorError::Output(_))));
        assert_eq!(machine.pc, 0);
    }

    #[test]
    fn write_output_test() {
        let mut machine = machine(&[LDI, 0, 7, PRN, 0, LDI, 0, 99, PRN, 0, HLT]);
        let mut output = WriteOutput::new(Vec::new());
        machine.run(&mut output).unwrap();
        assert_eq!(output.into_inner(), b"7\n99\n");
    }

    #[test]
    fn load_too_large_test() {
        let mut machine = Machine::with_memory_size(4);
        assert_eq!(
            machine.load_bytes(&[NOP; 5]),
            Err(MemoryError::OutOfBounds(4))
        );
        machine.load_bytes(&[NOP; 4]).unwrap();
    }

    #[test]
    fn independent_machines_test() {
        let mut a = machine(&[LDI, 0, 1, HLT]);
        let mut b = machine(&[LDI, 0, 2, HLT]);
        a.run(&mut Vec::new()).unwrap();
        assert_eq!(b.registers.get(0), Ok(0));
        b.run(&mut Vec::new()).unwrap();
        assert_eq!(a.registers.get(0), Ok(1));
        assert_eq!(b.registers.get(0), Ok(2));
    }

    #[test]
    fn trace_test() {
        let mut machine = machine(&MULT_PROGRAM);
        insta::assert_snapshot!(
            machine.trace().to_string(),
            @"TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 00"
        );

        machine.step(&mut Vec::new()).unwrap();
        let trace = machine.trace();
        assert_eq!(trace.pc, 3);
        assert_eq!(trace.next, [Some(0x82), Some(0x01), Some(0x09)]);
        insta::assert_snapshot!(
            trace.to_string(),
            @"TRACE: 03 | 82 01 09 | 08 00 00 00 00 00 00 00"
        );
    }

    #[test]
    fn trace_past_end_test() {
        let mut machine = Machine::with_memory_size(4);
        machine.load_bytes(&[NOP, NOP, LDI, 0]).unwrap();
        machine.pc = 2;
        let before = machine.registers.clone();
        insta::assert_snapshot!(
            machine.trace().to_string(),
            @"TRACE: 02 | 82 00 -- | 00 00 00 00 00 00 00 00"
        );
        assert_eq!(machine.pc, 2);
        assert_eq!(machine.registers, before);
    }

    #[test]
    fn trace_at_address_limit_test() {
        let mut machine = machine(&MULT_PROGRAM);
        machine.pc = Address::MAX;
        let trace = machine.trace();
        assert_eq!(trace.pc, Address::MAX);
        assert_eq!(trace.next, [None, None, None]);
        assert_eq!(machine.pc, Address::MAX);
        assert!(matches!(
            machine.step(&mut Vec::new()),
            Err(ProcessorError::Memory(MemoryError::OutOfBounds(address))) if address == Address::MAX
        ));
    }
}
