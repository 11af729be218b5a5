use parse_display::Display;
use tracing::debug;

use super::alu::{self, AluOp};
use super::memory::Memory;
use super::output::Output;
use super::{Machine, ProcessorError, State};
use crate::constants::{
    Address, Word, ADD, HLT, LDI, MUL, NOP, OPERAND_COUNT_MASK, OPERAND_COUNT_SHIFT,
    OPERATION_MASK, PRN, WRITES_REGISTER,
};

/// A raw instruction byte
///
/// ```text
///  7 6 | 5 | 4 3 2 1 0
/// args |reg| operation
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{0:#010b}")]
pub struct Opcode(pub Word);

impl Opcode {
    /// Number of operand bytes following the opcode
    #[must_use]
    pub fn operand_count(self) -> Address {
        Address::from((self.0 >> OPERAND_COUNT_SHIFT) & OPERAND_COUNT_MASK)
    }

    /// Width of the whole instruction in bytes, opcode included
    ///
    /// This only depends on the top two bits, whatever the operation is.
    #[must_use]
    pub fn width(self) -> Address {
        self.operand_count() + 1
    }

    #[must_use]
    pub const fn writes_register(self) -> bool {
        self.0 & WRITES_REGISTER != 0
    }

    /// Whether the opcode belongs to the ALU class
    #[must_use]
    pub fn is_alu(self) -> bool {
        self.operand_count() == 2 && self.writes_register()
    }

    /// Operation identifier, in the low five bits
    #[must_use]
    pub const fn operation(self) -> u8 {
        self.0 & OPERATION_MASK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// Stop the computer
    #[display("hlt")]
    Halt,

    /// Load a value in a register
    #[display("ldi  r{0}, {1}")]
    LoadImmediate(Word, Word),

    /// Output the value of a register
    #[display("prn  r{0}")]
    Print(Word),

    /// No-op
    #[display("nop")]
    Nop,

    /// Register-to-register arithmetic
    #[display("{op}  r{dest}, r{operand}")]
    Alu { op: AluOp, dest: Word, operand: Word },
}

impl Instruction {
    /// Decode the instruction located at `pc`
    ///
    /// Operand bytes are only read for the instructions which need them.
    ///
    /// # Errors
    ///
    /// Fails if the opcode is unknown, or if the instruction does not fit in
    /// memory.
    pub(crate) fn decode(memory: &Memory, pc: Address) -> Result<Self, ProcessorError> {
        let opcode = memory.read(pc)?;
        let arg = |n: Address| memory.read(pc + n);

        let instruction = match opcode {
            HLT => Self::Halt,
            LDI => Self::LoadImmediate(arg(1)?, arg(2)?),
            PRN => Self::Print(arg(1)?),
            NOP => Self::Nop,
            // Two operands and a register result: the operation goes to the ALU
            _ if Opcode(opcode).is_alu() => Self::Alu {
                op: AluOp::from_tag(Opcode(opcode).operation())?,
                dest: arg(1)?,
                operand: arg(2)?,
            },
            _ => return Err(ProcessorError::UnknownInstruction { opcode, pc }),
        };

        Ok(instruction)
    }

    /// Execute the instruction
    #[tracing::instrument(skip(machine, output))]
    pub(crate) fn execute<O: Output + ?Sized>(
        &self,
        machine: &mut Machine,
        output: &mut O,
    ) -> Result<(), ProcessorError> {
        match *self {
            Self::Halt => {
                debug!("Halting");
                machine.state = State::Halted;
            }

            Self::LoadImmediate(reg, value) => {
                machine.registers.set(reg, value)?;
            }

            Self::Print(reg) => {
                let value = machine.registers.get(reg)?;
                output.print(value)?;
            }

            Self::Nop => {}

            Self::Alu { op, dest, operand } => {
                alu::apply(op, dest, operand, &mut machine.registers)?;
            }
        }

        Ok(())
    }

    /// The opcode encoding this instruction
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        Opcode(match self {
            Self::Halt => HLT,
            Self::LoadImmediate(_, _) => LDI,
            Self::Print(_) => PRN,
            Self::Nop => NOP,
            Self::Alu { op: AluOp::Add, .. } => ADD,
            Self::Alu { op: AluOp::Mul, .. } => MUL,
        })
    }

    /// Encode this instruction as bytes
    #[must_use]
    pub fn encode(&self) -> Vec<Word> {
        let opcode = self.opcode().0;
        match *self {
            Self::Halt | Self::Nop => vec![opcode],
            Self::Print(reg) => vec![opcode, reg],
            Self::LoadImmediate(reg, value) => vec![opcode, reg, value],
            Self::Alu { dest, operand, .. } => vec![opcode, dest, operand],
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::MemoryError;

    fn memory(bytes: &[Word]) -> Memory {
        let mut memory = Memory::default();
        memory.load(bytes, 0).unwrap();
        memory
    }

    #[test]
    fn opcode_fields_test() {
        let ldi = Opcode(LDI);
        assert_eq!(ldi.operand_count(), 2);
        assert_eq!(ldi.width(), 3);
        assert!(!ldi.writes_register());
        assert_eq!(ldi.operation(), 0b00010);
        assert!(!ldi.is_alu());

        let mul = Opcode(MUL);
        assert_eq!(mul.width(), 3);
        assert!(mul.writes_register());
        assert!(mul.is_alu());
        assert!(Opcode(ADD).is_alu());
        assert_eq!(mul.operation(), 0b00010);

        assert_eq!(Opcode(PRN).width(), 2);
        assert_eq!(Opcode(HLT).width(), 1);
        assert_eq!(Opcode(NOP).width(), 1);
    }

    #[test]
    fn width_only_depends_on_top_bits_test() {
        for low in 0..=0b11_1111 {
            assert_eq!(Opcode(low).width(), 1);
            assert_eq!(Opcode(0b0100_0000 | low).width(), 2);
            assert_eq!(Opcode(0b1000_0000 | low).width(), 3);
            assert_eq!(Opcode(0b1100_0000 | low).width(), 4);
        }
    }

    #[test]
    fn decode_test() {
        let memory = memory(&[LDI, 0, 8, PRN, 0, MUL, 0, 1, ADD, 2, 3, NOP, HLT]);
        assert_eq!(
            Instruction::decode(&memory, 0).unwrap(),
            Instruction::LoadImmediate(0, 8)
        );
        assert_eq!(Instruction::decode(&memory, 3).unwrap(), Instruction::Print(0));
        assert_eq!(
            Instruction::decode(&memory, 5).unwrap(),
            Instruction::Alu {
                op: AluOp::Mul,
                dest: 0,
                operand: 1
            }
        );
        assert_eq!(
            Instruction::decode(&memory, 8).unwrap(),
            Instruction::Alu {
                op: AluOp::Add,
                dest: 2,
                operand: 3
            }
        );
        assert_eq!(Instruction::decode(&memory, 11).unwrap(), Instruction::Nop);
        assert_eq!(Instruction::decode(&memory, 12).unwrap(), Instruction::Halt);
    }

    #[test]
    fn decode_unknown_test() {
        let memory = memory(&[NOP, 0b1111_1111]);
        assert!(matches!(
            Instruction::decode(&memory, 1),
            Err(ProcessorError::UnknownInstruction {
                opcode: 0b1111_1111,
                pc: 1
            })
        ));

        // Three operands are never valid
        let memory = self::memory(&[0b1110_0010]);
        assert!(matches!(
            Instruction::decode(&memory, 0),
            Err(ProcessorError::UnknownInstruction {
                opcode: 0b1110_0010,
                pc: 0
            })
        ));
    }

    #[test]
    fn decode_unsupported_alu_operation_test() {
        // Two operands and a register result, but no such ALU operation
        let memory = memory(&[0b1010_0101, 0, 1]);
        assert!(matches!(
            Instruction::decode(&memory, 0),
            Err(ProcessorError::UnsupportedOperation(0b00101))
        ));

        // Same operation tag, without the register result bit
        let memory = self::memory(&[0b1000_0101, 0, 1]);
        assert!(matches!(
            Instruction::decode(&memory, 0),
            Err(ProcessorError::UnknownInstruction { .. })
        ));
    }

    #[test]
    fn decode_truncated_test() {
        let mut memory = Memory::new(4);
        memory.load(&[NOP, NOP, LDI, 0], 0).unwrap();
        assert!(matches!(
            Instruction::decode(&memory, 2),
            Err(ProcessorError::Memory(MemoryError::OutOfBounds(4)))
        ));
    }

    #[test]
    fn encode_test() {
        let program = [
            Instruction::LoadImmediate(0, 8),
            Instruction::Print(0),
            Instruction::Alu {
                op: AluOp::Mul,
                dest: 0,
                operand: 1,
            },
            Instruction::Halt,
        ];
        let bytes: Vec<Word> = program.iter().flat_map(Instruction::encode).collect();
        assert_eq!(bytes, vec![LDI, 0, 8, PRN, 0, MUL, 0, 1, HLT]);

        for instruction in program {
            assert_eq!(instruction.encode().len(), instruction.opcode().width());
        }
    }

    #[test]
    fn display_test() {
        assert_eq!(Instruction::LoadImmediate(0, 8).to_string(), "ldi  r0, 8");
        assert_eq!(Instruction::Print(3).to_string(), "prn  r3");
        assert_eq!(
            Instruction::Alu {
                op: AluOp::Mul,
                dest: 0,
                operand: 1
            }
            .to_string(),
            "mul  r0, r1"
        );
        assert_eq!(Instruction::Halt.to_string(), "hlt");
        assert_eq!(Opcode(LDI).to_string(), "0b10000010");
    }
}
