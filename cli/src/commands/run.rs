use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use ls8_emulator::constants as C;
use ls8_emulator::runtime::{Machine, ProcessorError, WriteOutput};
use tracing::{error, info};

use super::load_machine;
use crate::interactive::run_interactive;

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Run the program in interactive mode
    #[arg(short, long, action = ArgAction::SetTrue)]
    interactive: bool,

    /// Log the machine state before each instruction
    #[arg(short, long, action = ArgAction::SetTrue, conflicts_with = "interactive")]
    trace: bool,

    /// Number of memory cells
    #[arg(short, long, default_value_t = C::MEMORY_SIZE)]
    memory_size: usize,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<ExitCode> {
        let mut machine = load_machine(&self.input, self.memory_size)?;

        info!("Running program");
        if self.interactive {
            run_interactive(&mut machine)?;
            return Ok(ExitCode::SUCCESS);
        }

        let res = if self.trace {
            run_traced(&mut machine)
        } else {
            machine.run(&mut WriteOutput::new(std::io::stdout().lock()))
        };

        info!(registers = %machine.registers, cycles = machine.cycles, "End of program");

        match res {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                error!(pc = machine.pc, "Program crashed: {}", e);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn run_traced(machine: &mut Machine) -> Result<(), ProcessorError> {
    let mut output = WriteOutput::new(std::io::stdout().lock());
    while !machine.is_halted() {
        info!("{}", machine.trace());
        machine.step(&mut output)?;
    }
    Ok(())
}
