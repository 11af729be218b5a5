use std::process::ExitCode;

use camino::Utf8Path;
use ls8_emulator::{Machine, Program};
use tracing::info;

mod completion;
mod dump;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Load and run a program
    Run(self::run::RunOpt),

    /// Show the memory after loading a program
    Dump(self::dump::DumpOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<ExitCode> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Dump(opt) => opt.exec().map(|()| ExitCode::SUCCESS),
            Self::Completion(opt) => {
                opt.exec();
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Read a program file and build a machine with the program in memory
///
/// Parsing errors are rendered with their source context before being
/// returned.
fn load_machine(input: &Utf8Path, memory_size: usize) -> anyhow::Result<Machine> {
    info!(path = %input, "Reading program");
    let program = Program::from_file(input).map_err(|e| {
        let report = miette::Report::new(e);
        eprintln!("{report:?}");
        anyhow::anyhow!("could not load {input}")
    })?;

    let mut machine = Machine::with_memory_size(memory_size);
    machine.load(&program)?;
    info!(len = program.len(), memory_size, "Program loaded");
    Ok(machine)
}
