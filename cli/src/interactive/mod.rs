//! This module implements the TTY interactive interface.
//!
//! It is mainly based on two crates:
//!   - rustyline, to handle the line-editting logic
//!   - clap, to handle the parsing of those interactive commands
//!
//! Using Parser to do this is a bit of a hack, and requires some weird options
//! to have it working but works nonetheless.

use std::collections::BTreeSet;

use clap::Parser;
use ls8_emulator::constants::{Address, Word};
use ls8_emulator::runtime::{Machine, Output, Reg, State, WriteOutput};
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

mod helper;
mod parse;
use self::helper::RunHelper;
use self::parse::AssignmentTarget;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[command(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true,
)]
/// Interactive mode commands
enum Command {
    /// Execute the next instructions
    #[command(alias = "s")]
    Step {
        /// Number of steps to execute
        #[arg(default_value_t = 1)]
        number: u64,
    },

    /// Exit the emulator
    Exit,

    /// Show the state of registers
    Registers {
        /// Only show this register (`r0` to `r7`)
        register: Option<Reg>,
    },

    /// Show the content of a block in memory
    Memory {
        /// The first address to show
        #[arg(value_parser = parse::parse_address)]
        address: Address,

        /// Number of memory cells to show.
        #[arg(default_value_t = 1)]
        number: usize,
    },

    /// Set a value in memory, in a register, or in the program counter
    Set {
        /// The address, register (`r0` to `r7`) or `pc` to set.
        target: AssignmentTarget,

        /// The value to set
        #[arg(value_parser = parse::parse_value)]
        value: u64,
    },

    /// Show the program counter, the next memory cells and the registers
    Trace,

    /// Set a breakpoint
    Break {
        /// The address where to set the breakpoint
        #[arg(value_parser = parse::parse_address)]
        address: Address,
    },

    /// Remove a breakpoint
    Unbreak {
        /// The address of the breakpoint to remove
        #[arg(value_parser = parse::parse_address)]
        address: Address,
    },

    /// Continue the program until the next breakpoint or halt
    Continue,

    /// Show informations about the current debugging session
    Info {
        #[command(subcommand)]
        sub: Option<InfoCommand>,
    },
}

#[derive(Parser, Clone, Debug)]
enum InfoCommand {
    /// List active breakpoints
    Breakpoints,

    /// Show the number of instructions executed since the beginning of the program
    Cycles,
}

/// Holds informations about a interactive session
#[derive(Debug, Default)]
struct Session {
    /// List of active breakpoints, sorted for display
    breakpoints: BTreeSet<Address>,
}

impl Session {
    /// Add a breakpoint
    fn add_breakpoint(&mut self, address: Address) {
        if self.breakpoints.insert(address) {
            info!(address, "Setting a breakpoint");
        } else {
            warn!(address, "A breakpoint was already set");
        }
    }

    /// Remove a breakpoint
    fn remove_breakpoint(&mut self, address: Address) {
        if self.breakpoints.remove(&address) {
            info!(address, "Removing breakpoint");
        } else {
            warn!(address, "No breakpoint was set here");
        }
    }

    /// Checks if the given address has a breakpoint
    fn has_breakpoint(&self, address: Address) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Display the list of breakpoints
    fn display_breakpoints(&self, machine: &Machine) {
        match self.breakpoints.len() {
            0 => info!("No breakpoints"),
            1 => info!("1 breakpoint:"),
            x => info!("{} breakpoints:", x),
        }

        for &address in &self.breakpoints {
            self.display_cell(machine, address);
        }
    }

    /// Display a memory cell, with a gutter showing the program counter and
    /// breakpoints
    fn display_cell(&self, machine: &Machine, address: Address) {
        let is_current = machine.pc == address;
        let has_breakpoint = self.has_breakpoint(address);

        let gutter = match (has_breakpoint, is_current) {
            (true, true) => "B>",
            (true, false) => "B ",
            (false, true) => " >",
            (false, false) => "  ",
        };

        if let Ok(value) = machine.memory.read(address) {
            info!("{:<2} {:>5}    {:08b} ({})", gutter, address, value, value);
        } else {
            info!("{:<2} {:>5}    –", gutter, address);
        }
    }

    /// Display the number of instructions executed
    fn display_cycles(machine: &Machine) {
        info!("Cycles: {}", machine.cycles);
    }
}

/// Execute one instruction, logging how the machine stopped if it did
///
/// Returns `true` if the machine can't run anymore.
fn step<O: Output>(machine: &mut Machine, output: &mut O) -> bool {
    match machine.step(output) {
        Ok(State::Running) => false,
        Ok(State::Halted) => {
            info!(pc = machine.pc, "Program halted");
            true
        }
        Err(e) => {
            warn!(
                error = &e as &dyn std::error::Error,
                pc = machine.pc,
                unknown_instruction = e.is_unknown_instruction(),
                "Program crashed"
            );
            true
        }
    }
}

#[allow(clippy::too_many_lines)]
pub(crate) fn run_interactive(machine: &mut Machine) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::PreferTerm)
        .auto_add_history(true)
        .build();

    let mut session = Session::default();
    let mut output = WriteOutput::new(std::io::stdout());

    let h: RunHelper<Command> = RunHelper::new();
    let mut rl: Editor<RunHelper<Command>, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(h));

    let mut last_command: Option<Command> = None;
    let mut halted = machine.is_halted();

    'read: loop {
        // A macro to unwrap an error, log it and continue the loop
        macro_rules! warn_and_continue {
            ($e:expr) => {
                match $e {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(error = %e);
                        continue 'read;
                    }
                }
            };
        }

        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exitting");
            return Ok(());
        };

        let command = if readline.is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue 'read;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue 'read;
            };

            let command = warn_and_continue!(Command::try_parse_from(words));
            last_command = Some(command.clone());
            command
        };

        debug!("Executing command: {:?}", command);

        match (command, halted) {
            (Command::Exit, _) => break,
            (Command::Step { number }, false) => {
                for _ in 0..number {
                    if step(machine, &mut output) {
                        halted = true;
                        continue 'read;
                    }
                }
            }

            (Command::Registers { register }, _) => {
                if let Some(reg) = register {
                    let value = warn_and_continue!(machine.registers.get(reg.index()));
                    info!("Register {} = {}", reg, value);
                } else {
                    info!("Registers: {}", machine.registers);
                }
                info!("Program counter = {}", machine.pc);
            }

            (Command::Memory { address, number }, _) => {
                let end = address.saturating_add(number).min(machine.memory.capacity());
                if address >= end {
                    warn!(address, "Address is out of bounds");
                }
                for address in address..end {
                    session.display_cell(machine, address);
                }
            }

            (Command::Set { target, value }, false) => match target {
                AssignmentTarget::Address(address) => {
                    let value = warn_and_continue!(Word::try_from(value));
                    info!("Setting memory at address {address} to {value}");
                    warn_and_continue!(machine.memory.write(address, value));
                }

                AssignmentTarget::Register(reg) => {
                    let value = warn_and_continue!(Word::try_from(value));
                    info!("Setting register {reg} to {value}");
                    warn_and_continue!(machine.registers.set(reg.index(), value));
                }

                AssignmentTarget::ProgramCounter => {
                    let address = warn_and_continue!(Address::try_from(value));
                    info!("Setting the program counter to {address}");
                    machine.pc = address;
                }
            },

            (Command::Trace, _) => {
                info!("{}", machine.trace());
            }

            (Command::Break { address }, false) => {
                session.add_breakpoint(address);
            }

            (Command::Unbreak { address }, false) => {
                session.remove_breakpoint(address);
            }

            (Command::Continue, false) => loop {
                if step(machine, &mut output) {
                    halted = true;
                    continue 'read;
                }

                if session.has_breakpoint(machine.pc) {
                    info!(address = machine.pc, "Stopped at a breakpoint");
                    break;
                }
            },

            (Command::Info { sub }, _) => match sub {
                Some(InfoCommand::Breakpoints) => {
                    session.display_breakpoints(machine);
                }
                Some(InfoCommand::Cycles) => {
                    Session::display_cycles(machine);
                }
                None => {
                    session.display_breakpoints(machine);
                    info!("–");
                    Session::display_cycles(machine);
                }
            },

            (_, true) => {
                // Machine is halted but the user asked to continue, we just warn
                warn!("Machine is halted. Use \"exit\" to quit");
            }
        }
    }

    Ok(())
}
