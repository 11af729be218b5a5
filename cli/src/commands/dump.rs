use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use ls8_emulator::constants as C;

use super::load_machine;

#[derive(Parser, Debug)]
pub struct DumpOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Number of memory cells
    #[arg(short, long, default_value_t = C::MEMORY_SIZE)]
    memory_size: usize,

    /// Also show the empty cells after the program
    #[arg(short, long)]
    all: bool,
}

impl DumpOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let machine = load_machine(&self.input, self.memory_size)?;

        // Trailing zeroes are not part of the program
        let end = if self.all {
            machine.memory.capacity()
        } else {
            machine
                .memory
                .iter()
                .filter(|&(_, value)| value != 0)
                .map(|(address, _)| address + 1)
                .last()
                .unwrap_or(0)
        };

        for (address, value) in machine.memory.iter().take(end) {
            println!("{address:>4}: {value:08b} ({value:#04x})");
        }

        Ok(())
    }
}
