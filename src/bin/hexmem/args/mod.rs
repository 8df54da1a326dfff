//! `hexmem` command line.
//!
//! Commands:
//! - `info <file.hex>`
//! - `extract <file.hex> <range> -o <out.bin> [--pad <byte>]`
//! - `reformat <in.hex> <out.hex> [--line-length <n>] [--segment]`
//! - `from-bin <in.bin> <address> <out.hex> [--start <addr>] [--line-length <n>]`

mod error;
mod execute;
mod types;

use std::process::ExitCode;

pub use types::Args;

pub const USAGE: &str = "\
usage:
  hexmem info <file.hex>
  hexmem extract <file.hex> <start,length|start-end> -o <out.bin> [--pad <byte>]
  hexmem reformat <in.hex> <out.hex> [--line-length <n>] [--segment]
  hexmem from-bin <in.bin> <address> <out.hex> [--start <addr>] [--line-length <n>]";

pub fn run() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    if let Err(e) = args.execute(&mut stdout.lock()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
