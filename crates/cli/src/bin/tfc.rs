use anyhow::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    tfc_cli::main_entry()
}
