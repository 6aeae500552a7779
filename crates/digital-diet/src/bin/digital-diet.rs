use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use digital_diet::cli::{self, Cli};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);
    cli::run(&cli)
}
