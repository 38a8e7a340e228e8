use clap::Parser;
use periodsim::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
