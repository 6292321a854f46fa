use clap::Parser;
use snrscan::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
