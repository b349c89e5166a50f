use std::process::ExitCode;

use clap::Parser;

use httpcontract::cli::{self, Cli};
use httpcontract::telemetry;

fn main() -> ExitCode {
    telemetry::init_tracing("warn");

    let cli = Cli::parse();
    match cli::execute(cli) {
        Ok(output) => {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            ExitCode::from(output.exit_code)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
