//! Trace inspection CLI
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 10: Internal error

use clap::Parser;
use llm_trace_cli::{logging, run_cli, InspectCli};

fn main() {
    // Parse CLI arguments
    let cli = InspectCli::parse();

    logging::init_logging(cli.verbose, cli.log_json);

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
