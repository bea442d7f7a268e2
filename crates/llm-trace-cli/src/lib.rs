//! Trace inspection CLI
//!
//! Loads a serialized trace document and runs span searches, assessment
//! searches, tabular export or transport conversion against it. Output is
//! JSON on stdout.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Spans whose name contains "add"
//! trace-inspect spans --trace trace.json --pattern add
//!
//! # All assessments, including invalidated ones
//! trace-inspect assessments --trace trace.json --all
//!
//! # One data-frame row
//! trace-inspect row --trace trace.json --pretty
//! ```

pub mod commands;
pub mod logging;

pub use commands::{InspectCli, InspectCommands};

use llm_trace_core::TraceError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Classify an error returned by a command
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(trace_err) = err.downcast_ref::<TraceError>() {
            if trace_err.is_user_error() {
                return ExitCode::InvalidInput;
            }
            return ExitCode::InternalError;
        }
        if err.downcast_ref::<std::io::Error>().is_some() {
            return ExitCode::FileError;
        }
        ExitCode::InternalError
    }
}

/// Run the CLI application
pub fn run_cli(cli: InspectCli) -> ExitCode {
    let pretty = cli.pretty;
    let result = commands::execute(cli.command).and_then(|output| commands::render(&output, pretty));

    match result {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Success
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::InvalidInput), 3);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_error() {
        let err = anyhow::Error::new(TraceError::invalid_argument("bad"));
        assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);

        let err = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
            .context("Failed to read trace file");
        assert_eq!(ExitCode::from_error(&err), ExitCode::FileError);

        let err = anyhow::anyhow!("other");
        assert_eq!(ExitCode::from_error(&err), ExitCode::InternalError);
    }
}
