//! CLI module for the Arcana toolchain
//!
//! ## Commands
//!
//! - `exsecutio <file> [--perscribere]` - compile and run via the host,
//!   or print the transpiled text
//! - `inspectio <file>` - validate only
//! - `aedificatio <file>` - build project (reserved)
//!
//! ## Design
//!
//! The CLI uses clap with derive macros. Command functions return
//! `CliResult<ExitCode>` instead of calling `process::exit`; only the
//! top-level `run()` function handles errors and exits.

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these, prints the message, and exits with the code. An empty
/// message means the diagnostic was already rendered.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// A failure (exit code 1) with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// A failure whose diagnostic has already been printed.
    pub fn already_reported() -> Self {
        Self::new("", ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Arcana language toolchain
#[derive(Parser, Debug)]
#[command(name = "arcana")]
#[command(version = VERSION)]
#[command(about = "The Arcana language toolchain: transpiles .arkhe sources to Python", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print pipeline trace output (raises logging to debug)
    #[arg(long = "vestigium", global = true)]
    pub vestigium: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile an .arkhe source and run it via the host
    Exsecutio {
        /// Source file to run (e.g. main.arkhe)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the transpiled host text instead of executing
        #[arg(long)]
        perscribere: bool,
    },

    /// Validate a source file without executing it
    Inspectio {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Build a project (reserved)
    Aedificatio {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return its exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Exsecutio { file, perscribere } => {
            commands::exsecutio(&file.to_string_lossy(), perscribere)
        }
        Command::Inspectio { file } => commands::inspectio(&file.to_string_lossy()),
        Command::Aedificatio { file } => commands::aedificatio(&file.to_string_lossy()),
    }
}

// ============================================================================
// Tests
// ============================================================================
