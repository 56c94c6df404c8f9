//! CLI command implementations
//!
//! Each command drives the pipeline: source → tokens → AST → validated AST
//! → emitted host text. Diagnostics are printed with source context and the
//! command returns a non-zero exit code.

use std::env;
use std::fs;
use std::process;

use tracing::debug;

use crate::backend::codegen;
use crate::frontend::{diagnostics, lexer, parser, validator};

use super::{CliError, CliResult, ExitCode};

/// Read source file contents.
fn read_source(file_path: &str) -> CliResult<String> {
    fs::read_to_string(file_path)
        .map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path, e)))
}

/// Run the full frontend pipeline and emit host text.
///
/// On a diagnostic, prints it with source context and returns an
/// already-reported failure.
fn compile(file_path: &str, source: &str) -> CliResult<String> {
    let tokens = lexer::lex(source).map_err(|err| {
        diagnostics::print_error(file_path, source, &err);
        CliError::already_reported()
    })?;
    debug!(token_count = tokens.len(), "lexed");

    let program = parser::parse(&tokens).map_err(|err| {
        diagnostics::print_error(file_path, source, &err);
        CliError::already_reported()
    })?;
    debug!(
        import_count = program.fons.len(),
        intro_count = program.introductio.len(),
        "parsed"
    );

    validator::check(&program).map_err(|err| {
        diagnostics::print_error(file_path, source, &err);
        CliError::already_reported()
    })?;
    debug!("validated");

    Ok(codegen::transpile(&program))
}

/// `arcana exsecutio <file> [--perscribere]`
///
/// Compiles the source; with `--perscribere` prints the transpiled text
/// between banners, otherwise executes it via the host interpreter.
pub fn exsecutio(file_path: &str, perscribere: bool) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let py = compile(file_path, &source)?;

    if perscribere {
        println!("=== [arcana perscribere] transpiled python ===");
        print!("{}", py);
        println!("=== [arcana perscribere] end ===");
        return Ok(ExitCode::SUCCESS);
    }

    run_host(file_path, &py)
}

/// Execute emitted host text with `python3`, propagating its exit status.
fn run_host(file_path: &str, py: &str) -> CliResult<ExitCode> {
    let stem = std::path::Path::new(file_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("arcana");
    let tmp_path = env::temp_dir().join(format!("arcana_{}_{}.py", stem, process::id()));
    fs::write(&tmp_path, py).map_err(|e| {
        CliError::failure(format!("Error writing host file '{}': {}", tmp_path.display(), e))
    })?;

    println!("=== [arcana: oraculum] ===");
    let status = process::Command::new("python3").arg(&tmp_path).status();
    let _ = fs::remove_file(&tmp_path);

    match status {
        Ok(status) => Ok(ExitCode(status.code().unwrap_or(1))),
        Err(e) => Err(CliError::failure(format!(
            "Error: python3 non inventum est (cannot run host interpreter): {}",
            e
        ))),
    }
}

/// `arcana inspectio <file>` — validate only.
pub fn inspectio(file_path: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    compile(file_path, &source)?;
    println!("inspectio: probatum est ({})", file_path);
    Ok(ExitCode::SUCCESS)
}

/// `arcana aedificatio <file>` — reserved. Validates, then reports that
/// project building is not available.
pub fn aedificatio(file_path: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    compile(file_path, &source)?;
    Err(CliError::failure("aedificatio nondum paratum est (reserved)"))
}
