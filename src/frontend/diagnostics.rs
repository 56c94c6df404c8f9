//! Diagnostics and error reporting for Arcana
//!
//! Diagnostics are values, not panics: every phase returns the first
//! `Diagnostic` it hits and the driver renders it. Each diagnostic carries
//! a stable code, a Latin message, and a source span.

use crate::frontend::ast::Span;
use thiserror::Error;

/// Stable diagnostic codes, grouped by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ========== Parse (P00xx) ==========
    ParseExpectedToken,
    ParseUnexpectedToken,
    ParseMainSubjectoRequired,
    ParseMainNihilRequired,
    ParseUnsupportedSyntax,
    ParseInvalidMove,
    ParseUnknownLoopHeader,
    ParseLoopPropositioRequired,
    ParseNihilNotExpr,
    ParseInternal,

    // ========== Semantic (E0xxx) ==========
    BreakOutsideLoop,
    ContinueOutsideLoop,
    LoopNestTooDeep,
    LoopStepNotPositive,
    LoopQuotaInvalid,
    NihilNotExpr,
    ArgCountMismatch,
    TypeMismatch,

    // ========== Runtime (R01xx) ==========
    VeritatemNonAttigi,
}

impl ErrorCode {
    /// The wire form of the code, e.g. `P0001_EXPECTED_TOKEN`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseExpectedToken => "P0001_EXPECTED_TOKEN",
            ErrorCode::ParseUnexpectedToken => "P0002_UNEXPECTED_TOKEN",
            ErrorCode::ParseMainSubjectoRequired => "P0010_MAIN_SUBJECTO_REQUIRED",
            ErrorCode::ParseMainNihilRequired => "P0011_MAIN_NIHIL_REQUIRED",
            ErrorCode::ParseUnsupportedSyntax => "P0020_UNSUPPORTED_SYNTAX",
            ErrorCode::ParseInvalidMove => "P0021_INVALID_MOVE",
            ErrorCode::ParseUnknownLoopHeader => "P0030_UNKNOWN_LOOP_HEADER",
            ErrorCode::ParseLoopPropositioRequired => "P0031_LOOP_PROPOSITIO_REQUIRED",
            ErrorCode::ParseNihilNotExpr => "P0040_NIHIL_NOT_EXPR",
            ErrorCode::ParseInternal => "P0099_INTERNAL",
            ErrorCode::BreakOutsideLoop => "E0101_BREAK_OUTSIDE_LOOP",
            ErrorCode::ContinueOutsideLoop => "E0102_CONTINUE_OUTSIDE_LOOP",
            ErrorCode::LoopNestTooDeep => "E0103_LOOP_NEST_TOO_DEEP",
            ErrorCode::LoopStepNotPositive => "E0110_LOOP_STEP_NOT_POSITIVE",
            ErrorCode::LoopQuotaInvalid => "E0111_LOOP_QUOTA_INVALID",
            ErrorCode::NihilNotExpr => "E0202_NIHIL_NOT_EXPR",
            ErrorCode::ArgCountMismatch => "E0203_ARG_COUNT_MISMATCH",
            ErrorCode::TypeMismatch => "E0204_TYPE_MISMATCH",
            ErrorCode::VeritatemNonAttigi => "R0100_VERITATEM_NON_ATTIGI",
        }
    }

    pub fn phase(self) -> Phase {
        match self.as_str().as_bytes()[0] {
            b'P' => Phase::Parse,
            b'E' => Phase::Semantic,
            _ => Phase::Runtime,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline phase a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Semantic,
    Runtime,
}

/// A diagnostic with a stable code, message, and source location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {message}")]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }

    pub fn parse(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, message, span)
    }

    pub fn semantic(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, message, span)
    }
}

/// Print a diagnostic with source context to stderr.
pub fn print_error(file_name: &str, source: &str, error: &Diagnostic) {
    let (line_num, col_num, line_text) = get_line_info(source, error.span.start);

    let red = "\x1b[31m";
    let cyan = "\x1b[36m";
    let bold = "\x1b[1m";
    let reset = "\x1b[0m";

    eprintln!(
        "{bold}{red}{kind}{reset}{bold}: [{code}] {message}{reset}",
        kind = match error.code.phase() {
            Phase::Parse => "contraindication (parse)",
            Phase::Semantic => "contraindication (semantic)",
            Phase::Runtime => "contraindication (runtime)",
        },
        code = error.code,
        message = error.message,
    );

    eprintln!(
        "  {cyan}-->{reset} {file}:{line}:{col}",
        file = file_name,
        line = line_num,
        col = col_num,
    );

    let line_num_width = format!("{}", line_num).len();
    eprintln!("  {cyan}{:>width$} |{reset}", "", width = line_num_width);
    eprintln!(
        "  {cyan}{:>width$} |{reset} {}",
        line_num,
        line_text,
        width = line_num_width
    );

    let underline_len = if error.span.end > error.span.start && col_num > 0 {
        (error.span.end - error.span.start)
            .min(line_text.len().saturating_sub(col_num - 1))
            .max(1)
    } else {
        1
    };

    eprintln!(
        "  {cyan}{:>width$} |{reset} {}{red}{}{reset}",
        "",
        " ".repeat(col_num - 1),
        "^".repeat(underline_len),
        width = line_num_width
    );

    eprintln!();
}

/// Get line number, column number, and line text for a byte offset
fn get_line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    let line_text = &source[line_start..line_end];
    let col_num = offset - line_start + 1;

    (line_num, col_num, line_text)
}
