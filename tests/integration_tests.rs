//! Integration tests for the Arcana toolchain
//!
//! Drives the full pipeline (lex → parse → validate → transpile) over
//! whole programs, and executes the emitted Python when a host interpreter
//! is available on the machine running the suite.

use std::env;
use std::fs;
use std::process::Command;

use arcana::codegen;
use arcana::diagnostics::{Diagnostic, ErrorCode};
use arcana::{lexer, parser, validator};

/// Run the frontend pipeline and emit host text.
fn compile_source(source: &str) -> Result<String, Diagnostic> {
    let tokens = lexer::lex(source)?;
    let program = parser::parse(&tokens)?;
    validator::check(&program)?;
    Ok(codegen::transpile(&program))
}

fn compile_err(source: &str) -> ErrorCode {
    match compile_source(source) {
        Err(diag) => diag.code,
        Ok(_) => panic!("expected a diagnostic, but the program compiled"),
    }
}

/// Execute emitted Python with the host interpreter.
///
/// Returns `None` (skipping the assertion) when no `python3` binary is
/// available in the test environment.
fn run_host(py: &str) -> Option<(String, String, i32)> {
    if Command::new("python3").arg("--version").output().is_err() {
        return None;
    }

    let tmp = env::temp_dir().join(format!(
        "arcana_test_{}_{}.py",
        std::process::id(),
        py.len()
    ));
    fs::write(&tmp, py).ok()?;
    let output = Command::new("python3").arg(&tmp).output();
    let _ = fs::remove_file(&tmp);
    let output = output.ok()?;

    Some((
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    ))
}

fn wrap_main(body: &str) -> String {
    format!(
        "<FONS></FONS><INTRODUCTIO></INTRODUCTIO><DOCTRINA>\
         FCON subjecto: nihil () -> {{ {} }};</DOCTRINA>",
        body
    )
}

// ============================================================================
// Scenario: FizzBuzz
// ============================================================================

const FIZZBUZZ: &str = r#"
<FONS></FONS>
<INTRODUCTIO></INTRODUCTIO>
<DOCTRINA>
FCON subjecto: nihil () -> {
    RECURSIO(propositio:(i <= 50), quota: i = 1) -> {
        SI propositio:(i % 15 == 0) {
            VERUM { indicant() <- ('FizzBuzz'); }
            FALSUM {
                SI propositio:(i % 3 == 0) {
                    VERUM { indicant() <- ('Fizz'); }
                    FALSUM {
                        SI propositio:(i % 5 == 0) {
                            VERUM { indicant() <- ('Buzz'); }
                            FALSUM { indicant() <- (i); }
                        };
                    }
                };
            }
        };
    };
};
</DOCTRINA>
"#;

#[test]
fn test_fizzbuzz_compiles() {
    let py = compile_source(FIZZBUZZ).expect("FizzBuzz failed to compile");
    assert!(py.contains("while (i <= 50):"));
    assert!(py.contains("print('FizzBuzz')"));
}

#[test]
fn test_fizzbuzz_output() {
    let py = compile_source(FIZZBUZZ).expect("FizzBuzz failed to compile");
    let Some((stdout, stderr, code)) = run_host(&py) else {
        return; // no host interpreter on this machine
    };
    assert_eq!(code, 0, "host run failed: {}", stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 50);
    assert_eq!(lines[0], "1");
    assert_eq!(lines[1], "2");
    assert_eq!(lines[2], "Fizz");
    assert_eq!(lines[3], "4");
    assert_eq!(lines[4], "Buzz");
    assert_eq!(lines[13], "14");
    assert_eq!(lines[14], "FizzBuzz");
    assert_eq!(lines[44], "FizzBuzz");
    assert_eq!(lines[49], "Buzz");
}

// ============================================================================
// Scenario: structural errors
// ============================================================================

#[test]
fn test_empty_doctrina_is_p0010() {
    let code = compile_err(
        "<FONS></FONS><INTRODUCTIO></INTRODUCTIO><DOCTRINA></DOCTRINA>",
    );
    assert_eq!(code, ErrorCode::ParseMainSubjectoRequired);
}

#[test]
fn test_main_with_inte_return_is_p0011() {
    let code = compile_err(
        "<FONS></FONS><INTRODUCTIO></INTRODUCTIO><DOCTRINA>\
         FCON subjecto: inte () -> { nihil; };</DOCTRINA>",
    );
    assert_eq!(code, ErrorCode::ParseMainNihilRequired);
}

#[test]
fn test_sections_must_be_ordered() {
    let code = compile_err(
        "<INTRODUCTIO></INTRODUCTIO><FONS></FONS><DOCTRINA>\
         FCON subjecto: nihil () -> { nihil; };</DOCTRINA>",
    );
    assert_eq!(code, ErrorCode::ParseExpectedToken);
}

// ============================================================================
// Scenario: loop control placement and nesting
// ============================================================================

#[test]
fn test_break_in_main_body_is_e0101() {
    let code = compile_err(&wrap_main("effigium;"));
    assert_eq!(code, ErrorCode::BreakOutsideLoop);
}

#[test]
fn test_four_deep_recursio_is_e0103() {
    let code = compile_err(&wrap_main(
        "RECURSIO(propositio:(a < 1)) -> {\
           RECURSIO(propositio:(a < 1)) -> {\
             RECURSIO(propositio:(a < 1)) -> {\
               RECURSIO(propositio:(a < 1)) -> { nihil; };\
             };\
           };\
         };",
    ));
    assert_eq!(code, ErrorCode::LoopNestTooDeep);
}

#[test]
fn test_zero_literal_step_is_e0110() {
    let code = compile_err(&wrap_main(
        "RECURSIO(propositio:(i < 10), acceleratio: 0) -> { nihil; };",
    ));
    assert_eq!(code, ErrorCode::LoopStepNotPositive);
}

// ============================================================================
// Scenario: quota guard at runtime
// ============================================================================

#[test]
fn test_quota_exceeded_raises_r0100() {
    let source = wrap_main(
        "VCON i: inte = 0;\
         RECURSIO(propositio:(i < 10), quota: 3) -> { indicant() <- ('iter'); };",
    );
    let py = compile_source(&source).expect("program failed to compile");
    let Some((stdout, stderr, code)) = run_host(&py) else {
        return;
    };

    // Three iterations run; the guard fires on the fourth.
    assert_eq!(stdout.lines().filter(|l| *l == "iter").count(), 3);
    assert_ne!(code, 0);
    assert!(
        stderr.contains("R0100_VERITATEM_NON_ATTIGI"),
        "expected quota error in stderr, got: {}",
        stderr
    );
}

#[test]
fn test_runtime_step_guard_raises_e0110() {
    // The step only folds at runtime; the emitted guard must catch it.
    let source = wrap_main(
        "VCON i: inte = 0; VCON g: inte = 0;\
         RECURSIO(propositio:(i < 10), acceleratio: g) -> { nihil; };",
    );
    let py = compile_source(&source).expect("program failed to compile");
    let Some((_, stderr, code)) = run_host(&py) else {
        return;
    };
    assert_ne!(code, 0);
    assert!(stderr.contains("E0110_LOOP_STEP_NOT_POSITIVE"));
}

// ============================================================================
// Scenario: call arity
// ============================================================================

#[test]
fn test_indicant_is_variadic() {
    compile_source(&wrap_main("VCON a: inte = 1; VCON b: inte = 2; indicant() <- (a, b);"))
        .expect("variadic print should be accepted");
}

#[test]
fn test_user_arity_mismatch_is_e0203() {
    let code = compile_err(
        "<FONS></FONS><INTRODUCTIO>\
         FCON summa: inte (a: inte, b: inte) -> { REDITUS a + b; };\
         </INTRODUCTIO><DOCTRINA>FCON subjecto: nihil () -> {\
           summa() <- (1, 2, 3);\
         };</DOCTRINA>",
    );
    assert_eq!(code, ErrorCode::ArgCountMismatch);
}

// ============================================================================
// Scenario: cantus interpolation
// ============================================================================

#[test]
fn test_cantus_interpolation_output() {
    let source = wrap_main(
        "VCON a: inte = 1; VCON b: inte = 2; indicant() <- (cantus'x=${a + b}');",
    );
    let py = compile_source(&source).expect("program failed to compile");
    let Some((stdout, stderr, code)) = run_host(&py) else {
        return;
    };
    assert_eq!(code, 0, "host run failed: {}", stderr);
    assert_eq!(stdout.trim(), "x=3");
}

// ============================================================================
// Scenario: inequality token
// ============================================================================

#[test]
fn test_inequality_in_si_condition() {
    use arcana::ast::{BinOpKind, Expr, Stmt};

    let source = wrap_main("SI propositio:(a >< b) { VERUM { nihil; } };");
    let tokens = lexer::lex(&source).expect("lex failed");
    let program = parser::parse(&tokens).expect("parse failed");
    match &program.main.body[0].node {
        Stmt::If { cond, .. } => {
            assert!(matches!(cond.node, Expr::BinOp { op: BinOpKind::NotEq, .. }));
        }
        other => panic!("expected if statement, got {:?}", other),
    }
}

// ============================================================================
// Phase ordering and whole-file fixtures
// ============================================================================

#[test]
fn test_lex_error_wins_over_parse_error() {
    // The source has both a lexical error (~) and a structural one
    // (missing sections); the lexical one must surface.
    let err = compile_source("~ <INTRODUCTIO>").unwrap_err();
    assert!(err.message.contains('~'));
}

#[test]
fn test_parse_error_wins_over_semantic_error() {
    // `effigium;` outside a loop is a semantic error, but the missing
    // DOCTRINA section aborts earlier, in the parser.
    let err = compile_source(
        "<FONS></FONS><INTRODUCTIO>effigium;</INTRODUCTIO>",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ParseExpectedToken);
}

#[test]
fn test_move_and_globals_program() {
    let source = "<FONS>'norma';</FONS><INTRODUCTIO>\
                  VCON fons_aquae: filum = 'aqua';\
                  VCON poculum: filum;\
                  </INTRODUCTIO><DOCTRINA>FCON subjecto: nihil () -> {\
                    poculum <- fons_aquae;\
                    indicant() <- (poculum);\
                  };</DOCTRINA>";
    let py = compile_source(source).expect("program failed to compile");
    assert!(py.contains("poculum = fons_aquae"));
    let Some((stdout, _, code)) = run_host(&py) else {
        return;
    };
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "aqua");
}

#[test]
fn test_emitted_text_is_deterministic() {
    let py1 = compile_source(FIZZBUZZ).expect("compile failed");
    let py2 = compile_source(FIZZBUZZ).expect("compile failed");
    assert_eq!(py1, py2);
}
