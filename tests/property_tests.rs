//! Property-based tests for the Arcana frontend
//!
//! These use proptest to verify grammar invariants across many randomly
//! generated inputs: operator precedence shapes, lexer longest-match, the
//! keyword/identifier split, and the loop-nesting bound.

use arcana::ast::{BinOpKind, Expr, Program, Stmt};
use arcana::diagnostics::Diagnostic;
use arcana::lexer::{self, TokenKind};
use arcana::{parser, validator};
use proptest::prelude::*;

fn parse_source(source: &str) -> Result<Program, Diagnostic> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}

fn wrap_main(body: &str) -> String {
    format!(
        "<FONS></FONS><INTRODUCTIO></INTRODUCTIO><DOCTRINA>\
         FCON subjecto: nihil () -> {{ {} }};</DOCTRINA>",
        body
    )
}

/// Parse `x = <expr>;` inside a main body and return the RHS expression.
fn parse_rhs(expr: &str) -> Expr {
    let program = parse_source(&wrap_main(&format!("x = {};", expr)))
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", expr, e));
    match &program.main.body[0].node {
        Stmt::Assign { value, .. } => value.node.clone(),
        other => panic!("expected assignment, got {:?}", other),
    }
}

// Strategy for identifiers that are not keywords or type names.
fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("not a reserved word", |s| {
        !matches!(
            s.as_str(),
            "propositio"
                | "quota"
                | "acceleratio"
                | "effigium"
                | "proximum"
                | "non"
                | "et"
                | "aut"
                | "nihil"
                | "cantus"
                | "subjecto"
                | "inte"
                | "real"
                | "filum"
                | "verum"
                | "ordinata"
                | "catalogus"
        )
    })
}

proptest! {
    /// `a + b * c` always parses as `a + (b * c)`.
    #[test]
    fn additive_binds_looser_than_multiplicative(
        a in 0i64..1000, b in 0i64..1000, c in 0i64..1000
    ) {
        let expr = parse_rhs(&format!("{} + {} * {}", a, b, c));
        match expr {
            Expr::BinOp { op: BinOpKind::Add, lhs, rhs } => {
                prop_assert!(matches!(lhs.node, Expr::IntLit(v) if v == a));
                let rhs_is_mul = matches!(rhs.node, Expr::BinOp { op: BinOpKind::Mul, .. });
                prop_assert!(rhs_is_mul);
            }
            other => prop_assert!(false, "expected addition at root, got {:?}", other),
        }
    }

    /// `a ** b ** c` always parses right-associatively.
    #[test]
    fn power_is_right_associative(a in 1i64..100, b in 1i64..100, c in 1i64..100) {
        let expr = parse_rhs(&format!("{} ** {} ** {}", a, b, c));
        match expr {
            Expr::BinOp { op: BinOpKind::Pow, lhs, rhs } => {
                prop_assert!(matches!(lhs.node, Expr::IntLit(v) if v == a));
                let rhs_is_pow = matches!(rhs.node, Expr::BinOp { op: BinOpKind::Pow, .. });
                prop_assert!(rhs_is_pow);
            }
            other => prop_assert!(false, "expected power at root, got {:?}", other),
        }
    }

    /// Comparison never chains: `a < b == c` is always rejected.
    #[test]
    fn comparison_does_not_chain(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000) {
        let source = wrap_main(&format!("x = {} < {} == {};", a, b, c));
        prop_assert!(parse_source(&source).is_err());
    }

    /// `><` always lexes as one inequality token, never `>` then `<`.
    #[test]
    fn inequality_is_one_token(a in ident_strategy(), b in ident_strategy()) {
        let tokens = lexer::lex(&format!("{}><{}", a, b)).expect("lex failed");
        prop_assert!(tokens.iter().any(|t| t.kind == TokenKind::NotEq));
        let adjacent_gt_lt = tokens
            .windows(2)
            .any(|w| w[0].kind == TokenKind::Gt && w[1].kind == TokenKind::Lt);
        prop_assert!(!adjacent_gt_lt);
    }

    /// `<-` always lexes as one flow token, never `<` then `-`.
    #[test]
    fn flow_is_one_token(a in ident_strategy(), b in ident_strategy()) {
        let tokens = lexer::lex(&format!("{}<-{}", a, b)).expect("lex failed");
        prop_assert!(tokens.iter().any(|t| t.kind == TokenKind::Flow));
        let adjacent_lt_minus = tokens
            .windows(2)
            .any(|w| w[0].kind == TokenKind::Lt && w[1].kind == TokenKind::Minus);
        prop_assert!(!adjacent_lt_minus);
    }

    /// Non-reserved identifiers always lex as identifiers.
    #[test]
    fn identifiers_survive_lexing(ident in ident_strategy()) {
        let tokens = lexer::lex(&ident).expect("lex failed");
        prop_assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if *s == ident));
    }

    /// Generated assignments of literal arithmetic always compile.
    #[test]
    fn generated_arithmetic_compiles(
        name in ident_strategy(),
        a in 0i64..1000,
        b in 1i64..1000,
    ) {
        let source = wrap_main(&format!(
            "VCON {name}: inte = {a}; {name} = {name} * {b} + {a};"
        ));
        let program = parse_source(&source).expect("parse failed");
        prop_assert!(validator::check(&program).is_ok());
    }

    /// Loop nesting validates exactly up to depth three.
    #[test]
    fn loop_nesting_bound_is_three(depth in 1usize..6) {
        let mut body = "nihil;".to_string();
        for _ in 0..depth {
            body = format!("RECURSIO(propositio:(a < 1)) -> {{ {} }};", body);
        }
        let program = parse_source(&wrap_main(&body)).expect("parse failed");
        let result = validator::check(&program);
        if depth <= 3 {
            prop_assert!(result.is_ok(), "depth {} should validate", depth);
        } else {
            prop_assert!(result.is_err(), "depth {} should be rejected", depth);
        }
    }
}

// =============================================================================
// Structural invariants (single cases that anchor the properties)
// =============================================================================

#[test]
fn accepted_programs_have_one_main() {
    // `subjecto` is a keyword, so a second definition outside DOCTRINA
    // cannot parse as a function name.
    let source = "<FONS></FONS><INTRODUCTIO>\
                  FCON subjecto: nihil () -> { nihil; };\
                  </INTRODUCTIO><DOCTRINA>\
                  FCON subjecto: nihil () -> { nihil; };</DOCTRINA>";
    assert!(parse_source(source).is_err());
}

#[test]
fn sections_are_mandatory_and_ordered() {
    for source in [
        "",
        "<FONS></FONS>",
        "<FONS></FONS><INTRODUCTIO></INTRODUCTIO>",
        "<DOCTRINA>FCON subjecto: nihil () -> { nihil; };</DOCTRINA>",
    ] {
        assert!(parse_source(source).is_err(), "accepted: {:?}", source);
    }
}
