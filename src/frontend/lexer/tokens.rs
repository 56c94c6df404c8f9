//! Token types for the Arcana lexer

use crate::frontend::ast::{Span, TypeName};
use phf::phf_map;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Token types for Arcana
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keywords ==========
    Vcon,        // variable declaration
    Fcon,        // function declaration
    Ccon,        // class declaration (reserved)
    Principium,  // constant declaration
    Reditus,     // return statement
    Recursio,    // loop statement
    Si,          // if statement
    Verum,       // then-branch label
    Falsum,      // else-branch label
    Propositio,  // loop/if condition label
    Quota,       // loop budget label
    Acceleratio, // loop step label
    Effigium,    // break statement
    Proximum,    // continue statement
    Non,         // logical not
    Et,          // logical and
    Aut,         // logical or
    Nihil,       // the void type / no-op statement
    Subjecto,    // the entry-function name

    // ========== Section tags ==========
    FonsOpen,      // <FONS>
    FonsClose,     // </FONS>
    IntroOpen,     // <INTRODUCTIO>
    IntroClose,    // </INTRODUCTIO>
    DoctrinaOpen,  // <DOCTRINA>
    DoctrinaClose, // </DOCTRINA>

    // ========== Types ==========
    Type(TypeName),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(i64),
    Real(f64),
    Str(String),
    Cantus(Vec<FStringPart>),

    // ========== Operators ==========
    Plus,     // +
    Minus,    // -
    Star,     // *
    StarStar, // ** (power)
    Slash,    // /
    Percent,  // % (modulo)
    Eq,       // = (assignment)
    EqEq,     // ==
    NotEq,    // >< (inequality)
    Lt,       // <
    Gt,       // >
    LtEq,     // <=
    GtEq,     // >=
    Flow,     // <- (move / call arguments)
    Arrow,    // -> (body introducer)

    // ========== Punctuation ==========
    Colon,     // :
    Comma,     // ,
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }

    // ========== Special ==========
    Eof, // end of input
}

impl TokenKind {
    /// Human-readable token name used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(v) => format!("integer {}", v),
            TokenKind::Real(v) => format!("real {}", v),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Cantus(_) => "cantus literal".to_string(),
            TokenKind::Type(t) => format!("type '{}'", t),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.lexeme()),
        }
    }

    /// Canonical surface spelling for fixed tokens.
    fn lexeme(&self) -> &'static str {
        match self {
            TokenKind::Vcon => "VCON",
            TokenKind::Fcon => "FCON",
            TokenKind::Ccon => "CCON",
            TokenKind::Principium => "PRINCIPIUM",
            TokenKind::Reditus => "REDITUS",
            TokenKind::Recursio => "RECURSIO",
            TokenKind::Si => "SI",
            TokenKind::Verum => "VERUM",
            TokenKind::Falsum => "FALSUM",
            TokenKind::Propositio => "propositio",
            TokenKind::Quota => "quota",
            TokenKind::Acceleratio => "acceleratio",
            TokenKind::Effigium => "effigium",
            TokenKind::Proximum => "proximum",
            TokenKind::Non => "non",
            TokenKind::Et => "et",
            TokenKind::Aut => "aut",
            TokenKind::Nihil => "nihil",
            TokenKind::Subjecto => "subjecto",
            TokenKind::FonsOpen => "<FONS>",
            TokenKind::FonsClose => "</FONS>",
            TokenKind::IntroOpen => "<INTRODUCTIO>",
            TokenKind::IntroClose => "</INTRODUCTIO>",
            TokenKind::DoctrinaOpen => "<DOCTRINA>",
            TokenKind::DoctrinaClose => "</DOCTRINA>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "><",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Flow => "<-",
            TokenKind::Arrow => "->",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            _ => "?",
        }
    }
}

/// Part of a cantus (f-string) literal.
///
/// Expression parts hold raw source text; the parser re-parses them
/// through the expression grammar. Nothing is evaluated at lex time.
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Text(String),
    Expr(String),
}

/// Keyword lookup table using a perfect hash map.
///
/// Maps Arcana source text (e.g. `"VCON"`, `"propositio"`) to `TokenKind`
/// variants. The lexer consults this after scanning an identifier, so
/// keywords win over identifiers by exact match. Only the `effigium`
/// spelling is reserved; the abandoned `effgium` stays an identifier.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "VCON" => TokenKind::Vcon,
    "FCON" => TokenKind::Fcon,
    "CCON" => TokenKind::Ccon,
    "PRINCIPIUM" => TokenKind::Principium,
    "REDITUS" => TokenKind::Reditus,
    "RECURSIO" => TokenKind::Recursio,
    "SI" => TokenKind::Si,
    "VERUM" => TokenKind::Verum,
    "FALSUM" => TokenKind::Falsum,
    "propositio" => TokenKind::Propositio,
    "quota" => TokenKind::Quota,
    "acceleratio" => TokenKind::Acceleratio,
    "effigium" => TokenKind::Effigium,
    "proximum" => TokenKind::Proximum,
    "non" => TokenKind::Non,
    "et" => TokenKind::Et,
    "aut" => TokenKind::Aut,
    "nihil" => TokenKind::Nihil,
    "subjecto" => TokenKind::Subjecto,
    "inte" => TokenKind::Type(TypeName::Inte),
    "real" => TokenKind::Type(TypeName::Real),
    "filum" => TokenKind::Type(TypeName::Filum),
    "verum" => TokenKind::Type(TypeName::Verum),
    "ordinata" => TokenKind::Type(TypeName::Ordinata),
    "catalogus" => TokenKind::Type(TypeName::Catalogus),
};

/// A token with its kind and source span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
