//! Lexer for the Arcana language
//!
//! Handles tokenization including:
//! - Keywords and typed identifiers (VCON, FCON, propositio, inte, ...)
//! - Section tags (`<FONS>`, `<INTRODUCTIO>`, `<DOCTRINA>`) as single tokens
//! - `///` line comments and `<cmt> ... </cmt>` block comments
//! - String and cantus (f-string) literals
//! - Longest-match operator scanning (`><`, `<-`, `->`, `**`, `<=`, ...)
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, FStringPart)
//! - `strings` - String and cantus scanning
//! - `numbers` - Numeric literal scanning

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{FStringPart, Token, TokenKind};

use crate::frontend::ast::Span;
use crate::frontend::diagnostics::{Diagnostic, ErrorCode};
use tokens::KEYWORDS;

/// Section tags and their token kinds, longest spelling first so `</...>`
/// close tags win over the `<` operator prefix.
const SECTION_TAGS: &[(&str, TokenKind)] = &[
    ("</INTRODUCTIO>", TokenKind::IntroClose),
    ("<INTRODUCTIO>", TokenKind::IntroOpen),
    ("</DOCTRINA>", TokenKind::DoctrinaClose),
    ("<DOCTRINA>", TokenKind::DoctrinaOpen),
    ("</FONS>", TokenKind::FonsClose),
    ("<FONS>", TokenKind::FonsOpen),
];

/// Lexer for Arcana source code.
///
/// Converts source text into a stream of tokens terminated by `Eof`.
/// The first lexical error aborts the scan; the error is returned as a
/// diagnostic value, never a panic.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// Returns the token vector on success. The stream always ends with an
    /// `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos),
        ));

        Ok(self.tokens)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    pub(super) fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    pub(super) fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `text` if the remaining source starts with it.
    fn match_str(&mut self, text: &str) -> bool {
        if self.source[self.current_pos..].starts_with(text) {
            for _ in 0..text.chars().count() {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    pub(super) fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    pub(super) fn error(&self, message: impl Into<String>, start: usize) -> Diagnostic {
        Diagnostic::parse(
            ErrorCode::ParseUnexpectedToken,
            message,
            Span::new(start, self.current_pos.max(start + 1)),
        )
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<(), Diagnostic> {
        // Whitespace carries no weight; statements end at ';'.
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.advance();
            } else {
                break;
            }
        }

        let start = self.current_pos;

        // Section tags and block comments start with '<' but must win over
        // the '<' operator family.
        if self.peek() == Some('<') {
            for (text, kind) in SECTION_TAGS {
                if self.match_str(text) {
                    self.add_token(kind.clone(), start);
                    return Ok(());
                }
            }
            if self.match_str("<cmt>") {
                return self.skip_block_comment(start);
            }
        }

        let Some(c) = self.advance() else {
            return Ok(());
        };

        match c {
            // Operators, longest match first
            '<' => {
                if self.match_char('-') {
                    self.add_token(TokenKind::Flow, start);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::LtEq, start);
                } else {
                    self.add_token(TokenKind::Lt, start);
                }
            }
            '>' => {
                if self.match_char('<') {
                    self.add_token(TokenKind::NotEq, start);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::GtEq, start);
                } else {
                    self.add_token(TokenKind::Gt, start);
                }
            }
            '-' => {
                if self.match_char('>') {
                    self.add_token(TokenKind::Arrow, start);
                } else {
                    self.add_token(TokenKind::Minus, start);
                }
            }
            '*' => {
                if self.match_char('*') {
                    self.add_token(TokenKind::StarStar, start);
                } else {
                    self.add_token(TokenKind::Star, start);
                }
            }
            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::EqEq, start);
                } else {
                    self.add_token(TokenKind::Eq, start);
                }
            }
            '/' => {
                // `///` runs to end of line; a lone '/' is division.
                if self.peek() == Some('/') && self.peek_next() == Some('/') {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash, start);
                }
            }
            '+' => self.add_token(TokenKind::Plus, start),
            '%' => self.add_token(TokenKind::Percent, start),
            ':' => self.add_token(TokenKind::Colon, start),
            ',' => self.add_token(TokenKind::Comma, start),
            ';' => self.add_token(TokenKind::Semicolon, start),
            '(' => self.add_token(TokenKind::LParen, start),
            ')' => self.add_token(TokenKind::RParen, start),
            '[' => self.add_token(TokenKind::LBracket, start),
            ']' => self.add_token(TokenKind::RBracket, start),
            '{' => self.add_token(TokenKind::LBrace, start),
            '}' => self.add_token(TokenKind::RBrace, start),

            // Strings
            '"' => self.scan_string(start, '"')?,
            '\'' => self.scan_string(start, '\'')?,

            // Numbers
            '0'..='9' => self.scan_number(start, c)?,

            // Identifiers and keywords
            _ if is_ident_start(c) => self.scan_identifier(start, c)?,

            _ => {
                return Err(self.error(
                    format!("Signum ignotum '{}' (unrecognized character)", c),
                    start,
                ));
            }
        }

        Ok(())
    }

    /// Consume a `<cmt> ... </cmt>` block comment whole.
    fn skip_block_comment(&mut self, start: usize) -> Result<(), Diagnostic> {
        loop {
            if self.is_at_end() {
                return Err(self.error("Commentarium apertum sine fine (unterminated <cmt> block)", start));
            }
            if self.peek() == Some('<') && self.match_str("</cmt>") {
                return Ok(());
            }
            self.advance();
        }
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize, first: char) -> Result<(), Diagnostic> {
        let mut name = String::from(first);

        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // `cantus` immediately followed by a quote introduces an f-string.
        if name == "cantus" {
            if let Some(quote @ ('"' | '\'')) = self.peek() {
                self.advance();
                return self.scan_cantus(start, quote);
            }
        }

        let kind = KEYWORDS.get(name.as_str()).cloned().unwrap_or(TokenKind::Ident(name));
        self.add_token(kind, start);
        Ok(())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::TypeName;

    #[test]
    fn test_keywords() {
        let tokens = lex("VCON FCON CCON PRINCIPIUM RECURSIO SI VERUM FALSUM").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Vcon));
        assert!(matches!(tokens[1].kind, TokenKind::Fcon));
        assert!(matches!(tokens[2].kind, TokenKind::Ccon));
        assert!(matches!(tokens[3].kind, TokenKind::Principium));
        assert!(matches!(tokens[4].kind, TokenKind::Recursio));
        assert!(matches!(tokens[5].kind, TokenKind::Si));
        assert!(matches!(tokens[6].kind, TokenKind::Verum));
        assert!(matches!(tokens[7].kind, TokenKind::Falsum));
    }

    #[test]
    fn test_types_and_labels() {
        let tokens = lex("inte real filum verum ordinata catalogus propositio quota acceleratio").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Type(TypeName::Inte));
        assert_eq!(tokens[1].kind, TokenKind::Type(TypeName::Real));
        assert_eq!(tokens[2].kind, TokenKind::Type(TypeName::Filum));
        assert_eq!(tokens[3].kind, TokenKind::Type(TypeName::Verum));
        assert_eq!(tokens[4].kind, TokenKind::Type(TypeName::Ordinata));
        assert_eq!(tokens[5].kind, TokenKind::Type(TypeName::Catalogus));
        assert!(matches!(tokens[6].kind, TokenKind::Propositio));
        assert!(matches!(tokens[7].kind, TokenKind::Quota));
        assert!(matches!(tokens[8].kind, TokenKind::Acceleratio));
    }

    #[test]
    fn test_operators_longest_match() {
        let tokens = lex("+ - * ** / % = == >< < > <= >= <- ->").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds[..15],
            [
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::StarStar,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Flow,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn test_inequality_never_splits() {
        // `a><b` with no spaces must produce a single NotEq token
        let tokens = lex("a><b").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if s == "a"));
        assert_eq!(tokens[1].kind, TokenKind::NotEq);
        assert!(matches!(&tokens[2].kind, TokenKind::Ident(s) if s == "b"));
    }

    #[test]
    fn test_flow_never_splits() {
        let tokens = lex("x<-y").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Flow);
    }

    #[test]
    fn test_section_tags() {
        let tokens = lex("<FONS></FONS><INTRODUCTIO></INTRODUCTIO><DOCTRINA></DOCTRINA>").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds[..6],
            [
                TokenKind::FonsOpen,
                TokenKind::FonsClose,
                TokenKind::IntroOpen,
                TokenKind::IntroClose,
                TokenKind::DoctrinaOpen,
                TokenKind::DoctrinaClose,
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        let tokens = lex("a /// ceterum censeo\nb").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if s == "a"));
        assert!(matches!(&tokens[1].kind, TokenKind::Ident(s) if s == "b"));
        assert!(matches!(tokens[2].kind, TokenKind::Eof));
    }

    #[test]
    fn test_block_comment() {
        let tokens = lex("a <cmt> quidquid latine \n dictum sit </cmt> b").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if s == "a"));
        assert!(matches!(&tokens[1].kind, TokenKind::Ident(s) if s == "b"));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = lex("<cmt> nunquam finitur").unwrap_err();
        assert!(err.message.contains("cmt"));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.14 0 100").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int(42));
        assert!(matches!(tokens[1].kind, TokenKind::Real(f) if (f - 3.14).abs() < 1e-9));
        assert_eq!(tokens[2].kind, TokenKind::Int(0));
        assert_eq!(tokens[3].kind, TokenKind::Int(100));
    }

    #[test]
    fn test_trailing_dot_is_error() {
        // `.` is not an Arcana token; `1.` is a malformed number
        assert!(lex("1.").is_err());
    }

    #[test]
    fn test_strings() {
        let tokens = lex(r#""salve" 'munde'"#).unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Str(s) if s == "salve"));
        assert!(matches!(&tokens[1].kind, TokenKind::Str(s) if s == "munde"));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""a\nb\tc\\d\"e""#).unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Str(s) if s == "a\nb\tc\\d\"e"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(lex("'numquam clausum").is_err());
    }

    #[test]
    fn test_cantus_parts() {
        let tokens = lex("cantus'x=${a+b}!'").unwrap();
        match &tokens[0].kind {
            TokenKind::Cantus(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(&parts[0], FStringPart::Text(s) if s == "x="));
                assert!(matches!(&parts[1], FStringPart::Expr(s) if s == "a+b"));
                assert!(matches!(&parts[2], FStringPart::Text(s) if s == "!"));
            }
            other => panic!("expected cantus token, got {:?}", other),
        }
    }

    #[test]
    fn test_cantus_literal_dollar() {
        // `$` not followed by `{` stays literal
        let tokens = lex("cantus'pretium: $5'").unwrap();
        match &tokens[0].kind {
            TokenKind::Cantus(parts) => {
                assert_eq!(parts.len(), 1);
                assert!(matches!(&parts[0], FStringPart::Text(s) if s == "pretium: $5"));
            }
            other => panic!("expected cantus token, got {:?}", other),
        }
    }

    #[test]
    fn test_cantus_bare_ident() {
        // `cantus` not followed by a quote is an ordinary identifier
        let tokens = lex("cantus = 1").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if s == "cantus"));
    }

    #[test]
    fn test_effgium_is_identifier() {
        // only the `effigium` spelling is reserved
        let tokens = lex("effgium effigium").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Ident(s) if s == "effgium"));
        assert!(matches!(tokens[1].kind, TokenKind::Effigium));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = lex("a ~ b").unwrap_err();
        assert!(err.message.contains('~'));
    }
}
