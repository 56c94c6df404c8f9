//! String and cantus scanning for the Arcana lexer

use super::tokens::{FStringPart, TokenKind};
use super::Lexer;
use crate::frontend::diagnostics::Diagnostic;

/// Result of processing an escape sequence
enum EscapeResult {
    /// Successfully parsed escape character
    Char(char),
    /// Unknown escape - preserve as-is (backslash + char)
    Unknown(char),
    /// End of input during escape
    Eof,
}

impl<'a> Lexer<'a> {
    /// Process a text escape sequence. Called after consuming the backslash.
    fn scan_text_escape(&mut self) -> EscapeResult {
        match self.advance() {
            Some('n') => EscapeResult::Char('\n'),
            Some('t') => EscapeResult::Char('\t'),
            Some('\\') => EscapeResult::Char('\\'),
            Some('\'') => EscapeResult::Char('\''),
            Some('"') => EscapeResult::Char('"'),
            Some(c) => EscapeResult::Unknown(c),
            None => EscapeResult::Eof,
        }
    }

    pub(super) fn scan_string(&mut self, start: usize, quote: char) -> Result<(), Diagnostic> {
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error("Filum sine fine (unterminated string)", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_text_escape() {
                        EscapeResult::Char(c) => value.push(c),
                        EscapeResult::Unknown(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                        EscapeResult::Eof => {
                            return Err(self.error("Filum sine fine (unterminated escape)", start));
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.add_token(TokenKind::Str(value), start);
        Ok(())
    }

    /// Scan the body of a `cantus'...'` literal into alternating text and
    /// raw-expression parts. Interpolation is `${expr}`; a `$` not followed
    /// by `{` is literal. Expression fragments are re-parsed later by the
    /// parser, never evaluated here.
    pub(super) fn scan_cantus(&mut self, start: usize, quote: char) -> Result<(), Diagnostic> {
        let mut parts = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error("Cantus sine fine (unterminated cantus literal)", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('$') => {
                    self.advance();
                    if self.peek() == Some('{') {
                        self.advance();
                        if !text.is_empty() {
                            parts.push(FStringPart::Text(std::mem::take(&mut text)));
                        }
                        let expr = self.scan_cantus_expr(start)?;
                        parts.push(FStringPart::Expr(expr));
                    } else {
                        text.push('$');
                    }
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_text_escape() {
                        EscapeResult::Char(c) => text.push(c),
                        EscapeResult::Unknown(c) => {
                            text.push('\\');
                            text.push(c);
                        }
                        EscapeResult::Eof => {
                            return Err(self.error("Cantus sine fine (unterminated escape)", start));
                        }
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        if !text.is_empty() {
            parts.push(FStringPart::Text(text));
        }

        self.add_token(TokenKind::Cantus(parts), start);
        Ok(())
    }

    /// Collect the raw source of one `${ ... }` fragment, respecting nested
    /// braces (dict literals inside an interpolation).
    fn scan_cantus_expr(&mut self, start: usize) -> Result<String, Diagnostic> {
        let mut expr = String::new();
        let mut depth = 1usize;

        loop {
            match self.peek() {
                None => {
                    return Err(self.error("Cantus sine fine (unterminated interpolation)", start));
                }
                Some('{') => {
                    expr.push('{');
                    self.advance();
                    depth += 1;
                }
                Some('}') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(expr);
                    }
                    expr.push('}');
                }
                Some(c) => {
                    expr.push(c);
                    self.advance();
                }
            }
        }
    }
}
