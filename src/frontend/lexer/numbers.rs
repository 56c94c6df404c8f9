//! Number scanning for the Arcana lexer
//!
//! An integer is a digit run; a real requires at least one digit on each
//! side of the decimal point.

use super::tokens::TokenKind;
use super::Lexer;
use crate::frontend::diagnostics::Diagnostic;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) -> Result<(), Diagnostic> {
        let mut value = String::from(first);
        let mut is_real = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // `.` continues a real only when a digit follows; a bare trailing
        // `.` is left unconsumed and fails as an unrecognized character.
        if self.peek() == Some('.') {
            if self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                is_real = true;
                value.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        value.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_real {
            match value.parse::<f64>() {
                Ok(f) => self.add_token(TokenKind::Real(f), start),
                Err(_) => {
                    return Err(self.error(format!("Numerus malus: {}", value), start));
                }
            }
        } else {
            match value.parse::<i64>() {
                Ok(i) => self.add_token(TokenKind::Int(i), start),
                Err(_) => {
                    return Err(self.error(format!("Numerus malus: {}", value), start));
                }
            }
        }

        Ok(())
    }
}
