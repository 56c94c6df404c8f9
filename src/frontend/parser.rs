//! Parser for the Arcana language
//!
//! Recursive descent, single pass, one-token lookahead. The parser demands
//! the three section tags in order, discriminates statements by their first
//! token, and parses expressions by a precedence ladder
//! (`aut` → `et` → `non` → comparison → additive → multiplicative → power).
//! The first error aborts; there is no recovery.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, ErrorCode};
use crate::frontend::lexer::{self, FStringPart, Token, TokenKind};

/// Parser state
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, n: usize) -> &Token {
        let i = self.pos + n;
        &self.tokens[i.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, want: &str) -> Result<&Token, Diagnostic> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(Diagnostic::parse(
                ErrorCode::ParseExpectedToken,
                format!("Accipe {}, pro {}.", self.peek().kind.describe(), want),
                self.peek().span,
            ))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn unexpected(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::parse(ErrorCode::ParseUnexpectedToken, message, self.current_span())
    }

    fn identifier(&mut self) -> Result<Ident, Diagnostic> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(Diagnostic::parse(
                ErrorCode::ParseExpectedToken,
                format!("Accipe {}, pro nomine.", other.describe()),
                self.current_span(),
            )),
        }
    }

    fn type_name(&mut self) -> Result<TypeName, Diagnostic> {
        match &self.peek().kind {
            TokenKind::Type(t) => {
                let t = *t;
                self.advance();
                Ok(t)
            }
            other => Err(Diagnostic::parse(
                ErrorCode::ParseExpectedToken,
                format!("Accipe {}, pro genere (inte, real, filum, ...).", other.describe()),
                self.current_span(),
            )),
        }
    }

    /// A return type is a value type or `nihil`.
    fn return_type(&mut self) -> Result<TypeName, Diagnostic> {
        if self.match_token(&TokenKind::Nihil) {
            Ok(TypeName::Nihil)
        } else {
            self.type_name()
        }
    }

    // ========================================================================
    // Program structure
    // ========================================================================

    pub fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let fons = self.parse_fons()?;
        let introductio = self.parse_introductio()?;
        let main = self.parse_doctrina()?;
        self.consume(&TokenKind::Eof, "finis fontis")?;
        Ok(Program { fons, introductio, main })
    }

    fn parse_fons(&mut self) -> Result<Vec<ImportEntry>, Diagnostic> {
        self.consume(&TokenKind::FonsOpen, "'<FONS>'")?;
        let mut imports = Vec::new();
        while let TokenKind::Str(raw) = &self.peek().kind {
            let entry = ImportEntry {
                raw: raw.clone(),
                span: self.current_span(),
            };
            self.advance();
            self.consume(&TokenKind::Semicolon, "';'")?;
            imports.push(entry);
        }
        self.consume(&TokenKind::FonsClose, "'</FONS>'")?;
        Ok(imports)
    }

    fn parse_introductio(&mut self) -> Result<Vec<Spanned<Stmt>>, Diagnostic> {
        self.consume(&TokenKind::IntroOpen, "'<INTRODUCTIO>'")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::IntroClose) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("Sectio <INTRODUCTIO> sine fine."));
            }
            stmts.push(self.parse_intro_item()?);
        }
        self.consume(&TokenKind::IntroClose, "'</INTRODUCTIO>'")?;
        Ok(stmts)
    }

    fn parse_doctrina(&mut self) -> Result<FuncDecl, Diagnostic> {
        self.consume(&TokenKind::DoctrinaOpen, "'<DOCTRINA>'")?;
        let main = self.parse_main()?;
        self.consume(&TokenKind::DoctrinaClose, "'</DOCTRINA>'")?;
        Ok(main)
    }

    // ========================================================================
    // Main function
    // ========================================================================

    /// `FCON subjecto: nihil () -> { ... };`
    fn parse_main(&mut self) -> Result<FuncDecl, Diagnostic> {
        if !self.match_token(&TokenKind::Fcon) {
            return Err(Diagnostic::parse(
                ErrorCode::ParseMainSubjectoRequired,
                "Nulla scriptura sine themate est.",
                self.current_span(),
            ));
        }
        if !self.match_token(&TokenKind::Subjecto) {
            return Err(Diagnostic::parse(
                ErrorCode::ParseMainSubjectoRequired,
                "Nulla scriptura sine themate est.",
                self.current_span(),
            ));
        }
        self.consume(&TokenKind::Colon, "':'")?;
        if !self.match_token(&TokenKind::Nihil) {
            return Err(Diagnostic::parse(
                ErrorCode::ParseMainNihilRequired,
                "Subiectum veritatem non dat.",
                self.current_span(),
            ));
        }
        self.consume(&TokenKind::LParen, "'('")?;
        if !self.match_token(&TokenKind::RParen) {
            return Err(Diagnostic::parse(
                ErrorCode::ParseMainNihilRequired,
                "Subiectum argumenta non accipit.",
                self.current_span(),
            ));
        }
        self.consume(&TokenKind::Arrow, "'->'")?;
        let body = self.parse_block()?;
        self.consume(&TokenKind::Semicolon, "';'")?;

        Ok(FuncDecl {
            name: "subjecto".to_string(),
            return_type: TypeName::Nihil,
            params: Vec::new(),
            body,
        })
    }

    /// `{ stmt* }`
    fn parse_block(&mut self) -> Result<Vec<Spanned<Stmt>>, Diagnostic> {
        self.consume(&TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("Corpus sine fine ('}' deest)."));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.consume(&TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// An INTRODUCTIO item: function and class declarations live only here;
    /// everything else is an ordinary statement.
    fn parse_intro_item(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        match self.peek().kind {
            TokenKind::Fcon => {
                let decl = self.parse_func_decl()?;
                Ok(Spanned::new(Stmt::Func(decl), start.merge(self.prev_span())))
            }
            TokenKind::Ccon => {
                let decl = self.parse_class_decl()?;
                Ok(Spanned::new(Stmt::Class(decl), start.merge(self.prev_span())))
            }
            _ => self.parse_stmt(),
        }
    }

    fn parse_stmt(&mut self) -> Result<Spanned<Stmt>, Diagnostic> {
        let start = self.current_span();
        let stmt = match &self.peek().kind {
            TokenKind::Nihil => {
                self.advance();
                if !self.match_token(&TokenKind::Semicolon) {
                    return Err(Diagnostic::parse(
                        ErrorCode::ParseNihilNotExpr,
                        "nihil is not an expression; use 'nihil;' as a statement",
                        self.current_span(),
                    ));
                }
                Stmt::NihilStmt
            }
            TokenKind::Effigium => {
                self.advance();
                self.consume(&TokenKind::Semicolon, "';'")?;
                Stmt::Break
            }
            TokenKind::Proximum => {
                self.advance();
                self.consume(&TokenKind::Semicolon, "';'")?;
                Stmt::Continue
            }
            TokenKind::Vcon => Stmt::Var(self.parse_var_decl()?),
            TokenKind::Principium => Stmt::Const(self.parse_const_decl()?),
            TokenKind::Si => self.parse_if()?,
            TokenKind::Recursio => Stmt::Loop(self.parse_loop()?),
            TokenKind::Reditus => {
                self.advance();
                let value = if self.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume(&TokenKind::Semicolon, "';'")?;
                Stmt::Return { value }
            }
            TokenKind::Ident(_) => self.parse_ident_stmt()?,
            _ => {
                // Expression statement (number, string, cantus, `non`, ...)
                let expr = self.parse_expr()?;
                self.consume(&TokenKind::Semicolon, "';'")?;
                Stmt::Expr(expr)
            }
        };
        Ok(Spanned::new(stmt, start.merge(self.prev_span())))
    }

    /// Statements led by an identifier: call, move, assignment, expression.
    fn parse_ident_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        // Compound assignment (`i += 1` surface, lexed as two tokens) is
        // recognized and rejected.
        if matches!(
            self.peek_at(1).kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::StarStar
                | TokenKind::Slash
                | TokenKind::Percent
        ) && self.peek_at(2).kind == TokenKind::Eq
        {
            return Err(Diagnostic::parse(
                ErrorCode::ParseUnsupportedSyntax,
                "Compound assignment is not supported. Use: i = i + 1;",
                self.current_span(),
            ));
        }

        // call statement: IDENT ( ) <- ( args ) ;
        if self.peek_at(1).kind == TokenKind::LParen
            && self.peek_at(2).kind == TokenKind::RParen
            && self.peek_at(3).kind == TokenKind::Flow
        {
            let call = self.parse_call_expr()?;
            self.consume(&TokenKind::Semicolon, "';'")?;
            return Ok(Stmt::Call(call));
        }

        // move: IDENT <- IDENT ;
        if self.peek_at(1).kind == TokenKind::Flow {
            let target = self.identifier()?;
            self.advance(); // `<-`
            if !matches!(self.peek().kind, TokenKind::Ident(_)) {
                return Err(Diagnostic::parse(
                    ErrorCode::ParseInvalidMove,
                    "Aquam sine vase infundere non potes.",
                    self.current_span(),
                ));
            }
            let source = self.identifier()?;
            self.consume(&TokenKind::Semicolon, "';'")?;
            return Ok(Stmt::Move { target, source });
        }

        // assign: IDENT = expr ;
        if self.peek_at(1).kind == TokenKind::Eq {
            let target = self.identifier()?;
            self.advance(); // `=`
            let value = self.parse_expr()?;
            self.consume(&TokenKind::Semicolon, "';'")?;
            return Ok(Stmt::Assign { target, value });
        }

        // expression statement fallback
        let expr = self.parse_expr()?;
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Expr(expr))
    }

    /// `VCON name: Type (= expr)? ;`
    fn parse_var_decl(&mut self) -> Result<VarDecl, Diagnostic> {
        self.consume(&TokenKind::Vcon, "'VCON'")?;
        let name = self.identifier()?;
        self.consume(&TokenKind::Colon, "':'")?;
        let ty = self.type_name()?;
        let init = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(VarDecl { name, ty, init })
    }

    /// `PRINCIPIUM name: Type = expr ;`
    fn parse_const_decl(&mut self) -> Result<ConstDecl, Diagnostic> {
        self.consume(&TokenKind::Principium, "'PRINCIPIUM'")?;
        let name = self.identifier()?;
        self.consume(&TokenKind::Colon, "':'")?;
        let ty = self.type_name()?;
        self.consume(&TokenKind::Eq, "'='")?;
        let init = self.parse_expr()?;
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(ConstDecl { name, ty, init })
    }

    /// `FCON name: RetType (p1:T1, ...) -> { body } ;`
    fn parse_func_decl(&mut self) -> Result<FuncDecl, Diagnostic> {
        self.consume(&TokenKind::Fcon, "'FCON'")?;
        let name = self.identifier()?;
        self.consume(&TokenKind::Colon, "':'")?;
        let return_type = self.return_type()?;
        self.consume(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let pname = self.identifier()?;
                self.consume(&TokenKind::Colon, "':'")?;
                let pty = self.type_name()?;
                params.push(Param { name: pname, ty: pty });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "')'")?;
        self.consume(&TokenKind::Arrow, "'->'")?;
        let body = self.parse_block()?;
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(FuncDecl { name, return_type, params, body })
    }

    /// `CCON Name -> { members } ;` — reserved, stored without analysis.
    fn parse_class_decl(&mut self) -> Result<ClassDecl, Diagnostic> {
        self.consume(&TokenKind::Ccon, "'CCON'")?;
        let name = self.identifier()?;
        self.consume(&TokenKind::Arrow, "'->'")?;
        self.consume(&TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let start = self.current_span();
            let member = match self.peek().kind {
                TokenKind::Vcon => Stmt::Var(self.parse_var_decl()?),
                TokenKind::Fcon => Stmt::Func(self.parse_func_decl()?),
                _ => {
                    return Err(self.unexpected(format!(
                        "Quid est hoc! Quid faciam?: {}",
                        self.peek().kind.describe()
                    )));
                }
            };
            members.push(Spanned::new(member, start.merge(self.prev_span())));
        }
        self.consume(&TokenKind::RBrace, "'}'")?;
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(ClassDecl { name, members })
    }

    /// `SI propositio:(cond) { VERUM{...} (FALSUM{...})? } ;`
    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        self.consume(&TokenKind::Si, "'SI'")?;
        let cond = self.parse_propositio_clause()?;

        self.consume(&TokenKind::LBrace, "'{'")?;
        self.consume(&TokenKind::Verum, "'VERUM'")?;
        let verum = self.parse_block()?;

        let falsum = if self.match_token(&TokenKind::Falsum) {
            self.parse_block()?
        } else {
            Vec::new()
        };

        self.consume(&TokenKind::RBrace, "'}'")?;
        self.consume(&TokenKind::Semicolon, "';'")?;
        Ok(Stmt::If { cond, verum, falsum })
    }

    /// `propositio : ( expr )`
    fn parse_propositio_clause(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        self.consume(&TokenKind::Propositio, "'propositio'")?;
        self.consume(&TokenKind::Colon, "':'")?;
        self.consume(&TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.consume(&TokenKind::RParen, "')'")?;
        Ok(cond)
    }

    /// `RECURSIO ( propositio:(cond) [, quota:...] [, acceleratio:...] ) -> { body } ;`
    fn parse_loop(&mut self) -> Result<LoopStmt, Diagnostic> {
        self.consume(&TokenKind::Recursio, "'RECURSIO'")?;
        self.consume(&TokenKind::LParen, "'('")?;

        let mut cond = None;
        let mut quota = None;
        let mut step = None;

        let mut first = true;
        while !self.at(&TokenKind::RParen) {
            if !first {
                self.consume(&TokenKind::Comma, "','")?;
            }
            first = false;

            match &self.peek().kind {
                TokenKind::Propositio => {
                    self.advance();
                    self.consume(&TokenKind::Colon, "':'")?;
                    self.consume(&TokenKind::LParen, "'('")?;
                    cond = Some(self.parse_expr()?);
                    self.consume(&TokenKind::RParen, "')'")?;
                }
                TokenKind::Quota => {
                    self.advance();
                    self.consume(&TokenKind::Colon, "':'")?;
                    quota = Some(self.parse_quota_clause()?);
                }
                TokenKind::Acceleratio => {
                    self.advance();
                    self.consume(&TokenKind::Colon, "':'")?;
                    step = Some(self.parse_expr()?);
                }
                TokenKind::Eof => {
                    return Err(self.unexpected("Caput ansae sine fine (')' deest)."));
                }
                other => {
                    return Err(Diagnostic::parse(
                        ErrorCode::ParseUnknownLoopHeader,
                        format!(
                            "Quaslibet designationes falsas firmiter repudiabimus.: {}",
                            other.describe()
                        ),
                        self.current_span(),
                    ));
                }
            }
        }

        self.consume(&TokenKind::RParen, "')'")?;
        self.consume(&TokenKind::Arrow, "'->'")?;
        let body = self.parse_block()?;
        self.consume(&TokenKind::Semicolon, "';'")?;

        let Some(cond) = cond else {
            return Err(Diagnostic::parse(
                ErrorCode::ParseLoopPropositioRequired,
                "Propositiones in vita necessariae sunt.",
                self.prev_span(),
            ));
        };

        Ok(LoopStmt { cond, quota, step, body })
    }

    /// Quota is either a budget expression or a counter binding `name = expr`.
    fn parse_quota_clause(&mut self) -> Result<QuotaClause, Diagnostic> {
        if matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_at(1).kind == TokenKind::Eq {
            let name = self.identifier()?;
            self.advance(); // `=`
            let init = self.parse_expr()?;
            Ok(QuotaClause::Counter { name, init })
        } else {
            Ok(QuotaClause::Budget(self.parse_expr()?))
        }
    }

    // ========================================================================
    // Expressions (precedence ladder, lowest to highest)
    // ========================================================================

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        self.parse_or()
    }

    fn binop(lhs: Spanned<Expr>, op: BinOpKind, rhs: Spanned<Expr>) -> Spanned<Expr> {
        let span = lhs.span.merge(rhs.span);
        Spanned::new(
            Expr::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn parse_or(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut lhs = self.parse_and()?;
        while self.match_token(&TokenKind::Aut) {
            let rhs = self.parse_and()?;
            lhs = Self::binop(lhs, BinOpKind::Aut, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut lhs = self.parse_not()?;
        while self.match_token(&TokenKind::Et) {
            let rhs = self.parse_not()?;
            lhs = Self::binop(lhs, BinOpKind::Et, rhs);
        }
        Ok(lhs)
    }

    /// `non` is right-associative and stackable.
    fn parse_not(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        if self.at(&TokenKind::Non) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Ok(Spanned::new(
                Expr::Unary {
                    op: UnaryOpKind::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    fn comparison_op(&self) -> Option<BinOpKind> {
        match self.peek().kind {
            TokenKind::EqEq => Some(BinOpKind::Eq),
            TokenKind::NotEq => Some(BinOpKind::NotEq),
            TokenKind::Lt => Some(BinOpKind::Lt),
            TokenKind::Gt => Some(BinOpKind::Gt),
            TokenKind::LtEq => Some(BinOpKind::LtEq),
            TokenKind::GtEq => Some(BinOpKind::GtEq),
            _ => None,
        }
    }

    /// Exactly one comparison operator; chaining is rejected.
    fn parse_comparison(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let lhs = self.parse_additive()?;
        if let Some(op) = self.comparison_op() {
            self.advance();
            let rhs = self.parse_additive()?;
            if self.comparison_op().is_some() {
                return Err(self.unexpected(
                    "Comparationes catenatae non sunt (comparison chaining is not allowed).",
                ));
            }
            return Ok(Self::binop(lhs, op, rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Self::binop(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let mut lhs = self.parse_unary_neg()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                TokenKind::Percent => BinOpKind::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary_neg()?;
            lhs = Self::binop(lhs, op, rhs);
        }
        Ok(lhs)
    }

    /// Unary minus binds between multiplicative and power: `-a ** b` is
    /// `-(a ** b)` and `a ** -b` parses.
    fn parse_unary_neg(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        if self.at(&TokenKind::Minus) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary_neg()?;
            let span = start.merge(operand.span);
            return Ok(Spanned::new(
                Expr::Unary {
                    op: UnaryOpKind::Neg,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power()
    }

    /// `**` is right-associative: `a ** b ** c` is `a ** (b ** c)`.
    fn parse_power(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let lhs = self.parse_primary()?;
        if self.match_token(&TokenKind::StarStar) {
            let rhs = self.parse_unary_neg()?;
            return Ok(Self::binop(lhs, BinOpKind::Pow, rhs));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let start = self.current_span();

        // call expression: IDENT ( ) <- ( args )
        if matches!(self.peek().kind, TokenKind::Ident(_))
            && self.peek_at(1).kind == TokenKind::LParen
            && self.peek_at(2).kind == TokenKind::RParen
            && self.peek_at(3).kind == TokenKind::Flow
        {
            let call = self.parse_call_expr()?;
            return Ok(Spanned::new(Expr::Call(call), start.merge(self.prev_span())));
        }

        let expr = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Expr::Ident(name)
            }
            TokenKind::Int(v) => {
                let v = *v;
                self.advance();
                Expr::IntLit(v)
            }
            TokenKind::Real(v) => {
                let v = *v;
                self.advance();
                Expr::RealLit(v)
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Expr::StrLit(s)
            }
            TokenKind::Cantus(parts) => {
                let parts = parts.clone();
                self.advance();
                Expr::FStrLit(self.parse_cantus_parts(parts, start)?)
            }
            TokenKind::LBrace => return self.parse_dict_literal(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::Nihil => {
                return Err(Diagnostic::parse(
                    ErrorCode::ParseNihilNotExpr,
                    "nihil is not an expression; use 'nihil;' as a statement",
                    self.current_span(),
                ));
            }
            other => {
                return Err(self.unexpected(format!(
                    "Caerimoniae Sinice haberi non possunt.: {}",
                    other.describe()
                )));
            }
        };

        Ok(Spanned::new(expr, start.merge(self.prev_span())))
    }

    /// `name() <- (arg1, arg2, ...)` — empty parentheses after the callee,
    /// arguments in a required tuple after `<-`.
    fn parse_call_expr(&mut self) -> Result<CallExpr, Diagnostic> {
        let callee = self.identifier()?;
        self.consume(&TokenKind::LParen, "'('")?;
        self.consume(&TokenKind::RParen, "')'")?;
        self.consume(&TokenKind::Flow, "'<-'")?;
        self.consume(&TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "')'")?;
        Ok(CallExpr { callee, args })
    }

    /// `{ k1: v1, k2: v2, }` — trailing comma optional.
    fn parse_dict_literal(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let start = self.current_span();
        self.consume(&TokenKind::LBrace, "'{'")?;
        let mut pairs = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let key = self.parse_expr()?;
            self.consume(&TokenKind::Colon, "':'")?;
            let value = self.parse_expr()?;
            pairs.push((key, value));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(&TokenKind::RBrace, "'}'")?;
        Ok(Spanned::new(Expr::DictLit(pairs), start.merge(self.prev_span())))
    }

    /// Re-parse cantus expression fragments through the expression grammar.
    fn parse_cantus_parts(
        &mut self,
        parts: Vec<FStringPart>,
        span: Span,
    ) -> Result<Vec<FStrPart>, Diagnostic> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                FStringPart::Text(text) => out.push(FStrPart::Text(text)),
                FStringPart::Expr(raw) => {
                    let expr = parse_fragment(&raw, span)?;
                    out.push(FStrPart::Expr(expr));
                }
            }
        }
        Ok(out)
    }
}

/// Parse one interpolation fragment as an expression. Diagnostics are
/// re-anchored on the enclosing cantus literal's span.
fn parse_fragment(raw: &str, span: Span) -> Result<Spanned<Expr>, Diagnostic> {
    let tokens = lexer::lex(raw)
        .map_err(|e| Diagnostic::parse(e.code, format!("In cantu: {}", e.message), span))?;
    let mut parser = Parser::new(&tokens);
    let expr = parser
        .parse_expr()
        .map_err(|e| Diagnostic::parse(e.code, format!("In cantu: {}", e.message), span))?;
    if !parser.at(&TokenKind::Eof) {
        return Err(Diagnostic::parse(
            ErrorCode::ParseUnexpectedToken,
            "In cantu: fragmentum non consumptum (trailing tokens in interpolation)",
            span,
        ));
    }
    Ok(Spanned::new(expr.node, span))
}

/// Convenience function to parse a token stream into a program.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Program, Diagnostic> {
    Parser::new(tokens).parse_program()
}

// ============================================================================
// TESTS
// ============================================================================
