//! Semantic validator for Arcana
//!
//! Walks the AST once, in pre-order, maintaining a loop-depth counter, a
//! scope-stack symbol table, and the built-in registry. The first violation
//! aborts the walk; the diagnostic carries the stable code and the span of
//! the offending node.
//!
//! ## What is validated
//!
//! - `effigium` / `proximum` placement inside a loop (E0101 / E0102)
//! - RECURSIO nesting depth of at most three (E0103)
//! - Loop step strictly positive when constant-foldable (E0110)
//! - Loop quota a positive integer when constant-foldable (E0111)
//! - Call arity against user functions and built-ins (E0203)
//! - Declared types at initializers, assignments, arguments, returns (E0204)
//! - `nihil` never used as a value (E0202)

mod const_eval;

pub use const_eval::ConstValue;

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, ErrorCode};
use crate::frontend::symbols::{Arity, Symbol, SymbolTable};

const MAX_LOOP_DEPTH: usize = 3;

/// Validator state.
pub struct Validator {
    symbols: SymbolTable,
    loop_depth: usize,
    /// Return type of the enclosing function body, if any.
    current_return: Option<TypeName>,
    /// Folded values of `PRINCIPIUM` constants, for quota/step checks.
    const_values: HashMap<String, ConstValue>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            loop_depth: 0,
            current_return: None,
            const_values: HashMap::new(),
        }
    }

    /// Validate a parsed program.
    pub fn check_program(&mut self, program: &Program) -> Result<(), Diagnostic> {
        // FONS imports carry no rules; resolution is external.
        for stmt in &program.introductio {
            self.check_stmt(stmt)?;
        }

        self.current_return = Some(TypeName::Nihil);
        self.symbols.push_scope();
        for stmt in &program.main.body {
            self.check_stmt(stmt)?;
        }
        self.symbols.pop_scope();
        self.current_return = None;

        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), Diagnostic> {
        match &stmt.node {
            Stmt::Var(decl) => self.check_var_decl(decl),
            Stmt::Const(decl) => self.check_const_decl(decl),
            Stmt::Func(decl) => self.check_func_decl(decl),
            // Reserved syntax: stored, not analyzed.
            Stmt::Class(_) => Ok(()),
            Stmt::Assign { target, value } => {
                let inferred = self.check_expr(value)?;
                self.reject_nihil(inferred, value.span)?;
                if let Some(declared) = self.symbols.lookup(target).and_then(Symbol::value_type) {
                    self.require_compatible(declared, inferred, value.span)?;
                }
                Ok(())
            }
            // Grammar already restricts the source to an identifier.
            Stmt::Move { .. } => Ok(()),
            Stmt::Call(call) => {
                self.check_call(call, stmt.span)?;
                Ok(())
            }
            Stmt::If { cond, verum, falsum } => {
                self.check_expr(cond)?;
                for s in verum {
                    self.check_stmt(s)?;
                }
                for s in falsum {
                    self.check_stmt(s)?;
                }
                Ok(())
            }
            Stmt::Loop(l) => self.check_loop(l, stmt.span),
            Stmt::Expr(expr) => {
                self.check_expr(expr)?;
                Ok(())
            }
            Stmt::NihilStmt => Ok(()),
            Stmt::Break => {
                if self.loop_depth == 0 {
                    return Err(Diagnostic::semantic(
                        ErrorCode::BreakOutsideLoop,
                        "Nullus discessus est extra reditum.",
                        stmt.span,
                    ));
                }
                Ok(())
            }
            Stmt::Continue => {
                if self.loop_depth == 0 {
                    return Err(Diagnostic::semantic(
                        ErrorCode::ContinueOutsideLoop,
                        "Nulla continuitas extra limites est.",
                        stmt.span,
                    ));
                }
                Ok(())
            }
            Stmt::Return { value } => self.check_return(value.as_ref(), stmt.span),
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl) -> Result<(), Diagnostic> {
        if let Some(init) = &decl.init {
            let inferred = self.check_expr(init)?;
            self.reject_nihil(inferred, init.span)?;
            self.require_compatible(decl.ty, inferred, init.span)?;
        }
        self.symbols.define(&decl.name, Symbol::Var { ty: decl.ty });
        Ok(())
    }

    fn check_const_decl(&mut self, decl: &ConstDecl) -> Result<(), Diagnostic> {
        let inferred = self.check_expr(&decl.init)?;
        self.reject_nihil(inferred, decl.init.span)?;
        self.require_compatible(decl.ty, inferred, decl.init.span)?;
        self.symbols.define(&decl.name, Symbol::Const { ty: decl.ty });
        if let Some(value) = self.fold_const(&decl.init) {
            self.const_values.insert(decl.name.clone(), value);
        }
        Ok(())
    }

    fn check_func_decl(&mut self, decl: &FuncDecl) -> Result<(), Diagnostic> {
        // Define before walking the body so recursion resolves.
        self.symbols.define(
            &decl.name,
            Symbol::Function {
                params: decl.params.iter().map(|p| p.ty).collect(),
                return_type: decl.return_type,
            },
        );

        self.symbols.push_scope();
        for param in &decl.params {
            self.symbols.define(&param.name, Symbol::Var { ty: param.ty });
        }

        // Nesting is lexical: a function body starts at depth zero.
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);
        let saved_return = self.current_return.replace(decl.return_type);

        let result = decl.body.iter().try_for_each(|s| self.check_stmt(s));

        self.loop_depth = saved_depth;
        self.current_return = saved_return;
        self.symbols.pop_scope();
        result
    }

    fn check_return(
        &mut self,
        value: Option<&Spanned<Expr>>,
        span: Span,
    ) -> Result<(), Diagnostic> {
        let Some(expected) = self.current_return else {
            // REDITUS outside any function body; the host rejects it.
            if let Some(expr) = value {
                self.check_expr(expr)?;
            }
            return Ok(());
        };

        match value {
            Some(expr) => {
                let inferred = self.check_expr(expr)?;
                self.reject_nihil(inferred, expr.span)?;
                if expected == TypeName::Nihil {
                    return Err(self.type_mismatch(TypeName::Nihil, inferred, expr.span));
                }
                self.require_compatible(expected, inferred, expr.span)
            }
            None => {
                if expected != TypeName::Nihil {
                    return Err(Diagnostic::semantic(
                        ErrorCode::TypeMismatch,
                        format!("Genus discrepat: exspectatum '{}', inventum nihil.", expected),
                        span,
                    ));
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Loops
    // ========================================================================

    fn check_loop(&mut self, l: &LoopStmt, span: Span) -> Result<(), Diagnostic> {
        let next_depth = self.loop_depth + 1;
        if next_depth > MAX_LOOP_DEPTH {
            return Err(Diagnostic::semantic(
                ErrorCode::LoopNestTooDeep,
                "Tres reincarnationes, si plures, maledictio est.",
                span,
            ));
        }

        // A counter binding scopes over the loop header and body.
        let mut pushed = false;
        match &l.quota {
            Some(QuotaClause::Counter { name, init }) => {
                let inferred = self.check_expr(init)?;
                self.reject_nihil(inferred, init.span)?;
                self.symbols.push_scope();
                pushed = true;
                self.symbols.define(name, Symbol::Var { ty: TypeName::Inte });
            }
            Some(QuotaClause::Budget(budget)) => {
                let budget_type = self.check_expr(budget)?;
                if matches!(budget_type, Some(t) if t != TypeName::Inte) {
                    return Err(Diagnostic::semantic(
                        ErrorCode::LoopQuotaInvalid,
                        "Rectus valor, recta via.",
                        budget.span,
                    ));
                }
                if let Some(ConstValue::Int(v)) = self.fold_const(budget) {
                    if v <= 0 {
                        return Err(Diagnostic::semantic(
                            ErrorCode::LoopQuotaInvalid,
                            "Rectus valor, recta via.",
                            budget.span,
                        ));
                    }
                }
            }
            None => {}
        }

        let result = self.check_loop_inner(l, next_depth);
        if pushed {
            self.symbols.pop_scope();
        }
        result
    }

    fn check_loop_inner(&mut self, l: &LoopStmt, next_depth: usize) -> Result<(), Diagnostic> {
        self.check_expr(&l.cond)?;

        if let Some(step) = &l.step {
            self.check_expr(step)?;
            if let Some(value) = self.fold_const(step) {
                if !value.is_positive() {
                    return Err(Diagnostic::semantic(
                        ErrorCode::LoopStepNotPositive,
                        "stationarius accelerationis",
                        step.span,
                    ));
                }
            }
            // Non-constant steps are guarded at runtime.
        }

        let saved = std::mem::replace(&mut self.loop_depth, next_depth);
        let result = l.body.iter().try_for_each(|s| self.check_stmt(s));
        self.loop_depth = saved;
        result
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Validate an expression and infer its type where the rules allow.
    /// `None` means "unknown"; unknown types skip compatibility checks.
    fn check_expr(&mut self, expr: &Spanned<Expr>) -> Result<Option<TypeName>, Diagnostic> {
        match &expr.node {
            Expr::Ident(name) => Ok(self.symbols.lookup(name).and_then(Symbol::value_type)),
            Expr::IntLit(_) => Ok(Some(TypeName::Inte)),
            Expr::RealLit(_) => Ok(Some(TypeName::Real)),
            Expr::StrLit(_) => Ok(Some(TypeName::Filum)),
            Expr::FStrLit(parts) => {
                for part in parts {
                    if let FStrPart::Expr(e) = part {
                        let inferred = self.check_expr(e)?;
                        self.reject_nihil(inferred, e.span)?;
                    }
                }
                Ok(Some(TypeName::Filum))
            }
            Expr::DictLit(pairs) => {
                for (key, value) in pairs {
                    let kt = self.check_expr(key)?;
                    self.reject_nihil(kt, key.span)?;
                    let vt = self.check_expr(value)?;
                    self.reject_nihil(vt, value.span)?;
                }
                Ok(Some(TypeName::Catalogus))
            }
            Expr::Unary { op, operand } => {
                let inner = self.check_expr(operand)?;
                self.reject_nihil(inner, operand.span)?;
                match op {
                    UnaryOpKind::Not => Ok(Some(TypeName::Verum)),
                    UnaryOpKind::Neg => match inner {
                        Some(TypeName::Inte) => Ok(Some(TypeName::Inte)),
                        Some(TypeName::Real) => Ok(Some(TypeName::Real)),
                        _ => Ok(None),
                    },
                }
            }
            Expr::BinOp { op, lhs, rhs } => {
                let lt = self.check_expr(lhs)?;
                self.reject_nihil(lt, lhs.span)?;
                let rt = self.check_expr(rhs)?;
                self.reject_nihil(rt, rhs.span)?;
                Ok(binop_type(*op, lt, rt))
            }
            Expr::Call(call) => self.check_call(call, expr.span),
        }
    }

    fn check_call(
        &mut self,
        call: &CallExpr,
        span: Span,
    ) -> Result<Option<TypeName>, Diagnostic> {
        let mut arg_types = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let inferred = self.check_expr(arg)?;
            self.reject_nihil(inferred, arg.span)?;
            arg_types.push(inferred);
        }

        match self.symbols.lookup(&call.callee).cloned() {
            Some(Symbol::Builtin { arity, return_type }) => {
                if !arity.accepts(call.args.len()) {
                    return Err(self.arity_mismatch(call, arity, span));
                }
                Ok(Some(return_type))
            }
            Some(Symbol::Function { params, return_type }) => {
                if call.args.len() != params.len() {
                    return Err(self.arity_mismatch(call, Arity::Exact(params.len()), span));
                }
                for (declared, (inferred, arg)) in
                    params.iter().zip(arg_types.iter().zip(call.args.iter()))
                {
                    self.require_compatible(*declared, *inferred, arg.span)?;
                }
                Ok(Some(return_type))
            }
            // Unknown or non-callable names resolve in the host.
            _ => Ok(None),
        }
    }

    // ========================================================================
    // Shared checks
    // ========================================================================

    /// `nihil` never types a value expression.
    fn reject_nihil(&self, inferred: Option<TypeName>, span: Span) -> Result<(), Diagnostic> {
        if inferred == Some(TypeName::Nihil) {
            return Err(Diagnostic::semantic(
                ErrorCode::NihilNotExpr,
                "Nihil valorem non habet.",
                span,
            ));
        }
        Ok(())
    }

    /// Types are checked for equality; no subtyping. Unknown skips.
    fn require_compatible(
        &self,
        declared: TypeName,
        inferred: Option<TypeName>,
        span: Span,
    ) -> Result<(), Diagnostic> {
        match inferred {
            Some(found) if found != declared => Err(self.type_mismatch(declared, Some(found), span)),
            _ => Ok(()),
        }
    }

    fn type_mismatch(
        &self,
        expected: TypeName,
        found: Option<TypeName>,
        span: Span,
    ) -> Diagnostic {
        let found = found.map_or_else(|| "ignotum".to_string(), |t| t.to_string());
        Diagnostic::semantic(
            ErrorCode::TypeMismatch,
            format!("Genus discrepat: exspectatum '{}', inventum '{}'.", expected, found),
            span,
        )
    }

    fn arity_mismatch(&self, call: &CallExpr, expected: Arity, span: Span) -> Diagnostic {
        let expected = match expected {
            Arity::Exact(n) => n.to_string(),
            Arity::AtMost(n) => format!("ad {}", n),
            Arity::Variadic => "quotlibet".to_string(),
        };
        Diagnostic::semantic(
            ErrorCode::ArgCountMismatch,
            format!(
                "Numerus argumentorum non congruit: '{}' exspectat {}, accipit {}.",
                call.callee,
                expected,
                call.args.len()
            ),
            span,
        )
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic keeps the broader of inte/real; comparison and logical
/// operators yield verum; filum concatenation yields filum.
fn binop_type(
    op: BinOpKind,
    lhs: Option<TypeName>,
    rhs: Option<TypeName>,
) -> Option<TypeName> {
    use TypeName::*;

    if matches!(op, BinOpKind::Aut | BinOpKind::Et) || op.is_comparison() {
        return Some(Verum);
    }

    match (op, lhs, rhs) {
        (BinOpKind::Add, Some(Filum), Some(Filum)) => Some(Filum),
        (_, Some(Inte), Some(Inte)) => Some(Inte),
        (_, Some(Inte), Some(Real))
        | (_, Some(Real), Some(Inte))
        | (_, Some(Real), Some(Real)) => Some(Real),
        _ => None,
    }
}

/// Convenience function to validate a parsed program.
#[tracing::instrument(skip_all, fields(intro_count = program.introductio.len()))]
pub fn check(program: &Program) -> Result<(), Diagnostic> {
    Validator::new().check_program(program)
}

// ============================================================================
// TESTS
// ============================================================================
