//! AST → Python lowering
//!
//! Produces host source text semantically equivalent to the validated AST.
//! Children are visited left to right so the evaluation order of the source
//! survives the language boundary, and the output is byte-identical across
//! runs for a given AST.
//!
//! Layout of the emitted module:
//! - a constant preamble (runtime error class, clock shims)
//! - INTRODUCTIO statements at module level
//! - one `def` per declared function, `subjecto` last
//! - the `if __name__ == "__main__":` trailer calling `subjecto()`

use crate::frontend::ast::*;

use super::py_emitter::{py_real_lit, py_str_lit, PyEmitter};

/// Default iteration budget when a loop declares no quota.
const DEFAULT_QUOTA: i64 = 100;

/// Arcana built-ins routed to host equivalents. `tempus` and `chronos`
/// resolve to the preamble shims under their own names.
fn builtin_target(name: &str) -> &str {
    match name {
        "indicant" => "print",
        "accipere" => "input",
        "longitudo" => "len",
        "figura" => "type",
        other => other,
    }
}

pub struct PyCodegen {
    e: PyEmitter,
    /// Current loop nesting, used to keep synthetic names unique.
    loop_depth: usize,
}

impl PyCodegen {
    pub fn new() -> Self {
        Self {
            e: PyEmitter::new(),
            loop_depth: 0,
        }
    }

    /// Generate the whole host module for a validated program.
    pub fn generate(mut self, program: &Program) -> String {
        self.emit_preamble();

        // INTRODUCTIO: module-level declarations and statements.
        for stmt in &program.introductio {
            self.emit_stmt(&stmt.node);
        }

        // DOCTRINA: the entry function, then the trailer calling it.
        self.e.blank_line();
        self.e.line("def subjecto():");
        self.e.indent();
        self.emit_body(&program.main.body);
        self.e.dedent();

        self.e.blank_line();
        self.e.line("if __name__ == \"__main__\":");
        self.e.indent();
        self.e.line("subjecto()");
        self.e.dedent();

        self.e.finish()
    }

    fn emit_preamble(&mut self) {
        self.e.line("import time");
        self.e.blank_line();
        self.e.blank_line();
        self.e.suite("class ArcanaRuntimeError(RuntimeError)", |e| {
            e.suite("def __init__(self, code, message)", |e| {
                e.line("self.code = code");
                e.line("self.message = message");
                e.line("super().__init__('[' + code + '] ' + message)");
            });
        });
        self.e.blank_line();
        self.e.blank_line();
        self.e.suite("def tempus()", |e| {
            e.line("return time.time()");
        });
        self.e.blank_line();
        self.e.blank_line();
        self.e.suite("def chronos()", |e| {
            e.line("return time.perf_counter()");
        });
        self.e.blank_line();
        self.e.blank_line();
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Emit a statement list, falling back to `pass` when empty.
    fn emit_body(&mut self, body: &[Spanned<Stmt>]) {
        if body.is_empty() {
            self.e.line("pass");
            return;
        }
        for stmt in body {
            self.emit_stmt(&stmt.node);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => {
                let value = match &decl.init {
                    Some(init) => self.emit_expr(&init.node),
                    None => zero_value(decl.ty).to_string(),
                };
                self.e.line(&format!("{} = {}", decl.name, value));
            }
            Stmt::Const(decl) => {
                let value = self.emit_expr(&decl.init.node);
                self.e.line(&format!("{} = {}", decl.name, value));
            }
            Stmt::Func(decl) => self.emit_func(decl),
            // Reserved syntax: no host counterpart.
            Stmt::Class(_) => {}
            Stmt::Assign { target, value } => {
                let value = self.emit_expr(&value.node);
                self.e.line(&format!("{} = {}", target, value));
            }
            Stmt::Move { target, source } => {
                // A move is a host-level rebinding.
                self.e.line(&format!("{} = {}", target, source));
            }
            Stmt::Call(call) => {
                let call = self.emit_call(call);
                self.e.line(&call);
            }
            Stmt::If { cond, verum, falsum } => {
                let cond = self.emit_expr(&cond.node);
                self.e.line(&format!("if {}:", cond));
                self.e.indent();
                self.emit_body(verum);
                self.e.dedent();
                // An absent FALSUM still gets a no-op else branch.
                self.e.line("else:");
                self.e.indent();
                self.emit_body(falsum);
                self.e.dedent();
            }
            Stmt::Loop(l) => self.emit_loop(l),
            Stmt::Expr(expr) => {
                let expr = self.emit_expr(&expr.node);
                self.e.line(&expr);
            }
            Stmt::NihilStmt => self.e.line("pass"),
            Stmt::Break => self.e.line("break"),
            Stmt::Continue => self.e.line("continue"),
            Stmt::Return { value } => match value {
                Some(expr) => {
                    let expr = self.emit_expr(&expr.node);
                    self.e.line(&format!("return {}", expr));
                }
                None => self.e.line("return"),
            },
        }
    }

    fn emit_func(&mut self, decl: &FuncDecl) {
        let params = decl
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.e.blank_line();
        self.e.line(&format!("def {}({}):", decl.name, params));
        self.e.indent();
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.emit_body(&decl.body);
        self.loop_depth = saved_depth;
        self.e.dedent();
        self.e.blank_line();
    }

    /// Lower a RECURSIO to a bounded host loop.
    ///
    /// One counter serves both the user-visible binding (from the quota
    /// assignment) and the quota guard; the budget is hoisted once so a
    /// side-effecting quota expression is evaluated a single time. The step
    /// is applied after the body, guarded for positivity unless it is a
    /// positive literal.
    fn emit_loop(&mut self, l: &LoopStmt) {
        self.loop_depth += 1;
        let suffix = if self.loop_depth == 1 {
            String::new()
        } else {
            self.loop_depth.to_string()
        };

        let (counter, init) = match &l.quota {
            Some(QuotaClause::Counter { name, init }) => {
                (name.clone(), self.emit_expr(&init.node))
            }
            _ => (format!("__arc_i{}", suffix), "0".to_string()),
        };
        let budget = match &l.quota {
            Some(QuotaClause::Budget(expr)) => self.emit_expr(&expr.node),
            _ => DEFAULT_QUOTA.to_string(),
        };
        let quota_var = format!("__arc_q{}", suffix);

        self.e.line(&format!("{} = {}", counter, init));
        self.e.line(&format!("{} = {}", quota_var, budget));

        let cond = self.emit_expr(&l.cond.node);
        self.e.line(&format!("while {}:", cond));
        self.e.indent();

        self.e.line(&format!("if {} >= {}:", counter, quota_var));
        self.e.indent();
        self.e.line(
            "raise ArcanaRuntimeError('R0100_VERITATEM_NON_ATTIGI', 'Veritatem non attigi.')",
        );
        self.e.dedent();

        for stmt in &l.body {
            self.emit_stmt(&stmt.node);
        }

        // Advance the counter by the step, default +1.
        match &l.step {
            None => self.e.line(&format!("{0} = {0} + 1", counter)),
            Some(expr) if is_positive_literal(&expr.node) => {
                let step = self.emit_expr(&expr.node);
                self.e.line(&format!("{0} = {0} + {1}", counter, step));
            }
            Some(expr) => {
                let step_var = format!("__arc_s{}", suffix);
                let step = self.emit_expr(&expr.node);
                self.e.line(&format!("{} = {}", step_var, step));
                self.e.line(&format!("if {} <= 0:", step_var));
                self.e.indent();
                self.e.line(
                    "raise ArcanaRuntimeError('E0110_LOOP_STEP_NOT_POSITIVE', \
                     'stationarius accelerationis')",
                );
                self.e.dedent();
                self.e.line(&format!("{0} = {0} + {1}", counter, step_var));
            }
        }

        self.e.dedent();
        self.loop_depth -= 1;
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Ident(name) => builtin_target(name).to_string(),
            Expr::IntLit(v) => v.to_string(),
            Expr::RealLit(v) => py_real_lit(*v),
            Expr::StrLit(s) => py_str_lit(s),
            Expr::FStrLit(parts) => self.emit_fstring(parts),
            Expr::DictLit(pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(k, v)| {
                        format!("{}: {}", self.emit_expr(&k.node), self.emit_expr(&v.node))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", pairs)
            }
            Expr::Unary { op, operand } => {
                let inner = self.emit_expr(&operand.node);
                match op {
                    UnaryOpKind::Not => format!("(not {})", inner),
                    UnaryOpKind::Neg => format!("(-{})", inner),
                }
            }
            Expr::BinOp { op, lhs, rhs } => {
                let lhs = self.emit_expr(&lhs.node);
                let rhs = self.emit_expr(&rhs.node);
                format!("({} {} {})", lhs, binop_target(*op), rhs)
            }
            Expr::Call(call) => self.emit_call(call),
        }
    }

    /// A cantus lowers to a concatenation of string-coerced parts in order.
    fn emit_fstring(&mut self, parts: &[FStrPart]) -> String {
        if parts.is_empty() {
            return "''".to_string();
        }
        let rendered = parts
            .iter()
            .map(|part| match part {
                FStrPart::Text(text) => py_str_lit(text),
                FStrPart::Expr(expr) => format!("str({})", self.emit_expr(&expr.node)),
            })
            .collect::<Vec<_>>();
        if rendered.len() == 1 {
            rendered.into_iter().next().unwrap_or_default()
        } else {
            format!("({})", rendered.join(" + "))
        }
    }

    fn emit_call(&mut self, call: &CallExpr) -> String {
        let args = call
            .args
            .iter()
            .map(|a| self.emit_expr(&a.node))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", builtin_target(&call.callee), args)
    }
}

impl Default for PyCodegen {
    fn default() -> Self {
        Self::new()
    }
}

fn binop_target(op: BinOpKind) -> &'static str {
    match op {
        BinOpKind::Aut => "or",
        BinOpKind::Et => "and",
        BinOpKind::Eq => "==",
        BinOpKind::NotEq => "!=",
        BinOpKind::Lt => "<",
        BinOpKind::Gt => ">",
        BinOpKind::LtEq => "<=",
        BinOpKind::GtEq => ">=",
        BinOpKind::Add => "+",
        BinOpKind::Sub => "-",
        BinOpKind::Mul => "*",
        BinOpKind::Div => "/",
        BinOpKind::Mod => "%",
        BinOpKind::Pow => "**",
    }
}

/// Host zero value for an uninitialized declaration.
fn zero_value(ty: TypeName) -> &'static str {
    match ty {
        TypeName::Inte => "0",
        TypeName::Real => "0.0",
        TypeName::Filum => "''",
        TypeName::Verum => "False",
        TypeName::Ordinata => "[]",
        TypeName::Catalogus => "{}",
        TypeName::Nihil => "None",
    }
}

fn is_positive_literal(expr: &Expr) -> bool {
    match expr {
        Expr::IntLit(v) => *v > 0,
        Expr::RealLit(v) => *v > 0.0,
        _ => false,
    }
}

/// Convenience function to transpile a validated program.
#[tracing::instrument(skip_all, fields(intro_count = program.introductio.len()))]
pub fn transpile(program: &Program) -> String {
    PyCodegen::new().generate(program)
}

// ============================================================================
// TESTS
// ============================================================================
