//! Constant folding for loop-header validation
//!
//! Quota and acceleratio clauses are checked statically when their value is
//! a literal or folds to one through arithmetic and `PRINCIPIUM` constants.
//! Anything that does not fold is left to the runtime guards.

use crate::frontend::ast::{BinOpKind, Expr, Spanned, UnaryOpKind};
use crate::frontend::symbols::Symbol;

use super::Validator;

/// A folded constant value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Real(f64),
}

impl ConstValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ConstValue::Int(v) => v as f64,
            ConstValue::Real(v) => v,
        }
    }

    pub fn is_positive(self) -> bool {
        self.as_f64() > 0.0
    }
}

impl Validator {
    /// Fold an expression to a numeric constant, if possible.
    ///
    /// Identifiers fold only when they name a `PRINCIPIUM` constant whose
    /// initializer itself folded. Division by zero and overflow abort the
    /// fold rather than the validation.
    pub(super) fn fold_const(&self, expr: &Spanned<Expr>) -> Option<ConstValue> {
        match &expr.node {
            Expr::IntLit(v) => Some(ConstValue::Int(*v)),
            Expr::RealLit(v) => Some(ConstValue::Real(*v)),
            Expr::Ident(name) => {
                // Only constants fold; a shadowing variable blocks the fold.
                match self.symbols.lookup(name) {
                    Some(Symbol::Const { .. }) => self.const_values.get(name).copied(),
                    _ => None,
                }
            }
            Expr::Unary { op: UnaryOpKind::Neg, operand } => {
                match self.fold_const(operand)? {
                    ConstValue::Int(v) => Some(ConstValue::Int(v.checked_neg()?)),
                    ConstValue::Real(v) => Some(ConstValue::Real(-v)),
                }
            }
            Expr::BinOp { op, lhs, rhs } => {
                let l = self.fold_const(lhs)?;
                let r = self.fold_const(rhs)?;
                fold_binop(*op, l, r)
            }
            _ => None,
        }
    }
}

fn fold_binop(op: BinOpKind, l: ConstValue, r: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Int, Real};

    match (op, l, r) {
        (BinOpKind::Add, Int(a), Int(b)) => Some(Int(a.checked_add(b)?)),
        (BinOpKind::Sub, Int(a), Int(b)) => Some(Int(a.checked_sub(b)?)),
        (BinOpKind::Mul, Int(a), Int(b)) => Some(Int(a.checked_mul(b)?)),
        (BinOpKind::Div, Int(a), Int(b)) => Some(Int(a.checked_div(b)?)),
        (BinOpKind::Mod, Int(a), Int(b)) => Some(Int(a.checked_rem(b)?)),
        (BinOpKind::Pow, Int(a), Int(b)) => {
            let exp = u32::try_from(b).ok()?;
            Some(Int(a.checked_pow(exp)?))
        }
        (BinOpKind::Add, a, b) => Some(Real(a.as_f64() + b.as_f64())),
        (BinOpKind::Sub, a, b) => Some(Real(a.as_f64() - b.as_f64())),
        (BinOpKind::Mul, a, b) => Some(Real(a.as_f64() * b.as_f64())),
        (BinOpKind::Div, a, b) => {
            let d = b.as_f64();
            if d == 0.0 {
                None
            } else {
                Some(Real(a.as_f64() / d))
            }
        }
        (BinOpKind::Mod, a, b) => {
            let d = b.as_f64();
            if d == 0.0 {
                None
            } else {
                Some(Real(a.as_f64() % d))
            }
        }
        (BinOpKind::Pow, a, b) => Some(Real(a.as_f64().powf(b.as_f64()))),
        // Logical and comparison operators never fold to a number.
        _ => None,
    }
}
