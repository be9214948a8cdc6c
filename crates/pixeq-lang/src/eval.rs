//! Constant folding of expression trees to a single float.
//!
//! Used by numeric formulas (sizes, offsets) where every leaf is a number.
//! Image slots and per-pixel intrinsics have no value here.

use crate::ast::{BinaryOp, Expr};
use crate::functions;
use pixeq_core::{pow_ex, FormulaError, FormulaResult, Span};

pub fn evaluate(expr: &Expr) -> FormulaResult<f32> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Image(id) => Err(FormulaError::NotSupported(format!(
            "image I{id} cannot be evaluated to a number"
        ))),
        Expr::Binary { lhs, op, rhs } => {
            let lhs = evaluate(lhs)?;
            let rhs = evaluate(rhs)?;
            Ok(match op {
                BinaryOp::Pow => pow_ex(lhs, rhs),
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => lhs / rhs,
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
            })
        }
        Expr::Intrinsic { name, span } => call(name, &[], *span),
        Expr::Unary { name, arg, span } => call(name, std::slice::from_ref(arg.as_ref()), *span),
        Expr::BinaryCall { name, args, span } => call(name, &args[..], *span),
        Expr::Tertiary { name, args, span } => call(name, &args[..], *span),
    }
}

fn call(name: &str, args: &[Expr], span: Span) -> FormulaResult<f32> {
    let def = functions::lookup(name, args.len())
        .ok_or_else(|| FormulaError::unknown_function(name, args.len(), span))?;
    let not_scalar =
        || FormulaError::NotSupported(format!("{name}() has no numeric form"));

    let scalar = def.eval.ok_or_else(not_scalar)?;
    let values = args.iter().map(evaluate).collect::<FormulaResult<Vec<_>>>()?;
    scalar.apply(&values).ok_or_else(not_scalar)
}

impl Expr {
    /// Fold this tree to a float; see [`evaluate`].
    pub fn to_float(&self) -> FormulaResult<f32> {
        evaluate(self)
    }
}
