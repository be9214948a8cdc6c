//! Shader emission: expression tree to HLSL expression text.
//!
//! The output is a single `float4` expression. It relies on helpers the
//! surrounding shader provides: `GetTexture<n>(coord)`, `f4`, `powEx`, the
//! `f`-prefixed comparisons and the sRGB converters (see [`crate::prelude`]).

use crate::ast::{BinaryOp, Expr};
use crate::functions::{self, Emit};
use pixeq_core::{float_literal, FormulaError, FormulaResult, Span};

/// Emit the shader expression for `expr`.
///
/// Function names are checked here, not during rewriting, so a structurally
/// valid tree can still fail with [`FormulaError::UnknownFunction`].
pub fn emit(expr: &Expr) -> FormulaResult<String> {
    match expr {
        Expr::Number(value) => Ok(number(*value)),
        Expr::Image(id) => Ok(format!("GetTexture{id}(coord)")),
        Expr::Binary { lhs, op, rhs } => {
            let lhs = emit(lhs)?;
            let rhs = emit(rhs)?;
            Ok(match op {
                BinaryOp::Pow => format!("powEx({lhs},{rhs})"),
                _ => format!("({lhs}{}{rhs})", op.as_char()),
            })
        }
        Expr::Intrinsic { name, span } => call(name, &[], *span),
        Expr::Unary { name, arg, span } => call(name, std::slice::from_ref(arg.as_ref()), *span),
        Expr::BinaryCall { name, args, span } => call(name, &args[..], *span),
        Expr::Tertiary { name, args, span } => call(name, &args[..], *span),
    }
}

/// `f4(<literal>)`; non-finite values are rebuilt from their bit pattern.
pub fn number(value: f32) -> String {
    match float_literal(value) {
        Some(literal) => format!("f4({literal})"),
        None => format!("f4(asfloat(0x{:08X}u))", value.to_bits()),
    }
}

fn call(name: &str, args: &[Expr], span: Span) -> FormulaResult<String> {
    let def = functions::lookup(name, args.len())
        .ok_or_else(|| FormulaError::unknown_function(name, args.len(), span))?;
    let args = args.iter().map(emit).collect::<FormulaResult<Vec<_>>>()?;

    let text = match (def.emit, args.as_slice()) {
        (Emit::Literal(text), []) => text.to_string(),
        (Emit::Call(target), _) => format!("{target}({})", args.join(",")),
        (Emit::Swizzle(swizzle), [a]) => format!("({a}).{swizzle}"),
        (Emit::Vec3Scalar(target), _) => format!("f4({target}({}))", rgb_args(&args)),
        (Emit::Vec3Vector(target), _) => format!("float4({target}({}),1.0)", rgb_args(&args)),
        (Emit::Vec3Test(target), [a]) => format!("f4({target}(({a}).xyz)?1.0:0.0)"),
        (Emit::ClampedPow, [base, exponent]) => {
            format!("powEx(max({base},{}),{exponent})", number(0.0))
        }
        (Emit::ComposeRgb, [r, g, b]) => format!("float4(({r}).r,({g}).r,({b}).r,1.0)"),
        (Emit::LerpScalar, [a, b, t]) => format!("lerp({a},{b},({t}).r)"),
        _ => return Err(FormulaError::unknown_function(name, args.len(), span)),
    };
    Ok(text)
}

fn rgb_args(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("({a}).xyz"))
        .collect::<Vec<_>>()
        .join(",")
}

impl Expr {
    /// Shader expression for this tree; see [`emit`].
    pub fn shader_expression(&self) -> FormulaResult<String> {
        emit(self)
    }
}
