use crate::ast::{BinaryOp, Expr};
use pixeq_core::float_literal;

/// Renders a tree back to formula text, fully parenthesised.
///
/// The output parses again to a tree with the same value, which makes it
/// useful for showing how a formula was grouped.
pub struct Formatter {
    output: String,
}

impl Formatter {
    pub fn format(expr: &Expr) -> String {
        let mut formatter = Formatter {
            output: String::new(),
        };
        formatter.format_expr(expr);
        formatter.output
    }

    fn push(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn format_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(value) => self.format_number(*value),
            Expr::Image(id) => self.push(&format!("I{id}")),
            Expr::Binary { lhs, op, rhs } if lhs.is_minus_one() && *op == BinaryOp::Mul => {
                self.push("(-");
                self.format_expr(rhs);
                self.push(")");
            }
            Expr::Binary { lhs, op, rhs } => {
                self.push("(");
                self.format_expr(lhs);
                self.push(&format!(" {op} "));
                self.format_expr(rhs);
                self.push(")");
            }
            Expr::Intrinsic { name, .. } => self.format_call(name, &[]),
            Expr::Unary { name, arg, .. } => {
                self.format_call(name, std::slice::from_ref(arg.as_ref()))
            }
            Expr::BinaryCall { name, args, .. } => self.format_call(name, &args[..]),
            Expr::Tertiary { name, args, .. } => self.format_call(name, &args[..]),
        }
    }

    /// Literals never carry a sign in formula text; negatives print as `(-x)`.
    fn format_number(&mut self, value: f32) {
        if value.is_sign_negative() && !value.is_nan() {
            self.push("(-");
            self.format_number(-value);
            self.push(")");
            return;
        }
        match float_literal(value) {
            Some(literal) => self.push(&literal),
            None if value.is_nan() => self.push("nan"),
            None => self.push("inf"),
        }
    }

    fn format_call(&mut self, name: &str, args: &[Expr]) {
        self.push(name);
        self.push("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.format_expr(arg);
        }
        self.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Tokenizer;
    use crate::rewrite::RewriteEngine;
    use crate::scope::ImageScope;

    fn parse(src: &str) -> Expr {
        let tokens = Tokenizer::new(src).tokenize(&mut ImageScope::new(4)).unwrap();
        RewriteEngine::standard().run(tokens).unwrap()
    }

    #[test]
    fn test_grouping_is_explicit() {
        assert_eq!(
            Formatter::format(&parse("(3-1)*0.4+1")),
            "(((3.0 - 1.0) * 0.4) + 1.0)"
        );
        assert_eq!(Formatter::format(&parse("-I2")), "(-I2)");
        assert_eq!(Formatter::format(&parse("1+0.4*-2")), "(1.0 + (0.4 * (-2.0)))");
    }

    #[test]
    fn test_calls() {
        assert_eq!(
            Formatter::format(&parse("CLAMP(I0,0,max(I1, 2))")),
            "clamp(I0, 0.0, max(I1, 2.0))"
        );
        assert_eq!(Formatter::format(&parse("pos()")), "pos()");
    }

    #[test]
    fn test_special_numbers() {
        assert_eq!(Formatter::format(&Expr::Number(f32::NAN)), "nan");
        assert_eq!(Formatter::format(&Expr::Number(f32::INFINITY)), "inf");
        assert_eq!(Formatter::format(&Expr::Number(f32::NEG_INFINITY)), "(-inf)");
        assert_eq!(Formatter::format(&Expr::Number(-0.5)), "(-0.5)");
    }

    #[test]
    fn test_output_parses_to_same_grouping() {
        for src in ["1+2*3^2", "-2^2", "lerp(I0, I1, 0.5) / 2", "8-4-2", "1+0.4*-2"] {
            let once = Formatter::format(&parse(src));
            let twice = Formatter::format(&parse(&once));
            assert_eq!(once, twice, "{src}");
        }
    }
}
