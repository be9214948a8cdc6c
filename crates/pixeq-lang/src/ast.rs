//! Expression tree produced by the rewrite engine.

use pixeq_core::Span;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Infix arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Pow,
    Mul,
    Div,
    Add,
    Sub,
}

impl BinaryOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(BinaryOp::Pow),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            BinaryOp::Pow => '^',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
        }
    }

    /// Binding tier: 1 binds tightest (`^`), 3 loosest (`+ -`).
    pub fn tier(self) -> u8 {
        match self {
            BinaryOp::Pow => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A fully reduced sub-expression. Trees are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Literal constant; may be NaN or infinite.
    Number(f32),
    /// Input image slot `I<id>`.
    Image(u32),
    /// `lhs op rhs`
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
    /// Zero-argument built-in such as `pos()`.
    Intrinsic { name: String, span: Span },
    Unary {
        name: String,
        arg: Box<Expr>,
        span: Span,
    },
    BinaryCall {
        name: String,
        args: Box<[Expr; 2]>,
        span: Span,
    },
    Tertiary {
        name: String,
        args: Box<[Expr; 3]>,
        span: Span,
    },
}

impl Expr {
    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// `-x` is represented as `-1 * x`.
    pub fn negate(value: Expr) -> Self {
        Expr::binary(Expr::Number(-1.0), BinaryOp::Mul, value)
    }

    pub fn is_minus_one(&self) -> bool {
        matches!(self, Expr::Number(v) if *v == -1.0)
    }

    /// Function name and arguments if this node is a call.
    pub fn call_parts(&self) -> Option<(&str, &[Expr], Span)> {
        match self {
            Expr::Intrinsic { name, span } => Some((name.as_str(), &[][..], *span)),
            Expr::Unary { name, arg, span } => {
                Some((name.as_str(), std::slice::from_ref(arg.as_ref()), *span))
            }
            Expr::BinaryCall { name, args, span } => Some((name.as_str(), &args[..], *span)),
            Expr::Tertiary { name, args, span } => Some((name.as_str(), &args[..], *span)),
            Expr::Number(_) | Expr::Image(_) | Expr::Binary { .. } => None,
        }
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Number(_) | Expr::Image(_) | Expr::Intrinsic { .. } => Vec::new(),
            Expr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Unary { arg, .. } => vec![arg.as_ref()],
            Expr::BinaryCall { args, .. } => args.iter().collect(),
            Expr::Tertiary { args, .. } => args.iter().collect(),
        }
    }

    /// All image slots referenced anywhere in the tree.
    pub fn image_ids(&self) -> BTreeSet<u32> {
        let mut ids = BTreeSet::new();
        self.collect_image_ids(&mut ids);
        ids
    }

    fn collect_image_ids(&self, ids: &mut BTreeSet<u32>) {
        if let Expr::Image(id) = self {
            ids.insert(*id);
        }
        for child in self.children() {
            child.collect_image_ids(ids);
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expr::node_count)
            .sum::<usize>()
    }
}
