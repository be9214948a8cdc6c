//! # pixeq-lang
//!
//! Image formula compiler.
//! Tokenizes formulas such as `I0/(sqrt(I1)+1)`, reduces them to an
//! expression tree by priority term rewriting, then emits an HLSL
//! expression or folds the tree to a float.

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod eval;
pub mod formatter;
pub mod functions;
pub mod lexer;
pub mod prelude;
pub mod rewrite;
pub mod scope;

pub use ast::{BinaryOp, Expr};
pub use compiler::{compile, replace_image, CompiledEquation, Compiler, FloatFormula};
pub use formatter::Formatter;
pub use lexer::{Token, TokenKind, Tokenizer};
pub use rewrite::RewriteEngine;
pub use scope::{ImageScope, ImageUsage, SizeScope};
