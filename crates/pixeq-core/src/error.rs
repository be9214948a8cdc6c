//! Core error types for the pixeq formula compiler.

use crate::types::Span;

/// A specialized Result type for pixeq operations.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// Coarse classification of a [`FormulaError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyFormula,
    BadImageIndex,
    BadNumber,
    Unresolvable,
    UnknownFunction,
    NotSupported,
    Config,
    Io,
}

/// Top-level error type for every compile phase.
///
/// All variants are terminal: a failing formula never yields a partial result.
#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    #[error("please enter a formula")]
    EmptyFormula,

    #[error("invalid image identifier '{identifier}' at {span}")]
    BadImageIndex { identifier: String, span: Span },

    #[error("invalid number '{literal}' at {span}")]
    BadNumber { literal: String, span: Span },

    #[error("{message}")]
    Unresolvable {
        message: String,
        span: Option<Span>,
    },

    #[error("unknown function '{name}' taking {arity} argument(s) at {span}")]
    UnknownFunction {
        name: String,
        arity: usize,
        span: Span,
    },

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormulaError {
    /// Create a bad-image-index error for the given identifier.
    pub fn bad_image_index(identifier: impl Into<String>, span: Span) -> Self {
        FormulaError::BadImageIndex {
            identifier: identifier.into(),
            span,
        }
    }

    /// Create a bad-number error for the given literal.
    pub fn bad_number(literal: impl Into<String>, span: Span) -> Self {
        FormulaError::BadNumber {
            literal: literal.into(),
            span,
        }
    }

    /// Create an unresolvable-formula error, optionally anchored at a token.
    pub fn unresolvable(message: impl Into<String>, span: Option<Span>) -> Self {
        FormulaError::Unresolvable {
            message: message.into(),
            span,
        }
    }

    pub fn unknown_function(name: impl Into<String>, arity: usize, span: Span) -> Self {
        FormulaError::UnknownFunction {
            name: name.into(),
            arity,
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::EmptyFormula => ErrorKind::EmptyFormula,
            FormulaError::BadImageIndex { .. } => ErrorKind::BadImageIndex,
            FormulaError::BadNumber { .. } => ErrorKind::BadNumber,
            FormulaError::Unresolvable { .. } => ErrorKind::Unresolvable,
            FormulaError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            FormulaError::NotSupported(_) => ErrorKind::NotSupported,
            FormulaError::Config(_) => ErrorKind::Config,
            FormulaError::Io(_) => ErrorKind::Io,
        }
    }

    /// Position of the offending token, where one is known.
    pub fn span(&self) -> Option<Span> {
        match self {
            FormulaError::BadImageIndex { span, .. }
            | FormulaError::BadNumber { span, .. }
            | FormulaError::UnknownFunction { span, .. } => Some(*span),
            FormulaError::Unresolvable { span, .. } => *span,
            _ => None,
        }
    }
}
