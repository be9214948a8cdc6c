//! # pixeq-core
//!
//! Core types for the pixeq formula compiler.
//! This crate contains the pieces shared by the language and CLI crates:
//! the error taxonomy, configuration, token spans and scalar math helpers.

pub mod config;
pub mod error;
pub mod math;
pub mod types;

pub use config::*;

pub use error::{ErrorKind, FormulaError, FormulaResult};
pub use math::{float_literal, pow_ex};
pub use types::{SizeVariables, Span};
