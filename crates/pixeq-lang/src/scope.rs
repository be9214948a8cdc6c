//! Identifier resolution for the tokenizer.
//!
//! Buffers starting with a letter are handed to an [`IdentifierScope`]. Image
//! formulas resolve `I<n>` to image slots; numeric formulas resolve the size
//! variables instead. Both fall back to the shared named constants.

use crate::ast::Expr;
use pixeq_core::{FormulaError, FormulaResult, SizeVariables, Span};
use serde::Serialize;
use std::collections::BTreeSet;

/// Resolves identifiers (letter-initial buffers) to value nodes.
pub trait IdentifierScope {
    fn resolve(&mut self, identifier: &str, span: Span) -> FormulaResult<Expr>;
}

/// Named constants, matched case-insensitively.
pub fn constant(name: &str) -> Option<f32> {
    let value = match name.to_ascii_lowercase().as_str() {
        "pi" => std::f32::consts::PI,
        "e" => std::f32::consts::E,
        "inf" | "infinity" => f32::INFINITY,
        "float_max" | "fmax" => f32::MAX,
        // smallest positive subnormal
        "eps" | "epsilon" => f32::from_bits(1),
        "nan" => f32::NAN,
        _ => return None,
    };
    Some(value)
}

/// Image slots observed while tokenizing, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageUsage {
    pub first: Option<u32>,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub ids: BTreeSet<u32>,
}

impl ImageUsage {
    pub fn record(&mut self, id: u32) {
        if self.first.is_none() {
            self.first = Some(id);
        }
        self.min = Some(self.min.map_or(id, |m| m.min(id)));
        self.max = Some(self.max.map_or(id, |m| m.max(id)));
        self.ids.insert(id);
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Scope of image formulas: `I<n>` with `n < max_slots`, plus constants.
#[derive(Debug, Clone)]
pub struct ImageScope {
    max_slots: u32,
    usage: ImageUsage,
}

impl ImageScope {
    pub fn new(max_slots: u32) -> Self {
        Self {
            max_slots,
            usage: ImageUsage::default(),
        }
    }

    pub fn usage(&self) -> &ImageUsage {
        &self.usage
    }

    pub fn into_usage(self) -> ImageUsage {
        self.usage
    }
}

impl IdentifierScope for ImageScope {
    fn resolve(&mut self, identifier: &str, span: Span) -> FormulaResult<Expr> {
        // constants first: `Inf` and `INF` are not image slots
        if let Some(value) = constant(identifier) {
            return Ok(Expr::Number(value));
        }
        if let Some(index) = identifier.strip_prefix('I') {
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FormulaError::bad_image_index(identifier, span));
            }
            let id: u32 = index
                .parse()
                .map_err(|_| FormulaError::bad_image_index(identifier, span))?;
            if id >= self.max_slots {
                return Err(FormulaError::bad_image_index(identifier, span));
            }
            self.usage.record(id);
            return Ok(Expr::Image(id));
        }
        Err(FormulaError::bad_number(identifier, span))
    }
}

/// Scope of numeric formulas: `width`, `height`, `depth`, plus constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeScope {
    variables: SizeVariables,
}

impl SizeScope {
    pub fn new(variables: SizeVariables) -> Self {
        Self { variables }
    }
}

impl IdentifierScope for SizeScope {
    fn resolve(&mut self, identifier: &str, span: Span) -> FormulaResult<Expr> {
        let lower = identifier.to_ascii_lowercase();
        if let Some(value) = self.variables.get(&lower) {
            return Ok(Expr::Number(value));
        }
        if let Some(value) = constant(&lower) {
            return Ok(Expr::Number(value));
        }
        if identifier.starts_with('I') {
            return Err(FormulaError::NotSupported(format!(
                "image reference '{identifier}' in a numeric formula"
            )));
        }
        Err(FormulaError::bad_number(identifier, span))
    }
}
