//! Compiler façade: formula text to a [`CompiledEquation`].

use crate::ast::Expr;
use crate::codegen;
use crate::lexer::{TokenKind, Tokenizer};
use crate::rewrite::RewriteEngine;
use crate::scope::{ImageScope, ImageUsage, SizeScope};
use pixeq_core::{CompilerConfig, FormulaResult, SizeVariables};
use std::collections::BTreeSet;

/// Compiles image formulas against a fixed number of image slots.
///
/// Holds no state between calls, so one instance can be shared freely
/// across threads.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    max_image_slots: u32,
    engine: RewriteEngine,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl Compiler {
    pub fn new(max_image_slots: u32) -> Self {
        Self {
            max_image_slots,
            engine: RewriteEngine::standard(),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            max_image_slots: config.max_image_slots,
            engine: RewriteEngine::standard().with_max_depth(config.max_depth),
        }
    }

    pub fn max_image_slots(&self) -> u32 {
        self.max_image_slots
    }

    pub fn max_depth(&self) -> usize {
        self.engine.max_depth()
    }

    /// Tokenize, rewrite to a single root and record which slots are used.
    ///
    /// Function names are not checked yet; see [`CompiledEquation::validate`].
    pub fn compile(&self, formula: &str) -> FormulaResult<CompiledEquation> {
        tracing::debug!(formula, max_image_slots = self.max_image_slots, "compiling formula");

        let mut scope = ImageScope::new(self.max_image_slots);
        let tokens = Tokenizer::new(formula).tokenize(&mut scope)?;
        let token_count = tokens.len();
        let root = self.engine.run(tokens)?;

        tracing::debug!(tokens = token_count, nodes = root.node_count(), "formula compiled");
        Ok(CompiledEquation {
            root,
            usage: scope.into_usage(),
        })
    }
}

/// Compile `formula` with image references bounded by `max_image_slots`.
pub fn compile(formula: &str, max_image_slots: u32) -> FormulaResult<CompiledEquation> {
    Compiler::new(max_image_slots).compile(formula)
}

/// A successfully rewritten image formula.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEquation {
    root: Expr,
    usage: ImageUsage,
}

impl CompiledEquation {
    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn usage(&self) -> &ImageUsage {
        &self.usage
    }

    /// The HLSL `float4` expression. Fails for unknown function names.
    pub fn shader_expression(&self) -> FormulaResult<String> {
        codegen::emit(&self.root)
    }

    /// Checks that the tree can be emitted, without keeping the text.
    pub fn validate(&self) -> FormulaResult<()> {
        self.shader_expression().map(|_| ())
    }

    /// Numeric value of a formula without image or per-pixel terms.
    pub fn to_float(&self) -> FormulaResult<f32> {
        self.root.to_float()
    }

    pub fn min_image_id(&self) -> Option<u32> {
        self.usage.min
    }

    pub fn max_image_id(&self) -> Option<u32> {
        self.usage.max
    }

    /// First image referenced in the text, reading left to right.
    pub fn first_image_id(&self) -> Option<u32> {
        self.usage.first
    }

    pub fn image_ids(&self) -> &BTreeSet<u32> {
        &self.usage.ids
    }

    /// True if every referenced slot exists when `num_images` are loaded.
    pub fn is_valid_for(&self, num_images: u32) -> bool {
        self.usage.max.map_or(true, |max| max < num_images)
    }
}

/// A numeric formula over `width`, `height` and `depth`.
///
/// The text is validated once on [`parse`](FloatFormula::parse); each
/// evaluation re-reads it with the given sizes bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatFormula {
    source: String,
}

impl FloatFormula {
    pub fn parse(source: &str) -> FormulaResult<Self> {
        let formula = Self {
            source: source.to_string(),
        };
        formula.evaluate(SizeVariables::default())?;
        Ok(formula)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, sizes: SizeVariables) -> FormulaResult<f32> {
        let mut scope = SizeScope::new(sizes);
        let tokens = Tokenizer::new(&self.source).tokenize(&mut scope)?;
        RewriteEngine::standard().run(tokens)?.to_float()
    }
}

/// Rewrite every `I<old>` in `formula` to `I<new>`, leaving all other text
/// untouched. The formula must tokenize; slot bounds are not checked.
pub fn replace_image(formula: &str, old: u32, new: u32) -> FormulaResult<String> {
    let mut scope = ImageScope::new(u32::MAX);
    let tokens = Tokenizer::new(formula).tokenize(&mut scope)?;

    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut cursor = 0;
    for token in &tokens {
        if token.kind != TokenKind::Value(Expr::Image(old)) {
            continue;
        }
        out.extend(&chars[cursor..token.span.start]);
        out.push_str(&format!("I{new}"));
        cursor = token.span.end;
    }
    out.extend(&chars[cursor..]);

    tracing::debug!(old, new, formula, replaced = %out, "replaced image reference");
    Ok(out)
}
