use serde::{Deserialize, Serialize};
use std::fmt;

/// Character range of a token inside the formula text (`start..end`, in chars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Values substituted for `width`, `height` and `depth` in numeric formulas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeVariables {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl SizeVariables {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Look up a variable by its (lower-case) formula name.
    pub fn get(&self, name: &str) -> Option<f32> {
        match name {
            "width" => Some(self.width),
            "height" => Some(self.height),
            "depth" => Some(self.depth),
            _ => None,
        }
    }
}
