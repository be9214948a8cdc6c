//! Formula tokenizer: text to a flat token list.

use crate::ast::{BinaryOp, Expr};
use crate::scope::IdentifierScope;
use pixeq_core::{FormulaError, FormulaResult, Span};
use std::fmt;

/// Token kinds. `Value` carries an already reduced sub-expression, so the
/// rewrite engine can fold tokens in place.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Value(Expr),
    Operator(BinaryOp),
    BracketOpen,
    BracketClose,
    Separator,
    /// `name(`, the call site of a function.
    FunctionStart(String),
}

/// Payload-free token classification used by rewrite patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Value,
    /// `^`
    Op1,
    /// `*` `/`
    Op2,
    /// `+` `-`
    Op3,
    BracketOpen,
    BracketClose,
    Separator,
    FunctionStart,
}

impl TokenKind {
    pub fn class(&self) -> TokenClass {
        match self {
            TokenKind::Value(_) => TokenClass::Value,
            TokenKind::Operator(op) => match op.tier() {
                1 => TokenClass::Op1,
                2 => TokenClass::Op2,
                _ => TokenClass::Op3,
            },
            TokenKind::BracketOpen => TokenClass::BracketOpen,
            TokenKind::BracketClose => TokenClass::BracketClose,
            TokenKind::Separator => TokenClass::Separator,
            TokenKind::FunctionStart(_) => TokenClass::FunctionStart,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Value(Expr::Number(n)) => write!(f, "{}", n),
            TokenKind::Value(Expr::Image(id)) => write!(f, "I{}", id),
            TokenKind::Value(_) => write!(f, "<expr>"),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::BracketOpen => write!(f, "("),
            TokenKind::BracketClose => write!(f, ")"),
            TokenKind::Separator => write!(f, ","),
            TokenKind::FunctionStart(name) => write!(f, "{}(", name),
        }
    }
}

/// A token with its kind and source location.
///
/// `depth` is the height of the expression a `Value` token carries (1 for a
/// literal or image) and 0 for every other kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub depth: usize,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        let depth = usize::from(matches!(kind, TokenKind::Value(_)));
        Self { kind, span, depth }
    }

    /// A value token whose expression is `depth` levels deep.
    pub fn value(expr: Expr, span: Span, depth: usize) -> Self {
        Self {
            kind: TokenKind::Value(expr),
            span,
            depth,
        }
    }

    pub fn class(&self) -> TokenClass {
        self.kind.class()
    }
}

/// The formula tokenizer.
///
/// Single left-to-right scan over an identifier/number buffer. Whitespace
/// and every punctuation character flush the buffer; a non-empty buffer
/// directly followed by `(` becomes a [`TokenKind::FunctionStart`].
pub struct Tokenizer {
    source: Vec<char>,
    buffer: String,
    buffer_start: usize,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            buffer: String::new(),
            buffer_start: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire formula, resolving identifiers through `scope`.
    pub fn tokenize(mut self, scope: &mut impl IdentifierScope) -> FormulaResult<Vec<Token>> {
        for pos in 0..self.source.len() {
            let ch = self.source[pos];
            let single = Span::new(pos, pos + 1);
            match ch {
                '^' | '*' | '/' => {
                    self.flush(scope, pos)?;
                    self.push_operator(ch, single);
                }
                '+' | '-' => {
                    if self.in_exponent() {
                        // scientific notation: 1e-10
                        self.buffer.push(ch);
                        continue;
                    }
                    self.flush(scope, pos)?;
                    self.push_operator(ch, single);
                }
                ',' => {
                    self.flush(scope, pos)?;
                    self.tokens.push(Token::new(TokenKind::Separator, single));
                }
                '(' => {
                    if self.buffer.is_empty() {
                        self.tokens.push(Token::new(TokenKind::BracketOpen, single));
                    } else {
                        let name = std::mem::take(&mut self.buffer);
                        let span = Span::new(self.buffer_start, pos + 1);
                        self.tokens.push(Token::new(TokenKind::FunctionStart(name), span));
                    }
                }
                ')' => {
                    self.flush(scope, pos)?;
                    self.tokens.push(Token::new(TokenKind::BracketClose, single));
                }
                c if c.is_whitespace() => self.flush(scope, pos)?,
                c => {
                    if self.buffer.is_empty() {
                        self.buffer_start = pos;
                    }
                    self.buffer.push(c);
                }
            }
        }
        let end = self.source.len();
        self.flush(scope, end)?;

        if self.tokens.is_empty() {
            return Err(FormulaError::EmptyFormula);
        }
        Ok(self.tokens)
    }

    fn push_operator(&mut self, ch: char, span: Span) {
        if let Some(op) = BinaryOp::from_char(ch) {
            self.tokens.push(Token::new(TokenKind::Operator(op), span));
        }
    }

    /// True when the buffer is a numeric literal ending in `<digit>e`.
    fn in_exponent(&self) -> bool {
        let mut tail = self.buffer.chars().rev();
        let (Some(last), Some(before)) = (tail.next(), tail.next()) else {
            return false;
        };
        let numeric_start = self
            .buffer
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.');
        numeric_start && last.eq_ignore_ascii_case(&'e') && before.is_ascii_digit()
    }

    fn flush(&mut self, scope: &mut impl IdentifierScope, end: usize) -> FormulaResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.buffer);
        let span = Span::new(self.buffer_start, end);
        let value = value_from_buffer(&text, span, scope)?;
        self.tokens.push(Token::new(TokenKind::Value(value), span));
        Ok(())
    }
}

/// Letter-initial buffers go to the scope; everything else must be a
/// locale-independent float literal.
fn value_from_buffer(
    text: &str,
    span: Span,
    scope: &mut impl IdentifierScope,
) -> FormulaResult<Expr> {
    let starts_with_letter = text.chars().next().is_some_and(char::is_alphabetic);
    if starts_with_letter {
        return scope.resolve(text, span);
    }
    let value: f64 = text
        .parse()
        .map_err(|_| FormulaError::bad_number(text, span))?;
    Ok(Expr::Number(value as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ImageScope;
    use pixeq_core::ErrorKind;

    fn tokenize(src: &str) -> Vec<TokenKind> {
        let mut scope = ImageScope::new(4);
        Tokenizer::new(src)
            .tokenize(&mut scope)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn tokenize_err(src: &str) -> ErrorKind {
        let mut scope = ImageScope::new(4);
        Tokenizer::new(src).tokenize(&mut scope).unwrap_err().kind()
    }

    #[test]
    fn test_operators_and_brackets() {
        let tokens = tokenize("(I0^2)*I1/3+1-2");
        assert_eq!(tokens[0], TokenKind::BracketOpen);
        assert_eq!(tokens[1], TokenKind::Value(Expr::Image(0)));
        assert_eq!(tokens[2], TokenKind::Operator(BinaryOp::Pow));
        assert_eq!(tokens[3], TokenKind::Value(Expr::Number(2.0)));
        assert_eq!(tokens[4], TokenKind::BracketClose);
        assert_eq!(tokens[5], TokenKind::Operator(BinaryOp::Mul));
        assert_eq!(tokens[7], TokenKind::Operator(BinaryOp::Div));
        assert_eq!(tokens[9], TokenKind::Operator(BinaryOp::Add));
        assert_eq!(tokens[11], TokenKind::Operator(BinaryOp::Sub));
        assert_eq!(tokens.len(), 13);
    }

    #[test]
    fn test_token_classes() {
        let classes: Vec<TokenClass> = tokenize("max(I0, 2^3*4+1)")
            .iter()
            .map(TokenKind::class)
            .collect();
        assert_eq!(
            classes,
            vec![
                TokenClass::FunctionStart,
                TokenClass::Value,
                TokenClass::Separator,
                TokenClass::Value,
                TokenClass::Op1,
                TokenClass::Value,
                TokenClass::Op2,
                TokenClass::Value,
                TokenClass::Op3,
                TokenClass::Value,
                TokenClass::BracketClose,
            ]
        );
    }

    #[test]
    fn test_function_start() {
        let tokens = tokenize("sqrt(I1)");
        assert_eq!(tokens[0], TokenKind::FunctionStart("sqrt".into()));
        assert_eq!(tokens[1], TokenKind::Value(Expr::Image(1)));
        assert_eq!(tokens[2], TokenKind::BracketClose);
    }

    #[test]
    fn test_whitespace_insensitive() {
        assert_eq!(tokenize("I0 + I1"), tokenize("I0+I1"));
        assert_eq!(tokenize(" \tI0\n"), tokenize("I0"));
    }

    #[test]
    fn test_number_literals() {
        let tokens = tokenize("3.5 .25 1e-3 2E+2");
        assert_eq!(tokens[0], TokenKind::Value(Expr::Number(3.5)));
        assert_eq!(tokens[1], TokenKind::Value(Expr::Number(0.25)));
        assert_eq!(tokens[2], TokenKind::Value(Expr::Number(0.001)));
        assert_eq!(tokens[3], TokenKind::Value(Expr::Number(200.0)));
    }

    #[test]
    fn test_exponent_sign_stays_in_literal() {
        let tokens = tokenize("2.5e-1-1");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], TokenKind::Value(Expr::Number(0.25)));
        assert_eq!(tokens[1], TokenKind::Operator(BinaryOp::Sub));

        // a lone `e` or a trailing `e` after a non-digit is not an exponent
        assert_eq!(tokenize("e-1").len(), 3);
        assert_eq!(tokenize("2-1").len(), 3);
        assert_eq!(tokenize_err(".e-1"), ErrorKind::BadNumber);
    }

    #[test]
    fn test_value_tokens_start_at_depth_one() {
        let mut scope = ImageScope::new(4);
        let tokens = Tokenizer::new("sqrt(I1)+2").tokenize(&mut scope).unwrap();
        let depths: Vec<usize> = tokens.iter().map(|t| t.depth).collect();
        assert_eq!(depths, vec![0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_minus_after_identifier_is_operator() {
        let tokens = tokenize("pi-1");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], TokenKind::Operator(BinaryOp::Sub));
    }

    #[test]
    fn test_spans() {
        let mut scope = ImageScope::new(4);
        let tokens = Tokenizer::new("  I2 + abs(3)").tokenize(&mut scope).unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 4));
        assert_eq!(tokens[1].span, Span::new(5, 6));
        assert_eq!(tokens[2].span, Span::new(7, 11));
        assert_eq!(tokens[3].span, Span::new(11, 12));
    }

    #[test]
    fn test_errors() {
        assert_eq!(tokenize_err(""), ErrorKind::EmptyFormula);
        assert_eq!(tokenize_err("   "), ErrorKind::EmptyFormula);
        assert_eq!(tokenize_err("I-1"), ErrorKind::BadImageIndex);
        assert_eq!(tokenize_err("I4"), ErrorKind::BadImageIndex);
        assert_eq!(tokenize_err("1.2.3"), ErrorKind::BadNumber);
        assert_eq!(tokenize_err("3x"), ErrorKind::BadNumber);
    }

    #[test]
    fn test_error_position() {
        let mut scope = ImageScope::new(4);
        let err = Tokenizer::new("I0 + I9").tokenize(&mut scope).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(5, 7)));
    }

    #[test]
    fn test_display() {
        let rendered: Vec<String> = tokenize("min(I0,2)")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["min(", "I0", ",", "2", ")"]);
    }
}
