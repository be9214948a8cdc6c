//! Priority term rewriting: tokens to expression tree.
//!
//! Instead of a grammar, an ordered list of [`Rule`]s is applied until no
//! rule matches. After every rewrite scanning restarts at the first rule, so
//! rules listed earlier (tighter-binding operators) are always exhausted
//! before later ones get a chance. Bracket groups are resolved innermost
//! first, each on its own, so a parenthesised expression is complete before
//! any operator outside it is considered.

use crate::ast::{BinaryOp, Expr};
use crate::lexer::{Token, TokenClass, TokenKind};
use pixeq_core::{FormulaError, FormulaResult, Span, DEFAULT_MAX_DEPTH};

/// Replaces a matched token run with a shorter one.
pub type Reducer = fn(Vec<Token>) -> FormulaResult<Vec<Token>>;

/// Constraint on the token directly left of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftContext {
    Any,
    /// Start of sequence or a non-value token; a value there would make the
    /// matched operator binary.
    NoOperand,
}

/// A fixed token-class pattern plus its reducer.
pub struct Rule {
    pub name: &'static str,
    pub pattern: &'static [TokenClass],
    pub left: LeftContext,
    pub reduce: Reducer,
}

impl Rule {
    /// Leftmost position where the pattern matches.
    pub fn find(&self, tokens: &[Token]) -> Option<usize> {
        if self.pattern.len() > tokens.len() {
            return None;
        }
        tokens
            .windows(self.pattern.len())
            .enumerate()
            .position(|(pos, window)| {
                self.left_allows(tokens, pos)
                    && window
                        .iter()
                        .zip(self.pattern)
                        .all(|(token, class)| token.class() == *class)
            })
    }

    fn left_allows(&self, tokens: &[Token], pos: usize) -> bool {
        match self.left {
            LeftContext::Any => true,
            LeftContext::NoOperand => pos == 0 || tokens[pos - 1].class() != TokenClass::Value,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("left", &self.left)
            .finish()
    }
}

use TokenClass::*;

/// The standard rule set, highest priority first.
///
/// The sign rule sits directly below `^` but only fires where no operand
/// precedes the operator, so it never takes a binary `+`/`-`: `-2^2` is
/// `-(2^2)`, `1+0.4*-2` is `1+(0.4*(-2))`.
pub static STANDARD_RULES: &[Rule] = &[
    Rule {
        name: "power",
        pattern: &[Value, Op1, Value],
        left: LeftContext::Any,
        reduce: reduce_binary_op,
    },
    Rule {
        name: "sign",
        pattern: &[Op3, Value],
        left: LeftContext::NoOperand,
        reduce: reduce_sign,
    },
    Rule {
        name: "product",
        pattern: &[Value, Op2, Value],
        left: LeftContext::Any,
        reduce: reduce_binary_op,
    },
    Rule {
        name: "sum",
        pattern: &[Value, Op3, Value],
        left: LeftContext::Any,
        reduce: reduce_binary_op,
    },
    Rule {
        name: "brackets",
        pattern: &[BracketOpen, Value, BracketClose],
        left: LeftContext::Any,
        reduce: reduce_brackets,
    },
    Rule {
        name: "intrinsic",
        pattern: &[FunctionStart, BracketClose],
        left: LeftContext::Any,
        reduce: reduce_call,
    },
    Rule {
        name: "unary-call",
        pattern: &[FunctionStart, Value, BracketClose],
        left: LeftContext::Any,
        reduce: reduce_call,
    },
    Rule {
        name: "binary-call",
        pattern: &[FunctionStart, Value, Separator, Value, BracketClose],
        left: LeftContext::Any,
        reduce: reduce_call,
    },
    Rule {
        name: "tertiary-call",
        pattern: &[
            FunctionStart,
            Value,
            Separator,
            Value,
            Separator,
            Value,
            BracketClose,
        ],
        left: LeftContext::Any,
        reduce: reduce_call,
    },
];

fn span_of(tokens: &[Token]) -> Option<Span> {
    let first = tokens.first()?.span;
    Some(tokens.iter().fold(first, |acc, t| acc.merge(t.span)))
}

fn mismatch(rule: &str, span: Option<Span>) -> FormulaError {
    FormulaError::unresolvable(
        format!("rule '{rule}' applied to a non-matching token sequence"),
        span,
    )
}

fn value_token(expr: Expr, span: Option<Span>, depth: usize) -> Vec<Token> {
    vec![Token::value(expr, span.unwrap_or(Span::new(0, 0)), depth)]
}

/// Depth of the deepest value among `tokens`.
fn operand_depth(tokens: &[Token]) -> usize {
    tokens.iter().map(|t| t.depth).max().unwrap_or(0)
}

fn into_kinds(tokens: Vec<Token>) -> Vec<TokenKind> {
    tokens.into_iter().map(|t| t.kind).collect()
}

/// `Value Op Value → Value(lhs op rhs)`
fn reduce_binary_op(tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
    let span = span_of(&tokens);
    let depth = operand_depth(&tokens) + 1;
    match <[TokenKind; 3]>::try_from(into_kinds(tokens)) {
        Ok([TokenKind::Value(lhs), TokenKind::Operator(op), TokenKind::Value(rhs)]) => {
            Ok(value_token(Expr::binary(lhs, op, rhs), span, depth))
        }
        _ => Err(mismatch("binary operator", span)),
    }
}

/// `( Value ) → Value`
fn reduce_brackets(tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
    let span = span_of(&tokens);
    let depth = operand_depth(&tokens);
    match <[TokenKind; 3]>::try_from(into_kinds(tokens)) {
        Ok([TokenKind::BracketOpen, TokenKind::Value(expr), TokenKind::BracketClose]) => {
            Ok(value_token(expr, span, depth))
        }
        _ => Err(mismatch("brackets", span)),
    }
}

/// `name( [Value (, Value)*] ) → Value(call)`
fn reduce_call(tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
    let span = span_of(&tokens);
    let depth = operand_depth(&tokens) + 1;
    let mut iter = tokens.into_iter();
    let (name, name_span) = match iter.next() {
        Some(Token {
            kind: TokenKind::FunctionStart(name),
            span,
            ..
        }) => (name.to_ascii_lowercase(), span),
        _ => return Err(mismatch("call", span)),
    };

    let mut args = Vec::new();
    for token in iter {
        match token.kind {
            TokenKind::Value(expr) => args.push(expr),
            TokenKind::Separator | TokenKind::BracketClose => {}
            _ => return Err(mismatch("call", span)),
        }
    }

    let expr = match args.len() {
        0 => Expr::Intrinsic {
            name,
            span: name_span,
        },
        1 => Expr::Unary {
            name,
            arg: Box::new(args.remove(0)),
            span: name_span,
        },
        2 => match <[Expr; 2]>::try_from(args) {
            Ok(args) => Expr::BinaryCall {
                name,
                args: Box::new(args),
                span: name_span,
            },
            Err(_) => return Err(mismatch("call", span)),
        },
        3 => match <[Expr; 3]>::try_from(args) {
            Ok(args) => Expr::Tertiary {
                name,
                args: Box::new(args),
                span: name_span,
            },
            Err(_) => return Err(mismatch("call", span)),
        },
        _ => return Err(mismatch("call", span)),
    };
    Ok(value_token(expr, span, depth))
}

/// `+x → x`, `-x → -1 * x`
fn reduce_sign(tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
    let span = span_of(&tokens);
    let depth = operand_depth(&tokens);
    match <[TokenKind; 2]>::try_from(into_kinds(tokens)) {
        Ok([TokenKind::Operator(BinaryOp::Sub), TokenKind::Value(expr)]) => {
            Ok(value_token(Expr::negate(expr), span, depth + 1))
        }
        Ok([TokenKind::Operator(BinaryOp::Add), TokenKind::Value(expr)]) => {
            Ok(value_token(expr, span, depth))
        }
        _ => Err(mismatch("sign", span)),
    }
}

/// Applies a rule set to a token sequence until a single value remains.
///
/// Trees deeper than `max_depth` are rejected as they are built, since
/// emission, evaluation and dropping all recurse over the tree.
#[derive(Debug, Clone, Copy)]
pub struct RewriteEngine {
    rules: &'static [Rule],
    max_depth: usize,
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl RewriteEngine {
    pub fn new(rules: &'static [Rule]) -> Self {
        Self {
            rules,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_RULES)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Reduce a full token sequence to its root expression.
    pub fn run(&self, mut tokens: Vec<Token>) -> FormulaResult<Expr> {
        verify_brackets(&tokens)?;

        while tokens.len() > 1 {
            let (start, end) = innermost_group(&tokens);
            let group: Vec<Token> = tokens.drain(start..end).collect();
            let group_span = span_of(&group);
            let resolved = self.resolve(group)?;
            if resolved.len() != 1 {
                return Err(FormulaError::unresolvable(
                    "could not resolve all tokens to an expression",
                    span_of(&resolved).or(group_span),
                ));
            }
            tokens.splice(start..start, resolved);
        }

        match tokens.pop() {
            Some(Token {
                kind: TokenKind::Value(expr),
                ..
            }) => Ok(expr),
            Some(token) => Err(FormulaError::unresolvable(
                "please enter a valid formula",
                Some(token.span),
            )),
            None => Err(FormulaError::EmptyFormula),
        }
    }

    /// Priority rewriting to a fixpoint over `tokens`, without bracket scoping.
    ///
    /// Every rewrite rescans from the first rule, so the cost grows with the
    /// square of the token count. Sign chains and operator chains both deepen
    /// the tree, so the depth limit also bounds how long they can get.
    pub fn resolve(&self, mut tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
        'rewrite: loop {
            for rule in self.rules {
                let Some(pos) = rule.find(&tokens) else {
                    continue;
                };
                let len = rule.pattern.len();
                let matched: Vec<Token> = tokens.drain(pos..pos + len).collect();
                let replacement = (rule.reduce)(matched)?;
                if replacement.len() >= len {
                    return Err(FormulaError::unresolvable(
                        format!("rule '{}' did not shrink the formula", rule.name),
                        span_of(&replacement),
                    ));
                }
                if let Some(deep) = replacement.iter().find(|t| t.depth > self.max_depth) {
                    return Err(FormulaError::unresolvable(
                        format!("formula is nested more than {} levels deep", self.max_depth),
                        Some(deep.span),
                    ));
                }
                tracing::trace!(rule = rule.name, pos, remaining = tokens.len() + replacement.len(), "rewrite");
                tokens.splice(pos..pos, replacement);
                continue 'rewrite;
            }
            return Ok(tokens);
        }
    }
}

fn is_opener(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::BracketOpen | TokenKind::FunctionStart(_)
    )
}

/// Rejects unbalanced brackets; function starts count as openers.
fn verify_brackets(tokens: &[Token]) -> FormulaResult<()> {
    let mut open: Vec<Span> = Vec::new();
    for token in tokens {
        if is_opener(token) {
            open.push(token.span);
        } else if token.kind == TokenKind::BracketClose && open.pop().is_none() {
            return Err(FormulaError::unresolvable(
                "too many closing brackets",
                Some(token.span),
            ));
        }
    }
    match open.last() {
        Some(span) => Err(FormulaError::unresolvable(
            "not all brackets were closed",
            Some(*span),
        )),
        None => Ok(()),
    }
}

/// `start..end` of the innermost bracket group (last opener up to its closer),
/// or the whole sequence if there are no brackets.
fn innermost_group(tokens: &[Token]) -> (usize, usize) {
    let mut start = 0;
    let mut end = tokens.len();
    for (i, token) in tokens.iter().enumerate() {
        if is_opener(token) {
            start = i;
            end = i;
        }
        if token.kind == TokenKind::BracketClose && start == end {
            end = i + 1;
        }
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Tokenizer;
    use crate::scope::ImageScope;
    use pixeq_core::ErrorKind;

    fn tokens(src: &str) -> Vec<Token> {
        Tokenizer::new(src).tokenize(&mut ImageScope::new(8)).unwrap()
    }

    fn parse(src: &str) -> FormulaResult<Expr> {
        RewriteEngine::standard().run(tokens(src))
    }

    fn num(v: f32) -> Expr {
        Expr::Number(v)
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = STANDARD_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "power",
                "sign",
                "product",
                "sum",
                "brackets",
                "intrinsic",
                "unary-call",
                "binary-call",
                "tertiary-call",
            ]
        );
    }

    fn rule(name: &str) -> &'static Rule {
        STANDARD_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_rule_find_leftmost() {
        let toks = tokens("1+2+3");
        assert_eq!(rule("sum").find(&toks), Some(0));
        assert_eq!(rule("power").find(&toks), None);
    }

    #[test]
    fn test_sign_rule_needs_free_left_side() {
        assert_eq!(rule("sign").find(&tokens("2-3")), None);
        assert_eq!(rule("sign").find(&tokens("-3")), Some(0));
        assert_eq!(rule("sign").find(&tokens("2--3")), Some(2));
        assert_eq!(rule("sign").find(&tokens("(+3)")), Some(1));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1+2*3").unwrap(),
            Expr::binary(num(1.0), BinaryOp::Add, Expr::binary(num(2.0), BinaryOp::Mul, num(3.0)))
        );
        assert_eq!(
            parse("2*3^2").unwrap(),
            Expr::binary(num(2.0), BinaryOp::Mul, Expr::binary(num(3.0), BinaryOp::Pow, num(2.0)))
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse("8-4-2").unwrap(),
            Expr::binary(Expr::binary(num(8.0), BinaryOp::Sub, num(4.0)), BinaryOp::Sub, num(2.0))
        );
        assert_eq!(
            parse("2^3^2").unwrap(),
            Expr::binary(Expr::binary(num(2.0), BinaryOp::Pow, num(3.0)), BinaryOp::Pow, num(2.0))
        );
    }

    #[test]
    fn test_bracket_group_binds_tighter() {
        assert_eq!(
            parse("1+2*(3)").unwrap(),
            Expr::binary(num(1.0), BinaryOp::Add, Expr::binary(num(2.0), BinaryOp::Mul, num(3.0)))
        );
        assert_eq!(
            parse("(1+2)*3").unwrap(),
            Expr::binary(Expr::binary(num(1.0), BinaryOp::Add, num(2.0)), BinaryOp::Mul, num(3.0))
        );
    }

    #[test]
    fn test_sign_rules() {
        assert_eq!(parse("+I1").unwrap(), Expr::Image(1));
        assert_eq!(parse("-I1").unwrap(), Expr::negate(Expr::Image(1)));
        assert_eq!(
            parse("- - - -I1").unwrap(),
            Expr::negate(Expr::negate(Expr::negate(Expr::negate(Expr::Image(1)))))
        );
        assert_eq!(
            parse("2 - -3").unwrap(),
            Expr::binary(num(2.0), BinaryOp::Sub, Expr::negate(num(3.0)))
        );
        assert_eq!(
            parse("0.4*-2").unwrap(),
            Expr::binary(num(0.4), BinaryOp::Mul, Expr::negate(num(2.0)))
        );
    }

    #[test]
    fn test_sign_binds_to_following_operand() {
        assert_eq!(
            parse("-1+2").unwrap(),
            Expr::binary(Expr::negate(num(1.0)), BinaryOp::Add, num(2.0))
        );
        assert_eq!(
            parse("2^-3").unwrap(),
            Expr::binary(num(2.0), BinaryOp::Pow, Expr::negate(num(3.0)))
        );
        assert_eq!(
            parse("2++3").unwrap(),
            Expr::binary(num(2.0), BinaryOp::Add, num(3.0))
        );
        assert_eq!(
            parse("-2^2").unwrap(),
            Expr::negate(Expr::binary(num(2.0), BinaryOp::Pow, num(2.0)))
        );
    }

    #[test]
    fn test_calls() {
        let expr = parse("clamp(I0, 0, max(1, I2))").unwrap();
        let Expr::Tertiary { name, args, .. } = expr else {
            panic!("expected tertiary call");
        };
        assert_eq!(name, "clamp");
        assert!(matches!(&args[2], Expr::BinaryCall { name, .. } if name == "max"));

        assert!(matches!(parse("POS()").unwrap(), Expr::Intrinsic { name, .. } if name == "pos"));
        assert!(matches!(parse("abs(-1)").unwrap(), Expr::Unary { name, .. } if name == "abs"));
    }

    #[test]
    fn test_call_span_points_at_name() {
        let Expr::Binary { rhs, .. } = parse("1 + sqrt(I1)").unwrap() else {
            panic!("expected binary root");
        };
        assert!(matches!(*rhs, Expr::Unary { span, .. } if span == Span::new(4, 9)));
    }

    #[test]
    fn test_unresolvable() {
        for src in ["1 2", "(1,2)", "f(1,2,3,4)", "()", "*", "1+", "(1))", "((1)", "f(1"] {
            let err = parse(src).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unresolvable, "{src}");
        }
    }

    #[test]
    fn test_bracket_errors_carry_position() {
        let err = parse("(1))").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(3, 4)));
        let err = parse("2*(1").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(2, 3)));
    }

    #[test]
    fn test_reductions_track_depth() {
        let engine = RewriteEngine::standard();
        let depth = |src: &str| engine.resolve(tokens(src)).unwrap()[0].depth;
        assert_eq!(depth("1"), 1);
        assert_eq!(depth("1+2"), 2);
        assert_eq!(depth("-1"), 2);
        assert_eq!(depth("+1"), 1);
        assert_eq!(depth("((1))"), 1);
        assert_eq!(depth("pos()"), 1);
        assert_eq!(depth("max(1, sqrt(2))"), 3);
    }

    #[test]
    fn test_depth_limit() {
        let engine = RewriteEngine::standard().with_max_depth(4);
        assert!(engine.run(tokens("sqrt(sqrt(sqrt(I0)))")).is_ok());

        let err = engine.run(tokens("sqrt(sqrt(sqrt(sqrt(I0))))")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unresolvable);
        assert_eq!(err.span(), Some(Span::new(0, 26)));

        assert!(engine.run(tokens("--1")).is_ok());
        assert_eq!(engine.run(tokens("----1")).unwrap_err().kind(), ErrorKind::Unresolvable);
        // brackets add no depth
        assert!(engine.run(tokens("((((((((1+1))))))))")).is_ok());
    }

    #[test]
    fn test_resolve_without_scoping() {
        // flat rewriting lets the sum rule reach across the bracket
        let flat = RewriteEngine::standard().resolve(tokens("1+2*(3)")).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(
            flat[0].kind,
            TokenKind::Value(Expr::binary(
                Expr::binary(num(1.0), BinaryOp::Add, num(2.0)),
                BinaryOp::Mul,
                num(3.0)
            ))
        );
    }
}
