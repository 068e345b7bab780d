//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Operator precedence (lowest → highest):
//!   ternary  →  equality  →  relational  →  additive  →  multiplicative  →
//!   unary  →  postfix (member, index, call)  →  primary

use crate::ast::{BinOp, Expr, ExprKind, Property, UnaryOp};
use crate::error::EvalError;
use crate::lexer::{tokenize, Spanned, Token};
use sandbox_template_util::JsValue;
use serde_json::Value;

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>, max_depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(t) => t.offset,
            None => self.tokens.last().map(|t| t.offset).unwrap_or(0),
        }
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == tok {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token, context: &str) -> Result<(), EvalError> {
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {} {context}", tok.describe())))
        }
    }

    fn unexpected(&self, what: &str) -> EvalError {
        EvalError::syntax(
            format!("{what}, found {}", self.peek().describe()),
            self.offset(),
        )
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::syntax(
                format!("expression nested deeper than {} levels", self.max_depth),
                self.offset(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parses the whole token stream as one expression.
    pub fn parse(&mut self) -> Result<Expr, EvalError> {
        if *self.peek() == Token::Eof {
            return Err(EvalError::syntax("empty expression", self.offset()));
        }
        let expr = self.parse_expr()?;
        if *self.peek() != Token::Eof {
            return Err(self.unexpected("unexpected trailing input"));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let expr = self.parse_ternary();
        self.leave();
        expr
    }

    // cond ? then : else  (right-associative)
    fn parse_ternary(&mut self) -> Result<Expr, EvalError> {
        let cond = self.parse_equality()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.parse_expr()?;
        self.expect(Token::Colon, "in conditional expression")?;
        let els = self.parse_expr()?;
        let offset = cond.offset;
        Ok(Expr::new(
            ExprKind::Ternary(Box::new(cond), Box::new(then), Box::new(els)),
            offset,
        ))
    }

    // Every folded operator counts as one level of nesting, so a long
    // left-deep chain hits `max_depth` like explicit parentheses do.
    fn parse_binary_level(
        &mut self,
        ops: &[(Token, BinOp)],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let base = self.depth;
        let expr = self.fold_binary(ops, next);
        self.depth = base;
        expr
    }

    fn fold_binary(
        &mut self,
        ops: &[(Token, BinOp)],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (tok, op) in ops {
                if self.eat(tok) {
                    self.enter()?;
                    let rhs = next(self)?;
                    let offset = lhs.offset;
                    lhs = Expr::new(ExprKind::Binary(*op, Box::new(lhs), Box::new(rhs)), offset);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_equality(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary_level(
            &[(Token::StrictEq, BinOp::StrictEq), (Token::StrictNe, BinOp::StrictNe)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary_level(
            &[
                (Token::Lt, BinOp::Lt),
                (Token::Le, BinOp::Le),
                (Token::Gt, BinOp::Gt),
                (Token::Ge, BinOp::Ge),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary_level(
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary_level(
            &[(Token::Star, BinOp::Mul), (Token::Slash, BinOp::Div)],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let offset = self.offset();
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::new(ExprKind::Unary(op, Box::new(operand?)), offset))
    }

    // Like operator chains, each member or call step is one level deeper.
    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let base = self.depth;
        let expr = self.fold_postfix();
        self.depth = base;
        expr
    }

    fn fold_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.enter()?;
                    self.advance();
                    let name = match self.advance() {
                        Token::Ident(name) => name,
                        // Keywords are valid property names: `a.null`, `a.true`.
                        Token::True => "true".to_string(),
                        Token::False => "false".to_string(),
                        Token::Null => "null".to_string(),
                        Token::Undefined => "undefined".to_string(),
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected("expected property name after `.`"));
                        }
                    };
                    let offset = expr.offset;
                    expr = Expr::new(ExprKind::Member(Box::new(expr), Property::Named(name)), offset);
                }
                Token::LBracket => {
                    self.enter()?;
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket, "to close computed member access")?;
                    let offset = expr.offset;
                    expr = Expr::new(
                        ExprKind::Member(Box::new(expr), Property::Computed(Box::new(index))),
                        offset,
                    );
                }
                Token::LParen => {
                    let name = match &expr.kind {
                        ExprKind::Ident(name) => name.clone(),
                        _ => return Err(self.unexpected("only named actions can be called")),
                    };
                    self.enter()?;
                    self.advance();
                    if *self.peek() != Token::RParen {
                        return Err(self.unexpected("actions take no arguments"));
                    }
                    self.advance();
                    expr = Expr::new(ExprKind::Call(name), expr.offset);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let offset = self.offset();
        let kind = match self.advance() {
            Token::Num(n) => ExprKind::Literal(JsValue::from_f64(n)),
            Token::Str(s) => ExprKind::Literal(JsValue::from(s)),
            Token::True => ExprKind::Literal(JsValue::from(true)),
            Token::False => ExprKind::Literal(JsValue::from(false)),
            Token::Null => ExprKind::Literal(JsValue::Json(Value::Null)),
            Token::Undefined => ExprKind::Literal(JsValue::Undefined),
            Token::Ident(name) => ExprKind::Ident(name),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "to close parenthesised expression")?;
                return Ok(inner);
            }
            Token::LBracket => self.parse_array_tail()?,
            _ => {
                // Put the token back so the diagnostic points at it.
                self.pos = self.pos.saturating_sub(1);
                return Err(self.unexpected("expected an expression"));
            }
        };
        Ok(Expr::new(kind, offset))
    }

    // Elements after the opening `[`; a single trailing comma is allowed.
    fn parse_array_tail(&mut self) -> Result<ExprKind, EvalError> {
        let mut elements = Vec::new();
        loop {
            if self.eat(&Token::RBracket) {
                return Ok(ExprKind::Array(elements));
            }
            elements.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(Token::RBracket, "to close array literal")?;
                return Ok(ExprKind::Array(elements));
            }
        }
    }
}

/// Tokenizes and parses `src` into an expression tree.
pub fn parse(src: &str, max_depth: usize) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    Parser::new(tokens, max_depth).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> ExprKind {
        parse(src, 64).unwrap().kind
    }

    fn num(n: i64) -> ExprKind {
        ExprKind::Literal(JsValue::from(n))
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match p("1 + 2 * 3") {
            ExprKind::Binary(BinOp::Add, lhs, rhs) => {
                assert_eq!(lhs.kind, num(1));
                assert!(matches!(rhs.kind, ExprKind::Binary(BinOp::Mul, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_left_associative() {
        // 8 - 4 - 2 parses as (8 - 4) - 2
        match p("8 - 4 - 2") {
            ExprKind::Binary(BinOp::Sub, lhs, rhs) => {
                assert!(matches!(lhs.kind, ExprKind::Binary(BinOp::Sub, _, _)));
                assert_eq!(rhs.kind, num(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ternary_is_lowest_and_right_associative() {
        match p("a > 1 ? b : c ? d : e") {
            ExprKind::Ternary(cond, _, els) => {
                assert!(matches!(cond.kind, ExprKind::Binary(BinOp::Gt, _, _)));
                assert!(matches!(els.kind, ExprKind::Ternary(_, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_member_chain() {
        match p("a.b[0].c") {
            ExprKind::Member(obj, Property::Named(name)) => {
                assert_eq!(name, "c");
                assert!(matches!(obj.kind, ExprKind::Member(_, Property::Computed(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(p("[]"), ExprKind::Array(vec![]));
        match p("[a, 1,]") {
            ExprKind::Array(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_call() {
        assert_eq!(p("d()"), ExprKind::Call("d".into()));
        assert!(matches!(p("d().x"), ExprKind::Member(_, _)));
    }

    #[test]
    fn test_syntax_errors() {
        for src in [
            "", "   ", "asd///", "1 +", "(1", "[1, 2", "a.", "a b", "1 ? 2", "a.b()",
            "d(1)", ")", "a]", "[,]",
        ] {
            let err = parse(src, 64).unwrap_err();
            assert!(matches!(err, EvalError::Syntax { .. }), "{src:?}: {err}");
        }
    }

    #[test]
    fn test_error_offset_points_at_token() {
        match parse("1 + )", 64).unwrap_err() {
            EvalError::Syntax { offset, .. } => assert_eq!(offset, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&deep, 64).is_ok());
        assert!(parse(&deep, 5).is_err());
        assert!(parse(&format!("{}1", "-".repeat(100)), 64).is_err());
    }

    fn assert_too_deep(src: &str) {
        match parse(src, 64) {
            Err(EvalError::Syntax { message, .. }) => {
                assert!(message.contains("nested deeper"), "{message}")
            }
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit_counts_chains() {
        assert_too_deep(&vec!["1"; 10_000].join("+"));
        assert_too_deep(&vec!["2"; 10_000].join(" * "));
        assert_too_deep(&format!("a{}", ".b".repeat(10_000)));
        assert_too_deep(&format!("a{}", "[0]".repeat(10_000)));

        assert!(parse(&vec!["1"; 32].join("+"), 64).is_ok());
        assert!(parse(&format!("a{}", ".b".repeat(32)), 64).is_ok());
    }

    #[test]
    fn test_depth_resets_between_chains() {
        // Siblings do not accumulate: each array element starts afresh.
        let element = vec!["1"; 40].join("+");
        let src = format!("[{}]", vec![element; 10].join(", "));
        assert!(parse(&src, 64).is_ok());
    }
}
