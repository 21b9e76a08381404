//! Restricted formula language for component rules
//!
//! Rule formulas are user-editable configuration, so they are never handed to
//! a general-purpose evaluator. Instead they are tokenized and parsed into a
//! small AST covering exactly:
//!
//! - numeric literals (`12`, `0.5`, `1e3`) and `true` / `false`
//! - variable references resolved from the caller's namespace
//! - `+ - * /`, unary minus, parentheses
//! - comparisons `== != < <= > >=` (non-chaining)
//! - boolean `and` / `or` / `not` (also `&&`, `||`, `!`)
//!
//! Anything else (attribute access, calls, indexing, strings) is a syntax
//! error. Booleans behave as `1` / `0` in arithmetic and any non-zero number
//! is truthy in a condition.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Variable namespace a formula is evaluated against
pub type Namespace = BTreeMap<String, Value>;

/// Result of evaluating a formula, also the type of namespace entries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    /// Numeric view (`true` is 1, `false` is 0)
    pub fn as_number(&self) -> f64 {
        match *self {
            Value::Number(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            Value::Number(n) => n != 0.0,
            Value::Bool(b) => b,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl std::str::FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        s.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| format!("Invalid value '{}'. Use a number, true or false", s))
    }
}

/// What went wrong while parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaErrorKind {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("{0}")]
    Syntax(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

/// A formula that failed to parse or evaluate
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("Error evaluating formula '{expression}': {kind}")]
#[diagnostic(
    code(fabest::formula),
    help("Formulas may only use numbers, input names, + - * /, comparisons, and/or/not and parentheses")
)]
pub struct FormulaError {
    #[source_code]
    expression: String,

    #[label("{kind}")]
    span: SourceSpan,

    kind: FormulaErrorKind,
}

impl FormulaError {
    fn new(expression: &str, kind: FormulaErrorKind, span: SourceSpan) -> Self {
        Self {
            expression: expression.to_string(),
            span,
            kind,
        }
    }

    /// The formula text that failed
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn kind(&self) -> &FormulaErrorKind {
        &self.kind
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    True,
    False,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(n) => write!(f, "{}", n),
            Tok::Ident(name) => write!(f, "{}", name),
            Tok::Plus => write!(f, "+"),
            Tok::Minus => write!(f, "-"),
            Tok::Star => write!(f, "*"),
            Tok::Slash => write!(f, "/"),
            Tok::LParen => write!(f, "("),
            Tok::RParen => write!(f, ")"),
            Tok::EqEq => write!(f, "=="),
            Tok::NotEq => write!(f, "!="),
            Tok::Lt => write!(f, "<"),
            Tok::Le => write!(f, "<="),
            Tok::Gt => write!(f, ">"),
            Tok::Ge => write!(f, ">="),
            Tok::And => write!(f, "and"),
            Tok::Or => write!(f, "or"),
            Tok::Not => write!(f, "not"),
            Tok::True => write!(f, "true"),
            Tok::False => write!(f, "false"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    span: SourceSpan,
}

fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    let syntax = |msg: String, start: usize, len: usize| {
        FormulaError::new(src, FormulaErrorKind::Syntax(msg), (start, len).into())
    };

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).map_or(false, u8::is_ascii_digit))
        {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'.' {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            // A number running straight into a name ("2L") is not implicit multiplication
            if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
                return Err(syntax(
                    "missing operator between number and name".to_string(),
                    start,
                    i + 1 - start,
                ));
            }
            let text = &src[start..i];
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| syntax(format!("invalid number '{}'", text), start, i - start))?;
            tokens.push(Token {
                tok: Tok::Num(value),
                span: (start, i - start).into(),
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &src[start..i];
            let tok = match word {
                "and" => Tok::And,
                "or" => Tok::Or,
                "not" => Tok::Not,
                "true" | "True" => Tok::True,
                "false" | "False" => Tok::False,
                _ => Tok::Ident(word.to_string()),
            };
            tokens.push(Token {
                tok,
                span: (start, i - start).into(),
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (tok, len) = match (c, next) {
            (b'=', Some(b'=')) => (Tok::EqEq, 2),
            (b'!', Some(b'=')) => (Tok::NotEq, 2),
            (b'<', Some(b'=')) => (Tok::Le, 2),
            (b'>', Some(b'=')) => (Tok::Ge, 2),
            (b'&', Some(b'&')) => (Tok::And, 2),
            (b'|', Some(b'|')) => (Tok::Or, 2),
            (b'<', _) => (Tok::Lt, 1),
            (b'>', _) => (Tok::Gt, 1),
            (b'!', _) => (Tok::Not, 1),
            (b'+', _) => (Tok::Plus, 1),
            (b'-', _) => (Tok::Minus, 1),
            (b'*', _) => (Tok::Star, 1),
            (b'/', _) => (Tok::Slash, 1),
            (b'(', _) => (Tok::LParen, 1),
            (b')', _) => (Tok::RParen, 1),
            (b'=', _) => {
                return Err(syntax(
                    "assignment is not allowed, use '==' to compare".to_string(),
                    start,
                    1,
                ))
            }
            _ => {
                let ch = src[start..].chars().next().unwrap_or('?');
                return Err(syntax(
                    format!("unexpected character '{}'", ch),
                    start,
                    ch.len_utf8(),
                ));
            }
        };
        tokens.push(Token {
            tok,
            span: (start, len).into(),
        });
        i += len;
    }

    Ok(tokens)
}

// ============================================================================
// AST and parser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Var {
        name: String,
        span: SourceSpan,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: SourceSpan,
    },
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, msg: impl Into<String>) -> FormulaError {
        let span = self
            .tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| (self.src.len(), 0).into());
        FormulaError::new(self.src, FormulaErrorKind::Syntax(msg.into()), span)
    }

    fn parse(mut self) -> Result<Expr, FormulaError> {
        let expr = self.parse_or()?;
        if let Some(tok) = self.peek() {
            let msg = format!("unexpected '{}'", tok);
            return Err(self.error_here(msg));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Tok::Or) {
            let span = self.advance().map(|t| t.span).unwrap_or_else(|| (0, 0).into());
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Tok::And) {
            let span = self.advance().map(|t| t.span).unwrap_or_else(|| (0, 0).into());
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, FormulaError> {
        if self.peek() == Some(&Tok::Not) {
            self.advance();
            let expr = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, FormulaError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Tok::EqEq) => BinaryOp::Eq,
            Some(Tok::NotEq) => BinaryOp::Ne,
            Some(Tok::Lt) => BinaryOp::Lt,
            Some(Tok::Le) => BinaryOp::Le,
            Some(Tok::Gt) => BinaryOp::Gt,
            Some(Tok::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        let span = self.advance().map(|t| t.span).unwrap_or_else(|| (0, 0).into());
        let rhs = self.parse_additive()?;
        if matches!(
            self.peek(),
            Some(Tok::EqEq | Tok::NotEq | Tok::Lt | Tok::Le | Tok::Gt | Tok::Ge)
        ) {
            return Err(self.error_here("comparisons cannot be chained, combine them with 'and'"));
        }
        Ok(binary(op, lhs, rhs, span))
    }

    fn parse_additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let span = self.advance().map(|t| t.span).unwrap_or_else(|| (0, 0).into());
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            let span = self.advance().map(|t| t.span).unwrap_or_else(|| (0, 0).into());
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Tok::Minus) => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(expr),
                })
            }
            Some(Tok::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let Some(token) = self.advance() else {
            return Err(self.error_here("unexpected end of formula"));
        };
        match token.tok {
            Tok::Num(n) => Ok(Expr::Number(n)),
            Tok::True => Ok(Expr::Bool(true)),
            Tok::False => Ok(Expr::Bool(false)),
            Tok::Ident(name) => {
                if self.peek() == Some(&Tok::LParen) {
                    return Err(self.error_here(format!("function calls are not allowed ('{}')", name)));
                }
                Ok(Expr::Var {
                    name,
                    span: token.span,
                })
            }
            Tok::LParen => {
                let expr = self.parse_or()?;
                if self.peek() != Some(&Tok::RParen) {
                    return Err(self.error_here("expected ')'"));
                }
                self.advance();
                Ok(expr)
            }
            other => {
                self.pos -= 1;
                Err(self.error_here(format!("expected a value, found '{}'", other)))
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, span: SourceSpan) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}

// ============================================================================
// Formula
// ============================================================================

/// A parsed formula, ready to evaluate against any namespace
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse formula text into an expression tree
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::new(
                source,
                FormulaErrorKind::Syntax("empty formula".to_string()),
                (0, source.len()).into(),
            ));
        }
        let parser = Parser {
            src: source,
            tokens,
            pos: 0,
        };
        let expr = parser.parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The parsed syntax tree
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of all variables the formula references, sorted and deduplicated
    pub fn variables(&self) -> Vec<String> {
        fn walk(expr: &Expr, out: &mut Vec<String>) {
            match expr {
                Expr::Var { name, .. } => out.push(name.clone()),
                Expr::Unary { expr, .. } => walk(expr, out),
                Expr::Binary { lhs, rhs, .. } => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
                Expr::Number(_) | Expr::Bool(_) => {}
            }
        }
        let mut names = Vec::new();
        walk(&self.expr, &mut names);
        names.sort();
        names.dedup();
        names
    }

    pub fn evaluate(&self, namespace: &Namespace) -> Result<Value, FormulaError> {
        self.eval(&self.expr, namespace)
    }

    fn eval(&self, expr: &Expr, ns: &Namespace) -> Result<Value, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var { name, span } => match ns.get(name) {
                Some(Value::Number(n)) if !n.is_finite() => Err(FormulaError::new(
                    &self.source,
                    FormulaErrorKind::NonFinite,
                    *span,
                )),
                Some(value) => Ok(*value),
                None => Err(FormulaError::new(
                    &self.source,
                    FormulaErrorKind::UnknownVariable(name.clone()),
                    *span,
                )),
            },
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, ns)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-v.as_number()),
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                })
            }
            Expr::Binary { op, lhs, rhs, span } => {
                let l = self.eval(lhs, ns)?;
                // `and` / `or` never evaluate the right side when the left decides
                match op {
                    BinaryOp::And => Ok(Value::Bool(l.is_truthy() && self.eval(rhs, ns)?.is_truthy())),
                    BinaryOp::Or => Ok(Value::Bool(l.is_truthy() || self.eval(rhs, ns)?.is_truthy())),
                    _ => {
                        let r = self.eval(rhs, ns)?;
                        apply(*op, l.as_number(), r.as_number())
                            .map_err(|kind| FormulaError::new(&self.source, kind, *span))
                    }
                }
            }
        }
    }
}

fn apply(op: BinaryOp, l: f64, r: f64) -> Result<Value, FormulaErrorKind> {
    let number = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div if r == 0.0 => return Err(FormulaErrorKind::DivisionByZero),
        BinaryOp::Div => l / r,
        BinaryOp::Eq => return Ok(Value::Bool(l == r)),
        BinaryOp::Ne => return Ok(Value::Bool(l != r)),
        BinaryOp::Lt => return Ok(Value::Bool(l < r)),
        BinaryOp::Le => return Ok(Value::Bool(l <= r)),
        BinaryOp::Gt => return Ok(Value::Bool(l > r)),
        BinaryOp::Ge => return Ok(Value::Bool(l >= r)),
        BinaryOp::And => return Ok(Value::Bool(l != 0.0 && r != 0.0)),
        BinaryOp::Or => return Ok(Value::Bool(l != 0.0 || r != 0.0)),
    };
    if number.is_finite() {
        Ok(Value::Number(number))
    } else {
        Err(FormulaErrorKind::NonFinite)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate `expression` in one step
pub fn evaluate(expression: &str, namespace: &Namespace) -> Result<Value, FormulaError> {
    Formula::parse(expression)?.evaluate(namespace)
}

/// Evaluate a quantity or dimension formula; absent or blank formulas are `0`
pub fn evaluate_number(expression: Option<&str>, namespace: &Namespace) -> Result<f64, FormulaError> {
    match expression.map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(expr) => Ok(evaluate(expr, namespace)?.as_number()),
    }
}

/// Evaluate a rule condition; absent or blank conditions always hold
pub fn evaluate_condition(expression: Option<&str>, namespace: &Namespace) -> Result<bool, FormulaError> {
    match expression.map(str::trim) {
        None | Some("") => Ok(true),
        Some(expr) => Ok(evaluate(expr, namespace)?.is_truthy()),
    }
}
