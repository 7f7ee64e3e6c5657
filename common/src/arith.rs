//! Arithmetic extraction and evaluation for automated replies.
//!
//! The evaluator is a closed recursive-descent grammar over numbers, the four
//! basic operators and parentheses. There are no identifiers, calls or
//! variables, so nothing outside pure arithmetic can be reached from message
//! text.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')'
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Reply content when an expression is found but cannot be evaluated.
pub const EVALUATION_ERROR_REPLY: &str =
    "Error: Unable to evaluate the expression. Please check your math syntax.";

/// Prefix of a successful reply.
pub const RESULT_PREFIX: &str = "Result: ";

/// Maximum nesting of parentheses and unary signs.
pub const MAX_DEPTH: usize = 64;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9.()]+(?:\s*[-+*/]\s*[0-9.()]+)+").expect("invalid expression regex")
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Outcome of looking for arithmetic in a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value { expression: String, value: f64 },
    Failed { expression: String, error: EvalError },
}

impl Evaluation {
    /// The substring that was extracted from the message.
    pub fn expression(&self) -> &str {
        match self {
            Evaluation::Value { expression, .. } | Evaluation::Failed { expression, .. } => {
                expression
            }
        }
    }

    /// Content of the automated reply.
    pub fn reply_text(&self) -> String {
        match self {
            Evaluation::Value { value, .. } => format!("{RESULT_PREFIX}{}", format_value(*value)),
            Evaluation::Failed { .. } => EVALUATION_ERROR_REPLY.to_string(),
        }
    }
}

/// Find and evaluate the first arithmetic expression in `text`.
///
/// `None` means there was nothing to evaluate; a failed evaluation still
/// yields `Some` so the caller can reply with the error text.
pub fn try_evaluate(text: &str) -> Option<Evaluation> {
    let expression = extract_expression(text)?.to_string();
    Some(match evaluate(&expression) {
        Ok(value) => Evaluation::Value { expression, value },
        Err(error) => Evaluation::Failed { expression, error },
    })
}

/// Leftmost run of operands joined by at least one operator.
pub fn extract_expression(text: &str) -> Option<&str> {
    EXPRESSION.find(text).map(|m| m.as_str())
}

/// Evaluate a standalone arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => {}
        Some(Token::RParen) => return Err(EvalError::Unbalanced),
        Some(tok) => return Err(EvalError::UnexpectedToken(tok.to_string())),
    }
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

/// Integral values print without a fractional part; everything else uses the
/// shortest round-trip representation.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{}", format_value(*v)),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_ascii_digit() || d == '.') {
                        break;
                    }
                    literal.push(d);
                    chars.next();
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| EvalError::InvalidNumber(literal.clone()))?;
                if !value.is_finite() {
                    return Err(EvalError::NonFinite);
                }
                tokens.push(Token::Number(value));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(EvalError::UnexpectedChar(other)),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = finite(if op == Token::Plus { acc + rhs } else { acc - rhs })?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = finite(if op == Token::Star {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                acc / rhs
            })?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(sign @ (Token::Plus | Token::Minus)) => {
                self.pos += 1;
                self.enter()?;
                let value = self.unary()?;
                self.leave();
                Ok(if sign == Token::Minus { -value } else { value })
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.advance() {
            Some(Token::Number(v)) => Ok(v),
            Some(Token::LParen) => {
                self.enter()?;
                let value = self.expr()?;
                self.leave();
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
                    None => Err(EvalError::Unbalanced),
                }
            }
            Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}
