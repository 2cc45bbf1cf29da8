//! Per-page condition expressions.
//!
//! A condition is a template over `$page` (current 1-based page number) and
//! `$total` (page count). For each page the variables are substituted
//! textually, then the result is parsed and evaluated against a fixed
//! grammar: integer literals, `+ - * / %`, parentheses, comparisons, and
//! `&& ||` with conventional precedence and left-to-right associativity.
//!
//! A page whose substituted expression fails to parse or evaluate (division
//! by zero, type mismatch) is silently excluded. That is a deliberate skip
//! policy so a predicate like `10 % $page == 0` never aborts a run.

use super::ExprError;

/// Evaluates `condition` once per page from 1 to `total_pages` and returns
/// the 0-based indices of the pages for which it holds, ascending.
pub fn select_pages(condition: &str, total_pages: usize) -> Vec<usize> {
    let mut selected = Vec::new();
    for page in 1..=total_pages {
        let substituted = condition
            .replace("$page", &page.to_string())
            .replace("$total", &total_pages.to_string());
        if matches!(evaluate(&substituted), Ok(value) if value.is_truthy()) {
            selected.push(page - 1);
        }
    }
    selected
}

/// Parses and evaluates a fully substituted expression.
pub fn evaluate(input: &str) -> Result<Value, ExprError> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::UnexpectedToken(parser.pos));
    }
    eval(&expr)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// A bare numeric result counts as true when nonzero, so `$page % 2`
    /// works as a predicate on its own.
    pub fn is_truthy(self) -> bool {
        match self {
            Value::Int(n) => n != 0,
            Value::Bool(b) => b,
        }
    }

    fn as_int(self) -> Result<i64, ExprError> {
        match self {
            Value::Int(n) => Ok(n),
            Value::Bool(_) => Err(ExprError::TypeMismatch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Int(i64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = digits.parse::<i64>().map_err(|_| ExprError::Overflow)?;
                tokens.push(Token::Int(n));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Eq),
                    _ => return Err(ExprError::UnexpectedChar('=')),
                }
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Ne),
                    _ => return Err(ExprError::UnexpectedChar('!')),
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '&' => {
                chars.next();
                match chars.next() {
                    Some('&') => tokens.push(Token::And),
                    _ => return Err(ExprError::UnexpectedChar('&')),
                }
            }
            '|' => {
                chars.next();
                match chars.next() {
                    Some('|') => tokens.push(Token::Or),
                    _ => return Err(ExprError::UnexpectedChar('|')),
                }
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug)]
enum Expr {
    Int(i64),
    Neg(Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

/// Recursive-descent parser with one function per precedence level:
/// `||` < `&&` < `== !=` < `< > <= >=` < `+ -` < `* / %` < unary.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary(Box::new(left), BinOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_equality()?;
        while self.peek() == Some(Token::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary(Box::new(left), BinOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinOp::Eq,
                Some(Token::Ne) => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Ge) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(Token::Minus) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::LParen) => {
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(ExprError::UnexpectedToken(self.pos - 1)),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(_) => Err(ExprError::UnexpectedToken(self.pos - 1)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

fn eval(expr: &Expr) -> Result<Value, ExprError> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Neg(inner) => {
            let n = eval(inner)?.as_int()?;
            n.checked_neg().map(Value::Int).ok_or(ExprError::Overflow)
        }
        Expr::Binary(left, op, right) => match op {
            // The combinators short-circuit, so the guard in
            // `$page != 0 && 10 / $page > 1` protects the division.
            BinOp::And => {
                if !eval(left)?.is_truthy() {
                    Ok(Value::Bool(false))
                } else {
                    Ok(Value::Bool(eval(right)?.is_truthy()))
                }
            }
            BinOp::Or => {
                if eval(left)?.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(eval(right)?.is_truthy()))
                }
            }
            BinOp::Eq | BinOp::Ne => {
                let equal = match (eval(left)?, eval(right)?) {
                    (Value::Int(a), Value::Int(b)) => a == b,
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    _ => return Err(ExprError::TypeMismatch),
                };
                Ok(Value::Bool(if *op == BinOp::Eq { equal } else { !equal }))
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let a = eval(left)?.as_int()?;
                let b = eval(right)?.as_int()?;
                Ok(Value::Bool(match op {
                    BinOp::Lt => a < b,
                    BinOp::Gt => a > b,
                    BinOp::Le => a <= b,
                    _ => a >= b,
                }))
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                let a = eval(left)?.as_int()?;
                let b = eval(right)?.as_int()?;
                match op {
                    BinOp::Add => a.checked_add(b).ok_or(ExprError::Overflow),
                    BinOp::Sub => a.checked_sub(b).ok_or(ExprError::Overflow),
                    BinOp::Mul => a.checked_mul(b).ok_or(ExprError::Overflow),
                    BinOp::Div => a.checked_div(b).ok_or(ExprError::DivisionByZero),
                    _ => a.checked_rem(b).ok_or(ExprError::DivisionByZero),
                }
                .map(Value::Int)
            }
        },
    }
}
