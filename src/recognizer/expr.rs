//! Score expressions.
//!
//! A step is one or more track expressions joined by `&&`. A track expression is
//! arithmetic over rule calls and numeric literals:
//!
//! ```text
//! or_expr  := add_expr ("||" add_expr)*
//! add_expr := mul_expr ("+" mul_expr)*
//! mul_expr := atom ("*" atom)*
//! atom     := rule_call | number | "(" or_expr ")"
//! ```
//!
//! Rule calls are lexed as a single token, so a broken call such as `tap(1` only
//! poisons its own operand instead of the whole expression.

use crate::error::ExprError;

#[derive(Clone, Debug, PartialEq)]
pub struct RuleCall {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Rule(RuleCall),
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Call(Call),
    Number(f64),
    Plus,
    Star,
    Or,
    Open,
    Close,
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Call(usize),
    Number(f64),
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A parsed track expression.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackExpr {
    root: Expr,
    calls: Vec<Call>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// Rule calls substituted, resolved or not.
    pub nrules: usize,
}

pub fn split_tracks(step: &str) -> Vec<&str> {
    step.split("&&").collect()
}

/// Zero, NaN and infinities are falsy.
pub fn truthy(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

pub fn parse(src: &str) -> Result<TrackExpr, ExprError> {
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        calls: Vec::new(),
    };
    let root = parser.or_expr()?;
    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(match token {
            Token::Close => ExprError::Unbalanced { offset: *offset },
            other => ExprError::UnexpectedToken {
                found: describe(other),
                offset: *offset,
            },
        });
    }
    Ok(TrackExpr {
        root,
        calls: parser.calls,
    })
}

impl TrackExpr {
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Scores every call left to right, then folds the arithmetic. `score` returns
    /// `None` for a rule it cannot resolve; such calls and malformed ones count as zero
    /// but still count towards `nrules`.
    pub fn evaluate<F>(&self, mut score: F) -> Evaluation
    where
        F: FnMut(&RuleCall) -> Option<f64>,
    {
        let values: Vec<f64> = self
            .calls
            .iter()
            .map(|call| match call {
                Call::Rule(rule) => score(rule).map_or(0.0, sanitize),
                Call::Malformed(text) => {
                    let err = ExprError::MalformedRule { text: text.clone() };
                    log::warn!("{err}, scoring it as 0");
                    0.0
                }
            })
            .collect();

        Evaluation {
            value: fold(&self.root, &values),
            nrules: self.calls.len(),
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn fold(expr: &Expr, values: &[f64]) -> f64 {
    match expr {
        Expr::Call(idx) => values[*idx],
        Expr::Number(n) => *n,
        Expr::Add(a, b) => fold(a, values) + fold(b, values),
        Expr::Mul(a, b) => fold(a, values) * fold(b, values),
        Expr::Or(a, b) => {
            let left = fold(a, values);
            if truthy(left) { left } else { fold(b, values) }
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Call(Call::Rule(rule)) => format!("rule '{}'", rule.name),
        Token::Call(Call::Malformed(text)) => format!("'{text}'"),
        Token::Number(n) => format!("number {n}"),
        Token::Plus => "'+'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Or => "'||'".to_string(),
        Token::Open => "'('".to_string(),
        Token::Close => "')'".to_string(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(src: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push((offset, Token::Plus));
                i += 1;
            }
            '*' => {
                tokens.push((offset, Token::Star));
                i += 1;
            }
            '(' => {
                tokens.push((offset, Token::Open));
                i += 1;
            }
            ')' => {
                tokens.push((offset, Token::Close));
                i += 1;
            }
            '|' => match chars.get(i + 1) {
                Some((_, '|')) => {
                    tokens.push((offset, Token::Or));
                    i += 2;
                }
                _ => return Err(ExprError::UnexpectedChar { ch: c, offset }),
            },
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let end = chars.get(i).map_or(src.len(), |(o, _)| *o);
                let text = &src[offset..end];
                let value = text.parse::<f64>().map_err(|_| ExprError::UnexpectedToken {
                    found: format!("'{text}'"),
                    offset,
                })?;
                tokens.push((offset, Token::Number(value)));
            }
            c if is_ident_start(c) => {
                let (call, next) = lex_call(src, &chars, i);
                tokens.push((offset, Token::Call(call)));
                i = next;
            }
            _ => return Err(ExprError::UnexpectedChar { ch: c, offset }),
        }
    }

    Ok(tokens)
}

/// Reads `name(args)` starting at `start`, returning the call and the index after it.
fn lex_call(src: &str, chars: &[(usize, char)], start: usize) -> (Call, usize) {
    let byte_at = |idx: usize| chars.get(idx).map_or(src.len(), |(o, _)| *o);

    let mut i = start;
    while i < chars.len() && is_ident_char(chars[i].1) {
        i += 1;
    }
    let name = &src[byte_at(start)..byte_at(i)];

    let mut j = i;
    while j < chars.len() && chars[j].1.is_whitespace() {
        j += 1;
    }
    if chars.get(j).map(|(_, c)| *c) != Some('(') {
        return (Call::Malformed(name.to_string()), i);
    }

    let open = j;
    let mut depth = 0usize;
    let mut nested = false;
    let mut close = None;
    for (k, (_, c)) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => {
                depth += 1;
                nested |= depth > 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(k);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return (
            Call::Malformed(src[byte_at(start)..].to_string()),
            chars.len(),
        );
    };

    let text = &src[byte_at(start)..byte_at(close + 1)];
    let inner = &src[byte_at(open + 1)..byte_at(close)];
    if nested {
        return (Call::Malformed(text.to_string()), close + 1);
    }

    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(|a| a.trim().to_string()).collect()
    };

    (
        Call::Rule(RuleCall {
            name: name.to_string(),
            args,
        }),
        close + 1,
    )
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    calls: Vec<Call>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.add_expr()?;
        while self.eat(&Token::Or) {
            let right = self.add_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn add_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.mul_expr()?;
        while self.eat(&Token::Plus) {
            let right = self.mul_expr()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn mul_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.atom()?;
        while self.eat(&Token::Star) {
            let right = self.atom()?;
            left = Expr::Mul(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn atom(&mut self) -> Result<Expr, ExprError> {
        let Some((offset, token)) = self.tokens.get(self.pos).cloned() else {
            return Err(ExprError::UnexpectedEnd);
        };
        self.pos += 1;
        match token {
            Token::Call(call) => {
                self.calls.push(call);
                Ok(Expr::Call(self.calls.len() - 1))
            }
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Open => {
                let inner = self.or_expr()?;
                if self.eat(&Token::Close) {
                    Ok(inner)
                } else {
                    Err(ExprError::Unbalanced { offset })
                }
            }
            Token::Close => Err(ExprError::Unbalanced { offset }),
            other => Err(ExprError::UnexpectedToken {
                found: describe(&other),
                offset,
            }),
        }
    }
}
