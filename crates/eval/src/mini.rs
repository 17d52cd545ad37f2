use crate::error::{EvalError, Result};
use crate::{Evaluator, Session};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Tree-walking interpreter for a small expression language.
///
/// Supports integer and string literals, `+ - * / %`, unary minus, `==` and
/// `!=`, parentheses, identifiers, and assignment (`name = expr`), which
/// binds into the session and returns the value. Assignment is what makes
/// in-file ordering observable: a directive can bind a name that a later
/// directive reads.
///
/// `load_file` scrapes top-level declarations (`let`/`const`/`var NAME =
/// <expr>;`, or bare `NAME = <expr>` for Python-style files) and binds the
/// ones whose right-hand side this language can evaluate. Everything else in
/// the file is ignored.
#[derive(Debug, Default, Clone)]
pub struct MiniInterpreter;

impl MiniInterpreter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Evaluator for MiniInterpreter {
    async fn open_session(&self, _root: &Path) -> Result<Box<dyn Session>> {
        Ok(Box::new(MiniSession {
            bindings: HashMap::new(),
        }))
    }
}

struct MiniSession {
    bindings: HashMap<String, Value>,
}

static DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:let|const|var)\s+(?:mut\s+)?)?([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*[A-Za-z0-9_:<>\[\]\s]+?)?\s*=\s*([^;\n]+?);?\s*$",
    )
    .expect("declaration regex")
});

#[async_trait]
impl Session for MiniSession {
    async fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let mut loaded = 0usize;
        for caps in DECL_RE.captures_iter(&content) {
            let name = &caps[1];
            let rhs = caps[2].trim();
            match eval_str(rhs, &mut self.bindings) {
                Ok(value) => {
                    self.bindings.insert(name.to_string(), value);
                    loaded += 1;
                }
                Err(_) => {
                    // Not an expression this language understands; skip it.
                    log::debug!("{}: skipping declaration {name}", path.display());
                }
            }
        }
        log::debug!("{}: loaded {loaded} declarations", path.display());
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<String> {
        let value = eval_str(expression, &mut self.bindings)?;
        Ok(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

fn eval_str(input: &str, bindings: &mut HashMap<String, Value>) -> Result<Value> {
    let tokens = tokenize(input)?;
    let mut parser = TokenStream { tokens, pos: 0 };
    let expr = parser.parse_statement()?;
    if !parser.at_end() {
        return Err(EvalError::evaluation(format!(
            "unexpected trailing input in `{input}`"
        )));
    }
    eval_expr(&expr, bindings)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    NotEq,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    num.push(c);
                    chars.next();
                }
                let value = num
                    .parse()
                    .map_err(|_| EvalError::evaluation(format!("integer overflow: {num}")))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_alphanumeric() && c != '_' {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(c) => text.push(c),
                            None => {
                                return Err(EvalError::evaluation("unterminated string literal"))
                            }
                        },
                        Some(c) => text.push(c),
                        None => return Err(EvalError::evaluation("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(text));
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
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::EqEq);
                } else {
                    tokens.push(Token::Eq);
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    return Err(EvalError::evaluation("unexpected `!`"));
                }
            }
            other => {
                return Err(EvalError::evaluation(format!(
                    "unexpected character `{other}`"
                )));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
enum Expr {
    Int(i64),
    Str(String),
    Var(String),
    Assign(String, Box<Expr>),
    Unary(Box<Expr>),
    Binary(Token, Box<Expr>, Box<Expr>),
}

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// statement := IDENT '=' expr | expr
    fn parse_statement(&mut self) -> Result<Expr> {
        if let (Some(Token::Ident(name)), Some(Token::Eq)) =
            (self.tokens.first(), self.tokens.get(1))
        {
            let name = name.clone();
            self.pos = 2;
            let value = self.parse_expr()?;
            return Ok(Expr::Assign(name, Box::new(value)));
        }
        self.parse_expr()
    }

    /// expr := additive (('==' | '!=') additive)?
    fn parse_expr(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        match self.peek() {
            Some(op @ (Token::EqEq | Token::NotEq)) => {
                let op = op.clone();
                self.next();
                let right = self.parse_additive()?;
                Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
            }
            _ => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            let op = op.clone();
            self.next();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            let op = op.clone();
            self.next();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(EvalError::evaluation("expected `)`")),
                }
            }
            other => Err(EvalError::evaluation(format!(
                "expected expression, found {other:?}"
            ))),
        }
    }
}

fn eval_expr(expr: &Expr, bindings: &mut HashMap<String, Value>) -> Result<Value> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Var(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::evaluation(format!("undefined symbol `{name}`"))),
        Expr::Assign(name, value) => {
            let value = eval_expr(value, bindings)?;
            bindings.insert(name.clone(), value.clone());
            Ok(value)
        }
        Expr::Unary(inner) => match eval_expr(inner, bindings)? {
            Value::Int(n) => Ok(Value::Int(-n)),
            other => Err(EvalError::evaluation(format!("cannot negate {other}"))),
        },
        Expr::Binary(op, left, right) => {
            let left = eval_expr(left, bindings)?;
            let right = eval_expr(right, bindings)?;
            apply_binary(op, left, right)
        }
    }
}

fn apply_binary(op: &Token, left: Value, right: Value) -> Result<Value> {
    match (op, left, right) {
        (Token::EqEq, l, r) => Ok(Value::Bool(l == r)),
        (Token::NotEq, l, r) => Ok(Value::Bool(l != r)),
        (Token::Plus, Value::Str(l), r) => Ok(Value::Str(format!("{l}{r}"))),
        (Token::Plus, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_add(r))),
        (Token::Minus, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_sub(r))),
        (Token::Star, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_mul(r))),
        (Token::Slash, Value::Int(_), Value::Int(0)) => {
            Err(EvalError::evaluation("division by zero"))
        }
        (Token::Slash, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l / r)),
        (Token::Percent, Value::Int(_), Value::Int(0)) => {
            Err(EvalError::evaluation("division by zero"))
        }
        (Token::Percent, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l % r)),
        (op, l, r) => Err(EvalError::evaluation(format!(
            "unsupported operation {op:?} on {l} and {r}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Evaluator;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    async fn fresh_session() -> Box<dyn Session> {
        MiniInterpreter::new()
            .open_session(Path::new("."))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn arithmetic() {
        let mut session = fresh_session().await;
        assert_eq!(session.evaluate("2 + 3 * 4").await.unwrap(), "14");
        assert_eq!(session.evaluate("(2 + 3) * 4").await.unwrap(), "20");
        assert_eq!(session.evaluate("-7 + 2").await.unwrap(), "-5");
        assert_eq!(session.evaluate("10 % 3").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn strings_and_comparison() {
        let mut session = fresh_session().await;
        assert_eq!(session.evaluate("\"a\" + \"b\"").await.unwrap(), "ab");
        assert_eq!(session.evaluate("\"n=\" + 5").await.unwrap(), "n=5");
        assert_eq!(session.evaluate("2 + 2 == 4").await.unwrap(), "true");
        assert_eq!(session.evaluate("1 != 1").await.unwrap(), "false");
    }

    #[tokio::test]
    async fn assignment_side_effects_persist() {
        let mut session = fresh_session().await;
        assert_eq!(session.evaluate("x = 5").await.unwrap(), "5");
        assert_eq!(session.evaluate("x + 1").await.unwrap(), "6");
        assert_eq!(session.evaluate("x = x * 2").await.unwrap(), "10");
        assert_eq!(session.evaluate("x").await.unwrap(), "10");
    }

    #[tokio::test]
    async fn errors_are_reported() {
        let mut session = fresh_session().await;
        assert!(session.evaluate("nope").await.is_err());
        assert!(session.evaluate("1 / 0").await.is_err());
        assert!(session.evaluate("2 +").await.is_err());
    }

    #[tokio::test]
    async fn load_file_binds_declarations() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".rs").unwrap();
        writeln!(tmp, "let answer = 40 + 2;").unwrap();
        writeln!(tmp, "let greeting = \"hi\";").unwrap();
        writeln!(tmp, "let skipped = Vec::new();").unwrap();
        tmp.flush().unwrap();

        let mut session = fresh_session().await;
        session.load_file(tmp.path()).await.unwrap();
        assert_eq!(session.evaluate("answer").await.unwrap(), "42");
        assert_eq!(session.evaluate("greeting").await.unwrap(), "hi");
        assert!(session.evaluate("skipped").await.is_err());
    }

    #[tokio::test]
    async fn load_file_binds_python_style_assignments() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".py").unwrap();
        writeln!(tmp, "base = 10").unwrap();
        writeln!(tmp, "total = base * 3").unwrap();
        tmp.flush().unwrap();

        let mut session = fresh_session().await;
        session.load_file(tmp.path()).await.unwrap();
        assert_eq!(session.evaluate("total").await.unwrap(), "30");
    }
}
