//! Arithmetic expression lexer, AST, parser, and evaluator.
//!
//! The language is deliberately tiny: numeric literals, `#name` variable
//! references, the constants `π`/`pi` and `e`, the operators
//! `+ - * / % ^` (with `×`, `÷` and `**` as aliases), parentheses, and four
//! single-argument functions: `㏒`/`log10`, `㏑`/`ln`, `√`/`sqrt`, and `abs`.
//! There are no other identifiers, no assignment, and no control flow.
//!
//! Operator precedence (lowest → highest):
//!   additive  →  multiplicative  →  unary  →  power  →  primary
//!
//! `^` is right-associative and binds tighter than a leading minus, so
//! `-2^2` is `-4` and `2^-1` is `0.5`.

use super::error::EvalError;
use super::value::Value;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Variable lookup used by the evaluator.
///
/// The [`Interpreter`](super::interp::Interpreter) implements this so `#name`
/// references read the live session store.
pub trait EvalContext {
    /// Look up a variable by bare name (no `#`).
    fn get_var(&self, name: &str) -> Option<Value>;
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Ident(String),
    /// `#name` reference; the payload excludes the `#`.
    Var(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,

    LParen,
    RParen,
    /// Unrecognised input character, reported by the parser.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_digits(&mut self, s: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            s.push(c);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        self.read_digits(&mut s);
        if first != '.' && self.peek() == Some('.') {
            s.push('.');
            self.pos += 1;
            self.read_digits(&mut s);
        }
        // Exponent only when digits follow; a bare `e` is Euler's number.
        if matches!(self.peek(), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek_at(1), Some('+' | '-')) { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        s.push(c);
                    }
                }
                self.read_digits(&mut s);
            }
        }
        match s.parse() {
            Ok(x) => Token::Num(x),
            Err(_) => Token::Unknown(first),
        }
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            s.push(c);
            self.pos += 1;
        }
        Token::Ident(s)
    }

    fn read_var(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            let word = c.is_alphanumeric() || matches!(c, '_' | '$' | '¢');
            // `.` only as a separator inside names like `¢.rate`.
            let dotted = c == '.' && self.peek_at(1).is_some_and(char::is_alphabetic);
            if !(word || dotted) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty() {
            Token::Unknown('#')
        } else {
            Token::Var(name)
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Token::Eof,
            Some(c) => c,
        };

        match ch {
            '0'..='9' => self.read_number(ch),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(ch),
            'a'..='z' | 'A'..='Z' | '_' => self.read_ident(ch),
            '#' => self.read_var(),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => {
                if self.eat('*') {
                    Token::Caret
                } else {
                    Token::Star
                }
            }
            '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            'π' => Token::Num(std::f64::consts::PI),
            '㏒' => Token::Ident("log10".to_owned()),
            '㏑' => Token::Ident("ln".to_owned()),
            '√' => Token::Ident("sqrt".to_owned()),
            c => Token::Unknown(c),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Log10,
    Ln,
    Sqrt,
    Abs,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "log10" => Some(Func::Log10),
            "ln" => Some(Func::Ln),
            "sqrt" => Some(Func::Sqrt),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> Result<f64, EvalError> {
        match self {
            Func::Log10 if x <= 0.0 => Err(EvalError::Domain("log10")),
            Func::Log10 => Ok(x.log10()),
            Func::Ln if x <= 0.0 => Err(EvalError::Domain("ln")),
            Func::Ln => Ok(x.ln()),
            Func::Sqrt if x < 0.0 => Err(EvalError::Domain("sqrt")),
            Func::Sqrt => Ok(x.sqrt()),
            Func::Abs => Ok(x.abs()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Nesting limit for the recursive-descent parser.  Parentheses, prefix
/// signs, exponents and bare function calls each add one or two levels.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
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

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let expr = match self.peek() {
            Token::Minus => {
                self.pos += 1;
                Expr::Neg(Box::new(self.parse_unary()?))
            }
            Token::Plus => {
                self.pos += 1;
                self.parse_unary()?
            }
            _ => self.parse_power()?,
        };
        self.leave();
        Ok(expr)
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let mut expr = self.parse_primary()?;
        if self.eat(&Token::Caret) {
            let exp = self.parse_unary()?;
            expr = Expr::Binary(BinOp::Pow, Box::new(expr), Box::new(exp));
        }
        self.leave();
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Token::Num(x) => Ok(Expr::Num(x)),
            Token::Var(name) => Ok(Expr::Var(name)),
            Token::Ident(name) => {
                if let Some(func) = Func::from_name(&name) {
                    // `√(x)` or the bare prefix form `√x`.
                    let arg = if self.eat(&Token::LParen) {
                        let inner = self.parse_additive()?;
                        if !self.eat(&Token::RParen) {
                            return Err(EvalError::ExpectedRParen);
                        }
                        inner
                    } else {
                        self.parse_power()?
                    };
                    return Ok(Expr::Call(func, Box::new(arg)));
                }
                match name.as_str() {
                    "e" => Ok(Expr::Num(std::f64::consts::E)),
                    "pi" => Ok(Expr::Num(std::f64::consts::PI)),
                    _ => Err(EvalError::UnknownFunction(name)),
                }
            }
            Token::LParen => {
                let inner = self.parse_additive()?;
                if !self.eat(&Token::RParen) {
                    return Err(EvalError::ExpectedRParen);
                }
                Ok(inner)
            }
            Token::Unknown(c) => Err(EvalError::UnexpectedChar(c)),
            other => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
        }
    }
}

/// Parse an expression string into an AST.
///
/// Trailing input after a complete expression is an error.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(src).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_additive()?;
    match parser.advance() {
        Token::Eof => Ok(expr),
        Token::Unknown(c) => Err(EvalError::UnexpectedChar(c)),
        other => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] against the given context.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<f64, EvalError> {
    match expr {
        Expr::Num(x) => Ok(*x),

        Expr::Var(name) => match ctx.get_var(name) {
            None => Ok(0.0),
            Some(Value::Num(x)) => Ok(x),
            Some(Value::Str(_)) => Err(EvalError::NotANumber(name.clone())),
        },

        Expr::Neg(inner) => Ok(-eval_expr(inner, ctx)?),

        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            eval_binop(*op, l, r)
        }

        Expr::Call(func, arg) => func.apply(eval_expr(arg, ctx)?),
    }
}

fn eval_binop(op: BinOp, l: f64, r: f64) -> Result<f64, EvalError> {
    match op {
        BinOp::Add => Ok(l + r),
        BinOp::Sub => Ok(l - r),
        BinOp::Mul => Ok(l * r),
        BinOp::Div if r == 0.0 => Err(EvalError::DivisionByZero),
        BinOp::Div => Ok(l / r),
        BinOp::Rem if r == 0.0 => Err(EvalError::ModuloByZero),
        // Floored modulo: the result takes the sign of the divisor.
        BinOp::Rem => Ok(l - r * (l / r).floor()),
        BinOp::Pow if l == 0.0 && r < 0.0 => Err(EvalError::DivisionByZero),
        BinOp::Pow => Ok(l.powf(r)),
    }
}

/// Convenience: parse and evaluate, rejecting NaN and infinite results.
pub fn eval_str(src: &str, ctx: &dyn EvalContext) -> Result<f64, EvalError> {
    let expr = parse_expr(src)?;
    let x = eval_expr(&expr, ctx)?;
    if x.is_finite() {
        Ok(x)
    } else {
        Err(EvalError::NonFinite)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
