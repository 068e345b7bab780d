//! Tokenizer for the expression language.

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Num(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Undefined,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    StrictEq, // ===
    StrictNe, // !==
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,

    // Punctuation
    Dot,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,

    Eof,
}

impl Token {
    /// Short human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Num(n) => format!("number {n}"),
            Token::Str(_) => "string literal".to_string(),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::True => "`true`".to_string(),
            Token::False => "`false`".to_string(),
            Token::Null => "`null`".to_string(),
            Token::Undefined => "`undefined`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Bang => "`!`".to_string(),
            Token::StrictEq => "`===`".to_string(),
            Token::StrictNe => "`!==`".to_string(),
            Token::Lt => "`<`".to_string(),
            Token::Le => "`<=`".to_string(),
            Token::Gt => "`>`".to_string(),
            Token::Ge => "`>=`".to_string(),
            Token::Question => "`?`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Dot => "`.`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::Eof => "end of expression".to_string(),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Words the language does not support but that would read as statements or
/// host escapes if they were accepted as identifiers.
const RESERVED: &[&str] = &[
    "await", "case", "catch", "class", "const", "delete", "do", "else", "export", "for",
    "function", "if", "import", "in", "instanceof", "let", "new", "return", "switch", "throw",
    "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.src[self.pos..].chars();
        it.next();
        it.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.pos += 1;
        }
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn read_number(&mut self, start: usize) -> Result<Token, EvalError> {
        // The first character (digit or '.') is already consumed.
        let leading_dot = &self.src[start..self.pos] == ".";
        self.eat_digits();
        if !leading_dot && self.peek() == Some('.') && matches!(self.peek2(), Some('0'..='9')) {
            self.pos += 1;
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                return Err(EvalError::syntax("missing exponent digits", self.pos));
            }
        }
        if matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            return Err(EvalError::syntax(
                "identifier starts immediately after numeric literal",
                self.pos,
            ));
        }
        self.src[start..self.pos]
            .parse()
            .map(Token::Num)
            .map_err(|_| EvalError::syntax("invalid numeric literal", start))
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<Token, EvalError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(EvalError::syntax("unterminated string literal", start))
                }
                Some('\\') => {
                    let escape_at = self.pos - 1;
                    match self.advance() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        Some('b') => s.push('\u{8}'),
                        Some('f') => s.push('\u{c}'),
                        Some('v') => s.push('\u{b}'),
                        Some('0') => s.push('\0'),
                        Some('u') => s.push(self.read_unicode_escape(escape_at)?),
                        Some(c) => s.push(c),
                        None => {
                            return Err(EvalError::syntax("unterminated string literal", start))
                        }
                    }
                }
                Some(c) if c == quote => return Ok(Token::Str(s)),
                Some(c) => s.push(c),
            }
        }
    }

    fn read_unicode_escape(&mut self, escape_at: usize) -> Result<char, EvalError> {
        let digits = self.src.get(self.pos..self.pos + 4).unwrap_or("");
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EvalError::syntax("invalid unicode escape", escape_at));
        }
        self.pos += 4;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| EvalError::syntax("invalid unicode escape", escape_at))?;
        // Lone surrogates cannot be held in a Rust string.
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_word(&mut self, start: usize) -> Result<Token, EvalError> {
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        Ok(match word {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "undefined" => Token::Undefined,
            w if RESERVED.contains(&w) => {
                return Err(EvalError::syntax(
                    format!("reserved word `{w}` is not supported"),
                    start,
                ))
            }
            w => Token::Ident(w.to_string()),
        })
    }

    fn next_token(&mut self) -> Result<Spanned, EvalError> {
        self.skip_ws();
        let offset = self.pos;
        let ch = match self.advance() {
            None => {
                return Ok(Spanned {
                    token: Token::Eof,
                    offset,
                })
            }
            Some(c) => c,
        };

        let token = match ch {
            '0'..='9' => self.read_number(offset)?,
            '.' if matches!(self.peek(), Some('0'..='9')) => self.read_number(offset)?,
            '"' | '\'' => self.read_string(ch, offset)?,
            c if is_ident_start(c) => self.read_word(offset)?,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '?' => Token::Question,
            ':' => Token::Colon,
            '.' => Token::Dot,
            ',' => Token::Comma,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Token::StrictEq
                    } else {
                        return Err(EvalError::syntax(
                            "loose equality `==` is not supported, use `===`",
                            offset,
                        ));
                    }
                } else {
                    return Err(EvalError::syntax("assignment is not supported", offset));
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Token::StrictNe
                    } else {
                        return Err(EvalError::syntax(
                            "loose inequality `!=` is not supported, use `!==`",
                            offset,
                        ));
                    }
                } else {
                    Token::Bang
                }
            }
            '%' | '&' | '|' | '^' | '~' => {
                return Err(EvalError::syntax(
                    format!("unsupported operator `{ch}`"),
                    offset,
                ))
            }
            c => {
                return Err(EvalError::syntax(
                    format!("unexpected character `{c}`"),
                    offset,
                ))
            }
        };
        Ok(Spanned { token, offset })
    }
}

/// Splits `src` into tokens. The last token is always [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let t = lexer.next_token()?;
        let done = t.token == Token::Eof;
        tokens.push(t);
        if done {
            break;
        }
    }
    Ok(tokens)
}
