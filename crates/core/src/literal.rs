//! Parser for the bracketed literal notation accepted as a payload fallback.
//!
//! Handles lists, tuples, sets and dicts of quoted strings, numbers and the
//! `True`/`False`/`None` constants, e.g. `['backup-20240101-000000', 3]`.
//! Anything outside that grammar is a syntax error; no expression is evaluated.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Deepest bracket nesting accepted before the payload is rejected.
pub const MAX_NESTING: usize = 200;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Str(String),
    Bytes(Vec<u8>),
    /// Numeric literal, kept as written (sign included).
    Number(String),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// Set elements in source order, duplicates dropped.
    Set(Vec<Literal>),
    /// Dict entries in first-insertion order; a repeated key replaces the value.
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Whether the value may be a set element or dict key.
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::List(_) | Self::Set(_) | Self::Dict(_) => false,
            Self::Tuple(items) => items.iter().all(Literal::is_hashable),
            _ => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::None => "none",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
        }
    }
}

/// Parses a complete literal payload.
///
/// Leading spaces and tabs are ignored, as are blank lines and comments
/// around the value. A bare comma-separated sequence at top level is a tuple.
pub fn parse(src: &str) -> Result<Literal> {
    let trimmed = src.trim_start_matches([' ', '\t']);
    let mut parser = Parser {
        src: trimmed,
        pos: 0,
        depth: 0,
        base: src.len() - trimmed.len(),
    };

    parser.skip_all_whitespace();
    let value = parser.parse_top()?;
    parser.skip_all_whitespace();

    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// String literal under construction.
enum StrBuf {
    Text(String),
    Bytes(Vec<u8>),
}

impl StrBuf {
    fn push(&mut self, c: char) {
        match self {
            Self::Text(s) => s.push(c),
            // bytes literals only ever receive ASCII characters here
            Self::Bytes(b) => b.push(c as u8),
        }
    }

    fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Open bracket count; newlines are insignificant only inside brackets.
    depth: usize,
    /// Bytes trimmed from the front of the original input.
    base: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {:?}", expected)))
        }
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        self.error_at(self.pos, msg)
    }

    fn error_at(&self, pos: usize, msg: impl Into<String>) -> Error {
        Error::literal(self.base + pos, msg)
    }

    fn unexpected(&self, context: &str) -> Error {
        match self.peek() {
            Some(c) => self.error(format!("{}, found {:?}", context, c)),
            None => self.error(format!("{}, found end of input", context)),
        }
    }

    fn open(&mut self, bracket: char) -> Result<()> {
        self.expect(bracket)?;
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("too many nested brackets"));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.depth -= 1;
    }

    /// Skips insignificant whitespace, comments and line continuations.
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\x0c' => self.pos += 1,
                '\r' | '\n' if self.depth > 0 => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' if self.rest()[1..].starts_with('\n') => self.pos += 2,
                '\\' if self.rest()[1..].starts_with("\r\n") => self.pos += 3,
                _ => break,
            }
        }
    }

    /// Skips whitespace including newlines, used around the top-level value.
    fn skip_all_whitespace(&mut self) {
        loop {
            self.skip_ws();
            match self.peek() {
                Some('\r' | '\n') => self.pos += 1,
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        let len = self.rest().find(['\r', '\n']).unwrap_or(self.rest().len());
        self.pos += len;
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\r' | '\n'))
    }

    fn parse_top(&mut self) -> Result<Literal> {
        let first = self.parse_expr()?;
        self.skip_ws();
        if self.peek() != Some(',') {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(',') {
            self.skip_ws();
            if self.at_line_end() {
                break;
            }
            items.push(self.parse_expr()?);
            self.skip_ws();
        }
        Ok(Literal::Tuple(items))
    }

    /// Parses an atom with an optional sign, and `real +/- imaginary` sums.
    fn parse_expr(&mut self) -> Result<Literal> {
        self.skip_ws();
        let start = self.pos;

        let value = match self.peek() {
            Some(sign @ ('+' | '-')) => {
                self.bump();
                match self.parse_atom()? {
                    Literal::Number(n) if sign == '-' => Literal::Number(format!("-{}", n)),
                    Literal::Number(n) => Literal::Number(n),
                    other => {
                        return Err(self.error_at(
                            start,
                            format!("unary {:?} applied to {}", sign, other.kind()),
                        ))
                    }
                }
            }
            _ => self.parse_atom()?,
        };

        let real = match value {
            Literal::Number(ref n) if !is_imaginary(n) => n.clone(),
            _ => return Ok(value),
        };

        self.skip_ws();
        let op = match self.peek() {
            Some(op @ ('+' | '-')) => op,
            _ => return Ok(value),
        };
        self.bump();
        match self.parse_atom()? {
            Literal::Number(imag) if is_imaginary(&imag) => {
                Ok(Literal::Number(format!("{}{}{}", real, op, imag)))
            }
            _ => Err(self.error_at(start, "only real +/- imaginary sums are literals")),
        }
    }

    fn parse_atom(&mut self) -> Result<Literal> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.parse_list(),
            Some('(') => self.parse_paren(),
            Some('{') => self.parse_brace(),
            Some('\'' | '"') => self.parse_strings(),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.parse_number()
            }
            Some(c) if is_ident_start(c) => self.parse_name(),
            Some(c) => Err(self.error(format!("unexpected character {:?}", c))),
        }
    }

    fn parse_list(&mut self) -> Result<Literal> {
        self.open('[')?;
        let items = self.parse_items(']', Vec::new())?;
        self.close();
        Ok(Literal::List(items))
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn parse_items(&mut self, close: char, mut items: Vec<Literal>) -> Result<Vec<Literal>> {
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    fn parse_paren(&mut self) -> Result<Literal> {
        self.open('(')?;
        self.skip_ws();
        if self.eat(')') {
            self.close();
            return Ok(Literal::Tuple(Vec::new()));
        }

        let first = self.parse_expr()?;
        self.skip_ws();
        if self.eat(')') {
            // parenthesized expression, not a tuple
            self.close();
            return Ok(first);
        }
        self.expect(',')?;
        let items = self.parse_items(')', vec![first])?;
        self.close();
        Ok(Literal::Tuple(items))
    }

    fn parse_brace(&mut self) -> Result<Literal> {
        self.open('{')?;
        self.skip_ws();
        if self.eat('}') {
            self.close();
            return Ok(Literal::Dict(Vec::new()));
        }

        let first_at = self.pos;
        let first = self.parse_expr()?;
        self.skip_ws();
        let value = if self.eat(':') {
            self.parse_dict_entries(first_at, first)?
        } else {
            self.parse_set_entries(first_at, first)?
        };
        self.close();
        Ok(value)
    }

    fn parse_dict_entries(&mut self, first_at: usize, first: Literal) -> Result<Literal> {
        let mut entries: Vec<(Literal, Literal)> = Vec::new();
        let mut index: HashMap<Literal, usize> = HashMap::new();

        let mut key_at = first_at;
        let mut key = first;
        loop {
            let value = self.parse_expr()?;
            if !key.is_hashable() {
                return Err(self.error_at(key_at, format!("unhashable dict key: {}", key.kind())));
            }
            match index.get(&key) {
                Some(&i) => entries[i].1 = value,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, value));
                }
            }

            self.skip_ws();
            if self.eat('}') {
                break;
            }
            self.expect(',')?;
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            key_at = self.pos;
            key = self.parse_expr()?;
            self.skip_ws();
            self.expect(':')?;
        }
        Ok(Literal::Dict(entries))
    }

    fn parse_set_entries(&mut self, first_at: usize, first: Literal) -> Result<Literal> {
        let mut elements = Vec::new();
        let mut seen = HashSet::new();

        let mut at = first_at;
        let mut element = first;
        loop {
            if !element.is_hashable() {
                return Err(self.error_at(at, format!("unhashable set element: {}", element.kind())));
            }
            if seen.insert(element.clone()) {
                elements.push(element);
            }

            self.skip_ws();
            if self.eat('}') {
                break;
            }
            self.expect(',')?;
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            at = self.pos;
            element = self.parse_expr()?;
            self.skip_ws();
        }
        Ok(Literal::Set(elements))
    }

    fn parse_name(&mut self) -> Result<Literal> {
        if self.string_prefix_len().is_some() {
            return self.parse_strings();
        }

        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            "set" => {
                // `set()` is the only call accepted: the empty set
                self.skip_ws();
                self.open('(')?;
                self.skip_ws();
                self.expect(')')?;
                self.close();
                Ok(Literal::Set(Vec::new()))
            }
            name => Err(self.error_at(start, format!("unsupported name {:?}", name))),
        }
    }

    /// Length of the string prefix if a string literal starts here.
    fn string_prefix_len(&self) -> Option<usize> {
        let rest = self.rest();
        let prefix_len = rest
            .bytes()
            .take(3)
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if prefix_len > 2 {
            return None;
        }
        match rest[prefix_len..].chars().next() {
            Some('\'' | '"') => Some(prefix_len),
            _ => None,
        }
    }

    /// Parses one or more adjacent string literals and concatenates them.
    fn parse_strings(&mut self) -> Result<Literal> {
        let start = self.pos;
        let mut buf = self.parse_string_literal(None)?;

        loop {
            self.skip_ws();
            if self.string_prefix_len().is_none() {
                break;
            }
            buf = self.parse_string_literal(Some(buf))?;
        }

        if self.peek().is_some_and(is_ident_continue) {
            return Err(self.error_at(start, "invalid string literal"));
        }

        Ok(match buf {
            StrBuf::Text(s) => Literal::Str(s),
            StrBuf::Bytes(b) => Literal::Bytes(b),
        })
    }

    fn parse_string_literal(&mut self, acc: Option<StrBuf>) -> Result<StrBuf> {
        let start = self.pos;
        let prefix_len = self
            .string_prefix_len()
            .ok_or_else(|| self.unexpected("expected string literal"))?;
        let prefix = self.src[self.pos..self.pos + prefix_len].to_ascii_lowercase();
        self.pos += prefix_len;

        let (raw, bytes) = match prefix.as_str() {
            "" | "u" => (false, false),
            "r" => (true, false),
            "b" => (false, true),
            "br" | "rb" => (true, true),
            "f" | "fr" | "rf" => {
                return Err(self.error_at(start, "formatted strings are not literals"))
            }
            other => {
                return Err(self.error_at(start, format!("invalid string prefix {:?}", other)))
            }
        };

        let mut buf = match acc {
            Some(buf) if buf.is_bytes() != bytes => {
                return Err(self.error_at(start, "cannot mix bytes and str literals"));
            }
            Some(buf) => buf,
            None if bytes => StrBuf::Bytes(Vec::new()),
            None => StrBuf::Text(String::new()),
        };

        let quote = self.bump().ok_or_else(|| self.error("expected quote"))?;
        let closing: String = std::iter::repeat(quote).take(3).collect();
        let triple = self.rest().starts_with(&closing[..2]);
        if triple {
            self.pos += 2;
        }

        loop {
            if triple && self.rest().starts_with(&closing) {
                self.pos += 3;
                return Ok(buf);
            }
            let c = self
                .bump()
                .ok_or_else(|| self.error_at(start, "unterminated string literal"))?;
            match c {
                c if c == quote && !triple => return Ok(buf),
                '\r' | '\n' if !triple => {
                    return Err(self.error_at(start, "unterminated string literal"))
                }
                c if bytes && !c.is_ascii() => {
                    return Err(self.error("bytes can only contain ASCII characters"))
                }
                '\\' => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error_at(start, "unterminated string literal"))?;
                    if bytes && !escaped.is_ascii() {
                        return Err(self.error("bytes can only contain ASCII characters"));
                    }
                    if raw {
                        buf.push('\\');
                        buf.push(escaped);
                        if escaped == '\r' && self.eat('\n') {
                            buf.push('\n');
                        }
                    } else {
                        self.unescape(escaped, &mut buf)?;
                    }
                }
                c => buf.push(c),
            }
        }
    }

    /// Decodes the escape sequence following a backslash.
    fn unescape(&mut self, escaped: char, buf: &mut StrBuf) -> Result<()> {
        let at = self.pos - 1;
        let simple = match escaped {
            '\n' => return Ok(()),
            '\r' => {
                self.eat('\n');
                return Ok(());
            }
            '\\' | '\'' | '"' => Some(escaped),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\x0b'),
            _ => None,
        };
        if let Some(c) = simple {
            buf.push(c);
            return Ok(());
        }

        let is_text = !buf.is_bytes();
        match (escaped, is_text) {
            ('0'..='7', _) => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                self.push_code(at, value, buf)
            }
            ('x', _) => {
                let value = self.hex_digits(at, 2, "\\xXX")?;
                self.push_code(at, value, buf)
            }
            ('u', true) => {
                let value = self.hex_digits(at, 4, "\\uXXXX")?;
                self.push_code(at, value, buf)
            }
            ('U', true) => {
                let value = self.hex_digits(at, 8, "\\UXXXXXXXX")?;
                self.push_code(at, value, buf)
            }
            ('N', true) => Err(self.error_at(at, "named unicode escapes are not supported")),
            (other, _) => {
                // unknown escapes keep the backslash
                buf.push('\\');
                buf.push(other);
                Ok(())
            }
        }
    }

    fn hex_digits(&mut self, at: usize, count: usize, form: &str) -> Result<u32> {
        let digits = self.rest().get(..count).unwrap_or("");
        if digits.len() != count || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error_at(at, format!("truncated {} escape", form)));
        }
        self.pos += count;
        u32::from_str_radix(digits, 16)
            .map_err(|_| self.error_at(at, format!("truncated {} escape", form)))
    }

    fn push_code(&self, at: usize, value: u32, buf: &mut StrBuf) -> Result<()> {
        match buf {
            StrBuf::Bytes(b) => {
                let byte = u8::try_from(value)
                    .map_err(|_| self.error_at(at, "octal escape out of byte range"))?;
                b.push(byte);
            }
            StrBuf::Text(s) => {
                if value > 0x10FFFF {
                    return Err(self.error_at(at, "illegal unicode character"));
                }
                // lone surrogates have no UTF-8 form
                s.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
        Ok(())
    }

    fn parse_number(&mut self) -> Result<Literal> {
        let start = self.pos;
        let radix_digit: Option<fn(u8) -> bool> = match self.rest().as_bytes() {
            [b'0', b'x' | b'X', ..] => Some(is_hex_digit as fn(u8) -> bool),
            [b'0', b'o' | b'O', ..] => Some(is_octal_digit as fn(u8) -> bool),
            [b'0', b'b' | b'B', ..] => Some(is_binary_digit as fn(u8) -> bool),
            _ => None,
        };

        if let Some(is_digit) = radix_digit {
            self.pos += 2;
            if self.peek() == Some('_') {
                self.pos += 1;
            }
            self.digits(is_digit)?;
        } else {
            let mut is_integer = true;
            let has_int_part = self.peek().is_some_and(|c| c.is_ascii_digit());
            if has_int_part {
                self.digits(is_decimal_digit)?;
            }
            let int_end = self.pos;

            if self.eat('.') {
                is_integer = false;
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.digits(is_decimal_digit)?;
                }
            }

            if matches!(self.peek(), Some('e' | 'E')) {
                self.pos += 1;
                if matches!(self.peek(), Some('+' | '-')) {
                    self.pos += 1;
                }
                self.digits(is_decimal_digit)?;
                is_integer = false;
            }

            if matches!(self.peek(), Some('j' | 'J')) {
                self.pos += 1;
                is_integer = false;
            }

            if is_integer {
                let int_part = &self.src[start..int_end];
                if int_part.starts_with('0') && int_part.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
                    return Err(self.error_at(start, "leading zeros in decimal integers are not permitted"));
                }
            }
        }

        if self.peek().is_some_and(is_ident_continue) {
            return Err(self.error_at(start, "invalid numeric literal"));
        }
        Ok(Literal::Number(self.src[start..self.pos].to_string()))
    }

    /// Digits with single underscores allowed between them.
    fn digits(&mut self, is_digit: fn(u8) -> bool) -> Result<()> {
        let bytes = self.src.as_bytes();
        if !bytes.get(self.pos).copied().is_some_and(is_digit) {
            return Err(self.unexpected("expected digit"));
        }
        self.pos += 1;
        loop {
            match bytes.get(self.pos).copied() {
                Some(b) if is_digit(b) => self.pos += 1,
                Some(b'_') if bytes.get(self.pos + 1).copied().is_some_and(is_digit) => {
                    self.pos += 2
                }
                _ => return Ok(()),
            }
        }
    }
}

fn is_decimal_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn is_octal_digit(b: u8) -> bool {
    matches!(b, b'0'..=b'7')
}

fn is_binary_digit(b: u8) -> bool {
    matches!(b, b'0' | b'1')
}

fn is_imaginary(number: &str) -> bool {
    number.ends_with(['j', 'J'])
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
