//! Pull-style JSON tokenizer.

use super::MAX_NESTING_DEPTH;
use crate::error::{Error, JsonError};

/// The kind of the token the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// No token has been read yet.
    None,
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// A string in key position.
    PropertyName,
    /// A string in value position.
    String,
    /// A number.
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

/// A single token borrowed from the input.
///
/// For strings and property names `slice` excludes the surrounding quotes and
/// is still escaped. Use [`JsonToken::get_string`] or
/// [`JsonToken::is_text_equal`] when escapes matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonToken<'a> {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Raw bytes of the token.
    pub slice: &'a [u8],
    has_escape: bool,
}

impl<'a> JsonToken<'a> {
    const NONE: JsonToken<'static> = JsonToken {
        kind: TokenKind::None,
        slice: &[],
        has_escape: false,
    };

    fn new(kind: TokenKind, slice: &'a [u8]) -> Self {
        Self {
            kind,
            slice,
            has_escape: false,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::String | TokenKind::PropertyName)
    }

    /// Whether this string or property name, once unescaped, equals `text`.
    ///
    /// Always `false` for non-string tokens.
    pub fn is_text_equal(&self, text: &str) -> bool {
        if !self.is_text() {
            return false;
        }
        if !self.has_escape {
            return self.slice == text.as_bytes();
        }
        let expected = text.as_bytes();
        let mut pos = 0;
        let matched = unescape(self.slice, |b| {
            if expected.get(pos) == Some(&b) {
                pos += 1;
                Ok(())
            } else {
                Err(Error::ItemNotFound)
            }
        });
        matched.is_ok() && pos == expected.len()
    }

    /// Raw token text. String content is returned still escaped.
    pub fn raw_str(&self) -> Result<&'a str, Error> {
        core::str::from_utf8(self.slice).map_err(|_| Error::Json(JsonError::InvalidUtf8))
    }

    /// Unescape a string token into `buf` and return it as text.
    pub fn get_string<'b>(&self, buf: &'b mut [u8]) -> Result<&'b str, Error> {
        if !self.is_text() {
            return Err(JsonError::UnexpectedToken.into());
        }
        let mut len = 0;
        unescape(self.slice, |b| {
            let slot = buf.get_mut(len).ok_or(Error::BufferTooSmall)?;
            *slot = b;
            len += 1;
            Ok(())
        })?;
        core::str::from_utf8(&buf[..len]).map_err(|_| Error::Json(JsonError::InvalidUtf8))
    }

    fn number_str(&self) -> Result<&'a str, Error> {
        if self.kind != TokenKind::Number {
            return Err(JsonError::UnexpectedToken.into());
        }
        self.raw_str()
    }

    /// Parse a number token as `f64`.
    pub fn get_f64(&self) -> Result<f64, Error> {
        self.number_str()?
            .parse()
            .map_err(|_| Error::Json(JsonError::InvalidNumber))
    }

    /// Parse a number token as `i32`. Fractions and exponents are rejected.
    pub fn get_i32(&self) -> Result<i32, Error> {
        self.number_str()?
            .parse()
            .map_err(|_| Error::Json(JsonError::InvalidNumber))
    }

    /// Parse a number token as `u32`. Fractions, exponents and negatives are rejected.
    pub fn get_u32(&self) -> Result<u32, Error> {
        self.number_str()?
            .parse()
            .map_err(|_| Error::Json(JsonError::InvalidNumber))
    }

    /// Read a `true` or `false` token.
    pub fn get_bool(&self) -> Result<bool, Error> {
        match self.kind {
            TokenKind::True => Ok(true),
            TokenKind::False => Ok(false),
            _ => Err(JsonError::UnexpectedToken.into()),
        }
    }
}

/// Feed the unescaped bytes of a string slice to `sink`, in order.
fn unescape(slice: &[u8], mut sink: impl FnMut(u8) -> Result<(), Error>) -> Result<(), Error> {
    let mut i = 0;
    while i < slice.len() {
        let b = slice[i];
        if b != b'\\' {
            sink(b)?;
            i += 1;
            continue;
        }
        let esc = *slice.get(i + 1).ok_or(JsonError::InvalidEscape)?;
        i += 2;
        let decoded = match esc {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let mut code = hex4(slice, i)?;
                i += 4;
                if (0xD800..0xDC00).contains(&code) {
                    if slice.get(i) != Some(&b'\\') || slice.get(i + 1) != Some(&b'u') {
                        return Err(JsonError::InvalidEscape.into());
                    }
                    let low = hex4(slice, i + 2)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(JsonError::InvalidEscape.into());
                    }
                    i += 6;
                    code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                }
                let ch = char::from_u32(code).ok_or(JsonError::InvalidEscape)?;
                let mut utf8 = [0u8; 4];
                for &byte in ch.encode_utf8(&mut utf8).as_bytes() {
                    sink(byte)?;
                }
                continue;
            }
            _ => return Err(JsonError::InvalidEscape.into()),
        };
        sink(decoded)?;
    }
    Ok(())
}

fn hex4(slice: &[u8], at: usize) -> Result<u32, JsonError> {
    let digits = slice.get(at..at + 4).ok_or(JsonError::InvalidEscape)?;
    let mut code = 0u32;
    for &d in digits {
        let v = (d as char).to_digit(16).ok_or(JsonError::InvalidEscape)?;
        code = code * 16 + v;
    }
    Ok(code)
}

/// A forward-only reader over a JSON document.
///
/// The reader validates structure as it goes. It is `Clone`, so a copy can
/// look ahead without moving the original.
#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    json: &'a [u8],
    pos: usize,
    token: JsonToken<'a>,
    token_start: usize,
    // Bit `n` set means the container at depth `n + 1` is an object.
    containers: u64,
    depth: usize,
}

impl<'a> JsonReader<'a> {
    /// Create a reader positioned before the first token.
    pub fn new(json: &'a [u8]) -> Self {
        Self {
            json,
            pos: 0,
            token: JsonToken::NONE,
            token_start: 0,
            containers: 0,
            depth: 0,
        }
    }

    /// The token most recently read.
    pub fn token(&self) -> &JsonToken<'a> {
        &self.token
    }

    /// Current nesting depth. `0` outside the root container.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Byte offset where the current token starts.
    pub(crate) fn token_start(&self) -> usize {
        self.token_start
    }

    /// Byte offset just past the current token.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// The input bytes between two offsets.
    pub(crate) fn input(&self, start: usize, end: usize) -> &'a [u8] {
        let json: &'a [u8] = self.json;
        &json[start..end]
    }

    /// Advance to the next token.
    pub fn next_token(&mut self) -> Result<(), JsonError> {
        self.skip_whitespace();
        match self.token.kind {
            TokenKind::None => self.read_value(),
            TokenKind::BeginObject => {
                if self.peek()? == b'}' {
                    self.end_container(true)
                } else {
                    self.read_property_name()
                }
            }
            TokenKind::BeginArray => {
                if self.peek()? == b']' {
                    self.end_container(false)
                } else {
                    self.read_value()
                }
            }
            TokenKind::PropertyName => {
                if self.peek()? != b':' {
                    return Err(JsonError::UnexpectedChar);
                }
                self.pos += 1;
                self.skip_whitespace();
                self.read_value()
            }
            _ => self.after_value(),
        }
    }

    /// Skip over the value the reader is positioned on.
    ///
    /// On a property name the reader first moves to its value. On an object
    /// or array it moves to the matching closing token. Scalars are left as-is.
    pub fn skip_children(&mut self) -> Result<(), JsonError> {
        if self.token.kind == TokenKind::PropertyName {
            self.next_token()?;
        }
        if matches!(self.token.kind, TokenKind::BeginObject | TokenKind::BeginArray) {
            let target = self.depth - 1;
            loop {
                self.next_token()?;
                if matches!(self.token.kind, TokenKind::EndObject | TokenKind::EndArray)
                    && self.depth == target
                {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Check that only whitespace follows the completed root value.
    pub fn finish(&mut self) -> Result<(), JsonError> {
        if self.depth != 0 || self.token.kind == TokenKind::None {
            return Err(JsonError::UnexpectedEnd);
        }
        self.skip_whitespace();
        if self.pos != self.json.len() {
            return Err(JsonError::TrailingCharacters);
        }
        Ok(())
    }

    fn after_value(&mut self) -> Result<(), JsonError> {
        if self.depth == 0 {
            return if self.pos == self.json.len() {
                Err(JsonError::ReaderDone)
            } else {
                Err(JsonError::TrailingCharacters)
            };
        }
        let in_object = self.in_object();
        match self.peek()? {
            b',' => {
                self.pos += 1;
                self.skip_whitespace();
                if in_object {
                    self.read_property_name()
                } else {
                    self.read_value()
                }
            }
            b'}' if in_object => self.end_container(true),
            b']' if !in_object => self.end_container(false),
            _ => Err(JsonError::UnexpectedChar),
        }
    }

    fn in_object(&self) -> bool {
        self.depth > 0 && self.containers & (1u64 << (self.depth - 1)) != 0
    }

    fn peek(&self) -> Result<u8, JsonError> {
        self.json
            .get(self.pos)
            .copied()
            .ok_or(JsonError::UnexpectedEnd)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.json.get(self.pos) {
            self.pos += 1;
        }
    }

    fn set_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.token = JsonToken::new(kind, &self.json[start..end]);
        self.token_start = start;
    }

    fn begin_container(&mut self, object: bool) -> Result<(), JsonError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(JsonError::DepthExceeded);
        }
        if object {
            self.containers |= 1u64 << self.depth;
        } else {
            self.containers &= !(1u64 << self.depth);
        }
        self.depth += 1;
        let start = self.pos;
        self.pos += 1;
        let kind = if object {
            TokenKind::BeginObject
        } else {
            TokenKind::BeginArray
        };
        self.set_token(kind, start, self.pos);
        Ok(())
    }

    fn end_container(&mut self, object: bool) -> Result<(), JsonError> {
        self.depth -= 1;
        let start = self.pos;
        self.pos += 1;
        let kind = if object {
            TokenKind::EndObject
        } else {
            TokenKind::EndArray
        };
        self.set_token(kind, start, self.pos);
        Ok(())
    }

    fn read_value(&mut self) -> Result<(), JsonError> {
        match self.peek()? {
            b'{' => self.begin_container(true),
            b'[' => self.begin_container(false),
            b'"' => self.read_string(TokenKind::String),
            b't' => self.read_literal(b"true", TokenKind::True),
            b'f' => self.read_literal(b"false", TokenKind::False),
            b'n' => self.read_literal(b"null", TokenKind::Null),
            b'-' | b'0'..=b'9' => self.read_number(),
            _ => Err(JsonError::UnexpectedChar),
        }
    }

    fn read_property_name(&mut self) -> Result<(), JsonError> {
        if self.peek()? != b'"' {
            return Err(JsonError::UnexpectedChar);
        }
        self.read_string(TokenKind::PropertyName)
    }

    fn read_string(&mut self, kind: TokenKind) -> Result<(), JsonError> {
        let quote = self.pos;
        let start = quote + 1;
        let mut i = start;
        let mut has_escape = false;
        loop {
            let b = *self.json.get(i).ok_or(JsonError::UnexpectedEnd)?;
            match b {
                b'"' => break,
                b'\\' => {
                    has_escape = true;
                    let esc = *self.json.get(i + 1).ok_or(JsonError::UnexpectedEnd)?;
                    match esc {
                        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => i += 2,
                        b'u' => {
                            let hex = self
                                .json
                                .get(i + 2..i + 6)
                                .ok_or(JsonError::UnexpectedEnd)?;
                            if !hex.iter().all(u8::is_ascii_hexdigit) {
                                return Err(JsonError::InvalidEscape);
                            }
                            i += 6;
                        }
                        _ => return Err(JsonError::InvalidEscape),
                    }
                }
                0x00..=0x1F => return Err(JsonError::UnexpectedChar),
                _ => i += 1,
            }
        }
        // Escapes are ASCII, so the raw bytes must already be UTF-8.
        core::str::from_utf8(&self.json[start..i]).map_err(|_| JsonError::InvalidUtf8)?;
        self.token = JsonToken {
            kind,
            slice: &self.json[start..i],
            has_escape,
        };
        self.token_start = quote;
        self.pos = i + 1;
        Ok(())
    }

    fn read_literal(&mut self, literal: &[u8], kind: TokenKind) -> Result<(), JsonError> {
        let start = self.pos;
        let rest = &self.json[start..];
        if rest.starts_with(literal) {
            self.pos += literal.len();
            self.set_token(kind, start, self.pos);
            Ok(())
        } else if literal.starts_with(rest) {
            Err(JsonError::UnexpectedEnd)
        } else {
            Err(JsonError::UnexpectedChar)
        }
    }

    fn read_number(&mut self) -> Result<(), JsonError> {
        let start = self.pos;
        let mut i = start;
        if self.json.get(i) == Some(&b'-') {
            i += 1;
        }
        match self.json.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i = self.skip_digits(i),
            Some(_) => return Err(JsonError::UnexpectedChar),
            None => return Err(JsonError::UnexpectedEnd),
        }
        if self.json.get(i) == Some(&b'.') {
            i = self.require_digits(i + 1)?;
        }
        if let Some(b'e' | b'E') = self.json.get(i) {
            i += 1;
            if let Some(b'+' | b'-') = self.json.get(i) {
                i += 1;
            }
            i = self.require_digits(i)?;
        }
        self.pos = i;
        self.set_token(TokenKind::Number, start, i);
        Ok(())
    }

    fn skip_digits(&self, mut i: usize) -> usize {
        while let Some(b'0'..=b'9') = self.json.get(i) {
            i += 1;
        }
        i
    }

    fn require_digits(&self, i: usize) -> Result<usize, JsonError> {
        match self.json.get(i) {
            Some(b'0'..=b'9') => Ok(self.skip_digits(i)),
            Some(_) => Err(JsonError::UnexpectedChar),
            None => Err(JsonError::UnexpectedEnd),
        }
    }
}
