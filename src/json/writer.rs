//! Append-only JSON writer over a fixed buffer.

use crate::buffer::BufWriter;
use crate::error::Error;
use core::fmt::Write as _;
use serde::Serialize;

/// Largest number of fractional digits [`JsonWriter::f64`] will emit.
pub const MAX_FRACTIONAL_DIGITS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Begin,
    Name,
    Value,
}

/// Builds a JSON document into a caller-supplied buffer.
///
/// Separators are inserted automatically. The writer does not check that
/// names and values alternate correctly inside objects; that is up to the
/// caller, in the same way the PnP component helpers rely on it.
pub struct JsonWriter<'b> {
    out: BufWriter<'b>,
    last: Last,
    depth: usize,
}

impl<'b> JsonWriter<'b> {
    /// Create a writer that starts at the beginning of `buf`.
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self {
            out: BufWriter::new(buf),
            last: Last::Start,
            depth: 0,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.out.len() == 0
    }

    /// The document written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.out.written()
    }

    /// The document written so far, as text.
    pub fn as_str(&self) -> &str {
        // Only `&str` input and ASCII punctuation are ever written.
        core::str::from_utf8(self.out.written()).unwrap_or_default()
    }

    fn separator(&mut self) -> Result<(), Error> {
        if self.last == Last::Value {
            self.out.push_byte(b',')?;
        }
        Ok(())
    }

    fn begin(&mut self, open: u8) -> Result<(), Error> {
        self.separator()?;
        self.out.push_byte(open)?;
        self.depth += 1;
        self.last = Last::Begin;
        Ok(())
    }

    fn end(&mut self, close: u8) -> Result<(), Error> {
        if self.depth == 0 || self.last == Last::Name {
            return Err(Error::InvalidArgument);
        }
        self.out.push_byte(close)?;
        self.depth -= 1;
        self.last = Last::Value;
        Ok(())
    }

    /// `{`
    pub fn begin_object(&mut self) -> Result<(), Error> {
        self.begin(b'{')
    }

    /// `}`
    pub fn end_object(&mut self) -> Result<(), Error> {
        self.end(b'}')
    }

    /// `[`
    pub fn begin_array(&mut self) -> Result<(), Error> {
        self.begin(b'[')
    }

    /// `]`
    pub fn end_array(&mut self) -> Result<(), Error> {
        self.end(b']')
    }

    /// Write `"name":`.
    pub fn property_name(&mut self, name: &str) -> Result<(), Error> {
        self.separator()?;
        self.push_quoted(name)?;
        self.out.push_byte(b':')?;
        self.last = Last::Name;
        Ok(())
    }

    /// Write a string value, escaping as required.
    pub fn string(&mut self, value: &str) -> Result<(), Error> {
        self.separator()?;
        self.push_quoted(value)?;
        self.last = Last::Value;
        Ok(())
    }

    /// Write a signed integer value.
    pub fn i32(&mut self, value: i32) -> Result<(), Error> {
        self.separator()?;
        if value < 0 {
            self.out.push_byte(b'-')?;
        }
        self.out.push_u32(value.unsigned_abs())?;
        self.last = Last::Value;
        Ok(())
    }

    /// Write an unsigned integer value.
    pub fn u32(&mut self, value: u32) -> Result<(), Error> {
        self.separator()?;
        self.out.push_u32(value)?;
        self.last = Last::Value;
        Ok(())
    }

    /// Write a floating point value with at most `fractional_digits` digits
    /// after the decimal point. Trailing zeros are trimmed.
    ///
    /// NaN and infinities have no JSON representation and are rejected.
    pub fn f64(&mut self, value: f64, fractional_digits: usize) -> Result<(), Error> {
        if !value.is_finite() {
            return Err(Error::InvalidArgument);
        }
        let digits = fractional_digits.min(MAX_FRACTIONAL_DIGITS);
        let mut text: heapless::String<48> = heapless::String::new();
        if value.abs() >= 1e17 {
            write!(text, "{:e}", value).map_err(|_| Error::BufferTooSmall)?;
        } else {
            write!(text, "{:.*}", digits, value).map_err(|_| Error::BufferTooSmall)?;
        }
        let mut trimmed = text.as_str();
        if trimmed.contains('.') && !trimmed.contains('e') {
            trimmed = trimmed.trim_end_matches('0').trim_end_matches('.');
        }
        if trimmed == "-0" {
            trimmed = "0";
        }
        self.separator()?;
        self.out.push_str(trimmed)?;
        self.last = Last::Value;
        Ok(())
    }

    /// Write `true` or `false`.
    pub fn bool(&mut self, value: bool) -> Result<(), Error> {
        self.separator()?;
        self.out.push_str(if value { "true" } else { "false" })?;
        self.last = Last::Value;
        Ok(())
    }

    /// Write `null`.
    pub fn null(&mut self) -> Result<(), Error> {
        self.separator()?;
        self.out.push_str("null")?;
        self.last = Last::Value;
        Ok(())
    }

    /// Append an already serialized JSON value verbatim.
    pub fn raw_value(&mut self, json: &[u8]) -> Result<(), Error> {
        if json.is_empty() {
            return Err(Error::InvalidArgument);
        }
        self.separator()?;
        self.out.push_bytes(json)?;
        self.last = Last::Value;
        Ok(())
    }

    /// Serialize any `serde` value in place with `serde-json-core`.
    pub fn value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.separator()?;
        let n = serde_json_core::to_slice(value, self.out.remaining_mut())
            .map_err(|_| Error::BufferTooSmall)?;
        self.out.advance(n)?;
        self.last = Last::Value;
        Ok(())
    }

    fn push_quoted(&mut self, s: &str) -> Result<(), Error> {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        self.out.push_byte(b'"')?;
        for &b in s.as_bytes() {
            match b {
                b'"' => self.out.push_str("\\\"")?,
                b'\\' => self.out.push_str("\\\\")?,
                b'\n' => self.out.push_str("\\n")?,
                b'\r' => self.out.push_str("\\r")?,
                b'\t' => self.out.push_str("\\t")?,
                0x08 => self.out.push_str("\\b")?,
                0x0C => self.out.push_str("\\f")?,
                0x00..=0x1F => self.out.push_bytes(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(b >> 4) as usize],
                    HEX[(b & 0x0F) as usize],
                ])?,
                _ => self.out.push_byte(b)?,
            }
        }
        self.out.push_byte(b'"')
    }
}

impl core::fmt::Debug for JsonWriter<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsonWriter")
            .field("json", &self.as_str())
            .field("depth", &self.depth)
            .finish()
    }
}
