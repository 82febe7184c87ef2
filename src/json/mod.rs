//! # Minimal JSON reader and writer
//!
//! Twin documents and command payloads arrive as raw bytes and have to be
//! walked token by token: the component a property belongs to depends on
//! where it sits in the document, which a deserializer into a fixed struct
//! cannot express. [`JsonReader`] is a forward-only pull tokenizer for that.
//!
//! [`JsonWriter`] builds reported-property and command-response payloads
//! into a caller buffer. Fixed-shape payloads can instead go through
//! [`JsonWriter::value`], which hands a `serde::Serialize` value to
//! `serde-json-core`.
//!
//! ```
//! use libiot_pnp::json::{JsonReader, JsonWriter, TokenKind};
//!
//! let mut buf = [0u8; 64];
//! let mut w = JsonWriter::new(&mut buf);
//! w.begin_object().unwrap();
//! w.property_name("targetTemperature").unwrap();
//! w.f64(21.5, 2).unwrap();
//! w.end_object().unwrap();
//! assert_eq!(w.as_str(), r#"{"targetTemperature":21.5}"#);
//!
//! let mut r = JsonReader::new(br#"{"targetTemperature":21.5}"#);
//! r.next_token().unwrap();
//! r.next_token().unwrap();
//! assert_eq!(r.token().kind, TokenKind::PropertyName);
//! r.next_token().unwrap();
//! assert_eq!(r.token().get_f64().unwrap(), 21.5);
//! ```

mod reader;
mod writer;

pub use reader::{JsonReader, JsonToken, TokenKind};
pub use writer::{JsonWriter, MAX_FRACTIONAL_DIGITS};

/// Deepest nesting of objects and arrays the reader accepts.
pub const MAX_NESTING_DEPTH: usize = 64;
