//! Common error types for topic and payload operations

use core::fmt;

/// Why a JSON document was rejected.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum JsonError {
    /// The input ended in the middle of a token or before the root value closed.
    UnexpectedEnd,
    /// A byte that cannot start or continue the expected token.
    UnexpectedChar,
    /// A well-formed token of the wrong kind for the requested operation.
    UnexpectedToken,
    /// A number token that does not fit the requested numeric type.
    InvalidNumber,
    /// A malformed `\` escape sequence inside a string.
    InvalidEscape,
    /// String content that is not valid UTF-8 once unescaped.
    InvalidUtf8,
    /// Objects and arrays nested deeper than [`crate::json::MAX_NESTING_DEPTH`].
    DepthExceeded,
    /// Non-whitespace content after the root value.
    TrailingCharacters,
    /// The reader already returned the end of the root value.
    ReaderDone,
}

/// The error type shared by every topic, payload and JSON operation.
///
/// Only two conditions are meant to be branched on by callers:
/// [`Error::BufferTooSmall`] and [`Error::TopicNoMatch`]. Everything else
/// that is wrong with received data collapses into [`Error::Json`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The output buffer cannot hold the formatted topic or payload.
    BufferTooSmall,
    /// A received topic does not follow the expected template.
    TopicNoMatch,
    /// A JSON document is malformed, truncated, or has an unexpected shape.
    Json(JsonError),
    /// A required element was not present in a well-formed document.
    ItemNotFound,
    /// A required input was empty or otherwise unusable.
    InvalidArgument,
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Json(err)
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            JsonError::UnexpectedEnd => "unexpected end of input",
            JsonError::UnexpectedChar => "unexpected character",
            JsonError::UnexpectedToken => "unexpected token",
            JsonError::InvalidNumber => "invalid number",
            JsonError::InvalidEscape => "invalid escape sequence",
            JsonError::InvalidUtf8 => "invalid utf-8",
            JsonError::DepthExceeded => "nesting too deep",
            JsonError::TrailingCharacters => "trailing characters",
            JsonError::ReaderDone => "reader done",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall => f.write_str("buffer too small"),
            Error::TopicNoMatch => f.write_str("topic does not match"),
            Error::Json(err) => write!(f, "json: {}", err),
            Error::ItemNotFound => f.write_str("item not found"),
            Error::InvalidArgument => f.write_str("invalid argument"),
        }
    }
}

impl core::error::Error for JsonError {}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for JsonError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            JsonError::UnexpectedEnd => defmt::write!(f, "UnexpectedEnd"),
            JsonError::UnexpectedChar => defmt::write!(f, "UnexpectedChar"),
            JsonError::UnexpectedToken => defmt::write!(f, "UnexpectedToken"),
            JsonError::InvalidNumber => defmt::write!(f, "InvalidNumber"),
            JsonError::InvalidEscape => defmt::write!(f, "InvalidEscape"),
            JsonError::InvalidUtf8 => defmt::write!(f, "InvalidUtf8"),
            JsonError::DepthExceeded => defmt::write!(f, "DepthExceeded"),
            JsonError::TrailingCharacters => defmt::write!(f, "TrailingCharacters"),
            JsonError::ReaderDone => defmt::write!(f, "ReaderDone"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::BufferTooSmall => defmt::write!(f, "BufferTooSmall"),
            Error::TopicNoMatch => defmt::write!(f, "TopicNoMatch"),
            Error::Json(err) => defmt::write!(f, "Json({})", err),
            Error::ItemNotFound => defmt::write!(f, "ItemNotFound"),
            Error::InvalidArgument => defmt::write!(f, "InvalidArgument"),
        }
    }
}
