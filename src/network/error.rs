//! Common error types for network operations

use core::fmt;

/// A common error type for network operations.
///
/// Transport and protocol failures are kept apart from
/// [`crate::error::Error`], which only describes formatting and parsing.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// The broker refused the connection. Carries the CONNACK return code.
    ConnectionRefused(u8),
    /// A timeout occurred.
    Timeout,
    /// The connection was closed.
    ConnectionClosed,
    /// An invalid address was provided.
    InvalidAddress,
    /// A protocol-specific error occurred.
    ProtocolError,
    /// A packet does not fit the client's fixed buffers.
    PacketTooLarge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotOpen => f.write_str("connection not open"),
            Error::WriteError => f.write_str("write failed"),
            Error::ReadError => f.write_str("read failed"),
            Error::ConnectionRefused(code) => write!(f, "connection refused ({})", code),
            Error::Timeout => f.write_str("timed out"),
            Error::ConnectionClosed => f.write_str("connection closed"),
            Error::InvalidAddress => f.write_str("invalid address"),
            Error::ProtocolError => f.write_str("protocol error"),
            Error::PacketTooLarge => f.write_str("packet too large"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused(code) => defmt::write!(f, "ConnectionRefused({})", code),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::PacketTooLarge => defmt::write!(f, "PacketTooLarge"),
        }
    }
}
