//! A network abstraction layer for embedded systems
//!
//! The traits here describe a byte-stream connection in the smallest terms a
//! protocol client needs. The crate ships one client on top of them, the
//! MQTT 3.1.1 client in [`application::mqtt`], which is enough to carry the
//! hub topics and payloads the rest of the crate formats.
//!

#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Application layer protocol clients
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connect, Connection, Read, Write};
}

/// Read bytes from a connection.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection.
    ///
    /// `Ok(0)` means no data is available right now.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Write bytes to a connection.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Close a connection, consuming it.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}
