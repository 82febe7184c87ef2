//! # Application Layer Network Protocols
//!
//! Protocol clients that work with any type implementing
//! [`Connection`](crate::network::Connection). They use fixed-size buffers
//! and never allocate.

/// MQTT client implementation.
///
/// Provides an MQTT 3.1.1 client for lightweight publish-subscribe messaging,
/// with the username/password login IoT Hub requires.
pub mod mqtt;
