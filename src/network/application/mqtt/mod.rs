//! MQTT 3.1.1 protocol implementation for embedded systems.
//!
//! A small synchronous client: CONNECT with optional credentials, PUBLISH at
//! QoS 0 or 1, SUBSCRIBE, PINGREQ and a `poll` that hands back incoming
//! PUBLISH packets. It is what the PnP sample needs to talk to IoT Hub and
//! nothing more; retries and reconnects are left to the caller.
//!
//! ```rust,no_run
//! use libiot_pnp::network::application::mqtt::{Client, Options, QoS};
//! # use libiot_pnp::network::Connection;
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl libiot_pnp::network::Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl libiot_pnp::network::Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl libiot_pnp::network::Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let connection = MockConnection;
//! let options = Options {
//!     client_id: "thermostat-01",
//!     keep_alive_seconds: 60,
//!     clean_session: true,
//!     username: Some("contoso.azure-devices.net/thermostat-01/?api-version=2020-09-30"),
//!     password: Some(b"SharedAccessSignature sr=..."),
//! };
//!
//! let mut client = Client::connect(connection, options)?;
//! client.subscribe("$iothub/methods/POST/#", QoS::AtMostOnce)?;
//! client.publish("devices/thermostat-01/messages/events/", b"{}", QoS::AtLeastOnce)?;
//! # Ok::<(), libiot_pnp::network::error::Error>(())
//! ```

/// MQTT client implementation and supporting types.
pub mod client;

pub use client::{Client, Options, PAYLOAD_CAPACITY, PublishPacket, QoS, TOPIC_CAPACITY};
