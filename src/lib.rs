//! # libiot-pnp - IoT Hub Plug and Play for embedded devices
//!
//! Formats and parses the MQTT topics and JSON payloads a device exchanges
//! with Azure IoT Hub, including the Plug and Play (PnP) conventions for
//! multi-component devices. Everything writes into caller-provided buffers;
//! the crate never allocates and supports `no_std` environments.
//!
//! ## Features
//!
//! ### Hub topics
//! - Client id, MQTT user name and SAS token strings
//! - Telemetry topics carrying message properties
//! - Direct method request parsing and response topics
//! - Twin GET/PATCH topics and twin response parsing
//!
//! ### Plug and Play
//! - Component-scoped telemetry and commands
//! - Reported property builders with the `"__t":"c"` component marker
//! - Writable property acknowledgements with status and version
//! - A twin document walker that attributes each property to its component
//!
//! ### JSON
//! - A pull reader and a streaming writer over borrowed byte slices
//! - `serde` values through `serde-json-core`
//!
//! ### Network
//! - A minimal MQTT 3.1.1 client over any [`network::Connection`]
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libiot-pnp = "0.1.0"
//! ```
//!
//! ### Reporting a property
//!
//! ```rust
//! use libiot_pnp::json::JsonWriter;
//! use libiot_pnp::pnp::{PnpClient, PnpClientOptions};
//!
//! let client = PnpClient::new(
//!     "contoso.azure-devices.net",
//!     "thermostat-01",
//!     "dtmi:com:example:TemperatureController;2",
//!     PnpClientOptions::default(),
//! )?;
//!
//! let mut topic = [0u8; 128];
//! let n = client.twin_patch_publish_topic("7", &mut topic)?;
//! assert_eq!(&topic[..n], b"$iothub/twin/PATCH/properties/reported/?$rid=7");
//!
//! let mut payload = [0u8; 128];
//! let mut writer = JsonWriter::new(&mut payload);
//! writer.begin_object()?;
//! client.twin_property_begin_component(&mut writer, "thermostat1")?;
//! writer.property_name("maxTempSinceLastReboot")?;
//! writer.f64(22.5, 2)?;
//! client.twin_property_end_component(&mut writer)?;
//! writer.end_object()?;
//! assert_eq!(
//!     writer.as_str(),
//!     r#"{"thermostat1":{"__t":"c","maxTempSinceLastReboot":22.5}}"#
//! );
//! # Ok::<(), libiot_pnp::error::Error>(())
//! ```
//!
//! ### Walking a desired-properties patch
//!
//! ```rust
//! use libiot_pnp::pnp::{TwinPayload, TwinPropertyReader};
//!
//! let patch = br#"{"thermostat1":{"__t":"c","targetTemperature":23.5},"$version":4}"#;
//! let components = ["thermostat1", "thermostat2"];
//!
//! let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &components)?;
//! assert_eq!(reader.version(), Some(4));
//!
//! let property = reader.next_property()?.unwrap();
//! assert_eq!(property.component, Some("thermostat1"));
//! assert!(property.name.is_text_equal("targetTemperature"));
//! assert_eq!(property.value.get_f64()?, 23.5);
//! assert!(reader.next_property()?.is_none());
//! # Ok::<(), libiot_pnp::error::Error>(())
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging
//! - `log`: Route the crate's diagnostics through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![doc(html_root_url = "https://shishir-dey.github.io/libiot/")]

// This mod MUST go first, so that the others see its macros.
mod fmt;

mod buffer;

/// Error types shared by the topic, payload and JSON operations.
pub mod error;

/// Streaming JSON reader and writer over borrowed buffers.
pub mod json;

/// IoT Hub MQTT topics, user names and SAS tokens.
///
/// These are the plain hub conventions without any Plug and Play additions.
pub mod hub;

/// Plug and Play conventions layered on top of [`hub`].
pub mod pnp;

/// Network abstraction layer and the MQTT client used to reach the hub.
pub mod network;
