//! # Plug and Play conventions
//!
//! A PnP device is described by a model id and split into named components.
//! On the wire this adds a handful of conventions on top of the plain hub
//! topics:
//!
//! - telemetry from a component carries a `$.sub={component}` message property
//! - commands addressed to a component arrive as `{component}*{command}`
//! - component sections of the twin are objects tagged with `"__t":"c"`
//! - writable properties are acknowledged with `{"ac","av","ad","value"}`
//!
//! [`PnpClient`] wraps a [`HubClient`] with those conventions, and
//! [`TwinPropertyReader`] walks twin documents attributing each property to
//! its component.
//!
//! ```
//! use libiot_pnp::pnp::{PnpClient, PnpClientOptions};
//!
//! let client = PnpClient::new(
//!     "contoso.azure-devices.net",
//!     "thermostat-01",
//!     "dtmi:com:example:TemperatureController;1",
//!     PnpClientOptions::default(),
//! )?;
//!
//! let mut topic = [0u8; 128];
//! let n = client.telemetry_publish_topic(Some("thermostat1"), None, &mut topic)?;
//! assert_eq!(
//!     &topic[..n],
//!     b"devices/thermostat-01/messages/events/$.sub=thermostat1"
//! );
//! # Ok::<(), libiot_pnp::error::Error>(())
//! ```

mod commands;
mod property;
mod telemetry;
mod twin;

pub use commands::CommandRequest;
pub use property::{TwinPayload, TwinProperty, TwinPropertyReader, TwinSection};

pub use crate::hub::{
    MessageProperties, Status, TWIN_PATCH_SUBSCRIBE_TOPIC, TWIN_RESPONSE_SUBSCRIBE_TOPIC,
    TwinResponse, TwinResponseType,
};

use crate::error::Error;
use crate::hub::{HubClient, HubClientOptions};

/// Topic filter for command requests.
pub const COMMANDS_SUBSCRIBE_TOPIC: &str = crate::hub::METHODS_SUBSCRIBE_TOPIC;

/// Key that marks a twin object as a component.
pub const COMPONENT_PROPERTY_LABEL_NAME: &str = "__t";
/// Value of the component marker.
pub const COMPONENT_PROPERTY_LABEL_VALUE: &str = "c";
/// Telemetry message property naming the sending component.
pub const COMPONENT_TELEMETRY_PROPERTY: &str = "$.sub";
/// Separates component and command in a command name.
pub const COMMAND_COMPONENT_SEPARATOR: char = '*';

/// Key holding the version number of a twin section.
pub const TWIN_VERSION_NAME: &str = "$version";
/// Twin section written by the service.
pub const TWIN_DESIRED_NAME: &str = "desired";
/// Twin section written by the device.
pub const TWIN_REPORTED_NAME: &str = "reported";

/// Acknowledgement status code in a property-with-status object.
pub const ACK_CODE_NAME: &str = "ac";
/// Acknowledged desired version in a property-with-status object.
pub const ACK_VERSION_NAME: &str = "av";
/// Optional human readable acknowledgement text.
pub const ACK_DESCRIPTION_NAME: &str = "ad";
/// The property value inside a property-with-status object.
pub const VALUE_NAME: &str = "value";

/// Optional settings for [`PnpClient`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PnpClientOptions<'a> {
    /// Module identity, when the PnP device is a module.
    pub module_id: Option<&'a str>,
    /// Free-form `key=value` string appended to the user name.
    pub user_agent: Option<&'a str>,
}

/// Topic and payload formatter for a PnP device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnpClient<'a> {
    hub: HubClient<'a>,
}

impl<'a> PnpClient<'a> {
    /// Bind a formatter to a device and its root model id.
    pub fn new(
        hostname: &'a str,
        device_id: &'a str,
        model_id: &'a str,
        options: PnpClientOptions<'a>,
    ) -> Result<Self, Error> {
        if model_id.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let hub = HubClient::new(
            hostname,
            device_id,
            HubClientOptions {
                module_id: options.module_id,
                user_agent: options.user_agent,
                model_id: Some(model_id),
            },
        )?;
        Ok(Self { hub })
    }

    /// The underlying hub formatter.
    pub fn hub(&self) -> &HubClient<'a> {
        &self.hub
    }

    /// The root model id.
    pub fn model_id(&self) -> &'a str {
        self.hub.options().model_id.unwrap_or_default()
    }

    /// See [`HubClient::client_id`].
    pub fn client_id(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.hub.client_id(buf)
    }

    /// See [`HubClient::user_name`]. Always carries `model-id`.
    pub fn user_name(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.hub.user_name(buf)
    }

    /// See [`HubClient::sas_signature`].
    pub fn sas_signature(&self, expiry: u64, buf: &mut [u8]) -> Result<usize, Error> {
        self.hub.sas_signature(expiry, buf)
    }

    /// See [`HubClient::sas_password`].
    pub fn sas_password(
        &self,
        base64_signature: &str,
        expiry: u64,
        key_name: Option<&str>,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        self.hub.sas_password(base64_signature, expiry, key_name, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_model_id() {
        assert_eq!(
            PnpClient::new("h", "d", "", PnpClientOptions::default()).unwrap_err(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn test_user_name_has_model_id() {
        let client = PnpClient::new(
            "h.azure-devices.net",
            "d",
            "dtmi:com:example:Thermostat;1",
            PnpClientOptions::default(),
        )
        .unwrap();
        let mut buf = [0u8; 128];
        let n = client.user_name(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            b"h.azure-devices.net/d/?api-version=2020-09-30&model-id=dtmi%3Acom%3Aexample%3AThermostat%3B1"
                .as_slice()
        );
        assert_eq!(client.model_id(), "dtmi:com:example:Thermostat;1");
    }
}
