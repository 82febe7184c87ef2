//! # IoT Hub MQTT topic grammar
//!
//! [`HubClient`] formats the MQTT identity strings (client id, user name,
//! SAS token) and the topic names a device publishes to, and parses the
//! topics the hub publishes back. It does no I/O: every builder writes into
//! a caller buffer and returns the number of bytes written, and every parser
//! borrows its results from the received topic.
//!
//! ## Topic templates
//!
//! | Direction | Topic |
//! |-----------|-------|
//! | publish   | `devices/{device}[/modules/{module}]/messages/events/{properties}` |
//! | publish   | `$iothub/twin/GET/?$rid={rid}` |
//! | publish   | `$iothub/twin/PATCH/properties/reported/?$rid={rid}` |
//! | publish   | `$iothub/methods/res/{status}/?$rid={rid}` |
//! | receive   | `$iothub/methods/POST/{name}/?$rid={rid}` |
//! | receive   | `$iothub/twin/res/{status}/?$rid={rid}[&$version={v}]` |
//! | receive   | `$iothub/twin/PATCH/properties/desired/?$version={v}` |
//!
//! ```
//! use libiot_pnp::hub::{HubClient, HubClientOptions};
//!
//! let client = HubClient::new("contoso.azure-devices.net", "dev1", HubClientOptions::default())?;
//! let mut buf = [0u8; 64];
//! let n = client.twin_document_get_publish_topic("7", &mut buf)?;
//! assert_eq!(&buf[..n], b"$iothub/twin/GET/?$rid=7");
//! # Ok::<(), libiot_pnp::error::Error>(())
//! ```

mod methods;
mod properties;
mod sas;
mod status;
mod telemetry;
mod twin;

pub use methods::MethodRequest;
pub use properties::{MessageProperties, PropertyIter};
pub use sas::{decode_key, encode_signature};
pub use status::Status;
pub use twin::{TwinResponse, TwinResponseType};

use crate::buffer::BufWriter;
use crate::error::Error;

/// Service API version sent in the MQTT user name.
pub const API_VERSION: &str = "2020-09-30";

/// Topic filter for direct method requests.
pub const METHODS_SUBSCRIBE_TOPIC: &str = "$iothub/methods/POST/#";

/// Topic filter for responses to twin GET and reported PATCH requests.
pub const TWIN_RESPONSE_SUBSCRIBE_TOPIC: &str = "$iothub/twin/res/#";

/// Topic filter for desired property updates pushed by the service.
pub const TWIN_PATCH_SUBSCRIBE_TOPIC: &str = "$iothub/twin/PATCH/properties/desired/#";

/// HTTP path for MQTT over WebSockets.
pub const WEB_SOCKET_PATH: &str = "/$iothub/websocket";

/// HTTP path for MQTT over WebSockets when the device has no X.509 client
/// certificate.
pub const WEB_SOCKET_PATH_NO_X509_CLIENT_CERT: &str = "/$iothub/websocket?iothub-no-client-cert=true";

/// Largest topic any builder in this crate produces for typical identifiers.
/// Buffers of this size are enough for the samples and tests.
pub const TOPIC_CAPACITY: usize = 256;

/// Optional identity settings for [`HubClient`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubClientOptions<'a> {
    /// Module identity, for module twins and module telemetry.
    pub module_id: Option<&'a str>,
    /// Free-form `key=value` string appended to the user name.
    pub user_agent: Option<&'a str>,
    /// Digital twin model id announced in the user name.
    pub model_id: Option<&'a str>,
}

/// Topic formatter bound to one device identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubClient<'a> {
    hostname: &'a str,
    device_id: &'a str,
    options: HubClientOptions<'a>,
}

impl<'a> HubClient<'a> {
    /// Bind a formatter to `hostname` and `device_id`.
    ///
    /// Both must be non-empty. Empty optional fields are treated as absent.
    pub fn new(
        hostname: &'a str,
        device_id: &'a str,
        options: HubClientOptions<'a>,
    ) -> Result<Self, Error> {
        if hostname.is_empty() || device_id.is_empty() {
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            hostname,
            device_id,
            options: HubClientOptions {
                module_id: non_empty(options.module_id),
                user_agent: non_empty(options.user_agent),
                model_id: non_empty(options.model_id),
            },
        })
    }

    /// The hub host name.
    pub fn hostname(&self) -> &'a str {
        self.hostname
    }

    /// The device id.
    pub fn device_id(&self) -> &'a str {
        self.device_id
    }

    /// The options in effect, with empty strings normalized to `None`.
    pub fn options(&self) -> &HubClientOptions<'a> {
        &self.options
    }

    /// MQTT client id: `{device_id}[/{module_id}]`.
    pub fn client_id(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut w = BufWriter::new(buf);
        w.push_str(self.device_id)?;
        if let Some(module_id) = self.options.module_id {
            w.push_byte(b'/')?;
            w.push_str(module_id)?;
        }
        Ok(w.len())
    }

    /// MQTT user name.
    ///
    /// `{hostname}/{device_id}[/{module_id}]/?api-version=2020-09-30[&{user_agent}][&model-id={model_id}]`,
    /// with the model id percent-encoded.
    pub fn user_name(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut w = BufWriter::new(buf);
        w.push_str(self.hostname)?;
        w.push_byte(b'/')?;
        w.push_str(self.device_id)?;
        if let Some(module_id) = self.options.module_id {
            w.push_byte(b'/')?;
            w.push_str(module_id)?;
        }
        w.push_str("/?api-version=")?;
        w.push_str(API_VERSION)?;
        if let Some(user_agent) = self.options.user_agent {
            w.push_byte(b'&')?;
            w.push_str(user_agent)?;
        }
        if let Some(model_id) = self.options.model_id {
            w.push_str("&model-id=")?;
            w.push_url_encoded(model_id)?;
        }
        Ok(w.len())
    }

    /// `{hostname}/devices/{device_id}[/modules/{module_id}]`, percent-encoded.
    fn push_sas_resource(&self, w: &mut BufWriter<'_>) -> Result<(), Error> {
        w.push_url_encoded(self.hostname)?;
        w.push_url_encoded("/devices/")?;
        w.push_url_encoded(self.device_id)?;
        if let Some(module_id) = self.options.module_id {
            w.push_url_encoded("/modules/")?;
            w.push_url_encoded(module_id)?;
        }
        Ok(())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Strip `prefix` from `topic`, logging a mismatch.
fn strip_topic<'t>(topic: &'t str, prefix: &str) -> Option<&'t str> {
    let rest = topic.strip_prefix(prefix);
    if rest.is_none() {
        trace!("topic does not start with {}", prefix);
    }
    rest
}

/// Value of `key` in a `k=v&k=v` query string.
fn query_value<'t>(query: &'t str, key: &str) -> Option<&'t str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Decimal digits only, so `+1` and ` 1` are rejected.
fn parse_decimal<T: core::str::FromStr>(s: &str) -> Result<T, Error> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::TopicNoMatch);
    }
    s.parse().map_err(|_| Error::TopicNoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub(options: HubClientOptions<'static>) -> HubClient<'static> {
        HubClient::new("myiothub.azure-devices.net", "my_device", options).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_identity() {
        let options = HubClientOptions::default();
        assert_eq!(
            HubClient::new("", "dev", options).unwrap_err(),
            Error::InvalidArgument
        );
        assert_eq!(
            HubClient::new("host", "", options).unwrap_err(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn test_client_id() {
        let mut buf = [0u8; 32];
        let n = hub(HubClientOptions::default()).client_id(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"my_device");

        let with_module = hub(HubClientOptions {
            module_id: Some("my_module"),
            ..Default::default()
        });
        let n = with_module.client_id(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"my_device/my_module");
    }

    #[test]
    fn test_user_name_minimal() {
        let mut buf = [0u8; 128];
        let n = hub(HubClientOptions::default()).user_name(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            b"myiothub.azure-devices.net/my_device/?api-version=2020-09-30"
        );
    }

    #[test]
    fn test_user_name_all_options() {
        let client = hub(HubClientOptions {
            module_id: Some("my_module"),
            user_agent: Some("os=linux"),
            model_id: Some("dtmi:com:example:Thermostat;1"),
        });
        let mut buf = [0u8; 160];
        let n = client.user_name(&mut buf).unwrap();
        assert_eq!(
            core::str::from_utf8(&buf[..n]).unwrap(),
            "myiothub.azure-devices.net/my_device/my_module/?api-version=2020-09-30\
             &os=linux&model-id=dtmi%3Acom%3Aexample%3AThermostat%3B1"
        );
    }

    #[test]
    fn test_empty_options_are_absent() {
        let client = hub(HubClientOptions {
            module_id: Some(""),
            user_agent: Some(""),
            model_id: None,
        });
        assert_eq!(client.options(), &HubClientOptions::default());
    }

    #[test]
    fn test_user_name_buffer_too_small() {
        let mut buf = [0u8; 20];
        assert_eq!(
            hub(HubClientOptions::default()).user_name(&mut buf),
            Err(Error::BufferTooSmall)
        );
    }

    #[test]
    fn test_query_value() {
        assert_eq!(query_value("$rid=1&$version=4", "$version"), Some("4"));
        assert_eq!(query_value("$rid=1", "$version"), None);
        assert_eq!(query_value("$rid", "$rid"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal::<u16>("204"), Ok(204));
        assert_eq!(parse_decimal::<u16>("+204"), Err(Error::TopicNoMatch));
        assert_eq!(parse_decimal::<u16>(""), Err(Error::TopicNoMatch));
        assert_eq!(parse_decimal::<u16>("70000"), Err(Error::TopicNoMatch));
    }
}
