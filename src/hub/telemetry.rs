use super::{HubClient, MessageProperties};
use crate::buffer::BufWriter;
use crate::error::Error;

impl HubClient<'_> {
    /// Topic for device-to-cloud messages.
    ///
    /// `devices/{device_id}[/modules/{module_id}]/messages/events/[{properties}]`
    pub fn telemetry_publish_topic(
        &self,
        properties: Option<&MessageProperties<'_>>,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        self.telemetry_topic_with(properties, None, buf)
    }

    /// Like [`Self::telemetry_publish_topic`], with one extra `name=value`
    /// pair appended after the caller's properties.
    pub(crate) fn telemetry_topic_with(
        &self,
        properties: Option<&MessageProperties<'_>>,
        extra: Option<(&str, &str)>,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        let mut w = BufWriter::new(buf);
        w.push_str("devices/")?;
        w.push_str(self.device_id)?;
        if let Some(module_id) = self.options.module_id {
            w.push_str("/modules/")?;
            w.push_str(module_id)?;
        }
        w.push_str("/messages/events/")?;

        let mut has_properties = false;
        if let Some(properties) = properties.filter(|p| !p.is_empty()) {
            w.push_str(properties.as_str())?;
            has_properties = true;
        }
        if let Some((name, value)) = extra {
            if has_properties {
                w.push_byte(b'&')?;
            }
            w.push_str(name)?;
            w.push_byte(b'=')?;
            w.push_str(value)?;
        }
        Ok(w.len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::HubClientOptions;
    use super::*;

    #[test]
    fn test_topic_without_properties() {
        let client = HubClient::new("h", "my_device", HubClientOptions::default()).unwrap();
        let mut buf = [0u8; 64];
        let n = client.telemetry_publish_topic(None, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"devices/my_device/messages/events/");
    }

    #[test]
    fn test_topic_with_module_and_properties() {
        let client = HubClient::new(
            "h",
            "my_device",
            HubClientOptions {
                module_id: Some("my_module"),
                ..Default::default()
            },
        )
        .unwrap();
        let mut props_buf = [0u8; 32];
        let mut props = MessageProperties::new(&mut props_buf);
        props.append("key", "value").unwrap();

        let mut buf = [0u8; 96];
        let n = client
            .telemetry_topic_with(Some(&props), Some(("$.sub", "c1")), &mut buf)
            .unwrap();
        assert_eq!(
            &buf[..n],
            b"devices/my_device/modules/my_module/messages/events/key=value&$.sub=c1"
        );
        assert_eq!(props.as_str(), "key=value");
    }

    #[test]
    fn test_topic_buffer_too_small() {
        let client = HubClient::new("h", "my_device", HubClientOptions::default()).unwrap();
        let mut buf = [0u8; 33];
        assert_eq!(
            client.telemetry_publish_topic(None, &mut buf),
            Err(Error::BufferTooSmall)
        );
    }
}
