use super::{COMPONENT_TELEMETRY_PROPERTY, PnpClient};
use crate::error::Error;
use crate::hub::MessageProperties;

impl PnpClient<'_> {
    /// Telemetry topic, tagged with `$.sub={component}` for component
    /// telemetry.
    ///
    /// The component tag is written after the caller's properties directly
    /// into `buf`; `properties` itself is not modified.
    pub fn telemetry_publish_topic(
        &self,
        component: Option<&str>,
        properties: Option<&MessageProperties<'_>>,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        if component == Some("") {
            return Err(Error::InvalidArgument);
        }
        let extra = component.map(|c| (COMPONENT_TELEMETRY_PROPERTY, c));
        self.hub.telemetry_topic_with(properties, extra, buf)
    }
}
