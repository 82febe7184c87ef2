use super::{
    ACK_CODE_NAME, ACK_DESCRIPTION_NAME, ACK_VERSION_NAME, COMPONENT_PROPERTY_LABEL_NAME,
    COMPONENT_PROPERTY_LABEL_VALUE, PnpClient, VALUE_NAME,
};
use crate::error::Error;
use crate::hub::{Status, TwinResponse};
use crate::json::JsonWriter;

impl PnpClient<'_> {
    /// Parse a topic received on the twin subscriptions. See
    /// [`crate::hub::HubClient::twin_parse_received_topic`].
    pub fn twin_parse_received_topic<'t>(&self, topic: &'t str) -> Result<TwinResponse<'t>, Error> {
        self.hub.twin_parse_received_topic(topic)
    }

    /// `$iothub/twin/GET/?$rid={request_id}`
    pub fn twin_document_get_publish_topic(
        &self,
        request_id: &str,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        self.hub.twin_document_get_publish_topic(request_id, buf)
    }

    /// `$iothub/twin/PATCH/properties/reported/?$rid={request_id}`
    pub fn twin_patch_publish_topic(&self, request_id: &str, buf: &mut [u8]) -> Result<usize, Error> {
        self.hub.twin_patch_get_publish_topic(request_id, buf)
    }

    /// Open a component inside a reported-properties object:
    /// `"{component}":{"__t":"c"`.
    ///
    /// Follow with property names and values, then
    /// [`Self::twin_property_end_component`].
    pub fn twin_property_begin_component(
        &self,
        writer: &mut JsonWriter<'_>,
        component: &str,
    ) -> Result<(), Error> {
        if component.is_empty() {
            return Err(Error::InvalidArgument);
        }
        writer.property_name(component)?;
        writer.begin_object()?;
        writer.property_name(COMPONENT_PROPERTY_LABEL_NAME)?;
        writer.string(COMPONENT_PROPERTY_LABEL_VALUE)
    }

    /// Close a component opened with [`Self::twin_property_begin_component`].
    pub fn twin_property_end_component(&self, writer: &mut JsonWriter<'_>) -> Result<(), Error> {
        writer.end_object()
    }

    /// Open the acknowledgement of a writable property:
    ///
    /// ```text
    /// ["{component}":{"__t":"c",]"{name}":{"ac":{code},"av":{version},["ad":"{description}",]"value":
    /// ```
    ///
    /// The caller writes the value next and then calls
    /// [`Self::twin_end_property_with_status`] with the same `component`.
    pub fn twin_begin_property_with_status(
        &self,
        writer: &mut JsonWriter<'_>,
        component: Option<&str>,
        name: &str,
        ack_code: Status,
        ack_version: u32,
        ack_description: Option<&str>,
    ) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if let Some(component) = component {
            self.twin_property_begin_component(writer, component)?;
        }
        writer.property_name(name)?;
        writer.begin_object()?;
        writer.property_name(ACK_CODE_NAME)?;
        writer.u32(u32::from(ack_code.0))?;
        writer.property_name(ACK_VERSION_NAME)?;
        writer.u32(ack_version)?;
        if let Some(description) = ack_description {
            writer.property_name(ACK_DESCRIPTION_NAME)?;
            writer.string(description)?;
        }
        writer.property_name(VALUE_NAME)
    }

    /// Close what [`Self::twin_begin_property_with_status`] opened.
    pub fn twin_end_property_with_status(
        &self,
        writer: &mut JsonWriter<'_>,
        component: Option<&str>,
    ) -> Result<(), Error> {
        writer.end_object()?;
        if component.is_some() {
            writer.end_object()?;
        }
        Ok(())
    }
}
