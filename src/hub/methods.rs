use super::{HubClient, Status, query_value, strip_topic};
use crate::buffer::BufWriter;
use crate::error::Error;

const METHODS_REQUEST_PREFIX: &str = "$iothub/methods/POST/";
const METHODS_RESPONSE_PREFIX: &str = "$iothub/methods/res/";

/// A direct method invocation parsed from its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRequest<'t> {
    /// Correlation id to echo in the response topic.
    pub request_id: &'t str,
    /// Method name as sent by the service.
    pub name: &'t str,
}

impl HubClient<'_> {
    /// `$iothub/methods/res/{status}/?$rid={request_id}`
    pub fn methods_response_publish_topic(
        &self,
        request_id: &str,
        status: Status,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        if request_id.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut w = BufWriter::new(buf);
        w.push_str(METHODS_RESPONSE_PREFIX)?;
        w.push_u32(u32::from(status.0))?;
        w.push_str("/?$rid=")?;
        w.push_str(request_id)?;
        Ok(w.len())
    }

    /// Parse `$iothub/methods/POST/{name}/?$rid={request_id}`.
    pub fn methods_parse_received_topic<'t>(
        &self,
        topic: &'t str,
    ) -> Result<MethodRequest<'t>, Error> {
        let rest = strip_topic(topic, METHODS_REQUEST_PREFIX).ok_or(Error::TopicNoMatch)?;
        let (name, query) = rest.split_once("/?").ok_or(Error::TopicNoMatch)?;
        if name.is_empty() {
            return Err(Error::TopicNoMatch);
        }
        let request_id = query_value(query, "$rid")
            .filter(|rid| !rid.is_empty())
            .ok_or(Error::TopicNoMatch)?;
        Ok(MethodRequest { request_id, name })
    }
}
