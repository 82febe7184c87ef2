use super::{HubClient, Status, parse_decimal, query_value, strip_topic};
use crate::buffer::BufWriter;
use crate::error::Error;

const TWIN_RESPONSE_PREFIX: &str = "$iothub/twin/res/";
const TWIN_PATCH_DESIRED_PREFIX: &str = "$iothub/twin/PATCH/properties/desired/";
const TWIN_GET_PREFIX: &str = "$iothub/twin/GET/?$rid=";
const TWIN_PATCH_REPORTED_PREFIX: &str = "$iothub/twin/PATCH/properties/reported/?$rid=";

/// What a received twin topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwinResponseType {
    /// The full twin document, in answer to a GET.
    Get,
    /// A desired-properties patch pushed by the service.
    DesiredProperties,
    /// The acknowledgement of a reported-properties PATCH.
    ReportedProperties,
}

/// A parsed twin topic. Borrows from the topic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwinResponse<'t> {
    /// Which kind of twin message this is.
    pub response_type: TwinResponseType,
    /// Service status. Always 200 for desired patches.
    pub status: Status,
    /// Correlation id of the request. Empty for desired patches.
    pub request_id: &'t str,
    /// Twin version, when the topic carries one.
    pub version: Option<u32>,
}

impl HubClient<'_> {
    /// `$iothub/twin/GET/?$rid={request_id}`
    pub fn twin_document_get_publish_topic(
        &self,
        request_id: &str,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        rid_topic(TWIN_GET_PREFIX, request_id, buf)
    }

    /// `$iothub/twin/PATCH/properties/reported/?$rid={request_id}`
    pub fn twin_patch_get_publish_topic(
        &self,
        request_id: &str,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        rid_topic(TWIN_PATCH_REPORTED_PREFIX, request_id, buf)
    }

    /// Parse a topic received on one of the twin subscriptions.
    ///
    /// Any topic that is not a twin response or desired patch yields
    /// [`Error::TopicNoMatch`], so callers can try each parser in turn.
    pub fn twin_parse_received_topic<'t>(&self, topic: &'t str) -> Result<TwinResponse<'t>, Error> {
        if let Some(rest) = topic.strip_prefix(TWIN_RESPONSE_PREFIX) {
            return parse_twin_response(rest);
        }
        let rest = strip_topic(topic, TWIN_PATCH_DESIRED_PREFIX).ok_or(Error::TopicNoMatch)?;
        let query = rest.strip_prefix('?').ok_or(Error::TopicNoMatch)?;
        let version = query_value(query, "$version").ok_or(Error::TopicNoMatch)?;
        Ok(TwinResponse {
            response_type: TwinResponseType::DesiredProperties,
            status: Status::OK,
            request_id: "",
            version: Some(parse_decimal(version)?),
        })
    }
}

/// `{status}/?$rid={rid}[&$version={v}]`
fn parse_twin_response(rest: &str) -> Result<TwinResponse<'_>, Error> {
    let (status, query) = rest.split_once("/?").ok_or(Error::TopicNoMatch)?;
    let status = Status(parse_decimal(status)?);
    let request_id = query_value(query, "$rid")
        .filter(|rid| !rid.is_empty())
        .ok_or(Error::TopicNoMatch)?;
    let version = query_value(query, "$version")
        .map(parse_decimal::<u32>)
        .transpose()?;
    let response_type = if status == Status::NO_CONTENT {
        TwinResponseType::ReportedProperties
    } else {
        TwinResponseType::Get
    };
    Ok(TwinResponse {
        response_type,
        status,
        request_id,
        version,
    })
}

fn rid_topic(prefix: &str, request_id: &str, buf: &mut [u8]) -> Result<usize, Error> {
    if request_id.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let mut w = BufWriter::new(buf);
    w.push_str(prefix)?;
    w.push_str(request_id)?;
    Ok(w.len())
}
