use super::{COMMAND_COMPONENT_SEPARATOR, PnpClient};
use crate::error::Error;
use crate::hub::Status;

/// A command invocation parsed from its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRequest<'t> {
    /// Correlation id to echo in the response topic.
    pub request_id: &'t str,
    /// The component the command is addressed to. `None` for the root
    /// component.
    pub component_name: Option<&'t str>,
    /// The command name without its component prefix.
    pub command_name: &'t str,
}

impl PnpClient<'_> {
    /// Parse a topic received on [`super::COMMANDS_SUBSCRIBE_TOPIC`].
    ///
    /// `{component}*{command}` is split on the first `*`. An empty component
    /// or command yields [`Error::TopicNoMatch`].
    pub fn commands_parse_received_topic<'t>(
        &self,
        topic: &'t str,
    ) -> Result<CommandRequest<'t>, Error> {
        let method = self.hub.methods_parse_received_topic(topic)?;
        let (component_name, command_name) =
            match method.name.split_once(COMMAND_COMPONENT_SEPARATOR) {
                Some((component, command)) => {
                    if component.is_empty() || command.is_empty() {
                        debug!("malformed command name {}", method.name);
                        return Err(Error::TopicNoMatch);
                    }
                    (Some(component), command)
                }
                None => (None, method.name),
            };
        Ok(CommandRequest {
            request_id: method.request_id,
            component_name,
            command_name,
        })
    }

    /// `$iothub/methods/res/{status}/?$rid={request_id}`
    pub fn commands_response_publish_topic(
        &self,
        request_id: &str,
        status: Status,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        self.hub.methods_response_publish_topic(request_id, status, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::super::PnpClientOptions;
    use super::*;

    fn client() -> PnpClient<'static> {
        PnpClient::new("h", "d", "dtmi:m;1", PnpClientOptions::default()).unwrap()
    }

    #[test]
    fn test_root_command() {
        let req = client()
            .commands_parse_received_topic("$iothub/methods/POST/reboot/?$rid=9")
            .unwrap();
        assert_eq!(req.component_name, None);
        assert_eq!(req.command_name, "reboot");
        assert_eq!(req.request_id, "9");
    }

    #[test]
    fn test_component_command_splits_on_first_separator() {
        let req = client()
            .commands_parse_received_topic("$iothub/methods/POST/thermostat1*get*report/?$rid=1")
            .unwrap();
        assert_eq!(req.component_name, Some("thermostat1"));
        assert_eq!(req.command_name, "get*report");
    }

    #[test]
    fn test_empty_parts_do_not_match() {
        for topic in [
            "$iothub/methods/POST/*reboot/?$rid=1",
            "$iothub/methods/POST/thermostat1*/?$rid=1",
        ] {
            assert_eq!(
                client().commands_parse_received_topic(topic),
                Err(Error::TopicNoMatch)
            );
        }
    }
}
