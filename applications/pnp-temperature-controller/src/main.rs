//! PnP Temperature Controller sample
//!
//! A device with two `thermostat` components and a `deviceInformation`
//! component, speaking the IoT Hub Plug and Play conventions over MQTT.
//!
//! ## Running
//!
//! The client speaks plain MQTT, so point `AZ_IOT_MQTT_ENDPOINT` at a
//! TLS-terminating bridge in front of the hub, or at a local broker for
//! testing:
//! ```bash
//! docker run -d -p 1883:1883 eclipse-mosquitto:2 mosquitto -c /mosquitto-no-auth.conf
//! cp .env.example .env
//! RUST_LOG=info,libiot_pnp=debug cargo run
//! ```

mod config;
mod connection;
mod device_info;
mod thermostat;

use config::SampleConfig;
use connection::{NetConnection, TcpConnector};
use libiot_pnp::error::Error;
use libiot_pnp::json::JsonWriter;
use libiot_pnp::network::Connect;
use libiot_pnp::network::application::mqtt::{Client, Options, PublishPacket, QoS};
use libiot_pnp::pnp::{
    COMMANDS_SUBSCRIBE_TOPIC, CommandRequest, PnpClient, PnpClientOptions, Status,
    TWIN_PATCH_SUBSCRIBE_TOPIC, TWIN_RESPONSE_SUBSCRIBE_TOPIC, TwinPayload, TwinPropertyReader,
    TwinResponse, TwinResponseType,
};
use std::time::{Duration, Instant};
use thermostat::Thermostat;
use tracing_subscriber::EnvFilter;

const MODEL_ID: &str = "dtmi:com:example:TemperatureController;1";
const THERMOSTAT_1: &str = "thermostat1";
const THERMOSTAT_2: &str = "thermostat2";
const COMPONENTS: [&str; 3] = [THERMOSTAT_1, THERMOSTAT_2, device_info::COMPONENT_NAME];
const REBOOT_COMMAND_NAME: &str = "reboot";
const EMPTY_PAYLOAD: &[u8] = b"{}";

const DEFAULT_START_TEMP_CELSIUS: f64 = 22.0;
const KEEP_ALIVE_SECONDS: u16 = 240;
const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_millis(250);

type BoxError = Box<dyn std::error::Error>;

struct TemperatureController<'a> {
    pnp: PnpClient<'a>,
    mqtt: Client<NetConnection>,
    thermostats: [Thermostat; 2],
    request_id: u32,
    rebooting: bool,
    topic: [u8; 256],
    payload: [u8; 512],
}

impl<'a> TemperatureController<'a> {
    fn new(pnp: PnpClient<'a>, mqtt: Client<NetConnection>) -> Self {
        Self {
            pnp,
            mqtt,
            thermostats: [
                Thermostat::new(THERMOSTAT_1, DEFAULT_START_TEMP_CELSIUS),
                Thermostat::new(THERMOSTAT_2, DEFAULT_START_TEMP_CELSIUS),
            ],
            request_id: 0,
            rebooting: false,
            topic: [0; 256],
            payload: [0; 512],
        }
    }

    fn next_request_id(&mut self) -> String {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id.to_string()
    }

    fn subscribe(&mut self) -> Result<(), BoxError> {
        for filter in [
            COMMANDS_SUBSCRIBE_TOPIC,
            TWIN_PATCH_SUBSCRIBE_TOPIC,
            TWIN_RESPONSE_SUBSCRIBE_TOPIC,
        ] {
            self.mqtt.subscribe(filter, QoS::AtMostOnce)?;
            tracing::info!("subscribed to {}", filter);
        }
        Ok(())
    }

    fn publish(&mut self, topic_len: usize, payload_len: usize) -> Result<(), BoxError> {
        let topic = core::str::from_utf8(&self.topic[..topic_len])?;
        self.mqtt
            .publish(topic, &self.payload[..payload_len], QoS::AtMostOnce)?;
        tracing::debug!(
            topic,
            payload = %String::from_utf8_lossy(&self.payload[..payload_len]),
            "published"
        );
        Ok(())
    }

    fn request_twin(&mut self) -> Result<(), BoxError> {
        let rid = self.next_request_id();
        let n = self.pnp.twin_document_get_publish_topic(&rid, &mut self.topic)?;
        let topic = core::str::from_utf8(&self.topic[..n])?;
        self.mqtt.publish(topic, &[], QoS::AtMostOnce)?;
        tracing::info!("requested twin document");
        Ok(())
    }

    /// Publish the first `payload_len` bytes of the payload buffer as a
    /// reported-properties patch.
    fn report(&mut self, payload_len: usize) -> Result<(), BoxError> {
        let rid = self.next_request_id();
        let n = self.pnp.twin_patch_publish_topic(&rid, &mut self.topic)?;
        self.publish(n, payload_len)
    }

    fn send_device_info(&mut self) -> Result<(), BoxError> {
        let mut writer = JsonWriter::new(&mut self.payload);
        device_info::write_report(&self.pnp, &mut writer)?;
        let len = writer.len();
        self.report(len)?;
        tracing::info!("reported device information");
        Ok(())
    }

    fn send_max_temperatures(&mut self) -> Result<(), BoxError> {
        for i in 0..self.thermostats.len() {
            if !self.thermostats[i].needs_max_report() {
                continue;
            }
            let mut writer = JsonWriter::new(&mut self.payload);
            self.thermostats[i].write_max_temperature(&self.pnp, &mut writer)?;
            let len = writer.len();
            self.report(len)?;
        }
        Ok(())
    }

    fn send_telemetry(&mut self) -> Result<(), BoxError> {
        for i in 0..self.thermostats.len() {
            let component = self.thermostats[i].name();
            let n = self
                .pnp
                .telemetry_publish_topic(Some(component), None, &mut self.topic)?;
            let mut writer = JsonWriter::new(&mut self.payload);
            self.thermostats[i].write_telemetry(&mut writer)?;
            let len = writer.len();
            self.publish(n, len)?;
        }
        tracing::info!(
            thermostat1 = self.thermostats[0].current(),
            thermostat2 = self.thermostats[1].current(),
            "sent telemetry"
        );
        Ok(())
    }

    fn handle(&mut self, packet: &PublishPacket) -> Result<(), BoxError> {
        let topic = packet.topic.as_str();
        match self.pnp.commands_parse_received_topic(topic) {
            Ok(request) => return self.handle_command(&request, &packet.payload),
            Err(Error::TopicNoMatch) => {}
            Err(err) => return Err(err.into()),
        }
        match self.pnp.twin_parse_received_topic(topic) {
            Ok(response) => self.handle_twin(&response, &packet.payload),
            Err(Error::TopicNoMatch) => {
                tracing::warn!(topic, "message on unexpected topic");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn handle_command(&mut self, request: &CommandRequest<'_>, payload: &[u8]) -> Result<(), BoxError> {
        tracing::info!(
            component = request.component_name.unwrap_or("<root>"),
            command = request.command_name,
            "command received"
        );
        let mut writer = JsonWriter::new(&mut self.payload);
        let status = match request.component_name {
            None if request.command_name == REBOOT_COMMAND_NAME => {
                writer.raw_value(EMPTY_PAYLOAD)?;
                self.rebooting = true;
                Status::OK
            }
            Some(component) => match self.thermostats.iter().find(|t| t.name() == component) {
                Some(thermostat) => {
                    thermostat.process_command(request.command_name, payload, &mut writer)?
                }
                None => {
                    writer.raw_value(EMPTY_PAYLOAD)?;
                    Status::NOT_FOUND
                }
            },
            None => {
                writer.raw_value(EMPTY_PAYLOAD)?;
                Status::NOT_FOUND
            }
        };
        let len = writer.len();
        let n = self
            .pnp
            .commands_response_publish_topic(request.request_id, status, &mut self.topic)?;
        self.publish(n, len)?;
        tracing::info!(status = status.0, "command response sent");
        Ok(())
    }

    fn handle_twin(&mut self, response: &TwinResponse<'_>, payload: &[u8]) -> Result<(), BoxError> {
        let kind = match response.response_type {
            TwinResponseType::ReportedProperties => {
                if response.status.is_success() {
                    tracing::debug!(rid = response.request_id, "reported properties accepted");
                } else {
                    tracing::warn!(status = response.status.0, "reported properties rejected");
                }
                return Ok(());
            }
            TwinResponseType::Get => TwinPayload::FullDocument,
            TwinResponseType::DesiredProperties => TwinPayload::DesiredPatch,
        };
        if !response.status.is_success() {
            tracing::warn!(status = response.status.0, "twin request failed");
            return Ok(());
        }

        let mut reader = TwinPropertyReader::new(payload, kind, &COMPONENTS)?;
        let version = reader.version().unwrap_or_default();
        tracing::info!(version, "desired properties received");

        while let Some(property) = reader.next_property()? {
            let Some(component) = property.component else {
                tracing::info!(
                    name = %String::from_utf8_lossy(property.name.slice),
                    "ignoring root property"
                );
                continue;
            };
            let Some(index) = self.thermostats.iter().position(|t| t.name() == component) else {
                continue;
            };
            let mut writer = JsonWriter::new(&mut self.payload);
            let handled = self.thermostats[index].update_property(
                &self.pnp,
                &property.name,
                &property.value,
                version,
                &mut writer,
            )?;
            if handled {
                let len = writer.len();
                self.report(len)?;
            }
        }

        self.send_max_temperatures()
    }
}

fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SampleConfig::from_env()?;
    config.log();

    let pnp = PnpClient::new(
        &config.hostname,
        &config.device_id,
        MODEL_ID,
        PnpClientOptions::default(),
    )?;

    let mut client_id = [0u8; 128];
    let n = pnp.client_id(&mut client_id)?;
    let client_id = core::str::from_utf8(&client_id[..n])?;

    let mut user_name = [0u8; 256];
    let n = pnp.user_name(&mut user_name)?;
    let user_name = core::str::from_utf8(&user_name[..n])?;

    let mut password = [0u8; 256];
    let password = match &config.sas {
        Some(sas) => {
            let mut to_sign = [0u8; 256];
            let n = pnp.sas_signature(sas.expiry, &mut to_sign)?;
            tracing::debug!(
                "SAS string to sign: {:?}",
                String::from_utf8_lossy(&to_sign[..n])
            );
            let n = pnp.sas_password(&sas.signature, sas.expiry, None, &mut password)?;
            Some(&password[..n])
        }
        None => None,
    };

    let mut connector = TcpConnector {
        read_timeout: READ_TIMEOUT,
    };
    let connection = connector.connect(&config.endpoint)?;
    let options = Options {
        client_id,
        keep_alive_seconds: KEEP_ALIVE_SECONDS,
        clean_session: true,
        username: Some(user_name),
        password,
    };
    let mqtt = Client::connect(connection, options)?;
    tracing::info!(client_id, "mqtt session established");

    let mut controller = TemperatureController::new(pnp, mqtt);
    controller.subscribe()?;
    controller.send_device_info()?;
    controller.request_twin()?;

    let keep_alive = Duration::from_secs(u64::from(KEEP_ALIVE_SECONDS / 2));
    let mut last_telemetry = Instant::now();
    let mut last_ping = Instant::now();
    while !controller.rebooting {
        while let Some(packet) = controller.mqtt.poll()? {
            if let Err(err) = controller.handle(&packet) {
                tracing::error!(topic = packet.topic.as_str(), "failed to handle message: {}", err);
            }
        }
        if last_telemetry.elapsed() >= TELEMETRY_INTERVAL {
            controller.send_telemetry()?;
            last_telemetry = Instant::now();
        }
        if last_ping.elapsed() >= keep_alive {
            controller.mqtt.ping()?;
            last_ping = Instant::now();
        }
    }

    tracing::info!("reboot requested, disconnecting");
    controller.mqtt.disconnect()?;
    Ok(())
}
