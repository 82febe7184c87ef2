//! The `thermostat` component.

use libiot_pnp::error::Error;
use libiot_pnp::json::{JsonReader, JsonToken, JsonWriter};
use libiot_pnp::pnp::{PnpClient, Status};

pub const TARGET_TEMPERATURE_NAME: &str = "targetTemperature";
pub const MAX_TEMPERATURE_NAME: &str = "maxTempSinceLastReboot";
pub const GET_MAX_MIN_REPORT_NAME: &str = "getMaxMinReport";

const TEMPERATURE_NAME: &str = "temperature";
const SUCCESS_DESCRIPTION: &str = "success";
const EMPTY_PAYLOAD: &[u8] = b"{}";
const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const DECIMAL_DIGITS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Thermostat {
    name: &'static str,
    current: f64,
    min: f64,
    max: f64,
    sum: f64,
    count: u32,
    report_max: bool,
}

impl Thermostat {
    pub fn new(name: &'static str, initial: f64) -> Self {
        Self {
            name,
            current: initial,
            min: initial,
            max: initial,
            sum: initial,
            count: 1,
            report_max: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn average(&self) -> f64 {
        self.sum / f64::from(self.count)
    }

    /// Whether `maxTempSinceLastReboot` has changed since it was last reported.
    pub fn needs_max_report(&self) -> bool {
        self.report_max
    }

    pub fn set_temperature(&mut self, value: f64) {
        self.current = value;
        if value > self.max {
            self.max = value;
            self.report_max = true;
        }
        if value < self.min {
            self.min = value;
        }
        self.count += 1;
        self.sum += value;
        tracing::info!(
            component = self.name,
            current = self.current,
            max = self.max,
            min = self.min,
            avg = self.average(),
            "temperature updated"
        );
    }

    /// Apply a desired property addressed to this component.
    ///
    /// Returns `Ok(true)` when the property was `targetTemperature` and the
    /// acknowledgement was written to `writer`.
    pub fn update_property(
        &mut self,
        pnp: &PnpClient<'_>,
        name: &JsonToken<'_>,
        value: &JsonToken<'_>,
        version: u32,
        writer: &mut JsonWriter<'_>,
    ) -> Result<bool, Error> {
        if !name.is_text_equal(TARGET_TEMPERATURE_NAME) {
            return Ok(false);
        }
        let target = value.get_f64()?;
        self.set_temperature(target);

        writer.begin_object()?;
        pnp.twin_begin_property_with_status(
            writer,
            Some(self.name),
            TARGET_TEMPERATURE_NAME,
            Status::OK,
            version,
            Some(SUCCESS_DESCRIPTION),
        )?;
        writer.f64(target, DECIMAL_DIGITS)?;
        pnp.twin_end_property_with_status(writer, Some(self.name))?;
        writer.end_object()?;
        Ok(true)
    }

    /// `{"temperature":…}`
    pub fn write_telemetry(&self, writer: &mut JsonWriter<'_>) -> Result<(), Error> {
        writer.begin_object()?;
        writer.property_name(TEMPERATURE_NAME)?;
        writer.f64(self.current, DECIMAL_DIGITS)?;
        writer.end_object()
    }

    /// `{"{component}":{"__t":"c","maxTempSinceLastReboot":…}}`
    pub fn write_max_temperature(
        &mut self,
        pnp: &PnpClient<'_>,
        writer: &mut JsonWriter<'_>,
    ) -> Result<(), Error> {
        writer.begin_object()?;
        pnp.twin_property_begin_component(writer, self.name)?;
        writer.property_name(MAX_TEMPERATURE_NAME)?;
        writer.f64(self.max, DECIMAL_DIGITS)?;
        pnp.twin_property_end_component(writer)?;
        writer.end_object()?;
        self.report_max = false;
        Ok(())
    }

    /// Run a command and write its response payload.
    pub fn process_command(
        &self,
        command: &str,
        payload: &[u8],
        writer: &mut JsonWriter<'_>,
    ) -> Result<Status, Error> {
        if command != GET_MAX_MIN_REPORT_NAME {
            tracing::warn!(component = self.name, command, "command not supported");
            writer.raw_value(EMPTY_PAYLOAD)?;
            return Ok(Status::NOT_FOUND);
        }

        let mut since = [0u8; 32];
        match parse_since(payload, &mut since) {
            Ok(start) => {
                let end = chrono::Local::now().format(ISO8601_FORMAT).to_string();
                tracing::info!(component = self.name, start, end = %end, "max/min report");
                self.write_report(start, &end, writer)?;
                Ok(Status::OK)
            }
            Err(err) => {
                tracing::warn!(component = self.name, "bad {} payload: {}", command, err);
                writer.raw_value(EMPTY_PAYLOAD)?;
                Ok(Status::BAD_REQUEST)
            }
        }
    }

    fn write_report(&self, start: &str, end: &str, writer: &mut JsonWriter<'_>) -> Result<(), Error> {
        writer.begin_object()?;
        writer.property_name("maxTemp")?;
        writer.f64(self.max, DECIMAL_DIGITS)?;
        writer.property_name("minTemp")?;
        writer.f64(self.min, DECIMAL_DIGITS)?;
        writer.property_name("avgTemp")?;
        writer.f64(self.average(), DECIMAL_DIGITS)?;
        writer.property_name("startTime")?;
        writer.string(start)?;
        writer.property_name("endTime")?;
        writer.string(end)?;
        writer.end_object()
    }
}

/// The command payload is a bare JSON string holding the start time.
fn parse_since<'b>(payload: &[u8], buf: &'b mut [u8]) -> Result<&'b str, Error> {
    let mut reader = JsonReader::new(payload);
    reader.next_token()?;
    let since = reader.token().get_string(buf)?;
    if since.is_empty() {
        return Err(Error::ItemNotFound);
    }
    Ok(since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libiot_pnp::pnp::{PnpClientOptions, TwinPayload, TwinPropertyReader};

    fn pnp() -> PnpClient<'static> {
        PnpClient::new(
            "h.azure-devices.net",
            "d",
            "dtmi:com:example:TemperatureController;1",
            PnpClientOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_statistics() {
        let mut t = Thermostat::new("thermostat1", 22.0);
        t.write_max_temperature(&pnp(), &mut JsonWriter::new(&mut [0u8; 128]))
            .unwrap();
        assert!(!t.needs_max_report());

        t.set_temperature(18.0);
        assert!(!t.needs_max_report());
        t.set_temperature(26.0);
        assert!(t.needs_max_report());
        assert_eq!(t.current(), 26.0);
        assert_eq!(t.average(), 22.0);
    }

    #[test]
    fn test_target_temperature_ack() {
        let patch = br#"{"thermostat1":{"__t":"c","targetTemperature":23.5},"$version":7}"#;
        let components = ["thermostat1"];
        let mut reader =
            TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &components).unwrap();
        let prop = reader.next_property().unwrap().unwrap();

        let mut t = Thermostat::new("thermostat1", 22.0);
        let mut buf = [0u8; 256];
        let mut w = JsonWriter::new(&mut buf);
        let handled = t
            .update_property(&pnp(), &prop.name, &prop.value, 7, &mut w)
            .unwrap();
        assert!(handled);
        assert_eq!(
            w.as_str(),
            r#"{"thermostat1":{"__t":"c","targetTemperature":{"ac":200,"av":7,"ad":"success","value":23.5}}}"#
        );
        assert_eq!(t.current(), 23.5);
    }

    #[test]
    fn test_unknown_property_is_ignored() {
        let patch = br#"{"fanSpeed":3,"$version":2}"#;
        let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &[]).unwrap();
        let prop = reader.next_property().unwrap().unwrap();

        let mut t = Thermostat::new("thermostat1", 22.0);
        let mut buf = [0u8; 64];
        let mut w = JsonWriter::new(&mut buf);
        assert!(!t.update_property(&pnp(), &prop.name, &prop.value, 2, &mut w).unwrap());
        assert!(w.is_empty());
    }

    #[test]
    fn test_max_min_report() {
        let t = Thermostat::new("thermostat1", 22.0);
        let mut buf = [0u8; 256];
        let mut w = JsonWriter::new(&mut buf);
        let status = t
            .process_command(GET_MAX_MIN_REPORT_NAME, br#""2024-01-01T00:00:00Z""#, &mut w)
            .unwrap();
        assert_eq!(status, Status::OK);
        assert!(w.as_str().starts_with(
            r#"{"maxTemp":22,"minTemp":22,"avgTemp":22,"startTime":"2024-01-01T00:00:00Z","endTime":""#
        ));
    }

    #[test]
    fn test_bad_and_unknown_commands() {
        let t = Thermostat::new("thermostat1", 22.0);
        let payloads: [&[u8]; 3] = [b"{}", b"\"\"", b""];
        for payload in payloads {
            let mut buf = [0u8; 64];
            let mut w = JsonWriter::new(&mut buf);
            let status = t.process_command(GET_MAX_MIN_REPORT_NAME, payload, &mut w).unwrap();
            assert_eq!(status, Status::BAD_REQUEST);
            assert_eq!(w.as_str(), "{}");
        }

        let mut buf = [0u8; 64];
        let mut w = JsonWriter::new(&mut buf);
        assert_eq!(t.process_command("selfTest", b"{}", &mut w).unwrap(), Status::NOT_FOUND);
    }
}
