//! The read-only `deviceInformation` component.

use libiot_pnp::error::Error;
use libiot_pnp::json::JsonWriter;
use libiot_pnp::pnp::PnpClient;

pub const COMPONENT_NAME: &str = "deviceInformation";

const MANUFACTURER: &str = "Contoso Device Corporation";
const MODEL: &str = "Contoso 4762B-turbo";
const SOFTWARE_VERSION: &str = "3.1";
const PROCESSOR_MANUFACTURER: &str = "Contoso Foundries";
const TOTAL_STORAGE_KB: f64 = 64000.0;
const TOTAL_MEMORY_KB: f64 = 640.0;

/// `{"deviceInformation":{"__t":"c","manufacturer":…,…}}`
pub fn write_report(pnp: &PnpClient<'_>, writer: &mut JsonWriter<'_>) -> Result<(), Error> {
    writer.begin_object()?;
    pnp.twin_property_begin_component(writer, COMPONENT_NAME)?;
    for (name, value) in [
        ("manufacturer", MANUFACTURER),
        ("model", MODEL),
        ("swVersion", SOFTWARE_VERSION),
        ("osName", std::env::consts::OS),
        ("processorArchitecture", std::env::consts::ARCH),
        ("processorManufacturer", PROCESSOR_MANUFACTURER),
    ] {
        writer.property_name(name)?;
        writer.string(value)?;
    }
    writer.property_name("totalStorage")?;
    writer.f64(TOTAL_STORAGE_KB, 0)?;
    writer.property_name("totalMemory")?;
    writer.f64(TOTAL_MEMORY_KB, 0)?;
    pnp.twin_property_end_component(writer)?;
    writer.end_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libiot_pnp::pnp::{PnpClientOptions, TwinPayload, TwinPropertyReader};

    #[test]
    fn test_report_is_a_component() {
        let pnp = PnpClient::new("h", "d", "dtmi:m;1", PnpClientOptions::default()).unwrap();
        let mut buf = [0u8; 512];
        let mut w = JsonWriter::new(&mut buf);
        write_report(&pnp, &mut w).unwrap();
        assert!(w
            .as_str()
            .starts_with(r#"{"deviceInformation":{"__t":"c","manufacturer":"Contoso Device Corporation","#));

        // The same shape a desired patch has, so the walker can read it back.
        let components = [COMPONENT_NAME];
        let mut reader =
            TwinPropertyReader::new(w.as_bytes(), TwinPayload::DesiredPatch, &components).unwrap();
        let mut count = 0;
        while let Some(prop) = reader.next_property().unwrap() {
            assert_eq!(prop.component, Some(COMPONENT_NAME));
            count += 1;
        }
        assert_eq!(count, 8);
    }
}
