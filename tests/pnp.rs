use libiot_pnp::error::{Error, JsonError};
use libiot_pnp::json::JsonWriter;
use libiot_pnp::pnp::*;

const MODEL_ID: &str = "dtmi:com:example:TemperatureController;1";
const COMPONENTS: [&str; 3] = ["thermostat1", "thermostat2", "deviceInformation"];

fn client() -> PnpClient<'static> {
    PnpClient::new(
        "contoso.azure-devices.net",
        "controller",
        MODEL_ID,
        PnpClientOptions::default(),
    )
    .unwrap()
}

/// Collect `(component, name, raw value)` for every property in the section.
fn walk(reader: &mut TwinPropertyReader<'_, '_>) -> Result<Vec<(Option<String>, String, String)>, Error> {
    let mut out = Vec::new();
    while let Some(property) = reader.next_property()? {
        let mut name = [0u8; 64];
        out.push((
            property.component.map(str::to_string),
            property.name.get_string(&mut name)?.to_string(),
            String::from_utf8(property.raw_value.to_vec()).unwrap(),
        ));
    }
    Ok(out)
}

fn entry(component: Option<&str>, name: &str, value: &str) -> (Option<String>, String, String) {
    (component.map(str::to_string), name.to_string(), value.to_string())
}

#[test]
fn test_telemetry_topics() {
    let client = client();
    let mut buf = [0u8; 128];

    let n = client.telemetry_publish_topic(None, None, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"devices/controller/messages/events/");

    let mut props_buf = [0u8; 32];
    let mut props = MessageProperties::new(&mut props_buf);
    props.append("priority", "low").unwrap();
    let n = client
        .telemetry_publish_topic(Some("thermostat2"), Some(&props), &mut buf)
        .unwrap();
    assert_eq!(
        &buf[..n],
        b"devices/controller/messages/events/priority=low&$.sub=thermostat2"
    );
    // The caller's list is left alone.
    assert_eq!(props.as_str(), "priority=low");

    assert_eq!(
        client.telemetry_publish_topic(Some(""), None, &mut buf),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        client.telemetry_publish_topic(Some("thermostat2"), None, &mut buf[..40]),
        Err(Error::BufferTooSmall)
    );
}

#[test]
fn test_command_round_trip() {
    let client = client();
    let mut buf = [0u8; 64];
    let n = client
        .commands_response_publish_topic("9", Status::OK, &mut buf)
        .unwrap();
    assert_eq!(&buf[..n], b"$iothub/methods/res/200/?$rid=9");

    let request = client
        .commands_parse_received_topic("$iothub/methods/POST/thermostat1*getMaxMinReport/?$rid=9")
        .unwrap();
    assert_eq!(
        request,
        CommandRequest {
            request_id: "9",
            component_name: Some("thermostat1"),
            command_name: "getMaxMinReport",
        }
    );

    let root = client
        .commands_parse_received_topic("$iothub/methods/POST/reboot/?$rid=10")
        .unwrap();
    assert_eq!(root.component_name, None);
    assert_eq!(root.command_name, "reboot");

    // Only the first separator splits.
    let nested = client
        .commands_parse_received_topic("$iothub/methods/POST/a*b*c/?$rid=11")
        .unwrap();
    assert_eq!(nested.component_name, Some("a"));
    assert_eq!(nested.command_name, "b*c");

    for topic in [
        "$iothub/methods/POST/*reboot/?$rid=1",
        "$iothub/methods/POST/thermostat1*/?$rid=1",
        "$iothub/twin/res/200/?$rid=1",
    ] {
        assert_eq!(
            client.commands_parse_received_topic(topic),
            Err(Error::TopicNoMatch),
            "{topic}"
        );
    }
}

#[test]
fn test_twin_topics_delegate_to_hub() {
    let client = client();
    let mut buf = [0u8; 64];
    let n = client.twin_document_get_publish_topic("1", &mut buf).unwrap();
    assert_eq!(&buf[..n], b"$iothub/twin/GET/?$rid=1");
    let n = client.twin_patch_publish_topic("2", &mut buf).unwrap();
    assert_eq!(&buf[..n], b"$iothub/twin/PATCH/properties/reported/?$rid=2");

    let response = client
        .twin_parse_received_topic("$iothub/twin/PATCH/properties/desired/?$version=3")
        .unwrap();
    assert_eq!(response.response_type, TwinResponseType::DesiredProperties);
    assert_eq!(response.version, Some(3));
}

#[test]
fn test_patch_without_components() {
    let patch = br#"{"targetTemperature":21.5,"fan":{"speed":2},"$version":3}"#;
    let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &COMPONENTS).unwrap();
    assert_eq!(reader.version(), Some(3));
    assert_eq!(
        walk(&mut reader).unwrap(),
        vec![
            entry(None, "targetTemperature", "21.5"),
            entry(None, "fan", r#"{"speed":2}"#),
        ]
    );
}

#[test]
fn test_patch_with_one_component() {
    let patch = br#"{"$version":8,"thermostat1":{"__t":"c","targetTemperature":19}}"#;
    let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &COMPONENTS).unwrap();
    assert_eq!(reader.version(), Some(8));
    assert_eq!(
        walk(&mut reader).unwrap(),
        vec![entry(Some("thermostat1"), "targetTemperature", "19")]
    );
    // Exhausted readers stay exhausted.
    assert_eq!(reader.next_property(), Ok(None));
}

#[test]
fn test_patch_with_many_components() {
    let patch = br#"{
        "thermostat1": {"__t": "c", "targetTemperature": 23.5},
        "rootSetting": true,
        "thermostat2": {"__t": "c", "targetTemperature": 18, "mode": "eco"},
        "unregistered": {"__t": "c", "x": 1},
        "$version": 21
    }"#;
    let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &COMPONENTS).unwrap();
    assert_eq!(reader.version(), Some(21));
    assert_eq!(
        walk(&mut reader).unwrap(),
        vec![
            entry(Some("thermostat1"), "targetTemperature", "23.5"),
            entry(None, "rootSetting", "true"),
            entry(Some("thermostat2"), "targetTemperature", "18"),
            entry(Some("thermostat2"), "mode", r#""eco""#),
            entry(None, "unregistered", r#"{"__t": "c", "x": 1}"#),
        ]
    );
}

#[test]
fn test_full_document_sections() {
    let doc = br#"{
        "desired": {
            "thermostat1": {"__t": "c", "targetTemperature": 24},
            "$version": 5
        },
        "reported": {
            "deviceInformation": {"__t": "c", "manufacturer": "Contoso"},
            "serialNumber": "SN-1",
            "$version": 11
        }
    }"#;
    let mut reader = TwinPropertyReader::new(doc, TwinPayload::FullDocument, &COMPONENTS).unwrap();
    assert_eq!(reader.current_section(), TwinSection::Desired);
    assert_eq!(reader.version(), Some(5));
    assert_eq!(
        walk(&mut reader).unwrap(),
        vec![entry(Some("thermostat1"), "targetTemperature", "24")]
    );

    let mut reader = reader.section(TwinSection::Reported).unwrap();
    assert_eq!(reader.current_section(), TwinSection::Reported);
    assert_eq!(reader.version(), Some(11));
    assert_eq!(
        walk(&mut reader).unwrap(),
        vec![
            entry(Some("deviceInformation"), "manufacturer", r#""Contoso""#),
            entry(None, "serialNumber", r#""SN-1""#),
        ]
    );
}

#[test]
fn test_full_document_missing_section() {
    let doc = br#"{"reported":{"$version":1}}"#;
    assert_eq!(
        TwinPropertyReader::new(doc, TwinPayload::FullDocument, &COMPONENTS).unwrap_err(),
        Error::ItemNotFound
    );

    let doc = br#"{"desired":{"$version":1}}"#;
    let reader = TwinPropertyReader::new(doc, TwinPayload::FullDocument, &COMPONENTS).unwrap();
    assert_eq!(
        reader.section(TwinSection::Reported).unwrap_err(),
        Error::ItemNotFound
    );
}

#[test]
fn test_truncated_documents_fail() {
    let full = br#"{"thermostat1":{"__t":"c","targetTemperature":23.5},"mode":"auto"}"#;
    for len in 1..full.len() {
        let doc = &full[..len];
        let result = TwinPropertyReader::new(doc, TwinPayload::DesiredPatch, &COMPONENTS)
            .and_then(|mut reader| walk(&mut reader));
        assert!(
            matches!(result, Err(Error::Json(_))),
            "prefix of length {len} gave {result:?}"
        );
    }
}

#[test]
fn test_truncated_full_documents_fail() {
    let full = br#"{"desired":{"thermostat1":{"__t":"c","targetTemperature":21},"$version":3},"reported":{"serialNumber":"SN-1","$version":1}}"#;
    for section in [TwinSection::Desired, TwinSection::Reported] {
        for len in 1..full.len() {
            let doc = &full[..len];
            let result = TwinPropertyReader::new(doc, TwinPayload::FullDocument, &COMPONENTS)
                .and_then(|reader| reader.section(section))
                .and_then(|mut reader| walk(&mut reader));
            assert!(
                matches!(result, Err(Error::Json(_))),
                "{section:?} of {} gave {result:?}",
                String::from_utf8_lossy(doc)
            );
        }
        let mut reader = TwinPropertyReader::new(full, TwinPayload::FullDocument, &COMPONENTS)
            .and_then(|reader| reader.section(section))
            .unwrap();
        assert_eq!(walk(&mut reader).unwrap().len(), 1);
    }
}

#[test]
fn test_full_document_trailing_characters() {
    let doc = br#"{"desired":{"a":1}} garbage"#;
    let mut reader = TwinPropertyReader::new(doc, TwinPayload::FullDocument, &COMPONENTS).unwrap();
    assert!(reader.next_property().unwrap().is_some());
    assert_eq!(
        reader.next_property(),
        Err(Error::Json(JsonError::TrailingCharacters))
    );
    // The failure sticks.
    assert_eq!(
        reader.next_property(),
        Err(Error::Json(JsonError::TrailingCharacters))
    );
}

#[test]
fn test_malformed_documents_fail() {
    let docs: [&[u8]; 7] = [
        br#"[1,2]"#,
        br#"{"a" 1}"#,
        br#"{"a":1,}"#,
        br#"{"a":1}}"#,
        br#"{"$version":"7"}"#,
        br#"{"a":"unterminated}"#,
        b"{\"a\":\"\xff\xfe\"}",
    ];
    for doc in docs {
        let result = TwinPropertyReader::new(doc, TwinPayload::DesiredPatch, &COMPONENTS)
            .and_then(|mut reader| walk(&mut reader));
        assert!(
            matches!(result, Err(Error::Json(_))),
            "{} gave {result:?}",
            String::from_utf8_lossy(doc)
        );
    }

    assert_eq!(
        TwinPropertyReader::new(br#"{"desired":7}"#, TwinPayload::FullDocument, &COMPONENTS)
            .unwrap_err(),
        Error::Json(JsonError::UnexpectedToken)
    );
}

#[test]
fn test_reported_payload_reads_back() {
    let client = client();
    let mut buf = [0u8; 256];
    let mut writer = JsonWriter::new(&mut buf);
    writer.begin_object().unwrap();
    client
        .twin_begin_property_with_status(
            &mut writer,
            Some("thermostat2"),
            "targetTemperature",
            Status::OK,
            4,
            None,
        )
        .unwrap();
    writer.f64(20.25, 2).unwrap();
    client
        .twin_end_property_with_status(&mut writer, Some("thermostat2"))
        .unwrap();
    writer.property_name("uptime").unwrap();
    writer.u32(360).unwrap();
    writer.end_object().unwrap();
    assert_eq!(
        writer.as_str(),
        r#"{"thermostat2":{"__t":"c","targetTemperature":{"ac":200,"av":4,"value":20.25}},"uptime":360}"#
    );

    let mut reader =
        TwinPropertyReader::new(writer.as_bytes(), TwinPayload::DesiredPatch, &COMPONENTS).unwrap();
    assert_eq!(reader.version(), None);
    let ack = reader.next_property().unwrap().unwrap();
    assert_eq!(ack.component, Some("thermostat2"));
    assert!(ack.name.is_text_equal("targetTemperature"));
    assert_eq!(ack.raw_value, br#"{"ac":200,"av":4,"value":20.25}"#);
}

#[test]
fn test_property_payloads_respect_buffer() {
    let client = client();
    for len in 0..40 {
        let mut buf = [0u8; 64];
        let mut writer = JsonWriter::new(&mut buf[..len]);
        let result = writer.begin_object().and_then(|_| {
            client.twin_begin_property_with_status(
                &mut writer,
                Some("thermostat1"),
                "targetTemperature",
                Status::OK,
                1,
                Some("ok"),
            )
        });
        assert_eq!(result, Err(Error::BufferTooSmall), "len {len}");
        assert!(writer.len() <= len);
    }
}
