use criterion::Criterion;
use std::hint::black_box;
use libiot_pnp::hub::{HubClient, HubClientOptions};

fn client() -> HubClient<'static> {
    HubClient::new(
        "contoso.azure-devices.net",
        "gateway",
        HubClientOptions {
            module_id: Some("sensor"),
            user_agent: Some("os=linux"),
            model_id: Some("dtmi:com:example:Thermostat;1"),
        },
    )
    .expect("Failed to create client")
}

pub fn bench_user_name(c: &mut Criterion) {
    let client = client();
    let mut buf = [0u8; 256];
    c.bench_function("hub_user_name", |b| {
        b.iter(|| client.user_name(black_box(&mut buf)).expect("Failed to format"))
    });
}

pub fn bench_sas_password(c: &mut Criterion) {
    let client = client();
    let mut buf = [0u8; 256];
    let signature = "jqjZ7pGgLRT8wxhRMBdNQ0Ts0rhI0U2ky5l1uRqzTQ8=";
    c.bench_function("hub_sas_password", |b| {
        b.iter(|| {
            client
                .sas_password(black_box(signature), 1_700_000_000, None, &mut buf)
                .expect("Failed to format")
        })
    });
}
