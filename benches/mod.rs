use criterion::{criterion_group, criterion_main};

mod hub;

criterion_group!(
    benches,
    hub::bench_user_name,
    hub::bench_sas_password,
    pnp::bench_telemetry_topic,
    pnp::bench_parse_command,
    pnp::bench_twin_walk,
    pnp::bench_reported_property,
    mqtt::bench_publish,
    mqtt::bench_poll
);
criterion_main!(benches);
