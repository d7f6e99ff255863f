// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain = { "8080:80", PortMapping::new(8080, 80) },
    same = { "80:80", PortMapping::new(80, 80) },
)]
fn port_mapping_parses(input: &str, expected: PortMapping) {
    assert_eq!(input.parse::<PortMapping>().unwrap(), expected);
    assert_eq!(expected.to_string(), input);
}

#[test]
fn port_mapping_rejects_missing_colon() {
    assert!("8080".parse::<PortMapping>().is_err());
}

#[test]
fn volume_mount_distinguishes_named_from_bind() {
    assert_eq!(
        "data:/var/lib/app".parse::<VolumeMount>().unwrap(),
        VolumeMount::Named {
            volume: "data".into(),
            path: "/var/lib/app".into()
        }
    );
    assert_eq!(
        "/host/data:/container/data".parse::<VolumeMount>().unwrap(),
        VolumeMount::Bind {
            host: "/host/data".into(),
            container: "/container/data".into()
        }
    );
}

#[yare::parameterized(
    millicores = { "500m", 500_000_000 },
    whole_core = { "1", 1_000_000_000 },
    half_core = { "0.5", 500_000_000 },
)]
fn cpu_limit_parses_to_nanocpus(input: &str, expected_nanocpus: u64) {
    let limit: CpuLimit = input.parse().unwrap();
    assert_eq!(limit.nanocpus, expected_nanocpus);
}

#[yare::parameterized(
    mebibytes = { "512Mi", 512 * 1024 * 1024 },
    gibibyte = { "1Gi", 1024 * 1024 * 1024 },
    plain_bytes = { "1024", 1024 },
)]
fn memory_limit_parses_to_bytes(input: &str, expected_bytes: u64) {
    let limit: MemoryLimit = input.parse().unwrap();
    assert_eq!(limit.bytes, expected_bytes);
}

#[test]
fn service_config_serde_roundtrip() {
    let config = ServiceConfig {
        image: "nginx:alpine".into(),
        ports: vec![PortMapping::new(8080, 80)],
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: ServiceConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn app_service_lookup() {
    let app = App {
        id: AppId::new(1001),
        name: "web".into(),
        uuid: None,
        services: vec![Service {
            id: ServiceId::new(1),
            name: "nginx".into(),
            image_ref: "nginx:alpine".into(),
            config: ServiceConfig::default(),
        }],
    };
    assert!(app.service(ServiceId::new(1)).is_some());
    assert!(app.service(ServiceId::new(2)).is_none());
}
