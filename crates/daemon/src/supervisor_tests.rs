use super::*;

#[test]
fn split_broker_separates_host_and_port() {
    assert_eq!(split_broker("mqtt.example.com:8883"), ("mqtt.example.com".to_string(), 8883));
}

#[test]
fn split_broker_defaults_to_1883_without_a_port() {
    assert_eq!(split_broker("mqtt.example.com"), ("mqtt.example.com".to_string(), 1883));
}

#[test]
fn split_broker_defaults_to_1883_on_an_unparseable_port() {
    assert_eq!(split_broker("mqtt.example.com:not-a-port"), ("mqtt.example.com".to_string(), 1883));
}

#[test]
fn split_broker_handles_bare_ipv4_with_port() {
    assert_eq!(split_broker("10.0.0.5:1883"), ("10.0.0.5".to_string(), 1883));
}
