//! Contract Test: Configuration
//!
//! Constraints verified:
//! - ttl omitted ⇒ the published record carries ttl 300
//! - A malformed ttl is a configuration error raised before anything can
//!   reach the network
//! - Invalid configuration never produces a controller

mod common;

use common::*;
use presence_core::{
    Error, Phase, PresenceConfig, PresenceController, RecordConfig, ShutdownReason,
    shutdown_channel,
};

#[tokio::test]
async fn omitted_ttl_publishes_300() {
    let mut settings = scenario_settings();
    settings.ttl = None;

    let zone = RecordingZoneClient::new();
    let (controller, mut events) = PresenceController::new(
        Box::new(zone.clone()),
        Box::new(StaticMetadata::new("54.1.2.3", "10.0.1.5")),
        PresenceConfig::from_settings(settings).unwrap(),
    )
    .unwrap();

    let (trigger, listener) = shutdown_channel();
    let handle = tokio::spawn(controller.run(listener));
    wait_for_registered(&mut events).await;

    assert_eq!(zone.changes()[0].1.record.ttl(), 300);

    trigger.notify(ShutdownReason::Terminate);
    handle.await.unwrap().unwrap();
}

#[test]
fn explicit_ttl_is_honoured() {
    let mut settings = scenario_settings();
    settings.ttl = Some("60".to_string());

    let config = PresenceConfig::from_settings(settings).unwrap();
    assert_eq!(config.record.ttl, 60);
}

#[test]
fn malformed_ttl_is_rejected_before_network() {
    let mut settings = scenario_settings();
    settings.ttl = Some("abc".to_string());

    // Settings validation is pure; no client or metadata source exists yet
    let err = PresenceConfig::from_settings(settings).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("abc"));
}

#[test]
fn invalid_config_never_builds_a_controller() {
    let zone = RecordingZoneClient::new();
    let metadata = StaticMetadata::new("54.1.2.3", "10.0.1.5");

    let config = PresenceConfig::new(RecordConfig::new("svc.internal", "A").with_ttl(0), "Z1");

    let err = PresenceController::new(Box::new(zone.clone()), Box::new(metadata.clone()), config)
        .err()
        .expect("ttl 0 is rejected");

    assert_eq!(err.phase(), Some(Phase::Configuration));
    assert!(err.is_config());
    assert!(zone.changes().is_empty());
    assert_eq!(metadata.lookup_count(), 0);
}
