//! Contract Test: Shutdown Notification
//!
//! Constraints verified:
//! - While registered, the controller does nothing until notified
//! - Repeated or rapid notifications run the deregistration logic once
//! - The controller terminates promptly after the first notification

mod common;

use common::*;
use presence_core::{ChangeAction, PresenceController, ShutdownReason, shutdown_channel};
use std::time::Duration;

#[tokio::test]
async fn controller_stays_registered_until_notified() {
    let zone = RecordingZoneClient::new();

    let (controller, mut events) = PresenceController::new(
        Box::new(zone.clone()),
        Box::new(StaticMetadata::new("54.1.2.3", "10.0.1.5")),
        scenario_config(),
    )
    .unwrap();

    let (trigger, listener) = shutdown_channel();
    let handle = tokio::spawn(controller.run(listener));
    wait_for_registered(&mut events).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished(), "controller must wait for the notification");
    assert_eq!(zone.actions(), vec![ChangeAction::Upsert]);

    trigger.notify(ShutdownReason::Terminate);
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "controller terminates within 5 seconds");
}

#[tokio::test]
async fn rapid_notifications_deregister_once() {
    let zone = RecordingZoneClient::new();

    let (controller, mut events) = PresenceController::new(
        Box::new(zone.clone()),
        Box::new(StaticMetadata::new("54.1.2.3", "10.0.1.5")),
        scenario_config(),
    )
    .unwrap();

    let (trigger, listener) = shutdown_channel();
    let handle = tokio::spawn(controller.run(listener));
    wait_for_registered(&mut events).await;

    let delivered: Vec<bool> = [
        ShutdownReason::Terminate,
        ShutdownReason::Interrupt,
        ShutdownReason::Terminate,
        ShutdownReason::Interrupt,
    ]
    .into_iter()
    .map(|reason| trigger.clone().notify(reason))
    .collect();

    assert_eq!(delivered, vec![true, false, false, false], "only the first is buffered");

    handle.await.unwrap().unwrap();

    // Late notifications after termination go nowhere
    assert!(!trigger.notify(ShutdownReason::Terminate));

    assert_eq!(zone.actions(), vec![ChangeAction::Upsert, ChangeAction::Delete]);
}

#[tokio::test]
async fn notification_before_registration_is_held() {
    let zone = RecordingZoneClient::new();

    let (controller, _events) = PresenceController::new(
        Box::new(zone.clone()),
        Box::new(StaticMetadata::new("54.1.2.3", "10.0.1.5")),
        scenario_config(),
    )
    .unwrap();

    let (trigger, listener) = shutdown_channel();
    trigger.notify(ShutdownReason::Interrupt);

    tokio::time::timeout(Duration::from_secs(5), controller.run(listener))
        .await
        .expect("run completes")
        .expect("clean shutdown");

    // Registration still happens first, then exactly one DELETE
    assert_eq!(zone.actions(), vec![ChangeAction::Upsert, ChangeAction::Delete]);
}
