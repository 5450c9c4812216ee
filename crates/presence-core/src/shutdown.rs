// # Shutdown Notification
//
// A one-shot termination notification built on a single-buffered channel.
//
// The daemon feeds the trigger from OS signals; tests call
// `ShutdownTrigger::notify` directly. Only the first delivery is observed:
// further deliveries are dropped while one is pending, and the listener is
// consumed by `wait`, so nothing can be received twice.

use std::fmt;
use tokio::sync::mpsc;

/// Why the process is being asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Requested programmatically
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Requested => "shutdown requested",
        };
        f.write_str(name)
    }
}

/// Sending half; cheap to clone
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: mpsc::Sender<ShutdownReason>,
}

impl ShutdownTrigger {
    /// Deliver a notification
    ///
    /// Returns `false` if it was coalesced into an earlier pending one, or
    /// if the listener has already been consumed.
    pub fn notify(&self, reason: ShutdownReason) -> bool {
        self.tx.try_send(reason).is_ok()
    }

    /// Whether the listener is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half; consumed by [`ShutdownListener::wait`]
#[derive(Debug)]
pub struct ShutdownListener {
    rx: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownListener {
    /// Block until the first notification arrives
    ///
    /// If every trigger is dropped without notifying, nothing can ever
    /// deliver one, so this resolves as [`ShutdownReason::Requested`].
    pub async fn wait(mut self) -> ShutdownReason {
        self.rx.recv().await.unwrap_or(ShutdownReason::Requested)
    }
}

/// Create a connected trigger/listener pair
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = mpsc::channel(1);
    (ShutdownTrigger { tx }, ShutdownListener { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_notification_wins() {
        let (trigger, listener) = shutdown_channel();

        assert!(trigger.notify(ShutdownReason::Terminate));
        assert!(!trigger.notify(ShutdownReason::Interrupt));
        assert!(!trigger.clone().notify(ShutdownReason::Requested));

        assert_eq!(listener.wait().await, ShutdownReason::Terminate);
        assert!(trigger.is_closed());
        assert!(!trigger.notify(ShutdownReason::Terminate));
    }

    #[tokio::test]
    async fn dropped_trigger_releases_listener() {
        let (trigger, listener) = shutdown_channel();
        drop(trigger);
        assert_eq!(listener.wait().await, ShutdownReason::Requested);
    }
}
