// # presenced - DNS Presence Daemon
//
// A thin integration layer over presence-core:
// 1. Parse flags and environment variables
// 2. Initialize logging
// 3. Register the Route 53 zone client and EC2 metadata source
// 4. Run the presence controller until SIGTERM or SIGINT
//
// All registration logic lives in presence-core. Nothing here retries.
//
// ## Example
//
// ```bash
// export ROUTE53_RECORD_NAME=svc.internal
// export ROUTE53_RECORD_TYPE=A
// export ROUTE53_ZONE_ID=Z0123456789
// export ROUTE53_STOP_BEHAVIOR=DELETE
//
// presenced --ipType private
// ```

mod cli;

use clap::Parser;
use presence_core::{
    ControllerEvent, Error, Phase, PresenceConfig, PresenceController, PresenceOutcome,
    ProviderRegistry, ShutdownReason, ShutdownTrigger, shutdown_channel,
};
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

use crate::cli::Cli;

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration error
/// - 2: Runtime error (resolution, authentication, provider)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresenceExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl PresenceExitCode {
    /// Only configuration-phase failures count as configuration errors
    fn for_error(err: &Error) -> Self {
        match err.phase() {
            Some(Phase::Configuration) => PresenceExitCode::ConfigError,
            Some(_) => PresenceExitCode::RuntimeError,
            None if err.is_config() => PresenceExitCode::ConfigError,
            None => PresenceExitCode::RuntimeError,
        }
    }
}

impl From<PresenceExitCode> for ExitCode {
    fn from(code: PresenceExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                PresenceExitCode::ConfigError.into()
            } else {
                PresenceExitCode::CleanShutdown.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PresenceExitCode::ConfigError.into();
    }

    let settings = cli.into_settings(|key| env::var(key).ok());
    let config = match PresenceConfig::from_settings(settings) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e.in_phase(Phase::Configuration));
            return PresenceExitCode::ConfigError.into();
        }
    };

    info!("Starting presenced");

    // The controller is sequential; one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PresenceExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(config).await {
            Ok(outcome) => {
                info!("Exiting cleanly ({})", describe(&outcome));
                PresenceExitCode::CleanShutdown
            }
            Err(e) => {
                error!("{}", e);
                PresenceExitCode::for_error(&e)
            }
        }
    });

    code.into()
}

/// Run the daemon
async fn run_daemon(config: PresenceConfig) -> presence_core::Result<PresenceOutcome> {
    let registry = ProviderRegistry::new();
    presence_provider_route53::register(&registry);
    presence_ip_metadata::register(&registry);

    let zone_client = registry
        .create_zone_client(&config.provider)
        .map_err(|e| e.in_phase(Phase::ClientSetup))?;
    let metadata = registry
        .create_metadata(&config.metadata)
        .map_err(|e| e.in_phase(Phase::ClientSetup))?;

    info!(
        "Using {} zone client and {} metadata source",
        zone_client.provider_name(),
        metadata.source_name()
    );

    let (controller, events) = PresenceController::new(zone_client, metadata, config)?;
    let (trigger, listener) = shutdown_channel();

    // Install handlers before registering so an early signal is not lost
    let signals =
        ShutdownSignals::install().map_err(|e| Error::from(e).in_phase(Phase::ClientSetup))?;
    tokio::spawn(signals.forward(trigger));
    tokio::spawn(log_events(events));

    controller.run(listener).await
}

fn describe(outcome: &PresenceOutcome) -> String {
    match outcome {
        PresenceOutcome::Deregistered(record) => format!("{} deleted", record.name()),
        PresenceOutcome::Retained(record) => format!("{} retained", record.name()),
    }
}

async fn log_events(mut events: mpsc::Receiver<ControllerEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Controller event: {:?}", event);
    }
}

/// OS termination signals feeding a [`ShutdownTrigger`]
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> anyhow::Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Forward every signal; the trigger coalesces repeats
    async fn forward(mut self, trigger: ShutdownTrigger) {
        loop {
            let reason = tokio::select! {
                _ = self.sigterm.recv() => ShutdownReason::Terminate,
                _ = self.sigint.recv() => ShutdownReason::Interrupt,
            };

            if !relay(&trigger, reason) {
                break;
            }
        }
    }
}

/// Fallback for non-Unix platforms (Ctrl-C only)
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> anyhow::Result<Self> {
        Ok(Self)
    }

    async fn forward(self, trigger: ShutdownTrigger) {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !relay(&trigger, ShutdownReason::Interrupt) {
                break;
            }
        }
    }
}

/// Hand one OS signal to the controller
///
/// Returns `false` once the controller no longer listens.
fn relay(trigger: &ShutdownTrigger, reason: ShutdownReason) -> bool {
    if trigger.notify(reason) {
        debug!("Forwarded {} to the controller", reason);
        true
    } else if trigger.is_closed() {
        false
    } else {
        debug!("Ignoring repeated {}", reason);
        true
    }
}
