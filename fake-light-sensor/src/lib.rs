use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::time::sleep;

use crate::errors::DaemonError;
use crate::lock::{LifecycleGuard, default_marker_path};
use crate::publisher::SensorPublisher;
use crate::schedule::{SleepPolicy, next_delay};
use crate::settings::Settings;
use crate::source::IlluminanceSource;

pub mod errors;
pub mod lock;
pub mod publisher;
pub mod schedule;
pub mod settings;
pub mod source;

/// Runs the sampling loop until a termination signal arrives or a sampling
/// cycle fails. The lock marker is held for the whole run and released on
/// every exit path through the guard's drop.
pub async fn run(settings: &Arc<Settings>) -> Result<(), DaemonError> {
    let mut guard = LifecycleGuard::acquire(default_marker_path())?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let source = IlluminanceSource::from_settings(settings);
    let policy = settings.sleep_policy();
    let mut publisher = SensorPublisher::open(&settings.sensor.base_dir)?;

    tracing::info!(
        mode = ?settings.sampling.mode,
        sensor = %settings.sensor.base_dir.display(),
        "fake light sensor started"
    );

    let mut previous: Option<i64> = None;
    let result = loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                break Ok(());
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, shutting down");
                break Ok(());
            }
            outcome = cycle(&source, &policy, &mut publisher, previous) => match outcome {
                Ok(lux) => previous = Some(lux),
                // Sampling failures are fatal, not skipped.
                Err(e) => break Err(e),
            }
        }
    };

    guard.release();

    result
}

/// One `Sampling -> Publishing -> Waiting` pass, returning the lux value so
/// the caller can carry it into the next cycle's change detection.
async fn cycle(
    source: &IlluminanceSource,
    policy: &SleepPolicy,
    publisher: &mut SensorPublisher,
    previous: Option<i64>,
) -> Result<i64, DaemonError> {
    let lux = source.sample().await?;

    if publisher.publish_if_changed(lux, previous)? {
        tracing::info!(lux, "published illuminance");
    } else {
        tracing::debug!(lux, "illuminance unchanged, write skipped");
    }

    let delay = next_delay(policy, lux);
    tracing::debug!(secs = delay.as_secs_f64(), "waiting before next sample");
    sleep(delay).await;

    Ok(lux)
}
