// Location poller - fixed-interval realtime location fetch for one rental
use crate::application::rental_repository::{bounded, RentalRepository};
use crate::domain::error::TrackingError;
use crate::domain::location::LocationSample;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Receiver of poll results. Each method returns `false` once the poll's
/// generation is no longer current, which ends the poll loop.
pub trait PollSink: Send + Sync {
    fn on_sample(&self, generation: u64, rental_id: &str, sample: LocationSample) -> bool;

    fn on_not_found(&self, generation: u64, rental_id: &str) -> bool;
}

/// Running poll. Stopping is idempotent and also happens on drop.
#[derive(Debug)]
pub struct PollHandle {
    rental_id: String,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn rental_id(&self) -> &str {
        &self.rental_id
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(
                "Stopped location poll for rental {} (generation {})",
                self.rental_id,
                self.generation
            );
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
pub struct LocationPoller {
    repository: Arc<dyn RentalRepository>,
    interval: Duration,
    fetch_timeout: Duration,
}

impl LocationPoller {
    pub fn new(repository: Arc<dyn RentalRepository>, interval: Duration, fetch_timeout: Duration) -> Self {
        Self {
            repository,
            interval,
            fetch_timeout,
        }
    }

    /// Spawn the poll loop. The first fetch happens immediately.
    pub fn start(&self, rental_id: &str, generation: u64, sink: Weak<dyn PollSink>) -> PollHandle {
        let repository = self.repository.clone();
        let fetch_timeout = self.fetch_timeout;
        let id = rental_id.to_string();

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Starting location poll for rental {} every {:?} (generation {})",
            rental_id,
            self.interval,
            generation
        );

        let task = tokio::spawn(async move {
            let mut ticks = IntervalStream::new(interval);

            while ticks.next().await.is_some() {
                let result = bounded(fetch_timeout, repository.realtime_location(&id)).await;

                let Some(sink) = sink.upgrade() else {
                    break;
                };

                let current = match result {
                    Ok(sample) => {
                        tracing::debug!(
                            "Rental {} at ({}, {}) speed {}",
                            id,
                            sample.longitude,
                            sample.latitude,
                            sample.speed
                        );
                        sink.on_sample(generation, &id, sample)
                    }
                    Err(TrackingError::NotFound(_)) => sink.on_not_found(generation, &id),
                    Err(e) if e.is_transient() => {
                        tracing::warn!("Location fetch for rental {} failed, retrying next tick: {}", id, e);
                        true
                    }
                    Err(e) => {
                        tracing::error!("Location fetch for rental {} rejected: {}", id, e);
                        true
                    }
                };

                if !current {
                    tracing::debug!("Location poll for rental {} superseded", id);
                    break;
                }
            }
        });

        PollHandle {
            rental_id: rental_id.to_string(),
            generation,
            task: Some(task),
        }
    }
}
