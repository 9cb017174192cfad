// Tracking service - owns the selection state and coordinates poller and summary fetches
use crate::application::directory::{RefreshOutcome, RentalDirectory};
use crate::application::location_poller::{LocationPoller, PollHandle, PollSink, DEFAULT_POLL_INTERVAL};
use crate::application::rental_repository::{bounded, RentalRepository};
use crate::application::selection::{classify, SelectionEffect, BLOCKED_NOTICE};
use crate::application::summary_fetcher::{describe_failure, TripSummaryFetcher};
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::location::{LocationSample, TripSummary, Viewport};
use crate::domain::rental::RentalRecord;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

pub const NO_TELEMETRY_MESSAGE: &str = "No live telemetry for this trip yet.";

#[derive(Debug, Clone)]
pub struct TrackingSettings {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub follow_zoom: f64,
    pub default_viewport: Viewport,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: Duration::from_secs(10),
            follow_zoom: 15.0,
            default_viewport: Viewport::default(),
        }
    }
}

/// Detail panel content. Holding at most one of sample/summary is what keeps
/// the two mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Idle,
    Notice(String),
    /// Selection made, first result not in yet
    Pending,
    Live(LocationSample),
    Summary(TripSummary),
    Unavailable(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    RentalNotStarted,
    NoTelemetry,
    SummaryUnavailable,
    RefreshFailed,
}

/// One-time, user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct TrackingSnapshot {
    pub directory: RentalDirectory,
    pub selected: Option<RentalRecord>,
    pub detail: Detail,
    pub viewport: Viewport,
    pub notice: Option<Advisory>,
    /// Rental with a live poll, if any
    pub polling: Option<String>,
    pub generation: u64,
}

struct TrackingState {
    directory: RentalDirectory,
    selected: Option<RentalRecord>,
    generation: u64,
    detail: Detail,
    viewport: Viewport,
    advised_generation: Option<u64>,
    notice: Option<Advisory>,
    poll: Option<PollHandle>,
    summary_task: Option<JoinHandle<()>>,
}

impl TrackingState {
    fn stop_workers(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.stop();
        }
        if let Some(task) = self.summary_task.take() {
            task.abort();
        }
    }

    fn is_current(&self, generation: u64, rental_id: &str) -> bool {
        self.generation == generation
            && self
                .selected
                .as_ref()
                .map(|r| r.rental_id == rental_id)
                .unwrap_or(false)
    }
}

struct TrackingShared {
    repository: Arc<dyn RentalRepository>,
    settings: TrackingSettings,
    poller: LocationPoller,
    summaries: TripSummaryFetcher,
    state: Mutex<TrackingState>,
    advisories: broadcast::Sender<Advisory>,
    revision: watch::Sender<u64>,
    closing: watch::Sender<bool>,
}

impl TrackingShared {
    fn lock(&self) -> MutexGuard<'_, TrackingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn changed(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn advise(&self, state: &mut TrackingState, kind: AdvisoryKind, message: &str) {
        let advisory = Advisory {
            kind,
            message: message.to_string(),
            generation: state.generation,
        };
        tracing::info!("Advisory {:?}: {}", kind, message);
        state.notice = Some(advisory.clone());
        // No subscribers is fine
        let _ = self.advisories.send(advisory);
    }

    fn apply_summary(&self, generation: u64, rental_id: &str, result: TrackingResult<TripSummary>) {
        let mut state = self.lock();
        if !state.is_current(generation, rental_id) {
            tracing::debug!("Dropping stale summary for rental {} (generation {})", rental_id, generation);
            return;
        }

        state.summary_task = None;
        match result {
            Ok(summary) => {
                tracing::info!(
                    "Trip summary for rental {}: {} km, {} L",
                    rental_id,
                    summary.total_distance,
                    summary.total_fuel
                );
                state.detail = Detail::Summary(summary);
            }
            Err(e) => {
                let message = describe_failure(&e);
                state.detail = match e {
                    TrackingError::NotFound(_) => Detail::Unavailable(message.to_string()),
                    _ => Detail::Failed(message.to_string()),
                };
                self.advise(&mut state, AdvisoryKind::SummaryUnavailable, message);
            }
        }
        drop(state);
        self.changed();
    }
}

impl PollSink for TrackingShared {
    fn on_sample(&self, generation: u64, rental_id: &str, sample: LocationSample) -> bool {
        let mut state = self.lock();
        if !state.is_current(generation, rental_id) {
            return false;
        }

        state.viewport = Viewport::following(&sample, self.settings.follow_zoom);
        state.detail = Detail::Live(sample);
        drop(state);
        self.changed();
        true
    }

    fn on_not_found(&self, generation: u64, rental_id: &str) -> bool {
        let mut state = self.lock();
        if !state.is_current(generation, rental_id) {
            return false;
        }

        let unavailable = Detail::Unavailable(NO_TELEMETRY_MESSAGE.to_string());
        let moved = state.detail != unavailable || state.viewport != self.settings.default_viewport;
        state.viewport = self.settings.default_viewport;
        state.detail = unavailable;

        // Once per selection
        if state.advised_generation != Some(generation) {
            state.advised_generation = Some(generation);
            self.advise(&mut state, AdvisoryKind::NoTelemetry, NO_TELEMETRY_MESSAGE);
        } else if !moved {
            return true;
        }

        drop(state);
        self.changed();
        true
    }
}

#[derive(Clone)]
pub struct TrackingService {
    shared: Arc<TrackingShared>,
}

impl TrackingService {
    pub fn new(repository: Arc<dyn RentalRepository>, settings: TrackingSettings) -> Self {
        let poller = LocationPoller::new(repository.clone(), settings.poll_interval, settings.fetch_timeout);
        let summaries = TripSummaryFetcher::new(repository.clone(), settings.fetch_timeout);
        let (advisories, _) = broadcast::channel(32);
        let (revision, _) = watch::channel(0);
        let (closing, _) = watch::channel(false);

        let state = TrackingState {
            directory: RentalDirectory::new(),
            selected: None,
            generation: 0,
            detail: Detail::Idle,
            viewport: settings.default_viewport,
            advised_generation: None,
            notice: None,
            poll: None,
            summary_task: None,
        };

        Self {
            shared: Arc::new(TrackingShared {
                repository,
                settings,
                poller,
                summaries,
                state: Mutex::new(state),
                advisories,
                revision,
                closing,
            }),
        }
    }

    /// Fetch the directory. On failure the previous list stays in place and
    /// the error is kept for the banner.
    pub async fn refresh(&self) -> TrackingResult<usize> {
        let seq = self.shared.lock().directory.begin_refresh();
        let result = bounded(
            self.shared.settings.fetch_timeout,
            self.shared.repository.list_rentals(),
        )
        .await;

        let mut state = self.shared.lock();
        match state.directory.apply(seq, result) {
            RefreshOutcome::Applied(count) => {
                tracing::info!("Loaded {} rentals", count);
                Self::reconcile_selection(&self.shared, &mut state);
                drop(state);
                self.shared.changed();
                Ok(count)
            }
            RefreshOutcome::Stale => {
                tracing::debug!("Discarding stale rental refresh #{}", seq);
                Ok(state.directory.records().len())
            }
            RefreshOutcome::Failed(err) => {
                tracing::error!("Failed to refresh rentals: {}", err);
                let message = format!("Could not refresh rentals: {}", err);
                self.shared.advise(&mut state, AdvisoryKind::RefreshFailed, &message);
                drop(state);
                self.shared.changed();
                Err(err)
            }
        }
    }

    pub fn select(&self, rental_id: &str) -> TrackingResult<SelectionEffect> {
        let mut state = self.shared.lock();
        let record = state
            .directory
            .find(rental_id)
            .cloned()
            .ok_or_else(|| TrackingError::NotFound(format!("rental {}", rental_id)))?;

        let effect = Self::apply_selection(&self.shared, &mut state, record);
        drop(state);
        self.shared.changed();
        Ok(effect)
    }

    pub fn clear_selection(&self) {
        let mut state = self.shared.lock();
        state.stop_workers();
        state.generation += 1;
        state.selected = None;
        state.detail = Detail::Idle;
        state.viewport = self.shared.settings.default_viewport;
        state.notice = None;
        drop(state);
        self.shared.changed();
    }

    /// Release every worker tied to the view and end open change streams.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        self.clear_selection();
        if !self.shared.closing.send_replace(true) {
            tracing::info!("Tracking view closed");
        }
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        let state = self.shared.lock();
        TrackingSnapshot {
            directory: state.directory.clone(),
            selected: state.selected.clone(),
            detail: state.detail.clone(),
            viewport: state.viewport,
            notice: state.notice.clone(),
            polling: state
                .poll
                .as_ref()
                .filter(|p| p.is_active())
                .map(|p| p.rental_id().to_string()),
            generation: state.generation,
        }
    }

    pub fn subscribe_advisories(&self) -> broadcast::Receiver<Advisory> {
        self.shared.advisories.subscribe()
    }

    /// Ticks once per state change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Flips to `true` once `shutdown` runs.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shared.closing.subscribe()
    }

    fn apply_selection(
        shared: &Arc<TrackingShared>,
        state: &mut TrackingState,
        record: RentalRecord,
    ) -> SelectionEffect {
        // Previous poll must be gone before anything new starts
        state.stop_workers();
        state.generation += 1;
        let generation = state.generation;

        let effect = classify(&record);
        tracing::info!(
            "Selected rental {} ({}) -> {:?}, generation {}",
            record.rental_id,
            record.status,
            effect,
            generation
        );
        state.selected = Some(record);
        state.notice = None;
        // Map recentres until the new rental reports a position
        state.viewport = shared.settings.default_viewport;

        match &effect {
            SelectionEffect::ShowBlockedNotice => {
                state.detail = Detail::Notice(BLOCKED_NOTICE.to_string());
                shared.advise(state, AdvisoryKind::RentalNotStarted, BLOCKED_NOTICE);
            }
            SelectionEffect::StartPolling(rental_id) => {
                state.detail = Detail::Pending;
                let weak: Weak<TrackingShared> = Arc::downgrade(shared);
                let sink: Weak<dyn PollSink> = weak;
                state.poll = Some(shared.poller.start(rental_id, generation, sink));
            }
            SelectionEffect::FetchSummaryOnce(rental_id) => {
                state.detail = Detail::Pending;
                let weak = Arc::downgrade(shared);
                let fetcher = shared.summaries.clone();
                let rental_id = rental_id.clone();
                state.summary_task = Some(tokio::spawn(async move {
                    let result = fetcher.fetch_once(&rental_id).await;
                    if let Some(shared) = weak.upgrade() {
                        shared.apply_summary(generation, &rental_id, result);
                    }
                }));
            }
            SelectionEffect::NoAction => {
                state.detail = Detail::Idle;
            }
        }

        effect
    }

    /// Re-run the selection when a refresh changed the selected rental's status.
    fn reconcile_selection(shared: &Arc<TrackingShared>, state: &mut TrackingState) {
        let Some(selected) = state.selected.clone() else {
            return;
        };

        match state.directory.find(&selected.rental_id).cloned() {
            Some(fresh) if fresh.status != selected.status => {
                tracing::info!(
                    "Rental {} moved from {} to {}",
                    fresh.rental_id,
                    selected.status,
                    fresh.status
                );
                Self::apply_selection(shared, state, fresh);
            }
            Some(fresh) => state.selected = Some(fresh),
            None => {
                tracing::debug!("Selected rental {} missing from refresh", selected.rental_id);
            }
        }
    }
}
