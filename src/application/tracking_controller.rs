// Tracking controller - polling state machine around a position source
//
// Idle: no timer. Active: a repeating timer spawns one independent fetch per
// tick. Fetches are never awaited by the timer, so two may be in flight and
// the last one to complete wins `current`. stop() cannot cancel an in-flight
// fetch; unless stale samples are discarded, a late sample still lands in
// `current` and the history after tracking has stopped.
use crate::application::geocoder::{GeocodeError, GeocodeResolver};
use crate::application::history_store::HistoryStore;
use crate::application::position_source::PositionSource;
use crate::application::ui::UiSink;
use crate::domain::location::{AddressSummary, LocationError, PositionOptions, PositionSample};
use crate::domain::settings::DEFAULT_INTERVAL_MS;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    pub position: PositionOptions,
    pub interval: Duration,
    /// Drop completions that are older than the applied sample or predate the last stop().
    pub discard_stale_samples: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            position: PositionOptions::default(),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            discard_stale_samples: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("polling interval must be greater than zero")]
    ZeroInterval,
}

struct TrackingState {
    interval: Duration,
    current: Option<PositionSample>,
    address: Option<AddressSummary>,
    /// Present exactly while tracking is active.
    timer: Option<JoinHandle<()>>,
    /// Last generation handed to a fetch.
    issued: u64,
    /// Generation of the sample held in `current`.
    applied: u64,
    /// Generations at or below this were issued before the last stop().
    fence: u64,
}

pub struct TrackingController {
    source: Arc<dyn PositionSource>,
    geocoder: Arc<dyn GeocodeResolver>,
    history: Arc<HistoryStore>,
    ui: Arc<dyn UiSink>,
    position_options: PositionOptions,
    discard_stale: bool,
    state: Mutex<TrackingState>,
}

impl TrackingController {
    pub fn new(
        source: Arc<dyn PositionSource>,
        geocoder: Arc<dyn GeocodeResolver>,
        history: Arc<HistoryStore>,
        ui: Arc<dyn UiSink>,
        options: TrackerOptions,
    ) -> Result<Arc<Self>, TrackingError> {
        if options.interval.is_zero() {
            return Err(TrackingError::ZeroInterval);
        }

        Ok(Arc::new(Self {
            source,
            geocoder,
            history,
            ui,
            position_options: options.position,
            discard_stale: options.discard_stale_samples,
            state: Mutex::new(TrackingState {
                interval: options.interval,
                current: None,
                address: None,
                timer: None,
                issued: 0,
                applied: 0,
                fence: 0,
            }),
        }))
    }

    pub fn is_active(&self) -> bool {
        self.state().timer.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.state().interval
    }

    pub fn current(&self) -> Option<PositionSample> {
        self.state().current.clone()
    }

    pub fn latest_address(&self) -> Option<AddressSummary> {
        self.state().address.clone()
    }

    pub fn history(&self) -> Vec<PositionSample> {
        self.history.entries()
    }

    /// Fetches once now, then once per interval. No-op while already active.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state();
            if state.timer.is_some() {
                return;
            }
            state.timer = Some(self.spawn_timer(state.interval));
            tracing::info!("Tracking started (every {:?})", state.interval);
        }

        self.spawn_fetch();
        self.ui.tracking_changed(true);
    }

    /// Cancels the timer. Keeps `current` and the history.
    pub fn stop(&self) {
        let timer = {
            let mut state = self.state();
            let Some(timer) = state.timer.take() else {
                return;
            };
            state.fence = state.issued;
            timer
        };

        timer.abort();
        tracing::info!("Tracking stopped");
        self.ui.tracking_changed(false);
    }

    /// Changes the polling period. While active the timer is re-armed with it straight away.
    pub fn set_interval(self: &Arc<Self>, interval: Duration) -> Result<(), TrackingError> {
        if interval.is_zero() {
            return Err(TrackingError::ZeroInterval);
        }

        let mut state = self.state();
        state.interval = interval;
        if let Some(old) = state.timer.take() {
            old.abort();
            state.timer = Some(self.spawn_timer(interval));
            tracing::debug!("Tracking timer re-armed (every {:?})", interval);
        }
        Ok(())
    }

    /// The current sample, or the result of exactly one fresh fetch when there is none.
    pub async fn current_or_fetch(self: &Arc<Self>) -> Result<PositionSample, LocationError> {
        if let Some(sample) = self.current() {
            return Ok(sample);
        }
        self.refresh().await
    }

    /// One fetch outside the timer, applied like any tick.
    pub async fn refresh(self: &Arc<Self>) -> Result<PositionSample, LocationError> {
        let generation = self.issue_generation();
        self.fetch(generation).await
    }

    async fn fetch(self: &Arc<Self>, generation: u64) -> Result<PositionSample, LocationError> {
        match self.source.fetch_once(&self.position_options).await {
            Ok(sample) => {
                self.on_sample(generation, sample.clone());
                Ok(sample)
            }
            Err(e) => {
                self.on_failure(e);
                Err(e)
            }
        }
    }

    fn spawn_timer(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        let first_tick = Instant::now() + period;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                tracing::debug!("Tracking tick");
                controller.spawn_fetch();
            }
        })
    }

    fn spawn_fetch(self: &Arc<Self>) {
        // Tagged at issue time, not when the task first runs.
        let generation = self.issue_generation();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let _ = controller.fetch(generation).await;
        });
    }

    fn issue_generation(&self) -> u64 {
        let mut state = self.state();
        state.issued += 1;
        state.issued
    }

    fn on_sample(self: &Arc<Self>, generation: u64, sample: PositionSample) {
        {
            let mut state = self.state();
            if self.discard_stale && (generation <= state.applied || generation <= state.fence) {
                tracing::debug!(
                    generation,
                    applied = state.applied,
                    fence = state.fence,
                    "Discarding stale sample"
                );
                return;
            }
            state.applied = state.applied.max(generation);
            state.current = Some(sample.clone());
        }

        if let Err(e) = self.history.record(sample.clone()) {
            tracing::error!("Failed to save location history: {}", e);
            self.ui.error("Location history could not be saved.");
        }

        self.ui.location_updated(&sample);
        self.spawn_geocode(&sample);
    }

    fn on_failure(&self, error: LocationError) {
        tracing::warn!("Location fetch failed: {}", error);
        self.ui.error(error.user_message());
    }

    fn spawn_geocode(self: &Arc<Self>, sample: &PositionSample) {
        let controller: Weak<Self> = Arc::downgrade(self);
        let geocoder = Arc::clone(&self.geocoder);
        let ui = Arc::clone(&self.ui);
        let (latitude, longitude) = (sample.latitude(), sample.longitude());

        tokio::spawn(async move {
            match geocoder.resolve(latitude, longitude).await {
                Ok(address) => {
                    if let Some(controller) = controller.upgrade() {
                        controller.state().address = Some(address.clone());
                    }
                    ui.address_resolved(&address);
                }
                Err(GeocodeError::Disabled) => {
                    tracing::debug!("Geocoding disabled, skipping address lookup");
                }
                Err(e) => {
                    tracing::warn!("Reverse geocoding error: {}", e);
                    ui.error("Address lookup failed.");
                }
            }
        });
    }

    fn state(&self) -> MutexGuard<'_, TrackingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FixedGeocoder, RecordingUi, ScriptedSource, UiCall, sample, settle};
    use crate::infrastructure::memory_store::MemoryStore;

    struct Harness {
        source: Arc<ScriptedSource>,
        ui: Arc<RecordingUi>,
        history: Arc<HistoryStore>,
        controller: Arc<TrackingController>,
    }

    fn harness(source: ScriptedSource, interval: Duration, discard_stale_samples: bool) -> Harness {
        let source = Arc::new(source);
        let ui = Arc::new(RecordingUi::default());
        let history = Arc::new(HistoryStore::load(Arc::new(MemoryStore::new())));
        let controller = TrackingController::new(
            source.clone(),
            Arc::new(FixedGeocoder(Ok("1 Main St, Springfield, Ohio, USA"))),
            history.clone(),
            ui.clone(),
            TrackerOptions {
                interval,
                discard_stale_samples,
                ..TrackerOptions::default()
            },
        )
        .unwrap();

        Harness {
            source,
            ui,
            history,
            controller,
        }
    }

    fn ok_source() -> ScriptedSource {
        ScriptedSource::always(Ok(sample(1.0, 2.0)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_makes_second_fetch() {
        let h = harness(ok_source(), Duration::from_millis(60_000), false);

        h.controller.start();
        settle().await;
        assert_eq!(h.source.calls(), 1);

        tokio::time::advance(Duration::from_millis(59_999)).await;
        settle().await;
        assert_eq!(h.source.calls(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(h.source.calls(), 2);
        assert!(h.controller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        h.controller.start();
        h.controller.start();
        settle().await;

        assert_eq!(h.source.calls(), 1);
        let status_changes = h
            .ui
            .calls()
            .into_iter()
            .filter(|c| matches!(c, UiCall::Tracking(_)))
            .count();
        assert_eq!(status_changes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_ticks() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        h.controller.start();
        h.controller.stop();
        settle().await;
        assert!(!h.controller.is_active());

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(h.source.calls(), 1);

        // stop keeps what was already collected
        assert!(h.controller.current().is_some());
        assert_eq!(h.history.len(), 1);
        assert!(h.ui.calls().contains(&UiCall::Tracking(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_rearms_active_timer() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        h.controller.start();
        settle().await;
        h.controller.set_interval(Duration::from_secs(10)).unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(h.source.calls(), 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(h.source.calls(), 3);
        assert_eq!(h.controller.interval(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_while_idle_does_not_start() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        h.controller.set_interval(Duration::from_secs(5)).unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert!(!h.controller.is_active());
        assert_eq!(h.source.calls(), 0);
        assert_eq!(
            h.controller.set_interval(Duration::ZERO),
            Err(TrackingError::ZeroInterval)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_delay_next_tick() {
        let source = ok_source().with_delay(Duration::from_secs(90));
        let h = harness(source, Duration::from_secs(60), false);

        h.controller.start();
        settle().await;
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(h.source.calls(), 2);
        assert!(h.controller.current().is_none());
    }

    #[tokio::test]
    async fn test_current_or_fetch_fetches_only_when_empty() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        let first = h.controller.current_or_fetch().await.unwrap();
        assert_eq!(h.source.calls(), 1);

        let second = h.controller.current_or_fetch().await.unwrap();
        assert_eq!(h.source.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(h.history.len(), 1);
    }

    #[tokio::test]
    async fn test_permission_denied_reports_and_keeps_state() {
        let source = ScriptedSource::always(Err(LocationError::PermissionDenied));
        let h = harness(source, Duration::from_secs(60), false);

        let err = h.controller.refresh().await.unwrap_err();

        assert_eq!(err, LocationError::PermissionDenied);
        assert_eq!(
            h.ui.errors(),
            vec!["Location permission denied. Please enable location services."]
        );
        assert!(h.controller.current().is_none());
        assert_eq!(h.history.len(), 0);
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_current() {
        let source = ScriptedSource::always(Err(LocationError::Timeout)).then(Ok(sample(3.0, 4.0)));
        let h = harness(source, Duration::from_secs(60), false);

        h.controller.refresh().await.unwrap();
        assert!(h.controller.refresh().await.is_err());

        assert_eq!(h.controller.current(), Some(sample(3.0, 4.0)));
        assert_eq!(h.ui.errors(), vec!["Location request timed out."]);
    }

    #[tokio::test]
    async fn test_sample_is_geocoded_in_background() {
        let h = harness(ok_source(), Duration::from_secs(60), false);

        h.controller.refresh().await.unwrap();
        settle().await;

        let address = h.controller.latest_address().unwrap();
        assert_eq!(address.address, "1 Main St, Springfield, Ohio");
        assert!(h.ui.calls().contains(&UiCall::Address(address.address.clone())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_sample_after_stop_is_kept_by_default() {
        let source = ok_source().with_delay(Duration::from_secs(5));
        let h = harness(source, Duration::from_secs(60), false);

        h.controller.start();
        settle().await;
        h.controller.stop();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(h.controller.current().is_some());
        assert_eq!(h.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_sample_after_stop_is_dropped_when_discarding_stale() {
        let source = ok_source().with_delay(Duration::from_secs(5));
        let h = harness(source, Duration::from_secs(60), true);

        h.controller.start();
        settle().await;
        h.controller.stop();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(h.controller.current().is_none());
        assert_eq!(h.history.len(), 0);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = TrackingController::new(
            Arc::new(ok_source()),
            Arc::new(FixedGeocoder(Err(()))),
            Arc::new(HistoryStore::load(Arc::new(MemoryStore::new()))),
            Arc::new(RecordingUi::default()),
            TrackerOptions {
                interval: Duration::ZERO,
                ..TrackerOptions::default()
            },
        );
        assert!(matches!(result, Err(TrackingError::ZeroInterval)));
    }
}
