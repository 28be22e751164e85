// Test doubles for the application ports
use crate::application::geocoder::{GeocodeError, GeocodeResolver};
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey};
use crate::application::position_source::PositionSource;
use crate::application::share_transport::{ShareError, ShareRequest, ShareTransport};
use crate::application::ui::{IntentLauncher, ToastKind, UiSink};
use crate::domain::location::{AddressSummary, LocationError, PositionOptions, PositionSample};
use crate::infrastructure::memory_store::MemoryStore;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn sample(latitude: f64, longitude: f64) -> PositionSample {
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    PositionSample::new(latitude, longitude, 5.0, t).unwrap()
}

/// Yields enough times for spawned fetch and timer tasks to run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Pops scripted results in order, then repeats `fallback`.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<PositionSample, LocationError>>>,
    fallback: Result<PositionSample, LocationError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn always(result: Result<PositionSample, LocationError>) -> Self {
        Self {
            script: Mutex::default(),
            fallback: result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then(self, result: Result<PositionSample, LocationError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    async fn fetch_once(&self, _options: &PositionOptions) -> Result<PositionSample, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FixedGeocoder(pub Result<&'static str, ()>);

#[async_trait]
impl GeocodeResolver for FixedGeocoder {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<AddressSummary, GeocodeError> {
        match self.0 {
            Ok(name) => Ok(AddressSummary::from_display_name(name, latitude, longitude)),
            Err(()) => Err(GeocodeError::Status(503)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    Location(PositionSample),
    Address(String),
    Tracking(bool),
    Error(String),
    Toast(String, ToastKind),
    Intent(String),
}

/// Records every UI and intent call in order.
#[derive(Default)]
pub struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn intents(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Intent(uri) => Some(uri),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: UiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UiSink for RecordingUi {
    fn location_updated(&self, sample: &PositionSample) {
        self.push(UiCall::Location(sample.clone()));
    }

    fn address_resolved(&self, address: &AddressSummary) {
        self.push(UiCall::Address(address.address.clone()));
    }

    fn tracking_changed(&self, active: bool) {
        self.push(UiCall::Tracking(active));
    }

    fn error(&self, message: &str) {
        self.push(UiCall::Error(message.to_string()));
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        self.push(UiCall::Toast(message.to_string(), kind));
    }
}

impl IntentLauncher for RecordingUi {
    fn launch(&self, uri: &str) {
        self.push(UiCall::Intent(uri.to_string()));
    }
}

pub enum ShareBehaviour {
    Succeed,
    Cancel,
    Unavailable,
}

pub struct FakeShare {
    behaviour: ShareBehaviour,
    requests: Mutex<Vec<ShareRequest>>,
}

impl FakeShare {
    pub fn new(behaviour: ShareBehaviour) -> Self {
        Self {
            behaviour,
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<ShareRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShareTransport for FakeShare {
    fn is_available(&self) -> bool {
        !matches!(self.behaviour, ShareBehaviour::Unavailable)
    }

    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behaviour {
            ShareBehaviour::Succeed => Ok(()),
            ShareBehaviour::Cancel => Err(ShareError::Cancelled),
            ShareBehaviour::Unavailable => Err(ShareError::Unsupported),
        }
    }
}

/// Memory store whose first save stalls, so a second writer can overtake it.
#[derive(Default)]
pub struct SlowFirstSave {
    inner: MemoryStore,
    saves: AtomicUsize,
}

impl SlowFirstSave {
    pub const STALL: Duration = Duration::from_millis(200);
}

impl KeyValueStore for SlowFirstSave {
    fn load(&self, key: StoreKey) -> Result<Option<Value>, PersistenceError> {
        self.inner.load(key)
    }

    fn save(&self, key: StoreKey, value: &Value) -> Result<(), PersistenceError> {
        if self.saves.fetch_add(1, Ordering::SeqCst) == 0 {
            std::thread::sleep(Self::STALL);
        }
        self.inner.save(key, value)
    }
}
