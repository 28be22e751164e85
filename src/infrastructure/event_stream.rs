// UI event broadcasting and newline-delimited JSON streaming
use crate::application::ui::{IntentLauncher, ToastKind, UiSink};
use crate::domain::location::{AddressSummary, PositionSample};
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    LocationUpdated {
        sample: PositionSample,
        coordinates: String,
        last_update: String,
    },
    AddressResolved {
        address: String,
        share_message: String,
    },
    TrackingChanged {
        active: bool,
        status: &'static str,
    },
    Error {
        message: String,
    },
    Toast {
        message: String,
        kind: ToastKind,
    },
    OpenIntent {
        uri: String,
    },
}

/// Fans UI events out to every connected client. Events sent with no client connected are dropped.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No UI clients connected, event dropped");
        }
    }
}

impl UiSink for EventBroadcaster {
    fn location_updated(&self, sample: &PositionSample) {
        self.publish(UiEvent::LocationUpdated {
            sample: sample.clone(),
            coordinates: sample.display_coordinates(),
            last_update: sample.captured_at().format("%H:%M").to_string(),
        });
    }

    fn address_resolved(&self, address: &AddressSummary) {
        self.publish(UiEvent::AddressResolved {
            address: address.address.clone(),
            share_message: address.share_message(),
        });
    }

    fn tracking_changed(&self, active: bool) {
        let status = if active {
            "Live Tracking Active"
        } else {
            "Tracking Paused"
        };
        self.publish(UiEvent::TrackingChanged { active, status });
    }

    fn error(&self, message: &str) {
        self.publish(UiEvent::Error {
            message: message.to_string(),
        });
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        self.publish(UiEvent::Toast {
            message: message.to_string(),
            kind,
        });
    }
}

impl IntentLauncher for EventBroadcaster {
    fn launch(&self, uri: &str) {
        tracing::info!("Handing off intent {}", uri.split('?').next().unwrap_or(uri));
        self.publish(UiEvent::OpenIntent {
            uri: uri.to_string(),
        });
    }
}

/// One event per line.
fn encode_event(event: &UiEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_vec(event)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Streams events from `rx` as a chunked `application/x-ndjson` response.
pub fn event_stream_response(rx: broadcast::Receiver<UiEvent>) -> Result<Response<Body>, StatusCode> {
    let mut events = BroadcastStream::new(rx);

    let stream = async_stream::stream! {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => yield encode_event(&event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("UI client lagging, skipped {} events", skipped);
                }
            }
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
