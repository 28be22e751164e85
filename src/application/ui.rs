// UI collaborator traits
use crate::domain::location::{AddressSummary, PositionSample};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
}

/// Receives everything the tracker wants rendered.
pub trait UiSink: Send + Sync {
    fn location_updated(&self, sample: &PositionSample);

    fn address_resolved(&self, address: &AddressSummary);

    fn tracking_changed(&self, active: bool);

    /// Transient error banner.
    fn error(&self, message: &str);

    fn toast(&self, message: &str, kind: ToastKind);
}

/// Hands a URI (e.g. `sms:`) to the platform. Whether anything was sent is not observable.
pub trait IntentLauncher: Send + Sync {
    fn launch(&self, uri: &str);
}
