// Alert dispatcher - emergency broadcast with share-then-SMS fallback
use crate::application::alert_log::AlertLog;
use crate::application::contact_store::ContactStore;
use crate::application::share_transport::{ShareRequest, ShareTransport};
use crate::application::tracking_controller::TrackingController;
use crate::application::ui::{IntentLauncher, ToastKind, UiSink};
use crate::domain::alert::{ALERT_TITLE, AlertRecord, sms_uri};
use crate::domain::location::LocationError;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum AlertOutcome {
    /// The share transport accepted the alert.
    Shared,
    /// An SMS compose intent was handed off; delivery is unknown.
    SmsComposed { recipients: usize },
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("no location available for the alert: {0}")]
    Location(#[from] LocationError),
}

pub struct AlertDispatcher {
    tracker: Arc<TrackingController>,
    contacts: Arc<ContactStore>,
    share: Option<Arc<dyn ShareTransport>>,
    launcher: Arc<dyn IntentLauncher>,
    log: Arc<AlertLog>,
    ui: Arc<dyn UiSink>,
}

impl AlertDispatcher {
    pub fn new(
        tracker: Arc<TrackingController>,
        contacts: Arc<ContactStore>,
        share: Option<Arc<dyn ShareTransport>>,
        launcher: Arc<dyn IntentLauncher>,
        log: Arc<AlertLog>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            tracker,
            contacts,
            share,
            launcher,
            log,
            ui,
        }
    }

    /// Sends the emergency alert and logs it.
    ///
    /// Waits for a location first, fetching one if none is known yet. Tries the
    /// share transport, then falls back to an SMS compose intent addressed to every
    /// stored contact. Exactly one record is appended once a location is known,
    /// whatever happens to the transport.
    pub async fn send_emergency_alert(&self) -> Result<AlertOutcome, AlertError> {
        let sample = self.tracker.current_or_fetch().await?;
        let record = AlertRecord::emergency(sample, Utc::now());

        let outcome = if self.try_share(&record).await {
            self.ui.toast("Emergency alert sent!", ToastKind::Success);
            AlertOutcome::Shared
        } else {
            self.compose_sms(&record.message)
        };

        tracing::info!(?outcome, "Emergency alert dispatched");
        if let Err(e) = self.log.append(record) {
            tracing::error!("Failed to save emergency log: {}", e);
            self.ui.error("Emergency log could not be saved.");
        }

        Ok(outcome)
    }

    /// Opens an SMS compose window carrying the current share message, without recipients.
    pub fn share_location_via_sms(&self) -> Option<String> {
        let message = self.location_message()?;
        let uri = sms_uri(&[], &message);
        self.launcher.launch(&uri);
        Some(uri)
    }

    /// Address-based message once geocoded, coordinates otherwise.
    pub fn location_message(&self) -> Option<String> {
        if let Some(address) = self.tracker.latest_address() {
            return Some(address.share_message());
        }
        self.tracker.current().map(|s| {
            format!(
                "My current location is: ({:.6}, {:.6})",
                s.latitude(),
                s.longitude()
            )
        })
    }

    async fn try_share(&self, record: &AlertRecord) -> bool {
        let Some(share) = self.share.as_ref().filter(|s| s.is_available()) else {
            return false;
        };

        let request = ShareRequest {
            title: ALERT_TITLE.to_string(),
            text: record.message.clone(),
            url: record.maps_url.clone(),
        };

        match share.share(&request).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Share failed, falling back to SMS: {}", e);
                false
            }
        }
    }

    fn compose_sms(&self, message: &str) -> AlertOutcome {
        let phones = self.contacts.phone_numbers();
        let uri = sms_uri(&phones, message);
        self.launcher.launch(&uri);
        AlertOutcome::SmsComposed {
            recipients: phones.len(),
        }
    }
}
