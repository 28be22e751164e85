// Command dispatcher - closed set of user actions
use crate::application::alert_dispatcher::{AlertDispatcher, AlertError, AlertOutcome};
use crate::application::persistence::PersistenceError;
use crate::application::settings_store::SettingsStore;
use crate::application::tracking_controller::{TrackingController, TrackingError};
use crate::application::ui::{ToastKind, UiSink};
use crate::domain::location::{LocationError, PositionSample};
use crate::domain::settings::TrackerSettings;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartTracking,
    StopTracking,
    UpdateLocation,
    SendAlert,
    ShareSms,
    CopyLocation,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::StartTracking,
        Action::StopTracking,
        Action::UpdateLocation,
        Action::SendAlert,
        Action::ShareSms,
        Action::CopyLocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::StartTracking => "start-tracking",
            Action::StopTracking => "stop-tracking",
            Action::UpdateLocation => "update-location",
            Action::SendAlert => "send-alert",
            Action::ShareSms => "share-sms",
            Action::CopyLocation => "copy-location",
        }
    }
}

impl FromStr for Action {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CommandError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Tracking { active: bool },
    Location { sample: PositionSample },
    Alert { outcome: AlertOutcome },
    Intent { uri: String },
    Message { text: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Alert(#[from] AlertError),
    #[error("no location has been recorded yet")]
    NoLocation,
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error("settings could not be saved: {0}")]
    Persistence(#[from] PersistenceError),
}

pub struct CommandDispatcher {
    tracker: Arc<TrackingController>,
    alerts: Arc<AlertDispatcher>,
    settings: SettingsStore,
    ui: Arc<dyn UiSink>,
}

impl CommandDispatcher {
    pub fn new(
        tracker: Arc<TrackingController>,
        alerts: Arc<AlertDispatcher>,
        settings: SettingsStore,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            tracker,
            alerts,
            settings,
            ui,
        }
    }

    pub async fn dispatch(&self, action: Action) -> Result<ActionOutcome, CommandError> {
        tracing::debug!(%action, "Dispatching action");

        match action {
            Action::StartTracking => {
                self.tracker.start();
                Ok(ActionOutcome::Tracking { active: true })
            }
            Action::StopTracking => {
                self.tracker.stop();
                Ok(ActionOutcome::Tracking { active: false })
            }
            Action::UpdateLocation => {
                let sample = self.tracker.refresh().await?;
                self.ui.toast("Location updated!", ToastKind::Success);
                Ok(ActionOutcome::Location { sample })
            }
            Action::SendAlert => {
                let outcome = self.alerts.send_emergency_alert().await?;
                Ok(ActionOutcome::Alert { outcome })
            }
            Action::ShareSms => {
                let uri = self
                    .alerts
                    .share_location_via_sms()
                    .ok_or(CommandError::NoLocation)?;
                Ok(ActionOutcome::Intent { uri })
            }
            Action::CopyLocation => {
                let text = self.alerts.location_message().ok_or(CommandError::NoLocation)?;
                Ok(ActionOutcome::Message { text })
            }
        }
    }

    /// Applies saved settings at startup: interval first, then auto-start.
    pub fn restore_settings(&self) -> Result<TrackerSettings, CommandError> {
        let settings = self.settings.load();
        self.tracker.set_interval(settings.interval())?;
        if settings.auto_update {
            self.tracker.start();
        }
        Ok(settings)
    }

    /// Re-arms or stops tracking to match `settings`, then saves them.
    pub fn apply_settings(&self, settings: TrackerSettings) -> Result<TrackerSettings, CommandError> {
        self.tracker.set_interval(settings.interval())?;
        if settings.auto_update {
            self.tracker.start();
        } else {
            self.tracker.stop();
        }

        if let Err(e) = self.settings.save(&settings) {
            tracing::error!("Failed to save settings: {}", e);
            self.ui.error("Settings could not be saved.");
            return Err(e.into());
        }
        Ok(settings)
    }

    pub fn settings(&self) -> TrackerSettings {
        self.settings.load()
    }
}
