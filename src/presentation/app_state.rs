// Application state for HTTP handlers
use crate::application::alert_log::AlertLog;
use crate::application::commands::CommandDispatcher;
use crate::application::contact_store::ContactStore;
use crate::application::tracking_controller::TrackingController;
use crate::infrastructure::asset_cache::AssetCache;
use crate::infrastructure::event_stream::EventBroadcaster;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<TrackingController>,
    pub commands: Arc<CommandDispatcher>,
    pub contacts: Arc<ContactStore>,
    pub alert_log: Arc<AlertLog>,
    pub events: EventBroadcaster,
    pub assets: AssetCache,
}
