// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    Router,
    handler::Handler,
    routing::{delete, get, post},
};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::alert_dispatcher::AlertDispatcher;
use crate::application::alert_log::AlertLog;
use crate::application::commands::CommandDispatcher;
use crate::application::contact_store::ContactStore;
use crate::application::geocoder::{DisabledGeocoder, GeocodeResolver};
use crate::application::history_store::HistoryStore;
use crate::application::persistence::KeyValueStore;
use crate::application::position_source::PositionSource;
use crate::application::settings_store::SettingsStore;
use crate::application::share_transport::ShareTransport;
use crate::application::tracking_controller::TrackingController;
use crate::application::ui::{IntentLauncher, UiSink};
use crate::infrastructure::asset_cache::AssetCache;
use crate::infrastructure::config::{
    AppConfig, CONFIG_PATH, PositionProvider, StorageBackend, load_app_config, write_default_config,
};
use crate::infrastructure::event_stream::EventBroadcaster;
use crate::infrastructure::http_position_source::{FixedPositionSource, HttpPositionSource};
use crate::infrastructure::json_file_store::JsonFileStore;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::nominatim_geocoder::NominatimGeocoder;
use crate::infrastructure::webhook_share::WebhookShareTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_contact, get_alerts, get_history, get_settings, get_status, health_check, list_contacts,
    put_settings, remove_contact, run_action, run_sync, serve_asset, stream_events,
};

const UI_EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config_path = Path::new(CONFIG_PATH);
    if write_default_config(config_path)? {
        tracing::info!("Wrote default configuration to {}", config_path.display());
    }
    let config = load_app_config(config_path)?;

    // Create persistence and adapters (infrastructure layer)
    let store = open_store(&config)?;
    let events = EventBroadcaster::new(UI_EVENT_CAPACITY);
    let ui: Arc<dyn UiSink> = Arc::new(events.clone());
    let launcher: Arc<dyn IntentLauncher> = Arc::new(events.clone());
    let source = position_source(&config)?;
    let geocoder: Arc<dyn GeocodeResolver> = if config.geocoder.enabled {
        Arc::new(NominatimGeocoder::new(
            &config.geocoder.base_url,
            &config.geocoder.user_agent,
        ))
    } else {
        Arc::new(DisabledGeocoder)
    };
    let share = config
        .share
        .webhook_url
        .as_deref()
        .map(|url| Arc::new(WebhookShareTransport::new(url)) as Arc<dyn ShareTransport>);
    if share.is_none() {
        tracing::info!("No share webhook configured, alerts will use SMS compose");
    }

    // Create services (application layer)
    let history = Arc::new(HistoryStore::load(store.clone()));
    let contacts = Arc::new(ContactStore::load(store.clone()));
    let alert_log = Arc::new(AlertLog::load(store.clone()));
    let tracker = TrackingController::new(
        source,
        geocoder,
        history,
        ui.clone(),
        config.tracking.tracker_options(),
    )?;
    let alerts = Arc::new(AlertDispatcher::new(
        tracker.clone(),
        contacts.clone(),
        share,
        launcher,
        alert_log.clone(),
        ui.clone(),
    ));
    let commands = Arc::new(CommandDispatcher::new(
        tracker.clone(),
        alerts,
        SettingsStore::new(store),
        ui,
    ));

    // Offline shell: install the current cache generation, then drop stale ones
    let assets = AssetCache::new(
        config.assets.root.clone(),
        config.assets.cache_dir.clone(),
        &config.assets.cache_name,
        config.assets.urls.clone(),
    );
    if let Err(e) = assets.install().await {
        tracing::warn!("Asset cache {} not installed: {}", assets.name(), e);
    }
    match assets.activate().await {
        Ok(removed) if !removed.is_empty() => {
            tracing::info!("Activated {}, removed {:?}", assets.name(), removed)
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Asset cache activation failed: {}", e),
    }

    // Restore saved settings; starts tracking unless auto-update was turned off
    let settings = commands.restore_settings()?;
    tracing::info!(
        "Restored settings: auto update {}, every {}ms",
        settings.auto_update,
        settings.update_frequency
    );

    // Create application state
    let state = Arc::new(AppState {
        tracker: tracker.clone(),
        commands,
        contacts,
        alert_log,
        events,
        assets,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(get_status))
        .route("/history", get(get_history))
        .route("/alerts", get(get_alerts))
        .route("/contacts", get(list_contacts).post(add_contact))
        .route("/contacts/:name", delete(remove_contact))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/actions/:action", post(run_action))
        .route("/sync/:tag", post(run_sync))
        .route("/events", get(stream_events))
        // Only the static shell is compressed; the event stream must flush per line
        .fallback(serve_asset.layer(CompressionLayer::new()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address '{}'", config.server.bind))?;
    tracing::info!("Starting safetrack service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracker.stop();
    Ok(())
}

fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(match config.storage.backend {
        StorageBackend::File => {
            let store = JsonFileStore::open(&config.storage.data_dir).with_context(|| {
                format!("Failed to open data directory {}", config.storage.data_dir.display())
            })?;
            tracing::info!("Persisting to {}", store.dir().display());
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    })
}

fn position_source(config: &AppConfig) -> anyhow::Result<Arc<dyn PositionSource>> {
    let position = &config.position;
    Ok(match position.provider {
        PositionProvider::Http => Arc::new(HttpPositionSource::new(&position.url)),
        PositionProvider::Fixed => Arc::new(
            FixedPositionSource::new(position.latitude, position.longitude, position.accuracy)
                .context("Invalid fixed position in configuration")?,
        ),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
