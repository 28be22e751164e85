// Infrastructure layer - External dependencies and adapters
pub mod asset_cache;
pub mod config;
pub mod event_stream;
pub mod http_position_source;
pub mod json_file_store;
pub mod memory_store;
pub mod nominatim_geocoder;
pub mod webhook_share;
