// Application layer - Use cases and the ports they depend on
pub mod alert_dispatcher;
pub mod alert_log;
pub mod commands;
pub mod contact_store;
pub mod geocoder;
pub mod history_store;
pub mod persistence;
pub mod position_source;
pub mod settings_store;
pub mod share_transport;
pub mod tracking_controller;
pub mod ui;

#[cfg(test)]
pub mod testing;
