// Domain layer - Pure types and rules, no I/O
pub mod alert;
pub mod contact;
pub mod history;
pub mod location;
pub mod settings;
