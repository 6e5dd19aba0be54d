//! Application settings over the key/value settings table

pub mod ports;
pub mod service;

pub use ports::SettingsRepository;
pub use service::ApplicationSettingsService;
