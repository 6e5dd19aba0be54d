pub mod application_log;
pub mod command_helpers;
pub mod health;
pub mod logging;
