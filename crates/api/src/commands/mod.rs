//! Commands - front end to backend bridge

mod executions;
mod health;
mod jobs;
mod notifications;
mod previews;
mod schedule;
mod settings;

pub use executions::*;
pub use health::*;
pub use jobs::*;
pub use notifications::*;
pub use previews::*;
pub use schedule::*;
pub use settings::*;
