//! Alert dispatch
//!
//! The dead-letter handler raises alerts through [`AlertManager`], which
//! fans them out to every [`NotificationChannel`] accepting the severity.

mod channels;
mod manager;
mod types;

pub use channels::{LogChannel, NotificationChannel, SlackChannel};
pub use manager::AlertManager;
pub use types::AlertStats;
