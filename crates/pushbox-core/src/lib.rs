//! Domain layer for pushbox.
//!
//! Holds the notification model, the local inbox store, and the gateway
//! contract the reconciliation layer is written against.

pub mod config;
pub mod error;
pub mod gateway;
pub mod notification;

// Re-export common types
pub use config::InboxConfig;
pub use error::{InboxError, Result};
pub use gateway::{EventSink, EventStream, GatewayEvent, SyncGateway, Trigger};
pub use notification::{InboxSnapshot, NotificationRecord, NotificationStore};
