//! Sync gateway interface.
//!
//! Defines the contract the reconciliation layer expects from the external
//! push-notification provider, decoupling it from the actual transport.

mod event;

pub use event::{EventSink, EventStream, GatewayEvent, Trigger};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// An abstract push-notification provider.
///
/// Payloads are returned as raw JSON values; shape checking is the caller's job,
/// so a misbehaving provider can never push a malformed record into the inbox.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Complete every call exactly once
/// - Stop sending `Trigger::LivePush` events as soon as `disable_live_delivery` returns
/// - Treat `disable_live_delivery` as idempotent
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Registers the always-active listener for notifications tapped to open the app.
    ///
    /// Tapped notifications arrive on `sink` as `Trigger::OpenTap` events.
    async fn register_open_listener(&self, sink: EventSink) -> Result<()>;

    /// Subscribes `sink` to real-time notifications.
    ///
    /// Events arrive as `Trigger::LivePush` until `disable_live_delivery` is called.
    async fn enable_live_delivery(&self, sink: EventSink) -> Result<()>;

    /// Stops live delivery. Safe to call when not subscribed.
    async fn disable_live_delivery(&self) -> Result<()>;

    /// Retrieves every notification currently targeting this app.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Value>)`: All notification payloads, in provider order
    /// - `Err(_)`: The provider could not be reached
    async fn fetch_all(&self) -> Result<Vec<Value>>;

    /// Retrieves the notification that launched or foregrounded the app.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(payload))`: The app was opened from a notification
    /// - `Ok(None)`: The app was opened some other way
    /// - `Err(_)`: The provider could not be reached
    async fn fetch_opening_notification(&self) -> Result<Option<Value>>;

    /// Deletes a notification at the source of truth.
    async fn remove(&self, seqno: &str) -> Result<()>;
}
