//! In-process gateway.
//!
//! Holds the provider's notification list in memory and pushes events through
//! the sinks the controller registers. Used by the CLI and by tests; failures
//! can be injected per operation.

use crate::fixture::GatewayFixture;
use async_trait::async_trait;
use pushbox_core::{EventSink, GatewayEvent, InboxError, Result, SyncGateway, Trigger};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// The gateway operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    RegisterOpenListener,
    EnableLiveDelivery,
    DisableLiveDelivery,
    FetchAll,
    FetchOpening,
    Remove,
}

impl GatewayOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisterOpenListener => "register_open_listener",
            Self::EnableLiveDelivery => "enable_live_delivery",
            Self::DisableLiveDelivery => "disable_live_delivery",
            Self::FetchAll => "fetch_all",
            Self::FetchOpening => "fetch_opening_notification",
            Self::Remove => "remove",
        }
    }
}

#[derive(Default)]
struct ProviderState {
    notifications: Vec<Value>,
    opening: Option<Value>,
    open_sink: Option<EventSink>,
    live_sink: Option<EventSink>,
    failures: HashMap<GatewayOperation, String>,
}

impl ProviderState {
    fn check(&self, operation: GatewayOperation) -> Result<()> {
        match self.failures.get(&operation) {
            Some(reason) => Err(InboxError::gateway(operation.as_str(), reason.clone())),
            None => Ok(()),
        }
    }
}

/// A [`SyncGateway`] backed by memory.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<ProviderState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: GatewayFixture) -> Self {
        Self {
            state: Mutex::new(ProviderState {
                notifications: fixture.notifications,
                opening: fixture.opening,
                ..ProviderState::default()
            }),
        }
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let fixture = GatewayFixture::load(path)?;
        tracing::info!(
            "[MemoryGateway] Loaded {} notifications from {:?}",
            fixture.notifications.len(),
            path
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Adds a notification at the provider and delivers it live if subscribed.
    ///
    /// # Returns
    ///
    /// `true` if a live subscriber received it.
    pub fn publish(&self, payload: Value) -> Result<bool> {
        let mut state = self.lock()?;
        state.notifications.push(payload.clone());

        let delivered = match &state.live_sink {
            Some(sink) => sink
                .send(GatewayEvent::notification(Trigger::LivePush, payload))
                .is_ok(),
            None => false,
        };
        Ok(delivered)
    }

    /// Simulates the user tapping a notification in the system tray.
    pub fn tap(&self, payload: Value) -> Result<bool> {
        let state = self.lock()?;
        let delivered = match &state.open_sink {
            Some(sink) => sink
                .send(GatewayEvent::notification(Trigger::OpenTap, payload))
                .is_ok(),
            None => false,
        };
        Ok(delivered)
    }

    /// Reports a channel error to the live subscriber, if any.
    pub fn emit_live_failure(&self, reason: impl Into<String>) -> Result<bool> {
        let state = self.lock()?;
        let delivered = match &state.live_sink {
            Some(sink) => sink
                .send(GatewayEvent::failure(Trigger::LivePush, reason))
                .is_ok(),
            None => false,
        };
        Ok(delivered)
    }

    pub fn set_opening(&self, payload: Option<Value>) -> Result<()> {
        self.lock()?.opening = payload;
        Ok(())
    }

    /// Makes `operation` fail with `reason` until [`recover`](Self::recover) is called.
    pub fn fail(&self, operation: GatewayOperation, reason: impl Into<String>) -> Result<()> {
        self.lock()?.failures.insert(operation, reason.into());
        Ok(())
    }

    pub fn recover(&self, operation: GatewayOperation) -> Result<()> {
        self.lock()?.failures.remove(&operation);
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.lock().map(|state| state.live_sink.is_some()).unwrap_or(false)
    }

    /// The provider's current notification payloads.
    pub fn notifications(&self) -> Result<Vec<Value>> {
        Ok(self.lock()?.notifications.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>> {
        self.state
            .lock()
            .map_err(|_| InboxError::internal("memory gateway lock poisoned"))
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn register_open_listener(&self, sink: EventSink) -> Result<()> {
        let mut state = self.lock()?;
        state.check(GatewayOperation::RegisterOpenListener)?;
        state.open_sink = Some(sink);
        Ok(())
    }

    async fn enable_live_delivery(&self, sink: EventSink) -> Result<()> {
        let mut state = self.lock()?;
        state.check(GatewayOperation::EnableLiveDelivery)?;
        state.live_sink = Some(sink);
        tracing::debug!("[MemoryGateway] Live delivery enabled");
        Ok(())
    }

    async fn disable_live_delivery(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.check(GatewayOperation::DisableLiveDelivery)?;
        if state.live_sink.take().is_some() {
            tracing::debug!("[MemoryGateway] Live delivery disabled");
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Value>> {
        let state = self.lock()?;
        state.check(GatewayOperation::FetchAll)?;
        Ok(state.notifications.clone())
    }

    async fn fetch_opening_notification(&self) -> Result<Option<Value>> {
        let state = self.lock()?;
        state.check(GatewayOperation::FetchOpening)?;
        Ok(state.opening.clone())
    }

    async fn remove(&self, seqno: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.check(GatewayOperation::Remove)?;
        state
            .notifications
            .retain(|payload| payload.get("seqno").and_then(Value::as_str) != Some(seqno));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn payload(seqno: &str) -> Value {
        json!({"seqno": seqno, "title": "T", "body": "B", "message": "{}"})
    }

    #[tokio::test]
    async fn test_publish_reaches_live_subscriber_only_while_enabled() {
        let gateway = MemoryGateway::new();
        let (sink, mut events) = mpsc::unbounded_channel();

        assert!(!gateway.publish(payload("1")).unwrap());

        gateway.enable_live_delivery(sink).await.unwrap();
        assert!(gateway.publish(payload("2")).unwrap());
        assert_eq!(
            events.try_recv().unwrap(),
            GatewayEvent::notification(Trigger::LivePush, payload("2"))
        );

        gateway.disable_live_delivery().await.unwrap();
        gateway.disable_live_delivery().await.unwrap();
        assert!(!gateway.is_live());
        assert!(!gateway.publish(payload("3")).unwrap());
        assert!(events.try_recv().is_err());

        assert_eq!(gateway.fetch_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_deletes_at_provider() {
        let gateway = MemoryGateway::from_fixture(GatewayFixture {
            notifications: vec![payload("1"), payload("2")],
            opening: None,
        });

        gateway.remove("1").await.unwrap();
        gateway.remove("missing").await.unwrap();

        assert_eq!(gateway.notifications().unwrap(), vec![payload("2")]);
    }

    #[tokio::test]
    async fn test_opening_notification_can_be_replaced() {
        let gateway = MemoryGateway::new();
        assert_eq!(gateway.fetch_opening_notification().await.unwrap(), None);

        gateway.set_opening(Some(payload("7"))).unwrap();
        assert_eq!(
            gateway.fetch_opening_notification().await.unwrap(),
            Some(payload("7"))
        );

        gateway.set_opening(None).unwrap();
        assert_eq!(gateway.fetch_opening_notification().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_failure_until_recovered() {
        let gateway = MemoryGateway::new();
        gateway.fail(GatewayOperation::FetchAll, "offline").unwrap();

        let err = gateway.fetch_all().await.unwrap_err();
        assert_eq!(err, InboxError::gateway("fetch_all", "offline"));

        gateway.recover(GatewayOperation::FetchAll).unwrap();
        assert!(gateway.fetch_all().await.unwrap().is_empty());
    }
}
