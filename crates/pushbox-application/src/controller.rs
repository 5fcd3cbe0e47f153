//! Reconciliation controller.
//!
//! Merges the three ingestion triggers (bulk refresh, live push, open tap) into the
//! local inbox and runs the removal and action flows on top of it.

use crate::journal::{Mutation, MutationJournal};
use crate::presenter::{InboxPresenter, StatusMessage};
use pushbox_core::{
    EventStream, GatewayEvent, InboxConfig, InboxError, InboxSnapshot, NotificationRecord,
    NotificationStore, Result, SyncGateway, Trigger,
};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Lifecycle of a controller over one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// `start` has not been called yet.
    Uninitialized,
    /// The open listener is registered; `live` tracks live delivery.
    Listening { live: bool },
}

impl ControllerState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Listening { live: true })
    }
}

/// What `start` should do besides registering the open listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupOptions {
    pub live_delivery: bool,
    pub refresh: bool,
    pub fetch_opening: bool,
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            live_delivery: false,
            refresh: true,
            fetch_opening: true,
        }
    }
}

impl From<&InboxConfig> for StartupOptions {
    fn from(config: &InboxConfig) -> Self {
        Self {
            live_delivery: config.live_delivery,
            refresh: config.refresh_on_start,
            fetch_opening: config.fetch_opening_on_start,
        }
    }
}

/// Result of feeding one pushed payload into the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    /// A record with the same `seqno` was already present; the push was rejected.
    Duplicate,
    /// The payload was not a well-formed record and was dropped.
    Malformed,
}

/// Result of the removal flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalReport {
    pub seqno: String,
    /// Whether a local record was removed.
    pub removed_locally: bool,
    /// Outcome of the remote deletion. A failure does not restore the local record.
    pub remote: Result<()>,
}

/// A notification picked by the user, with its `message` parsed.
#[derive(Debug, Clone)]
pub struct NotificationAction {
    pub record: Arc<NotificationRecord>,
    /// `None` when `message` is not valid JSON.
    pub payload: Option<Value>,
}

struct Inbox {
    store: NotificationStore,
    journal: MutationJournal,
}

struct Lifecycle {
    state: ControllerState,
    sink: Option<mpsc::UnboundedSender<GatewayEvent>>,
}

/// Keeps the local inbox consistent with the gateway.
///
/// The store sits behind a single mutex so every mutation is serialized. The lock
/// is never held across a gateway call.
pub struct ReconciliationController {
    gateway: Arc<dyn SyncGateway>,
    presenter: Arc<dyn InboxPresenter>,
    inbox: Mutex<Inbox>,
    lifecycle: Mutex<Lifecycle>,
}

impl ReconciliationController {
    /// Creates a controller with an empty inbox.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The session's single gateway handle
    /// * `presenter` - Receives render signals and status lines
    pub fn new(gateway: Arc<dyn SyncGateway>, presenter: Arc<dyn InboxPresenter>) -> Self {
        Self {
            gateway,
            presenter,
            inbox: Mutex::new(Inbox {
                store: NotificationStore::new(),
                journal: MutationJournal::default(),
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: ControllerState::Uninitialized,
                sink: None,
            }),
        }
    }

    pub async fn state(&self) -> ControllerState {
        self.lifecycle.lock().await.state
    }

    /// Moves the controller from `Uninitialized` to `Listening`.
    ///
    /// Registers the open listener, then optionally enables live delivery, runs a
    /// bulk refresh, and fetches the opening notification. Failures of the
    /// optional steps are reported to the presenter and do not abort startup.
    ///
    /// # Returns
    ///
    /// The event stream carrying pushed notifications. Drive it with
    /// [`spawn_event_loop`](Self::spawn_event_loop) or [`drain_events`](Self::drain_events).
    ///
    /// # Errors
    ///
    /// Returns an error if the controller was already started or the open
    /// listener could not be registered.
    pub async fn start(&self, options: StartupOptions) -> Result<EventStream> {
        let (sink, events) = mpsc::unbounded_channel();
        {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.state != ControllerState::Uninitialized {
                return Err(InboxError::internal("controller already started"));
            }

            if let Err(e) = self.gateway.register_open_listener(sink.clone()).await {
                self.report_failure(&e);
                return Err(e);
            }

            lifecycle.sink = Some(sink);
            lifecycle.state = ControllerState::Listening { live: false };
        }
        tracing::info!("[Reconciliation] Listening for opened notifications");

        if options.live_delivery {
            // Already reported to the presenter.
            let _ = self.enable_live_delivery().await;
        }
        if options.refresh {
            let _ = self.refresh().await;
        }
        if options.fetch_opening {
            let _ = self.fetch_opening().await;
        }

        Ok(events)
    }

    /// Spawns a task that feeds every pushed event into [`handle_event`](Self::handle_event).
    ///
    /// The task holds only a weak reference and ends once the controller is
    /// dropped or every sender is gone.
    pub fn spawn_event_loop(self: &Arc<Self>, mut events: EventStream) -> JoinHandle<()> {
        let controller: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.handle_event(event).await;
            }
            tracing::debug!("[Reconciliation] Event loop finished");
        })
    }

    /// Handles every event already queued on `events`, without waiting for more.
    ///
    /// # Returns
    ///
    /// The number of events handled.
    pub async fn drain_events(&self, events: &mut EventStream) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    pub async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Notification { trigger, payload } => {
                self.ingest(trigger, &payload).await;
            }
            GatewayEvent::Failure { trigger, reason } => {
                tracing::warn!("[Reconciliation] {} failed: {}", trigger, reason);
                self.presenter
                    .report(&StatusMessage::error(format!("{trigger}: {reason}")));
            }
        }
    }

    /// Subscribes to live delivery. Does nothing if already subscribed.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has not been started or the gateway
    /// refuses the subscription.
    pub async fn enable_live_delivery(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        let sink = match (lifecycle.state, &lifecycle.sink) {
            (ControllerState::Listening { live: true }, _) => return Ok(()),
            (ControllerState::Listening { live: false }, Some(sink)) => sink.clone(),
            _ => return Err(InboxError::internal("controller has not been started")),
        };

        if let Err(e) = self.gateway.enable_live_delivery(sink).await {
            self.report_failure(&e);
            return Err(e);
        }

        lifecycle.state = ControllerState::Listening { live: true };
        tracing::info!("[Reconciliation] Live delivery enabled");
        Ok(())
    }

    /// Stops live delivery. Calling it again, or before enabling, does nothing.
    ///
    /// Events the gateway already queued are still handled.
    pub async fn disable_live_delivery(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if !lifecycle.state.is_live() {
            return Ok(());
        }

        if let Err(e) = self.gateway.disable_live_delivery().await {
            self.report_failure(&e);
            return Err(e);
        }

        lifecycle.state = ControllerState::Listening { live: false };
        tracing::info!("[Reconciliation] Live delivery disabled");
        Ok(())
    }

    /// Replaces the inbox with the gateway's full notification list.
    ///
    /// All or nothing: on failure the inbox is untouched. Pushes and removals
    /// applied while the fetch was in flight are replayed over the result.
    ///
    /// # Returns
    ///
    /// The number of records in the inbox afterwards.
    pub async fn refresh(&self) -> Result<usize> {
        let ticket = self.inbox.lock().await.journal.begin();
        let fetched = self.gateway.fetch_all().await;

        let mut inbox = self.inbox.lock().await;
        let payloads = match fetched {
            Ok(payloads) => payloads,
            Err(e) => {
                inbox.journal.abandon(ticket);
                drop(inbox);
                self.report_failure(&e);
                return Err(e);
            }
        };

        let received = payloads.len();
        let records: Vec<NotificationRecord> = payloads
            .iter()
            .filter_map(|payload| match NotificationRecord::from_payload(payload) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!("[Reconciliation] Dropped fetched payload: {}", e);
                    None
                }
            })
            .collect();

        let Inbox { store, journal } = &mut *inbox;
        store.replace_all(records);
        let replay = journal.finish(ticket);
        let replayed = replay.len();
        for mutation in replay {
            mutation.apply(store);
        }

        let snapshot = store.snapshot();
        self.presenter.render(&snapshot);
        tracing::info!(
            "[Reconciliation] Refreshed inbox: {} received, {} stored, {} replayed",
            received,
            snapshot.len(),
            replayed
        );
        Ok(snapshot.len())
    }

    /// Adds the notification that opened the app, if there is one.
    ///
    /// # Returns
    ///
    /// `None` when the app was not opened from a notification.
    pub async fn fetch_opening(&self) -> Result<Option<IngestOutcome>> {
        match self.gateway.fetch_opening_notification().await {
            Ok(Some(payload)) => Ok(Some(self.ingest(Trigger::OpenTap, &payload).await)),
            Ok(None) => {
                tracing::debug!("[Reconciliation] No opening notification");
                Ok(None)
            }
            Err(e) => {
                self.report_failure(&e);
                Err(e)
            }
        }
    }

    /// Adds one pushed payload to the inbox. Never clears existing records.
    pub async fn ingest(&self, trigger: Trigger, payload: &Value) -> IngestOutcome {
        let record = match NotificationRecord::from_payload(payload) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("[Reconciliation] Dropped {} payload: {}", trigger, e);
                return IngestOutcome::Malformed;
            }
        };
        let seqno = record.seqno.clone();

        let mut inbox = self.inbox.lock().await;
        // Journal even a duplicate: the refresh result may not contain it.
        if inbox.journal.is_recording() {
            inbox.journal.record(Mutation::Upsert(record.clone()));
        }
        if !inbox.store.upsert(record) {
            tracing::debug!("[Reconciliation] Ignored duplicate {}: {}", trigger, seqno);
            return IngestOutcome::Duplicate;
        }

        self.presenter.render(&inbox.store.snapshot());
        tracing::info!("[Reconciliation] Added notification {} via {}", seqno, trigger);
        IngestOutcome::Inserted
    }

    /// Removes a notification locally, then asks the gateway to delete it.
    ///
    /// The local removal happens first and stays in place even if the remote
    /// deletion fails; the failure is reported to the presenter.
    pub async fn remove(&self, seqno: &str) -> RemovalReport {
        let removed_locally = {
            let mut inbox = self.inbox.lock().await;
            let removed = inbox.store.remove_by_seqno(seqno);
            if removed {
                inbox.journal.record(Mutation::Remove(seqno.to_string()));
                self.presenter.render(&inbox.store.snapshot());
            }
            removed
        };

        let remote = self.gateway.remove(seqno).await;
        match &remote {
            Ok(()) => {
                tracing::info!("[Reconciliation] Removed notification {}", seqno);
                self.presenter
                    .report(&StatusMessage::info(format!("{seqno} removed")));
            }
            Err(e) => self.report_failure(e),
        }

        RemovalReport {
            seqno: seqno.to_string(),
            removed_locally,
            remote,
        }
    }

    /// Looks up a notification for the user to act on.
    ///
    /// Unknown `seqno`s yield `None`; acting on a removed notification is not an error.
    pub async fn action(&self, seqno: &str) -> Option<NotificationAction> {
        let record = self.inbox.lock().await.store.find_shared(seqno)?;
        let payload = match record.payload() {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    "[Reconciliation] Notification {} has an unreadable message: {}",
                    seqno,
                    e
                );
                None
            }
        };
        Some(NotificationAction { record, payload })
    }

    pub async fn find(&self, seqno: &str) -> Option<Arc<NotificationRecord>> {
        self.inbox.lock().await.store.find_shared(seqno)
    }

    pub async fn snapshot(&self) -> InboxSnapshot {
        self.inbox.lock().await.store.snapshot()
    }

    fn report_failure(&self, error: &InboxError) {
        tracing::warn!("[Reconciliation] {}", error);
        self.presenter.report(&StatusMessage::error(error.to_string()));
    }
}
