use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Which push channel delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Real-time delivery while live delivery is enabled.
    LivePush,
    /// The user tapped a notification to open the app.
    OpenTap,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::LivePush => write!(f, "live push"),
            Trigger::OpenTap => write!(f, "open tap"),
        }
    }
}

/// Events pushed by the gateway outside of a request/response call.
///
/// This is the success/error callback pair of a subscription folded into one type.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A notification payload. Not yet shape-checked.
    Notification { trigger: Trigger, payload: Value },
    /// The channel reported an error.
    Failure { trigger: Trigger, reason: String },
}

impl GatewayEvent {
    pub fn notification(trigger: Trigger, payload: Value) -> Self {
        Self::Notification { trigger, payload }
    }

    pub fn failure(trigger: Trigger, reason: impl Into<String>) -> Self {
        Self::Failure {
            trigger,
            reason: reason.into(),
        }
    }

    pub fn trigger(&self) -> Trigger {
        match self {
            Self::Notification { trigger, .. } | Self::Failure { trigger, .. } => *trigger,
        }
    }
}

/// Sending half handed to the gateway for its subscriptions.
pub type EventSink = mpsc::UnboundedSender<GatewayEvent>;

/// Receiving half drained by the controller's event pump.
pub type EventStream = mpsc::UnboundedReceiver<GatewayEvent>;
