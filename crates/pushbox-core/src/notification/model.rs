//! Notification domain model.

use crate::error::{InboxError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single push notification as delivered by the gateway.
///
/// `seqno` is the sole identity key: two records are equal when their `seqno`
/// matches, regardless of the other fields. Use [`NotificationRecord::same_content`]
/// to compare every field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Externally assigned, globally unique identifier.
    pub seqno: String,
    /// Display label.
    pub title: String,
    /// Display summary.
    pub body: String,
    /// Serialized structured payload. Opaque to the store.
    pub message: String,
}

impl NotificationRecord {
    pub fn new(
        seqno: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seqno: seqno.into(),
            title: title.into(),
            body: body.into(),
            message: message.into(),
        }
    }

    /// Builds a record from a raw gateway payload.
    ///
    /// The payload must be a JSON object whose `seqno`, `title`, `body` and
    /// `message` members are all strings, and `seqno` must be non-empty.
    /// Extra members are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::MalformedRecord`] describing the first violation found.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            InboxError::malformed(format!("expected an object, got {}", kind_of(payload)))
        })?;

        let field = |name: &str| -> Result<String> {
            match object.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(InboxError::malformed(format!(
                    "field '{}' must be a string, got {}",
                    name,
                    kind_of(other)
                ))),
                None => Err(InboxError::malformed(format!("missing field '{}'", name))),
            }
        };

        let seqno = field("seqno")?;
        if seqno.is_empty() {
            return Err(InboxError::malformed("field 'seqno' is empty"));
        }

        Ok(Self {
            seqno,
            title: field("title")?,
            body: field("body")?,
            message: field("message")?,
        })
    }

    /// Parses `message` as JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error when `message` is not valid JSON.
    pub fn payload(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.message)?)
    }

    /// Compares all four fields, not just the identity key.
    pub fn same_content(&self, other: &Self) -> bool {
        self.seqno == other.seqno
            && self.title == other.title
            && self.body == other.body
            && self.message == other.message
    }
}

impl PartialEq for NotificationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.seqno == other.seqno
    }
}

impl Eq for NotificationRecord {}

impl TryFrom<Value> for NotificationRecord {
    type Error = InboxError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_payload(&value)
    }
}

impl TryFrom<&Value> for NotificationRecord {
    type Error = InboxError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_payload(value)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_accepts_well_formed_object() {
        let payload = json!({
            "seqno": "123",
            "title": "test title 1",
            "body": "test body 1",
            "message": "{\"data\":\"111\"}",
            "extra": 42
        });

        let record = NotificationRecord::from_payload(&payload).unwrap();
        assert_eq!(record.seqno, "123");
        assert_eq!(record.title, "test title 1");
        assert_eq!(record.body, "test body 1");
        assert_eq!(record.payload().unwrap(), json!({"data": "111"}));
    }

    #[test]
    fn test_try_from_value() {
        let payload = json!({"seqno": "5", "title": "t", "body": "b", "message": "{}"});

        let borrowed = NotificationRecord::try_from(&payload).unwrap();
        let owned: NotificationRecord = payload.try_into().unwrap();
        assert!(borrowed.same_content(&owned));

        assert!(NotificationRecord::try_from(json!([])).unwrap_err().is_malformed());
    }

    #[test]
    fn test_from_payload_rejects_non_objects() {
        for payload in [json!("a string"), json!(7), json!(null), json!([1, 2])] {
            let err = NotificationRecord::from_payload(&payload).unwrap_err();
            assert!(err.is_malformed(), "{payload} should be rejected");
        }
    }

    #[test]
    fn test_from_payload_rejects_missing_or_mistyped_fields() {
        let missing = json!({"seqno": "1", "title": "t", "body": "b"});
        let err = NotificationRecord::from_payload(&missing).unwrap_err();
        assert!(err.to_string().contains("missing field 'message'"));

        let mistyped = json!({"seqno": 1, "title": "t", "body": "b", "message": "{}"});
        let err = NotificationRecord::from_payload(&mistyped).unwrap_err();
        assert!(err.to_string().contains("'seqno' must be a string"));

        let empty = json!({"seqno": "", "title": "t", "body": "b", "message": "{}"});
        assert!(NotificationRecord::from_payload(&empty).is_err());
    }

    #[test]
    fn test_equality_is_by_seqno() {
        let a = NotificationRecord::new("1", "T1", "B1", "{}");
        let a_prime = NotificationRecord::new("1", "T1*", "B1*", "{}");
        let b = NotificationRecord::new("2", "T1", "B1", "{}");

        assert_eq!(a, a_prime);
        assert!(!a.same_content(&a_prime));
        assert_ne!(a, b);
    }

    #[test]
    fn test_payload_reports_invalid_json() {
        let record = NotificationRecord::new("1", "T", "B", "not json");
        assert!(record.payload().unwrap_err().is_serialization());
    }
}
