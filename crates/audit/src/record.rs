use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use cargobay_core::OperatorId;

use crate::event::AuditEvent;

/// One entry in the audit trail.
///
/// This is the unit handed to an [`crate::AuditSink`]: the typed event payload
/// serialized to JSON plus who performed the operation and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    id: Uuid,
    timestamp: DateTime<Utc>,
    operation: String,
    version: u32,
    performed_by: OperatorId,
    payload: JsonValue,
}

impl AuditRecord {
    pub fn new(
        id: Uuid,
        timestamp: DateTime<Utc>,
        operation: impl Into<String>,
        version: u32,
        performed_by: OperatorId,
        payload: JsonValue,
    ) -> Self {
        Self {
            id,
            timestamp,
            operation: operation.into(),
            version,
            performed_by,
            payload,
        }
    }

    /// Wrap a typed event, capturing the metadata needed to read it back.
    pub fn from_event<E>(performed_by: OperatorId, event: &E) -> Result<Self, serde_json::Error>
    where
        E: AuditEvent,
    {
        let payload = serde_json::to_value(event)?;
        Ok(Self {
            id: Uuid::now_v7(),
            timestamp: event.occurred_at(),
            operation: event.event_type().to_string(),
            version: event.version(),
            performed_by,
            payload,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn performed_by(&self) -> &OperatorId {
        &self.performed_by
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    /// Deserialize the payload back into its typed event.
    pub fn payload_as<E: DeserializeOwned>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counted {
        bins: u32,
        at: DateTime<Utc>,
    }

    impl AuditEvent for Counted {
        fn event_type(&self) -> &'static str {
            "test.counted"
        }

        fn version(&self) -> u32 {
            2
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn from_event_captures_metadata_and_payload() {
        let at = Utc::now();
        let event = Counted { bins: 4, at };
        let operator = OperatorId::new("auditor-1").unwrap();

        let record = AuditRecord::from_event(operator.clone(), &event).unwrap();
        assert_eq!(record.operation(), "test.counted");
        assert_eq!(record.version(), 2);
        assert_eq!(record.timestamp(), at);
        assert_eq!(record.performed_by(), &operator);
        assert_eq!(record.payload_as::<Counted>().unwrap(), event);
    }
}
