//! Notice envelope for pub/sub

use crate::types::NoticeType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notice envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    /// Notice ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Notice type
    pub notice_type: NoticeType,

    /// Payload (JSON-serialized)
    pub payload: serde_json::Value,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Correlation ID (e.g. the flight key a request belongs to)
    pub correlation_id: Option<String>,
}

impl Notice {
    /// Create new notice
    pub fn new(notice_type: NoticeType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            notice_type,
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Subject this notice is published under
    pub fn subject(&self) -> String {
        match &self.correlation_id {
            Some(key) => format!("{}.{}", self.notice_type.subject_prefix(), key),
            None => self.notice_type.subject_prefix().to_string(),
        }
    }

    /// Decode the payload into a typed value
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notice_creation() {
        let notice = Notice::new(NoticeType::OracleRequestOpened, json!({"index": 7}));

        assert_eq!(notice.notice_type, NoticeType::OracleRequestOpened);
        assert_eq!(notice.payload["index"], 7);
        assert!(notice.correlation_id.is_none());
    }

    #[test]
    fn test_notice_subject() {
        let notice = Notice::new(NoticeType::FlightStatusFinalized, json!({}))
            .with_correlation_id("AL1:LF0001:1700000000");

        assert_eq!(
            notice.subject(),
            "aerosure.flight.finalized.AL1:LF0001:1700000000"
        );
    }

    #[test]
    fn test_notice_serialization() {
        let notice = Notice::new(NoticeType::CreditIssued, json!({"amount": "1.5"}));

        let bytes = notice.to_bytes().unwrap();
        let deserialized = Notice::from_bytes(&bytes).unwrap();

        assert_eq!(notice.id, deserialized.id);
        assert_eq!(notice.notice_type, deserialized.notice_type);
        assert_eq!(notice.payload, deserialized.payload);
    }
}
