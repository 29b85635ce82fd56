//! JSON rendering of stored records.

use confirmkit_core::ConfirmationRecord;
use serde::Serialize;

const REDACTED: &str = "[REDACTED]";

/// Printable view of a record. The token is never included.
#[derive(Debug, Serialize)]
pub struct RecordView<'a> {
    key: &'a str,
    state: &'static str,
    token: Option<&'static str>,
    handler: String,
    argument: &'a str,
    expires: Option<u64>,
    confirmed: Option<u64>,
    created_at: u64,
}

impl<'a> RecordView<'a> {
    /// Builds the view of `record` as seen at `now`.
    #[must_use]
    pub fn new(record: &'a ConfirmationRecord, now: u64) -> Self {
        let state = if record.is_confirmed() {
            "confirmed"
        } else if record.is_expired(now) {
            "expired"
        } else {
            "pending"
        };
        Self {
            key: record.key.as_str(),
            state,
            token: record.token.as_ref().map(|_| REDACTED),
            handler: record.selector.to_string(),
            argument: &record.argument,
            expires: record.expires,
            confirmed: record.confirmed,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use confirmkit_core::{ConfirmationKey, HandlerSelector, Token};

    use super::*;

    fn record(confirmed: Option<u64>) -> ConfirmationRecord {
        ConfirmationRecord {
            key: ConfirmationKey::parse("0123456789abcdef").expect("key"),
            token: confirmed.is_none().then(|| Token::from_hex("c0ffee".to_string())),
            selector: HandlerSelector::module("echo", "reply"),
            argument: "hi".to_string(),
            expires: Some(100),
            confirmed,
            created_at: 10,
        }
    }

    #[test]
    fn test_view_redacts_token() {
        let record = record(None);
        let json = serde_json::to_value(RecordView::new(&record, 50)).expect("json");
        assert_eq!(json["token"], REDACTED);
        assert_eq!(json["state"], "pending");
        assert_eq!(json["handler"], "echo::reply");
        assert!(!json.to_string().contains("c0ffee"));
    }

    #[test]
    fn test_view_states() {
        let pending = record(None);
        assert_eq!(RecordView::new(&pending, 101).state, "expired");

        let confirmed = record(Some(60));
        let view = RecordView::new(&confirmed, 101);
        assert_eq!(view.state, "confirmed");
        assert!(view.token.is_none());
    }
}
