use crate::determinism::ids::sha256_hex;
use crate::determinism::json_canonical;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub ts_utc: String, // RFC3339 UTC
    pub event_type: String,
    pub run_id: String, // empty for events outside a pipeline run
    pub subject: String,
    pub actor: Actor,
    pub details: serde_json::Value,
    pub prev_event_hash: String, // hex 64
    pub event_hash: String,      // hex 64
}

impl AuditEvent {
    pub fn new(
        ts_utc: impl Into<String>,
        event_type: &str,
        actor: Actor,
        details: serde_json::Value,
    ) -> Self {
        Self {
            ts_utc: ts_utc.into(),
            event_type: event_type.to_string(),
            run_id: String::new(),
            subject: String::new(),
            actor,
            details,
            prev_event_hash: String::new(),
            event_hash: String::new(),
        }
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

pub const ZERO_HASH_64: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// event_hash = SHA-256 over the canonical bytes of the full envelope, with
// event_hash itself forced to ZERO_HASH_64 while hashing.
pub fn compute_event_hash(event: &AuditEvent) -> CoreResult<String> {
    let mut e = event.clone();
    e.event_hash = ZERO_HASH_64.to_string();
    let bytes = json_canonical::to_canonical_bytes(&e)?;
    Ok(sha256_hex(&bytes))
}

pub fn finalize_event(mut event: AuditEvent) -> CoreResult<AuditEvent> {
    if !is_hex64(&event.prev_event_hash) {
        return Err(CoreError::InvalidConfiguration(
            "prev_event_hash must be 64 hex chars".to_string(),
        ));
    }
    validate_event_taxonomy(&event)?;
    event.event_hash = compute_event_hash(&event)?;
    Ok(event)
}

pub(crate) fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

const EVENT_TYPES: &[&str] = &[
    "RUN_STARTED",
    "RUN_START_IGNORED",
    "STEP_STATE_CHANGED",
    "RUN_COMPLETED",
    "RUN_CANCELLED",
    "ANALYSIS_REJECTED",
    "NOTIFICATION_APPENDED",
    "VOTE_CAST",
    "VOTE_SWITCHED",
    "VOTE_RETRACTED",
];

fn validate_event_taxonomy(event: &AuditEvent) -> CoreResult<()> {
    if !EVENT_TYPES.contains(&event.event_type.as_str()) {
        return Err(CoreError::InvalidConfiguration(format!(
            "unknown event_type {}",
            event.event_type
        )));
    }
    for k in required_detail_keys(&event.event_type) {
        if event.details.get(k).is_none() {
            return Err(CoreError::InvalidConfiguration(format!(
                "event {} missing details.{}",
                event.event_type, k
            )));
        }
    }
    Ok(())
}

fn required_detail_keys(event_type: &str) -> &'static [&'static str] {
    match event_type {
        "RUN_STARTED" => &["step_labels", "dwell_ms"],
        "RUN_START_IGNORED" => &["reason"],
        "STEP_STATE_CHANGED" => &["step_id", "from_state", "to_state"],
        "RUN_COMPLETED" => &["steps_completed"],
        "RUN_CANCELLED" => &["steps_completed", "steps_total", "reason"],
        "ANALYSIS_REJECTED" => &["reason"],
        "NOTIFICATION_APPENDED" => &["notification_id", "status"],
        "VOTE_CAST" | "VOTE_RETRACTED" => &["item_id", "choice", "true_count", "fake_count"],
        "VOTE_SWITCHED" => &["item_id", "from_choice", "choice", "true_count", "fake_count"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: &str, details: serde_json::Value) -> AuditEvent {
        let mut e = AuditEvent::new("2026-10-19T00:00:00Z", event_type, Actor::User, details);
        e.prev_event_hash = ZERO_HASH_64.to_string();
        e
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let e = event("EXPORT_REQUESTED", serde_json::json!({}));
        assert!(finalize_event(e).is_err());
    }

    #[test]
    fn missing_detail_key_is_rejected() {
        let e = event("VOTE_CAST", serde_json::json!({"item_id": 1, "choice": "true"}));
        assert!(finalize_event(e).is_err());
    }

    #[test]
    fn hash_ignores_the_hash_field_itself() {
        let e = event("ANALYSIS_REJECTED", serde_json::json!({"reason": "no platform"}));
        let a = finalize_event(e.clone()).unwrap();
        let mut tampered = e;
        tampered.event_hash = "f".repeat(64);
        let b = finalize_event(tampered).unwrap();
        assert_eq!(a.event_hash, b.event_hash);
    }
}
