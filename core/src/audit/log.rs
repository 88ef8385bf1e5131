use crate::audit::event::{compute_event_hash, finalize_event, is_hex64, AuditEvent, ZERO_HASH_64};
use crate::error::{CoreError, CoreResult};
use std::io::{BufRead, Write};

/// Session-scoped, append-only, hash-chained event trail. Lives in memory;
/// callers may export it as NDJSON.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
    last_hash: String,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            last_hash: ZERO_HASH_64.to_string(),
        }
    }

    pub fn append(&mut self, mut event: AuditEvent) -> CoreResult<&AuditEvent> {
        event.prev_event_hash = self.last_hash.clone();
        let event = finalize_event(event)?;
        self.last_hash = event.event_hash.clone();
        self.events.push(event);
        self.events
            .last()
            .ok_or_else(|| CoreError::AuditChainBroken("appended event missing".to_string()))
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn write_ndjson<W: Write>(&self, mut w: W) -> CoreResult<()> {
        for e in &self.events {
            let line = serde_json::to_string(e)?;
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn to_ndjson(&self) -> CoreResult<String> {
        let mut buf = Vec::new();
        self.write_ndjson(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSummary {
    pub events: usize,
    pub last_hash: String,
}

/// Re-checks every link and hash of an NDJSON export. Fails on the first
/// broken event, naming its 1-based line.
pub fn verify_ndjson<R: BufRead>(reader: R) -> CoreResult<ChainSummary> {
    let mut prev = ZERO_HASH_64.to_string();
    let mut count = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let event: AuditEvent = serde_json::from_str(&line)?;
        if event.prev_event_hash != prev {
            return Err(CoreError::AuditChainBroken(format!(
                "line {}: prev_event_hash does not match preceding event",
                lineno
            )));
        }
        if !is_hex64(&event.event_hash) || compute_event_hash(&event)? != event.event_hash {
            return Err(CoreError::AuditChainBroken(format!(
                "line {}: event_hash mismatch",
                lineno
            )));
        }
        prev = event.event_hash;
        count += 1;
    }
    Ok(ChainSummary {
        events: count,
        last_hash: prev,
    })
}
