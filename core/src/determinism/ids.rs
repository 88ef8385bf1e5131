use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::SystemTime;
use time::OffsetDateTime;
use ulid::{Generator, Ulid};

/// Identity of one pipeline run. Opaque to callers; compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunToken(String);

impl RunToken {
    pub fn fresh() -> Self {
        Self(format!("r_{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-derived ids for notification records. Monotonic within one generator,
/// so two records created in the same millisecond still get distinct, ordered ids.
pub struct TimeDerivedIds {
    generator: Generator,
}

impl fmt::Debug for TimeDerivedIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeDerivedIds").finish_non_exhaustive()
    }
}

impl Default for TimeDerivedIds {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeDerivedIds {
    pub fn new() -> Self {
        Self {
            generator: Generator::new(),
        }
    }

    pub fn next_for(&mut self, created_at: OffsetDateTime) -> String {
        let at = SystemTime::from(created_at);
        // the generator only overflows after 2^80 ids in one millisecond
        let ulid = self
            .generator
            .generate_from_datetime(at)
            .unwrap_or_else(|_| Ulid::from_datetime(at));
        format!("n_{}", ulid)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}
