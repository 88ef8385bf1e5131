use crate::config::NewsFixture;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

pub type ItemId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    True,
    Fake,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::True => "true",
            VoteChoice::Fake => "fake",
        }
    }
}

/// Opaque identity of one independent voter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoterHandle(String);

impl VoterHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self(format!("v_{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub id: ItemId,
    pub title: String,
    pub source: String,
    pub platform: String,
    pub posted: String,
    pub description: String,
    pub true_count: u64,
    pub fake_count: u64,
}

impl NewsItem {
    pub fn from_fixture(f: &NewsFixture) -> Self {
        Self {
            id: f.id,
            title: f.title.clone(),
            source: f.source.clone(),
            platform: f.platform.clone(),
            posted: f.posted.clone(),
            description: f.description.clone(),
            true_count: 0,
            fake_count: 0,
        }
    }

    /// Bare item with no display metadata.
    pub fn untitled(id: ItemId) -> Self {
        Self {
            id,
            title: String::new(),
            source: String::new(),
            platform: String::new(),
            posted: String::new(),
            description: String::new(),
            true_count: 0,
            fake_count: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_count + self.fake_count
    }

    pub fn count(&self, choice: VoteChoice) -> u64 {
        match choice {
            VoteChoice::True => self.true_count,
            VoteChoice::Fake => self.fake_count,
        }
    }

    pub(crate) fn count_mut(&mut self, choice: VoteChoice) -> &mut u64 {
        match choice {
            VoteChoice::True => &mut self.true_count,
            VoteChoice::Fake => &mut self.fake_count,
        }
    }

    pub fn percentages(&self) -> VotePercentages {
        VotePercentages::of(self.true_count, self.fake_count)
    }
}

/// Each side is rounded on its own (half up), so the pair may sum to 99 or
/// 101. Zero votes reads as 0/0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotePercentages {
    pub true_percent: u64,
    pub fake_percent: u64,
}

impl VotePercentages {
    pub fn of(true_count: u64, fake_count: u64) -> Self {
        let total = true_count + fake_count;
        if total == 0 {
            return Self {
                true_percent: 0,
                fake_percent: 0,
            };
        }
        Self {
            true_percent: rounded_percent(true_count, total),
            fake_percent: rounded_percent(fake_count, total),
        }
    }
}

// round(100 * count / total) with halves going up, in integers
fn rounded_percent(count: u64, total: u64) -> u64 {
    (200 * count + total) / (2 * total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_votes_is_zero_zero() {
        assert_eq!(
            VotePercentages::of(0, 0),
            VotePercentages {
                true_percent: 0,
                fake_percent: 0
            }
        );
    }

    #[test]
    fn sides_round_independently() {
        let p = VotePercentages::of(1, 2);
        assert_eq!((p.true_percent, p.fake_percent), (33, 67));
        let p = VotePercentages::of(1, 7);
        // 12.5 and 87.5 both round up
        assert_eq!((p.true_percent, p.fake_percent), (13, 88));
        let p = VotePercentages::of(1, 1);
        assert_eq!((p.true_percent, p.fake_percent), (50, 50));
    }
}
