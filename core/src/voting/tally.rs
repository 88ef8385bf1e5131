use crate::config::NewsFixture;
use crate::error::{CoreError, CoreResult};
use crate::voting::item::{ItemId, NewsItem, VoteChoice, VotePercentages, VoterHandle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteChange {
    Cast,
    Switched { from: VoteChoice },
    Retracted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteOutcome {
    pub item_id: ItemId,
    pub true_count: u64,
    pub fake_count: u64,
    pub active_choice: Option<VoteChoice>,
    pub change: VoteChange,
}

impl VoteOutcome {
    pub fn percentages(&self) -> VotePercentages {
        VotePercentages::of(self.true_count, self.fake_count)
    }
}

/// True/fake counters per news item plus each voter's current selection.
///
/// A voter holds at most one choice per item. Counters always equal the number
/// of voters currently holding that choice, so they cannot go negative: a
/// counter is only decremented for a ballot that incremented it.
#[derive(Debug, Default)]
pub struct VoteTally {
    items: BTreeMap<ItemId, NewsItem>,
    ballots: HashMap<VoterHandle, BTreeMap<ItemId, VoteChoice>>,
}

impl VoteTally {
    pub fn new(items: impl IntoIterator<Item = NewsItem>) -> CoreResult<Self> {
        let mut by_id = BTreeMap::new();
        for item in items {
            if item.true_count != 0 || item.fake_count != 0 {
                return Err(CoreError::InvalidConfiguration(format!(
                    "news item {} must start with zero votes",
                    item.id
                )));
            }
            let id = item.id;
            if by_id.insert(id, item).is_some() {
                return Err(CoreError::InvalidConfiguration(format!(
                    "duplicate news item id {}",
                    id
                )));
            }
        }
        Ok(Self {
            items: by_id,
            ballots: HashMap::new(),
        })
    }

    pub fn from_fixtures(fixtures: &[NewsFixture]) -> CoreResult<Self> {
        Self::new(fixtures.iter().map(NewsItem::from_fixture))
    }

    /// Applies one click. Re-selecting the active choice retracts it; picking
    /// the other choice moves the vote; otherwise a new vote is cast.
    pub fn vote(
        &mut self,
        voter: &VoterHandle,
        item_id: ItemId,
        choice: VoteChoice,
    ) -> CoreResult<VoteOutcome> {
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| CoreError::NotFound(format!("news item {}", item_id)))?;
        let ballot = self.ballots.entry(voter.clone()).or_default();
        let previous = ballot.get(&item_id).copied();

        let change = match previous {
            Some(prev) if prev == choice => {
                take_vote(item, prev);
                ballot.remove(&item_id);
                VoteChange::Retracted
            }
            Some(prev) => {
                take_vote(item, prev);
                *item.count_mut(choice) += 1;
                ballot.insert(item_id, choice);
                VoteChange::Switched { from: prev }
            }
            None => {
                *item.count_mut(choice) += 1;
                ballot.insert(item_id, choice);
                VoteChange::Cast
            }
        };
        let active_choice = ballot.get(&item_id).copied();

        debug!(
            voter = %voter,
            item = item_id,
            choice = choice.as_str(),
            ?change,
            true_count = item.true_count,
            fake_count = item.fake_count,
            "vote applied"
        );
        Ok(VoteOutcome {
            item_id,
            true_count: item.true_count,
            fake_count: item.fake_count,
            active_choice,
            change,
        })
    }

    pub fn percentages(&self, item_id: ItemId) -> CoreResult<VotePercentages> {
        Ok(self.item(item_id)?.percentages())
    }

    pub fn item(&self, item_id: ItemId) -> CoreResult<&NewsItem> {
        self.items
            .get(&item_id)
            .ok_or_else(|| CoreError::NotFound(format!("news item {}", item_id)))
    }

    /// Items in id order.
    pub fn items(&self) -> impl Iterator<Item = &NewsItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn active_choice(&self, voter: &VoterHandle, item_id: ItemId) -> Option<VoteChoice> {
        self.ballots
            .get(voter)
            .and_then(|b| b.get(&item_id))
            .copied()
    }

    /// Recounts every item from the ballots; true when the stored counters match.
    pub fn is_consistent(&self) -> bool {
        let mut recount: BTreeMap<ItemId, (u64, u64)> = BTreeMap::new();
        for ballot in self.ballots.values() {
            for (id, choice) in ballot {
                let entry = recount.entry(*id).or_default();
                match choice {
                    VoteChoice::True => entry.0 += 1,
                    VoteChoice::Fake => entry.1 += 1,
                }
            }
        }
        self.items.values().all(|item| {
            let (t, f) = recount.get(&item.id).copied().unwrap_or_default();
            item.true_count == t && item.fake_count == f
        })
    }
}

fn take_vote(item: &mut NewsItem, choice: VoteChoice) {
    let counter = item.count_mut(choice);
    debug_assert!(*counter > 0, "retracting a vote that was never counted");
    *counter = counter.saturating_sub(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(ids: &[ItemId]) -> VoteTally {
        VoteTally::new(ids.iter().map(|id| NewsItem::untitled(*id))).unwrap()
    }

    #[test]
    fn outcome_reports_change_kind() {
        let mut t = tally(&[1]);
        let v = VoterHandle::new("u");
        assert_eq!(t.vote(&v, 1, VoteChoice::Fake).unwrap().change, VoteChange::Cast);
        assert_eq!(
            t.vote(&v, 1, VoteChoice::True).unwrap().change,
            VoteChange::Switched {
                from: VoteChoice::Fake
            }
        );
        assert_eq!(
            t.vote(&v, 1, VoteChoice::True).unwrap().change,
            VoteChange::Retracted
        );
        assert!(t.is_consistent());
    }

    #[test]
    fn seeded_counts_are_rejected() {
        let mut item = NewsItem::untitled(1);
        item.true_count = 4;
        assert!(matches!(
            VoteTally::new(vec![item]),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        assert!(VoteTally::new(vec![NewsItem::untitled(2), NewsItem::untitled(2)]).is_err());
    }
}
