use crate::audit::event::{Actor, AuditEvent};
use crate::audit::log::AuditTrail;
use crate::clock::{rfc3339_utc, Clock};
use crate::config::{AppConfig, NewsFixture};
use crate::error::{CoreError, CoreResult};
use crate::session::notice::Notice;
use crate::voting::item::{ItemId, NewsItem, VoteChoice, VotePercentages, VoterHandle};
use crate::voting::report::render_tally_csv;
use crate::voting::tally::{VoteChange, VoteOutcome, VoteTally};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCard<'a> {
    pub item: &'a NewsItem,
    pub percentages: VotePercentages,
    pub active_choice: Option<VoteChoice>,
}

/// The breaking-news voting page: a tally seeded from fixtures plus an audit
/// trail of every accepted vote.
pub struct BreakingNewsBoard<C: Clock> {
    tally: VoteTally,
    clock: C,
    audit: AuditTrail,
}

impl<C: Clock> BreakingNewsBoard<C> {
    pub fn new(fixtures: &[NewsFixture], clock: C) -> CoreResult<Self> {
        Ok(Self {
            tally: VoteTally::from_fixtures(fixtures)?,
            clock,
            audit: AuditTrail::new(),
        })
    }

    pub fn from_config(cfg: &AppConfig, clock: C) -> CoreResult<Self> {
        cfg.validate()?;
        Self::new(&cfg.breaking_news, clock)
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn vote(
        &mut self,
        voter: &VoterHandle,
        item_id: ItemId,
        choice: VoteChoice,
    ) -> CoreResult<(VoteOutcome, Notice)> {
        // resolved before the tally moves; a retried vote must not retract itself
        let ts = rfc3339_utc(self.clock.now())?;
        let outcome = match self.tally.vote(voter, item_id, choice) {
            Ok(o) => o,
            Err(e @ CoreError::NotFound(_)) => {
                warn!(voter = %voter, item = item_id, "vote for unknown news item");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let (event_type, mut details) = match outcome.change {
            VoteChange::Cast => ("VOTE_CAST", json!({"choice": choice.as_str()})),
            VoteChange::Retracted => ("VOTE_RETRACTED", json!({"choice": choice.as_str()})),
            VoteChange::Switched { from } => (
                "VOTE_SWITCHED",
                json!({"from_choice": from.as_str(), "choice": choice.as_str()}),
            ),
        };
        details["item_id"] = json!(item_id);
        details["true_count"] = json!(outcome.true_count);
        details["fake_count"] = json!(outcome.fake_count);
        let event =
            AuditEvent::new(ts, event_type, Actor::User, details).with_subject(voter.as_str());
        if let Err(e) = self.audit.append(event) {
            error!(error = %e, voter = %voter, item = item_id, "audit event dropped");
        }

        let notice = match (outcome.change, choice) {
            (VoteChange::Retracted, _) => Notice::VoteRemoved,
            (_, VoteChoice::True) => Notice::VotedTrue,
            (_, VoteChoice::Fake) => Notice::VotedFake,
        };
        Ok((outcome, notice))
    }

    /// One card per item in id order, from `voter`'s point of view.
    pub fn cards(&self, voter: &VoterHandle) -> Vec<NewsCard<'_>> {
        self.tally
            .items()
            .map(|item| NewsCard {
                item,
                percentages: item.percentages(),
                active_choice: self.tally.active_choice(voter, item.id),
            })
            .collect()
    }

    pub fn export_csv(&self) -> CoreResult<String> {
        render_tally_csv(&self.tally)
    }
}
