use crate::determinism::ids::{RunToken, TimeDerivedIds};
use crate::clock::{display_timestamp, rfc3339_utc};
use crate::error::CoreResult;
use crate::notifications::record::{NotificationRecord, NotificationStatus, REPORT_SENT_MESSAGE};
use crate::pipeline::simulator::PipelineCompleted;
use time::OffsetDateTime;
use tracing::debug;

/// Creation time of a notification, formatted up front so appending the
/// record itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTime {
    at: OffsetDateTime,
    utc: String,
    display: String,
}

impl NotificationTime {
    pub fn at(at: OffsetDateTime) -> CoreResult<Self> {
        Ok(Self {
            at,
            utc: rfc3339_utc(at)?,
            display: display_timestamp(at)?,
        })
    }
}

/// Append-only notification list for one session. Owned by whoever drives the
/// pipeline and lent read-only to the view; records are never edited or removed.
#[derive(Debug, Default)]
pub struct NotificationLog {
    // oldest first internally; readers get newest first
    records: Vec<NotificationRecord>,
    ids: TimeDerivedIds,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends the record for a completed run and returns a copy of it.
    pub fn append_completed(
        &mut self,
        event: &PipelineCompleted,
        created: NotificationTime,
        subject_label: &str,
    ) -> NotificationRecord {
        let record = NotificationRecord {
            id: self.ids.next_for(created.at),
            subject_label: subject_label.to_string(),
            created_at_utc: created.utc,
            created_at_display: created.display,
            status: NotificationStatus::Completed,
            message: REPORT_SENT_MESSAGE.to_string(),
            run_id: event.run.to_string(),
        };
        debug!(id = %record.id, subject = %record.subject_label, "notification appended");
        self.records.push(record.clone());
        record
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter().rev()
    }

    pub fn latest(&self) -> Option<&NotificationRecord> {
        self.records.last()
    }

    pub fn for_run(&self, run: &RunToken) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.run_id == run.as_str())
    }
}
