use serde::{Deserialize, Serialize};

pub const REPORT_SENT_MESSAGE: &str = "Report sent to PIB for verification";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Processing,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: String,            // n_<ULID>, derived from created_at
    pub subject_label: String, // platform the screenshot came from
    pub created_at_utc: String,
    pub created_at_display: String,
    pub status: NotificationStatus,
    pub message: String,
    pub run_id: String,
}
