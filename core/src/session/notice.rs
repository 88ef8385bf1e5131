use serde::{Deserialize, Serialize};

/// User-facing feedback produced by the hosting flows. Presentation (toast,
/// banner, nothing) is up to the view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    ScreenshotUploaded { file_name: String },
    AnalysisComplete { notification_id: String },
    VotedTrue,
    VotedFake,
    VoteRemoved,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::ScreenshotUploaded { .. } => "Screenshot uploaded successfully!",
            Notice::AnalysisComplete { .. } => "Analysis complete! Report sent to PIB.",
            Notice::VotedTrue => "Voted True",
            Notice::VotedFake => "Voted Fake",
            Notice::VoteRemoved => "Vote Removed",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Notice::ScreenshotUploaded { file_name } => file_name.clone(),
            Notice::AnalysisComplete { .. } => {
                "Results will be available in the Notifications section.".to_string()
            }
            Notice::VotedTrue | Notice::VotedFake => "Thank you for your contribution!".to_string(),
            Notice::VoteRemoved => "Your vote has been removed.".to_string(),
        }
    }
}
