use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_DWELL_MS: u64 = 3000;
pub const DEFAULT_MAX_SCREENSHOT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub dwell_ms: u64,
    pub step_labels: Vec<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            dwell_ms: DEFAULT_DWELL_MS,
            step_labels: vec![
                "Detecting Labels in the image...".to_string(),
                "Analysing the Labels...".to_string(),
                "Checking the Source...".to_string(),
            ],
        }
    }
}

impl SimulatorConfig {
    pub fn dwell(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.dwell_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformOption {
    pub value: String,
    pub display_name: String,
}

impl PlatformOption {
    fn new(value: &str, display_name: &str) -> Self {
        Self {
            value: value.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenshotPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for ScreenshotPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_SCREENSHOT_BYTES,
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Seed row for the breaking-news board. Counts are not part of the fixture;
/// every item starts at zero votes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsFixture {
    pub id: u32,
    pub title: String,
    pub source: String,
    pub platform: String,
    pub posted: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub simulator: SimulatorConfig,
    pub platforms: Vec<PlatformOption>,
    pub screenshot: ScreenshotPolicy,
    pub breaking_news: Vec<NewsFixture>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            platforms: default_platforms(),
            screenshot: ScreenshotPolicy::default(),
            breaking_news: default_breaking_news(),
        }
    }
}

impl AppConfig {
    pub fn from_json(s: &str) -> CoreResult<Self> {
        let cfg: AppConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.simulator.step_labels.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "simulator.step_labels must not be empty".to_string(),
            ));
        }
        if self.platforms.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "platforms must not be empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for p in &self.platforms {
            if p.value.trim().is_empty() {
                return Err(CoreError::InvalidConfiguration(
                    "platform value must not be empty".to_string(),
                ));
            }
            if !seen.insert(p.value.as_str()) {
                return Err(CoreError::InvalidConfiguration(format!(
                    "duplicate platform value {}",
                    p.value
                )));
            }
        }
        if self.screenshot.allowed_extensions.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "screenshot.allowed_extensions must not be empty".to_string(),
            ));
        }
        let mut ids = BTreeSet::new();
        for n in &self.breaking_news {
            if !ids.insert(n.id) {
                return Err(CoreError::InvalidConfiguration(format!(
                    "duplicate news item id {}",
                    n.id
                )));
            }
        }
        Ok(())
    }
}

fn default_platforms() -> Vec<PlatformOption> {
    vec![
        PlatformOption::new("youtube", "YouTube"),
        PlatformOption::new("facebook", "Facebook"),
        PlatformOption::new("instagram", "Instagram"),
        PlatformOption::new("x", "X (Twitter)"),
        PlatformOption::new("tv", "TV"),
        PlatformOption::new("others", "Others"),
    ]
}

fn default_breaking_news() -> Vec<NewsFixture> {
    let rows = [
        (
            1,
            "Major Tech Company Announces Breakthrough in Quantum Computing",
            "Tech News Daily",
            "Twitter/X",
            "15 minutes ago",
            "Company claims to have achieved quantum supremacy with new processor design.",
        ),
        (
            2,
            "Government to Implement New Digital Currency Policy",
            "Financial Express",
            "Facebook",
            "32 minutes ago",
            "Sources suggest major policy shift in cryptocurrency regulation coming next month.",
        ),
        (
            3,
            "Scientists Discover Potential Cure for Common Disease",
            "Medical Journal",
            "LinkedIn",
            "1 hour ago",
            "Preliminary research shows promising results in clinical trials.",
        ),
        (
            4,
            "International Summit Reaches Climate Agreement",
            "Global News Network",
            "YouTube",
            "2 hours ago",
            "World leaders commit to new emission targets, details yet to be confirmed.",
        ),
        (
            5,
            "Space Agency Plans Mission to Distant Planet",
            "Space Today",
            "Instagram",
            "3 hours ago",
            "Ambitious project aims to explore previously unreachable region of solar system.",
        ),
    ];
    rows.iter()
        .map(|(id, title, source, platform, posted, description)| NewsFixture {
            id: *id,
            title: title.to_string(),
            source: source.to_string(),
            platform: platform.to_string(),
            posted: posted.to_string(),
            description: description.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.simulator.step_labels.len(), 3);
        assert_eq!(cfg.breaking_news.len(), 5);
        let x = cfg.platforms.iter().find(|p| p.value == "x").unwrap();
        assert_eq!(x.display_name, "X (Twitter)");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = AppConfig::from_json(r#"{"simulator":{"dwell_ms":5,"step_labels":["A"]}}"#)
            .unwrap();
        assert_eq!(cfg.simulator.dwell_ms, 5);
        assert_eq!(cfg.platforms.len(), 6);
    }

    #[test]
    fn duplicate_item_ids_are_rejected() {
        let mut cfg = AppConfig::default();
        let dup = cfg.breaking_news[0].clone();
        cfg.breaking_news.push(dup);
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }
}
