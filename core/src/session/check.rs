use crate::audit::event::{Actor, AuditEvent};
use crate::audit::log::AuditTrail;
use crate::clock::{rfc3339_utc, Clock, FixedClock};
use crate::config::{AppConfig, PlatformOption, ScreenshotPolicy};
use crate::error::{CoreError, CoreResult};
use crate::notifications::log::{NotificationLog, NotificationTime};
use crate::pipeline::scheduler::{FiredTimer, Scheduler, TimerQueue};
use crate::pipeline::simulator::{PipelineSimulator, StartOutcome};
use crate::pipeline::step::{Step, StepStatus};
use crate::session::notice::Notice;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{error, warn};

pub const MISSING_INPUT_MESSAGE: &str = "select a platform and upload a screenshot";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Screenshot {
    pub file_name: String,
    pub size_bytes: u64,
}

/// The screenshot-check page as plain state: inputs, the analysis pipeline,
/// the notification log it feeds, and the results gate.
pub struct NewsCheckSession<C: Clock> {
    clock: C,
    platforms: Vec<PlatformOption>,
    step_labels: Vec<String>,
    screenshot_policy: ScreenshotPolicy,
    image_name: Regex,
    platform: Option<String>,
    screenshot: Option<Screenshot>,
    simulator: PipelineSimulator,
    notifications: NotificationLog,
    // platform captured when the run started; later selections don't relabel it
    in_flight_subject: Option<String>,
    show_results: bool,
    audit: AuditTrail,
}

impl<C: Clock> NewsCheckSession<C> {
    pub fn new(cfg: &AppConfig, clock: C) -> CoreResult<Self> {
        cfg.validate()?;
        let image_name = image_name_pattern(&cfg.screenshot.allowed_extensions)?;
        Ok(Self {
            clock,
            platforms: cfg.platforms.clone(),
            step_labels: cfg.simulator.step_labels.clone(),
            screenshot_policy: cfg.screenshot.clone(),
            image_name,
            platform: None,
            screenshot: None,
            simulator: PipelineSimulator::from_config(&cfg.simulator),
            notifications: NotificationLog::new(),
            in_flight_subject: None,
            show_results: false,
            audit: AuditTrail::new(),
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn screenshot(&self) -> Option<&Screenshot> {
        self.screenshot.as_ref()
    }

    pub fn steps(&self) -> &[Step] {
        self.simulator.steps()
    }

    pub fn simulator(&self) -> &PipelineSimulator {
        &self.simulator
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn is_analyzing(&self) -> bool {
        self.simulator.is_running()
    }

    pub fn show_results(&self) -> bool {
        self.show_results
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Whether the "check" action should be enabled.
    pub fn can_start(&self) -> bool {
        !self.is_analyzing() && self.platform.is_some() && self.screenshot.is_some()
    }

    pub fn select_platform(&mut self, value: &str) -> CoreResult<&PlatformOption> {
        let Some(option) = self.platforms.iter().find(|p| p.value == value) else {
            warn!(platform = value, "unknown platform selected");
            return Err(CoreError::InvalidConfiguration(format!(
                "unknown platform {}",
                value
            )));
        };
        self.platform = Some(option.value.clone());
        Ok(option)
    }

    pub fn attach_screenshot(&mut self, file_name: &str, size_bytes: u64) -> CoreResult<Notice> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "screenshot file name must not be empty".to_string(),
            ));
        }
        if !self.image_name.is_match(file_name) {
            warn!(file = file_name, "screenshot rejected, not an image");
            return Err(CoreError::InvalidConfiguration(format!(
                "{} is not a supported image ({})",
                file_name,
                self.screenshot_policy.allowed_extensions.join(", ")
            )));
        }
        if size_bytes > self.screenshot_policy.max_bytes {
            warn!(file = file_name, size_bytes, "screenshot rejected, too large");
            return Err(CoreError::InvalidConfiguration(format!(
                "{} exceeds the {} byte limit",
                file_name, self.screenshot_policy.max_bytes
            )));
        }
        self.screenshot = Some(Screenshot {
            file_name: file_name.to_string(),
            size_bytes,
        });
        Ok(Notice::ScreenshotUploaded {
            file_name: file_name.to_string(),
        })
    }

    /// Starts the analysis run. A call while a run is in flight changes nothing
    /// and hands back the existing run's token.
    ///
    /// Errors are raised before the pipeline or the scheduler is touched.
    pub fn start_analysis(&mut self, sched: &mut dyn Scheduler) -> CoreResult<StartOutcome> {
        let ts = self.now_utc()?;
        if let Some(run) = self.simulator.run_token().cloned() {
            self.record(
                AuditEvent::new(
                    ts,
                    "RUN_START_IGNORED",
                    Actor::User,
                    json!({"reason": "run already in progress"}),
                )
                .with_run(run.as_str()),
            );
            return Ok(StartOutcome::AlreadyInProgress(run));
        }

        let subject = match (self.platform.clone(), self.screenshot.is_some()) {
            (Some(p), true) => p,
            _ => {
                warn!("analysis rejected, missing platform or screenshot");
                self.record(AuditEvent::new(
                    ts,
                    "ANALYSIS_REJECTED",
                    Actor::User,
                    json!({"reason": MISSING_INPUT_MESSAGE}),
                ));
                return Err(CoreError::InvalidConfiguration(
                    MISSING_INPUT_MESSAGE.to_string(),
                ));
            }
        };

        let outcome = self.simulator.start(self.step_labels.clone(), sched)?;
        self.show_results = false;
        self.in_flight_subject = Some(subject.clone());
        self.record(
            AuditEvent::new(
                ts.clone(),
                "RUN_STARTED",
                Actor::User,
                json!({
                    "step_labels": self.step_labels,
                    "dwell_ms": self.simulator.dwell().as_millis() as u64,
                    "screenshot": self.screenshot.as_ref().map(|s| s.file_name.clone()),
                }),
            )
            .with_run(outcome.token().as_str())
            .with_subject(subject),
        );
        self.flush_transitions(&ts);
        Ok(outcome)
    }

    /// Feeds one fired timer to the pipeline. Returns a notice when the run
    /// finishes and its notification has been appended.
    ///
    /// On error the timer has not been consumed; delivering it again resumes
    /// the run where it stood.
    pub fn on_timer(
        &mut self,
        fired: &FiredTimer,
        sched: &mut dyn Scheduler,
    ) -> CoreResult<Option<Notice>> {
        let now = self.clock.now();
        let ts = rfc3339_utc(now)?;
        let created = NotificationTime::at(now)?;

        let completed = self.simulator.on_timer(fired, sched, &FixedClock::new(now));
        self.flush_transitions(&ts);
        let Some(done) = completed else {
            return Ok(None);
        };

        let subject = self.in_flight_subject.take().unwrap_or_default();
        self.record(
            AuditEvent::new(
                ts.clone(),
                "RUN_COMPLETED",
                Actor::System,
                json!({"steps_completed": self.simulator.completed_steps() as u64}),
            )
            .with_run(done.run.as_str())
            .with_subject(subject.clone()),
        );

        let record = self.notifications.append_completed(&done, created, &subject);
        self.record(
            AuditEvent::new(
                ts,
                "NOTIFICATION_APPENDED",
                Actor::System,
                json!({"notification_id": record.id, "status": record.status}),
            )
            .with_run(done.run.as_str())
            .with_subject(subject),
        );
        self.show_results = true;
        Ok(Some(Notice::AnalysisComplete {
            notification_id: record.id,
        }))
    }

    /// Runs the host's timer loop for `elapsed` of virtual time, including
    /// timers scheduled along the way.
    pub fn advance_by(&mut self, queue: &mut TimerQueue, elapsed: Duration) -> CoreResult<Vec<Notice>> {
        let until = queue.now() + elapsed;
        let mut notices = Vec::new();
        loop {
            // checked before popping so a failing clock leaves the timer queued
            self.now_utc()?;
            let Some(fired) = queue.pop_due(until) else {
                break;
            };
            if let Some(n) = self.on_timer(&fired, queue)? {
                notices.push(n);
            }
        }
        queue.advance_to(until);
        Ok(notices)
    }

    pub fn cancel_analysis(&mut self, sched: &mut dyn Scheduler, reason: &str) -> CoreResult<bool> {
        let Some(run) = self.simulator.run_token().cloned() else {
            return Ok(false);
        };
        let ts = self.now_utc()?;
        self.simulator.cancel(&run, sched);
        let subject = self.in_flight_subject.take().unwrap_or_default();
        self.record(
            AuditEvent::new(
                ts,
                "RUN_CANCELLED",
                Actor::User,
                json!({
                    "steps_completed": self.simulator.completed_steps() as u64,
                    "steps_total": self.simulator.steps().len() as u64,
                    "reason": reason,
                }),
            )
            .with_run(run.as_str())
            .with_subject(subject),
        );
        Ok(true)
    }

    /// Disposes the view: an in-flight run is cancelled and its timer withdrawn.
    pub fn teardown(&mut self, sched: &mut dyn Scheduler) -> CoreResult<bool> {
        self.cancel_analysis(sched, "view disposed")
    }

    fn flush_transitions(&mut self, ts: &str) {
        for t in self.simulator.take_transitions() {
            self.record(
                AuditEvent::new(
                    ts,
                    "STEP_STATE_CHANGED",
                    Actor::System,
                    json!({
                        "step_id": t.step_id,
                        "from_state": status_name(t.from),
                        "to_state": status_name(t.to),
                    }),
                )
                .with_run(t.run.as_str()),
            );
        }
    }

    // Called once the state change is committed, so a rejected event is logged
    // rather than turned into an error for a call that already took effect.
    fn record(&mut self, event: AuditEvent) {
        if let Err(e) = self.audit.append(event) {
            error!(error = %e, "audit event dropped");
        }
    }

    fn now_utc(&self) -> CoreResult<String> {
        rfc3339_utc(self.clock.now())
    }
}

fn status_name(s: StepStatus) -> &'static str {
    match s {
        StepStatus::Pending => "pending",
        StepStatus::Loading => "loading",
        StepStatus::Complete => "complete",
    }
}

fn image_name_pattern(extensions: &[String]) -> CoreResult<Regex> {
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|e| regex::escape(e.trim_start_matches('.')))
        .collect();
    Regex::new(&format!(r"(?i)^[^/\\]+\.(?:{})$", alternatives.join("|"))).map_err(|e| {
        CoreError::InvalidConfiguration(format!("screenshot extension pattern: {}", e))
    })
}
