use crate::clock::Clock;
use crate::config::SimulatorConfig;
use crate::determinism::ids::RunToken;
use crate::error::{CoreError, CoreResult};
use crate::pipeline::scheduler::{FiredTimer, Scheduler, TimerId};
use crate::pipeline::step::{valid_step_transition, Step, StepStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(RunToken),
    /// A run was already in flight; nothing changed.
    AlreadyInProgress(RunToken),
}

impl StartOutcome {
    pub fn token(&self) -> &RunToken {
        match self {
            StartOutcome::Started(t) | StartOutcome::AlreadyInProgress(t) => t,
        }
    }

    pub fn is_new_run(&self) -> bool {
        matches!(self, StartOutcome::Started(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCompleted {
    pub run: RunToken,
    pub completed_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransition {
    pub run: RunToken,
    pub step_id: u32,
    pub from: StepStatus,
    pub to: StepStatus,
}

/// Staged analysis pipeline. Steps are serialized: exactly one step is
/// `Loading` while a run is in flight, every step before it is `Complete`,
/// every step after it is `Pending`.
///
/// Runs can be cancelled; a cancelled run never emits [`PipelineCompleted`]
/// and its pending timer is withdrawn from the scheduler.
#[derive(Debug)]
pub struct PipelineSimulator {
    dwell: Duration,
    steps: Vec<Step>,
    run: Option<RunToken>,
    cursor: usize,
    timer: Option<TimerId>,
    phase: PipelinePhase,
    journal: Vec<StepTransition>,
}

impl PipelineSimulator {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            steps: Vec::new(),
            run: None,
            cursor: 0,
            timer: None,
            phase: PipelinePhase::Idle,
            journal: Vec::new(),
        }
    }

    pub fn from_config(cfg: &SimulatorConfig) -> Self {
        Self::new(cfg.dwell())
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn run_token(&self) -> Option<&RunToken> {
        self.run.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Complete)
            .count()
    }

    /// Transitions recorded since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<StepTransition> {
        std::mem::take(&mut self.journal)
    }

    pub fn start<I, S>(&mut self, labels: I, sched: &mut dyn Scheduler) -> CoreResult<StartOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // The guard is checked and set within this call; the host runtime never
        // interleaves another callback before it returns.
        if let Some(run) = &self.run {
            debug!(run = %run, "start ignored, run already in progress");
            return Ok(StartOutcome::AlreadyInProgress(run.clone()));
        }

        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            warn!("start rejected, empty step list");
            return Err(CoreError::InvalidConfiguration(
                "step list must not be empty".to_string(),
            ));
        }

        let run = RunToken::fresh();
        self.steps = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Step::pending(i as u32 + 1, label))
            .collect();
        self.cursor = 0;
        self.run = Some(run.clone());
        self.phase = PipelinePhase::Running;
        self.journal.clear();
        self.set_status(0, StepStatus::Loading);
        self.timer = Some(sched.schedule(self.dwell, run.clone()));

        info!(run = %run, steps = self.steps.len(), dwell_ms = self.dwell.as_millis() as u64, "pipeline run started");
        Ok(StartOutcome::Started(run))
    }

    /// Handles one fired timer. Timers that do not belong to the in-flight run
    /// (cancelled, superseded, or from a disposed view) are ignored.
    pub fn on_timer(
        &mut self,
        fired: &FiredTimer,
        sched: &mut dyn Scheduler,
        clock: &dyn Clock,
    ) -> Option<PipelineCompleted> {
        if self.timer != Some(fired.id) || self.run.as_ref() != Some(&fired.run) {
            debug!(run = %fired.run, "ignoring stale timer");
            return None;
        }
        self.timer = None;

        self.set_status(self.cursor, StepStatus::Complete);
        if self.cursor + 1 < self.steps.len() {
            self.cursor += 1;
            self.set_status(self.cursor, StepStatus::Loading);
            self.timer = Some(sched.schedule(self.dwell, fired.run.clone()));
            return None;
        }

        let run = self.run.take()?;
        self.phase = PipelinePhase::Completed;
        let completed_at = clock.now();
        info!(run = %run, "pipeline run completed");
        Some(PipelineCompleted { run, completed_at })
    }

    /// Abandons the in-flight run if `run` identifies it. Steps keep the status
    /// they reached; no completion event fires for this run afterwards.
    pub fn cancel(&mut self, run: &RunToken, sched: &mut dyn Scheduler) -> bool {
        if self.run.as_ref() != Some(run) {
            return false;
        }
        if let Some(id) = self.timer.take() {
            sched.cancel(id);
        }
        self.run = None;
        self.phase = PipelinePhase::Cancelled;
        info!(run = %run, completed = self.completed_steps(), total = self.steps.len(), "pipeline run cancelled");
        true
    }

    /// Returns every step to `Pending`. Refused while a run is in flight, since
    /// that would move statuses backwards mid-run.
    pub fn reset(&mut self) -> CoreResult<()> {
        if let Some(run) = &self.run {
            return Err(CoreError::AlreadyInProgress(run.to_string()));
        }
        for s in &mut self.steps {
            s.status = StepStatus::Pending;
        }
        self.cursor = 0;
        self.phase = PipelinePhase::Idle;
        self.journal.clear();
        Ok(())
    }

    fn set_status(&mut self, idx: usize, to: StepStatus) {
        let Some(step) = self.steps.get_mut(idx) else {
            return;
        };
        let from = step.status;
        debug_assert!(
            valid_step_transition(from, to),
            "step {} cannot move {:?} -> {:?}",
            step.id,
            from,
            to
        );
        if !valid_step_transition(from, to) {
            return;
        }
        step.status = to;
        debug!(step = step.id, label = %step.label, ?from, ?to, "step state changed");
        if let Some(run) = &self.run {
            self.journal.push(StepTransition {
                run: run.clone(),
                step_id: step.id,
                from,
                to,
            });
        }
    }
}
