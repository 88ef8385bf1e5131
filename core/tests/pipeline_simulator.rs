use newscheck_core::clock::{Clock, FixedClock};
use newscheck_core::error::CoreError;
use newscheck_core::pipeline::scheduler::{Scheduler, TimerQueue};
use newscheck_core::pipeline::simulator::{PipelinePhase, PipelineSimulator, StartOutcome};
use newscheck_core::pipeline::step::StepStatus;
use std::time::Duration;
use time::OffsetDateTime;

const DWELL: Duration = Duration::from_millis(3000);

fn clock() -> FixedClock {
    FixedClock::new(OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap())
}

fn statuses(sim: &PipelineSimulator) -> Vec<StepStatus> {
    sim.steps().iter().map(|s| s.status).collect()
}

#[test]
fn first_step_is_loading_right_after_start() {
    let mut q = TimerQueue::new();
    let mut sim = PipelineSimulator::new(DWELL);
    let out = sim.start(["A", "B", "C"], &mut q).unwrap();
    assert!(out.is_new_run());
    assert_eq!(
        statuses(&sim),
        vec![StepStatus::Loading, StepStatus::Pending, StepStatus::Pending]
    );
    assert_eq!(sim.steps()[0].id, 1);
    assert_eq!(sim.steps()[2].label, "C");
    assert_eq!(q.next_due(), Some(DWELL));
}

#[test]
fn steps_progress_strictly_left_to_right() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    sim.start(["A", "B", "C"], &mut q).unwrap();

    let expected = [
        vec![StepStatus::Complete, StepStatus::Loading, StepStatus::Pending],
        vec![StepStatus::Complete, StepStatus::Complete, StepStatus::Loading],
    ];
    for want in expected.iter() {
        let fired = q.pop_next().unwrap();
        assert!(sim.on_timer(&fired, &mut q, &c).is_none());
        assert_eq!(&statuses(&sim), want);
        // never more than one step loading
        assert_eq!(
            sim.steps().iter().filter(|s| s.status == StepStatus::Loading).count(),
            1
        );
    }
    assert_eq!(q.now(), DWELL * 2);
}

#[test]
fn exactly_one_completion_event_per_run() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    let token = sim.start(["A", "B", "C"], &mut q).unwrap().token().clone();

    let mut completions = Vec::new();
    while let Some(fired) = q.pop_next() {
        if let Some(done) = sim.on_timer(&fired, &mut q, &c) {
            completions.push(done);
        }
    }
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].run, token);
    assert_eq!(completions[0].completed_at, c.now());
    assert!(statuses(&sim).iter().all(|s| *s == StepStatus::Complete));
    assert_eq!(sim.phase(), PipelinePhase::Completed);
    assert!(!sim.is_running());
}

#[test]
fn second_start_returns_same_token_without_resetting() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    let first = sim.start(["A", "B", "C"], &mut q).unwrap();
    let fired = q.pop_next().unwrap();
    sim.on_timer(&fired, &mut q, &c);

    let again = sim.start(["X"], &mut q).unwrap();
    assert_eq!(again, StartOutcome::AlreadyInProgress(first.token().clone()));
    assert_eq!(sim.steps().len(), 3);
    assert_eq!(
        statuses(&sim),
        vec![StepStatus::Complete, StepStatus::Loading, StepStatus::Pending]
    );
    // no second timer was queued
    assert_eq!(q.len(), 1);
}

#[test]
fn empty_step_list_is_invalid_and_leaves_steps_empty() {
    let mut q = TimerQueue::new();
    let mut sim = PipelineSimulator::new(DWELL);
    let err = sim.start(Vec::<String>::new(), &mut q).unwrap_err();
    assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    assert!(sim.steps().is_empty());
    assert!(sim.run_token().is_none());
    assert!(q.is_empty());
}

#[test]
fn cancelled_run_never_completes() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    let token = sim.start(["A", "B"], &mut q).unwrap().token().clone();
    let fired = q.pop_next().unwrap();
    sim.on_timer(&fired, &mut q, &c);

    assert!(sim.cancel(&token, &mut q));
    assert!(q.is_empty());
    assert_eq!(sim.phase(), PipelinePhase::Cancelled);
    assert_eq!(
        statuses(&sim),
        vec![StepStatus::Complete, StepStatus::Loading]
    );
    assert!(!sim.cancel(&token, &mut q));
}

#[test]
fn timer_from_a_cancelled_run_is_ignored_by_the_next_run() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    let old = sim.start(["A"], &mut q).unwrap().token().clone();
    // the host kept a copy of the fired timer after tearing the run down
    let stale = q.pop_next().unwrap();
    sim.cancel(&old, &mut q);

    let fresh = sim.start(["B"], &mut q).unwrap();
    assert_ne!(fresh.token(), &old);
    assert!(sim.on_timer(&stale, &mut q, &c).is_none());
    assert_eq!(statuses(&sim), vec![StepStatus::Loading]);

    let fired = q.pop_next().unwrap();
    let done = sim.on_timer(&fired, &mut q, &c).unwrap();
    assert_eq!(&done.run, fresh.token());
}

#[test]
fn a_new_run_can_start_after_completion() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(DWELL);
    let first = sim.start(["A"], &mut q).unwrap().token().clone();
    let fired = q.pop_next().unwrap();
    sim.on_timer(&fired, &mut q, &c).unwrap();

    let second = sim.start(["A", "B"], &mut q).unwrap();
    assert!(second.is_new_run());
    assert_ne!(second.token(), &first);
    assert_eq!(statuses(&sim), vec![StepStatus::Loading, StepStatus::Pending]);
}

#[test]
fn scheduler_trait_object_drives_the_run() {
    let mut q = TimerQueue::new();
    let c = clock();
    let mut sim = PipelineSimulator::new(Duration::from_millis(1));
    {
        let sched: &mut dyn Scheduler = &mut q;
        sim.start(["only"], sched).unwrap();
    }
    let fired = q.pop_next().unwrap();
    assert!(sim.on_timer(&fired, &mut q, &c).is_some());
}
