// Interval events emitted by the scheduler core, and their ordered log.

use serde::{Deserialize, Serialize};
use std::fmt;
use task_model::{TaskId, Tick};

/// How a scheduling interval opened for its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeginState {
    /// First time this job got the processor.
    Start,
    /// The job had run before and was suspended in between.
    Resume,
}

/// How a scheduling interval closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndState {
    /// The job finished its execution demand.
    End,
    /// A higher-priority release took the processor.
    Suspend,
    /// The job was cut off at its absolute deadline.
    EndDeadlineMissed,
}

impl fmt::Display for BeginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BeginState::Start => "start",
            BeginState::Resume => "resume",
        })
    }
}

impl fmt::Display for EndState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndState::End => "end",
            EndState::Suspend => "suspend",
            EndState::EndDeadlineMissed => "end_deadline_missed",
        })
    }
}

/// One closed interval `[begin, end]` of processor time, attributed to the
/// task that ran on it (or the idle sentinel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerIntervalEvent {
    pub begin: Tick,
    pub end: Tick,
    pub task_id: TaskId,
    /// Initial arrival tick of the job this interval belongs to.
    pub job_release: Tick,
    pub begin_state: BeginState,
    pub end_state: EndState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Append-only event log, totally ordered by insertion (equivalently by
/// `begin`), tagged with the policy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContainer {
    policy: &'static str,
    events: Vec<SchedulerIntervalEvent>,
}

impl EventContainer {
    pub fn new(policy: &'static str) -> Self {
        Self {
            policy,
            events: Vec::new(),
        }
    }

    pub fn policy_label(&self) -> &'static str {
        self.policy
    }

    pub fn events(&self) -> &[SchedulerIntervalEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Last covered tick, if any event has been recorded.
    pub fn final_tick(&self) -> Option<Tick> {
        self.events.last().map(|e| e.end)
    }

    pub fn push(&mut self, event: SchedulerIntervalEvent) {
        debug_assert!(event.end >= event.begin);
        debug_assert!(
            self.events.last().is_none_or(|prev| prev.end <= event.begin),
            "events must be appended in tick order"
        );
        self.events.push(event);
    }

    /// Cut the log off at `limit`: events beginning past it are dropped and a
    /// straddling final event is truncated so its end is at most `limit`.
    pub fn trim_to(&mut self, limit: Tick) {
        while self.events.last().is_some_and(|e| e.begin > limit) {
            self.events.pop();
        }
        if let Some(last) = self.events.last_mut() {
            if last.end > limit {
                last.end = limit;
            }
        }
    }

    /// Drop the warm-up prefix: events ending at or before `offset` are
    /// discarded and a straddling first event starts no earlier than `offset`.
    pub fn trim_before(&mut self, offset: Tick) {
        let keep_from = self
            .events
            .iter()
            .position(|e| e.end > offset)
            .unwrap_or(self.events.len());
        self.events.drain(..keep_from);
        if let Some(first) = self.events.first_mut() {
            if first.begin < offset {
                first.begin = offset;
            }
        }
    }

    /// Per-tick rendering for external tooling: each event contributes
    /// `end - begin` copies of its task id, all joined by `", "`.
    pub fn to_tick_string(&self) -> String {
        let mut ids = Vec::new();
        for e in &self.events {
            for _ in e.begin..e.end {
                ids.push(e.task_id.to_string());
            }
        }
        ids.join(", ")
    }
}
