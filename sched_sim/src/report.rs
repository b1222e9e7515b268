// Post-run aggregation over the event trace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::events::{EndState, EventContainer};
use crate::scheduler::TaskTrace;
use task_model::{IDLE_TASK_ID, Task, TaskId, Tick};

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task_id: TaskId,
    pub priority: u32,
    /// Jobs retired within the horizon, deadline-missed ones included.
    pub jobs_finished: u64,
    pub deadline_misses: u64,
    pub max_miss_streak: u64,
    /// Times a job of this task lost the processor before finishing.
    pub preemptions: u64,
    pub min_response: Tick,
    pub max_response: Tick,
    pub mean_response: f64,
    /// Worst observed response time over the relative deadline.
    pub worst_response_ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub policy: String,
    pub final_tick: Tick,
    pub busy_ticks: Tick,
    pub idle_ticks: Tick,
    pub task_set_utilization: f64,
    pub total_misses: u64,
    pub tasks: Vec<TaskReport>,
}

/// Roll the trace up into per-task statistics. A job's response time is the
/// end of its final interval minus its release.
pub fn summarize(events: &EventContainer, tasks: &[Task], traces: &[TaskTrace]) -> RunSummary {
    let mut completions: BTreeMap<(TaskId, Tick), Tick> = BTreeMap::new();
    let mut preemptions: BTreeMap<TaskId, u64> = BTreeMap::new();
    let mut busy: Tick = 0;
    for e in events.events() {
        if e.task_id == IDLE_TASK_ID {
            continue;
        }
        busy += e.end - e.begin;
        match e.end_state {
            EndState::End | EndState::EndDeadlineMissed => {
                completions.insert((e.task_id, e.job_release), e.end);
            }
            EndState::Suspend => *preemptions.entry(e.task_id).or_default() += 1,
        }
    }

    let final_tick = events.final_tick().unwrap_or(0);
    let task_reports: Vec<TaskReport> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let responses: Vec<Tick> = completions
                .range((t.id, 0)..=(t.id, Tick::MAX))
                .map(|(&(_, release), &end)| end.saturating_sub(release))
                .collect();
            let mean = if responses.is_empty() {
                0.0
            } else {
                responses.iter().sum::<Tick>() as f64 / responses.len() as f64
            };
            let max = responses.iter().copied().max().unwrap_or(0);
            TaskReport {
                task_id: t.id,
                priority: t.priority,
                jobs_finished: responses.len() as u64,
                deadline_misses: traces.get(i).map_or(0, |tr| tr.deadline_misses),
                max_miss_streak: traces.get(i).map_or(0, |tr| tr.max_streak),
                preemptions: preemptions.get(&t.id).copied().unwrap_or(0),
                min_response: responses.iter().copied().min().unwrap_or(0),
                max_response: max,
                mean_response: mean,
                worst_response_ratio: max as f64 / t.relative_deadline() as f64,
            }
        })
        .collect();

    RunSummary {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        policy: events.policy_label().to_string(),
        final_tick,
        busy_ticks: busy,
        idle_ticks: final_tick.saturating_sub(busy),
        task_set_utilization: tasks
            .iter()
            .map(|t| t.wcet as f64 / t.period as f64)
            .sum(),
        total_misses: task_reports.iter().map(|r| r.deadline_misses).sum(),
        tasks: task_reports,
    }
}
