// thiserror-based simulation errors
use task_model::{TaskId, TaskSetError, Tick};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("task set: {0}")] TaskSet(#[from] TaskSetError),
    #[error("task {task}: priority {priority} also assigned to task {other}")]
    DuplicatePriority { task: TaskId, other: TaskId, priority: u32 },
    #[error("task {task}: deadline miss at {deadline}, job would finish at {finish}")]
    DeadlineMiss { task: TaskId, deadline: Tick, finish: Tick },
    #[error("task {task}: policy produced preemption at {at} while the clock is at {tick}")]
    PreemptionNotInFuture { task: TaskId, at: Tick, tick: Tick },
    #[error("cannot advance an empty task set")] EmptyTaskSet,
}
