// lib.rs — task-set model shared by the simulator and its tools

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

// =============================== Common =====================================

/// Unit of simulated time. Carries no physical duration.
pub type Tick = u64;

pub type TaskId = u32;

/// Reserved id of the sentinel task that stands for processor idleness in
/// emitted traces. Real tasks must use ids >= 1.
pub const IDLE_TASK_ID: TaskId = 0;

// =============================== Errors =====================================

#[derive(Error, Debug)]
pub enum TaskSetError {
    #[error("task {id}: period must be positive")] NonPositivePeriod { id: TaskId },
    #[error("task {id}: execution time must be positive")] NonPositiveWcet { id: TaskId },
    #[error("task {id}: relative deadline must be positive")] NonPositiveDeadline { id: TaskId },
    #[error("task id {id} used more than once")] DuplicateId { id: TaskId },
    #[error("task id {IDLE_TASK_ID} is reserved for the idle sentinel")] ReservedId,
    #[error("unsupported task-set file extension: .{0}")] UnsupportedFormat(String),
    #[error("IO: {0}")] Io(#[from] std::io::Error),
    #[error("JSON: {0}")] Json(#[from] serde_json::Error),
    #[error("TOML: {0}")] TomlDe(#[from] toml::de::Error),
    #[error("TOML: {0}")] TomlSer(#[from] toml::ser::Error),
}

// ================================ Task ======================================

/// Parameters of one periodic or sporadic task. Frozen once handed to the
/// simulator; only `priority` is filled in later, by the scheduling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// Period for periodic tasks; minimum release separation for sporadic ones.
    pub period: Tick,

    /// Worst-case execution time in ticks.
    pub wcet: Tick,

    /// Relative deadline. Implied equal to the period when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Tick>,

    /// Release tick of the first job.
    #[serde(default)]
    pub offset: Tick,

    #[serde(default)]
    pub sporadic: bool,

    /// Scheduling priority, higher number wins. Assigned by the policy before
    /// the first job is released; 0 means not yet assigned.
    #[serde(default, skip_serializing)]
    pub priority: u32,
}

impl Task {
    pub fn periodic(id: TaskId, period: Tick, wcet: Tick) -> Self {
        Self {
            id,
            period,
            wcet,
            deadline: None,
            offset: 0,
            sporadic: false,
            priority: 0,
        }
    }

    /// A task that may be released no more often than every `min_separation`
    /// ticks, but possibly less often.
    pub fn sporadic(id: TaskId, min_separation: Tick, wcet: Tick) -> Self {
        Self {
            sporadic: true,
            ..Self::periodic(id, min_separation, wcet)
        }
    }

    pub fn with_deadline(mut self, deadline: Tick) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_offset(mut self, offset: Tick) -> Self {
        self.offset = offset;
        self
    }

    pub fn relative_deadline(&self) -> Tick {
        self.deadline.unwrap_or(self.period)
    }

    pub fn is_idle(&self) -> bool {
        self.id == IDLE_TASK_ID
    }
}

// ============================== Task set ====================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSet {
    pub tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Structural checks every set must pass before it is simulated.
    pub fn validate(&self) -> Result<(), TaskSetError> {
        let mut seen = HashSet::new();
        for t in &self.tasks {
            if t.id == IDLE_TASK_ID {
                return Err(TaskSetError::ReservedId);
            }
            if !seen.insert(t.id) {
                return Err(TaskSetError::DuplicateId { id: t.id });
            }
            if t.period == 0 {
                return Err(TaskSetError::NonPositivePeriod { id: t.id });
            }
            if t.wcet == 0 {
                return Err(TaskSetError::NonPositiveWcet { id: t.id });
            }
            if t.deadline == Some(0) {
                return Err(TaskSetError::NonPositiveDeadline { id: t.id });
            }
        }
        Ok(())
    }

    /// Sum of wcet/period over all tasks.
    pub fn utilization(&self) -> f64 {
        self.tasks
            .iter()
            .map(|t| t.wcet as f64 / t.period as f64)
            .sum()
    }

    /// Least common multiple of all periods. A natural simulation horizon:
    /// a periodic schedule repeats every hyper-period. 1 for an empty set.
    pub fn hyper_period(&self) -> Tick {
        self.tasks.iter().map(|t| t.period).fold(1, lcm)
    }

    /// Read a task set from a `.json` or `.toml` file and validate it.
    pub fn load(path: &Path) -> Result<Self, TaskSetError> {
        let text = fs::read_to_string(path)?;
        let set: Self = match extension(path) {
            "json" => serde_json::from_str(&text)?,
            "toml" => toml::from_str(&text)?,
            other => return Err(TaskSetError::UnsupportedFormat(other.to_string())),
        };
        set.validate()?;
        Ok(set)
    }

    /// Write the set in the format implied by the file extension.
    pub fn save(&self, path: &Path) -> Result<(), TaskSetError> {
        let text = match extension(path) {
            "json" => serde_json::to_string_pretty(self)?,
            "toml" => toml::to_string_pretty(self)?,
            other => return Err(TaskSetError::UnsupportedFormat(other.to_string())),
        };
        fs::write(path, text)?;
        Ok(())
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

fn gcd(a: Tick, b: Tick) -> Tick {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: Tick, b: Tick) -> Tick {
    a / gcd(a, b) * b
}

// ================================ Tests =====================================
