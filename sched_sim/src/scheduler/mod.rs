// src/scheduler/mod.rs
pub mod fixed_priority;
pub mod sim;

pub use fixed_priority::FixedPriorityRm;
pub use sim::{SimOptions, Simulator, TaskTrace};

use task_model::{Task, Tick};

/// One activation of a task: its release, its deadline, and how much of its
/// execution demand is still outstanding. The simulator keeps exactly one of
/// these per task at all times, replacing it whenever a job retires.
#[derive(Debug, Clone)]
pub struct Job {
    /// Index of the owning task in the frozen task set.
    pub task: usize,
    pub release_time: Tick,
    pub absolute_deadline: Tick,
    pub remaining_exec_time: Tick,
    pub has_started: bool,
}

/// Decision hooks a concrete scheduling discipline supplies to the core.
/// `jobs` is the per-task next-job table, indexed like `tasks`.
pub trait SchedulingPolicy {
    /// Label stamped on the event container this policy produces.
    fn label(&self) -> &'static str;

    /// Assign scheduling priorities to the frozen task set. Runs once, before
    /// the first job is materialized, and must leave priorities distinct.
    fn assign_priorities(&self, tasks: &mut [Task]);

    /// Index of the job to run at `tick`: the preferred released job, or the
    /// earliest future release when nothing is ready yet.
    fn next_job(&self, tasks: &[Task], jobs: &[Job], tick: Tick) -> usize;

    /// Earliest tick strictly after `tick` at which some other known job
    /// would take the processor from `running`, or `None` if it gets to run
    /// to completion undisturbed.
    fn preempting_tick(
        &self,
        tasks: &[Task],
        jobs: &[Job],
        running: usize,
        tick: Tick,
    ) -> Option<Tick>;

    /// Called after every executed interval `[begin, end]`.
    fn on_run_executed(&mut self, _task: &Task, _begin: Tick, _end: Tick) {}

    /// Called when a job overruns its deadline and the run keeps going.
    fn on_deadline_missed(&mut self, _task: &Task, _deadline: Tick, _finish: Tick) {}
}
