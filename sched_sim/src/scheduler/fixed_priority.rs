// src/scheduler/fixed_priority.rs
//
// Preemptive fixed-priority scheduling with rate-monotonic assignment:
// the shorter the period, the higher the priority.

use std::cmp::Reverse;

use super::{Job, SchedulingPolicy};
use task_model::{Task, Tick};

pub struct FixedPriorityRm;

impl SchedulingPolicy for FixedPriorityRm {
    fn label(&self) -> &'static str {
        "FixedPriority"
    }

    fn assign_priorities(&self, tasks: &mut [Task]) {
        // RM order: shorter period wins, ties broken by id ascending.
        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by_key(|&i| (tasks[i].period, tasks[i].id));
        let n = tasks.len() as u32;
        for (rank, &i) in order.iter().enumerate() {
            tasks[i].priority = n - rank as u32;
        }
    }

    fn next_job(&self, tasks: &[Task], jobs: &[Job], tick: Tick) -> usize {
        if let Some((idx, _)) = jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.release_time <= tick)
            .max_by_key(|&(i, _)| tasks[i].priority)
        {
            return idx;
        }
        // Nothing released: the earliest future release, preferring the
        // higher-priority task on equal release ticks.
        jobs.iter()
            .enumerate()
            .min_by_key(|&(i, j)| (j.release_time, Reverse(tasks[i].priority)))
            .map(|(i, _)| i)
            .expect("next_job requires a non-empty job table")
    }

    fn preempting_tick(
        &self,
        tasks: &[Task],
        jobs: &[Job],
        running: usize,
        tick: Tick,
    ) -> Option<Tick> {
        let finish = tick + jobs[running].remaining_exec_time;
        let priority = tasks[running].priority;
        jobs.iter()
            .enumerate()
            .filter(|&(i, j)| {
                i != running
                    && j.release_time > tick
                    && j.release_time < finish
                    && tasks[i].priority > priority
            })
            .map(|(_, j)| j.release_time)
            .min()
    }
}
