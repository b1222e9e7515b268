// src/scheduler/sim.rs
//
// The advanceable core. Each `advance()` moves the virtual clock to the next
// scheduling point and appends at most one interval event: an idle gap, a
// preempted slice, or a run to completion (possibly cut at the deadline).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Job, SchedulingPolicy};
use crate::errors::SimError;
use crate::events::{BeginState, EndState, EventContainer, SchedulerIntervalEvent};
use crate::variation::Variation;
use task_model::{IDLE_TASK_ID, Task, TaskSet, Tick};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimOptions {
    /// Draw per-job execution demand and sporadic gaps from the variation
    /// source instead of using WCET and period directly.
    pub run_time_variation: bool,
    /// Emit explicit events for idle gaps; otherwise gaps stay implicit.
    pub gen_idle_time_events: bool,
    /// Abort the run on the first deadline miss instead of recording it.
    pub assert_on_deadline_miss: bool,
    /// Keep per-task miss counters, miss streaks, and inter-arrival history.
    pub trace_enabled: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            run_time_variation: false,
            gen_idle_time_events: true,
            assert_on_deadline_miss: false,
            trace_enabled: true,
        }
    }
}

/// Per-task bookkeeping accumulated while the simulation runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskTrace {
    pub deadline_misses: u64,
    pub in_miss_streak: bool,
    /// Length of the current run of back-to-back misses.
    pub current_streak: u64,
    pub max_streak: u64,
    /// Gap between consecutive releases, one entry per materialized job.
    pub inter_arrivals: Vec<Tick>,
}

pub struct Simulator {
    tasks: Vec<Task>,
    jobs: Vec<Job>,
    tick: Tick,
    events: EventContainer,
    policy: Box<dyn SchedulingPolicy>,
    variation: Box<dyn Variation>,
    options: SimOptions,
    traces: Vec<TaskTrace>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("tasks", &self.tasks)
            .field("jobs", &self.jobs)
            .field("tick", &self.tick)
            .field("events", &self.events)
            .field("policy", &self.policy.label())
            .field("options", &self.options)
            .field("traces", &self.traces)
            .finish()
    }
}

impl Simulator {
    pub fn new(
        task_set: TaskSet,
        policy: Box<dyn SchedulingPolicy>,
        mut variation: Box<dyn Variation>,
        options: SimOptions,
    ) -> Result<Self, SimError> {
        task_set.validate()?;
        let mut tasks = task_set.tasks;
        policy.assign_priorities(&mut tasks);
        for (i, a) in tasks.iter().enumerate() {
            for b in &tasks[i + 1..] {
                if a.priority == b.priority {
                    return Err(SimError::DuplicatePriority {
                        task: a.id,
                        other: b.id,
                        priority: a.priority,
                    });
                }
            }
        }

        let jobs = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let exec = if options.run_time_variation {
                    variation.execution_time(t)
                } else {
                    t.wcet
                };
                Job {
                    task: i,
                    release_time: t.offset,
                    absolute_deadline: t.offset + t.relative_deadline(),
                    remaining_exec_time: exec,
                    has_started: false,
                }
            })
            .collect();

        let traces = vec![TaskTrace::default(); tasks.len()];
        let events = EventContainer::new(policy.label());
        Ok(Self {
            tasks,
            jobs,
            tick: 0,
            events,
            policy,
            variation,
            options,
            traces,
        })
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// The frozen task set, with the priorities the policy assigned.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn events(&self) -> &EventContainer {
        &self.events
    }

    pub fn traces(&self) -> &[TaskTrace] {
        &self.traces
    }

    /// Move to the next scheduling point, appending at most one event.
    ///
    /// If the chosen job is not released yet the call covers the idle gap up
    /// to its release and returns. Otherwise the job runs either until the
    /// earliest disturbing release (suspend) or to its natural finish.
    /// Execution never crosses the absolute deadline: an overrunning job is
    /// cut off and retired at the deadline, and a job whose deadline expired
    /// while it waited is abandoned without running again. Completion
    /// retires the job and materializes its successor.
    pub fn advance(&mut self) -> Result<(), SimError> {
        if self.jobs.is_empty() {
            return Err(SimError::EmptyTaskSet);
        }
        let idx = self.policy.next_job(&self.tasks, &self.jobs, self.tick);

        if self.jobs[idx].release_time > self.tick {
            let release = self.jobs[idx].release_time;
            if self.options.gen_idle_time_events {
                self.events.push(SchedulerIntervalEvent {
                    begin: self.tick,
                    end: release,
                    task_id: IDLE_TASK_ID,
                    job_release: self.tick,
                    begin_state: BeginState::Start,
                    end_state: EndState::End,
                    note: None,
                });
            }
            self.tick = release;
            return Ok(());
        }

        let begin = self.tick;
        let release = self.jobs[idx].release_time;
        let deadline = self.jobs[idx].absolute_deadline;
        let natural_finish = begin + self.jobs[idx].remaining_exec_time;

        // A job whose deadline expired while it waited for the processor
        // gets no further time: record the miss and abandon the job without
        // emitting an interval.
        if deadline <= begin {
            self.deadline_miss(idx, deadline, natural_finish)?;
            self.jobs[idx].remaining_exec_time = 0;
            self.materialize_next_job(idx);
            return Ok(());
        }

        let begin_state = if self.jobs[idx].has_started {
            BeginState::Resume
        } else {
            BeginState::Start
        };

        match self.policy.preempting_tick(&self.tasks, &self.jobs, idx, begin) {
            // A preemption that is not in the future is a broken policy.
            Some(preempt_at) if preempt_at <= begin => {
                return Err(SimError::PreemptionNotInFuture {
                    task: self.tasks[idx].id,
                    at: preempt_at,
                    tick: begin,
                });
            }
            // Suspend only while the slice ends before the deadline. A
            // preemption at or past the deadline never happens: the deadline
            // cuts the job off first, on the completion path below.
            Some(preempt_at) if preempt_at < deadline => {
                debug!(task = self.tasks[idx].id, at = preempt_at, "preempted");
                self.events.push(SchedulerIntervalEvent {
                    begin,
                    end: preempt_at,
                    task_id: self.tasks[idx].id,
                    job_release: release,
                    begin_state,
                    end_state: EndState::Suspend,
                    note: None,
                });
                let job = &mut self.jobs[idx];
                job.remaining_exec_time -= preempt_at - begin;
                job.has_started = true;
                self.policy.on_run_executed(&self.tasks[idx], begin, preempt_at);
                self.tick = preempt_at;
                return Ok(());
            }
            _ => {}
        }

        // Runs undisturbed: to completion, or to the deadline if it cannot
        // make it.
        let mut end = natural_finish;
        let mut end_state = EndState::End;
        let mut note = None;
        if natural_finish > deadline {
            self.deadline_miss(idx, deadline, natural_finish)?;
            end = deadline;
            end_state = EndState::EndDeadlineMissed;
            note = Some(format!(
                "missed deadline {deadline} (finish would be {natural_finish})"
            ));
        } else if self.options.trace_enabled {
            let trace = &mut self.traces[idx];
            trace.in_miss_streak = false;
            trace.current_streak = 0;
        }

        self.events.push(SchedulerIntervalEvent {
            begin,
            end,
            task_id: self.tasks[idx].id,
            job_release: release,
            begin_state,
            end_state,
            note,
        });
        {
            let job = &mut self.jobs[idx];
            job.has_started = true;
            job.remaining_exec_time = 0;
        }
        self.policy.on_run_executed(&self.tasks[idx], begin, end);
        self.materialize_next_job(idx);
        self.tick = end;
        Ok(())
    }

    /// Simulate up to `tick_limit` and cut the trace off there.
    pub fn run_sim(&mut self, tick_limit: Tick) -> Result<(), SimError> {
        if self.jobs.is_empty() {
            return Ok(());
        }
        while self.tick < tick_limit {
            self.advance()?;
        }
        self.events.trim_to(tick_limit);
        Ok(())
    }

    /// Simulate for `duration` ticks after a warm-up of `offset` ticks, then
    /// discard the warm-up prefix from the trace.
    pub fn run_sim_with_offset(&mut self, offset: Tick, duration: Tick) -> Result<(), SimError> {
        self.run_sim(offset + duration)?;
        self.events.trim_before(offset);
        Ok(())
    }

    /// Cut the trace off at the current clock. For hosts that stop calling
    /// `advance` before a limit is reached.
    pub fn conclude(&mut self) {
        self.events.trim_to(self.tick);
    }

    /// Overrun bookkeeping: fatal in assert mode, otherwise a warning plus
    /// the per-task miss counters.
    fn deadline_miss(&mut self, idx: usize, deadline: Tick, finish: Tick) -> Result<(), SimError> {
        if self.options.assert_on_deadline_miss {
            return Err(SimError::DeadlineMiss {
                task: self.tasks[idx].id,
                deadline,
                finish,
            });
        }
        warn!(task = self.tasks[idx].id, deadline, finish, "deadline miss");
        if self.options.trace_enabled {
            let trace = &mut self.traces[idx];
            trace.deadline_misses += 1;
            if trace.in_miss_streak {
                trace.current_streak += 1;
                trace.max_streak = trace.max_streak.max(trace.current_streak);
            }
            trace.in_miss_streak = true;
        }
        self.policy
            .on_deadline_missed(&self.tasks[idx], deadline, finish);
        Ok(())
    }

    /// Replace the retired job of task `idx` with the next release.
    fn materialize_next_job(&mut self, idx: usize) {
        let task = &self.tasks[idx];
        let inter_arrival = if task.sporadic && self.options.run_time_variation {
            self.variation.inter_arrival(task)
        } else {
            task.period
        };
        let exec = if self.options.run_time_variation {
            self.variation.execution_time(task)
        } else {
            task.wcet
        };
        let release = self.jobs[idx].release_time + inter_arrival;
        self.jobs[idx] = Job {
            task: idx,
            release_time: release,
            absolute_deadline: release + task.relative_deadline(),
            remaining_exec_time: exec,
            has_started: false,
        };
        if self.options.trace_enabled {
            self.traces[idx].inter_arrivals.push(inter_arrival);
        }
    }
}
