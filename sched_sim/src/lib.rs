// lib.rs — discrete-event simulator for preemptive priority-driven
// scheduling of hard real-time task sets on one processor.
//
// Time is an integer tick count. The simulator advances from scheduling
// point to scheduling point and records what ran in between; the resulting
// event trace is the sole output and feeds the report module.

pub mod errors;
pub mod events;
pub mod logging;
pub mod report;
pub mod scheduler;
pub mod taskgen;
pub mod variation;

pub use errors::SimError;
pub use events::{BeginState, EndState, EventContainer, SchedulerIntervalEvent};
pub use scheduler::{FixedPriorityRm, Job, SchedulingPolicy, SimOptions, Simulator, TaskTrace};
pub use variation::{NoVariation, RandomVariation, Variation};
