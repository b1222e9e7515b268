// Per-release execution-time and inter-arrival variation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use task_model::{Task, Tick};

/// Supplies the execution demand and sporadic release gap for each job the
/// simulator materializes. Consulted exactly once per new job, so a seeded
/// implementation makes whole runs reproducible.
pub trait Variation {
    /// Execution demand of one release. Positive and at most `task.wcet`.
    fn execution_time(&mut self, task: &Task) -> Tick;

    /// Separation to the next release of a sporadic task. At least
    /// `task.period`, which is the minimum separation.
    fn inter_arrival(&mut self, task: &Task) -> Tick;
}

/// Worst-case behavior: every release demands the full WCET and sporadic
/// gaps collapse to the minimum separation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariation;

impl Variation for NoVariation {
    fn execution_time(&mut self, task: &Task) -> Tick {
        task.wcet
    }

    fn inter_arrival(&mut self, task: &Task) -> Tick {
        task.period
    }
}

/// Seeded random variation: execution demand uniform in `[1, wcet]`, sporadic
/// gaps get an exponential tail on top of the minimum separation.
#[derive(Debug, Clone)]
pub struct RandomVariation {
    rng: StdRng,
    tail: Exp<f64>,
}

impl RandomVariation {
    /// Mean of the exponential tail, as a fraction of the task period.
    const TAIL_SCALE: f64 = 0.5;

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tail: Exp::new(1.0).expect("rate is positive"),
        }
    }
}

impl Variation for RandomVariation {
    fn execution_time(&mut self, task: &Task) -> Tick {
        self.rng.random_range(1..=task.wcet)
    }

    fn inter_arrival(&mut self, task: &Task) -> Tick {
        let tail = self.tail.sample(&mut self.rng) * Self::TAIL_SCALE * task.period as f64;
        task.period + tail.round() as Tick
    }
}
