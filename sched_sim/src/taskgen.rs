// Random task-set synthesis for experiments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use task_model::{Task, TaskId, TaskSet, Tick};

/// Periods are drawn from a harmonic-friendly set so hyper-periods stay small.
const PERIOD_CHOICES: [Tick; 8] = [10, 20, 40, 50, 80, 100, 200, 400];

#[derive(Debug, Clone)]
pub struct GenParams {
    pub tasks: usize,
    /// Target total utilization, split across tasks with UUniFast.
    pub utilization: f64,
    /// Probability that a generated task is sporadic.
    pub sporadic_fraction: f64,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            tasks: 5,
            utilization: 0.65,
            sporadic_fraction: 0.0,
        }
    }
}

/// Generate a task set with the requested total utilization. Deterministic
/// for a given seed.
pub fn generate(params: &GenParams, seed: u64) -> TaskSet {
    if params.tasks == 0 {
        return TaskSet::default();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let utilizations = uunifast(params.tasks, params.utilization, &mut rng);
    let tasks = utilizations
        .into_iter()
        .enumerate()
        .map(|(i, u)| {
            let period = PERIOD_CHOICES[rng.random_range(0..PERIOD_CHOICES.len())];
            let wcet = ((u * period as f64).round() as Tick).clamp(1, period);
            let mut task = Task::periodic(i as TaskId + 1, period, wcet);
            task.sporadic = rng.random_bool(params.sporadic_fraction.clamp(0.0, 1.0));
            task
        })
        .collect();
    TaskSet::new(tasks)
}

/// UUniFast: an unbiased split of `total` utilization over `n` tasks.
fn uunifast(n: usize, total: f64, rng: &mut StdRng) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    let mut sum = total;
    for remaining in (1..n).rev() {
        let next = sum * rng.random::<f64>().powf(1.0 / remaining as f64);
        out.push(sum - next);
        sum = next;
    }
    out.push(sum);
    out
}
