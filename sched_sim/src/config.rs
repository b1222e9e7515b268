// runtime configuration (task set, horizon, simulation options, outputs)
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use sched_sim::SimOptions;
use task_model::Tick;

#[derive(Debug, Clone)]
pub struct Config {
    pub taskset: Option<PathBuf>,
    pub gen_tasks: usize,
    pub utilization: f64,
    pub sporadic_fraction: f64,
    pub save_taskset: Option<PathBuf>,
    pub duration: Tick,
    pub offset: Tick,
    pub seed: u64,
    pub out_dir: PathBuf,
    pub options: SimOptions,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Tick-accurate simulator for preemptive fixed-priority task scheduling")]
pub struct Cli {
    /// Task-set file (.json or .toml). A random set is generated when omitted.
    #[arg(long)]                                   pub taskset: Option<PathBuf>,
    /// Number of tasks to generate when no task set is given.
    #[arg(long, default_value_t = 5)]              pub gen_tasks: usize,
    /// Target utilization of the generated set.
    #[arg(long, default_value_t = 0.65)]           pub utilization: f64,
    /// Fraction of generated tasks that are sporadic.
    #[arg(long, default_value_t = 0.0)]            pub sporadic_fraction: f64,
    /// Write the simulated task set to this file.
    #[arg(long)]                                   pub save_taskset: Option<PathBuf>,
    /// Simulated horizon in ticks; 0 means one hyper-period.
    #[arg(long, default_value_t = 0)]              pub duration: Tick,
    /// Warm-up ticks discarded from the front of the trace.
    #[arg(long, default_value_t = 0)]              pub offset: Tick,
    /// Seed for task generation and run-time variation.
    #[arg(long, default_value_t = 1)]              pub seed: u64,
    #[arg(long, default_value = "out")]            pub out_dir: PathBuf,
    /// Draw per-job execution times and sporadic gaps from the seeded RNG.
    #[arg(long, default_value_t = false)]          pub variation: bool,
    /// Leave idle gaps implicit instead of emitting idle events.
    #[arg(long, default_value_t = false)]          pub no_idle_events: bool,
    /// Abort the run on the first deadline miss.
    #[arg(long, default_value_t = false)]          pub assert_deadline_miss: bool,
    /// Skip per-task miss counters and inter-arrival history.
    #[arg(long, default_value_t = false)]          pub no_trace: bool,
}

impl Cli {
    pub fn parse_and_build_config() -> Result<Config> {
        let c = <Cli as Parser>::parse();
        Ok(Config {
            taskset: c.taskset,
            gen_tasks: c.gen_tasks,
            utilization: c.utilization,
            sporadic_fraction: c.sporadic_fraction,
            save_taskset: c.save_taskset,
            duration: c.duration,
            offset: c.offset,
            seed: c.seed,
            out_dir: c.out_dir,
            options: SimOptions {
                run_time_variation: c.variation,
                gen_idle_time_events: !c.no_idle_events,
                assert_on_deadline_miss: c.assert_deadline_miss,
                trace_enabled: !c.no_trace,
            },
        })
    }
}
