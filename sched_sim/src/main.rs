// src/main.rs
mod config;

use anyhow::{Context, Result};
use sched_sim::scheduler::{FixedPriorityRm, Simulator};
use sched_sim::variation::{NoVariation, RandomVariation, Variation};
use sched_sim::{logging, report, taskgen};
use task_model::TaskSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // -------- logging ----------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sched_sim=info".parse().unwrap())
                .add_directive("task_model=info".parse().unwrap()),
        )
        .compact()
        .init();

    // -------- config + task set ----------
    let cfg = config::Cli::parse_and_build_config()?;
    info!(?cfg, "schedule simulator starting");

    let task_set = match &cfg.taskset {
        Some(path) => TaskSet::load(path)
            .with_context(|| format!("loading task set from {}", path.display()))?,
        None => {
            let params = taskgen::GenParams {
                tasks: cfg.gen_tasks,
                utilization: cfg.utilization,
                sporadic_fraction: cfg.sporadic_fraction,
            };
            let set = taskgen::generate(&params, cfg.seed);
            info!(
                tasks = set.len(),
                utilization = format_args!("{:.3}", set.utilization()),
                "generated task set"
            );
            set
        }
    };
    if let Some(path) = &cfg.save_taskset {
        task_set.save(path)?;
        info!(path = %path.display(), "task set saved");
    }

    // 0 means one hyper-period.
    let duration = if cfg.duration == 0 {
        task_set.hyper_period()
    } else {
        cfg.duration
    };

    // -------- simulate ----------
    let variation: Box<dyn Variation> = if cfg.options.run_time_variation {
        Box::new(RandomVariation::seeded(cfg.seed))
    } else {
        Box::new(NoVariation)
    };
    let mut sim = Simulator::new(
        task_set,
        Box::new(FixedPriorityRm),
        variation,
        cfg.options.clone(),
    )?;
    let outcome = if cfg.offset > 0 {
        sim.run_sim_with_offset(cfg.offset, duration)
    } else {
        sim.run_sim(duration)
    };
    outcome.context("simulation failed")?;

    // -------- reports ----------
    let summary = report::summarize(sim.events(), sim.tasks(), sim.traces());
    logging::csv::write_events(&cfg.out_dir.join("events.csv"), sim.events())?;
    logging::csv::write_task_reports(&cfg.out_dir.join("tasks.csv"), &summary.tasks)?;
    logging::csv::write_summary(&cfg.out_dir.join("summary.json"), &summary)?;

    info!(
        run_id = %summary.run_id,
        events = sim.events().len(),
        final_tick = summary.final_tick,
        misses = summary.total_misses,
        out = %cfg.out_dir.display(),
        "simulation finished"
    );
    Ok(())
}
