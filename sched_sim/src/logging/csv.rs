use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::events::EventContainer;
use crate::report::{RunSummary, TaskReport};

fn create(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// events.csv: begin,end,task,job_release,begin_state,end_state,note
pub fn write_events(path: &Path, events: &EventContainer) -> io::Result<()> {
    let mut w = create(path)?;
    w.write_all(b"begin,end,task,job_release,begin_state,end_state,note\n")?;
    for e in events.events() {
        let note = e.note.as_deref().unwrap_or("");
        writeln!(
            w,
            "{},{},{},{},{},{},{}",
            e.begin, e.end, e.task_id, e.job_release, e.begin_state, e.end_state, note
        )?;
    }
    w.flush()
}

/// tasks.csv: task,priority,jobs_finished,deadline_misses,max_miss_streak,preemptions,min_response,max_response,mean_response,worst_response_ratio
pub fn write_task_reports(path: &Path, reports: &[TaskReport]) -> io::Result<()> {
    let mut w = create(path)?;
    w.write_all(
        b"task,priority,jobs_finished,deadline_misses,max_miss_streak,preemptions,min_response,max_response,mean_response,worst_response_ratio\n",
    )?;
    for r in reports {
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{:.3},{:.3}",
            r.task_id,
            r.priority,
            r.jobs_finished,
            r.deadline_misses,
            r.max_miss_streak,
            r.preemptions,
            r.min_response,
            r.max_response,
            r.mean_response,
            r.worst_response_ratio
        )?;
    }
    w.flush()
}

/// summary.json: the whole run summary, pretty-printed.
pub fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let mut w = create(path)?;
    serde_json::to_writer_pretty(&mut w, summary).map_err(io::Error::other)?;
    w.write_all(b"\n")?;
    w.flush()
}
