use crate::reports;
use clap::Args;
use shiftforge::api::AssignmentSession;
use shiftforge::config::Config;
use shiftforge::error::SfResult;
use shiftforge::model::Problem;
use shiftforge::optimizer::ProgressCallback;
use shiftforge::report;
use std::fs::File;
use std::io::BufWriter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short, long)]
    pub problem: String,

    /// Tab-separated dump of every candidate edge.
    #[arg(long)]
    pub candidates_out: Option<String>,

    /// Tab-separated dump of the final assignment.
    #[arg(long)]
    pub assignments_out: Option<String>,
}

/// Logs a generation summary at most once per second.
struct ConsoleProgress {
    start: Instant,
    last_report_ms: AtomicU64,
}

impl ConsoleProgress {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            last_report_ms: AtomicU64::new(0),
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, generation: usize, best: f64, mean: f64) -> bool {
        let now = self.start.elapsed().as_millis() as u64;
        let last = self.last_report_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) >= 1000 {
            self.last_report_ms.store(now, Ordering::Relaxed);
            info!(
                "Gen {:>5} | best {:.5} | mean {:.5}",
                generation, best, mean
            );
        }
        true
    }
}

pub fn run(args: &AssignArgs, problem: &Problem, config: Config) -> SfResult<()> {
    let session = AssignmentSession::new(problem, config)?;

    if let Some(path) = &args.candidates_out {
        let file = BufWriter::new(File::create(path)?);
        report::write_candidate_table(file, &session.graph)?;
        info!("Candidate table written to {}", path);
    }

    let result = session.run(&ConsoleProgress::new())?;

    reports::print_assignment_report(&session.graph, &result);
    reports::print_summary(&result);

    if let Some(path) = &args.assignments_out {
        let file = BufWriter::new(File::create(path)?);
        report::write_assignment_table(
            file,
            &session.graph,
            problem,
            &result.matching,
            &result.evaluation,
        )?;
        info!("Assignment table written to {}", path);
    }

    println!("Fitness: {:.6}", result.fitness);
    Ok(())
}
