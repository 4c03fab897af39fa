use crate::reports;
use clap::Args;
use shiftforge::api::AssignmentSession;
use shiftforge::config::Config;
use shiftforge::error::SfResult;
use shiftforge::model::Problem;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short, long)]
    pub problem: String,
}

/// Builds the graph and the baseline without running the evolutionary stage.
pub fn run(problem: &Problem, config: Config) -> SfResult<()> {
    let session = AssignmentSession::new(problem, config)?;
    reports::print_candidate_summary(&session.graph);

    let (baseline, fitness) = session.baseline()?;
    println!(
        "Baseline: {}/{} entities assigned",
        session.graph.assigned_count(&baseline),
        session.graph.real_entities
    );
    println!("Fitness: {:.6}", fitness);
    Ok(())
}
