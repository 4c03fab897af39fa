use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use shiftforge::config::Config;
use shiftforge::model::Problem;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with search and scoring knobs; command-line flags override it.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Assign(cmd::assign::AssignArgs),
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let (problem_path, cli_config, sub_name) = match &cli.command {
        Commands::Assign(args) => (&args.problem, &args.config, "assign"),
        Commands::Validate(args) => (&args.problem, &args.config, "validate"),
    };
    let Some(sub_matches) = matches.subcommand_matches(sub_name) else {
        error!("Missing arguments for '{}'", sub_name);
        process::exit(2);
    };

    // File config is the base, explicit flags win
    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            file_config.merge_from_cli(cli_config, sub_matches);
            file_config
        }
        None => cli_config.clone(),
    };

    info!("Loading problem: {}", problem_path);
    let problem = Problem::load_from_file(problem_path).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });

    let outcome = match &cli.command {
        Commands::Assign(args) => cmd::assign::run(args, &problem, config),
        Commands::Validate(_) => cmd::validate::run(&problem, config),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        process::exit(1);
    }
}
