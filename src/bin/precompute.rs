use std::path::PathBuf;

use funding::constants::POLICY_FILE_PATH;
use funding::env_config;
use funding::problem::ProblemSpec;
use funding::storage::save_policy_table;
use funding::FundingSolver;
use tracing::{error, info};

struct Args {
    problem: PathBuf,
    output: PathBuf,
    save: bool,
}

fn print_usage() {
    println!("Usage: funding-precompute <problem.json> [--output PATH] [--no-save]");
    println!();
    println!("Options:");
    println!("  --output PATH  Policy table destination (default: {})", POLICY_FILE_PATH);
    println!("  --no-save      Compute and print the policy without writing it");
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut problem = None;
    let mut output = PathBuf::from(POLICY_FILE_PATH);
    let mut save = true;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output" => {
                i += 1;
                match args.get(i) {
                    Some(path) => output = PathBuf::from(path),
                    None => {
                        eprintln!("--output requires a path");
                        std::process::exit(1);
                    }
                }
            }
            "--no-save" => save = false,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
            other => problem = Some(PathBuf::from(other)),
        }
        i += 1;
    }
    let problem = problem.unwrap_or_else(|| {
        print_usage();
        std::process::exit(1);
    });
    Args {
        problem,
        output,
        save,
    }
}

fn run(args: &Args) -> funding::Result<()> {
    let problem = ProblemSpec::load(&args.problem)?;
    let mut solver = FundingSolver::new(problem)?;
    let table = solver.run_offline_computation()?;

    let horizon = table.horizon();
    println!("Policy with {} fortnights left:", horizon);
    println!("  funding      | action       | expected value");
    for (state, entry) in table.iter_round(horizon) {
        let action = entry
            .action
            .as_ref()
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        println!("  {:<12} | {:<12} | {:10.4}", state.to_string(), action, entry.value);
    }

    if args.save {
        save_policy_table(table, &args.output)?;
    }
    Ok(())
}

fn main() {
    env_config::init_tracing();
    let _base = env_config::init_base_path();
    let args = parse_args();
    env_config::init_rayon_threads();

    info!(problem = %args.problem.display(), "funding precomputation");
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Precomputation complete.");
}
