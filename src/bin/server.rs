use std::path::{Path, PathBuf};
use std::sync::Arc;

use funding::constants::POLICY_FILE_PATH;
use funding::env_config;
use funding::problem::ProblemSpec;
use funding::server::create_router;
use funding::storage::{file_exists, load_policy_table};
use funding::FundingSolver;
use tracing::{error, info, warn};

fn parse_args() -> (PathBuf, PathBuf) {
    let args: Vec<String> = std::env::args().collect();
    let mut problem = None;
    let mut table = PathBuf::from(POLICY_FILE_PATH);
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--table" => {
                i += 1;
                match args.get(i) {
                    Some(path) => table = PathBuf::from(path),
                    None => {
                        eprintln!("--table requires a path");
                        std::process::exit(1);
                    }
                }
            }
            "--help" | "-h" => {
                println!("Usage: funding-server <problem.json> [--table PATH]");
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
    match problem {
        Some(p) => (p, table),
        None => {
            eprintln!("Usage: funding-server <problem.json> [--table PATH]");
            std::process::exit(1);
        }
    }
}

fn build_solver(problem_path: &Path, table_path: &Path) -> funding::Result<FundingSolver> {
    let problem = ProblemSpec::load(problem_path)?;

    if file_exists(table_path) {
        match load_policy_table(table_path)
            .and_then(|table| FundingSolver::with_table(problem.clone(), table))
        {
            Ok(solver) => return Ok(solver),
            Err(e) => warn!("Ignoring stored policy table: {}", e),
        }
    } else {
        info!("No precomputed table found, computing (run funding-precompute to avoid this)...");
    }

    let mut solver = FundingSolver::new(problem)?;
    solver.run_offline_computation()?;
    Ok(solver)
}

#[tokio::main]
async fn main() {
    env_config::init_tracing();
    let _base = env_config::init_base_path();
    let port = env_config::server_port();
    let (problem_path, table_path) = parse_args();
    env_config::init_rayon_threads();

    info!("Starting funding policy server...");
    let solver = match build_solver(&problem_path, &table_path) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let app = create_router(Arc::new(solver));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };
    info!("Server is running on port {}. Press Ctrl+C to stop.", port);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Stopping server...");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}
