mod coordinator;
mod registry;

use clap::{Parser, Subcommand};
use codegraph_core::{CodeGraphError, RunMode};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Builds and queries a code knowledge graph for a repository.
#[derive(Parser)]
#[command(name = "codegraph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, resolve, and persist the knowledge graph for a repository.
    Analyze {
        /// Repository path. Defaults to the nearest version-control root
        /// above the current directory.
        path: Option<PathBuf>,
        /// Rebuild from scratch even if the current commit matches the last
        /// indexed one.
        #[arg(long)]
        force: bool,
        /// Skip the embedding pass entirely.
        #[arg(long)]
        skip_embeddings: bool,
    },
    /// Show this repository's own indexed state.
    Status {
        path: Option<PathBuf>,
    },
    /// List every repository indexed in the global registry.
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { path, force, skip_embeddings } => run_analyze(path, force, skip_embeddings).await,
        Commands::Status { path } => run_status(path),
        Commands::List => run_list(),
    }
}

async fn run_analyze(path: Option<PathBuf>, force: bool, skip_embeddings: bool) -> ExitCode {
    let start = path.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let repo_root = match coordinator::discover_repo_root(&start) {
        Some(root) => root,
        None => {
            eprintln!("{} {} is not inside a version-control repository", "error:".red().bold(), start.display());
            return ExitCode::from(1);
        }
    };

    match coordinator::run_analyze(&repo_root, force, skip_embeddings).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            let mut reg = registry::load();
            registry::upsert(&mut reg, outcome.meta);
            if let Err(e) = registry::save(&reg) {
                eprintln!("{} failed to update registry: {e}", "warning:".yellow().bold());
            }
            ExitCode::SUCCESS
        }
        Err(CodeGraphError::NotARepository(path)) => {
            eprintln!("{} not a version-control repository: {path}", "error:".red().bold());
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("{} {e}", "fatal:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn print_outcome(outcome: &coordinator::RunOutcome) {
    match outcome.mode {
        RunMode::AlreadyUpToDate => println!("{} {}", "up to date".green().bold(), outcome.reason),
        RunMode::Full => println!("{} {}", "full rebuild".cyan().bold(), outcome.reason),
        RunMode::Incremental => println!("{} {}", "incremental".cyan().bold(), outcome.reason),
    }
    println!(
        "  files={} nodes={} edges={} communities={} processes={}",
        outcome.stats.files, outcome.stats.nodes, outcome.stats.edges, outcome.stats.communities, outcome.stats.processes
    );
    if !outcome.warnings.is_empty() {
        println!("{} {} warning(s):", "warning:".yellow().bold(), outcome.warnings.len());
        for warning in outcome.warnings.iter().take(20) {
            println!("  - {warning}");
        }
        if outcome.warnings.len() > 20 {
            println!("  ... and {} more", outcome.warnings.len() - 20);
        }
    }
}

fn run_status(path: Option<PathBuf>) -> ExitCode {
    let start = path.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let repo_root = match coordinator::discover_repo_root(&start) {
        Some(root) => root,
        None => {
            eprintln!("{} {} is not inside a version-control repository", "error:".red().bold(), start.display());
            return ExitCode::from(1);
        }
    };

    let gitnexus_dir = codegraph_core::EngineConfig::gitnexus_dir(&repo_root);
    match codegraph_graph::load_metadata(&gitnexus_dir) {
        Some(meta) => {
            println!("{}", meta.repo_path.bold());
            println!("  last indexed: {} (commit {})", meta.indexed_at, &meta.last_commit[..meta.last_commit.len().min(12)]);
            println!(
                "  files={} nodes={} edges={} communities={} processes={}",
                meta.stats.files, meta.stats.nodes, meta.stats.edges, meta.stats.communities, meta.stats.processes
            );
            ExitCode::SUCCESS
        }
        None => {
            println!("{} has not been indexed yet", repo_root.display());
            ExitCode::SUCCESS
        }
    }
}

fn run_list() -> ExitCode {
    let reg = registry::load();
    if reg.repositories.is_empty() {
        println!("no repositories indexed yet");
        return ExitCode::SUCCESS;
    }
    for entry in &reg.repositories {
        println!(
            "{}  commit={}  files={} nodes={} edges={}",
            entry.repo_path.bold(),
            &entry.last_commit[..entry.last_commit.len().min(12)],
            entry.stats.files,
            entry.stats.nodes,
            entry.stats.edges,
        );
    }
    ExitCode::SUCCESS
}
