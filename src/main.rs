mod cli;

use std::path::PathBuf;

use clap::Parser;
use cli::{Args, Command};
use rpc_reconciler::{Fragment, Reconciler, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "rpc_reconciler=trace" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fold_files(files: &[PathBuf]) -> Result<Reconciler> {
    let mut reconciler = Reconciler::new();
    for path in files {
        let fragment = Fragment::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), "folding fragment file");
        reconciler.absorb(fragment)?;
    }
    Ok(reconciler)
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Fold { files, compact, output } => {
            let rendered = fold_files(&files)
                .and_then(|r| r.snapshot())
                .and_then(|view| view.to_json(!compact));
            match rendered {
                Ok(json) => match output {
                    Some(path) => {
                        if let Err(e) = std::fs::write(&path, json) {
                            eprintln!("Error writing {}: {}", path.display(), e);
                            std::process::exit(1);
                        }
                    }
                    None => println!("{}", json),
                },
                Err(e) => {
                    eprintln!("Error folding fragments: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Check { files } => match fold_files(&files) {
            Ok(reconciler) => {
                let graph = reconciler.graph();
                println!(
                    "OK: {} transactions across {} blocks reconciled",
                    graph.canonical_transactions().count(),
                    graph.canonical_blocks().count()
                );
            }
            Err(e) => {
                eprintln!("Fragments do not reconcile: {}", e);
                std::process::exit(1);
            }
        },
    }
}
