use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Fold partial node RPC fragments into one consistent view")]
pub struct Args {
    /// Log merge decisions (RUST_LOG takes precedence)
    #[clap(long, short, global = true)]
    pub verbose: bool,

    /// Command to execute (fold or check)
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge fragment documents and print the reconciled view
    Fold {
        /// JSON fragment files, folded in the order given
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Print single-line JSON instead of pretty output
        #[clap(long)]
        compact: bool,

        /// Write the reconciled view to a file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Verify that fragment documents reconcile without conflicts
    Check {
        /// JSON fragment files, folded in the order given
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
}
