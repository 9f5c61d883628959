use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dragonfly::cli::{handle_serve, handle_stats, ServeArgs};
use dragonfly::server::init_logging;

#[derive(Parser)]
#[command(name = "dragonfly")]
#[command(about = "Dragonfly - named entity annotation for local corpora", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate the documents of a data directory
    Annotate {
        #[command(flatten)]
        serve: ServeArgs,

        /// Output directory (defaults to <data>/annotations)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Adjudicate between two or more annotators
    Adjudicate {
        #[command(flatten)]
        serve: ServeArgs,

        /// Annotation directories of the individual annotators
        #[arg(required = true)]
        annotations: Vec<PathBuf>,

        /// Output directory for the adjudicated annotations
        #[arg(short, long, required = true)]
        output: PathBuf,
    },

    /// Print statistics for a directory of saved annotations
    Stats {
        /// Annotation directory
        input: PathBuf,

        /// List every entity by type
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Annotate { serve, output } => {
            init_logging(serve.debug);
            handle_serve(serve.into_options(output, None)).await
        }
        Commands::Adjudicate {
            serve,
            annotations,
            output,
        } => {
            init_logging(serve.debug);
            handle_serve(serve.into_options(Some(output), Some(annotations))).await
        }
        Commands::Stats { input, verbose } => {
            init_logging(false);
            handle_stats(&input, verbose)
        }
    }
}
