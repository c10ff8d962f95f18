//! # pulm CLI
//!
//! Command-line interface for converting pulm notes between their stored
//! block lists and the editor's document tree.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pulm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (pulm.yml in the current directory if present)
    #[arg(long, env = "PULM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the document tree for a note
    Open {
        /// Note JSON file
        note: PathBuf,

        /// All notes (JSON array), used to flag mentions of missing notes
        #[arg(long)]
        notes: Option<PathBuf>,

        /// Emit the tree and diagnostics as one JSON object
        #[arg(long)]
        json: bool,
    },

    /// Store an edited document tree back into a note
    Save {
        /// Note JSON file
        note: PathBuf,

        /// Document tree JSON file
        doc: PathBuf,

        /// Write the updated note here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the tree with newly assigned block ids here
        #[arg(long)]
        doc_out: Option<PathBuf>,
    },

    /// Check that every note converts to a tree and back without loss
    Verify {
        /// Notes JSON file (array of notes)
        notes: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create an empty note
    New {
        /// Note title
        #[arg(long)]
        title: String,

        /// Category id
        #[arg(long)]
        category: String,
    },

    /// List block changes between two versions of a note
    Diff {
        /// Earlier note or block list
        before: PathBuf,

        /// Later note or block list
        after: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Open { note, notes, json } => {
            commands::open_note(&config, &note, notes.as_deref(), json)
        }
        Commands::Save {
            note,
            doc,
            out,
            doc_out,
        } => commands::save_note(&config, &note, &doc, out.as_deref(), doc_out.as_deref()),
        Commands::Verify { notes, json } => commands::verify_notes(&config, &notes, json),
        Commands::New { title, category } => commands::new_note(&title, &category),
        Commands::Diff {
            before,
            after,
            json,
        } => commands::diff_notes(&config, &before, &after, json),
    }
}
