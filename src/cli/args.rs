//! Command-line argument parsing
//!
//! Demo entry points for the engine: build indices, ask a question over the
//! document corpus, or run the multi-source search agent.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docscout - agentic document indexing, retrieval and search
#[derive(Parser, Debug)]
#[command(name = "docscout")]
#[command(version)]
#[command(about = "Agentic document indexing, index-guided retrieval and multi-source search", long_about = None)]
pub struct Args {
    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gateway base URL
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Documents directory
    #[arg(long)]
    pub documents_dir: Option<PathBuf>,

    /// Indices directory
    #[arg(long)]
    pub indices_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose progress output
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index one document, or every document under the documents directory
    Index {
        /// Path of a single document to index (omit to index the whole directory)
        path: Option<PathBuf>,

        /// Overwrite existing indices
        #[arg(long)]
        reindex: bool,
    },

    /// Answer a question over the indexed corpus (index-guided retrieval,
    /// judge fallback when no indices exist)
    Ask {
        /// Natural-language question
        query: String,
    },

    /// Run the multi-source search agent over the document filesystem
    Search {
        /// Natural-language search request
        query: String,
    },

    /// Display the resolved configuration
    Config,
}
