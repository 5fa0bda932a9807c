//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};
use commands::{init, models, ocr, projects, serve, stats, texts};

#[derive(Parser)]
#[command(name = "scrivener")]
#[command(about = "Handwriting OCR, storage and semantic retrieval")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the database and config file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Extract text from an image and store it
    Ocr {
        /// Image file to read
        image: PathBuf,
        /// Provider family: openai, gemini or ollama
        #[arg(short, long)]
        provider: Option<String>,
        /// Model override for the chosen provider
        #[arg(short, long)]
        model: Option<String>,
        /// Project ID or name to file the text under
        #[arg(long)]
        project: Option<String>,
        /// Print the text without saving it
        #[arg(long)]
        no_save: bool,
    },

    /// List stored texts, newest first
    Ls {
        /// Project ID or name
        #[arg(long)]
        project: Option<String>,
    },

    /// Case-insensitive substring search over stored texts
    Search {
        query: String,
        /// Project ID or name
        #[arg(long)]
        project: Option<String>,
    },

    /// Rank stored texts by semantic similarity to a query
    Similar {
        query: String,
        /// Project ID or name
        #[arg(long)]
        project: Option<String>,
        /// Embed the query with this provider's backend (ollama = local)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Summarize a stored text, inline text, or a whole collection
    Summarize {
        /// Stored text ID
        #[arg(long, conflicts_with_all = ["text", "all"])]
        id: Option<i32>,
        /// Inline text to summarize
        #[arg(long)]
        text: Option<String>,
        /// Summarize every stored text (scoped by --project)
        #[arg(long)]
        all: bool,
        /// Project ID or name
        #[arg(long)]
        project: Option<String>,
        /// Provider family: openai, gemini or ollama
        #[arg(short, long)]
        provider: Option<String>,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
        /// short, medium or long
        #[arg(short, long)]
        length: Option<String>,
        /// bullets or plain
        #[arg(short, long)]
        format: Option<String>,
        /// Extra guidance appended to the prompt
        #[arg(short, long)]
        instructions: Option<String>,
    },

    /// Show collection statistics
    Stats {
        /// Project ID or name
        #[arg(long)]
        project: Option<String>,
    },

    /// List local Ollama models
    Models {
        /// Only models currently loaded in memory
        #[arg(long)]
        running: bool,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a project
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List projects with their text counts
    List,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let settings = load_settings(&options)?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Ocr {
            image,
            provider,
            model,
            project,
            no_save,
        } => {
            ocr::cmd_ocr(
                &settings,
                &image,
                provider,
                model,
                project.as_deref(),
                !no_save,
            )
            .await
        }
        Commands::Ls { project } => texts::cmd_list(&settings, project.as_deref()).await,
        Commands::Search { query, project } => {
            texts::cmd_search(&settings, &query, project.as_deref()).await
        }
        Commands::Similar {
            query,
            project,
            provider,
        } => texts::cmd_similar(&settings, &query, project.as_deref(), provider.as_deref()).await,
        Commands::Summarize {
            id,
            text,
            all,
            project,
            provider,
            model,
            length,
            format,
            instructions,
        } => {
            let request = crate::services::SummarizeRequest {
                text_id: id,
                text,
                provider,
                model,
                summary_length: length,
                format,
                instructions,
                project_id: None,
                summarize_all: all,
            };
            texts::cmd_summarize(&settings, request, project.as_deref()).await
        }
        Commands::Stats { project } => stats::cmd_stats(&settings, project.as_deref()).await,
        Commands::Models { running } => models::cmd_models(&settings, running).await,
        Commands::Project { command } => match command {
            ProjectCommands::Create { name, description } => {
                projects::cmd_project_create(&settings, &name, description.as_deref()).await
            }
            ProjectCommands::List => projects::cmd_project_list(&settings).await,
        },
    }
}
