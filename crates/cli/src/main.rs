//! RAG skills CLI — the main entry point.
//!
//! Commands:
//! - `fit`     — Fit a JSON list of chunks into a token budget
//! - `budget`  — Show the context budget left by a prompt template
//! - `config`  — Show or validate the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragskills",
    about = "RAG skills — context fitting and prompt budgeting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.ragskills/config.toml)
    #[arg(short, long, global = true, env = "RAGSKILLS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit chunks from a JSON file into a token budget
    Fit {
        /// The user query the context is for
        #[arg(short, long)]
        query: String,

        /// Token budget for the combined context
        #[arg(short, long)]
        budget: usize,

        /// JSON file with an array of chunks ("-" reads stdin)
        #[arg(long)]
        chunks: PathBuf,

        /// What to do on overflow (no summarizer is available here)
        #[arg(long, value_enum)]
        fallback: Option<FallbackArg>,
    },

    /// Show how many tokens a template leaves for context
    Budget {
        /// Which built-in template to measure
        #[arg(long, value_enum, default_value_t = TemplateArg::Qa)]
        template: TemplateArg,

        /// The question the template will be filled with
        #[arg(long, default_value = "")]
        question: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Load and validate the configuration
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackArg {
    Truncate,
    Propagate,
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateArg {
    Qa,
    Condense,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fit {
            query,
            budget,
            chunks,
            fallback,
        } => {
            let policy = fallback.map(|f| match f {
                FallbackArg::Truncate => ragskills::FallbackPolicy::Truncate,
                FallbackArg::Propagate => ragskills::FallbackPolicy::Propagate,
            });
            commands::fit::run(&config, &query, budget, &chunks, policy).await?
        }
        Commands::Budget { template, question } => {
            let template = match template {
                TemplateArg::Qa => ragskills::prompt::qa_template(),
                TemplateArg::Condense => ragskills::prompt::condense_question_template(),
            };
            commands::budget::run(&config, &template, &question)?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config),
            ConfigAction::Validate => commands::config_cmd::validate(&config),
        },
    }

    Ok(())
}
