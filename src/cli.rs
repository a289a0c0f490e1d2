use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "taleforge",
    about = "Multi-agent story and character card generator",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/taleforge/logs/taleforge.log\n\nOpenRouter access requires the OPENROUTER_API_KEY environment variable;\nthe --local flag targets a local OpenAI-compatible server instead."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to taleforge.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress progress banners")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a story, have it critiqued, and revise it
    Story {
        /// Scenario to build the story around (prompted for when omitted)
        scenario: Option<String>,

        /// Use the local model server instead of OpenRouter
        #[arg(long)]
        local: bool,
    },

    /// Generate a TavernAI character card from a free-form description
    Card {
        /// Character description (prompted for when omitted)
        description: Option<String>,

        /// Use the local model server instead of OpenRouter
        #[arg(long)]
        local: bool,

        /// Directory to write the card file into (defaults to config output_dir)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format for the card dump
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Diagnose setup issues
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
