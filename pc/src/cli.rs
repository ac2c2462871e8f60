//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// PostCraft - social media post drafting
#[derive(Parser)]
#[command(
    name = "postcraft",
    about = "Draft a social media post from an idea, refine it, and adapt it per platform",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to the interactive session)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive drafting session
    Repl {
        /// Topic to generate the first draft from
        topic: Option<String>,
    },

    /// Generate a post from a topic and print it (batch mode)
    Generate {
        /// What the post should be about
        topic: String,

        /// Also format the post for this platform (repeatable)
        #[arg(short, long = "platform", value_name = "PLATFORM")]
        platforms: Vec<String>,

        /// Write the resulting session as JSON to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List the platforms posts can be adapted for
    Platforms {
        /// Ask the service for its catalogue instead of using the config
        #[arg(long)]
        remote: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = get_log_dir().join("postcraft.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Get the log directory
pub fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postcraft")
        .join("logs")
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Config is read from --config, ./.postcraft.yml, or ");
    match dirs::config_dir() {
        Some(dir) => help.push_str(&format!("{}\n", dir.join("postcraft").join("postcraft.yml").display())),
        None => help.push_str("the user config directory\n"),
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    help
}

/// Output format for listings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
