//! PostCraft - social media post drafting
//!
//! CLI entry point for the interactive session and batch commands.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use postcraft::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_dir};
use postcraft::client::{HttpFormatterClient, create_clients};
use postcraft::config::Config;
use postcraft::domain::{PlatformCatalogue, PlatformId};
use postcraft::flows::{FlowOutcome, Flows};
use postcraft::repl::{self, view};
use postcraft::store::ContentStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log params here since logging isn't initialized yet
    let log_dir = get_log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("postcraft.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        base_url = %config.service.base_url,
        platforms = config.platforms.len(),
        "PostCraft loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Repl { topic }) => {
            debug!("main: matched Repl command");
            repl::run_interactive(&config, topic).await
        }
        Some(Command::Generate { topic, platforms, save }) => {
            debug!(?platforms, ?save, "main: matched Generate command");
            cmd_generate(&config, &topic, &platforms, save).await
        }
        Some(Command::Platforms { remote, format }) => {
            debug!(remote, ?format, "main: matched Platforms command");
            cmd_platforms(&config, remote, format).await
        }
        None => {
            debug!("main: no command, starting REPL");
            repl::run_interactive(&config, None).await
        }
    }
}

/// Generate a draft, format it for the requested platforms, print the result
async fn cmd_generate(config: &Config, topic: &str, platforms: &[String], save: Option<PathBuf>) -> Result<()> {
    debug!(%topic, "cmd_generate: called");

    // Resolve names up front so a typo fails before the service is called.
    // Repeats are dropped: toggling the same platform twice would deselect it.
    let ids: Vec<PlatformId> = config.platforms.resolve_all(platforms)?;

    let (generation, formatter) = create_clients(&config.service)?;
    let store = ContentStore::spawn();
    let flows = Flows::new(store.clone(), generation, formatter);

    match flows.generate(topic).await? {
        FlowOutcome::Completed => {}
        FlowOutcome::InvalidInput => return Err(eyre::eyre!("Topic must not be empty")),
        FlowOutcome::RateLimited(message) | FlowOutcome::Failed(message) => return Err(eyre::eyre!(message)),
        other => return Err(eyre::eyre!("Unexpected generate outcome: {:?}", other)),
    }

    for id in &ids {
        let outcome = flows.toggle_platform(id).await?;
        if outcome.is_error() {
            warn!(platform = %id, ?outcome, "cmd_generate: formatting failed");
            print!("{}: ", id);
            view::print_outcome(&outcome);
        }
    }

    let state = store.snapshot().await?;
    view::print_state(&state, &config.platforms);

    if let Some(path) = save {
        repl::save_session(&state, &path)?;
        println!("Saved to {}", path.display());
    }

    store.shutdown().await?;
    Ok(())
}

/// List the platform catalogue
async fn cmd_platforms(config: &Config, remote: bool, format: OutputFormat) -> Result<()> {
    debug!(remote, ?format, "cmd_platforms: called");

    let catalogue: PlatformCatalogue = if remote {
        debug!("cmd_platforms: fetching remote catalogue");
        HttpFormatterClient::from_config(&config.service)?
            .fetch_catalogue()
            .await
            .context("Failed to fetch platforms from service")?
    } else {
        config.platforms.clone()
    };

    match format {
        OutputFormat::Json => {
            debug!("cmd_platforms: format is Json");
            println!("{}", serde_json::to_string_pretty(&catalogue)?);
        }
        OutputFormat::Text => {
            debug!("cmd_platforms: format is Text");
            view::print_platforms(&catalogue, None);
        }
    }
    Ok(())
}
