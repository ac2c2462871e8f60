//! Interactive REPL for PostCraft
//!
//! Drives the orchestration flows from a line editor: plain text generates a
//! draft (or refines the existing one), slash commands toggle platforms and
//! inspect the session.

mod session;
pub mod view;

pub use session::ReplSession;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::create_clients;
use crate::config::Config;
use crate::domain::PostState;
use crate::flows::Flows;
use crate::store::ContentStore;

/// A post state written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionExport {
    pub exported_at: DateTime<Utc>,
    pub state: PostState,
}

impl SessionExport {
    pub fn new(state: PostState) -> Self {
        Self {
            exported_at: Utc::now(),
            state,
        }
    }
}

/// Write `state` as pretty JSON to `path`
pub fn save_session(state: &PostState, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "save_session: called");
    let export = SessionExport::new(state.clone());
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize session")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "save_session: session written");
    Ok(())
}

/// Run the interactive REPL
///
/// This is the main entry point for `pc repl`.
pub async fn run_interactive(config: &Config, initial_topic: Option<String>) -> Result<()> {
    let (generation, formatter) =
        create_clients(&config.service).map_err(|e| eyre::eyre!("Failed to create service clients: {}", e))?;

    let store = ContentStore::spawn();
    let flows = Flows::new(store.clone(), generation, formatter);

    let mut session = ReplSession::new(flows, config.platforms.clone());
    let result = session.run(initial_topic).await;

    if let Err(e) = store.shutdown().await {
        debug!(error = %e, "run_interactive: store already stopped");
    }
    result
}
