//! Service clients for PostCraft
//!
//! Typed wrappers over the external generation and formatting service.
//! Transport failures are folded into `ClientError`.

use std::sync::Arc;

use tracing::debug;

mod error;
mod http;
mod traits;

pub use error::ClientError;
pub use http::{HttpFormatterClient, HttpGenerationClient, ServiceHttp};
pub use traits::{FormatterClient, GenerationClient};

#[cfg(test)]
pub use traits::mock;

use crate::config::ServiceConfig;

/// Create both service clients from config, sharing one HTTP connection pool
pub fn create_clients(config: &ServiceConfig) -> eyre::Result<(Arc<dyn GenerationClient>, Arc<dyn FormatterClient>)> {
    debug!(base_url = %config.base_url, "create_clients: called");
    let service = ServiceHttp::from_config(config)?;
    Ok((
        Arc::new(HttpGenerationClient::new(service.clone())),
        Arc::new(HttpFormatterClient::new(service)),
    ))
}
