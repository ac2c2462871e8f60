//! Client trait definitions

use async_trait::async_trait;

use super::ClientError;
use crate::domain::PlatformId;

/// Generation service client - turns topics into drafts and revises drafts
///
/// Implementations never touch the content store; the flows apply results.
/// Each call is independent: conversation history is not sent along.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a post body from a short topic
    async fn generate(&self, topic: &str) -> Result<String, ClientError>;

    /// Revise `current_content` according to a free-text instruction
    async fn refine(&self, current_content: &str, instruction: &str) -> Result<String, ClientError>;
}

/// Formatting service client - adapts a draft to one platform
#[async_trait]
pub trait FormatterClient: Send + Sync {
    /// Format `content` for `platform`
    ///
    /// Fails with `RateLimited` on quota rejection, `FormattingFailed` otherwise.
    async fn format_for_platform(&self, platform: &PlatformId, content: &str) -> Result<String, ClientError>;
}
