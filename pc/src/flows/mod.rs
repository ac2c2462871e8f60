//! Orchestration flows
//!
//! The user-triggered workflows: generate a draft from a topic, refine the
//! draft from feedback, and toggle a platform (formatting a variant when one
//! is needed). Each flow arms the store, awaits exactly one client call, then
//! settles the outcome in a single guarded transition. A `clear_all` while a
//! call is in flight moves the epoch on, and the late result is dropped.
//!
//! There is no re-entrancy lock: the UI disables its controls while
//! `is_generating` is set.

mod generate;
mod platforms;
mod refine;

use std::sync::Arc;

use crate::client::{ClientError, FormatterClient, GenerationClient};
use crate::store::ContentStore;

/// Shown when the service rejects a request for quota reasons without a message
pub const QUOTA_FALLBACK_MESSAGE: &str = "Daily usage limit exceeded. The service will resume tomorrow.";

pub const GENERATE_FAILED_MESSAGE: &str = "Error generating content. Please try again later.";

pub const REFINE_FAILED_MESSAGE: &str = "Error refining content. Please try again.";

pub const FORMAT_FAILED_MESSAGE: &str = "Error formatting content. Please try again.";

/// Prefix of the assistant turn recorded for a quota rejection
pub const WARNING_MARKER: &str = "⚠️ ";

/// How a flow invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The result was applied to the store
    Completed,
    /// Empty topic/feedback (or nothing to refine); nothing happened
    InvalidInput,
    /// The service refused for quota reasons; carries the surfaced message
    RateLimited(String),
    /// The call failed; carries the surfaced message
    Failed(String),
    /// The store was cleared while the call was in flight; result dropped
    Stale,
    /// Toggle removed the platform from the selection
    Deselected,
    /// Toggle reselected a platform whose variation was already cached
    Cached,
    /// Toggle selected a platform but there is no draft to format yet
    SelectedWithoutContent,
}

impl FlowOutcome {
    /// Whether the UI should clear the input that triggered the flow
    pub fn should_clear_input(&self) -> bool {
        matches!(self, FlowOutcome::Completed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FlowOutcome::RateLimited(_) | FlowOutcome::Failed(_))
    }
}

/// Quota message to surface for a rate-limit error
fn quota_message(err: &ClientError) -> String {
    err.rate_limit_message()
        .map(str::to_string)
        .unwrap_or_else(|| QUOTA_FALLBACK_MESSAGE.to_string())
}

/// The orchestration flows, wired to a store and two clients
#[derive(Clone)]
pub struct Flows {
    store: ContentStore,
    generation: Arc<dyn GenerationClient>,
    formatter: Arc<dyn FormatterClient>,
}

impl Flows {
    pub fn new(store: ContentStore, generation: Arc<dyn GenerationClient>, formatter: Arc<dyn FormatterClient>) -> Self {
        Self {
            store,
            generation,
            formatter,
        }
    }

    /// The store these flows write to
    pub fn store(&self) -> &ContentStore {
        &self.store
    }
}
