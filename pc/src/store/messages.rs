//! Content store messages
//!
//! Commands and responses for the actor pattern, plus the mutation vocabulary
//! that transitions are built from.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Message, PlatformId, PostState};

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Channel error")]
    ChannelError,
}

/// Response from store operations
pub type StoreResponse<T> = Result<T, StoreError>;

/// Counter bumped by every `clear_all`; results computed under an older epoch are stale
pub type Epoch = u64;

/// One primitive change to `PostState`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Replace the draft. Does not touch the conversation.
    SetContent(String),
    /// Replace the selection wholesale; the caller keeps it duplicate-free
    SetSelectedPlatforms(Vec<PlatformId>),
    /// Append to the selection unless already present
    SelectPlatform(PlatformId),
    /// Remove from the selection, keeping any cached variation
    DeselectPlatform(PlatformId),
    /// Select if absent, deselect if present
    TogglePlatform(PlatformId),
    SetPlatformVariation(PlatformId, String),
    AddToConversation(Message),
    SetError(Option<String>),
    SetIsGenerating(bool),
    /// Reset content, selection, variations and conversation; bumps the epoch
    ClearAll,
}

/// A batch of mutations applied as one indivisible step
///
/// With a guard, `mutations` only apply if the store is still at that epoch.
/// `finally` mutations apply either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub guard: Option<Epoch>,
    pub mutations: Vec<Mutation>,
    pub finally: Vec<Mutation>,
}

impl Transition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition consisting of a single unguarded mutation
    pub fn single(mutation: Mutation) -> Self {
        Self::new().then(mutation)
    }

    /// Only apply `mutations` if the store is still at `epoch`
    pub fn guarded(mut self, epoch: Epoch) -> Self {
        self.guard = Some(epoch);
        self
    }

    pub fn then(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Apply `mutation` even when the guard is stale
    pub fn finally(mut self, mutation: Mutation) -> Self {
        self.finally.push(mutation);
        self
    }
}

/// What the actor did with a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// False when the guard epoch was stale and `mutations` were dropped
    pub applied: bool,
    /// Store epoch after the transition
    pub epoch: Epoch,
    /// State after the transition
    pub state: PostState,
}

/// Commands sent to the content store actor
#[derive(Debug)]
pub enum StoreCommand {
    Apply {
        transition: Transition,
        reply: oneshot::Sender<StoreResponse<Applied>>,
    },
    Snapshot {
        reply: oneshot::Sender<StoreResponse<(Epoch, PostState)>>,
    },

    // Shutdown
    Shutdown,
}
