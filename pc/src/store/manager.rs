//! ContentStore - actor that owns the PostState
//!
//! Processes transitions via channels, so every mutation is applied in full
//! before any reader can observe the state.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{Message, PlatformId, PostState};

use super::messages::{Applied, Epoch, Mutation, StoreCommand, StoreError, StoreResponse, Transition};

/// Event broadcast after every transition that changed the state
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The state changed; carries the state after the transition
    Changed { epoch: Epoch, state: PostState },
    /// `clear_all` ran and the epoch moved on
    Cleared { epoch: Epoch },
}

/// State plus epoch, owned by the actor task
#[derive(Debug, Default)]
struct StoreCore {
    state: PostState,
    epoch: Epoch,
}

impl StoreCore {
    fn apply(&mut self, transition: Transition) -> Applied {
        let fresh = transition.guard.is_none_or(|epoch| epoch == self.epoch);
        if fresh {
            for mutation in transition.mutations {
                self.mutate(mutation);
            }
        } else {
            debug!(guard = ?transition.guard, epoch = self.epoch, "apply: stale guard, dropping mutations");
        }

        for mutation in transition.finally {
            self.mutate(mutation);
        }

        Applied {
            applied: fresh,
            epoch: self.epoch,
            state: self.state.clone(),
        }
    }

    fn mutate(&mut self, mutation: Mutation) {
        let state = &mut self.state;
        match mutation {
            Mutation::SetContent(content) => {
                state.content = content;
            }
            Mutation::SetSelectedPlatforms(ids) => {
                // First occurrence wins
                let mut selected: Vec<PlatformId> = Vec::with_capacity(ids.len());
                for id in ids {
                    if !selected.contains(&id) {
                        selected.push(id);
                    }
                }
                state.selected_platforms = selected;
            }
            Mutation::SelectPlatform(id) => {
                if !state.selected_platforms.contains(&id) {
                    state.selected_platforms.push(id);
                }
            }
            Mutation::DeselectPlatform(id) => {
                state.selected_platforms.retain(|p| p != &id);
            }
            Mutation::TogglePlatform(id) => {
                if state.selected_platforms.contains(&id) {
                    state.selected_platforms.retain(|p| p != &id);
                } else {
                    state.selected_platforms.push(id);
                }
            }
            Mutation::SetPlatformVariation(id, text) => {
                state.platform_variations.insert(id, text);
            }
            Mutation::AddToConversation(message) => {
                state.conversation_history.push(message);
            }
            Mutation::SetError(error) => {
                state.error = error;
            }
            Mutation::SetIsGenerating(busy) => {
                state.is_generating = busy;
            }
            Mutation::ClearAll => {
                state.content.clear();
                state.selected_platforms.clear();
                state.platform_variations.clear();
                state.conversation_history.clear();
                self.epoch += 1;
            }
        }
    }
}

/// Handle to send commands to the content store actor
///
/// Cheap to clone; every clone talks to the same state.
#[derive(Clone)]
pub struct ContentStore {
    tx: mpsc::Sender<StoreCommand>,
    /// Broadcast sender for state change notifications
    event_tx: broadcast::Sender<StoreEvent>,
}

impl ContentStore {
    /// Spawn a new store actor with an empty post
    pub fn spawn() -> Self {
        Self::spawn_with_state(PostState::default())
    }

    /// Spawn a new store actor starting from `state`
    pub fn spawn_with_state(state: PostState) -> Self {
        debug!("spawn_with_state: called");
        let (tx, rx) = mpsc::channel(256);

        // Broadcast channel for state change notifications (UI subscribes)
        let (event_tx, _) = broadcast::channel(64);

        let core = StoreCore { state, epoch: 0 };
        tokio::spawn(actor_loop(core, rx, event_tx.clone()));

        info!("ContentStore spawned");

        Self { tx, event_tx }
    }

    /// Subscribe to state change events
    ///
    /// Subscriptions survive `clear_all`.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Apply a transition atomically
    pub async fn apply(&self, transition: Transition) -> StoreResponse<Applied> {
        debug!(guard = ?transition.guard, count = transition.mutations.len(), "apply: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Apply {
                transition,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Current state together with the current epoch
    pub async fn epoch_snapshot(&self) -> StoreResponse<(Epoch, PostState)> {
        debug!("epoch_snapshot: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Current state
    pub async fn snapshot(&self) -> StoreResponse<PostState> {
        Ok(self.epoch_snapshot().await?.1)
    }

    async fn apply_one(&self, mutation: Mutation) -> StoreResponse<()> {
        self.apply(Transition::single(mutation)).await.map(|_| ())
    }

    // === Primitive mutations ===

    /// Replace the draft (does not log a conversation turn)
    pub async fn set_content(&self, content: impl Into<String>) -> StoreResponse<()> {
        self.apply_one(Mutation::SetContent(content.into())).await
    }

    /// Replace the platform selection wholesale
    pub async fn set_selected_platforms(&self, ids: Vec<PlatformId>) -> StoreResponse<()> {
        self.apply_one(Mutation::SetSelectedPlatforms(ids)).await
    }

    pub async fn select_platform(&self, id: PlatformId) -> StoreResponse<()> {
        self.apply_one(Mutation::SelectPlatform(id)).await
    }

    pub async fn deselect_platform(&self, id: PlatformId) -> StoreResponse<()> {
        self.apply_one(Mutation::DeselectPlatform(id)).await
    }

    pub async fn set_platform_variation(&self, id: PlatformId, text: impl Into<String>) -> StoreResponse<()> {
        self.apply_one(Mutation::SetPlatformVariation(id, text.into())).await
    }

    pub async fn add_to_conversation(&self, message: Message) -> StoreResponse<()> {
        self.apply_one(Mutation::AddToConversation(message)).await
    }

    pub async fn set_error(&self, error: Option<String>) -> StoreResponse<()> {
        self.apply_one(Mutation::SetError(error)).await
    }

    pub async fn set_is_generating(&self, busy: bool) -> StoreResponse<()> {
        self.apply_one(Mutation::SetIsGenerating(busy)).await
    }

    /// Reset content, selection, variations and conversation
    ///
    /// `error` and `is_generating` are left alone. Returns the new epoch.
    pub async fn clear_all(&self) -> StoreResponse<Epoch> {
        Ok(self.apply(Transition::single(Mutation::ClearAll)).await?.epoch)
    }

    /// Shutdown the store actor
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        debug!("shutdown: called");
        self.tx
            .send(StoreCommand::Shutdown)
            .await
            .map_err(|_| StoreError::ChannelError)
    }
}

/// The actor loop that processes commands
async fn actor_loop(mut core: StoreCore, mut rx: mpsc::Receiver<StoreCommand>, event_tx: broadcast::Sender<StoreEvent>) {
    debug!("ContentStore actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::Apply { transition, reply } => {
                debug!(guard = ?transition.guard, "actor_loop: Apply command");
                let before_epoch = core.epoch;
                let before = core.state.clone();
                let applied = core.apply(transition);

                if applied.epoch != before_epoch {
                    let _ = event_tx.send(StoreEvent::Cleared { epoch: applied.epoch });
                }
                if applied.state != before {
                    let _ = event_tx.send(StoreEvent::Changed {
                        epoch: applied.epoch,
                        state: applied.state.clone(),
                    });
                }
                let _ = reply.send(Ok(applied));
            }

            StoreCommand::Snapshot { reply } => {
                debug!("actor_loop: Snapshot command");
                let _ = reply.send(Ok((core.epoch, core.state.clone())));
            }

            StoreCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("ContentStore shutting down");
                break;
            }
        }
    }

    debug!("ContentStore actor stopped");
}
