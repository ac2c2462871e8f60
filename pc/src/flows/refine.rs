//! Refine flow: feedback -> revised draft

use tracing::{debug, info, warn};

use super::{FlowOutcome, Flows, REFINE_FAILED_MESSAGE, quota_message};
use crate::domain::Message;
use crate::store::{Mutation, StoreResponse, Transition};

impl Flows {
    /// Revise the current draft according to `feedback`
    ///
    /// Failures are non-destructive: draft and conversation stay exactly as
    /// they were, only `error` is set.
    pub async fn refine(&self, feedback: &str) -> StoreResponse<FlowOutcome> {
        debug!(%feedback, "refine: called");
        if feedback.trim().is_empty() {
            debug!("refine: empty feedback, skipping");
            return Ok(FlowOutcome::InvalidInput);
        }

        // The draft is checked against the armed state, never an earlier snapshot
        let armed = self
            .store
            .apply(Transition::single(Mutation::SetIsGenerating(true)))
            .await?;
        if armed.state.is_empty_draft() {
            debug!("refine: no draft to refine, skipping");
            self.store
                .apply(Transition::single(Mutation::SetIsGenerating(false)))
                .await?;
            return Ok(FlowOutcome::InvalidInput);
        }
        let content = armed.state.content;

        let result = self.generation.refine(&content, feedback).await;

        let settle = Transition::new()
            .guarded(armed.epoch)
            .finally(Mutation::SetIsGenerating(false));
        let (settle, outcome) = match result {
            Ok(revised) => {
                info!(revised_len = revised.len(), "refine: draft revised");
                let settle = settle
                    .then(Mutation::AddToConversation(Message::user(feedback)))
                    .then(Mutation::AddToConversation(Message::assistant(revised.clone())))
                    .then(Mutation::SetContent(revised))
                    .then(Mutation::SetError(None));
                (settle, FlowOutcome::Completed)
            }
            Err(err) if err.is_rate_limit() => {
                let message = quota_message(&err);
                warn!(%message, "refine: rate limited");
                let settle = settle.then(Mutation::SetError(Some(message.clone())));
                (settle, FlowOutcome::RateLimited(message))
            }
            Err(err) => {
                warn!(error = %err, "refine: failed");
                let settle = settle.then(Mutation::SetError(Some(REFINE_FAILED_MESSAGE.to_string())));
                (settle, FlowOutcome::Failed(REFINE_FAILED_MESSAGE.to_string()))
            }
        };

        let applied = self.store.apply(settle).await?;
        if applied.applied {
            Ok(outcome)
        } else {
            info!("refine: store cleared while in flight, result dropped");
            Ok(FlowOutcome::Stale)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::ClientError;
    use crate::client::mock::{GenerationCall, MockFormatterClient, MockGenerationClient};
    use crate::store::ContentStore;

    async fn flows_with_draft(draft: &str, responses: Vec<Result<String, ClientError>>) -> (Flows, Arc<MockGenerationClient>) {
        let generation = Arc::new(MockGenerationClient::new(responses));
        let flows = Flows::new(
            ContentStore::spawn(),
            generation.clone(),
            Arc::new(MockFormatterClient::new(vec![])),
        );
        if !draft.is_empty() {
            flows.store().set_content(draft).await.unwrap();
        }
        (flows, generation)
    }

    #[tokio::test]
    async fn test_refine_success_replaces_draft_and_logs_turn() {
        let (flows, generation) = flows_with_draft("Long post", vec![Ok("Short post".to_string())]).await;

        let outcome = flows.refine("make it shorter").await.unwrap();
        assert_eq!(outcome, FlowOutcome::Completed);

        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(state.content, "Short post");
        assert_eq!(
            state.conversation_history,
            vec![Message::user("make it shorter"), Message::assistant("Short post")]
        );
        assert!(!state.is_generating);
        assert_eq!(
            generation.calls(),
            vec![GenerationCall::Refine {
                content: "Long post".to_string(),
                instruction: "make it shorter".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_refine_failure_is_non_destructive() {
        let (flows, _) = flows_with_draft(
            "Keep me 🦌",
            vec![Err(ClientError::GenerationFailed("status 502".to_string()))],
        )
        .await;
        flows.store().add_to_conversation(Message::user("earlier")).await.unwrap();
        let before = flows.store().snapshot().await.unwrap();

        let outcome = flows.refine("rewrite").await.unwrap();
        assert_eq!(outcome, FlowOutcome::Failed(REFINE_FAILED_MESSAGE.to_string()));

        let after = flows.store().snapshot().await.unwrap();
        assert_eq!(after.content.as_bytes(), before.content.as_bytes());
        assert_eq!(after.conversation_history, before.conversation_history);
        assert_eq!(after.error.as_deref(), Some(REFINE_FAILED_MESSAGE));
        assert!(!after.is_generating);
    }

    #[tokio::test]
    async fn test_refine_rate_limited_is_non_destructive() {
        let (flows, _) = flows_with_draft(
            "Draft",
            vec![Err(ClientError::RateLimited {
                message: Some("quota".to_string()),
            })],
        )
        .await;

        let outcome = flows.refine("again").await.unwrap();
        assert_eq!(outcome, FlowOutcome::RateLimited("quota".to_string()));

        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(state.content, "Draft");
        assert!(state.conversation_history.is_empty());
        assert_eq!(state.error.as_deref(), Some("quota"));
    }

    #[tokio::test]
    async fn test_refine_empty_feedback_or_draft_is_noop() {
        let (flows, generation) = flows_with_draft("", vec![Ok("unused".to_string())]).await;

        assert_eq!(flows.refine("").await.unwrap(), FlowOutcome::InvalidInput);
        assert_eq!(flows.refine("shorter").await.unwrap(), FlowOutcome::InvalidInput);
        assert!(generation.calls().is_empty());
        assert!(!flows.store().snapshot().await.unwrap().is_generating);
    }

    #[tokio::test]
    async fn test_refine_after_clear_never_sends_empty_draft() {
        let (flows, generation) = flows_with_draft("draft", vec![Ok("unused".to_string())]).await;
        flows.store().clear_all().await.unwrap();
        let mut events = flows.store().subscribe();

        assert_eq!(flows.refine("shorter").await.unwrap(), FlowOutcome::InvalidInput);
        assert!(generation.calls().is_empty());

        // Busy flag goes up with the check and straight back down
        let mut busy = Vec::new();
        while let Ok(crate::store::StoreEvent::Changed { state, .. }) = events.try_recv() {
            busy.push(state.is_generating);
        }
        assert_eq!(busy, vec![true, false]);
        assert!(!flows.store().snapshot().await.unwrap().is_generating);
    }
}
