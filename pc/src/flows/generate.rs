//! Generate flow: topic -> draft

use tracing::{debug, info, warn};

use super::{FlowOutcome, Flows, GENERATE_FAILED_MESSAGE, WARNING_MARKER, quota_message};
use crate::domain::Message;
use crate::store::{Mutation, StoreResponse, Transition};

impl Flows {
    /// Generate a fresh draft from `topic`
    ///
    /// On success the topic and the result are logged as a user/assistant pair
    /// and the result becomes the draft. A quota rejection is logged as a turn
    /// too (topic plus a warning), other failures only set `error`. The draft is
    /// never touched on failure.
    pub async fn generate(&self, topic: &str) -> StoreResponse<FlowOutcome> {
        debug!(topic_len = topic.len(), "generate: called");
        if topic.trim().is_empty() {
            debug!("generate: empty topic, skipping");
            return Ok(FlowOutcome::InvalidInput);
        }

        let armed = self
            .store
            .apply(
                Transition::new()
                    .then(Mutation::SetIsGenerating(true))
                    .then(Mutation::SetError(None)),
            )
            .await?;

        let result = self.generation.generate(topic).await;

        let settle = Transition::new()
            .guarded(armed.epoch)
            .finally(Mutation::SetIsGenerating(false));
        let (settle, outcome) = match result {
            Ok(post) => {
                info!(post_len = post.len(), "generate: draft generated");
                let settle = settle
                    .then(Mutation::AddToConversation(Message::user(topic)))
                    .then(Mutation::AddToConversation(Message::assistant(post.clone())))
                    .then(Mutation::SetContent(post));
                (settle, FlowOutcome::Completed)
            }
            Err(err) if err.is_rate_limit() => {
                let message = quota_message(&err);
                warn!(%message, "generate: rate limited");
                let settle = settle
                    .then(Mutation::AddToConversation(Message::user(topic)))
                    .then(Mutation::AddToConversation(Message::assistant(format!(
                        "{}{}",
                        WARNING_MARKER, message
                    ))))
                    .then(Mutation::SetError(Some(message.clone())));
                (settle, FlowOutcome::RateLimited(message))
            }
            Err(err) => {
                warn!(error = %err, "generate: failed");
                let settle = settle.then(Mutation::SetError(Some(GENERATE_FAILED_MESSAGE.to_string())));
                (settle, FlowOutcome::Failed(GENERATE_FAILED_MESSAGE.to_string()))
            }
        };

        let applied = self.store.apply(settle).await?;
        if applied.applied {
            Ok(outcome)
        } else {
            info!("generate: store cleared while in flight, result dropped");
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
    use crate::domain::Role;
    use crate::flows::QUOTA_FALLBACK_MESSAGE;
    use crate::store::ContentStore;

    fn flows_with(responses: Vec<Result<String, ClientError>>) -> (Flows, Arc<MockGenerationClient>) {
        let generation = Arc::new(MockGenerationClient::new(responses));
        let flows = Flows::new(
            ContentStore::spawn(),
            generation.clone(),
            Arc::new(MockFormatterClient::new(vec![])),
        );
        (flows, generation)
    }

    #[tokio::test]
    async fn test_generate_success_logs_pair_and_sets_content() {
        let (flows, generation) = flows_with(vec![Ok("Antlers at dawn".to_string())]);

        let outcome = flows.generate("a poem about deer").await.unwrap();
        assert_eq!(outcome, FlowOutcome::Completed);
        assert!(outcome.should_clear_input());

        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(state.content, "Antlers at dawn");
        assert_eq!(
            state.conversation_history,
            vec![Message::user("a poem about deer"), Message::assistant("Antlers at dawn")]
        );
        assert!(state.error.is_none());
        assert!(!state.is_generating);
        assert_eq!(
            generation.calls(),
            vec![GenerationCall::Generate {
                topic: "a poem about deer".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_generate_empty_topic_is_noop() {
        let (flows, generation) = flows_with(vec![]);
        let mut events = flows.store().subscribe();

        assert_eq!(flows.generate("").await.unwrap(), FlowOutcome::InvalidInput);
        assert_eq!(flows.generate("   ").await.unwrap(), FlowOutcome::InvalidInput);

        assert!(generation.calls().is_empty());
        assert!(events.try_recv().is_err());
        assert_eq!(flows.store().snapshot().await.unwrap(), Default::default());
    }

    #[tokio::test]
    async fn test_generate_rate_limited_logs_warning_turn() {
        let (flows, _) = flows_with(vec![Err(ClientError::RateLimited {
            message: Some("Daily usage limit exceeded. Service will resume tomorrow.".to_string()),
        })]);
        flows.store().set_content("previous draft").await.unwrap();

        let outcome = flows.generate("x").await.unwrap();
        assert_eq!(
            outcome,
            FlowOutcome::RateLimited("Daily usage limit exceeded. Service will resume tomorrow.".to_string())
        );

        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(state.content, "previous draft");
        assert_eq!(state.conversation_history.len(), 2);
        assert_eq!(state.conversation_history[0], Message::user("x"));
        assert_eq!(state.conversation_history[1].role, Role::Assistant);
        assert!(state.conversation_history[1].content.starts_with(WARNING_MARKER));
        assert!(state.conversation_history[1].content.contains("Daily usage limit exceeded"));
        assert_eq!(
            state.error.as_deref(),
            Some("Daily usage limit exceeded. Service will resume tomorrow.")
        );
        assert!(!state.is_generating);
    }

    #[tokio::test]
    async fn test_generate_rate_limited_without_message_uses_fallback() {
        let (flows, _) = flows_with(vec![Err(ClientError::RateLimited { message: None })]);

        let outcome = flows.generate("x").await.unwrap();
        assert_eq!(outcome, FlowOutcome::RateLimited(QUOTA_FALLBACK_MESSAGE.to_string()));
        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(
            state.conversation_history[1].content,
            format!("{}{}", WARNING_MARKER, QUOTA_FALLBACK_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_generate_generic_failure_only_sets_error() {
        let (flows, _) = flows_with(vec![Err(ClientError::GenerationFailed("status 500".to_string()))]);
        flows.store().set_content("previous draft").await.unwrap();

        let outcome = flows.generate("topic").await.unwrap();
        assert_eq!(outcome, FlowOutcome::Failed(GENERATE_FAILED_MESSAGE.to_string()));

        let state = flows.store().snapshot().await.unwrap();
        assert_eq!(state.content, "previous draft");
        assert!(state.conversation_history.is_empty());
        assert_eq!(state.error.as_deref(), Some(GENERATE_FAILED_MESSAGE));
        assert!(!state.is_generating);
    }

    #[tokio::test]
    async fn test_generate_clears_previous_error() {
        let (flows, _) = flows_with(vec![Ok("post".to_string())]);
        flows.store().set_error(Some("old".to_string())).await.unwrap();

        flows.generate("topic").await.unwrap();
        assert!(flows.store().snapshot().await.unwrap().error.is_none());
    }
}
