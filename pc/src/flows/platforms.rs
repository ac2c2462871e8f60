//! Platform toggle flow and variant formatting

use tracing::{debug, info, warn};

use super::{FORMAT_FAILED_MESSAGE, FlowOutcome, Flows, quota_message};
use crate::domain::PlatformId;
use crate::store::{Epoch, Mutation, StoreResponse, Transition};

impl Flows {
    /// Select or deselect `platform`
    ///
    /// Deselecting keeps the cached variation. Selecting formats the draft for
    /// the platform unless there is no draft yet or a variation is already
    /// cached. The platform is selected before the request goes out, so it
    /// shows as pending; on failure it stays selected without a variation.
    pub async fn toggle_platform(&self, platform: &PlatformId) -> StoreResponse<FlowOutcome> {
        debug!(%platform, "toggle_platform: called");
        let toggled = self
            .store
            .apply(Transition::single(Mutation::TogglePlatform(platform.clone())))
            .await?;
        let state = toggled.state;

        if !state.is_selected(platform) {
            debug!(%platform, "toggle_platform: deselected");
            return Ok(FlowOutcome::Deselected);
        }
        if state.is_empty_draft() {
            debug!(%platform, "toggle_platform: selected, no draft to format");
            return Ok(FlowOutcome::SelectedWithoutContent);
        }
        if state.variation(platform).is_some() {
            debug!(%platform, "toggle_platform: selected, variation cached");
            return Ok(FlowOutcome::Cached);
        }

        self.format_into(platform, &state.content, toggled.epoch).await
    }

    /// Re-format the current draft for every selected platform
    ///
    /// Cached variations are not refreshed by refinement, so callers use this
    /// after the draft changes. Platforms are processed in selection order.
    pub async fn reformat_selected(&self) -> StoreResponse<Vec<(PlatformId, FlowOutcome)>> {
        debug!("reformat_selected: called");
        let (epoch, state) = self.store.epoch_snapshot().await?;
        if state.is_empty_draft() {
            debug!("reformat_selected: no draft");
            return Ok(Vec::new());
        }

        self.format_each(&state.selected_platforms, &state.content, epoch).await
    }

    /// Format the draft for selected platforms that have no variation yet
    ///
    /// Platforms selected before there was a draft end up here once one is
    /// generated.
    pub async fn format_pending(&self) -> StoreResponse<Vec<(PlatformId, FlowOutcome)>> {
        debug!("format_pending: called");
        let (epoch, state) = self.store.epoch_snapshot().await?;
        if state.is_empty_draft() {
            debug!("format_pending: no draft");
            return Ok(Vec::new());
        }

        let pending: Vec<PlatformId> = state
            .selected_platforms
            .iter()
            .filter(|p| state.variation(p).is_none())
            .cloned()
            .collect();
        self.format_each(&pending, &state.content, epoch).await
    }

    /// Format `content` for each platform in turn, stopping once a result goes stale
    async fn format_each(
        &self,
        platforms: &[PlatformId],
        content: &str,
        epoch: Epoch,
    ) -> StoreResponse<Vec<(PlatformId, FlowOutcome)>> {
        let mut outcomes = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let outcome = self.format_into(platform, content, epoch).await?;
            let stale = outcome == FlowOutcome::Stale;
            outcomes.push((platform.clone(), outcome));
            if stale {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Format `content` for `platform` and settle the result under `epoch`
    async fn format_into(&self, platform: &PlatformId, content: &str, epoch: Epoch) -> StoreResponse<FlowOutcome> {
        debug!(%platform, %epoch, "format_into: called");
        let result = self.formatter.format_for_platform(platform, content).await;

        let settle = Transition::new().guarded(epoch);
        let (settle, outcome) = match result {
            Ok(formatted) => {
                info!(%platform, formatted_len = formatted.len(), "format_into: variation ready");
                let settle = settle
                    .then(Mutation::SetPlatformVariation(platform.clone(), formatted))
                    .then(Mutation::SetError(None));
                (settle, FlowOutcome::Completed)
            }
            Err(err) if err.is_rate_limit() => {
                let message = quota_message(&err);
                warn!(%platform, %message, "format_into: rate limited");
                (
                    settle.then(Mutation::SetError(Some(message.clone()))),
                    FlowOutcome::RateLimited(message),
                )
            }
            Err(err) => {
                warn!(%platform, error = %err, "format_into: failed");
                (
                    settle.then(Mutation::SetError(Some(FORMAT_FAILED_MESSAGE.to_string()))),
                    FlowOutcome::Failed(FORMAT_FAILED_MESSAGE.to_string()),
                )
            }
        };

        let applied = self.store.apply(settle).await?;
        if applied.applied {
            Ok(outcome)
        } else {
            info!(%platform, "format_into: store cleared while in flight, result dropped");
            Ok(FlowOutcome::Stale)
        }
    }
}
