//! PostState - the aggregate owned by the content store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Message, PlatformId};

/// Everything known about the post being drafted
///
/// `content` is the canonical draft; the empty string means "no post yet".
/// `platform_variations` only holds entries for platforms whose formatting
/// request succeeded. Entries outlive deselection so a reselected platform
/// can be shown again without another request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PostState {
    pub content: String,

    /// Selected platforms in selection order, no duplicates
    pub selected_platforms: Vec<PlatformId>,

    pub platform_variations: BTreeMap<PlatformId, String>,

    pub conversation_history: Vec<Message>,

    pub error: Option<String>,

    pub is_generating: bool,
}

impl PostState {
    pub fn is_empty_draft(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_selected(&self, id: &PlatformId) -> bool {
        self.selected_platforms.contains(id)
    }

    pub fn variation(&self, id: &PlatformId) -> Option<&str> {
        self.platform_variations.get(id).map(String::as_str)
    }

    /// True when content, selection, variations and conversation are all empty
    pub fn is_cleared(&self) -> bool {
        self.content.is_empty()
            && self.selected_platforms.is_empty()
            && self.platform_variations.is_empty()
            && self.conversation_history.is_empty()
    }
}
