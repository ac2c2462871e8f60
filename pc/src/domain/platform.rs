//! Platform identifiers and the configurable platform catalogue
//!
//! The set of platforms is data, not code: the orchestration flows only ever
//! see `PlatformId` values, and which ids are legal is decided by whichever
//! `PlatformCatalogue` the caller loaded.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from catalogue construction and lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogueError {
    #[error("Unknown platform: '{0}'")]
    UnknownPlatform(String),

    #[error("Duplicate platform id: '{0}'")]
    DuplicatePlatform(String),

    #[error("Platform id must not be empty")]
    EmptyId,

    #[error("Unknown platform preset: '{0}' (expected standard or bluetick)")]
    UnknownPreset(String),
}

/// Identifier of a target platform (e.g. `linkedin`, `x`)
///
/// Always stored lowercase and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlatformId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PlatformId> for String {
    fn from(id: PlatformId) -> Self {
        id.0
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A platform entry in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,

    /// Human-readable name shown in listings
    pub name: String,

    /// Maximum post length on the platform, in characters
    #[serde(rename = "character-limit", alias = "characterLimit")]
    pub character_limit: usize,
}

impl Platform {
    pub fn new(id: impl AsRef<str>, name: impl Into<String>, character_limit: usize) -> Self {
        Self {
            id: PlatformId::new(id),
            name: name.into(),
            character_limit,
        }
    }

    /// Length of `text` as the platform counts it (Unicode scalar values)
    pub fn char_count(text: &str) -> usize {
        text.chars().count()
    }

    /// Whether `text` fits the character limit
    pub fn fits(&self, text: &str) -> bool {
        Self::char_count(text) <= self.character_limit
    }

    /// Number of characters over the limit (0 when it fits)
    pub fn overflow(&self, text: &str) -> usize {
        Self::char_count(text).saturating_sub(self.character_limit)
    }
}

/// How a catalogue is written in config: a preset name or an explicit list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogueSource {
    Preset(String),
    List(Vec<Platform>),
}

/// Ordered list of known platforms with unique ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogueSource", into = "Vec<Platform>")]
pub struct PlatformCatalogue {
    platforms: Vec<Platform>,
}

impl PlatformCatalogue {
    /// Build a catalogue, rejecting empty and duplicate ids
    pub fn new(platforms: Vec<Platform>) -> Result<Self, CatalogueError> {
        debug!(count = platforms.len(), "PlatformCatalogue::new: called");
        let mut seen = std::collections::HashSet::new();
        for platform in &platforms {
            if platform.id.as_str().is_empty() {
                return Err(CatalogueError::EmptyId);
            }
            if !seen.insert(platform.id.clone()) {
                return Err(CatalogueError::DuplicatePlatform(platform.id.to_string()));
            }
        }
        Ok(Self { platforms })
    }

    /// The default platform set
    pub fn standard() -> Self {
        Self {
            platforms: vec![
                Platform::new("linkedin", "LinkedIn", 3000),
                Platform::new("facebook", "Facebook", 63206),
                Platform::new("threads", "Threads", 500),
                Platform::new("x", "X", 280),
                Platform::new("truth", "Truth Social", 500),
                Platform::new("bluesky", "Bluesky", 300),
            ],
        }
    }

    /// The alternate platform set that ships BlueTick instead of Bluesky
    pub fn bluetick() -> Self {
        let platforms = Self::standard()
            .platforms
            .into_iter()
            .map(|p| {
                if p.id.as_str() == "bluesky" {
                    Platform::new("bluetick", "BlueTick", 280)
                } else {
                    p
                }
            })
            .collect();
        Self { platforms }
    }

    /// A built-in platform set by name
    pub fn preset(name: &str) -> Result<Self, CatalogueError> {
        debug!(%name, "PlatformCatalogue::preset: called");
        match name.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::standard()),
            "bluetick" => Ok(Self::bluetick()),
            _ => Err(CatalogueError::UnknownPreset(name.to_string())),
        }
    }

    pub fn get(&self, id: &PlatformId) -> Option<&Platform> {
        self.platforms.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlatformId) -> bool {
        self.get(id).is_some()
    }

    /// Resolve user input (an id or a display name, any case) to a known id
    pub fn resolve(&self, input: &str) -> Result<PlatformId, CatalogueError> {
        debug!(%input, "resolve: called");
        let wanted = input.trim();
        self.platforms
            .iter()
            .find(|p| p.id.as_str().eq_ignore_ascii_case(wanted) || p.name.eq_ignore_ascii_case(wanted))
            .map(|p| p.id.clone())
            .ok_or_else(|| CatalogueError::UnknownPlatform(wanted.to_string()))
    }

    /// Resolve several inputs, dropping repeats of the same platform
    ///
    /// Order of first appearance is kept.
    pub fn resolve_all<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<PlatformId>, CatalogueError> {
        let mut ids: Vec<PlatformId> = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = self.resolve(input.as_ref())?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter()
    }

    pub fn ids(&self) -> Vec<PlatformId> {
        self.platforms.iter().map(|p| p.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl Default for PlatformCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<Platform>> for PlatformCatalogue {
    type Error = CatalogueError;

    fn try_from(platforms: Vec<Platform>) -> Result<Self, Self::Error> {
        Self::new(platforms)
    }
}

impl TryFrom<CatalogueSource> for PlatformCatalogue {
    type Error = CatalogueError;

    fn try_from(source: CatalogueSource) -> Result<Self, Self::Error> {
        match source {
            CatalogueSource::Preset(name) => Self::preset(&name),
            CatalogueSource::List(platforms) => Self::new(platforms),
        }
    }
}

impl From<PlatformCatalogue> for Vec<Platform> {
    fn from(catalogue: PlatformCatalogue) -> Self {
        catalogue.platforms
    }
}
