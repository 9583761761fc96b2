//! External service response types.
//!
//! These types represent the JSON responses from the mapping services, the
//! animetosho feed and the releases.moe API. Fields the pipeline does not rely
//! on are left out; fields it does rely on are optional so that shape checks
//! happen in one place (the provider) instead of inside serde.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier that services send either as a string or as a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Text(String),
    Number(u64),
}

impl IdValue {
    /// Normalise to a non-empty string
    pub fn into_string(self) -> Option<String> {
        match self {
            IdValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            IdValue::Number(n) => Some(n.to_string()),
        }
    }
}

/// find-my-anime search result (the API answers with an array of these)
#[derive(Debug, Clone, Deserialize)]
pub struct FindMyAnimeEntry {
    #[serde(rename = "providerMapping")]
    pub provider_mapping: Option<ProviderMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMapping {
    #[serde(rename = "AniDB")]
    pub anidb: Option<IdValue>,
}

/// ani.zip / zenshin mapping document
#[derive(Debug, Clone, Deserialize)]
pub struct MappingDocument {
    /// Older ani.zip revisions put the id at the top level
    #[serde(default)]
    pub anidb_id: Option<IdValue>,
    #[serde(default)]
    pub mappings: Option<MappingIds>,
    /// Keyed by arbitrary labels; key order is the episode order
    #[serde(default)]
    pub episodes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingIds {
    #[serde(default)]
    pub anidb_id: Option<IdValue>,
}

/// One value of the `episodes` object
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeRecord {
    #[serde(default)]
    pub episode: Option<IdValue>,
    #[serde(rename = "anidbEid", default)]
    pub anidb_eid: Option<IdValue>,
    #[serde(default)]
    pub title: Option<EpisodeTitle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeTitle {
    #[serde(default)]
    pub en: Option<String>,
}

/// animetosho JSON feed entry
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub info_hash: Option<String>,
}

impl FeedEntry {
    /// Content hash, if the entry carries a usable one
    pub fn content_hash(&self) -> Option<&str> {
        self.info_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// releases.moe collection listing
#[derive(Debug, Clone, Deserialize)]
pub struct SeadexRecords {
    #[serde(default)]
    pub items: Vec<SeadexItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeadexItem {
    #[serde(default)]
    pub comparison: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "theoreticalBest", default)]
    pub theoretical_best: Option<String>,
    #[serde(default)]
    pub expand: Option<SeadexExpand>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeadexExpand {
    #[serde(default)]
    pub trs: Vec<SeadexTorrent>,
}

/// Tracker release record
#[derive(Debug, Clone, Deserialize)]
pub struct SeadexTorrent {
    #[serde(default)]
    pub tracker: Option<String>,
    #[serde(rename = "releaseGroup", default)]
    pub release_group: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "dualAudio", default)]
    pub dual_audio: Option<bool>,
    #[serde(rename = "isBest", default)]
    pub is_best: Option<bool>,
    #[serde(rename = "infoHash", default)]
    pub info_hash: Option<String>,
    #[serde(default)]
    pub files: Vec<SeadexTorrentFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeadexTorrentFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub length: Option<u64>,
}
