//! Data models for the project.
//!
//! This module defines the value records passed between the pipeline stages:
//! catalogue mappings, extracted releases, their file trees and the ranked
//! result set. Every value is built once per call and never cached.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalised primary catalogue identifier (a non-empty digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogueRef(String);

impl CatalogueRef {
    /// Wrap an already-normalised identifier, rejecting anything but digits
    pub fn new(digits: impl Into<String>) -> Option<Self> {
        let digits = digits.into();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One episode of the secondary catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMapping {
    /// Textual episode label as used by the mapping provider ("1", "S1", ...)
    pub episode_number: String,
    /// Episode identifier within the secondary catalogue
    pub episode_sub_id: String,
    pub title: Option<String>,
}

/// Result of exactly one successful mapping provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMapping {
    /// Name of the provider that produced this mapping
    pub provider: String,
    pub secondary_id: Option<String>,
    /// Episode table in the provider's source order
    pub episodes: Vec<EpisodeMapping>,
}

impl SecondaryMapping {
    /// Find an episode by exact textual label (no numeric coercion)
    pub fn find_episode(&self, episode_number: &str) -> Option<&EpisodeMapping> {
        self.episodes
            .iter()
            .find(|ep| ep.episode_number == episode_number)
    }
}

/// Tracker statistics scraped from a torrent detail page.
///
/// Values are kept as the raw text from the page; use the accessors on
/// [`ReleaseCandidate`] to get numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub category: Option<String>,
    pub date: Option<String>,
    pub submitter: Option<String>,
    pub seeders: Option<String>,
    pub leechers: Option<String>,
    pub file_size: Option<String>,
    pub completed: Option<String>,
}

/// Node of a torrent's file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    Folder {
        name: Option<String>,
        contents: Vec<FileNode>,
    },
    File {
        name: Option<String>,
        size: String,
    },
}

impl FileNode {
    /// Number of leaf files at or below this node
    pub fn file_count(&self) -> usize {
        match self {
            FileNode::File { .. } => 1,
            FileNode::Folder { contents, .. } => contents.iter().map(FileNode::file_count).sum(),
        }
    }
}

/// A release parsed from one torrent detail document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub release_name: String,
    pub magnet_uri: Option<String>,
    pub tracker_stats: TrackerStats,
    pub files: Vec<FileNode>,
}

impl ReleaseCandidate {
    pub fn seeders(&self) -> Option<i64> {
        parse_count(self.tracker_stats.seeders.as_deref())
    }

    pub fn leechers(&self) -> Option<i64> {
        parse_count(self.tracker_stats.leechers.as_deref())
    }

    pub fn completed(&self) -> Option<i64> {
        parse_count(self.tracker_stats.completed.as_deref())
    }

    /// Upload date, parsed from the `YYYY-MM-DD HH:MM UTC` form Nyaa renders
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.tracker_stats.date.as_deref()?.trim();
        let raw = raw.strip_suffix("UTC").unwrap_or(raw).trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Total number of files across the listing
    pub fn file_count(&self) -> usize {
        self.files.iter().map(FileNode::file_count).sum()
    }
}

fn parse_count(raw: Option<&str>) -> Option<i64> {
    raw?.trim().replace(',', "").parse().ok()
}

/// Releases sorted by seeders, descending, zero-seeder entries excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedReleaseSet(Vec<ReleaseCandidate>);

impl RankedReleaseSet {
    /// Filter out unseeded candidates and rank the rest.
    ///
    /// The sort is stable, so equal seeder counts keep their input order.
    /// Returns `None` when nothing survives.
    pub fn rank(candidates: Vec<ReleaseCandidate>) -> Option<Self> {
        let mut seeded: Vec<(i64, ReleaseCandidate)> = candidates
            .into_iter()
            .filter_map(|c| match c.seeders() {
                Some(n) if n > 0 => Some((n, c)),
                _ => None,
            })
            .collect();

        if seeded.is_empty() {
            return None;
        }

        seeded.sort_by(|a, b| b.0.cmp(&a.0));
        Some(Self(seeded.into_iter().map(|(_, c)| c).collect()))
    }

    /// Highest-seeded release
    pub fn best(&self) -> Option<&ReleaseCandidate> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReleaseCandidate> {
        self.0.iter()
    }
}

/// SeaDex curated entry for one catalogue id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeadexEntry {
    pub comparison: String,
    pub notes: String,
    pub theoretical_best: String,
    pub releases: Vec<SeadexRelease>,
}

/// One tracker release recommended by SeaDex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeadexRelease {
    pub tracker: String,
    pub release_group: String,
    pub url: String,
    pub dual_audio: bool,
    pub is_best: bool,
    /// Private trackers publish a redacted info hash
    pub private_tracker: bool,
    /// Human formatted sum of all file sizes
    pub file_size: String,
    pub files: Vec<SeadexFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeadexFile {
    pub name: String,
    pub size: String,
}
