//! Release aggregation from the animetosho feed.
//!
//! Pulls candidate hashes from the feed, dereferences each through the search
//! provider and the extractor, then filters and ranks the survivors.

use crate::api::{FeedEntry, HttpClient};
use crate::search::SearchProvider;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use shared::{FinderError, RankedReleaseSet, ReleaseCandidate};
use tracing::{debug, info, warn};

/// Which feed to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedQuery<'a> {
    /// Whole series (`aid=`)
    Series(&'a str),
    /// Single episode (`eid=`)
    Episode(&'a str),
}

impl<'a> FeedQuery<'a> {
    /// Pick the query from a pair of optional ids; exactly one must be set
    pub fn from_ids(
        secondary_id: Option<&'a str>,
        episode_sub_id: Option<&'a str>,
    ) -> Result<Self, FinderError> {
        match (secondary_id, episode_sub_id) {
            (Some(id), None) => Ok(FeedQuery::Series(id)),
            (None, Some(id)) => Ok(FeedQuery::Episode(id)),
            (Some(_), Some(_)) => Err(FinderError::InvalidArgument(
                "secondary id and episode sub id are mutually exclusive".to_string(),
            )),
            (None, None) => Err(FinderError::InvalidArgument(
                "either a secondary id or an episode sub id is required".to_string(),
            )),
        }
    }

    fn param(&self) -> (&'static str, &'a str) {
        match *self {
            FeedQuery::Series(id) => ("aid", id),
            FeedQuery::Episode(id) => ("eid", id),
        }
    }
}

/// How an aggregation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOutcome {
    /// At least one seeded release
    Ranked,
    /// Feed had no entries
    EmptyFeed,
    /// Releases were found but none had seeders
    AllUnseeded,
    /// No entry produced a parseable release
    NothingParseable,
}

/// Diagnostics for one aggregation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub feed_entries: usize,
    pub missing_hash: usize,
    pub extraction_failures: usize,
    pub unseeded: usize,
    pub releases: Option<RankedReleaseSet>,
}

impl AggregateReport {
    pub fn outcome(&self) -> AggregateOutcome {
        if self.releases.is_some() {
            AggregateOutcome::Ranked
        } else if self.feed_entries == 0 {
            AggregateOutcome::EmptyFeed
        } else if self.unseeded > 0 {
            AggregateOutcome::AllUnseeded
        } else {
            AggregateOutcome::NothingParseable
        }
    }
}

/// Feed + search composition
#[derive(Debug, Clone)]
pub struct ReleaseAggregator {
    client: HttpClient,
    feed_url: String,
    search: SearchProvider,
    concurrency: usize,
}

impl ReleaseAggregator {
    pub fn new(
        client: HttpClient,
        feed_url: impl Into<String>,
        search: SearchProvider,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
            search,
            concurrency: concurrency.max(1),
        }
    }

    /// Ranked releases for exactly one of the two ids.
    ///
    /// `None` means nothing viable was found, including a feed that could not
    /// be fetched. Supplying both ids or neither is an `InvalidArgument`.
    pub async fn aggregate(
        &self,
        secondary_id: Option<&str>,
        episode_sub_id: Option<&str>,
    ) -> Result<Option<RankedReleaseSet>, FinderError> {
        let query = FeedQuery::from_ids(secondary_id, episode_sub_id)?;

        match self.aggregate_with_report(query).await {
            Ok(report) => {
                info!(
                    query = ?query,
                    outcome = ?report.outcome(),
                    feed_entries = report.feed_entries,
                    missing_hash = report.missing_hash,
                    extraction_failures = report.extraction_failures,
                    unseeded = report.unseeded,
                    "Aggregation finished"
                );
                Ok(report.releases)
            }
            Err(e) if e.is_recoverable() => {
                warn!(query = ?query, kind = e.kind(), error = %e, "Feed unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run the aggregation and keep the per-stage counters.
    ///
    /// Feed failures are returned as errors here; per-entry failures are
    /// only counted.
    pub async fn aggregate_with_report(
        &self,
        query: FeedQuery<'_>,
    ) -> Result<AggregateReport, FinderError> {
        let entries = self.fetch_feed(query).await?;
        let mut report = AggregateReport {
            feed_entries: entries.len(),
            ..Default::default()
        };

        let hashes: Vec<String> = entries
            .iter()
            .filter_map(|entry| {
                let hash = entry.content_hash();
                if hash.is_none() {
                    debug!(title = ?entry.title, "Feed entry has no content hash");
                }
                hash.map(str::to_string)
            })
            .collect();
        report.missing_hash = entries.len() - hashes.len();

        // `buffered` yields in input order, so ranking ties keep feed order
        let results: Vec<(String, Result<ReleaseCandidate, FinderError>)> = stream::iter(hashes)
            .map(|hash| async move {
                let result = self.search.release_for_hash(&hash).await;
                (hash, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut candidates = Vec::with_capacity(results.len());
        for (hash, result) in results {
            match result {
                Ok(candidate) => {
                    if candidate.seeders().map_or(true, |n| n <= 0) {
                        report.unseeded += 1;
                    }
                    candidates.push(candidate);
                }
                Err(e) if e.is_recoverable() => {
                    debug!(info_hash = %hash, kind = e.kind(), error = %e, "Skipping feed entry");
                    report.extraction_failures += 1;
                }
                Err(e) => return Err(e),
            }
        }

        report.releases = RankedReleaseSet::rank(candidates);
        Ok(report)
    }

    async fn fetch_feed(&self, query: FeedQuery<'_>) -> Result<Vec<FeedEntry>, FinderError> {
        let (key, id) = query.param();
        let url = format!("{}/json?{}={}", self.feed_url.trim_end_matches('/'), key, id);
        let entries: Vec<FeedEntry> = self.client.get_json(&url).await?;
        debug!(url = %url, entries = entries.len(), "Fetched feed");
        Ok(entries)
    }
}
