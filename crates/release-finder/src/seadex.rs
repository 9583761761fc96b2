//! SeaDex (releases.moe) curated best-release lookup.

use crate::api::{HttpClient, SeadexRecords, SeadexTorrent};
use shared::{CatalogueRef, FinderError, SeadexEntry, SeadexFile, SeadexRelease};
use tracing::{debug, info};

/// Info hash private trackers publish instead of the real one
const REDACTED_HASH: &str = "<redacted>";

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// releases.moe API client
#[derive(Debug, Clone)]
pub struct SeadexClient {
    client: HttpClient,
    base_url: String,
}

impl SeadexClient {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Curated releases for a catalogue entry, `None` if SeaDex has no entry
    pub async fn release_data(
        &self,
        catalogue: &CatalogueRef,
    ) -> Result<Option<SeadexEntry>, FinderError> {
        let url = format!(
            "{}/api/collections/entries/records?filter=alID={}&expand=trs",
            self.base_url.trim_end_matches('/'),
            catalogue
        );
        let records: SeadexRecords = self.client.get_json(&url).await?;

        let Some(item) = records.items.into_iter().next() else {
            debug!(catalogue_id = %catalogue, "No SeaDex entry");
            return Ok(None);
        };

        let releases: Vec<SeadexRelease> = item
            .expand
            .map(|expand| expand.trs)
            .unwrap_or_default()
            .into_iter()
            .map(project_release)
            .collect();

        info!(catalogue_id = %catalogue, releases = releases.len(), "Fetched SeaDex entry");

        Ok(Some(SeadexEntry {
            comparison: item.comparison.unwrap_or_default(),
            notes: item.notes.unwrap_or_default(),
            theoretical_best: item.theoretical_best.unwrap_or_default(),
            releases,
        }))
    }
}

fn project_release(torrent: SeadexTorrent) -> SeadexRelease {
    let total: u64 = torrent.files.iter().filter_map(|f| f.length).sum();
    let files = torrent
        .files
        .into_iter()
        .map(|file| SeadexFile {
            name: file.name.unwrap_or_default(),
            size: format_file_size(file.length.unwrap_or(0)),
        })
        .collect();

    SeadexRelease {
        tracker: torrent.tracker.unwrap_or_default(),
        release_group: torrent.release_group.unwrap_or_default(),
        url: torrent.url.unwrap_or_default(),
        dual_audio: torrent.dual_audio.unwrap_or(false),
        is_best: torrent.is_best.unwrap_or(false),
        private_tracker: torrent.info_hash.as_deref() == Some(REDACTED_HASH),
        file_size: format_file_size(total),
        files,
    }
}

/// Format a byte count as `X.Y GiB`, or `X.Y MiB` below one GiB
pub fn format_file_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else {
        format!("{:.1} MiB", bytes / MIB)
    }
}
