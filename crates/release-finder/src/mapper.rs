//! Catalogue id to secondary id resolution.
//!
//! Tries an ordered chain of mapping providers and keeps the first
//! well-formed answer. Results are never merged across providers.

use crate::api::{EpisodeRecord, FindMyAnimeEntry, HttpClient, IdValue, MappingDocument};
use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::config::ProvidersConfig;
use shared::{CatalogueRef, EpisodeMapping, FinderError, SecondaryMapping};
use tracing::{debug, info, warn};

/// Hostnames accepted by [`extract_catalogue_id`]
const CATALOGUE_HOSTS: [&str; 2] = ["anilist.co", "www.anilist.co"];

/// Outcome of asking one provider
#[derive(Debug)]
pub enum ProviderOutcome {
    Success(SecondaryMapping),
    /// Provider failed or answered with something unusable; try the next one
    Skip(FinderError),
}

impl From<Result<SecondaryMapping, FinderError>> for ProviderOutcome {
    fn from(result: Result<SecondaryMapping, FinderError>) -> Self {
        match result {
            Ok(mapping) => ProviderOutcome::Success(mapping),
            Err(e) => ProviderOutcome::Skip(e),
        }
    }
}

/// A source of catalogue mappings
#[async_trait]
pub trait MappingProvider: Send + Sync {
    /// Provider name, as used in `mapping_order`
    fn name(&self) -> &str;

    async fn lookup(&self, catalogue: &CatalogueRef) -> ProviderOutcome;
}

/// find-my-anime cross-mapping service. Yields the secondary id only.
pub struct FindMyAnimeProvider {
    client: HttpClient,
    base_url: String,
}

impl FindMyAnimeProvider {
    pub const NAME: &'static str = "find_my_anime";

    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, catalogue: &CatalogueRef) -> Result<SecondaryMapping, FinderError> {
        let url = format!(
            "{}/api?id={}&provider=Anilist&includeAdult=true&collectionConsent=false",
            self.base_url.trim_end_matches('/'),
            catalogue
        );
        let entries: Vec<FindMyAnimeEntry> = self.client.get_json(&url).await?;

        let secondary_id = entries
            .into_iter()
            .next()
            .and_then(|entry| entry.provider_mapping)
            .and_then(|mapping| mapping.anidb)
            .and_then(IdValue::into_string)
            .ok_or_else(|| FinderError::malformed(format!("{}: no AniDB mapping", Self::NAME)))?;

        Ok(SecondaryMapping {
            provider: Self::NAME.to_string(),
            secondary_id: Some(secondary_id),
            episodes: Vec::new(),
        })
    }
}

#[async_trait]
impl MappingProvider for FindMyAnimeProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lookup(&self, catalogue: &CatalogueRef) -> ProviderOutcome {
        self.fetch(catalogue).await.into()
    }
}

/// Mapping services answering `/mappings?anilist_id=` with an id and an
/// episode table (ani.zip and zenshin share this shape)
pub struct MappingServiceProvider {
    name: String,
    client: HttpClient,
    base_url: String,
}

impl MappingServiceProvider {
    pub const ANI_ZIP: &'static str = "ani_zip";
    pub const ZENSHIN: &'static str = "zenshin";

    pub fn new(name: impl Into<String>, client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: base_url.into(),
        }
    }

    pub fn ani_zip(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self::new(Self::ANI_ZIP, client, base_url)
    }

    pub fn zenshin(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self::new(Self::ZENSHIN, client, base_url)
    }

    async fn fetch(&self, catalogue: &CatalogueRef) -> Result<SecondaryMapping, FinderError> {
        let url = format!(
            "{}/mappings?anilist_id={}",
            self.base_url.trim_end_matches('/'),
            catalogue
        );
        let document: MappingDocument = self.client.get_json(&url).await?;
        project_document(&self.name, document)
    }
}

#[async_trait]
impl MappingProvider for MappingServiceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, catalogue: &CatalogueRef) -> ProviderOutcome {
        self.fetch(catalogue).await.into()
    }
}

/// Project a mapping document into a [`SecondaryMapping`].
///
/// The id may sit under `mappings` or at the top level. Both the id and the
/// `episodes` table must be present; unusable episode entries are dropped
/// one by one.
fn project_document(provider: &str, document: MappingDocument) -> Result<SecondaryMapping, FinderError> {
    let secondary_id = document
        .mappings
        .and_then(|m| m.anidb_id)
        .or(document.anidb_id)
        .and_then(IdValue::into_string)
        .ok_or_else(|| FinderError::malformed(format!("{}: missing AniDB id", provider)))?;

    let table = document
        .episodes
        .ok_or_else(|| FinderError::malformed(format!("{}: missing episodes", provider)))?;
    let episodes = project_episodes(provider, table);

    Ok(SecondaryMapping {
        provider: provider.to_string(),
        secondary_id: Some(secondary_id),
        episodes,
    })
}

fn project_episodes(provider: &str, table: Map<String, Value>) -> Vec<EpisodeMapping> {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let record: EpisodeRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    debug!(provider, key = %key, error = %e, "Dropping malformed episode entry");
                    return None;
                }
            };

            let episode_number = record.episode.and_then(IdValue::into_string);
            let episode_sub_id = record.anidb_eid.and_then(IdValue::into_string);
            match (episode_number, episode_sub_id) {
                (Some(episode_number), Some(episode_sub_id)) => Some(EpisodeMapping {
                    episode_number,
                    episode_sub_id,
                    title: record.title.and_then(|t| t.en).filter(|t| !t.is_empty()),
                }),
                _ => {
                    debug!(provider, key = %key, "Dropping episode entry without ids");
                    None
                }
            }
        })
        .collect()
}

/// Ordered provider chain
pub struct IdentifierMapper {
    providers: Vec<Box<dyn MappingProvider>>,
}

impl IdentifierMapper {
    pub fn new(providers: Vec<Box<dyn MappingProvider>>) -> Self {
        Self { providers }
    }

    /// Build the chain in `mapping_order`; unknown names are skipped
    pub fn from_config(config: &ProvidersConfig, client: &HttpClient) -> Self {
        let mut providers: Vec<Box<dyn MappingProvider>> = Vec::new();

        for name in &config.mapping_order {
            match name.as_str() {
                MappingServiceProvider::ANI_ZIP => providers.push(Box::new(
                    MappingServiceProvider::ani_zip(client.clone(), &config.ani_zip_url),
                )),
                MappingServiceProvider::ZENSHIN => providers.push(Box::new(
                    MappingServiceProvider::zenshin(client.clone(), &config.zenshin_url),
                )),
                FindMyAnimeProvider::NAME => providers.push(Box::new(FindMyAnimeProvider::new(
                    client.clone(),
                    &config.find_my_anime_url,
                ))),
                other => warn!(provider = %other, "Unknown mapping provider, ignoring"),
            }
        }

        Self::new(providers)
    }

    /// Names of the configured providers, in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a catalogue id through the first provider that answers.
    ///
    /// Returns `None` once every provider has been skipped.
    pub async fn resolve(&self, catalogue: &CatalogueRef) -> Option<SecondaryMapping> {
        for provider in &self.providers {
            match provider.lookup(catalogue).await {
                ProviderOutcome::Success(mapping) => {
                    info!(
                        catalogue_id = %catalogue,
                        provider = provider.name(),
                        secondary_id = ?mapping.secondary_id,
                        episodes = mapping.episodes.len(),
                        "Resolved catalogue mapping"
                    );
                    return Some(mapping);
                }
                ProviderOutcome::Skip(e) => {
                    warn!(
                        catalogue_id = %catalogue,
                        provider = provider.name(),
                        kind = e.kind(),
                        error = %e,
                        "Mapping provider failed, trying next"
                    );
                }
            }
        }

        warn!(catalogue_id = %catalogue, "No mapping provider could resolve catalogue id");
        None
    }
}

/// Pull the catalogue id out of an AniList URL.
///
/// The scheme is dropped, the rest lower-cased and a trailing slash trimmed;
/// a known host and an `anime` segment must both be present, and the segment
/// after `anime` must be all digits.
pub fn extract_catalogue_id(url: &str) -> Option<String> {
    let url = url.split_once("://").map_or(url, |(_, rest)| rest);
    let lowered = url.to_lowercase();
    let trimmed = lowered.strip_suffix('/').unwrap_or(&lowered);

    let parts: Vec<&str> = trimmed.split('/').collect();
    if !parts.iter().any(|part| CATALOGUE_HOSTS.contains(part)) {
        return None;
    }

    let anime_index = parts.iter().position(|part| *part == "anime")?;
    let id = parts.get(anime_index + 1)?;

    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

/// Normalise a bare id or catalogue URL
pub fn parse_catalogue_ref(input: &str) -> Option<CatalogueRef> {
    let input = input.trim();
    CatalogueRef::new(input).or_else(|| extract_catalogue_id(input).and_then(CatalogueRef::new))
}
