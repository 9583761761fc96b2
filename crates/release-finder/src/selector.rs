//! Best-release selection.
//!
//! Composes the identifier mapper and the release aggregator to answer
//! "what is the best release of episode N of this catalogue entry?".

use crate::aggregator::ReleaseAggregator;
use crate::api::HttpClient;
use crate::mapper::{parse_catalogue_ref, IdentifierMapper};
use crate::search::SearchProvider;
use shared::{CatalogueRef, Config, FinderError, RankedReleaseSet, SecondaryMapping};
use tracing::info;

/// Entry point tying mapping and aggregation together
pub struct ReleaseSelector {
    mapper: IdentifierMapper,
    aggregator: ReleaseAggregator,
}

impl ReleaseSelector {
    pub fn new(mapper: IdentifierMapper, aggregator: ReleaseAggregator) -> Self {
        Self { mapper, aggregator }
    }

    /// Wire every component from configuration
    pub fn from_config(config: &Config) -> Result<Self, FinderError> {
        let client = HttpClient::new(&config.http)?;
        let mapper = IdentifierMapper::from_config(&config.providers, &client);
        let search = SearchProvider::new(client.clone(), &config.providers.search_url);
        let aggregator = ReleaseAggregator::new(
            client,
            &config.providers.feed_url,
            search,
            config.concurrency(),
        );
        Ok(Self::new(mapper, aggregator))
    }

    pub fn mapper(&self) -> &IdentifierMapper {
        &self.mapper
    }

    pub fn aggregator(&self) -> &ReleaseAggregator {
        &self.aggregator
    }

    /// Resolve a catalogue id or URL to its secondary mapping
    pub async fn mapping(&self, catalogue_id: &str) -> Result<Option<SecondaryMapping>, FinderError> {
        let catalogue = catalogue_ref(catalogue_id)?;
        Ok(self.mapper.resolve(&catalogue).await)
    }

    /// Ranked releases for one episode.
    ///
    /// `episode_number` is compared textually against the mapping's episode
    /// labels. `None` when the mapping, the episode or any seeded release is
    /// missing.
    pub async fn best_release_for_episode(
        &self,
        catalogue_id: &str,
        episode_number: &str,
    ) -> Result<Option<RankedReleaseSet>, FinderError> {
        let catalogue = catalogue_ref(catalogue_id)?;
        let Some(mapping) = self.mapper.resolve(&catalogue).await else {
            return Ok(None);
        };

        let Some(episode) = mapping.find_episode(episode_number) else {
            info!(
                catalogue_id = %catalogue,
                episode = %episode_number,
                provider = %mapping.provider,
                known_episodes = mapping.episodes.len(),
                "Episode not present in mapping"
            );
            return Ok(None);
        };

        self.aggregator
            .aggregate(None, Some(&episode.episode_sub_id))
            .await
    }

    /// Ranked releases for a whole series, straight from a secondary id
    pub async fn releases_for_series(
        &self,
        secondary_id: &str,
    ) -> Result<Option<RankedReleaseSet>, FinderError> {
        self.aggregator.aggregate(Some(secondary_id), None).await
    }

    /// Ranked series releases for a catalogue id
    pub async fn releases_for_catalogue(
        &self,
        catalogue_id: &str,
    ) -> Result<Option<RankedReleaseSet>, FinderError> {
        let catalogue = catalogue_ref(catalogue_id)?;
        let secondary_id = self
            .mapper
            .resolve(&catalogue)
            .await
            .and_then(|mapping| mapping.secondary_id);

        match secondary_id {
            Some(id) => self.releases_for_series(&id).await,
            None => {
                info!(catalogue_id = %catalogue, "No secondary id for catalogue entry");
                Ok(None)
            }
        }
    }
}

fn catalogue_ref(input: &str) -> Result<CatalogueRef, FinderError> {
    parse_catalogue_ref(input)
        .ok_or_else(|| FinderError::InvalidArgument(format!("not a catalogue id or URL: {}", input)))
}
