//! Search-by-hash against the torrent index.

use crate::api::HttpClient;
use crate::extractor::{self, SearchPage};
use reqwest::Url;
use shared::{FinderError, ReleaseCandidate};
use tracing::debug;

/// Looks releases up on a Nyaa-compatible index
#[derive(Debug, Clone)]
pub struct SearchProvider {
    client: HttpClient,
    base_url: String,
}

impl SearchProvider {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Search for a content hash and extract the first matching release.
    ///
    /// An empty result listing is reported as `NotFound`.
    pub async fn release_for_hash(&self, info_hash: &str) -> Result<ReleaseCandidate, FinderError> {
        let search_url = self.search_url(info_hash)?;
        let body = self.client.get_text(search_url.as_str()).await?;

        match extractor::classify_search_page(&body) {
            SearchPage::Detail => extractor::extract(&body),
            SearchPage::FirstResult(href) => {
                let detail_url = search_url
                    .join(&href)
                    .map_err(|e| FinderError::malformed(format!("bad result link {}: {}", href, e)))?;
                debug!(info_hash = %info_hash, url = %detail_url, "Following first search result");
                self.release_at(detail_url.as_str()).await
            }
            SearchPage::NoResults => Err(FinderError::NotFound(format!(
                "no search results for {}",
                info_hash
            ))),
        }
    }

    /// Fetch one detail page and extract it
    pub async fn release_at(&self, url: &str) -> Result<ReleaseCandidate, FinderError> {
        let body = self.client.get_text(url).await?;
        extractor::extract(&body)
    }

    fn search_url(&self, info_hash: &str) -> Result<Url, FinderError> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&base, &[("q", info_hash)])
            .map_err(|e| FinderError::InvalidArgument(format!("search url {}: {}", base, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::config::HttpConfig;

    #[test]
    fn test_search_url() {
        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let provider = SearchProvider::new(client, "https://nyaa.si/");
        let url = provider.search_url("0123abcd").unwrap();
        assert_eq!(url.as_str(), "https://nyaa.si/?q=0123abcd");
        assert_eq!(
            url.join("/view/42").unwrap().as_str(),
            "https://nyaa.si/view/42"
        );
    }
}
