//! Integration tests for the resolution pipeline.
//!
//! Every external service is served by a local mock server; each service
//! lives under its own path prefix so one server covers the whole chain.

use release_finder::{
    FeedQuery, HttpClient, IdentifierMapper, ReleaseSelector, SearchProvider,
};
use serde_json::json;
use shared::{CatalogueRef, Config, FinderError};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let uri = server.uri();
    let mut config = Config::default();
    config.http.max_retries = 0;
    config.http.timeout_secs = 5;
    config.providers.ani_zip_url = format!("{}/anizip", uri);
    config.providers.zenshin_url = format!("{}/zenshin", uri);
    config.providers.find_my_anime_url = format!("{}/fma", uri);
    config.providers.feed_url = format!("{}/feed", uri);
    config.providers.search_url = format!("{}/nyaa", uri);
    config.providers.seadex_url = format!("{}/seadex", uri);
    config
}

fn detail_page(name: &str, seeders: &str) -> String {
    format!(
        r#"<html><head><title>{name} :: Nyaa</title></head><body>
<div class="panel-body">
  <div class="row">
    <div class="col-md-1">Seeders:</div>
    <div class="col-md-5"><span>{seeders}</span></div>
  </div>
</div>
<div class="panel-footer clearfix"><a href="magnet:?xt=urn:btih:{name}">Magnet</a></div>
</body></html>"#
    )
}

async fn mount_search(server: &MockServer, hash: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/nyaa/"))
        .and(query_param("q", hash))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_feed(server: &MockServer, key: &str, id: &str, entries: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/feed/json"))
        .and(query_param(key, id))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}

fn names(releases: &shared::RankedReleaseSet) -> Vec<&str> {
    releases.iter().map(|r| r.release_name.as_str()).collect()
}

#[tokio::test]
async fn test_mapper_falls_back_without_merging() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anizip/mappings"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zenshin/mappings"))
        .and(query_param("anilist_id", "9253"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mappings": {"anidb_id": 6873},
            "episodes": {
                "1": {"episode": "1", "anidbEid": 101, "title": {"en": "Turning Point"}},
                "2": {"episode": "2", "anidbEid": 102}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Would supply a different id; must never be asked
    Mock::given(method("GET"))
        .and(path("/fma/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"providerMapping": {"AniDB": 9999}}
        ])))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = HttpClient::new(&config.http).unwrap();
    let mapper = IdentifierMapper::from_config(&config.providers, &client);

    let mapping = mapper
        .resolve(&CatalogueRef::new("9253").unwrap())
        .await
        .unwrap();

    assert_eq!(mapping.provider, "zenshin");
    assert_eq!(mapping.secondary_id.as_deref(), Some("6873"));
    let episodes: Vec<_> = mapping
        .episodes
        .iter()
        .map(|e| (e.episode_number.as_str(), e.episode_sub_id.as_str()))
        .collect();
    assert_eq!(episodes, vec![("1", "101"), ("2", "102")]);
    assert!(mapping.episodes[1].title.is_none());
}

#[tokio::test]
async fn test_mapper_skips_provider_without_episode_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anizip/mappings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mappings": {"anidb_id": 6873}
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zenshin/mappings"))
        .and(query_param("anilist_id", "9253"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mappings": {"anidb_id": 6873},
            "episodes": {"1": {"episode": "1", "anidbEid": "E1"}}
        })))
        .mount(&server)
        .await;

    mount_feed(&server, "eid", "E1", json!([{"info_hash": "h9"}])).await;
    mount_search(&server, "h9", detail_page("ep1", "9")).await;

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();

    let mapping = selector.mapping("9253").await.unwrap().unwrap();
    assert_eq!(mapping.provider, "zenshin");
    assert_eq!(mapping.episodes.len(), 1);

    let releases = selector
        .best_release_for_episode("9253", "1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(names(&releases), vec!["ep1"]);
}

#[tokio::test]
async fn test_mapper_uses_last_resort_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anizip/mappings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zenshin/mappings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mappings": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fma/api"))
        .and(query_param("id", "9253"))
        .and(query_param("provider", "Anilist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"providerMapping": {"AniDB": "6873", "MyAnimeList": 9253}}
        ])))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let selector = ReleaseSelector::from_config(&config).unwrap();
    let mapping = selector
        .mapping("https://anilist.co/anime/9253/SteinsGate/")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(mapping.provider, "find_my_anime");
    assert_eq!(mapping.secondary_id.as_deref(), Some("6873"));
    assert!(mapping.episodes.is_empty());
}

#[tokio::test]
async fn test_mapper_exhausted_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();
    assert!(selector.mapping("9253").await.unwrap().is_none());
    assert!(selector
        .best_release_for_episode("9253", "1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_aggregator_filters_and_ranks_stably() {
    let server = MockServer::start().await;

    mount_feed(
        &server,
        "aid",
        "6873",
        json!([
            {"title": "a", "info_hash": "aaaa"},
            {"title": "no hash", "info_hash": null},
            {"title": "b", "info_hash": "bbbb"},
            {"title": "c", "info_hash": "cccc"},
            {"title": "d", "info_hash": "dddd"},
            {"title": "e", "info_hash": "eeee"},
            {"title": "f", "info_hash": "ffff"}
        ]),
    )
    .await;

    // The earlier tie answers last; ranking must still keep feed order
    Mock::given(method("GET"))
        .and(path("/nyaa/"))
        .and(query_param("q", "aaaa"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("first-five", "5"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    mount_search(&server, "bbbb", detail_page("dead", "0")).await;
    mount_search(&server, "cccc", detail_page("second-five", "5")).await;
    mount_search(&server, "dddd", "<p>no title here</p>".to_string()).await;
    mount_search(&server, "eeee", detail_page("popular", "10")).await;
    // ffff is not mounted: the search provider answers 404

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();

    let report = selector
        .aggregator()
        .aggregate_with_report(FeedQuery::Series("6873"))
        .await
        .unwrap();
    assert_eq!(report.feed_entries, 7);
    assert_eq!(report.missing_hash, 1);
    assert_eq!(report.extraction_failures, 2);
    assert_eq!(report.unseeded, 1);

    let releases = selector.releases_for_series("6873").await.unwrap().unwrap();
    assert_eq!(names(&releases), vec!["popular", "first-five", "second-five"]);
    assert!(releases.iter().all(|r| r.seeders().unwrap_or(0) > 0));
    assert_eq!(
        releases.best().unwrap().magnet_uri.as_deref(),
        Some("magnet:?xt=urn:btih:popular")
    );
}

#[tokio::test]
async fn test_aggregator_unseeded_only_is_none() {
    let server = MockServer::start().await;
    mount_feed(&server, "aid", "1", json!([{"info_hash": "zero"}])).await;
    mount_search(&server, "zero", detail_page("dead", "0")).await;

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();
    assert!(selector.releases_for_series("1").await.unwrap().is_none());

    let report = selector
        .aggregator()
        .aggregate_with_report(FeedQuery::Series("1"))
        .await
        .unwrap();
    assert_eq!(report.outcome(), release_finder::AggregateOutcome::AllUnseeded);
}

#[tokio::test]
async fn test_aggregator_rejects_bad_id_combinations() {
    let server = MockServer::start().await;
    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();

    let both = selector.aggregator().aggregate(Some("6873"), Some("101")).await;
    assert!(matches!(both, Err(FinderError::InvalidArgument(_))));

    let neither = selector.aggregator().aggregate(None, None).await;
    assert!(matches!(neither, Err(FinderError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_feed_failure_is_absence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();
    assert!(selector.releases_for_series("6873").await.unwrap().is_none());

    let err = selector
        .aggregator()
        .aggregate_with_report(FeedQuery::Series("6873"))
        .await
        .unwrap_err();
    assert!(matches!(err, FinderError::Network { .. }));
}

#[tokio::test]
async fn test_search_listing_follows_first_result() {
    let server = MockServer::start().await;

    let listing = r#"<html><head><title>Browse :: Nyaa</title></head><body>
<table class="table torrent-list"><tbody>
<tr><td colspan="2"><a href="/view/7#comments" class="comments">2</a><a href="/view/7">Hit</a></td></tr>
<tr><td colspan="2"><a href="/view/8">Other</a></td></tr>
</tbody></table></body></html>"#;
    mount_search(&server, "hash7", listing.to_string()).await;

    Mock::given(method("GET"))
        .and(path("/view/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("hit", "3")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let search = SearchProvider::new(
        HttpClient::new(&config.http).unwrap(),
        &config.providers.search_url,
    );

    let release = search.release_for_hash("hash7").await.unwrap();
    assert_eq!(release.release_name, "hit");
    assert_eq!(release.seeders(), Some(3));

    let empty = r#"<title>Browse :: Nyaa</title><table class="torrent-list"><tbody></tbody></table>"#;
    mount_search(&server, "nothing", empty.to_string()).await;
    let err = search.release_for_hash("nothing").await.unwrap_err();
    assert!(matches!(err, FinderError::NotFound(_)));
}

#[tokio::test]
async fn test_best_release_for_episode_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anizip/mappings"))
        .and(query_param("anilist_id", "9253"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mappings": {"anidb_id": "X"},
            "episodes": {"1": {"episode": "1", "anidbEid": "E1", "title": {"en": "Pilot"}}}
        })))
        .mount(&server)
        .await;

    // Only the episode-level feed for E1 may be queried, and only once
    Mock::given(method("GET"))
        .and(path("/feed/json"))
        .and(query_param("eid", "E1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"info_hash": "h1"},
            {"info_hash": "h2"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    mount_search(&server, "h1", detail_page("ep1-small", "4")).await;
    mount_search(&server, "h2", detail_page("ep1-big", "40")).await;

    let selector = ReleaseSelector::from_config(&config_for(&server)).unwrap();

    let releases = selector
        .best_release_for_episode("9253", "1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(names(&releases), vec!["ep1-big", "ep1-small"]);

    let missing = selector.best_release_for_episode("9253", "999").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.http.timeout_secs = 1;
    let client = HttpClient::new(&config.http).unwrap();

    let err = client
        .get_text(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FinderError::Timeout { .. }));
}

#[tokio::test]
async fn test_seadex_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seadex/api/collections/entries/records"))
        .and(query_param("filter", "alID=9253"))
        .and(query_param("expand", "trs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "comparison": "https://slow.pics/c/1",
                "notes": "",
                "theoreticalBest": "",
                "expand": {"trs": [{
                    "tracker": "Nyaa",
                    "releaseGroup": "Group",
                    "url": "https://nyaa.si/view/1",
                    "dualAudio": false,
                    "isBest": true,
                    "infoHash": "abc",
                    "files": [{"name": "01.mkv", "length": 524288000}]
                }]}
            }]
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let seadex = release_finder::SeadexClient::new(
        HttpClient::new(&config.http).unwrap(),
        &config.providers.seadex_url,
    );

    let entry = seadex
        .release_data(&CatalogueRef::new("9253").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.comparison, "https://slow.pics/c/1");
    assert_eq!(entry.releases.len(), 1);
    assert!(entry.releases[0].is_best);
    assert!(!entry.releases[0].private_tracker);
    assert_eq!(entry.releases[0].file_size, "500.0 MiB");

    let none = seadex
        .release_data(&CatalogueRef::new("1").unwrap())
        .await;
    // Unmatched filter answers 404, which surfaces as a network error
    assert!(matches!(none, Err(FinderError::Network { .. })));
}
