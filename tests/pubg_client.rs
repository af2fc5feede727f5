//! Integration tests for the PUBG API client using wiremock mock servers.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pubg_watch::config::{PubgConfig, RateLimitConfig};
use pubg_watch::services::pubg_client::{MatchSource, PubgClient, PubgError};
use pubg_watch::store::MemoryStore;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn config(server: &MockServer, api_key: Option<&str>) -> PubgConfig {
    PubgConfig {
        base_url: server.uri(),
        api_key: api_key.map(String::from),
        shard: "steam".into(),
        players: vec!["alice".into(), "bob".into()],
        rate_limit: RateLimitConfig {
            calls: 100,
            period_secs: 1,
        },
        match_cache_ttl_secs: 3600,
    }
}

fn client(server: &MockServer, api_key: Option<&str>) -> (PubgClient, Arc<MemoryStore>) {
    let cache = Arc::new(MemoryStore::new());
    (PubgClient::new(&config(server, api_key), cache.clone()), cache)
}

fn player(account_id: &str, name: &str, matches: &[&str]) -> Value {
    let refs: Vec<Value> = matches
        .iter()
        .map(|id| json!({ "type": "match", "id": id }))
        .collect();
    json!({
        "type": "player",
        "id": account_id,
        "attributes": { "name": name, "shardId": "steam" },
        "relationships": {
            "assets": { "data": [] },
            "matches": { "data": refs }
        }
    })
}

fn match_document(id: &str) -> Value {
    json!({
        "data": {
            "type": "match",
            "id": id,
            "attributes": {
                "mapName": "Savage_Main",
                "gameMode": "duo",
                "matchType": "official",
                "duration": 1432,
                "createdAt": "2024-05-19T21:04:11Z"
            },
            "relationships": { "rosters": { "data": [{ "type": "roster", "id": "r-1" }] } }
        },
        "included": [
            {
                "type": "roster",
                "id": "r-1",
                "attributes": { "stats": { "rank": 1, "teamId": 3 }, "won": "true" },
                "relationships": {
                    "participants": { "data": [{ "type": "participant", "id": "p-1" }] }
                }
            },
            {
                "type": "participant",
                "id": "p-1",
                "attributes": {
                    "shardId": "steam",
                    "stats": {
                        "name": "alice",
                        "playerId": "account.alice",
                        "kills": 7,
                        "assists": 0,
                        "damageDealt": 801.25
                    }
                }
            }
        ]
    })
}

// ============================================================================
// TEST: LIST MATCHES
// ============================================================================

/// Scenario:
/// - players endpoint returns two players sharing one match
/// - listing keeps API order and drops the duplicate
#[tokio::test]
async fn test_list_matches_dedups_across_players() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shards/steam/players"))
        .and(query_param("filter[playerNames]", "alice,bob"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/vnd.api+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                player("account.alice", "alice", &["m-1", "m-2"]),
                player("account.bob", "bob", &["m-2", "m-3"])
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("test-token"));
    let names = vec!["alice".to_string(), "bob".to_string()];

    let listing = client.list_matches("steam", &names).await.unwrap();

    assert_eq!(listing.match_ids, vec!["m-1", "m-2", "m-3"]);
    let accounts: Vec<_> = listing.players.iter().map(|p| p.account_id.as_str()).collect();
    assert_eq!(accounts, vec!["account.alice", "account.bob"]);
    assert_eq!(listing.players[1].name, "bob");
}

#[tokio::test]
async fn test_list_matches_requires_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client(&server, None);

    let err = client
        .list_matches("steam", &["alice".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, PubgError::MissingToken(ref url) if url.ends_with("/shards/steam/players")));
}

#[tokio::test]
async fn test_api_error_carries_details() {
    let server = MockServer::start().await;

    let body = json!({
        "errors": [
            { "title": "Not Found", "detail": "No Players Found Matching Criteria" }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/shards/steam/players"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(body.to_string(), "application/vnd.api+json"),
        )
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("test-token"));

    let err = client
        .list_matches("steam", &["ghost".to_string()])
        .await
        .unwrap_err();

    match err {
        PubgError::Api { status, errors } => {
            assert_eq!(status, 404);
            assert_eq!(errors, vec!["No Players Found Matching Criteria"]);
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_is_kept_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_raw("Bad Gateway", "text/html"))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("test-token"));

    let err = client
        .list_matches("steam", &["alice".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, PubgError::Http { status: 502, ref body } if body == "Bad Gateway"));
}

// ============================================================================
// TEST: MATCH DETAIL
// ============================================================================

/// Scenario:
/// - match endpoint is mocked exactly once
/// - two fetches return the same detail, the second from cache
#[tokio::test]
async fn test_match_detail_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shards/steam/matches/m-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_document("m-1")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, cache) = client(&server, None);

    let first = client.fetch_match_detail("steam", "m-1").await.unwrap();
    let second = client.fetch_match_detail("steam", "m-1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.map_id, "Savage_Main");
    assert_eq!(first.rosters[0].rank, 1);
    assert_eq!(first.participants[0].kills, 7);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_failed_match_fetch_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shards/steam/matches/m-1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "errors": [{ "title": "Too Many Requests" }]
        })))
        .mount(&server)
        .await;

    let (client, cache) = client(&server, Some("test-token"));

    let err = client.fetch_match_detail("steam", "m-1").await.unwrap_err();

    assert!(matches!(err, PubgError::Api { status: 429, ref errors } if errors == &vec!["Too Many Requests".to_string()]));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_malformed_match_is_a_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shards/steam/matches/m-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "type": "match", "id": "m-9", "attributes": { "gameMode": "solo" } }
        })))
        .mount(&server)
        .await;

    let (client, _) = client(&server, None);

    let err = client.fetch_match_detail("steam", "m-9").await.unwrap_err();

    assert!(matches!(err, PubgError::Invalid(_)), "got {err:?}");
}
