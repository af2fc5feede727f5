//! Rate-limited client for the PUBG developer API.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState, state::NotKeyed, Quota,
    RateLimiter,
};
use reqwest::{header, Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{PubgConfig, RateLimitConfig};
use crate::models::pubg::{
    Document, ErrorDocument, MatchDetail, Resource, RosterMatches, TrackedPlayer, ValidationError,
};
use crate::store::{get_json, set_json, KvStore};
use crate::utils::batching::chunk_vec;
use crate::utils::hash::request_cache_key;

/// The players endpoint accepts at most this many names per request.
const PLAYERS_PER_REQUEST: usize = 10;

type PubgRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

#[derive(Debug, thiserror::Error)]
pub enum PubgError {
    #[error("PUBG API responded {status}: {}", .errors.join("; "))]
    Api { status: u16, errors: Vec<String> },
    #[error("PUBG API responded {status} without an error document: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} requires authentication but no API key is configured")]
    MissingToken(String),
    #[error("a non-empty list of player names or ids is required")]
    EmptyPlayerFilter,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Upstream operations the pipeline depends on.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Always live: roster membership of recent matches keeps changing.
    async fn list_matches(
        &self,
        shard: &str,
        player_names: &[String],
    ) -> Result<RosterMatches, PubgError>;

    async fn fetch_match_detail(
        &self,
        shard: &str,
        match_id: &str,
    ) -> Result<MatchDetail, PubgError>;
}

pub enum PlayerFilter<'a> {
    Names(&'a [String]),
    Ids(&'a [String]),
}

impl PlayerFilter<'_> {
    fn query(&self) -> Result<(&'static str, String), PubgError> {
        let (name, values) = match self {
            PlayerFilter::Names(names) => ("filter[playerNames]", names),
            PlayerFilter::Ids(ids) => ("filter[playerIds]", ids),
        };
        if values.is_empty() {
            return Err(PubgError::EmptyPlayerFilter);
        }
        Ok((name, values.join(",")))
    }
}

pub struct PubgClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<PubgRateLimiter>,
    cache: Arc<dyn KvStore>,
    match_cache_ttl_secs: u64,
}

/// Spaces calls evenly at `period / calls` with no burst, so no window of
/// `period` ever sees more than `calls` requests.
fn quota(limit: &RateLimitConfig) -> Quota {
    let calls = NonZeroU32::new(limit.calls.max(1)).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_secs(limit.period_secs.max(1)) / calls.get();
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(calls))
        .allow_burst(NonZeroU32::MIN)
}

impl PubgClient {
    pub fn new(config: &PubgConfig, cache: Arc<dyn KvStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            limiter: Arc::new(RateLimiter::direct(quota(&config.rate_limit))),
            cache,
            match_cache_ttl_secs: config.match_cache_ttl_secs,
        }
    }

    pub async fn get_players(
        &self,
        shard: &str,
        filter: PlayerFilter<'_>,
    ) -> Result<Document<Vec<Resource>>, PubgError> {
        let (name, value) = filter.query()?;
        let url = format!("shards/{}/players", shard);
        let body = self.call(&url, &[(name, value)], true, None).await?;
        decode(&url, body)
    }

    /// Finished matches never change, so their documents are cached.
    pub async fn get_match(
        &self,
        shard: &str,
        match_id: &str,
    ) -> Result<Document<Resource>, PubgError> {
        let url = format!("shards/{}/matches/{}", shard, match_id);
        let body = self
            .call(&url, &[], false, Some(self.match_cache_ttl_secs))
            .await?;
        decode(&url, body)
    }

    async fn call(
        &self,
        resource: &str,
        params: &[(&str, String)],
        needs_auth: bool,
        cache_ttl_secs: Option<u64>,
    ) -> Result<Value, PubgError> {
        let url = format!("{}/{}", self.base_url, resource);

        let mut request = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/vnd.api+json")
            .query(params);

        match &self.api_key {
            Some(key) => request = request.bearer_auth(key),
            None if needs_auth => return Err(PubgError::MissingToken(url)),
            None => {}
        }

        let request = request.build()?;
        let cache_key = cache_ttl_secs
            .filter(|ttl| *ttl > 0)
            .map(|ttl| (request_cache_key("GET", request.url().as_str()), ttl));

        if let Some((key, _)) = &cache_key {
            match get_json::<Value>(self.cache.as_ref(), key).await {
                Ok(Some(cached)) => {
                    debug!("Cache hit for {}", url);
                    return Ok(cached);
                }
                Ok(None) => {}
                Err(e) => warn!("⚠️ Ignoring unreadable cache entry for {}: {}", url, e),
            }
        }

        self.limiter.until_ready().await;

        info!("Sending GET request to {}", url);
        let response = self.http.execute(request).await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|source| PubgError::Decode {
            url: url.clone(),
            source,
        })?;

        if let Some((key, ttl)) = &cache_key {
            if let Err(e) = set_json(self.cache.as_ref(), key, &body, *ttl).await {
                warn!("⚠️ Failed to cache response for {}: {}", url, e);
            }
        }

        Ok(body)
    }
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, body: Value) -> Result<T, PubgError> {
    serde_json::from_value(body).map_err(|source| PubgError::Decode {
        url: url.to_string(),
        source,
    })
}

async fn error_from_response(response: Response) -> PubgError {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return PubgError::Transport(e),
    };

    if is_json {
        if let Ok(document) = serde_json::from_str::<ErrorDocument>(&body) {
            return PubgError::Api {
                status,
                errors: document.errors.iter().map(|e| e.message()).collect(),
            };
        }
    }

    PubgError::Http { status, body }
}

#[async_trait]
impl MatchSource for PubgClient {
    async fn list_matches(
        &self,
        shard: &str,
        player_names: &[String],
    ) -> Result<RosterMatches, PubgError> {
        let mut listing = RosterMatches::default();
        let mut seen = HashSet::new();

        for names in chunk_vec(player_names, PLAYERS_PER_REQUEST) {
            let document = self.get_players(shard, PlayerFilter::Names(&names)).await?;

            for player in document.data {
                let name = player
                    .attributes
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&player.id)
                    .to_string();

                for match_id in player.related_ids("matches") {
                    if seen.insert(match_id.clone()) {
                        listing.match_ids.push(match_id);
                    }
                }

                listing.players.push(TrackedPlayer {
                    account_id: player.id,
                    name,
                });
            }
        }

        Ok(listing)
    }

    async fn fetch_match_detail(
        &self,
        shard: &str,
        match_id: &str,
    ) -> Result<MatchDetail, PubgError> {
        let document = self.get_match(shard, match_id).await.map_err(|e| match e {
            PubgError::Decode { source, .. } => PubgError::Invalid(ValidationError::Malformed {
                match_id: match_id.to_string(),
                kind: "document",
                id: match_id.to_string(),
                reason: source.to_string(),
            }),
            other => other,
        })?;

        Ok(MatchDetail::try_from(document)?)
    }
}
