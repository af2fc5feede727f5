use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::info;

use crate::config::DiscordConfig;
use crate::services::announcement::Announcement;
use crate::utils::http_client::post_json;

/// Sink for match announcements. The pipeline calls it at most once per
/// match; delivery failures surface as errors and the match is retried on
/// the next run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, announcement: &Announcement) -> anyhow::Result<()>;
}

pub struct DiscordNotifier {
    http: Client,
    base_url: String,
    bot_token: String,
    channel_id: String,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn publish(&self, announcement: &Announcement) -> anyhow::Result<()> {
        let url = format!("{}/channels/{}/messages", self.base_url, self.channel_id);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bot {}", self.bot_token))?,
        );

        info!(
            match_id = %announcement.match_id,
            tier = ?announcement.tier,
            "📤 Publishing match announcement"
        );

        post_json(
            &self.http,
            &url,
            &announcement.to_discord_payload(),
            Some(headers),
        )
        .await?;

        Ok(())
    }
}
