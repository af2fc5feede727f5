use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    pub address: String,
    pub port: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub x_api_key: String,
}

/// At most `calls` upstream requests in any `period_secs` window. Calls are
/// spaced `period_secs / calls` apart; there is no initial burst.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub calls: u32,
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Free tier of the PUBG developer API.
        Self {
            calls: 10,
            period_secs: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PubgConfig {
    #[serde(default = "default_pubg_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub shard: String,
    pub players: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default = "default_two_weeks_secs")]
    pub match_cache_ttl_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_allowed_match_types")]
    pub allowed_match_types: Vec<String>,
    #[serde(default = "default_lock_key")]
    pub lock_key: String,
    #[serde(default = "default_processed_key")]
    pub processed_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            allowed_match_types: default_allowed_match_types(),
            lock_key: default_lock_key(),
            processed_key: default_processed_key(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiscordConfig {
    #[serde(default = "default_discord_base_url")]
    pub base_url: String,
    pub bot_token: String,
    pub channel_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CronConfig {
    #[serde(default)]
    pub enabled: bool,
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub debug: bool,
    pub http: HttpConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub pubg: PubgConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub discord: DiscordConfig,
    pub cron: CronConfig,
}

impl AppConfig {
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(config_path))
            .build()?
            .try_deserialize()
    }
}

fn default_pubg_base_url() -> String {
    "https://api.pubg.com/".to_string()
}

fn default_discord_base_url() -> String {
    "https://discord.com/api".to_string()
}

fn default_two_weeks_secs() -> u64 {
    60 * 60 * 24 * 14
}

fn default_retention_days() -> i64 {
    14
}

fn default_allowed_match_types() -> Vec<String> {
    vec!["official".to_string(), "competitive".to_string()]
}

fn default_lock_key() -> String {
    "pubg_watch.lock".to_string()
}

fn default_processed_key() -> String {
    "pubg_watch.processed_matches".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [http]
        address = "0.0.0.0"
        port = "8080"

        [redis]
        url = "redis://127.0.0.1/"

        [auth]
        x_api_key = "secret"

        [pubg]
        shard = "steam"
        players = ["shroud", "chocoTaco"]

        [discord]
        bot_token = "bot"
        channel_id = "42"

        [cron]
        seconds = 300
    "#;

    #[test]
    fn fills_defaults_for_omitted_sections() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.pubg.base_url, "https://api.pubg.com/");
        assert_eq!(config.pubg.api_key, None);
        assert_eq!(config.pubg.rate_limit.calls, 10);
        assert_eq!(config.pubg.rate_limit.period_secs, 60);
        assert_eq!(config.pubg.match_cache_ttl_secs, 1_209_600);
        assert_eq!(config.pipeline.retention_days, 14);
        assert_eq!(
            config.pipeline.allowed_match_types,
            vec!["official", "competitive"]
        );
        assert_eq!(config.pipeline.lock_key, "pubg_watch.lock");
        assert!(!config.cron.enabled);
    }
}
