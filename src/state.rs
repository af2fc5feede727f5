use std::sync::Arc;

use deadpool_redis::{Config as RedisConfig, Pool, Runtime};
use tracing::info;

use crate::config::AppConfig;
use crate::services::notifier::DiscordNotifier;
use crate::services::pipeline::{Pipeline, PipelineSettings};
use crate::services::pubg_client::PubgClient;
use crate::store::{KvStore, RedisStore};
use crate::utils::error_report::TracingErrorReporter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub redis_pool: Pool,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Connects to Redis and wires the pipeline to the live collaborators.
    pub async fn build(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let redis_cfg = RedisConfig::from_url(config.redis.url.as_str());
        let redis_pool = redis_cfg.create_pool(Some(Runtime::Tokio1))?;

        {
            let mut conn = redis_pool.get().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            info!("✅ Redis PING -> {}", pong);
        }

        let store: Arc<dyn KvStore> = Arc::new(RedisStore::new(redis_pool.clone()));
        let pipeline = Pipeline::new(
            Arc::new(PubgClient::new(&config.pubg, store.clone())),
            store,
            Arc::new(DiscordNotifier::new(&config.discord)),
            Arc::new(TracingErrorReporter),
            PipelineSettings::from_config(&config),
        );

        Ok(Arc::new(AppState {
            config: Arc::new(config),
            redis_pool,
            pipeline,
        }))
    }
}
