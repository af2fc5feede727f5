use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::state::AppState;
use crate::utils::cron::build_cron_expr;

pub mod pubg_matches;

/// In-process trigger for deployments without an external scheduler.
pub async fn start_cron_jobs(state: Arc<AppState>) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let (desc, cron_expr) = build_cron_expr(state.config.cron.seconds);

    tracing::info!(
        "📅 Scheduling pubg_matches cron: {} → {}",
        desc,
        cron_expr
    );

    scheduler
        .add(Job::new_async(cron_expr.as_str(), {
            let state = state.clone();
            move |_uuid, _l| {
                let state = state.clone();
                Box::pin(async move {
                    pubg_matches::run(state).await;
                })
            }
        })?)
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}
