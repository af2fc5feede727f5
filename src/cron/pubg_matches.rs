use std::sync::Arc;

use tracing::info;

use crate::models::runs::RunOutcome;
use crate::state::AppState;

pub async fn run(state: Arc<AppState>) {
    info!(target: "cron", "╔════════════════════════════════════════════╗");
    info!(target: "cron", "║   🔄 Starting PUBG matches cron.           ║");
    info!(target: "cron", "╚════════════════════════════════════════════╝");

    // Failures are logged and reported inside the pipeline.
    if let Ok(outcome) = state.pipeline.run().await {
        match outcome {
            RunOutcome::LockContended => {
                info!(target: "cron", "⏭️ PUBG matches cron skipped, previous run still active");
            }
            RunOutcome::Bootstrapped { marked } => {
                info!(target: "cron", "🌱 PUBG matches cron bootstrapped {} matches", marked);
            }
            RunOutcome::Completed(stats) => {
                info!(
                    target: "cron",
                    "✅ PUBG matches cron completed: {} new, {} announced, {} skipped, {} pruned",
                    stats.candidates,
                    stats.notified,
                    stats.skipped,
                    stats.pruned
                );
            }
        }
    }
}
