//! One pipeline run: lock, list, diff, fetch, classify, announce, persist.
//!
//! The processed-match map in the store is the only memory between runs.
//! A match enters it once it has been handled (announced, filtered out,
//! graded below the notification tiers, or rejected as malformed) and leaves
//! it when it ages past the retention window. The retention window has to be
//! at least as long as the upstream keeps listing a match, otherwise a pruned
//! match can come back as new.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinError;
use tracing::{error, event, info, warn, Level};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::pubg::{MatchDetail, MatchId, ValidationError};
use crate::models::runs::{RunOutcome, RunStats};
use crate::services::announcement::build_announcement;
use crate::services::classifier::{classify, is_allowed_match_type};
use crate::services::notifier::Notifier;
use crate::services::pubg_client::{MatchSource, PubgError};
use crate::store::{KvStore, ProcessedMatches, RunLock, StoreError};
use crate::utils::error_report::{error_chain, ErrorReporter};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub shard: String,
    pub players: Vec<String>,
    pub allowed_match_types: Vec<String>,
    pub retention: Duration,
    pub lock_key: String,
    pub processed_key: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            shard: config.pubg.shard.clone(),
            players: config.pubg.players.clone(),
            allowed_match_types: config.pipeline.allowed_match_types.clone(),
            retention: Duration::days(config.pipeline.retention_days),
            lock_key: config.pipeline.lock_key.clone(),
            processed_key: config.pipeline.processed_key.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upstream request failed")]
    Upstream(#[from] PubgError),
    #[error("state store failed")]
    Store(#[from] StoreError),
    #[error("pipeline run panicked: {0}")]
    Panicked(String),
    #[error("pipeline run was cancelled")]
    Cancelled,
}

enum MatchDisposition {
    Notified,
    BelowTiers,
    Filtered,
}

enum MatchFailure {
    Invalid(ValidationError),
    Publish(anyhow::Error),
}

enum MatchStep {
    /// The detail document could not be turned into a match.
    Malformed(ValidationError),
    Handled(MatchDisposition),
    Rejected(ValidationError),
    PublishFailed(anyhow::Error),
}

fn join_failure(join_error: JoinError) -> PipelineError {
    if !join_error.is_panic() {
        return PipelineError::Cancelled;
    }
    let payload = join_error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    PipelineError::Panicked(message)
}

#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn MatchSource>,
    store: Arc<dyn KvStore>,
    notifier: Arc<dyn Notifier>,
    reporter: Arc<dyn ErrorReporter>,
    settings: Arc<PipelineSettings>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn MatchSource>,
        store: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
        reporter: Arc<dyn ErrorReporter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            reporter,
            settings: Arc::new(settings),
        }
    }

    pub fn lock(&self) -> RunLock {
        RunLock::new(self.store.clone(), self.settings.lock_key.clone())
    }

    pub async fn clear_lock(&self) -> Result<(), StoreError> {
        warn!(target: "cron", key = %self.settings.lock_key, "🔓 Force-clearing run lock");
        self.lock().force_clear().await
    }

    pub async fn clear_processed(&self) -> Result<(), StoreError> {
        warn!(target: "cron", key = %self.settings.processed_key, "🧹 Force-clearing processed matches");
        ProcessedMatches::force_clear(self.store.as_ref(), &self.settings.processed_key).await
    }

    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// Runs the pipeline as of `now`. Every failure is logged and reported
    /// here, once, and the lock is released whatever happened in between.
    ///
    /// The run lives in its own task from lock acquisition to release.
    /// Dropping the returned future detaches that task; it still finishes
    /// and the lock stays held until it does.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::new_v4();

        let run = tokio::spawn({
            let pipeline = self.clone();
            async move { pipeline.locked_run(run_id, now).await }
        });

        match run.await {
            Ok(result) => result,
            Err(join_error) => Err(self.fail(run_id, join_failure(join_error))),
        }
    }

    async fn locked_run(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let started = Instant::now();

        let guard = match self.lock().acquire().await {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                info!(target: "cron", run_id = %run_id, "⏭️ Another run holds the lock, skipping");
                return Ok(RunOutcome::LockContended);
            }
            Err(e) => return Err(self.fail(run_id, PipelineError::Store(e))),
        };

        let body = tokio::spawn({
            let pipeline = self.clone();
            async move { pipeline.execute(run_id, now).await }
        });

        let mut result = match body.await {
            Ok(result) => result,
            Err(join_error) => Err(join_failure(join_error)),
        };

        if let Err(release_error) = guard.release().await {
            let release_error = PipelineError::Store(release_error);
            if result.is_ok() {
                result = Err(release_error);
            } else {
                error!(target: "cron", run_id = %run_id, "❌ Failed to release run lock: {}", error_chain(&release_error));
                self.reporter.report(run_id, &release_error);
            }
        }

        event!(
            target: "perf",
            Level::INFO,
            run_id = %run_id,
            duration_ms = %started.elapsed().as_millis(),
            ok = result.is_ok(),
            "Pipeline timing"
        );

        match result {
            Ok(outcome) => {
                info!(target: "cron", run_id = %run_id, outcome = ?outcome, "✅ Pipeline run finished");
                Ok(outcome)
            }
            Err(e) => Err(self.fail(run_id, e)),
        }
    }

    fn fail(&self, run_id: Uuid, error: PipelineError) -> PipelineError {
        error!(target: "cron", run_id = %run_id, "❌ Pipeline run failed: {}", error_chain(&error));
        self.reporter.report(run_id, &error);
        error
    }

    async fn execute(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let settings = &self.settings;
        let mut processed =
            ProcessedMatches::load(self.store.as_ref(), &settings.processed_key).await?;

        let listing = self
            .source
            .list_matches(&settings.shard, &settings.players)
            .await?;

        info!(
            target: "cron",
            run_id = %run_id,
            players = listing.players.len(),
            listed = listing.match_ids.len(),
            known = processed.len(),
            "📋 Listed roster matches"
        );

        if processed.is_empty() {
            let marked = listing.match_ids.len();
            for match_id in listing.match_ids {
                processed.mark(match_id, now);
            }
            processed.prune(now, settings.retention);
            processed
                .save(self.store.as_ref(), &settings.processed_key)
                .await?;
            info!(target: "cron", run_id = %run_id, marked, "🌱 Empty processed set, recorded current matches without announcing");
            return Ok(RunOutcome::Bootstrapped { marked });
        }

        let candidates: Vec<MatchId> = listing
            .match_ids
            .into_iter()
            .filter(|id| !processed.contains(id))
            .collect();
        let tracked: Arc<HashSet<String>> = Arc::new(
            listing
                .players
                .into_iter()
                .map(|p| p.account_id)
                .collect(),
        );

        let mut stats = RunStats {
            candidates: candidates.len(),
            ..RunStats::default()
        };
        let mut handled: Vec<MatchId> = Vec::with_capacity(candidates.len());
        let mut aborted: Option<PipelineError> = None;

        for match_id in candidates {
            // One task per match so a panic loses that match only.
            let step = tokio::spawn({
                let pipeline = self.clone();
                let tracked = tracked.clone();
                let match_id = match_id.clone();
                async move { pipeline.process_match(run_id, &match_id, &tracked).await }
            });

            let step = match step.await {
                Ok(Ok(step)) => step,
                Ok(Err(e)) => {
                    aborted = Some(PipelineError::Upstream(e));
                    break;
                }
                Err(join_error) => {
                    aborted = Some(join_failure(join_error));
                    break;
                }
            };

            match step {
                MatchStep::Malformed(e) => {
                    warn!(target: "cron", run_id = %run_id, match_id = %match_id, "⚠️ Skipping malformed match: {}", e);
                    stats.skipped += 1;
                    handled.push(match_id);
                }
                MatchStep::Handled(disposition) => {
                    stats.fetched += 1;
                    match disposition {
                        MatchDisposition::Notified => stats.notified += 1,
                        MatchDisposition::Filtered => stats.filtered += 1,
                        MatchDisposition::BelowTiers => {}
                    }
                    handled.push(match_id);
                }
                MatchStep::Rejected(e) => {
                    warn!(target: "cron", run_id = %run_id, match_id = %match_id, "⚠️ Skipping match: {}", e);
                    stats.fetched += 1;
                    stats.skipped += 1;
                    handled.push(match_id);
                }
                MatchStep::PublishFailed(e) => {
                    error!(target: "cron", run_id = %run_id, match_id = %match_id, "❌ Failed to publish announcement: {:#}", e);
                    self.reporter.report(run_id, &*e);
                    stats.fetched += 1;
                    stats.skipped += 1;
                }
            }
        }

        for match_id in handled {
            processed.mark(match_id, now);
        }
        stats.pruned = processed.prune(now, settings.retention);
        processed
            .save(self.store.as_ref(), &settings.processed_key)
            .await?;

        if let Some(e) = aborted {
            return Err(e);
        }

        Ok(RunOutcome::Completed(stats))
    }

    /// Fetches and handles one match. Only upstream failures are errors; they
    /// abort the rest of the run.
    async fn process_match(
        &self,
        run_id: Uuid,
        match_id: &str,
        tracked: &HashSet<String>,
    ) -> Result<MatchStep, PubgError> {
        let detail = match self
            .source
            .fetch_match_detail(&self.settings.shard, match_id)
            .await
        {
            Ok(detail) => detail,
            Err(PubgError::Invalid(e)) => return Ok(MatchStep::Malformed(e)),
            Err(e) => return Err(e),
        };

        Ok(match self.handle_match(run_id, &detail, tracked).await {
            Ok(disposition) => MatchStep::Handled(disposition),
            Err(MatchFailure::Invalid(e)) => MatchStep::Rejected(e),
            Err(MatchFailure::Publish(e)) => MatchStep::PublishFailed(e),
        })
    }

    async fn handle_match(
        &self,
        run_id: Uuid,
        detail: &MatchDetail,
        tracked: &HashSet<String>,
    ) -> Result<MatchDisposition, MatchFailure> {
        if !is_allowed_match_type(detail, &self.settings.allowed_match_types) {
            info!(
                target: "cron",
                run_id = %run_id,
                match_id = %detail.id,
                match_type = %detail.match_type_id,
                "🚫 Match type not announced"
            );
            return Ok(MatchDisposition::Filtered);
        }

        let classification = classify(detail, tracked).map_err(MatchFailure::Invalid)?;
        if !classification.tier.is_notifiable() {
            info!(
                target: "cron",
                run_id = %run_id,
                match_id = %detail.id,
                rank = classification.rank,
                teams = classification.team_count,
                "Placement below announced tiers"
            );
            return Ok(MatchDisposition::BelowTiers);
        }

        let announcement = {
            let mut rng = rand::thread_rng();
            build_announcement(detail, &classification, &mut rng)
        };

        self.notifier
            .publish(&announcement)
            .await
            .map_err(MatchFailure::Publish)?;

        info!(
            target: "cron",
            run_id = %run_id,
            match_id = %detail.id,
            tier = ?classification.tier,
            rank = classification.rank,
            teams = classification.team_count,
            "📣 Announced match"
        );

        Ok(MatchDisposition::Notified)
    }
}
