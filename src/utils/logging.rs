use std::fs;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{filter::Targets, fmt, fmt::time::UtcTime, prelude::*, EnvFilter};

/// Keeps the background log writers alive. Drop it last.
pub struct LogGuards {
    _normal: WorkerGuard,
    _perf: WorkerGuard,
    _cron: WorkerGuard,
}

fn rolling_writer(
    dir: &str,
    file_name: String,
) -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir)?;
    Ok(tracing_appender::non_blocking(rolling::daily(dir, file_name)))
}

pub fn setup_logging(log_dir: &str, svc: &str) -> anyhow::Result<LogGuards> {
    // -----------------------
    // Normal Logs
    // -----------------------
    let (normal_writer, normal_guard) =
        rolling_writer(&format!("{}/{}", log_dir, svc), format!("{}.log", svc))?;

    let normal_layer = fmt::layer()
        .with_writer(normal_writer)
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_thread_ids(false)
        .with_filter(EnvFilter::new("info"));

    // -----------------------
    // Performance Logs
    // -----------------------
    let (perf_writer, perf_guard) =
        rolling_writer(&format!("{}/perf", log_dir), format!("{}_perf.log", svc))?;

    let perf_layer = fmt::layer()
        .with_writer(perf_writer)
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_filter(Targets::new().with_target("perf", tracing::Level::INFO));

    // -----------------------
    // Cron Logs (pipeline runs and error reports)
    // -----------------------
    let (cron_writer, cron_guard) =
        rolling_writer(&format!("{}/cron", log_dir), format!("{}_cron.log", svc))?;

    let cron_layer = fmt::layer()
        .with_writer(cron_writer)
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_thread_ids(false)
        .with_filter(
            Targets::new()
                .with_target("cron", tracing::Level::INFO)
                .with_target("error_report", tracing::Level::ERROR),
        );

    // -----------------------
    // Console Layer
    // -----------------------
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .compact()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_thread_ids(false)
        .with_filter(console_filter);

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(normal_layer)
            .with(perf_layer)
            .with(cron_layer)
            .with(console_layer),
    )?;

    Ok(LogGuards {
        _normal: normal_guard,
        _perf: perf_guard,
        _cron: cron_guard,
    })
}
