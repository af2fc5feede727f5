pub mod batching;
pub mod cron;
pub mod error_report;
pub mod hash;
pub mod http_client;
pub mod logging;
