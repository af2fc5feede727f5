use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Another run holds the lock. Nothing was read or written.
    LockContended,
    /// First run over an empty processed set: every listed match was recorded
    /// and nothing was announced.
    Bootstrapped { marked: usize },
    Completed(RunStats),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub candidates: usize,
    pub fetched: usize,
    pub notified: usize,
    pub filtered: usize,
    pub skipped: usize,
    pub pruned: usize,
}
