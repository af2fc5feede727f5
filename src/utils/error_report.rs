use std::error::Error;

use tracing::error;
use uuid::Uuid;

/// Destination for failures an operator has to look at.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, run_id: Uuid, error: &(dyn Error + 'static));
}

/// Emits reports as `error_report` events, picked up by the JSON log files.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, run_id: Uuid, error: &(dyn Error + 'static)) {
        error!(
            target: "error_report",
            run_id = %run_id,
            error = %error_chain(error),
            "💥 Pipeline failure"
        );
    }
}

/// `outer: cause: root cause`
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn chain_walks_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));

        assert_eq!(error_chain(&err), "outer: disk gone");
    }
}
