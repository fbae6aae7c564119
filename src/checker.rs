//! Dead queue classification and the end-to-end check run

use crate::config::Config;
use crate::errors::{root_cause, Result};
use crate::outcome::CheckOutcome;
use crate::silence::{is_silenced, Clock};
use crate::stats::{StatsFetcher, StatsSnapshot};
use tracing::{debug, info, instrument, warn};

/// Maps a stats snapshot onto a check outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueHealthChecker;

impl QueueHealthChecker {
    pub fn classify(&self, snapshot: &StatsSnapshot) -> CheckOutcome {
        match snapshot.dead {
            0 => CheckOutcome::ok("dead queue is empty"),
            n => {
                let entry_or_entries = if n > 1 { "entries" } else { "entry" };
                CheckOutcome::critical(format!("dead queue not empty ({} {})", n, entry_or_entries))
            }
        }
    }

    /// Classify a fetch result, turning any failure into UNKNOWN
    pub fn classify_result(&self, url: &str, result: Result<StatsSnapshot>) -> CheckOutcome {
        match result {
            Ok(snapshot) => self.classify(&snapshot),
            Err(e) => {
                let detail = match root_cause(&e) {
                    Some(cause) => format!("{}: {}", e, cause),
                    None => e.to_string(),
                };
                CheckOutcome::unknown(format!(
                    "Could not load Sidekiq stats from {}. Error: {}",
                    url, detail
                ))
            }
        }
    }
}

/// One invocation of the check: silence evaluation, fetch, classification
pub struct DeadQueueCheck {
    config: Config,
    fetcher: Box<dyn StatsFetcher>,
    clock: Box<dyn Clock>,
    checker: QueueHealthChecker,
}

impl DeadQueueCheck {
    pub fn new(config: Config, fetcher: Box<dyn StatsFetcher>, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            fetcher,
            clock,
            checker: QueueHealthChecker,
        }
    }

    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn run(&self) -> CheckOutcome {
        let now = self.clock.now();

        if let Some(reason) = is_silenced(now, &self.config) {
            info!("Check silenced at {} ({})", now, reason);
            return CheckOutcome::ok(reason.message());
        }

        let result = self.load_stats().await;
        if let Err(e) = &result {
            warn!("Failed to load stats: {}", e);
        }

        let outcome = self.checker.classify_result(&self.config.url, result);
        debug!("Check finished with {}", outcome.severity);
        outcome
    }

    async fn load_stats(&self) -> Result<StatsSnapshot> {
        let body = self
            .fetcher
            .fetch(&self.config.url, self.config.auth.as_ref())
            .await?;
        let snapshot = StatsSnapshot::from_slice(&body)?;

        debug!(
            "Sidekiq stats - dead: {}, retries: {:?}, enqueued: {:?}, busy: {:?}",
            snapshot.dead, snapshot.retries, snapshot.enqueued, snapshot.busy
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::errors::CheckError;
    use crate::outcome::Severity;
    use crate::silence::FixedClock;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubFetcher {
        body: std::result::Result<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StatsFetcher for StubFetcher {
        async fn fetch(&self, _url: &str, _auth: Option<&Credentials>) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.body {
                Ok(body) => Ok(body.as_bytes().to_vec()),
                Err(msg) => Err(CheckError::Config(msg.to_string())),
            }
        }
    }

    fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn check(
        config: Config,
        body: std::result::Result<&'static str, &'static str>,
        now: DateTime<Utc>,
    ) -> (DeadQueueCheck, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = StubFetcher { body, calls: Arc::clone(&calls) };
        let check = DeadQueueCheck::new(config, Box::new(fetcher), Box::new(FixedClock(now)));
        (check, calls)
    }

    #[test]
    fn test_classify_counts() {
        let checker = QueueHealthChecker;

        let outcome = checker.classify(&StatsSnapshot::new(0));
        assert_eq!(outcome, CheckOutcome::ok("dead queue is empty"));

        let outcome = checker.classify(&StatsSnapshot::new(1));
        assert_eq!(outcome, CheckOutcome::critical("dead queue not empty (1 entry)"));

        let outcome = checker.classify(&StatsSnapshot::new(42));
        assert_eq!(outcome, CheckOutcome::critical("dead queue not empty (42 entries)"));
    }

    #[test]
    fn test_classify_pluralization() {
        let checker = QueueHealthChecker;
        for n in 0..50u64 {
            let outcome = checker.classify(&StatsSnapshot::new(n));
            assert_eq!(outcome.severity == Severity::Ok, n == 0);
            assert_eq!(outcome.severity == Severity::Critical, n >= 1);
            assert_eq!(outcome.message.contains("entries"), n > 1);
            assert_eq!(outcome.message.contains("(1 entry)"), n == 1);
        }
    }

    #[test]
    fn test_classify_result_failure() {
        let outcome = QueueHealthChecker.classify_result(
            "http://x/stats",
            Err(CheckError::Status { url: "http://x/stats".to_string(), status: 500 }),
        );

        assert_eq!(outcome.severity, Severity::Unknown);
        assert!(outcome.message.starts_with("Could not load Sidekiq stats from http://x/stats."));
        assert!(outcome.message.contains("500"));
    }

    #[tokio::test]
    async fn test_run_reports_dead_entries() {
        let (check, calls) = check(
            Config::new("http://x/stats"),
            Ok(r#"{"sidekiq":{"dead":3}}"#),
            monday_noon(),
        );

        let outcome = check.run().await;
        assert_eq!(outcome, CheckOutcome::critical("dead queue not empty (3 entries)"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_silenced_skips_fetch() {
        let config = Config {
            silence: Some("11:00-2".parse().unwrap()),
            ..Config::new("http://x/stats")
        };
        let (check, calls) = check(config, Ok(r#"{"sidekiq":{"dead":3}}"#), monday_noon());

        let outcome = check.run().await;
        assert_eq!(outcome.severity, Severity::Ok);
        assert!(outcome.message.contains("time period"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_fetch_failure_is_unknown() {
        let (check, _) = check(Config::new("http://x/stats"), Err("connection refused"), monday_noon());

        let outcome = check.run().await;
        assert_eq!(outcome.severity, Severity::Unknown);
        assert!(outcome.message.contains("http://x/stats"));
        assert!(outcome.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_run_malformed_payload_is_unknown() {
        let (check, _) = check(Config::new("http://x/stats"), Ok("not json"), monday_noon());

        let outcome = check.run().await;
        assert_eq!(outcome.severity, Severity::Unknown);
        assert!(outcome.message.contains("JSON error"));
    }
}
