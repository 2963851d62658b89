//! Batch job runtime.
//!
//! A job is one unit of work run against the ledger by a worker. Each job declares how
//! often it may be tried, how long it may take and how long to wait between attempts.
//! When the last attempt fails the job's `failed` hook runs, which by default logs
//! critically and raises a `job_failed` admin alert.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    domain::{AlertId, AlertKind, Severity},
    ledger::{Ledger, LedgerError},
};
pub use reconciliation::{InventoryReconciliationJob, SnapshotIntegrityAuditJob};

mod reconciliation;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Job {job} exceeded its timeout of {limit:?} (ran for {elapsed:?})")]
    TimedOut {
        job: &'static str,
        limit: Duration,
        elapsed: Duration,
    },
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl JobError {
    /// Business-rule failures are final; infrastructure hiccups are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::TimedOut { .. } | JobError::Transient(_))
    }
}

/// What a successful run found. `report` is the job's full findings as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    AllClear {
        summary: String,
        report: serde_json::Value,
    },
    AlertsRaised {
        alerts: Vec<AlertId>,
        summary: String,
        report: serde_json::Value,
    },
}

impl JobOutcome {
    pub fn is_all_clear(&self) -> bool {
        matches!(self, JobOutcome::AllClear { .. })
    }
    pub fn report(&self) -> &serde_json::Value {
        match self {
            JobOutcome::AllClear { report, .. } | JobOutcome::AlertsRaised { report, .. } => report,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

pub trait Job {
    fn name(&self) -> &'static str;

    fn tries(&self) -> u32 {
        1
    }

    fn timeout(&self) -> Duration;

    fn backoff(&self) -> Backoff {
        Backoff::None
    }

    fn handle(&self, ledger: &mut Ledger) -> Result<JobOutcome, JobError>;

    fn failed(&self, ledger: &mut Ledger, error: &JobError) {
        error!(severity = "critical", job = self.name(), "Job failed permanently: {error}");
        ledger.raise_alert(
            AlertKind::JobFailed,
            Severity::Critical,
            format!("Job {} failed", self.name()),
            json!({ "job": self.name(), "error": error.to_string() }),
        );
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub job: &'static str,
    pub attempts: u32,
    pub result: Result<JobOutcome, JobError>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs jobs with retries. Work is synchronous, so an overrunning attempt is detected
/// after it returns rather than interrupted.
pub struct JobRunner {
    sleep: Box<dyn Fn(Duration)>,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replaces the real sleep between attempts, e.g. to record backoff delays.
    pub fn with_sleep(sleep: impl Fn(Duration) + 'static) -> Self {
        Self {
            sleep: Box::new(sleep),
        }
    }

    pub fn run(&self, job: &dyn Job, ledger: &mut Ledger) -> JobReport {
        let tries = job.tries().max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(job = job.name(), attempt, tries, "Job started");
            let started = Instant::now();
            let result = job.handle(ledger).and_then(|outcome| {
                let elapsed = started.elapsed();
                if elapsed > job.timeout() {
                    return Err(JobError::TimedOut {
                        job: job.name(),
                        limit: job.timeout(),
                        elapsed,
                    });
                }
                Ok(outcome)
            });

            match result {
                Ok(outcome) => {
                    info!(job = job.name(), attempt, "Job finished");
                    return JobReport {
                        job: job.name(),
                        attempts: attempt,
                        result: Ok(outcome),
                    };
                }
                Err(e) if e.is_retryable() && attempt < tries => {
                    let delay = job.backoff().delay(attempt);
                    warn!(job = job.name(), attempt, ?delay, "Job attempt failed, retrying: {e}");
                    (self.sleep)(delay);
                }
                Err(e) => {
                    job.failed(ledger, &e);
                    return JobReport {
                        job: job.name(),
                        attempts: attempt,
                        result: Err(e),
                    };
                }
            }
        }
    }
}
