use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::EndpointConfig;
use crate::http::{RequestDescription, Verifier};

use super::assertion::Assertion;
use super::check::{CheckOutcome, evaluate};
use super::error::AssertionError;

/// A named request plus the expectations on its response.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub request: RequestDescription,
    pub assertions: Vec<Assertion>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, request: RequestDescription) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            request,
            assertions: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn expect(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }
}

/// Execution mode for the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Serial,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
    /// The request produced no response.
    Errored,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub status: CaseStatus,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u128>,
    pub checks: Vec<CheckOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseOutcome {
    fn errored(case: &TestCase, message: impl Into<String>) -> Self {
        Self {
            name: case.name.clone(),
            status: CaseStatus::Errored,
            method: case.request.method.to_string(),
            path: case.request.path.clone(),
            http_status: None,
            elapsed_ms: None,
            checks: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionError> {
        self.checks.iter().filter_map(|check| check.failure.as_ref())
    }
}

/// Summary report for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u128,
    pub cases: Vec<CaseOutcome>,
}

impl RunReport {
    fn from_outcomes(cases: Vec<CaseOutcome>, duration_ms: u128) -> Self {
        let count = |status| cases.iter().filter(|case| case.status == status).count();
        Self {
            total: cases.len(),
            passed: count(CaseStatus::Passed),
            failed: count(CaseStatus::Failed),
            errored: count(CaseStatus::Errored),
            duration_ms,
            cases,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// Worker count for parallel runs when none is given.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Runs test cases against one endpoint.
#[derive(Debug, Clone)]
pub struct Runner<'a> {
    config: &'a EndpointConfig,
    mode: RunMode,
    workers: NonZeroUsize,
    filter: Option<String>,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a EndpointConfig) -> Self {
        Self {
            config,
            mode: RunMode::Serial,
            workers: default_workers(),
            filter: None,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Upper bound on threads used in [`RunMode::Parallel`].
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    /// Only run cases whose name contains `filter`.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.trim().is_empty());
        self
    }

    /// Outcomes are reported in input order regardless of mode.
    pub fn run(&self, cases: &[TestCase]) -> RunReport {
        let selected: Vec<&TestCase> = cases
            .iter()
            .filter(|case| self.filter.as_ref().is_none_or(|f| case.name.contains(f.as_str())))
            .collect();

        let started = Instant::now();
        let outcomes = match self.mode {
            RunMode::Serial => self.run_serial(&selected),
            RunMode::Parallel => self.run_parallel(&selected),
        };
        let report = RunReport::from_outcomes(outcomes, started.elapsed().as_millis());
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            duration_ms = report.duration_ms as u64,
            "run finished"
        );
        report
    }

    fn run_serial(&self, cases: &[&TestCase]) -> Vec<CaseOutcome> {
        match Verifier::new(self.config) {
            Ok(verifier) => cases.iter().map(|case| run_case(&verifier, case)).collect(),
            Err(err) => cases.iter().map(|case| CaseOutcome::errored(case, err.to_string())).collect(),
        }
    }

    /// A fixed pool of workers pulls cases off a shared cursor. Each worker
    /// owns one verifier, so at most `workers` requests are in flight.
    fn run_parallel(&self, cases: &[&TestCase]) -> Vec<CaseOutcome> {
        let config = self.config;
        let workers = self.workers.get().min(cases.len());
        let next = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<CaseOutcome>>> = cases.iter().map(|_| Mutex::new(None)).collect();

        let (next, slots_ref) = (&next, &slots);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let verifier = Verifier::new(config);
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(case) = cases.get(index) else {
                                break;
                            };
                            let outcome = match &verifier {
                                Ok(verifier) => run_case(verifier, case),
                                Err(err) => CaseOutcome::errored(case, err.to_string()),
                            };
                            if let Ok(mut slot) = slots_ref[index].lock() {
                                *slot = Some(outcome);
                            }
                        }
                    })
                })
                .collect();
            // A panicked worker leaves its slot empty instead of unwinding the scope.
            for handle in handles {
                let _ = handle.join();
            }
        });

        cases
            .iter()
            .zip(slots)
            .map(|(case, slot)| {
                slot.into_inner().ok().flatten().unwrap_or_else(|| {
                    warn!(case = %case.name, "worker panicked");
                    CaseOutcome::errored(case, "worker thread panicked")
                })
            })
            .collect()
    }
}

/// Send the case's request once and evaluate all of its assertions against
/// the resulting snapshot.
pub fn run_case(verifier: &Verifier<'_>, case: &TestCase) -> CaseOutcome {
    let snapshot = match verifier.send(&case.request) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(case = %case.name, error = %err, "case errored");
            return CaseOutcome::errored(case, err.to_string());
        }
    };

    let report = evaluate(&snapshot, &case.assertions);
    let status = if report.is_pass() {
        CaseStatus::Passed
    } else {
        CaseStatus::Failed
    };
    info!(
        case = %case.name,
        status = ?status,
        http_status = snapshot.status(),
        elapsed_ms = snapshot.elapsed().as_millis() as u64,
        "case finished"
    );

    CaseOutcome {
        name: case.name.clone(),
        status,
        method: case.request.method.to_string(),
        path: case.request.path.clone(),
        http_status: Some(snapshot.status()),
        elapsed_ms: Some(snapshot.elapsed().as_millis()),
        checks: report.outcomes,
        error: None,
    }
}
