use serde::Serialize;

use crate::http::ResponseSnapshot;

use super::assertion::Assertion;
use super::error::{AssertionError, AssertionFailures};

/// Outcome of one assertion against a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub assertion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AssertionError>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Results of evaluating a list of assertions against one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn is_pass(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionError> {
        self.outcomes.iter().filter_map(|outcome| outcome.failure.as_ref())
    }

    pub fn into_result(self) -> Result<(), AssertionFailures> {
        let failures: Vec<AssertionError> = self.outcomes.into_iter().filter_map(|o| o.failure).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AssertionFailures(failures))
        }
    }
}

/// Evaluate every assertion against the same snapshot. Failures do not stop
/// evaluation; all of them end up in the report.
pub fn evaluate(snapshot: &ResponseSnapshot, assertions: &[Assertion]) -> CheckReport {
    let outcomes = assertions
        .iter()
        .map(|assertion| CheckOutcome {
            assertion: assertion.to_string(),
            failure: assertion.check(snapshot).err(),
        })
        .collect();
    CheckReport { outcomes }
}
