//! # Testing & Assertions
//!
//! Assertions over captured responses and a runner for batches of test
//! cases.
//!
//! - [`assertion`]: declarative [`Assertion`]s and the `assert_*` functions
//!   behind them. Each returns the first problem it finds as an
//!   [`AssertionError`].
//! - [`check`]: soft evaluation of many assertions against one snapshot.
//! - [`runner`]: issue each case's request once, evaluate, aggregate.

pub mod assertion;
pub mod check;
pub mod error;
pub mod runner;

pub use assertion::{
    Assertion, ElementPredicate, assert_all_match, assert_elapsed_under, assert_field,
    assert_field_absent, assert_field_present, assert_field_type, assert_header_contains,
    assert_header_present, assert_len, assert_not_empty, assert_status,
};
pub use check::{CheckOutcome, CheckReport, evaluate};
pub use error::{AssertionError, AssertionFailures, AssertionKind};
pub use runner::{
    CaseOutcome, CaseStatus, RunMode, RunReport, Runner, TestCase, default_workers, run_case,
};
