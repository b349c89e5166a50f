//! Black-box verification of HTTP API contracts.
//!
//! A [`Verifier`] sends a [`RequestDescription`] against an
//! [`EndpointConfig`] and captures an immutable [`ResponseSnapshot`].
//! [`Assertion`]s are then evaluated against that snapshot, either one at a
//! time through the `assert_*` functions or all together with [`evaluate`].
//! [`Runner`] drives whole suites of [`TestCase`]s.

pub mod cli;
pub mod config;
pub mod document;
pub mod http;
pub mod suites;
pub mod telemetry;
pub mod testing;

pub use config::{ConfigError, EndpointConfig};
pub use document::{FieldPath, FieldType};
pub use http::{HttpMethod, RequestDescription, ResponseSnapshot, TransportError, Verifier, send};
pub use testing::{
    Assertion, AssertionError, AssertionFailures, AssertionKind, ElementPredicate, RunMode,
    RunReport, Runner, TestCase, evaluate,
};
