//! Built-in contract suites.

pub mod posts;

use crate::testing::TestCase;

/// Look up a built-in suite by name.
pub fn by_name(name: &str) -> Option<Vec<TestCase>> {
    match name {
        "posts" => Some(posts::suite()),
        _ => None,
    }
}

pub const NAMES: [&str; 1] = ["posts"];
