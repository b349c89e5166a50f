use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::document::{self, FieldPath};

/// An immutable captured HTTP response.
///
/// The body is parsed once at capture time. When it is empty or not JSON the
/// snapshot exposes an empty object as its document; the raw bytes remain
/// available through [`ResponseSnapshot::body_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
    document: Value,
    parsed: bool,
    elapsed: Duration,
}

impl ResponseSnapshot {
    /// Capture a response. Header names are folded to lowercase; repeated
    /// headers are joined with `", "`.
    pub fn new<I, K, V>(status: u16, headers: I, body: Vec<u8>, elapsed: Duration) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut folded: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let name = name.as_ref().trim().to_ascii_lowercase();
            let value = value.into();
            folded
                .entry(name)
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let (document, parsed) = match document::parse_document(&body) {
            Some(value) => (value, true),
            None => (document::empty_document(), false),
        };

        Self {
            status,
            headers: folded,
            body,
            document,
            parsed,
            elapsed,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// `false` when the document is the empty-body fallback.
    pub fn is_json(&self) -> bool {
        self.parsed
    }

    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.document)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
