use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path `{path}`: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: &'static str,
}

/// A parsed dotted/indexed path into a JSON document.
///
/// `""` and `"$"` address the document root. Keys are separated by `.`,
/// array indices are written as `[n]`: `items[0].id`, `[2].title`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        let raw = input.trim();
        // `$` marks the root only on its own or before `.`/`[`; `$ref` is a key.
        let body = match raw.strip_prefix('$') {
            Some(rest) if rest.is_empty() || rest.starts_with(['.', '[']) => rest,
            _ => raw,
        };
        let body = body.strip_prefix('.').unwrap_or(body);

        let err = |reason| PathError {
            path: input.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = body.chars().peekable();
        // Set after `]` so that `a[0].b` and `a[0][1]` parse but `a[0]b` does not.
        let mut after_index = false;

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(err("empty key"));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    if chars.peek().is_none() {
                        return Err(err("trailing `.`"));
                    }
                    after_index = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(err("index must be a non-negative integer")),
                            None => return Err(err("unclosed `[`")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| err("index must be a non-negative integer"))?;
                    segments.push(Segment::Index(index));
                    after_index = true;
                }
                ']' => return Err(err("unexpected `]`")),
                other => {
                    if after_index {
                        return Err(err("expected `.` or `[` after index"));
                    }
                    key.push(other);
                }
            }
        }

        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walk `document` along this path. Returns `None` as soon as a key is
    /// missing, an index is out of range, or a segment meets a scalar.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        write!(f, "{}", self.raw)
    }
}
