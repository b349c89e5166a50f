use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::document::{self, FieldPath, FieldType};
use crate::http::ResponseSnapshot;

use super::error::{AssertionError, AssertionKind};

type CustomCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Predicate applied to each element of a collection by
/// [`Assertion::AllMatch`]. Paths are relative to the element.
#[derive(Clone)]
pub enum ElementPredicate {
    FieldPresent(String),
    FieldType { path: String, expected: FieldType },
    FieldEquals { path: String, expected: Value },
    Custom { name: String, check: CustomCheck },
}

impl ElementPredicate {
    pub fn field_present(path: impl Into<String>) -> Self {
        ElementPredicate::FieldPresent(path.into())
    }

    pub fn field_type(path: impl Into<String>, expected: FieldType) -> Self {
        ElementPredicate::FieldType {
            path: path.into(),
            expected,
        }
    }

    pub fn field_equals(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        ElementPredicate::FieldEquals {
            path: path.into(),
            expected: expected.into(),
        }
    }

    pub fn custom(name: impl Into<String>, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        ElementPredicate::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    fn path(&self) -> Option<&str> {
        match self {
            ElementPredicate::FieldPresent(path)
            | ElementPredicate::FieldType { path, .. }
            | ElementPredicate::FieldEquals { path, .. } => Some(path.as_str()),
            ElementPredicate::Custom { .. } => None,
        }
    }

    /// `Err(actual)` describes what the element held instead.
    fn test(&self, path: &FieldPath, element: &Value) -> Result<(), String> {
        let resolved = path.resolve(element);
        match self {
            ElementPredicate::FieldPresent(_) => resolved.map(|_| ()).ok_or_else(|| "missing".to_string()),
            ElementPredicate::FieldType { expected, .. } => match resolved {
                Some(value) if expected.accepts(value) => Ok(()),
                Some(value) => Err(format!("{} {}", FieldType::of(value), document::preview(value))),
                None => Err("missing".to_string()),
            },
            ElementPredicate::FieldEquals { expected, .. } => match resolved {
                Some(value) if document::values_equal(value, expected) => Ok(()),
                Some(value) => Err(document::preview(value)),
                None => Err("missing".to_string()),
            },
            ElementPredicate::Custom { check, .. } => {
                if check(element) {
                    Ok(())
                } else {
                    Err(document::preview(element))
                }
            }
        }
    }
}

impl Display for ElementPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementPredicate::FieldPresent(path) => write!(f, "`{path}` present"),
            ElementPredicate::FieldType { path, expected } => write!(f, "`{path}` is {expected}"),
            ElementPredicate::FieldEquals { path, expected } => {
                write!(f, "`{path}` == {}", document::preview(expected))
            }
            ElementPredicate::Custom { name, .. } => write!(f, "{name}"),
        }
    }
}

impl fmt::Debug for ElementPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementPredicate::FieldPresent(path) => f.debug_tuple("FieldPresent").field(path).finish(),
            ElementPredicate::FieldType { path, expected } => f
                .debug_struct("FieldType")
                .field("path", path)
                .field("expected", expected)
                .finish(),
            ElementPredicate::FieldEquals { path, expected } => f
                .debug_struct("FieldEquals")
                .field("path", path)
                .field("expected", expected)
                .finish(),
            ElementPredicate::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish_non_exhaustive(),
        }
    }
}

/// A declarative check over one [`ResponseSnapshot`].
#[derive(Debug, Clone)]
pub enum Assertion {
    Status(u16),
    HeaderPresent(String),
    HeaderContains { name: String, substring: String },
    FieldPresent(String),
    FieldAbsent(String),
    FieldType { path: String, expected: FieldType },
    FieldEquals { path: String, expected: Value },
    AllMatch { path: String, predicate: ElementPredicate },
    Len { path: String, expected: usize },
    NotEmpty(String),
    ElapsedUnder(Duration),
}

impl Assertion {
    pub fn status(code: u16) -> Self {
        Assertion::Status(code)
    }

    pub fn header_present(name: impl Into<String>) -> Self {
        Assertion::HeaderPresent(name.into())
    }

    pub fn header_contains(name: impl Into<String>, substring: impl Into<String>) -> Self {
        Assertion::HeaderContains {
            name: name.into(),
            substring: substring.into(),
        }
    }

    pub fn field_present(path: impl Into<String>) -> Self {
        Assertion::FieldPresent(path.into())
    }

    pub fn field_absent(path: impl Into<String>) -> Self {
        Assertion::FieldAbsent(path.into())
    }

    pub fn field_type(path: impl Into<String>, expected: FieldType) -> Self {
        Assertion::FieldType {
            path: path.into(),
            expected,
        }
    }

    pub fn field_equals(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        Assertion::FieldEquals {
            path: path.into(),
            expected: expected.into(),
        }
    }

    pub fn all_match(path: impl Into<String>, predicate: ElementPredicate) -> Self {
        Assertion::AllMatch {
            path: path.into(),
            predicate,
        }
    }

    pub fn len(path: impl Into<String>, expected: usize) -> Self {
        Assertion::Len {
            path: path.into(),
            expected,
        }
    }

    pub fn not_empty(path: impl Into<String>) -> Self {
        Assertion::NotEmpty(path.into())
    }

    pub fn elapsed_under(bound: Duration) -> Self {
        Assertion::ElapsedUnder(bound)
    }

    pub fn check(&self, snapshot: &ResponseSnapshot) -> Result<(), AssertionError> {
        match self {
            Assertion::Status(code) => assert_status(snapshot, *code),
            Assertion::HeaderPresent(name) => assert_header_present(snapshot, name),
            Assertion::HeaderContains { name, substring } => assert_header_contains(snapshot, name, substring),
            Assertion::FieldPresent(path) => assert_field_present(snapshot, path),
            Assertion::FieldAbsent(path) => assert_field_absent(snapshot, path),
            Assertion::FieldType { path, expected } => assert_field_type(snapshot, path, *expected),
            Assertion::FieldEquals { path, expected } => check_field_equals(snapshot, path, expected),
            Assertion::AllMatch { path, predicate } => assert_all_match(snapshot, path, predicate),
            Assertion::Len { path, expected } => assert_len(snapshot, path, *expected),
            Assertion::NotEmpty(path) => assert_not_empty(snapshot, path),
            Assertion::ElapsedUnder(bound) => assert_elapsed_under(snapshot, *bound),
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Status(code) => write!(f, "status == {code}"),
            Assertion::HeaderPresent(name) => write!(f, "header `{name}` present"),
            Assertion::HeaderContains { name, substring } => {
                write!(f, "header `{name}` contains {substring:?}")
            }
            Assertion::FieldPresent(path) => write!(f, "`{path}` present"),
            Assertion::FieldAbsent(path) => write!(f, "`{path}` absent"),
            Assertion::FieldType { path, expected } => write!(f, "`{path}` is {expected}"),
            Assertion::FieldEquals { path, expected } => {
                write!(f, "`{path}` == {}", document::preview(expected))
            }
            Assertion::AllMatch { path, predicate } => write!(f, "every element of `{path}`: {predicate}"),
            Assertion::Len { path, expected } => write!(f, "len(`{path}`) == {expected}"),
            Assertion::NotEmpty(path) => write!(f, "`{path}` not empty"),
            Assertion::ElapsedUnder(bound) => write!(f, "elapsed < {}ms", bound.as_millis()),
        }
    }
}

pub fn assert_status(snapshot: &ResponseSnapshot, expected: u16) -> Result<(), AssertionError> {
    let actual = snapshot.status();
    if actual == expected {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::StatusMismatch,
        "status",
        expected.to_string(),
        actual.to_string(),
    ))
}

pub fn assert_header_present(snapshot: &ResponseSnapshot, name: &str) -> Result<(), AssertionError> {
    header(snapshot, name, "present").map(|_| ())
}

/// Case-insensitive on the header name, case-sensitive on the substring.
pub fn assert_header_contains(snapshot: &ResponseSnapshot, name: &str, substring: &str) -> Result<(), AssertionError> {
    let expected = format!("contains {substring:?}");
    let value = header(snapshot, name, &expected)?;
    if value.contains(substring) {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::HeaderMismatch,
        header_location(name),
        expected,
        format!("{value:?}"),
    ))
}

pub fn assert_field_present(snapshot: &ResponseSnapshot, path: &str) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    resolve(snapshot, &path, "present").map(|_| ())
}

pub fn assert_field_absent(snapshot: &ResponseSnapshot, path: &str) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    match snapshot.field(&path) {
        None => Ok(()),
        Some(value) => Err(AssertionError::new(
            AssertionKind::FieldUnexpected,
            path.to_string(),
            "absent",
            document::preview(value),
        )),
    }
}

pub fn assert_field_type(snapshot: &ResponseSnapshot, path: &str, expected: FieldType) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    let value = resolve(snapshot, &path, &expected.to_string())?;
    if expected.accepts(value) {
        return Ok(());
    }
    Err(type_mismatch(&path, expected, value))
}

/// Equality is type-strict: a field holding `1.0` does not equal `1`, and
/// reports [`AssertionKind::FieldTypeMismatch`].
pub fn assert_field(snapshot: &ResponseSnapshot, path: &str, expected: impl Into<Value>) -> Result<(), AssertionError> {
    check_field_equals(snapshot, path, &expected.into())
}

fn check_field_equals(snapshot: &ResponseSnapshot, path: &str, expected: &Value) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    let value = resolve(snapshot, &path, &document::preview(expected))?;
    let expected_type = FieldType::of(expected);
    if !expected_type.accepts(value) {
        return Err(type_mismatch(&path, expected_type, value));
    }
    if document::values_equal(value, expected) {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::FieldValueMismatch,
        path.to_string(),
        document::preview(expected),
        document::preview(value),
    ))
}

/// Every element of the array at `path` satisfies `predicate`. Stops at the
/// first failing element. An empty array passes.
pub fn assert_all_match(
    snapshot: &ResponseSnapshot,
    path: &str,
    predicate: &ElementPredicate,
) -> Result<(), AssertionError> {
    let collection_path = parse_path(path)?;
    let element_path = match predicate.path() {
        Some(raw) => parse_path(raw)?,
        None => FieldPath::root(),
    };
    let value = resolve(snapshot, &collection_path, "array")?;
    let Value::Array(items) = value else {
        return Err(type_mismatch(&collection_path, FieldType::Array, value));
    };

    for (index, element) in items.iter().enumerate() {
        if let Err(actual) = predicate.test(&element_path, element) {
            return Err(AssertionError::new(
                AssertionKind::ElementMismatch { index },
                format!("{collection_path}[{index}]"),
                predicate.to_string(),
                actual,
            ));
        }
    }
    Ok(())
}

pub fn assert_len(snapshot: &ResponseSnapshot, path: &str, expected: usize) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    let actual = length(snapshot, &path, &format!("length {expected}"))?;
    if actual == expected {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::LengthMismatch,
        path.to_string(),
        format!("length {expected}"),
        format!("length {actual}"),
    ))
}

pub fn assert_not_empty(snapshot: &ResponseSnapshot, path: &str) -> Result<(), AssertionError> {
    let path = parse_path(path)?;
    let actual = length(snapshot, &path, "non-empty")?;
    if actual > 0 {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::LengthMismatch,
        path.to_string(),
        "non-empty",
        "length 0",
    ))
}

/// Strict bound: an elapsed time equal to `bound` fails.
pub fn assert_elapsed_under(snapshot: &ResponseSnapshot, bound: Duration) -> Result<(), AssertionError> {
    let elapsed = snapshot.elapsed();
    if elapsed < bound {
        return Ok(());
    }
    Err(AssertionError::new(
        AssertionKind::TimingExceeded,
        "elapsed",
        format!("< {}ms", bound.as_millis()),
        format!("{}ms", elapsed.as_millis()),
    ))
}

fn parse_path(raw: &str) -> Result<FieldPath, AssertionError> {
    FieldPath::parse(raw).map_err(|err| {
        AssertionError::new(AssertionKind::InvalidPath, raw, "a valid field path", err.reason)
    })
}

fn resolve<'s>(snapshot: &'s ResponseSnapshot, path: &FieldPath, expected: &str) -> Result<&'s Value, AssertionError> {
    snapshot.field(path).ok_or_else(|| {
        AssertionError::new(AssertionKind::FieldMissing, path.to_string(), expected, "missing")
    })
}

fn header<'s>(snapshot: &'s ResponseSnapshot, name: &str, expected: &str) -> Result<&'s str, AssertionError> {
    snapshot.header(name).ok_or_else(|| {
        AssertionError::new(AssertionKind::HeaderMissing, header_location(name), expected, "missing")
    })
}

fn length(snapshot: &ResponseSnapshot, path: &FieldPath, expected: &str) -> Result<usize, AssertionError> {
    let value = resolve(snapshot, path, expected)?;
    document::length_of(value).ok_or_else(|| {
        AssertionError::new(
            AssertionKind::FieldTypeMismatch,
            path.to_string(),
            "array, object or string",
            FieldType::of(value).to_string(),
        )
    })
}

fn type_mismatch(path: &FieldPath, expected: FieldType, actual: &Value) -> AssertionError {
    AssertionError::new(
        AssertionKind::FieldTypeMismatch,
        path.to_string(),
        expected.to_string(),
        format!("{} {}", FieldType::of(actual), document::preview(actual)),
    )
}

fn header_location(name: &str) -> String {
    format!("header:{}", name.trim().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(status: u16, body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(
            status,
            [("Content-Type", "application/json; charset=utf-8")],
            body.as_bytes().to_vec(),
            Duration::from_millis(40),
        )
    }

    fn post() -> ResponseSnapshot {
        snapshot(
            200,
            r#"{"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit", "score": 4.5}"#,
        )
    }

    #[test]
    fn dollar_prefixed_key_is_looked_up_verbatim() {
        let snap = snapshot(200, r#"{"ref": "wrong", "$ref": "right"}"#);
        assert!(assert_field(&snap, "$ref", "right").is_ok());

        let only_plain = snapshot(200, r#"{"ref": 1}"#);
        let err = assert_field_present(&only_plain, "$ref").unwrap_err();
        assert_eq!(err.kind, AssertionKind::FieldMissing);
        assert_eq!(err.location, "$ref");
    }

    #[test]
    fn integer_type_holds_for_literals_beyond_u64() {
        let snap = snapshot(200, r#"{"id": 18446744073709551616, "ratio": 2.0}"#);
        assert!(assert_field_type(&snap, "id", FieldType::Integer).is_ok());
        assert_eq!(
            assert_field_type(&snap, "ratio", FieldType::Integer).unwrap_err().kind,
            AssertionKind::FieldTypeMismatch
        );
        assert!(assert_field(&snap, "ratio", 2.0).is_ok());
        assert_eq!(
            assert_field(&snap, "ratio", 2).unwrap_err().kind,
            AssertionKind::FieldTypeMismatch
        );
    }

    #[test]
    fn status_mismatch_reports_both_codes() {
        let snap = snapshot(404, "{}");
        assert!(assert_status(&snap, 404).is_ok());
        let err = assert_status(&snap, 200).unwrap_err();
        assert_eq!(err.kind, AssertionKind::StatusMismatch);
        assert_eq!(err.expected, "200");
        assert_eq!(err.actual, "404");
    }

    #[test]
    fn header_contains_is_case_insensitive_on_name() {
        let snap = post();
        assert!(assert_header_contains(&snap, "content-type", "application/json").is_ok());
        assert!(assert_header_contains(&snap, "Content-Type", "application/json").is_ok());
        assert!(assert_header_contains(&snap, "CONTENT-TYPE", "application/json").is_ok());
    }

    #[test]
    fn header_missing_and_mismatch_are_distinct() {
        let snap = post();
        let missing = assert_header_contains(&snap, "X-Request-Id", "abc").unwrap_err();
        assert_eq!(missing.kind, AssertionKind::HeaderMissing);
        let mismatch = assert_header_contains(&snap, "content-type", "text/html").unwrap_err();
        assert_eq!(mismatch.kind, AssertionKind::HeaderMismatch);
        assert_eq!(mismatch.location, "header:content-type");
    }

    #[test]
    fn field_equals_distinguishes_value_and_type() {
        let snap = post();
        assert!(assert_field(&snap, "id", 1).is_ok());
        assert_eq!(
            assert_field(&snap, "id", 2).unwrap_err().kind,
            AssertionKind::FieldValueMismatch
        );
        assert_eq!(
            assert_field(&snap, "id", "1").unwrap_err().kind,
            AssertionKind::FieldTypeMismatch
        );
        assert_eq!(
            assert_field(&snap, "id", 1.0).unwrap_err().kind,
            AssertionKind::FieldTypeMismatch
        );
        assert_eq!(
            assert_field(&snap, "missing", 1).unwrap_err().kind,
            AssertionKind::FieldMissing
        );
    }

    #[test]
    fn integer_type_requires_whole_number_at_parse_time() {
        let snap = post();
        assert!(assert_field_type(&snap, "id", FieldType::Integer).is_ok());
        assert!(assert_field_type(&snap, "title", FieldType::String).is_ok());
        assert!(assert_field_type(&snap, "score", FieldType::Number).is_ok());
        let err = assert_field_type(&snap, "score", FieldType::Integer).unwrap_err();
        assert_eq!(err.kind, AssertionKind::FieldTypeMismatch);
        assert!(err.actual.starts_with("float"));

        let float_id = snapshot(200, r#"{"id": 1.0}"#);
        assert_eq!(
            assert_field_type(&float_id, "id", FieldType::Integer).unwrap_err().kind,
            AssertionKind::FieldTypeMismatch
        );
    }

    #[test]
    fn all_match_over_empty_collection_passes() {
        let snap = snapshot(200, "[]");
        let predicate = ElementPredicate::field_equals("userId", 1);
        assert!(assert_all_match(&snap, "", &predicate).is_ok());
    }

    #[test]
    fn all_match_reports_first_failing_index() {
        let snap = snapshot(
            200,
            r#"[{"userId": 1}, {"userId": 1}, {"userId": 2}, {"userId": 3}]"#,
        );
        let err = assert_all_match(&snap, "$", &ElementPredicate::field_equals("userId", 1)).unwrap_err();
        assert_eq!(err.kind, AssertionKind::ElementMismatch { index: 2 });
        assert_eq!(err.location, "$[2]");
        assert_eq!(err.actual, "2");
    }

    #[test]
    fn all_match_requires_an_array() {
        let snap = post();
        let err = assert_all_match(&snap, "title", &ElementPredicate::field_present("x")).unwrap_err();
        assert_eq!(err.kind, AssertionKind::FieldTypeMismatch);
    }

    #[test]
    fn custom_predicates_see_whole_element() {
        let snap = snapshot(200, r#"{"items": [2, 4, 7]}"#);
        let even = ElementPredicate::custom("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        let err = assert_all_match(&snap, "items", &even).unwrap_err();
        assert_eq!(err.kind, AssertionKind::ElementMismatch { index: 2 });
        assert_eq!(err.location, "items[2]");
    }

    #[test]
    fn unparseable_body_counts_as_empty() {
        let snap = snapshot(404, "");
        assert!(assert_len(&snap, "", 0).is_ok());
        assert_eq!(
            assert_field_present(&snap, "id").unwrap_err().kind,
            AssertionKind::FieldMissing
        );
        assert_eq!(
            assert_not_empty(&snap, "").unwrap_err().kind,
            AssertionKind::LengthMismatch
        );
    }

    #[test]
    fn length_checks_objects_and_arrays() {
        assert!(assert_len(&snapshot(404, "{}"), "", 0).is_ok());
        assert!(assert_not_empty(&snapshot(200, "[1]"), "").is_ok());
        let err = assert_len(&post(), "id", 1).unwrap_err();
        assert_eq!(err.kind, AssertionKind::FieldTypeMismatch);
    }

    #[test]
    fn elapsed_bound_is_strict() {
        let slow = ResponseSnapshot::new(200, Vec::<(String, String)>::new(), Vec::new(), Duration::from_millis(2500));
        let err = assert_elapsed_under(&slow, Duration::from_millis(2000)).unwrap_err();
        assert_eq!(err.kind, AssertionKind::TimingExceeded);

        let exact = ResponseSnapshot::new(200, Vec::<(String, String)>::new(), Vec::new(), Duration::from_secs(2));
        assert!(assert_elapsed_under(&exact, Duration::from_secs(2)).is_err());
        assert!(assert_elapsed_under(&post(), Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn invalid_paths_are_reported() {
        let err = assert_field_present(&post(), "a..b").unwrap_err();
        assert_eq!(err.kind, AssertionKind::InvalidPath);
    }

    #[test]
    fn field_absent_flags_present_fields() {
        assert!(assert_field_absent(&post(), "deletedAt").is_ok());
        assert_eq!(
            assert_field_absent(&post(), "id").unwrap_err().kind,
            AssertionKind::FieldUnexpected
        );
    }

    #[test]
    fn declarative_assertions_dispatch() {
        let snap = post();
        let checks = [
            Assertion::status(200),
            Assertion::field_equals("title", json!("sunt aut facere")),
            Assertion::field_type("userId", FieldType::Integer),
        ];
        assert!(checks.iter().all(|a| a.check(&snap).is_ok()));
        assert_eq!(Assertion::status(201).to_string(), "status == 201");
    }
}
