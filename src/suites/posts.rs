//! Contract for a JSONPlaceholder-style `/posts` resource.
//!
//! Each post is `{userId, id, title, body}` with integer ids and string text
//! fields. Missing and deleted posts answer with an empty body or `{}`.

use std::time::Duration;

use serde_json::json;

use crate::document::FieldType;
use crate::http::RequestDescription;
use crate::testing::{Assertion, ElementPredicate, TestCase};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

pub const MISSING_POST_ID: u64 = 999_999;
pub const RESPONSE_TIME_BUDGET: Duration = Duration::from_secs(2);

const POST_FIELDS: [&str; 4] = ["userId", "id", "title", "body"];

pub fn suite() -> Vec<TestCase> {
    vec![
        get_all_posts(),
        get_single_post(),
        get_invalid_post(),
        get_posts_by_user(),
        create_post(),
        update_post(),
        delete_post(),
        response_headers(),
        response_schema(),
        response_time(),
    ]
}

pub fn get_all_posts() -> TestCase {
    TestCase::new("get_all_posts", RequestDescription::get("/posts"))
        .describe("GET /posts returns a non-empty list")
        .expect(Assertion::status(200))
        .expect(Assertion::not_empty(""))
}

pub fn get_single_post() -> TestCase {
    let case = TestCase::new("get_single_post", RequestDescription::get("/posts/1"))
        .describe("GET /posts/1 returns post 1 with every field")
        .expect(Assertion::status(200));
    POST_FIELDS
        .iter()
        .fold(case, |case, field| case.expect(Assertion::field_present(*field)))
        .expect(Assertion::field_equals("id", 1))
}

pub fn get_invalid_post() -> TestCase {
    TestCase::new(
        "get_invalid_post",
        RequestDescription::get(format!("/posts/{MISSING_POST_ID}")),
    )
    .describe("GET of an unknown post is a 404 with an empty body")
    .expect(Assertion::status(404))
    .expect(Assertion::len("", 0))
}

pub fn get_posts_by_user() -> TestCase {
    TestCase::new(
        "get_posts_by_user",
        RequestDescription::get("/posts").query("userId", 1),
    )
    .describe("GET /posts?userId=1 only returns posts of user 1")
    .expect(Assertion::status(200))
    .expect(Assertion::not_empty(""))
    .expect(Assertion::all_match("", ElementPredicate::field_equals("userId", 1)))
}

pub fn create_post() -> TestCase {
    TestCase::new(
        "create_post",
        RequestDescription::post(
            "/posts",
            json!({
                "title": "Title of my test post",
                "body": "Body of my test post",
                "userId": 1,
            }),
        ),
    )
    .describe("POST /posts echoes the payload and assigns an id")
    .expect(Assertion::status(201))
    .expect(Assertion::field_equals("title", "Title of my test post"))
    .expect(Assertion::field_equals("body", "Body of my test post"))
    .expect(Assertion::field_equals("userId", 1))
    .expect(Assertion::field_present("id"))
}

pub fn update_post() -> TestCase {
    TestCase::new(
        "update_post",
        RequestDescription::put(
            "/posts/1",
            json!({
                "id": 1,
                "title": "Updated title",
                "body": "Updated body",
                "userId": 1,
            }),
        ),
    )
    .describe("PUT /posts/1 returns the updated post")
    .expect(Assertion::status(200))
    .expect(Assertion::field_equals("id", 1))
    .expect(Assertion::field_equals("title", "Updated title"))
    .expect(Assertion::field_equals("body", "Updated body"))
    .expect(Assertion::field_equals("userId", 1))
}

pub fn delete_post() -> TestCase {
    TestCase::new("delete_post", RequestDescription::delete("/posts/1"))
        .describe("DELETE /posts/1 succeeds with an empty body")
        .expect(Assertion::status(200))
        .expect(Assertion::len("", 0))
}

pub fn response_headers() -> TestCase {
    TestCase::new("response_headers", RequestDescription::get("/posts"))
        .describe("responses are served as JSON")
        .expect(Assertion::status(200))
        .expect(Assertion::header_contains("Content-Type", "application/json"))
}

pub fn response_schema() -> TestCase {
    TestCase::new("response_schema", RequestDescription::get("/posts/1"))
        .describe("post fields have the documented types")
        .expect(Assertion::status(200))
        .expect(Assertion::field_type("id", FieldType::Integer))
        .expect(Assertion::field_type("userId", FieldType::Integer))
        .expect(Assertion::field_type("body", FieldType::String))
        .expect(Assertion::field_type("title", FieldType::String))
}

pub fn response_time() -> TestCase {
    TestCase::new("response_time", RequestDescription::get("/posts"))
        .describe("GET /posts answers within the time budget")
        .expect(Assertion::status(200))
        .expect(Assertion::elapsed_under(RESPONSE_TIME_BUDGET))
}
