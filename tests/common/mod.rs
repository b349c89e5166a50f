//! Local stand-in for a JSONPlaceholder-style `/posts` service.
//!
//! Routes:
//! - `GET /posts[?userId=N]`, `GET /posts/{id}`, `POST /posts`,
//!   `PUT /posts/{id}`, `DELETE /posts/{id}`
//! - `GET /slow?ms=N` answers after `N` milliseconds
//! - `GET /text` answers with a plain-text body
//! - `GET /empty` answers 204 with no body
//! - `GET /headers` echoes the request headers as a JSON object

#![allow(dead_code)]

use std::io::Read;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tiny_http::{Header, Method, Request, Response, Server};

pub const POSTS_PER_USER: u64 = 3;
pub const USERS: u64 = 2;

pub struct StubServer {
    addr: SocketAddr,
}

impl StubServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the stub on an ephemeral port. The server thread lives until the
/// test process exits.
pub fn start() -> StubServer {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            thread::spawn(move || handle(request));
        }
    });
    StubServer { addr }
}

/// An address nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn post(id: u64) -> Value {
    json!({
        "userId": (id - 1) / POSTS_PER_USER + 1,
        "id": id,
        "title": format!("title {id}"),
        "body": format!("body {id}"),
    })
}

fn all_posts() -> Vec<Value> {
    (1..=USERS * POSTS_PER_USER).map(post).collect()
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json; charset=utf-8"[..]).unwrap()
}

fn json_response(status: u16, body: &Value) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(json_header())
}

fn read_json(request: &mut Request) -> Value {
    let mut raw = String::new();
    let _ = request.as_reader().read_to_string(&mut raw);
    serde_json::from_str(&raw).unwrap_or(Value::Null)
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

fn handle(mut request: Request) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let method = request.method().clone();

    let response = match (&method, segments.as_slice()) {
        (Method::Get, ["posts"]) => {
            let posts: Vec<Value> = match query_param(query, "userId").and_then(|u| u.parse::<u64>().ok()) {
                Some(user) => all_posts().into_iter().filter(|p| p["userId"] == user).collect(),
                None => all_posts(),
            };
            json_response(200, &Value::Array(posts))
        }
        (Method::Get, ["posts", id]) => match id.parse::<u64>() {
            Ok(id) if (1..=USERS * POSTS_PER_USER).contains(&id) => json_response(200, &post(id)),
            _ => json_response(404, &json!({})),
        },
        (Method::Post, ["posts"]) => {
            let mut body = read_json(&mut request);
            if let Value::Object(map) = &mut body {
                map.insert("id".to_string(), json!(101));
            }
            json_response(201, &body)
        }
        (Method::Put, ["posts", id]) => {
            let mut body = read_json(&mut request);
            if let (Value::Object(map), Ok(id)) = (&mut body, id.parse::<u64>()) {
                map.insert("id".to_string(), json!(id));
            }
            json_response(200, &body)
        }
        (Method::Delete, ["posts", _]) => json_response(200, &json!({})),
        (Method::Get, ["slow"]) => {
            let ms = query_param(query, "ms").and_then(|m| m.parse().ok()).unwrap_or(500);
            thread::sleep(Duration::from_millis(ms));
            json_response(200, &json!({"slept_ms": ms}))
        }
        (Method::Get, ["text"]) => Response::from_string("hello, not json").with_status_code(200),
        (Method::Get, ["empty"]) => Response::from_string("").with_status_code(204),
        (Method::Get, ["headers"]) => {
            let mut map = Map::new();
            for header in request.headers() {
                map.insert(
                    header.field.to_string().to_ascii_lowercase(),
                    Value::String(header.value.to_string()),
                );
            }
            json_response(200, &Value::Object(map))
        }
        _ => Response::from_string("Not Found").with_status_code(404),
    };

    let _ = request.respond(response);
}
