//! End-to-end tests of the TiddlyWeb endpoints through `SyncServer::handle`.

use serde_json::Value;
use std::sync::Arc;
use std::thread;
use tiddly_sync_server::etag::query_escape;
use tiddly_sync_server::{EtagMode, Request, Response, ServerConfig, SyncServer, REMEMBER_COOKIE};
use tiddly_testkit::{TestCredentials, TestStore, TEST_EMAIL, TEST_PASSWORD};

struct Harness {
    server: Arc<SyncServer>,
    token: String,
    _store: TestStore,
    credentials: TestCredentials,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    fn with_config(config: ServerConfig) -> Self {
        let store = TestStore::memory();
        let credentials = TestCredentials::seeded();
        let token = credentials.sign_in();
        let server = SyncServer::new(
            config,
            Arc::clone(&store.store),
            Arc::clone(&credentials.store),
        );
        Self {
            server: Arc::new(server),
            token,
            _store: store,
            credentials,
        }
    }

    fn send(&self, request: Request) -> Response {
        self.server
            .handle(&request.with_cookie(REMEMBER_COOKIE, &self.token))
    }

    fn put(&self, title: &str, body: &str) -> Response {
        self.send(Request::put(tiddler_path(title)).with_body(body.to_string()))
    }

    fn get(&self, title: &str) -> Response {
        self.send(Request::get(tiddler_path(title)))
    }

    fn list(&self) -> Vec<Value> {
        let response = self.send(Request::get("/recipes/default/tiddlers.json"));
        assert_eq!(response.status, 200);
        serde_json::from_slice(&response.body).unwrap()
    }
}

fn tiddler_path(title: &str) -> String {
    format!("/recipes/default/tiddlers/{}", path_escape(title))
}

fn path_escape(title: &str) -> String {
    query_escape(title).replace('+', "%20")
}

fn json(response: &Response) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

#[test]
fn foo_scenario() {
    let h = Harness::new();

    let first = h.put("Foo", r#"{"title":"Foo","text":"hello"}"#);
    assert_eq!(first.status, 204);
    assert_eq!(first.header("Etag"), Some("\"default/Foo/1:\""));

    let second = h.put("Foo", r#"{"title":"Foo","text":"hello again","tags":"x"}"#);
    assert_eq!(second.header("Etag"), Some("\"default/Foo/2:\""));

    let fields = json(&h.get("Foo"));
    assert_eq!(fields["revision"], 2);
    assert_eq!(fields["bag"], "default");
    assert_eq!(fields["text"], "hello again");
    assert_eq!(fields["tags"], "x");

    assert_eq!(
        h.send(Request::delete("/bags/default/tiddlers/Foo")).status,
        204
    );
    assert_eq!(h.get("Foo").status, 404);
}

#[test]
fn caller_cannot_set_revision_or_bag() {
    let h = Harness::new();
    h.put("Foo", r#"{"revision":99,"bag":"elsewhere"}"#);

    let fields = json(&h.get("Foo"));
    assert_eq!(fields["revision"], 1);
    assert_eq!(fields["bag"], "default");
    assert_eq!(fields["title"], "Foo");
}

#[test]
fn listing_hides_system_but_keeps_themes() {
    let h = Harness::new();
    h.put("$:/boot/boot.js", "{}");
    h.put("$:/themes/tiddlywiki/vanilla", "{}");

    let titles: Vec<String> = h
        .list()
        .into_iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["$:/themes/tiddlywiki/vanilla".to_string()]);

    assert_eq!(h.get("$:/boot/boot.js").status, 200);
}

#[test]
fn listing_omits_text() {
    let h = Harness::new();
    h.put("Foo", r#"{"text":"secret body","type":"text/vnd.tiddlywiki"}"#);

    let list = h.list();
    assert_eq!(list.len(), 1);
    assert!(list[0].get("text").is_none());
    assert_eq!(list[0]["type"], "text/vnd.tiddlywiki");
}

#[test]
fn titles_round_trip_through_paths() {
    let h = Harness::new();
    for title in ["My Page", "$:/StoryList", "50% off / sale", "Ünïcode ☃"] {
        let response = h.put(title, r#"{"text":"x"}"#);
        assert_eq!(response.status, 204, "{title}");
        let expected = format!("\"default/{}/1:\"", query_escape(title));
        assert_eq!(response.header("Etag"), Some(expected.as_str()));
        assert_eq!(json(&h.get(title))["title"], title);
    }
}

#[test]
fn delete_of_missing_title_is_no_content() {
    let h = Harness::new();
    assert_eq!(h.send(Request::delete("/bags/bag/tiddlers/Nope")).status, 204);
}

#[test]
fn invalid_bodies_are_bad_requests() {
    let h = Harness::new();
    for body in ["[]", "\"text\"", "{", r#"{"text":["a"]}"#] {
        let response = h.put("Foo", body);
        assert_eq!(response.status, 400, "{body}");
        assert!(response.body_text().starts_with("Bad Request: "));
    }
    assert_eq!(h.get("Foo").status, 404);
}

#[test]
fn content_digest_mode() {
    let h = Harness::with_config(ServerConfig::default().with_etag_mode(EtagMode::ContentDigest));
    let response = h.put("Foo", "{}");
    let tag = response.header("Etag").unwrap();
    assert!(tag.starts_with("\"default/Foo/1:"));
    assert_eq!(tag.len(), "\"default/Foo/1:".len() + 64 + 1);
}

#[test]
fn login_sets_a_working_cookie() {
    let h = Harness::new();
    let response = h.server.handle(
        &Request::post("/login/").with_form([("email", TEST_EMAIL), ("password", TEST_PASSWORD)]),
    );
    assert_eq!(response.status, 302);
    assert_eq!(response.header("Location"), Some("/"));

    let cookie = response.header("Set-Cookie").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=31536000"));

    let token = cookie
        .strip_prefix("tiddlywiki-remember=")
        .and_then(|rest| rest.split(';').next())
        .unwrap();
    let status = h
        .server
        .handle(&Request::get("/status").with_cookie(REMEMBER_COOKIE, token));
    assert_eq!(status.status, 200);
    assert_eq!(json(&status)["username"], "user");
}

#[test]
fn login_failures_look_identical() {
    let h = Harness::new();
    let wrong_password = h.server.handle(
        &Request::post("/login/").with_form([("email", TEST_EMAIL), ("password", "nope")]),
    );
    let unknown_email = h.server.handle(
        &Request::post("/login/")
            .with_form([("email", "stranger@example.com"), ("password", TEST_PASSWORD)]),
    );

    assert_eq!(wrong_password.status, 401);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.body_text(), "Unauthorized");
}

#[test]
fn login_requires_both_fields() {
    let h = Harness::new();
    let response = h
        .server
        .handle(&Request::post("/login/").with_form([("password", TEST_PASSWORD)]));
    assert_eq!(response.status, 400);
    assert_eq!(response.body_text(), "Bad Request: Email address is required.");

    let response = h
        .server
        .handle(&Request::post("/login/").with_form([("email", TEST_EMAIL)]));
    assert_eq!(response.body_text(), "Bad Request: Password is required.");
}

#[test]
fn logout_revokes_the_session() {
    let h = Harness::new();
    assert_eq!(h.send(Request::get("/status")).status, 200);

    let response = h.send(Request::get("/logout/"));
    assert_eq!(response.status, 302);
    assert_eq!(response.header("Location"), Some("/login/"));
    assert!(response.header("Set-Cookie").unwrap().contains("Max-Age=0"));

    let after = h.send(Request::get("/status"));
    assert_eq!(after.status, 302);
    assert_eq!(after.header("Location"), Some("/login/"));
}

#[test]
fn server_errors_hide_detail_from_anonymous_callers() {
    let h = Harness::new();
    std::fs::write(h.credentials.dir().join("tokens.json"), "not json").unwrap();

    let anonymous = h.server.handle(&Request::get("/status"));
    assert_eq!(anonymous.status, 302);

    // The token file is unreadable, so the cookie cannot be resolved.
    let with_cookie = h.send(Request::get("/status"));
    assert_eq!(with_cookie.status, 500);
    assert_eq!(with_cookie.body_text(), "Internal Server Error");
}

#[test]
fn concurrent_writers_get_distinct_revisions() {
    let h = Harness::new();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let server = Arc::clone(&h.server);
            let token = h.token.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|_| {
                        let response = server.handle(
                            &Request::put(tiddler_path("Shared"))
                                .with_cookie(REMEMBER_COOKIE, &token)
                                .with_body("{}"),
                        );
                        response.header("Etag").unwrap().to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut tags: Vec<String> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    tags.sort();
    tags.dedup();
    assert_eq!(tags.len(), 40);
    assert_eq!(json(&h.get("Shared"))["revision"], 40);
}
