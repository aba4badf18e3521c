use crate::server::{ServerState, routes};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use feedgraph_common::{
    model::auth::{AuthToken, Authentication},
    util::PositiveDuration,
};
use feedgraph_db::memory::MemoryStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use time::{Duration, UtcDateTime};
use tower::ServiceExt;

struct TestApp {
    store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = routes().with_state(ServerState {
            store: store.clone(),
        });

        Self { store, router }
    }

    /// A user without a profile, returning its bearer token.
    fn user(&self, is_staff: bool) -> String {
        let user = self.store.create_user(is_staff);
        self.store.issue_token(user.id).unwrap().as_token_str()
    }

    /// A user with a profile named `username`, returning its bearer token and
    /// the profile id.
    async fn profile(&self, username: &str, is_staff: bool) -> (String, u64) {
        let token = self.user(is_staff);
        let (status, body) = self
            .request(
                Method::POST,
                "/profiles",
                Some(&token),
                Some(json!({ "username": username })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        (token, body["id"].as_u64().unwrap())
    }

    async fn post(&self, token: &str, title: &str) -> u64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/posts",
                Some(token),
                Some(json!({ "title": title, "content": "Test Content" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        body["id"].as_u64().unwrap()
    }

    async fn follow(&self, token: &str, profile: u64) {
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/profiles/{profile}/follow"),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }
}

fn titles(page: &Value) -> Vec<&str> {
    page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn feed_contains_own_and_followed_posts() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    let (bob, bob_profile) = app.profile("bob", false).await;
    let (carol, carol_profile) = app.profile("carol", false).await;
    let (dora, _) = app.profile("dora", false).await;
    let (staff, _) = app.profile("erin", true).await;

    app.follow(&alice, bob_profile).await;
    app.follow(&alice, carol_profile).await;
    app.post(&bob, "Bob One").await;
    app.post(&dora, "Dora One").await;
    app.post(&carol, "Carol One").await;
    app.post(&alice, "Alice One").await;

    let (status, feed) = app.get("/posts", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["count"], 3);
    assert_eq!(titles(&feed), ["Alice One", "Carol One", "Bob One"]);

    let (_, feed) = app.get("/posts", &bob).await;
    assert_eq!(titles(&feed), ["Bob One"]);

    let (_, feed) = app.get("/posts", &dora).await;
    assert_eq!(titles(&feed), ["Dora One"]);

    let (_, feed) = app.get("/posts", &staff).await;
    assert_eq!(feed["count"], 4);
    assert_eq!(
        titles(&feed),
        ["Alice One", "Carol One", "Dora One", "Bob One"]
    );
}

#[tokio::test]
async fn feed_filters_by_profile() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, bob_profile) = app.profile("bob", false).await;
    app.follow(&alice, bob_profile).await;
    app.post(&alice, "Alice One").await;
    app.post(&bob, "Bob One").await;

    let (_, feed) = app
        .get(&format!("/posts?profile={bob_profile}"), &alice)
        .await;
    assert_eq!(titles(&feed), ["Bob One"]);

    let (_, feed) = app
        .get(&format!("/posts?profile={alice_profile}"), &bob)
        .await;
    assert_eq!(feed["count"], 0);
}

#[tokio::test]
async fn unreadable_post_is_forbidden_and_unknown_post_not_found() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    let (carol, _) = app.profile("carol", false).await;
    let post = app.post(&carol, "Private").await;

    let (status, body) = app.get(&format!("/posts/{post}"), &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "forbidden");

    let (status, body) = app.get("/posts/1", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "not_found");

    let (status, _) = app.get(&format!("/posts/{post}"), &carol).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn content_endpoints_require_a_profile() {
    let app = TestApp::new();
    let token = app.user(false);

    for uri in ["/posts", "/comments", "/profiles", "/reactions"] {
        let (status, body) = app.get(uri, &token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["reason"], "missing_profile", "{uri}");
    }

    let staff = app.user(true);
    let (status, body) = app.get("/posts", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "missing_profile");

    let (status, body) = app.get("/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"], Value::Null);
    assert_eq!(body["user"]["is_staff"], false);
}

#[tokio::test]
async fn requests_need_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "unauthorized");

    let (status, _) = app.get("/posts", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/nowhere", "not-a-token").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let app = TestApp::new();
    let user = app.store.create_user(false);
    let token = AuthToken::generate_random(user.id);
    app.store.insert_authentication(Authentication {
        user: user.id,
        token_hash: token.hash().unwrap(),
        created_at: UtcDateTime::now() - Duration::hours(2),
        expires_after: PositiveDuration::new(Duration::hours(1)),
    });

    let (status, body) = app.get("/users/me", &token.as_token_str()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "unauthorized");
}

#[tokio::test]
async fn only_the_owner_modifies_a_post() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, _) = app.profile("bob", false).await;
    let (staff, _) = app.profile("dora", true).await;
    app.follow(&bob, alice_profile).await;
    let post = app.post(&alice, "Test Post").await;
    let uri = format!("/posts/{post}");
    let replacement = json!({ "title": "Edited", "content": "New Content" });

    for token in [&bob, &staff] {
        let (status, _) = app.get(&uri, token).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .request(Method::PUT, &uri, Some(token), Some(replacement.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "forbidden");

        let (status, _) = app.request(Method::DELETE, &uri, Some(token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&alice), Some(replacement))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Edited");
    assert_eq!(body["slug"], "test-post");

    let (status, body) = app.request(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.get(&uri, &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn equal_titles_get_distinct_slugs() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    let first = app.post(&alice, "Test Post").await;
    let second = app.post(&alice, "Test Post").await;

    let (_, first) = app.get(&format!("/posts/{first}"), &alice).await;
    let (_, second) = app.get(&format!("/posts/{second}"), &alice).await;
    assert_eq!(first["slug"], "test-post");
    assert_eq!(second["slug"], "test-post-1");
}

#[tokio::test]
async fn one_reaction_per_author_and_post() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    let post = app.post(&alice, "Test Post").await;
    let uri = format!("/posts/{post}/reactions");

    let (status, body) = app
        .request(Method::POST, &uri, Some(&alice), Some(json!({ "status": "LIKE" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "LIKE");

    for repeated in ["LIKE", "UNLIKE"] {
        let (status, body) = app
            .request(Method::POST, &uri, Some(&alice), Some(json!({ "status": repeated })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "precondition_failed");
    }

    let (_, body) = app.get(&format!("/posts/{post}"), &alice).await;
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["unlikes_count"], 0);

    let (_, liked) = app.get("/reactions?status=LIKE", &alice).await;
    assert_eq!(liked.as_array().unwrap().len(), 1);
    assert_eq!(liked[0]["title"], "Test Post");
    let (_, unliked) = app.get("/reactions?status=UNLIKE", &alice).await;
    assert_eq!(unliked, json!([]));

    let (status, _) = app
        .request(Method::POST, &uri, Some(&alice), Some(json!({ "status": "LOVE" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reacting_needs_a_readable_post() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    let (carol, _) = app.profile("carol", false).await;
    let post = app.post(&carol, "Private").await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/posts/{post}/reactions"),
            Some(&alice),
            Some(json!({ "status": "UNLIKE" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "forbidden");
}

#[tokio::test]
async fn follow_is_idempotent_and_self_follow_rejected() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (carol, _) = app.profile("carol", false).await;
    let (_, bob_profile) = app.profile("bob", false).await;
    let follow_uri = format!("/profiles/{bob_profile}/follow");

    for _ in 0..2 {
        let (status, body) = app
            .request(Method::POST, &follow_uri, Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile_id"], bob_profile);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["is_following"], true);
    }
    app.follow(&carol, bob_profile).await;

    let (_, followers) = app
        .get(&format!("/profiles/{bob_profile}/followers"), &alice)
        .await;
    let names: Vec<&str> = followers
        .as_array()
        .unwrap()
        .iter()
        .map(|profile| profile["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", "carol"]);

    let (_, following) = app
        .get(&format!("/profiles/{alice_profile}/following"), &alice)
        .await;
    assert_eq!(following[0]["username"], "bob");

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/profiles/{alice_profile}/follow"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "precondition_failed");

    let (status, _) = app
        .request(Method::POST, "/profiles/1/follow", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_shape_follows_the_relation() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, bob_profile) = app.profile("bob", false).await;
    let (staff, _) = app.profile("dora", true).await;
    app.post(&bob, "Bob One").await;
    let bob_uri = format!("/profiles/{bob_profile}");

    let (status, summary) = app.get(&bob_uri, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["username"], "bob");
    assert_eq!(summary["followers_count"], 0);
    assert!(summary.get("posts").is_none());
    assert!(summary.get("is_following").is_none());

    app.follow(&alice, bob_profile).await;
    let (_, detail) = app.get(&bob_uri, &alice).await;
    assert_eq!(detail["followers_count"], 1);
    assert_eq!(detail["is_following"], true);
    assert_eq!(detail["posts"][0]["title"], "Bob One");

    let (_, detail) = app.get(&bob_uri, &staff).await;
    assert_eq!(detail["is_following"], false);
    assert_eq!(detail["posts"].as_array().unwrap().len(), 1);

    let (_, own) = app.get(&format!("/profiles/{alice_profile}"), &alice).await;
    assert_eq!(own["posts"], json!([]));
}

#[tokio::test]
async fn profile_management() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, _) = app.profile("bob", false).await;
    let alice_uri = format!("/profiles/{alice_profile}");

    let (status, body) = app
        .request(
            Method::POST,
            "/profiles",
            Some(&alice),
            Some(json!({ "username": "alice2" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "precondition_failed");

    let newcomer = app.user(false);
    let (status, body) = app
        .request(
            Method::POST,
            "/profiles",
            Some(&newcomer),
            Some(json!({ "username": "bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "precondition_failed");

    let (status, _) = app
        .request(
            Method::PUT,
            &alice_uri,
            Some(&bob),
            Some(json!({ "username": "mallory" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::PUT,
            &alice_uri,
            Some(&alice),
            Some(json!({ "username": "alicia", "city": "Berlin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alicia");
    assert_eq!(body["city"], "Berlin");

    let (status, body) = app
        .request(Method::POST, "/profiles", Some(&newcomer), Some(json!({ "username": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "bad_request");
}

#[tokio::test]
async fn deleting_a_profile_removes_its_content() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, _) = app.profile("bob", false).await;
    app.follow(&bob, alice_profile).await;
    let post = app.post(&alice, "Alice One").await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/profiles/{alice_profile}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/profiles/{alice_profile}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, feed) = app.get("/posts", &bob).await;
    assert_eq!(feed["count"], 0);
    let (status, _) = app.get(&format!("/posts/{post}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.get("/posts", &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "missing_profile");
}

#[tokio::test]
async fn comments_follow_post_visibility() {
    let app = TestApp::new();
    let (alice, alice_profile) = app.profile("alice", false).await;
    let (bob, _) = app.profile("bob", false).await;
    let (carol, _) = app.profile("carol", false).await;
    app.follow(&bob, alice_profile).await;
    let post = app.post(&alice, "Alice One").await;
    let comments_uri = format!("/posts/{post}/comments");

    let (status, comment) = app
        .request(
            Method::POST,
            &comments_uri,
            Some(&bob),
            Some(json!({ "content": "Nice post" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["owner"], "bob");
    let comment_uri = format!("/comments/{}", comment["id"].as_u64().unwrap());

    let (status, _) = app
        .request(
            Method::POST,
            &comments_uri,
            Some(&carol),
            Some(json!({ "content": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, detail) = app.get(&format!("/posts/{post}"), &alice).await;
    assert_eq!(detail["comments"][0]["content"], "Nice post");

    let (_, listed) = app.get(&comments_uri, &bob).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, scoped) = app.get("/comments", &carol).await;
    assert_eq!(scoped["count"], 0);
    let (_, scoped) = app.get("/comments", &alice).await;
    assert_eq!(scoped["count"], 1);

    let (status, _) = app.get(&comment_uri, &carol).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let edit = json!({ "content": "Edited" });
    let (status, _) = app
        .request(Method::PUT, &comment_uri, Some(&alice), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .request(Method::PUT, &comment_uri, Some(&bob), Some(edit))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Edited");

    let (status, _) = app
        .request(Method::DELETE, &comment_uri, Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&comment_uri, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_are_paginated() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    for n in 0..12 {
        app.post(&alice, &format!("Post {n}")).await;
    }

    let (_, page) = app.get("/posts", &alice).await;
    assert_eq!(page["count"], 12);
    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 10);
    assert_eq!(titles(&page).len(), 10);
    assert_eq!(titles(&page)[0], "Post 11");

    let (_, page) = app.get("/posts?page=3&per_page=5", &alice).await;
    assert_eq!(titles(&page), ["Post 1", "Post 0"]);

    let (_, page) = app.get("/posts?per_page=1000", &alice).await;
    assert_eq!(page["per_page"], 100);

    let (status, body) = app.get("/posts?page=abc", &alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "bad_request");
}

#[tokio::test]
async fn profiles_are_searchable_by_username() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;
    app.profile("bob", false).await;
    app.profile("Malice", false).await;

    let (_, page) = app.get("/profiles", &alice).await;
    assert_eq!(page["count"], 3);

    let (_, page) = app.get("/profiles?search=LIC", &alice).await;
    let names: Vec<&str> = page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|profile| profile["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Malice", "alice"]);
}

#[tokio::test]
async fn error_bodies_hide_nothing_for_client_errors() {
    let app = TestApp::new();
    let (alice, _) = app.profile("alice", false).await;

    let (status, body) = app
        .request(Method::POST, "/posts", Some(&alice), Some(json!({ "title": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["reason"], "bad_request");
    assert!(body["detail"].as_str().is_some_and(|detail| !detail.is_empty()));
}
