use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use quire_blog::build_with;
use quire_core::QuireConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn app() -> Router {
    let config = QuireConfig::with_defaults([
        ("auth.jwt_secret", "http-test-secret"),
        ("auth.bcrypt_cost", "4"),
        ("blob.public_base_url", "http://localhost/blobs"),
    ]);
    build_with(&config.snapshot()).await.unwrap().into_router()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Register and return `(token, uid)`.
async fn register(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": name, "email": email, "password": "correct horse"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["uid"].as_str().unwrap().to_string(),
    )
}

async fn claim_username(app: &Router, token: &str, name: &str, username: &str) {
    let (status, body) = send(
        app,
        request("PATCH", "/profile", Some(token), Some(json!({"name": name, "username": username}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn health_ok() {
    let res = app().await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let res = app().await
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");
}

#[tokio::test]
async fn drafts_require_a_session() {
    let app = app().await;

    let (status, body) = send(&app, request("GET", "/drafts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not authenticated.");

    let (status, body) = send(&app, request("GET", "/drafts", Some("not-a-token"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["name"], "NotAuthenticated");
}

fn in_tenant(mut req: Request<Body>, tenant: &str) -> Request<Body> {
    req.headers_mut().insert("x-tenant-id", tenant.parse().unwrap());
    req
}

#[tokio::test]
async fn sessions_stay_in_their_tenant() {
    let app = app().await;
    let (status, body) = send(
        &app,
        in_tenant(
            request(
                "POST",
                "/auth/register",
                None,
                Some(json!({"name": "Ada", "email": "ada@example.com", "password": "correct horse"})),
            ),
            "acme",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["token"].as_str().unwrap();

    let draft = json!({"title": "cross"});
    let (status, body) = send(
        &app,
        in_tenant(request("POST", "/drafts", Some(token), Some(draft.clone())), "globex"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["name"], "NotAuthenticated");

    let (status, _) = send(
        &app,
        in_tenant(request("POST", "/drafts", Some(token), Some(draft)), "acme"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let res = app().await
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from("{\"email\":"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["errors"]["_schema"].is_array());
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let (status, body) = send(
        &app().await,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "abc"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 6 characters long.");
    assert_eq!(body["data"]["code"], "auth/weak-password");
}

#[tokio::test]
async fn login_returns_a_working_token() {
    let app = app().await;
    register(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ADA@example.com", "password": "correct horse"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().unwrap();

    let (status, body) = send(&app, request("GET", "/profile", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada");
    assert_eq!(body["drafts"], json!([]));
}

#[tokio::test]
async fn draft_images_are_served_and_publish_moves_the_draft() {
    let app = app().await;
    let (token, uid) = register(&app, "Ada", "ada@example.com").await;

    let (status, draft) = send(
        &app,
        request(
            "POST",
            "/drafts",
            Some(&token),
            Some(json!({
                "title": "Hello",
                "content": format!("<p>hi</p><img src=\"{PNG}\">"),
                "hashtags": ["#rust"],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{draft}");
    let content = draft["content"].as_str().unwrap();
    assert!(!content.contains("data:"));
    let src = content
        .split("src=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();
    let path = src.strip_prefix("http://localhost").unwrap();
    assert!(path.starts_with("/blobs/default/images/"));

    let res = app.clone().oneshot(request("GET", path, None, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(res.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(
        res.headers().get("content-security-policy").unwrap(),
        "default-src 'none'; sandbox"
    );
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG\r\n\x1a\n");

    let id = draft["id"].as_str().unwrap();
    let (status, post) = send(
        &app,
        request("POST", &format!("/drafts/{id}/publish"), Some(&token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    assert_eq!(post["title"], "Hello");
    assert_eq!(post["userId"], uid.as_str());
    assert_eq!(post["content"], content);

    let (_, drafts) = send(&app, request("GET", "/drafts", Some(&token), None)).await;
    assert_eq!(drafts, json!([]));

    let post_id = post["id"].as_str().unwrap();
    let (status, read) = send(&app, request("GET", &format!("/posts/{post_id}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["hashtags"], json!(["#rust"]));

    let (status, _) = send(&app, request("GET", &format!("/drafts/{id}"), Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn svg_images_are_refused() {
    let app = app().await;
    let (token, _) = register(&app, "Ada", "ada@example.com").await;
    let svg = "data:image/svg+xml;base64,PHN2ZyBvbmxvYWQ9ImFsZXJ0KDEpIi8+";

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/drafts",
            Some(&token),
            Some(json!({"title": "x", "content": format!("<img src=\"{svg}\">")})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only PNG, JPEG, GIF and WebP images can be uploaded.");

    let (_, drafts) = send(&app, request("GET", "/drafts", Some(&token), None)).await;
    assert_eq!(drafts, json!([]));
}

#[tokio::test]
async fn other_users_cannot_touch_a_draft() {
    let app = app().await;
    let (ada, _) = register(&app, "Ada", "ada@example.com").await;
    let (bob, _) = register(&app, "Bob", "bob@example.com").await;

    let (_, draft) = send(&app, request("POST", "/drafts", Some(&ada), Some(json!({"title": "mine"})))).await;
    let id = draft["id"].as_str().unwrap();

    let (status, body) = send(&app, request("DELETE", &format!("/drafts/{id}"), Some(&bob), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only change your own drafts.");

    let (status, _) = send(&app, request("DELETE", &format!("/drafts/{id}"), Some(&ada), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn follow_and_unfollow_keep_counters_in_step() {
    let app = app().await;
    let (ada, ada_uid) = register(&app, "Ada", "ada@example.com").await;
    let (bob, _) = register(&app, "Bob", "bob@example.com").await;
    claim_username(&app, &ada, "Ada", "ada").await;
    claim_username(&app, &bob, "Bob", "bob").await;

    let (status, _) = send(&app, request("POST", "/users/bob/follow", Some(&ada), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, request("POST", "/users/bob/follow", Some(&ada), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You are already following this user.");

    let (_, profile) = send(&app, request("GET", "/users/bob", Some(&ada), None)).await;
    assert_eq!(profile["isFollowing"], json!(true));
    assert_eq!(profile["user"]["followersCount"], 1);
    assert!(profile["user"].get("email").is_none());

    let (_, followers) = send(&app, request("GET", "/users/bob/followers", None, None)).await;
    assert_eq!(followers[0]["uid"], ada_uid.as_str());
    assert!(followers[0].get("email").is_none());
    let (_, following) = send(&app, request("GET", "/users/ada/following", None, None)).await;
    assert_eq!(following[0]["username"], "bob");

    let (status, _) = send(&app, request("DELETE", "/users/bob/follow", Some(&ada), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, profile) = send(&app, request("GET", "/users/bob", None, None)).await;
    assert_eq!(profile["isFollowing"], json!(false));
    assert_eq!(profile["user"]["followersCount"], 0);
    let (_, ada_profile) = send(&app, request("GET", "/users/ada", None, None)).await;
    assert_eq!(ada_profile["user"]["followingCount"], 0);
}

#[tokio::test]
async fn anonymous_follow_is_unauthorized() {
    let app = app().await;
    let (bob, _) = register(&app, "Bob", "bob@example.com").await;
    claim_username(&app, &bob, "Bob", "bob").await;

    let (status, _) = send(&app, request("POST", "/users/bob/follow", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn usernames_are_claimed_once() {
    let app = app().await;
    let (ada, _) = register(&app, "Ada", "ada@example.com").await;
    let (bob, _) = register(&app, "Bob", "bob@example.com").await;
    claim_username(&app, &ada, "Ada", "ada").await;

    let (_, availability) = send(
        &app,
        request("GET", "/profile/username-available?username=ADA", Some(&bob), None),
    )
    .await;
    assert_eq!(availability, json!({"available": false}));

    let (status, body) = send(
        &app,
        request("PATCH", "/profile", Some(&bob), Some(json!({"name": "Bob", "username": "Ada"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username is already taken.");
}

#[tokio::test]
async fn profile_patch_leaves_absent_fields_alone() {
    let app = app().await;
    let (ada, _) = register(&app, "Ada", "ada@example.com").await;
    let (bob, _) = register(&app, "Bob", "bob@example.com").await;
    claim_username(&app, &ada, "Ada", "ada").await;

    let (status, user) = send(
        &app,
        request("PATCH", "/profile", Some(&ada), Some(json!({"bio": "hello"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{user}");
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["username"], "ada");
    assert_eq!(user["bio"], "hello");

    let (_, availability) = send(
        &app,
        request("GET", "/profile/username-available?username=ada", Some(&bob), None),
    )
    .await;
    assert_eq!(availability, json!({"available": false}));
}

#[tokio::test]
async fn unknown_blob_is_not_found() {
    let (status, body) = send(&app().await, request("GET", "/blobs/default/images/missing", None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "File not found.");
}
