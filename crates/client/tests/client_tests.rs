//! Integration tests for the campus API client

use campus_client::types::{
    ApprovalStatus, FoodFilters, LoginRequest, PageRequest, PriceRange, User,
};
use campus_client::{
    ApiErrorKind, CampusClient, FilePart, MemorySessionStore, ModerationQueue, Session,
    SessionStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH: &str = "/api/auth/refresh-token";

fn user() -> User {
    User {
        user_id: 42,
        username: "brave-heron".into(),
        email: "heron@example.com".into(),
        phone: None,
        account_status: ApprovalStatus::Approved,
        rejection_reason: None,
        created_at: None,
        approved_at: None,
    }
}

fn signed_in(refresh_token: Option<&str>) -> MemorySessionStore {
    MemorySessionStore::restore(Session {
        user: Some(user()),
        access_token: Some("old-token".into()),
        refresh_token: refresh_token.map(str::to_string),
    })
}

fn client_for(server: &MockServer, store: &MemorySessionStore) -> CampusClient {
    CampusClient::builder()
        .base_url(server.uri())
        .session_store(Arc::new(store.clone()))
        .build()
        .unwrap()
}

async fn mount_refresh(server: &MockServer, delay: Duration, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({ "refreshToken": "refresh-1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "new-token" }))
                .set_delay(delay),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_builder() {
    let client = CampusClient::builder()
        .base_url("http://localhost:8080/")
        .build()
        .unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080");
    assert_eq!(client.session(), Session::default());
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = CampusClient::builder().build();
    assert!(matches!(
        result.map_err(|e| e.kind()),
        Err(ApiErrorKind::Configuration)
    ));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/food/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = CampusClient::new(server.uri()).unwrap();
    let categories = client.food_categories().await.unwrap();
    assert!(categories.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": 42,
            "username": "brave-heron",
            "email": "heron@example.com",
            "accountStatus": "APPROVED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);
    assert_eq!(client.current_user().await.unwrap(), user());
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/food/places/\d+$"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/food/places/\d+$"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, Duration::from_millis(50), 1).await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);
    let other = client.clone();

    let (first, second) = tokio::join!(
        client.get::<Value>("/api/food/places/1"),
        other.get::<Value>("/api/food/places/2"),
    );
    assert_eq!(first.unwrap(), json!({ "ok": true }));
    assert_eq!(second.unwrap(), json!({ "ok": true }));

    let session = store.session();
    assert_eq!(session.access_token.as_deref(), Some("new-token"));
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(session.user, Some(user()));
}

#[tokio::test]
async fn test_retried_request_is_not_refreshed_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, Duration::ZERO, 1).await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let err = client.current_user().await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(err.http_status(), Some(401));
    assert_eq!(store.session().access_token.as_deref(), Some("new-token"));
}

#[tokio::test]
async fn test_refresh_endpoint_401_is_not_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let err = client.refresh_token("refresh-1").await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert!(store.session().is_authenticated());
}

#[tokio::test]
async fn test_missing_refresh_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/suggestion/suggestions/my"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = signed_in(None);
    let client = client_for(&server, &store);

    let err = client.my_suggestions().await.unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(err.to_string(), "Session expired: Token expired");
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn test_failed_login_keeps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Invalid username or password" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemorySessionStore::new();
    let client = client_for(&server, &store);

    let err = client
        .login(&LoginRequest {
            email: "heron@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(err.http_status(), Some(401));
    assert_eq!(err.to_string(), "Unauthorized: Invalid username or password");
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn test_late_401_replays_with_renewed_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": 42,
            "username": "brave-heron",
            "email": "heron@example.com",
            "accountStatus": "APPROVED"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, Duration::ZERO, 0).await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.current_user().await }
    });
    // Another caller renews the token while the first request is in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.set_access_token("new-token".into());

    let me = call.await.unwrap().unwrap();
    assert_eq!(me, user());
    assert_eq!(store.session().access_token.as_deref(), Some("new-token"));
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard/stats"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(403).set_body_string("refresh token expired"))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let err = client.dashboard_stats().await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::AuthExpired);
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn test_refresh_timeout_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hostel/categories"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_refresh(&server, Duration::from_secs(2), 1).await;

    let store = signed_in(Some("refresh-1"));
    let client = CampusClient::builder()
        .base_url(server.uri())
        .refresh_timeout(Duration::from_millis(100))
        .session_store(Arc::new(store.clone()))
        .build()
        .unwrap();

    let err = client.hostel_categories().await.unwrap_err();
    assert!(err.is_auth_expired());
    assert!(err.to_string().contains("timed out"));
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn test_other_errors_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hostel/hostels/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Hostel not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/hostel/hostels/10"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let err = client.hostel(9).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Validation);
    assert_eq!(err.to_string(), "Request rejected (404): Hostel not found");

    let err = client.hostel(10).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Server);
    assert_eq!(err.http_status(), Some(503));

    assert_eq!(store.session().access_token.as_deref(), Some("old-token"));
}

#[tokio::test]
async fn test_network_error_leaves_session() {
    let store = signed_in(Some("refresh-1"));
    let client = CampusClient::builder()
        .base_url("http://127.0.0.1:1")
        .session_store(Arc::new(store.clone()))
        .build()
        .unwrap();

    let err = client.food_place(1).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Network);
    assert!(store.session().is_authenticated());
}

#[tokio::test]
async fn test_login_and_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "heron@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "userId": 42,
                "username": "brave-heron",
                "email": "heron@example.com",
                "accountStatus": "APPROVED"
            },
            "accessToken": "access-1",
            "refreshToken": "refresh-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = MemorySessionStore::new();
    let client = client_for(&server, &store);

    client
        .login(&LoginRequest {
            email: "heron@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    let session = store.session();
    assert_eq!(session.user, Some(user()));
    assert_eq!(session.access_token.as_deref(), Some("access-1"));
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));

    let result = client.logout().await;
    assert_eq!(result.unwrap_err().kind(), ApiErrorKind::Server);
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn test_food_filters_sent_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/food/places"))
        .and(query_param("page", "1"))
        .and(query_param("size", "12"))
        .and(query_param("priceRange", "BUDGET,EXPENSIVE"))
        .and(query_param("categoryIds", "2,5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "size": 12,
            "number": 1,
            "first": false,
            "last": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CampusClient::new(server.uri()).unwrap();
    let filters = FoodFilters {
        price_range: vec![PriceRange::Budget, PriceRange::Expensive],
        category_ids: vec![2, 5],
        ..Default::default()
    };
    let page = PageRequest {
        page: Some(1),
        size: Some(12),
        sort: None,
    };
    let result = client.food_places(&filters, &page).await.unwrap();
    assert!(result.last);
    assert!(result.content.is_empty());
}

#[tokio::test]
async fn test_reject_sends_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/hostels/categories/3/reject"))
        .and(body_json(json!({ "reason": "duplicate" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/users/8/approve"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);
    client
        .reject(ModerationQueue::HostelCategories, 3, "duplicate")
        .await
        .unwrap();
    client.approve(ModerationQueue::Users, 8).await.unwrap();
}

#[tokio::test]
async fn test_multipart_upload_replayed_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/food/images/upload"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/food/images/upload"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!(["https://img.example/1.jpg"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, Duration::ZERO, 1).await;

    let store = signed_in(Some("refresh-1"));
    let client = client_for(&server, &store);

    let urls = client
        .upload_food_images(vec![FilePart {
            field: String::new(),
            file_name: "front.jpg".into(),
            mime: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        }])
        .await
        .unwrap();
    assert_eq!(urls, vec!["https://img.example/1.jpg".to_string()]);

    let requests = server.received_requests().await.unwrap();
    let replay = requests
        .iter()
        .filter(|r| r.url.path() == "/api/food/images/upload")
        .last()
        .unwrap();
    let content_type = replay.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(String::from_utf8_lossy(&replay.body).contains("front.jpg"));
}
