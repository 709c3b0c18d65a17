use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, ServerConfig, Todo, API_KEY_HEADER};
use tower::ServiceExt;

const KEY: &str = "test-key";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, KEY)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, KEY)
        .body(body.to_string())
        .unwrap()
}

fn server() -> axum::Router {
    app(ServerConfig::new(KEY))
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401_with_error_body() {
    let resp = server()
        .oneshot(
            Request::builder()
                .uri("/todos/0xabc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn exhausted_credits_return_429() {
    use tower::Service;

    let mut app = app(ServerConfig::new(KEY).with_credits(1)).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/todos/0xabc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/todos/0xabc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "API credits exhausted");
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201_with_id() {
    let resp = server()
        .oneshot(json_request("POST", "/todos", r#"{"txHash":"0xabc","value":2}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn create_todo_non_positive_value_returns_422() {
    let resp = server()
        .oneshot(json_request("POST", "/todos", r#"{"txHash":"0xabc","value":0}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Value must be positive");
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let resp = server()
        .oneshot(json_request("POST", "/todos", r#"{"not_tx_hash":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get / update / delete on missing records ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = server().oneshot(request("GET", "/todos/0xmissing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Todo not found");
}

#[tokio::test]
async fn update_todo_not_found() {
    let resp = server()
        .oneshot(json_request("PUT", "/todos/0xmissing", r#"{"value":3}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = server()
        .oneshot(request("DELETE", "/todos/0xmissing"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = server().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/todos", r#"{"txHash":"0xabc","value":2}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    // duplicate create is rejected
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/todos", r#"{"txHash":"0xabc","value":9}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/todos/0xabc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched.id.to_string(), id);
    assert_eq!(fetched.tx_hash, "0xabc");
    assert_eq!(fetched.value, 2.0);

    // update value
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/todos/0xabc", r#"{"value":10}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/todos/0xabc"))
        .await
        .unwrap();
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.value, 10.0);
    assert_eq!(updated.tx_hash, "0xabc"); // unchanged

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", "/todos/0xabc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/todos/0xabc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
