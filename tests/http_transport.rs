use jimbo::methods::{Handler, MethodOptions};
use jimbo::transport::{HttpTransport, Transport};
use jimbo::JimboServer;
use serde_json::{json, Value};
use std::sync::Arc;

async fn serve() -> (JimboServer, String) {
    let server = JimboServer::new();
    server
        .method(
            MethodOptions::new("greet")
                .with_validation(json!({
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }))
                .with_handler(Handler::returning(|params| {
                    Ok(json!(format!("hello {}", params["name"].as_str().unwrap_or_default())))
                })),
        )
        .unwrap();

    let transport = Arc::new(HttpTransport::new("127.0.0.1:0", "rpc"));
    server.start_on(transport.clone()).await.unwrap();
    let addr = transport.local_addr().expect("bound address");

    (server, format!("http://{}{}", addr, transport.route()))
}

async fn post(url: &str, body: impl Into<reqwest::Body>) -> Value {
    reqwest::Client::new()
        .post(url)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn successful_call_returns_result() {
    let (_server, url) = serve().await;

    let response = post(
        &url,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "greet", "params": { "name": "jimbo" } })
            .to_string(),
    )
    .await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"], "hello jimbo");
    assert!(response["error"].is_null());
}

#[tokio::test]
async fn invalid_params_return_validation_details() {
    let (_server, url) = serve().await;

    let response = post(
        &url,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "greet", "params": { "name": 7 } }).to_string(),
    )
    .await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(
        response["error"]["data"]["details"][0]["message"],
        "\"name\" must be a string"
    );
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let (_server, url) = serve().await;

    let response = post(
        &url,
        json!({ "jsonrpc": "2.0", "id": 3, "method": "nope" }).to_string(),
    )
    .await;

    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let (_server, url) = serve().await;

    let response = post(&url, "{not json").await;

    assert_eq!(response["error"]["code"], -32700);
    assert!(response["id"].is_null());
}

#[tokio::test]
async fn ping_is_answered_without_a_method() {
    let (_server, url) = serve().await;

    let response = post(
        &url,
        json!({ "jsonrpc": "2.0", "id": "p", "method": "ping" }).to_string(),
    )
    .await;

    assert_eq!(response["result"], json!({ "ok": true }));
}

#[tokio::test]
async fn second_start_is_rejected() {
    let transport = HttpTransport::new("127.0.0.1:0", "rpc");
    transport.start().await.unwrap();

    assert!(transport.start().await.is_err());
}

#[tokio::test]
async fn notification_gets_no_content() {
    let (_server, url) = serve().await;

    let response = reqwest::Client::new()
        .post(&url)
        .body(json!({ "jsonrpc": "2.0", "method": "greet", "params": { "name": "x" } }).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert!(response.text().await.unwrap().is_empty());
}
