use jimbo::methods::{Handler, InjectOptions, MethodOptions};
use jimbo::{ConnectionOptions, JimboError, JimboServer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn test_server() -> JimboServer {
    let server = JimboServer::new();
    server.connection(ConnectionOptions::new("memory://local", "tests"));
    server
}

fn bar_rule() -> Value {
    json!({
        "type": "object",
        "properties": { "bar": { "type": "string" } },
        "required": ["bar"]
    })
}

fn counting_handler(calls: Arc<AtomicUsize>) -> Handler {
    Handler::callback(move |params, completion| {
        calls.fetch_add(1, Ordering::SeqCst);
        completion.ok(params);
    })
}

#[tokio::test]
async fn handler_not_executed_when_validation_fails() {
    let server = test_server();
    let calls = Arc::new(AtomicUsize::new(0));
    server
        .method(
            MethodOptions::new("foo")
                .with_validation(bar_rule())
                .with_handler(counting_handler(Arc::clone(&calls))),
        )
        .unwrap();

    let err = server
        .inject(InjectOptions::new("foo", json!({ "bar": 1 })))
        .await
        .unwrap_err();

    assert!(matches!(err, JimboError::Validation(_)));
    let details = err.details().expect("validation details");
    assert_eq!(details[0].message, "\"bar\" must be a string");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_executed_when_validation_passes() {
    let server = test_server();
    let seen = Arc::new(std::sync::Mutex::new(None::<Value>));
    let sink = Arc::clone(&seen);
    server
        .method(
            MethodOptions::new("foo")
                .with_validation(bar_rule())
                .with_handler(Handler::callback(move |params, completion| {
                    *sink.lock().unwrap() = Some(params);
                    completion.ok(Value::Null);
                })),
        )
        .unwrap();

    let result = server
        .inject(InjectOptions::new("foo", json!({ "bar": "some string" })))
        .await;
    assert_ok!(result);

    let params = seen.lock().unwrap().clone().expect("handler ran");
    assert_eq!(params["bar"], "some string");
}

#[tokio::test]
async fn params_reach_handler_unchanged_without_rule() {
    let server = test_server();
    server
        .method(MethodOptions::new("echo").with_handler(Handler::returning(Ok)))
        .unwrap();

    for params in [
        json!(null),
        json!(42),
        json!("text"),
        json!([1, { "nested": true }]),
        json!({ "bar": 1, "deep": { "list": [null, 2.5] } }),
    ] {
        let result = server
            .inject(InjectOptions::new("echo", params.clone()))
            .await
            .unwrap();
        assert_eq!(result, params);
    }
}

#[tokio::test]
async fn missing_required_field_reports_details() {
    let server = test_server();
    let calls = Arc::new(AtomicUsize::new(0));
    server
        .method(
            MethodOptions::new("foo")
                .with_validation(bar_rule())
                .with_handler(counting_handler(Arc::clone(&calls))),
        )
        .unwrap();

    let err = assert_err!(server.inject(InjectOptions::new("foo", json!({}))).await);
    assert_eq!(err.details().unwrap()[0].message, "\"bar\" is required");
    assert_eq!(err.rpc_code(), -32602);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_validation_gives_same_outcome() {
    let server = test_server();
    server
        .method(
            MethodOptions::new("foo")
                .with_validation(bar_rule())
                .with_handler(Handler::returning(Ok)),
        )
        .unwrap();

    let first = server
        .inject(InjectOptions::new("foo", json!({ "bar": [] })))
        .await
        .unwrap_err();
    let second = server
        .inject(InjectOptions::new("foo", json!({ "bar": [] })))
        .await
        .unwrap_err();
    assert_eq!(first.details(), second.details());
}

#[test]
fn missing_name_is_invalid_argument() {
    let server = JimboServer::new();
    let options = MethodOptions {
        name: None,
        handler: Some(Handler::returning(Ok)),
        config: None,
    };

    let err = server.method(options).unwrap_err();
    assert!(matches!(err, JimboError::InvalidArgument(ref msg) if msg == "name is required"));
    assert!(server.methods().is_empty());
}

#[test]
fn missing_handler_is_invalid_argument() {
    let server = JimboServer::new();

    let err = server.method(MethodOptions::new("foo")).unwrap_err();
    assert!(matches!(err, JimboError::InvalidArgument(ref msg) if msg == "handler is required"));
    assert!(!server.methods().contains("foo"));
}

#[test]
fn uncompilable_rule_is_rejected_at_registration() {
    let server = JimboServer::new();

    let err = server
        .method(
            MethodOptions::new("foo")
                .with_validation(json!({ "type": 12 }))
                .with_handler(Handler::returning(Ok)),
        )
        .unwrap_err();
    assert!(matches!(err, JimboError::InvalidArgument(_)));
    assert!(server.methods().is_empty());
}
