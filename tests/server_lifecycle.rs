use jimbo::methods::{Handler, InjectOptions, MethodOptions};
use jimbo::plugins::{PluginDescriptor, SystemPlugin};
use jimbo::rpc::RpcRequest;
use jimbo::transport::{MemoryBroker, Transport};
use jimbo::{ConnectionOptions, JimboConfig, JimboError, JimboServer};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::oneshot;

fn echo_server() -> JimboServer {
    let server = JimboServer::new();
    server
        .method(MethodOptions::new("echo").with_handler(Handler::returning(Ok)))
        .unwrap();
    server
}

#[tokio::test]
async fn start_without_connection_is_a_config_error() {
    let server = echo_server();

    let err = server.start().await.unwrap_err();
    assert!(matches!(err, JimboError::ConfigError(_)));
    assert!(server.transport().is_none());
}

#[tokio::test]
async fn start_on_memory_url() {
    let server = echo_server();
    server.connection(ConnectionOptions::new("memory://local", "jobs"));

    server.start().await.unwrap();

    let transport = server.transport().expect("transport attached");
    assert_eq!(transport.name(), "memory");
}

#[tokio::test]
async fn start_with_reports_through_callback() {
    let server = echo_server();
    server.connection(ConnectionOptions::new("memory://local", "jobs"));

    let (tx, rx) = oneshot::channel();
    server.start_with(move |result| {
        let _ = tx.send(result);
    });

    assert!(rx.await.unwrap().is_ok());
    assert!(server.transport().is_some());
}

#[tokio::test]
async fn start_with_unsupported_url_reports_error() {
    let server = echo_server();
    server.connection(ConnectionOptions::new("amqp://localhost:5672", "jobs"));

    let (tx, rx) = oneshot::channel();
    server.start_with(move |result| {
        let _ = tx.send(result);
    });

    let err = rx.await.unwrap().unwrap_err();
    assert!(matches!(err, JimboError::ConfigError(_)));
}

#[tokio::test]
async fn registered_methods_are_served_by_the_broker() {
    let server = echo_server();
    let broker = Arc::new(MemoryBroker::new("jobs"));

    server.start_on(broker.clone()).await.unwrap();

    assert!(broker.is_started());
    assert_eq!(broker.method_names().unwrap(), vec!["echo"]);
    let result = broker.request("echo", json!({ "x": 1 })).await.unwrap();
    assert_eq!(result, json!({ "x": 1 }));

    let response = broker
        .dispatch(RpcRequest::new(json!(1), "missing", json!({})))
        .await;
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn broker_rejects_calls_before_start() {
    let broker = MemoryBroker::new("jobs");

    let err = broker.request("echo", json!({})).await.unwrap_err();
    assert!(matches!(err, JimboError::Transport(_)));
}

#[tokio::test]
async fn methods_added_after_start_are_not_attached() {
    let server = echo_server();
    let broker = Arc::new(MemoryBroker::new("jobs"));
    server.start_on(broker.clone()).await.unwrap();

    server
        .method(MethodOptions::new("late").with_handler(Handler::returning(Ok)))
        .unwrap();

    assert!(!broker.method_names().unwrap().contains(&"late".to_string()));
    let err = broker.request("late", json!({})).await.unwrap_err();
    assert!(matches!(err, JimboError::MethodNotFound(_)));
    // Still reachable in-process.
    assert!(server.inject(InjectOptions::new("late", json!(1))).await.is_ok());
}

#[tokio::test]
async fn config_wires_the_connection() {
    let config = JimboConfig::from_toml(
        r#"
        [server]
        name = "lifecycle"
        log_level = "debug"

        [connection]
        url = "memory://local"
        channel = "from-config"
        "#,
    )
    .unwrap();

    let server = JimboServer::with_config(&config);
    let options = server.connection_options().expect("connection set");
    assert_eq!(options.channel, "from-config");

    server.start().await.unwrap();
    assert_eq!(server.transport().unwrap().name(), "memory");
}

#[tokio::test]
async fn system_plugin_methods() {
    let server = JimboServer::new();
    server
        .register(vec![PluginDescriptor::new(SystemPlugin::new("jimbo-test"))])
        .await
        .unwrap();

    assert!(server.root().has_capability("started_at"));
    let version = server
        .root()
        .plugin("system")
        .and_then(|ns| ns.get::<String>("version"))
        .expect("version exposed");
    assert_eq!(version.as_str(), env!("CARGO_PKG_VERSION"));

    let pong = server
        .inject(InjectOptions::new("system.ping", json!({})))
        .await
        .unwrap();
    assert_eq!(pong["ok"], true);
    assert_eq!(pong["server"], "jimbo-test");

    let echoed = server
        .inject(InjectOptions::new("system.echo", json!({ "message": "hi" })))
        .await
        .unwrap();
    assert_eq!(echoed, json!({ "message": "hi" }));

    let err = server
        .inject(InjectOptions::new("system.echo", json!({ "message": 5 })))
        .await
        .unwrap_err();
    assert_eq!(err.details().unwrap()[0].message, "\"message\" must be a string");
}

#[tokio::test]
async fn clones_share_state() {
    let server = JimboServer::new();
    let clone = server.clone();

    clone
        .method(MethodOptions::new("shared").with_handler(Handler::returning(Ok)))
        .unwrap();

    assert!(server.methods().contains("shared"));
    assert!(server.root().same_root(clone.root()));
}
