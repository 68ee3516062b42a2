use serde_json::{json, Value};

use crate::error::JimboError;
use crate::methods::MethodRegistry;

use super::dto::{RpcError, RpcRequest, RpcResponse};

pub async fn handle_request(methods: &MethodRegistry, request: RpcRequest) -> RpcResponse {
    let params = request.params.unwrap_or(Value::Null);

    match methods.get(&request.method) {
        Ok(invoker) => match invoker.call(params).await {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(err) => RpcResponse::failure(request.id, RpcError::from(&err)),
        },
        Err(JimboError::MethodNotFound(_)) if request.method == "ping" => {
            RpcResponse::success(request.id, json!({ "ok": true }))
        }
        Err(err) => {
            tracing::debug!("Rejecting call to {}: {}", request.method, err);
            RpcResponse::failure(request.id, RpcError::from(&err))
        }
    }
}

/// Parses one JSON-RPC line and answers it; malformed input gets a parse error.
///
/// Notifications (no `id`) are still run, but produce no response.
pub async fn handle_line(methods: &MethodRegistry, line: &str) -> Option<RpcResponse> {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) if request.is_notification() => {
            let method = request.method.clone();
            let response = handle_request(methods, request).await;
            if let Some(error) = response.error {
                tracing::debug!("Notification {} failed: {}", method, error.message);
            }
            None
        }
        Ok(request) => Some(handle_request(methods, request).await),
        Err(e) => {
            tracing::error!("Failed to parse request: {}", e);
            Some(RpcResponse::failure(None, RpcError::parse_error(e)))
        }
    }
}
