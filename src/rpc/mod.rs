pub mod dto;
pub mod handler;

pub use dto::{RpcError, RpcRequest, RpcResponse};
pub use handler::{handle_line, handle_request};
