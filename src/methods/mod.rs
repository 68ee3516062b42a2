pub mod dto;
pub mod handler;
pub mod registry;
pub mod validation;

pub use dto::{Handler, InjectOptions, MethodConfig, MethodDefinition, MethodOptions};
pub use handler::{build_invocation, MethodInvoker};
pub use registry::MethodRegistry;
pub use validation::Validator;
