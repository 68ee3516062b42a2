use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use serde_json::Value;

use crate::completion::{panic_message, Completion};
use crate::error::{JimboError, Result};

use super::dto::{Handler, MethodDefinition};
use super::validation::Validator;

/// The canonical `(params, completion)` form of a registered method.
pub struct MethodInvoker {
    name: String,
    validator: Option<Validator>,
    handler: Handler,
}

pub fn build_invocation(definition: MethodDefinition) -> Result<MethodInvoker> {
    let validator = definition
        .validation_rule
        .as_ref()
        .map(Validator::compile)
        .transpose()?;

    Ok(MethodInvoker {
        name: definition.name,
        validator,
        handler: definition.handler,
    })
}

impl MethodInvoker {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_validated(&self) -> bool {
        self.validator.is_some()
    }

    pub fn handler_kind(&self) -> &'static str {
        self.handler.kind()
    }

    /// Validates `params`, runs the handler and fires `completion` once.
    ///
    /// Async handlers are driven on the ambient tokio runtime. Without one the
    /// completion gets an `Internal` error instead.
    pub fn invoke(&self, params: Value, completion: Completion) {
        tracing::debug!("{} called with params: {}", self.name, params);

        let params = match &self.validator {
            None => params,
            Some(validator) => match validator.validate(params) {
                Ok(params) => params,
                Err(failure) => {
                    tracing::debug!("{} validation failed: {}", self.name, failure.summary());
                    completion.fail(JimboError::Validation(failure));
                    return;
                }
            },
        };

        self.dispatch(params, logged(self.name.clone(), completion));
    }

    pub async fn call(&self, params: Value) -> Result<Value> {
        let (completion, pending) = Completion::channel();
        self.invoke(params, completion);
        pending.await
    }

    pub fn call_with<F>(&self, params: Value, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.invoke(params, Completion::new(callback));
    }

    fn dispatch(&self, params: Value, completion: Completion) {
        match &self.handler {
            Handler::Callback(f) => {
                let guard = completion.guard();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(params, completion)));
                if let Err(payload) = outcome {
                    guard.fire(Err(JimboError::handler(panic_message(payload.as_ref()))));
                }
            }
            Handler::Returning(f) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| f(params)))
                    .unwrap_or_else(|payload| {
                        Err(JimboError::handler(panic_message(payload.as_ref())))
                    });
                completion.complete(result);
            }
            Handler::Async(f) => {
                let runtime = match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        completion.fail(JimboError::internal(format!(
                            "{} needs a tokio runtime to run its async handler: {}",
                            self.name, e
                        )));
                        return;
                    }
                };
                let future = match panic::catch_unwind(AssertUnwindSafe(|| f(params))) {
                    Ok(future) => future,
                    Err(payload) => {
                        completion.fail(JimboError::handler(panic_message(payload.as_ref())));
                        return;
                    }
                };
                runtime.spawn(async move {
                    let result = AssertUnwindSafe(future)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| {
                            Err(JimboError::handler(panic_message(payload.as_ref())))
                        });
                    completion.complete(result);
                });
            }
        }
    }
}

impl std::fmt::Debug for MethodInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInvoker")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("validated", &self.is_validated())
            .finish()
    }
}

fn logged(name: String, completion: Completion) -> Completion {
    Completion::new(move |result: Result<Value>| {
        match &result {
            Ok(value) => tracing::debug!("{} handler successfully executed. Result: {}", name, value),
            Err(err) => tracing::debug!("{} handler failed. Error details: {}", name, err),
        }
        completion.complete(result);
    })
}
