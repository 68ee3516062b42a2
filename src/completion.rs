use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{JimboError, Result};

type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// One-shot completion callback.
///
/// `complete` consumes the handle, and the underlying callback is taken out of
/// a shared slot on the first fire, so it runs at most once no matter how many
/// internal guards point at it. Dropping every handle without firing leaves the
/// caller waiting forever.
pub struct Completion<T = Value> {
    slot: Arc<Mutex<Option<Callback<T>>>>,
}

/// Completion handed to callback-style plugins.
pub type Done = Completion<()>;

impl<T: Send + 'static> Completion<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(callback)))),
        }
    }

    /// A completion paired with a future that resolves when it fires.
    pub fn channel() -> (Self, impl Future<Output = Result<T>> + Send + 'static) {
        let (tx, rx) = oneshot::channel();
        let completion = Self::new(move |result| {
            let _ = tx.send(result);
        });
        let pending = async move {
            match rx.await {
                Ok(result) => result,
                // Never fired: keep the caller pending like any unfinished call.
                Err(_) => std::future::pending().await,
            }
        };
        (completion, pending)
    }

    pub fn complete(self, result: Result<T>) {
        self.fire(result);
    }

    pub fn ok(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, err: JimboError) {
        self.complete(Err(err));
    }

    pub fn is_completed(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    pub(crate) fn guard(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Runs the callback unless something already did. Returns whether it ran.
    pub(crate) fn fire(&self, result: Result<T>) -> bool {
        let callback = match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if Arc::strong_count(&self.slot) > 1 {
            return;
        }
        let pending = match self.slot.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        if pending {
            tracing::warn!("completion dropped without firing; the call will never finish");
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// Drives `future` on the runtime and hands its output to `callback`.
pub fn spawn_with_callback<T, Fut, F>(future: Fut, callback: F) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    F: FnOnce(Result<T>) + Send + 'static,
{
    tokio::spawn(async move { callback(future.await) })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
