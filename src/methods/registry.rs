use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{JimboError, Result};

use super::handler::MethodInvoker;

/// Method name to invoker. Written during startup, read while dispatching.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Arc<MethodInvoker>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, invoker: MethodInvoker) -> Result<Arc<MethodInvoker>> {
        let invoker = Arc::new(invoker);
        self.insert_shared(Arc::clone(&invoker))?;
        Ok(invoker)
    }

    pub fn insert_shared(&self, invoker: Arc<MethodInvoker>) -> Result<()> {
        let mut guard = self
            .methods
            .write()
            .map_err(|_| JimboError::internal("Method registry lock poisoned"))?;
        if let Some(previous) = guard.insert(invoker.name().to_string(), invoker) {
            tracing::warn!("Method {} re-registered; previous handler replaced", previous.name());
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<MethodInvoker>> {
        let guard = self
            .methods
            .read()
            .map_err(|_| JimboError::internal("Method registry lock poisoned"))?;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| JimboError::MethodNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods
            .read()
            .map(|guard| guard.contains_key(name))
            .unwrap_or(false)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        let guard = self
            .methods
            .read()
            .map_err(|_| JimboError::internal("Method registry lock poisoned"))?;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn snapshot(&self) -> Result<Vec<Arc<MethodInvoker>>> {
        let guard = self
            .methods
            .read()
            .map_err(|_| JimboError::internal("Method registry lock poisoned"))?;
        Ok(guard.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.methods.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
