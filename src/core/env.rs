//! Environment access used while building remote destinations

use parking_lot::RwLock;
use std::collections::HashMap;

/// Where destination builders publish and read credentials.
///
/// Building a direct-submit destination stores its API key and site here and
/// reads them back to configure the client. [`ProcessEnv`] uses the real
/// process environment; [`MemoryEnv`] keeps tests isolated from it.
pub trait EnvProvider: Send + Sync {
    fn set_var(&self, key: &str, value: &str);
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn set_var(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory environment
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.vars.read().clone()
    }
}

impl EnvProvider for MemoryEnv {
    fn set_var(&self, key: &str, value: &str) {
        self.vars.write().insert(key.to_string(), value.to_string());
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }
}
