//! Environment variable sources.

use std::collections::HashMap;

/// Where environment fallback values come from.
///
/// [`ProcessEnv`] reads the real environment; a `HashMap` works as a fixed
/// environment in tests and embedded uses.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment. Unset and non-UTF-8 variables read as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
