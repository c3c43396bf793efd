use anyhow::anyhow;
use once_cell::sync::OnceCell;

use std::sync::Arc;

/// A named reference to a shared definition, resolved once after every
/// definition is known.
#[derive(Debug, Clone)]
pub struct Reference<T>(Arc<String>, Arc<OnceCell<Arc<T>>>);

impl<T> Reference<T> {
    pub fn new<S: Into<String>>(name: S) -> Reference<T> {
        Reference(Arc::new(name.into()), Arc::new(OnceCell::new()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.1.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.1.get().is_some()
    }

    pub fn resolve_to(&self, t: Arc<T>) -> anyhow::Result<()> {
        self.1
            .set(t)
            .map_err(|_| anyhow!("Reference {} is already resolved.", self.0))
    }
}

impl<T> From<&str> for Reference<T> {
    fn from(s: &str) -> Reference<T> {
        Reference::new(s)
    }
}

impl<T> From<String> for Reference<T> {
    fn from(s: String) -> Reference<T> {
        Reference::new(s)
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Reference<T>) -> bool {
        if let (Some(arc1), Some(arc2)) = (self.get(), other.get()) {
            Arc::ptr_eq(&arc1, &arc2)
        } else {
            false
        }
    }
}
