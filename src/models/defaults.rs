//! Values for extra decorators, supplied by the caller at render/parse time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::TimeValue;

/// Error type returned by computed extras.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Signature of a computed extra.
pub type ComputeFn = dyn Fn(&TimeValue) -> Result<String, BoxError> + Send + Sync;

/// The value of an extra decorator.
#[derive(Clone)]
pub enum ExtraDefault {
    /// Rendered as-is.
    Literal(String),
    /// Evaluated once all units are computed, with the complete time value.
    Computed(Arc<ComputeFn>),
}

impl ExtraDefault {
    pub fn literal(value: impl Into<String>) -> Self {
        ExtraDefault::Literal(value.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&TimeValue) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        ExtraDefault::Computed(Arc::new(f))
    }
}

impl fmt::Debug for ExtraDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraDefault::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ExtraDefault::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Extra defaults keyed by decorator name.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    entries: HashMap<String, ExtraDefault>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a literal value.
    pub fn with_literal(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, ExtraDefault::literal(value));
        self
    }

    /// Builder-style insert of a computed value.
    pub fn with_computed<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&TimeValue) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.insert(name, ExtraDefault::computed(f));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ExtraDefault) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ExtraDefault> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Defaults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut defaults = Defaults::new();
        for (name, value) in iter {
            defaults.insert(name, ExtraDefault::literal(value));
        }
        defaults
    }
}
