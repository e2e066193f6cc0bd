//! Promisification options
//!
//! Controls the wrapper suffix, which members are eligible and which promise
//! implementation wrappers return.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use promisify_runtime::{Deferred, Value};

use crate::error::{PromisifyError, PromisifyResult};

/// Suffix appended to origin names when none is configured
pub const DEFAULT_SUFFIX: &str = "Async";

/// Member predicate: `(name, value) -> eligible`
pub type Filter = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

/// Source of pending promises for generated wrappers
pub trait PromiseConstructor: Send + Sync {
    /// Create a fresh pending promise with its resolver
    fn deferred(&self) -> Deferred;
}

/// The runtime's built-in promise
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardPromise;

impl PromiseConstructor for StandardPromise {
    fn deferred(&self) -> Deferred {
        Deferred::new()
    }
}

static STANDARD_PROMISE: Lazy<Arc<dyn PromiseConstructor>> = Lazy::new(|| Arc::new(StandardPromise));

/// Options for a promisification pass
#[derive(Clone)]
pub struct PromisifyOptions {
    suffix: String,
    filter: Option<Filter>,
    promise_constructor: Arc<dyn PromiseConstructor>,
}

impl PromisifyOptions {
    /// Default options: `Async` suffix, default filter, standard promises
    pub fn new() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            filter: None,
            promise_constructor: Arc::clone(&STANDARD_PROMISE),
        }
    }

    /// Use a different wrapper suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Replace the default filter. The predicate sees every function member
    /// (including `constructor` and underscore names) and alone decides.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Make wrappers return promises from `promises`
    pub fn with_promise_constructor<P>(self, promises: P) -> Self
    where
        P: PromiseConstructor + 'static,
    {
        self.with_shared_promise_constructor(Arc::new(promises))
    }

    /// Same as [`with_promise_constructor`](Self::with_promise_constructor) for an already shared constructor
    pub fn with_shared_promise_constructor(mut self, promises: Arc<dyn PromiseConstructor>) -> Self {
        self.promise_constructor = promises;
        self
    }

    /// Wrapper suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Check if a custom filter is installed
    pub fn has_custom_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Promise constructor used by generated wrappers
    pub fn promise_constructor(&self) -> &Arc<dyn PromiseConstructor> {
        &self.promise_constructor
    }

    /// Apply the configured filter (or the default one) to a member
    pub fn accepts(&self, name: &str, value: &Value) -> bool {
        match &self.filter {
            Some(filter) => filter(name, value),
            None => default_filter(name, value),
        }
    }

    /// Reject suffixes that cannot extend an identifier
    pub fn validate(&self) -> PromisifyResult<()> {
        if self.suffix.is_empty() || !self.suffix.chars().all(is_identifier_part) {
            return Err(PromisifyError::InvalidSuffix(self.suffix.clone()));
        }
        Ok(())
    }
}

impl Default for PromisifyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PromisifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromisifyOptions")
            .field("suffix", &self.suffix)
            .field("custom_filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// Default member filter.
///
/// Accepts identifier-shaped names that are neither private (leading `_`)
/// nor `constructor`.
pub fn default_filter(name: &str, _value: &Value) -> bool {
    is_identifier(name) && !name.starts_with('_') && name != "constructor"
}

/// Check if `name` is a valid identifier (`[A-Za-z_$][A-Za-z0-9_$]*`, Unicode letters allowed)
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let v = Value::Undefined;
        assert!(default_filter("get", &v));
        assert!(default_filter("$save", &v));
        assert!(default_filter("method2", &v));
        assert!(!default_filter("_private", &v));
        assert!(!default_filter("constructor", &v));
        assert!(!default_filter("---invalid---", &v));
        assert!(!default_filter("2fast", &v));
        assert!(!default_filter("", &v));
    }

    #[test]
    fn test_custom_filter_replaces_default() {
        let options = PromisifyOptions::new().with_filter(|name, _| name.starts_with('_'));
        assert!(options.has_custom_filter());
        assert!(options.accepts("_private", &Value::Undefined));
        assert!(!options.accepts("get", &Value::Undefined));
    }

    #[test]
    fn test_validate_suffix() {
        assert!(PromisifyOptions::new().validate().is_ok());
        assert!(PromisifyOptions::new().with_suffix("P").validate().is_ok());
        assert!(PromisifyOptions::new().with_suffix("_async").validate().is_ok());
        assert_eq!(
            PromisifyOptions::new().with_suffix("").validate(),
            Err(PromisifyError::InvalidSuffix(String::new()))
        );
        assert!(matches!(
            PromisifyOptions::new().with_suffix("-async").validate(),
            Err(PromisifyError::InvalidSuffix(_))
        ));
    }

    #[test]
    fn test_standard_promise_is_pending() {
        let options = PromisifyOptions::default();
        let deferred = options.promise_constructor().deferred();
        assert!(deferred.promise.is_pending());
        assert_eq!(options.suffix(), DEFAULT_SUFFIX);
    }
}
