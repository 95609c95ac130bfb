//! Event keys: concrete names and name filters.

use std::{fmt, sync::Arc};

/// A predicate over event names.
///
/// Filters are compared by identity: two `Filter`s denote the same key only
/// when one is a clone of the other. Keep the `Filter` around if you intend
/// to unregister something keyed by it.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl Filter {
    /// Wrap a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Matches every name starting with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |name| name.starts_with(&prefix))
    }

    /// Matches every name.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate the predicate.
    pub fn matches(&self, name: &str) -> bool {
        (self.0)(name)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Filter {}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({:p})", Arc::as_ptr(&self.0))
    }
}

/// What a handler or interceptor is registered under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKey {
    /// A concrete event name.
    Name(Arc<str>),
    /// Every event name the filter accepts.
    Filter(Filter),
}

impl EventKey {
    /// Whether an event with this name is covered by the key.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            EventKey::Name(own) => &**own == name,
            EventKey::Filter(filter) => filter.matches(name),
        }
    }

    /// The concrete name, if this is not a filter.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            EventKey::Name(name) => Some(&**name),
            EventKey::Filter(_) => None,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Name(name) => f.write_str(name),
            EventKey::Filter(_) => f.write_str("<filter>"),
        }
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        EventKey::Name(Arc::from(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        EventKey::Name(Arc::from(name))
    }
}

impl From<Arc<str>> for EventKey {
    fn from(name: Arc<str>) -> Self {
        EventKey::Name(name)
    }
}

impl From<Filter> for EventKey {
    fn from(filter: Filter) -> Self {
        EventKey::Filter(filter)
    }
}

impl From<&Filter> for EventKey {
    fn from(filter: &Filter) -> Self {
        EventKey::Filter(filter.clone())
    }
}
