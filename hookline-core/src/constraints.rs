//! Ordering constraints attached to interceptors.
//!
//! A [`Constraints`] value is the normalized form: every relation is a
//! (possibly empty) list of ids and the bucket is always set. Callers build it
//! fluently, passing a single id or any list of ids to each relation:
//!
//! ```rust
//! use hookline_core::{Constraints, Order};
//!
//! let c = Constraints::new()
//!     .after("auth")
//!     .before(["render", "cache"])
//!     .with_order(Order::Pre);
//!
//! assert_eq!(c.after.len(), 1);
//! assert_eq!(c.before.len(), 2);
//! assert!(c.depends.is_empty());
//! ```

use std::sync::Arc;

/// Interceptor identifier.
pub type Id = Arc<str>;

/// Coarse ordering bucket. Buckets always run `Pre`, then `Mid`, then `Post`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Order {
    /// Runs before every `Mid` and `Post` interceptor.
    Pre,
    /// The default bucket.
    #[default]
    Mid,
    /// Runs after every `Pre` and `Mid` interceptor.
    Post,
}

impl Order {
    /// All buckets in execution order.
    pub const ALL: [Order; 3] = [Order::Pre, Order::Mid, Order::Post];
}

/// Conversion into a list of interceptor ids.
///
/// Implemented for single ids (`&str`, `String`, [`Id`]) and for arrays,
/// slices and vectors of them, so a relation can be given either way.
pub trait IntoIds {
    /// Convert into owned ids.
    fn into_ids(self) -> Vec<Id>;
}

impl IntoIds for &str {
    fn into_ids(self) -> Vec<Id> {
        vec![Id::from(self)]
    }
}

impl IntoIds for String {
    fn into_ids(self) -> Vec<Id> {
        vec![Id::from(self)]
    }
}

impl IntoIds for Id {
    fn into_ids(self) -> Vec<Id> {
        vec![self]
    }
}

impl<T: Into<Id>, const N: usize> IntoIds for [T; N] {
    fn into_ids(self) -> Vec<Id> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Id>> IntoIds for Vec<T> {
    fn into_ids(self) -> Vec<Id> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Id> + Clone> IntoIds for &[T] {
    fn into_ids(self) -> Vec<Id> {
        self.iter().cloned().map(Into::into).collect()
    }
}

/// Normalized ordering constraints for one interceptor.
///
/// Relations are deduplicated and keep the order in which ids were first
/// given. `after` and `before` only act inside the interceptor's own bucket;
/// `depends` and `conflicts` act across the whole candidate pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "partial::PartialConstraints"))]
pub struct Constraints {
    /// Interceptors this one must follow.
    pub after: Vec<Id>,
    /// Interceptors this one must precede.
    pub before: Vec<Id>,
    /// Interceptors that may not share a pool with this one.
    pub conflicts: Vec<Id>,
    /// Interceptors that must be present in the pool.
    pub depends: Vec<Id>,
    /// The bucket this interceptor runs in.
    pub order: Order,
}

impl Constraints {
    /// Empty constraints in the `Mid` bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty constraints in the `Pre` bucket.
    pub fn pre() -> Self {
        Self::new().with_order(Order::Pre)
    }

    /// Empty constraints in the `Mid` bucket.
    pub fn mid() -> Self {
        Self::new()
    }

    /// Empty constraints in the `Post` bucket.
    pub fn post() -> Self {
        Self::new().with_order(Order::Post)
    }

    /// Run after the given interceptors.
    pub fn after(mut self, ids: impl IntoIds) -> Self {
        extend_unique(&mut self.after, ids.into_ids());
        self
    }

    /// Run before the given interceptors.
    pub fn before(mut self, ids: impl IntoIds) -> Self {
        extend_unique(&mut self.before, ids.into_ids());
        self
    }

    /// Refuse to share a pool with the given interceptors.
    pub fn conflicts_with(mut self, ids: impl IntoIds) -> Self {
        extend_unique(&mut self.conflicts, ids.into_ids());
        self
    }

    /// Require the given interceptors to be present in the pool.
    pub fn depends_on(mut self, ids: impl IntoIds) -> Self {
        extend_unique(&mut self.depends, ids.into_ids());
        self
    }

    /// Set the bucket.
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

impl From<Order> for Constraints {
    fn from(order: Order) -> Self {
        Constraints::new().with_order(order)
    }
}

fn extend_unique(target: &mut Vec<Id>, ids: Vec<Id>) {
    for id in ids {
        if !target.contains(&id) {
            target.push(id);
        }
    }
}

#[cfg(feature = "serde")]
mod partial {
    use super::{Constraints, Id, Order, extend_unique};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    impl OneOrMany {
        fn into_ids(self) -> Vec<Id> {
            match self {
                OneOrMany::One(id) => vec![Id::from(id)],
                OneOrMany::Many(ids) => ids.into_iter().map(Id::from).collect(),
            }
        }
    }

    /// The user-facing partial shape: every field optional, relations scalar or list.
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub(super) struct PartialConstraints {
        #[serde(default)]
        after: Option<OneOrMany>,
        #[serde(default)]
        before: Option<OneOrMany>,
        #[serde(default)]
        conflicts: Option<OneOrMany>,
        #[serde(default)]
        depends: Option<OneOrMany>,
        #[serde(default)]
        order: Option<Order>,
    }

    impl From<PartialConstraints> for Constraints {
        fn from(raw: PartialConstraints) -> Self {
            let mut out = Constraints::new().with_order(raw.order.unwrap_or_default());
            let fields = [
                (&mut out.after, raw.after),
                (&mut out.before, raw.before),
                (&mut out.conflicts, raw.conflicts),
                (&mut out.depends, raw.depends),
            ];
            for (target, value) in fields {
                if let Some(value) = value {
                    extend_unique(target, value.into_ids());
                }
            }
            out
        }
    }
}
