//! Error types for Hookline.
//!
//! Every fallible engine operation returns [`HookError`]. Registration errors
//! ([`HookError::DuplicateId`], [`HookError::NotFound`]) surface from the store
//! calls; ordering errors ([`HookError::MissingDependency`],
//! [`HookError::Conflict`], [`HookError::CircularDependency`]) surface from
//! resolution, which runs synchronously inside `emit` and `validate`.

use crate::constraints::Id;
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T, E = HookError> = std::result::Result<T, E>;

/// Top-level error type for all Hookline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The same interceptor id was registered twice in one candidate pool.
    #[error("duplicate interceptor id: {id}")]
    DuplicateId {
        /// The offending id.
        id: Id,
    },

    /// A removal targeted something that is not registered.
    #[error("{what} not found for key {key}")]
    NotFound {
        /// Display form of the key the removal was made under.
        key: String,
        /// What was looked for.
        what: Missing,
    },

    /// An interceptor depends on an id that is absent from its pool.
    #[error("interceptor {id} depends on missing interceptor {dependency}")]
    MissingDependency {
        /// The interceptor declaring the dependency.
        id: Id,
        /// The absent dependency.
        dependency: Id,
    },

    /// Two interceptors that conflict are present in the same pool.
    #[error("interceptor {id} conflicts with interceptor {other}")]
    Conflict {
        /// The interceptor declaring the conflict.
        id: Id,
        /// The interceptor it conflicts with.
        other: Id,
    },

    /// The `after`/`before` constraints of one bucket admit no linear order.
    #[error("circular ordering between interceptors: {}", join(.ids))]
    CircularDependency {
        /// Ids left unresolved, in pool order.
        ids: Vec<Id>,
    },
}

/// The registration a [`HookError::NotFound`] refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// A handler, matched by identity.
    Handler,
    /// An interceptor with the given id.
    Interceptor(Id),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Handler => f.write_str("handler"),
            Missing::Interceptor(id) => write!(f, "interceptor {id}"),
        }
    }
}

fn join(ids: &[Id]) -> String {
    ids.iter()
        .map(|id| &**id)
        .collect::<Vec<_>>()
        .join(", ")
}
