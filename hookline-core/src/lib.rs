//! # hookline-core
//!
//! Core types for the Hookline interceptor orchestration engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins that only register interceptors and handlers, without pulling in
//! the registry implementation from `hookline-std`.
//!
//! # Building Blocks
//!
//! ## Keys ([`EventKey`])
//!
//! Everything is registered under either a concrete event name or a
//! [`Filter`] predicate over names. Filters are re-evaluated for every name
//! that is resolved.
//!
//! ## Interceptors ([`Interceptor`])
//!
//! Payload transforms that run before handlers, each receiving a [`Next`]
//! continuation. Their relative order is not given by registration but
//! derived from [`Constraints`]: a coarse [`Order`] bucket plus fine-grained
//! `after` / `before` relations, with `depends` / `conflicts` checks across
//! the whole pool.
//!
//! ## Handlers ([`Handler`])
//!
//! Observers of the final payload, run in registration order once the chain
//! completes.
//!
//! ## Chains ([`Chain`])
//!
//! A resolved, ordered interceptor sequence for one event name, executed by
//! continuation passing.
//!
//! # Error Types
//!
//! - [`HookError`] - every registration and resolution failure

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod constraints;
mod error;
mod handler;
mod interceptor;
mod key;
mod message;
mod next;

// Re-exports
pub use constraints::{Constraints, Id, IntoIds, Order};
pub use error::{HookError, Missing, Result};
pub use handler::{Handler, SharedHandler, same_handler};
pub use interceptor::{Interceptor, InterceptorEntry};
pub use key::{EventKey, Filter};
pub use message::Message;
pub use next::{Chain, Next};
