//! # hookline - Interceptor Orchestration for In-Process Events
//!
//! `hookline` lets independent plugins register handlers and payload-rewriting
//! interceptors for named events without agreeing on a registration order.
//! The order interceptors run in is derived from declared constraints:
//!
//! - a bucket ([`Order::Pre`], [`Order::Mid`], [`Order::Post`]),
//! - `after` / `before` relations inside a bucket,
//! - `depends` / `conflicts` checks across every interceptor that applies.
//!
//! ## Quick Start
//!
//! ```rust
//! use hookline::prelude::*;
//!
//! let (hooks, mut driver) = Hooks::<String>::new();
//! let seen = RecordingHandler::new();
//!
//! hooks
//!     .on("greet", seen.handler())
//!     .inject_with(
//!         "greet",
//!         "shout",
//!         |s: String, next: Next<String>, _: &str| next.call(s.to_uppercase()),
//!         Constraints::new().after("trim"),
//!     )?
//!     .inject("greet", "trim", |s: String, next: Next<String>, _: &str| {
//!         next.call(s.trim().to_string())
//!     })?
//!     .emit("greet", "  hello ".to_string())?;
//!
//! driver.tick();
//! assert_eq!(seen.payloads(), ["HELLO"]);
//! # Ok::<(), HookError>(())
//! ```
//!
//! ## Running emissions
//!
//! `emit` resolves synchronously and queues the rest. A [`Driver`] executes
//! the queue: spawn [`Driver::run`] on an executor, call [`Driver::tick`]
//! from your own loop, or (with the `rt` feature) use `Hooks::spawn` on a
//! tokio runtime.
//!
//! ## Features
//!
//! - `tracing` (default): log resolution, invalidation and emission events
//! - `serde`: deserialize [`Constraints`] from partial objects
//! - `rt`: `Hooks::spawn` on the current tokio runtime

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use hookline_core::{
    // Chains
    Chain,
    // Constraints
    Constraints,
    // Keys
    EventKey,
    Filter,
    // Handlers
    Handler,
    // Errors
    HookError,
    Id,
    // Interceptors
    Interceptor,
    InterceptorEntry,
    IntoIds,
    // Message
    Message,
    Missing,
    Next,
    Order,
    Result,
    SharedHandler,
    same_handler,
};

// Registry
pub use hookline_std::registry::{Driver, Hooks, WeakHooks};

/// Stores, resolver and dispatch internals, for custom facades.
pub mod engine {
    pub use hookline_std::{
        dispatch::{Emission, OnComplete, deliver},
        resolve::Resolver,
        store::{HandlerStore, InterceptorStore, Invalidate, Pool},
    };
}

/// Testing utilities.
pub mod testing {
    pub use hookline_std::testing::{OrderRecorder, RecordingHandler};
}

/// Prelude module - common imports for Hookline.
///
/// # Usage
///
/// ```rust
/// use hookline::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Constraints, Driver, EventKey, Filter, Handler, HookError, Hooks, Interceptor, Next,
        Order, SharedHandler, WeakHooks,
        testing::{OrderRecorder, RecordingHandler},
    };
}
