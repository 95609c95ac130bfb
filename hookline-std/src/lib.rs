//! # hookline-std
//!
//! Standard implementations for the Hookline interceptor orchestration engine.
//!
//! This crate provides:
//! - **Stores**: [`InterceptorStore`], [`HandlerStore`]
//! - **Resolution**: [`Resolver`], the cached bucket-and-topological ordering
//! - **Dispatch**: [`deliver`], handler invocation after a completed chain
//! - **Registry**: [`Hooks`], the facade applications hold, and its [`Driver`]
//! - **Testing**: recording helpers in [`testing`]
//!
//! [`InterceptorStore`]: store::InterceptorStore
//! [`HandlerStore`]: store::HandlerStore
//! [`Resolver`]: resolve::Resolver
//! [`deliver`]: dispatch::deliver
//! [`Hooks`]: registry::Hooks
//! [`Driver`]: registry::Driver

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use hookline_core;

#[macro_use]
mod macros;

// Modules
pub mod dispatch;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod testing;
