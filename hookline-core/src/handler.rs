//! # Handlers
//!
//! Handlers are the terminal point of an emission: they observe the final
//! payload after every interceptor has run, and cannot change it.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `Arc::new(|data: &u32, event: &str| { ... })`
//! 2. **Struct implementation**: `impl Handler<MyPayload> for MyHandler`
//!
//! Handlers are registered as [`SharedHandler`]s. The `Arc` allocation is
//! the handler's identity, which is what `off` matches against.

use crate::message::Message;
use std::sync::Arc;

/// An observer of fully intercepted payloads.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle payloads of type `{D}`",
    label = "missing `Handler<{D}>` implementation",
    note = "Handlers must implement `handle(&self, data: &{D}, event: &str)`."
)]
pub trait Handler<D: Message>: Send + Sync + 'static {
    /// Observe the payload emitted under `event`.
    fn handle(&self, data: &D, event: &str);
}

impl<D, F> Handler<D> for F
where
    D: Message,
    F: Fn(&D, &str) + Send + Sync + 'static,
{
    fn handle(&self, data: &D, event: &str) {
        (self)(data, event)
    }
}

/// A reference-counted handler. Clones share identity.
pub type SharedHandler<D> = Arc<dyn Handler<D>>;

/// Identity comparison that ignores vtable metadata.
pub fn same_handler<D: Message>(a: &SharedHandler<D>, b: &SharedHandler<D>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
