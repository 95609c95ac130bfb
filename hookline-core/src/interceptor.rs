//! # Interceptors
//!
//! An interceptor sits between `emit` and the handlers. It receives the
//! payload together with a [`Next`] continuation and decides what happens:
//!
//! - call `next.call(data)` (possibly with a rewritten payload) to continue,
//! - or drop `next` to halt the emission. Handlers never run in that case and
//!   no error is reported; emit a separate event if the halt must be observed.
//!
//! The continuation is `Send + 'static`, so an interceptor may move it into a
//! spawned task and continue once asynchronous work is done.

use crate::{
    constraints::{Constraints, Id},
    message::Message,
    next::Next,
};
use std::{fmt, sync::Arc};

/// A payload transform that runs before handlers.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Interceptor<{D}>`",
    label = "missing `Interceptor` implementation",
    note = "Interceptors must implement `intercept(&self, data: {D}, next: Next<{D}>, event: &str)`."
)]
pub trait Interceptor<D: Message>: Send + Sync + 'static {
    /// Transform `data` and hand it to `next`, or drop `next` to halt.
    fn intercept(&self, data: D, next: Next<D>, event: &str);
}

impl<D, F> Interceptor<D> for F
where
    D: Message,
    F: Fn(D, Next<D>, &str) + Send + Sync + 'static,
{
    fn intercept(&self, data: D, next: Next<D>, event: &str) {
        (self)(data, next, event)
    }
}

/// A registered interceptor: its id, transform and normalized constraints.
pub struct InterceptorEntry<D: Message> {
    id: Id,
    interceptor: Arc<dyn Interceptor<D>>,
    constraints: Constraints,
}

impl<D: Message> InterceptorEntry<D> {
    /// Create a new entry.
    pub fn new<I: Interceptor<D>>(id: impl Into<Id>, interceptor: I, constraints: Constraints) -> Self {
        Self {
            id: id.into(),
            interceptor: Arc::new(interceptor),
            constraints,
        }
    }

    /// The interceptor id.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The normalized constraints.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub(crate) fn intercept(&self, data: D, next: Next<D>, event: &str) {
        self.interceptor.intercept(data, next, event)
    }
}

impl<D: Message> fmt::Debug for InterceptorEntry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorEntry")
            .field("id", &self.id)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}
