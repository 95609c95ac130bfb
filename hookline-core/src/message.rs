//! Message trait for event payloads.

/// A marker trait for data carried through an interceptor chain.
///
/// Payloads are moved from one interceptor to the next and may be moved
/// into a spawned task together with a [`Next`], so they must be `Send`.
///
/// [`Next`]: crate::Next
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + 'static`",
    note = "Payloads in Hookline may cross task boundaries."
)]
pub trait Message: Send + 'static {}

impl<T: Send + 'static> Message for T {}
