//! Handler dispatch.

use hookline_core::{Chain, Message, SharedHandler};
use std::sync::Arc;

/// Per-emission completion callback, run before any registered handler.
pub type OnComplete<D> = Box<dyn FnOnce(&D, &str) + Send>;

/// One queued emission: the chain resolved at `emit` time plus its payload.
pub struct Emission<D: Message> {
    pub(crate) event: Arc<str>,
    pub(crate) data: D,
    pub(crate) chain: Chain<D>,
    pub(crate) on_complete: Option<OnComplete<D>>,
}

impl<D: Message> Emission<D> {
    /// The event name.
    pub fn event(&self) -> &str {
        &self.event
    }
}

/// Invoke the completion callback, then every handler, in order.
///
/// Nothing here is caught: a panicking handler unwinds through whoever
/// finished the chain.
pub fn deliver<D: Message>(
    event: &str,
    data: &D,
    on_complete: Option<OnComplete<D>>,
    handlers: &[SharedHandler<D>],
) {
    if let Some(on_complete) = on_complete {
        on_complete(data, event);
    }
    for handler in handlers {
        handler.handle(data, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_completion_runs_before_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        let handlers: Vec<SharedHandler<u8>> = vec![
            Arc::new(move |data: &u8, event: &str| first.lock().push(format!("h1 {event} {data}"))),
            Arc::new(move |data: &u8, event: &str| second.lock().push(format!("h2 {event} {data}"))),
        ];
        let done = Arc::clone(&log);
        deliver(
            "x",
            &3,
            Some(Box::new(move |data: &u8, event: &str| {
                done.lock().push(format!("done {event} {data}"))
            })),
            &handlers,
        );
        assert_eq!(*log.lock(), ["done x 3", "h1 x 3", "h2 x 3"]);
    }
}
