//! Testing utilities for Hookline.
//!
//! - [`RecordingHandler`]: a handler that records every `(payload, event)` it sees
//! - [`OrderRecorder`]: interceptors that log their id and continue unchanged

use hookline_core::{Handler, Interceptor, Message, Next, SharedHandler};
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every payload it receives, with the event name.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<u32>::new();
/// hooks.on("save", recorder.handler());
///
/// hooks.emit("save", 1)?;
/// driver.tick();
///
/// assert_eq!(recorder.payloads(), [1]);
/// ```
pub struct RecordingHandler<D> {
    events: Arc<Mutex<Vec<(D, String)>>>,
}

impl<D: Message + Clone> RecordingHandler<D> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A registrable handle. Every call returns a new identity sharing
    /// the same record.
    pub fn handler(&self) -> SharedHandler<D> {
        Arc::new(self.clone())
    }

    /// Recorded `(payload, event)` pairs.
    pub fn events(&self) -> Vec<(D, String)> {
        self.events.lock().clone()
    }

    /// Recorded payloads only.
    pub fn payloads(&self) -> Vec<D> {
        self.events.lock().iter().map(|(data, _)| data.clone()).collect()
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<D: Message + Clone> Default for RecordingHandler<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for RecordingHandler<D> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<D: Message + Clone> Handler<D> for RecordingHandler<D> {
    fn handle(&self, data: &D, event: &str) {
        self.events.lock().push((data.clone(), event.to_string()));
    }
}

// ============================================================================
// Order Recorder
// ============================================================================

/// Hands out pass-through interceptors that log their id when they run.
///
/// Useful for asserting the order a chain actually executes in.
#[derive(Clone, Default)]
pub struct OrderRecorder {
    order: Arc<Mutex<Vec<String>>>,
}

impl OrderRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// An interceptor that records `id` and continues with the same payload.
    pub fn interceptor<D: Message>(&self, id: &str) -> impl Interceptor<D> + use<D> {
        let order = Arc::clone(&self.order);
        let id = id.to_string();
        move |data: D, next: Next<D>, _: &str| {
            order.lock().push(id.clone());
            next.call(data);
        }
    }

    /// Ids in the order their interceptors ran.
    pub fn order(&self) -> Vec<String> {
        self.order.lock().clone()
    }

    /// Forget the recorded order.
    pub fn clear(&self) {
        self.order.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookline_core::{Chain, Constraints, InterceptorEntry};

    #[test]
    fn test_recording_handler() {
        let recorder = RecordingHandler::<u32>::new();
        let handler = recorder.handler();
        handler.handle(&1, "a");
        handler.handle(&2, "b");
        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.payloads(), [1, 2]);
        assert_eq!(recorder.events()[1], (2, "b".to_string()));
        recorder.clear();
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_order_recorder() {
        let recorder = OrderRecorder::new();
        let chain = Chain::new(vec![
            Arc::new(InterceptorEntry::new("a", recorder.interceptor::<u32>("a"), Constraints::new())),
            Arc::new(InterceptorEntry::new("b", recorder.interceptor::<u32>("b"), Constraints::new())),
        ]);
        chain.run("x".into(), 0, |_| {});
        assert_eq!(recorder.order(), ["a", "b"]);
    }
}
