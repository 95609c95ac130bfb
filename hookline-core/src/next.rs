//! Resolved chains and the continuation that drives them.
//!
//! Execution is a trampoline over an explicit cursor. A [`Next`] called
//! synchronously from inside its interceptor only records the payload; the
//! loop in [`drive`] picks it up once the interceptor returns and moves on.
//! A [`Next`] called later (after the interceptor returned) restarts the loop
//! from the following step. Stack depth therefore does not grow with chain
//! length. The last step is the exception: its [`Next::call`] runs completion
//! directly, inside the interceptor's call.

use crate::{constraints::Id, interceptor::InterceptorEntry, message::Message};
use parking_lot::Mutex;
use std::{fmt, mem, sync::Arc};

type Completion<D> = Box<dyn FnOnce(D) + Send>;

/// An ordered, immutable sequence of interceptors for one event name.
///
/// Clones share the same allocation, which is how cached resolutions stay
/// reference-stable.
pub struct Chain<D: Message> {
    entries: Arc<[Arc<InterceptorEntry<D>>]>,
}

impl<D: Message> Chain<D> {
    /// Build a chain from entries already in execution order.
    pub fn new(entries: Vec<Arc<InterceptorEntry<D>>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// A chain with no interceptors.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of interceptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interceptor ids in execution order.
    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.entries.iter().map(|entry| entry.id())
    }

    /// Whether both chains are the same allocation.
    pub fn ptr_eq(&self, other: &Chain<D>) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Run the chain against `data`.
    ///
    /// `on_complete` receives the final payload if every interceptor
    /// continues. It runs on the stack of whichever call finishes the chain:
    /// this call, or a deferred [`Next::call`].
    pub fn run<F>(&self, event: Arc<str>, data: D, on_complete: F)
    where
        F: FnOnce(D) + Send + 'static,
    {
        let run = Arc::new(Run {
            chain: self.clone(),
            event,
            on_complete: Mutex::new(Some(Box::new(on_complete))),
        });
        drive(run, 0, data);
    }
}

impl<D: Message> Clone for Chain<D> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<D: Message> fmt::Debug for Chain<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

/// One execution of a chain.
struct Run<D: Message> {
    chain: Chain<D>,
    event: Arc<str>,
    on_complete: Mutex<Option<Completion<D>>>,
}

impl<D: Message> Run<D> {
    fn finish(&self, data: D) {
        let on_complete = self.on_complete.lock().take();
        if let Some(on_complete) = on_complete {
            on_complete(data);
        }
    }
}

enum Slot<D> {
    /// The interceptor is still on the stack.
    Running,
    /// Continued synchronously; the driving loop takes it from here.
    Ready(D),
    /// The interceptor returned without continuing.
    Parked,
}

/// The continuation handed to each interceptor.
///
/// Consuming `self` in [`Next::call`] makes each step continue at most once.
/// Dropping a `Next` without calling it halts the emission.
#[must_use = "dropping `Next` halts the chain; call `halt()` to make that explicit"]
pub struct Next<D: Message> {
    run: Arc<Run<D>>,
    index: usize,
    slot: Arc<Mutex<Slot<D>>>,
}

impl<D: Message> Next<D> {
    /// Pass `data` to the next interceptor, or to completion if this was the last.
    ///
    /// Completion runs inside this call, so code following `call` in the
    /// last interceptor observes the handlers as already run.
    pub fn call(self, data: D) {
        if self.index + 1 >= self.run.chain.len() {
            self.run.finish(data);
            return;
        }
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Running) {
            *slot = Slot::Ready(data);
            return;
        }
        drop(slot);
        drive(self.run, self.index + 1, data);
    }

    /// Stop the emission here. Equivalent to dropping the continuation.
    pub fn halt(self) {}

    /// The event name being processed.
    pub fn event(&self) -> &str {
        &self.run.event
    }

    /// Position of the current interceptor in the chain.
    pub fn position(&self) -> usize {
        self.index
    }
}

impl<D: Message> fmt::Debug for Next<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("event", &self.run.event)
            .field("position", &self.index)
            .finish()
    }
}

fn drive<D: Message>(run: Arc<Run<D>>, mut index: usize, mut data: D) {
    loop {
        let Some(entry) = run.chain.entries.get(index).cloned() else {
            run.finish(data);
            return;
        };

        let slot = Arc::new(Mutex::new(Slot::Running));
        let next = Next {
            run: Arc::clone(&run),
            index,
            slot: Arc::clone(&slot),
        };
        entry.intercept(data, next, &run.event);

        let state = mem::replace(&mut *slot.lock(), Slot::Parked);
        match state {
            Slot::Ready(continued) => {
                data = continued;
                index += 1;
            }
            Slot::Running | Slot::Parked => return,
        }
    }
}
