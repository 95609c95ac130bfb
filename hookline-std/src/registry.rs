//! The registry facade.
//!
//! [`Hooks`] is the object applications hold. It owns both stores and the
//! resolution cache behind one lock, and hands emissions to a [`Driver`]
//! through a FIFO queue.
//!
//! # Emission timeline
//!
//! 1. `emit` resolves the chain for the name **synchronously**. Ordering
//!    errors are returned to the caller right away.
//! 2. The payload and resolved chain are queued.
//! 3. The [`Driver`] runs queued emissions one after another: interceptors
//!    first, then the completion callback and handlers.
//!
//! Because step 3 never runs on the caller's stack, an event emitted from
//! inside a handler is processed after the emission that caused it, never
//! interleaved with it.
//!
//! # Example
//!
//! ```rust
//! use hookline_std::registry::Hooks;
//! use hookline_core::{Constraints, Next, SharedHandler};
//! use std::sync::{Arc, Mutex};
//!
//! let (hooks, mut driver) = Hooks::<u32>::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let handler: SharedHandler<u32> = Arc::new(move |data: &u32, _: &str| {
//!     sink.lock().unwrap().push(*data);
//! });
//!
//! hooks
//!     .on("save", handler)
//!     .inject_with("save", "double", |d: u32, next: Next<u32>, _: &str| next.call(d * 2), Constraints::post())
//!     .unwrap()
//!     .inject_with("save", "inc", |d: u32, next: Next<u32>, _: &str| next.call(d + 1), Constraints::pre())
//!     .unwrap()
//!     .emit("save", 1)
//!     .unwrap();
//!
//! driver.tick();
//! assert_eq!(*seen.lock().unwrap(), [4]);
//! ```

use crate::{
    dispatch::{self, Emission, OnComplete},
    resolve::Resolver,
    store::{self, HandlerStore, InterceptorStore},
};
use hookline_core::{
    Chain, Constraints, EventKey, Filter, Id, Interceptor, InterceptorEntry, Message, Result,
    SharedHandler,
};
use parking_lot::Mutex;
use std::{
    collections::BTreeSet,
    fmt,
    sync::{Arc, Weak},
};
use tokio::sync::{mpsc, oneshot};

enum Job<D: Message> {
    Emit(Emission<D>),
    Flush(oneshot::Sender<()>),
}

struct State<D: Message> {
    interceptors: InterceptorStore<D>,
    handlers: HandlerStore<D>,
    resolver: Resolver<D>,
}

impl<D: Message> State<D> {
    fn resolve(&mut self, name: &str, accepted: &[Filter]) -> Result<Chain<D>> {
        self.resolver.resolve(&self.interceptors, name, accepted)
    }
}

struct Shared<D: Message> {
    state: Mutex<State<D>>,
    jobs: mpsc::UnboundedSender<Job<D>>,
}

impl<D: Message> Shared<D> {
    /// Resolve `name` without holding the lock while filter predicates run.
    ///
    /// Predicates are evaluated against a snapshot of the filter keys. If
    /// the keys changed meanwhile (a predicate may register things), the
    /// snapshot is taken again.
    fn resolve(&self, name: &str) -> Result<Chain<D>> {
        loop {
            let filters = {
                let state = self.state.lock();
                if let Some(chain) = state.resolver.cached(name) {
                    trace!(event = name, "resolved chain cache hit");
                    return Ok(chain);
                }
                state.interceptors.filters()
            };
            let accepted = store::accepting(&filters, name);

            let mut state = self.state.lock();
            if state.interceptors.has_filters(&filters) {
                return state.resolve(name, &accepted);
            }
        }
    }

    /// Snapshot the handlers for `name`, evaluating filters outside the lock.
    fn take_handlers(&self, name: &str) -> Vec<SharedHandler<D>> {
        let filters = self.state.lock().handlers.filters();
        let accepted = store::accepting(&filters, name);
        self.state.lock().handlers.take_matching(name, &accepted)
    }
}

// ============================================================================
// Hooks - the registry facade
// ============================================================================

/// A registry of handlers and interceptors.
///
/// Cloning is cheap and every clone refers to the same registry. Methods take
/// `&self` and return `&Self` (or `Result<&Self>`) so calls chain.
///
/// The internal lock is never held while user code runs, so handlers,
/// interceptors and filter predicates are free to call back into the
/// registry.
///
/// A handler that keeps a `Hooks` clone keeps the registry alive, and with it
/// the [`Driver`]. Capture a [`WeakHooks`] (see [`Hooks::downgrade`]) when the
/// registry should be able to shut down.
pub struct Hooks<D: Message> {
    shared: Arc<Shared<D>>,
}

impl<D: Message> Hooks<D> {
    /// Create a registry together with the [`Driver`] that executes its
    /// emissions. The driver must be run (see [`Driver::run`] and
    /// [`Driver::tick`]) for handlers to fire.
    pub fn new() -> (Self, Driver<D>) {
        let (jobs, queue) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                interceptors: InterceptorStore::new(),
                handlers: HandlerStore::new(),
                resolver: Resolver::new(),
            }),
            jobs,
        });
        let driver = Driver {
            queue,
            shared: Arc::downgrade(&shared),
        };
        (Self { shared }, driver)
    }

    /// Create a registry whose driver runs on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[cfg(feature = "rt")]
    pub fn spawn() -> Self {
        let (hooks, driver) = Self::new();
        tokio::spawn(driver.run());
        hooks
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    /// Register a handler under a name or filter.
    pub fn on(&self, key: impl Into<EventKey>, handler: SharedHandler<D>) -> &Self {
        self.register_handler(key.into(), handler, false)
    }

    /// Register a handler that fires at most once.
    ///
    /// It can still be removed with [`Hooks::off`] before it fires.
    pub fn once(&self, key: impl Into<EventKey>, handler: SharedHandler<D>) -> &Self {
        self.register_handler(key.into(), handler, true)
    }

    /// Remove the first handler under `key` that is `handler` (by identity).
    pub fn off(&self, key: impl Into<EventKey>, handler: &SharedHandler<D>) -> Result<&Self> {
        let key = key.into();
        self.shared.state.lock().handlers.remove(&key, handler)?;
        trace!(key = %key, "handler removed");
        Ok(self)
    }

    fn register_handler(&self, key: EventKey, handler: SharedHandler<D>, once: bool) -> &Self {
        trace!(key = %key, once, "handler registered");
        self.shared.state.lock().handlers.insert(&key, handler, once);
        self
    }

    // ------------------------------------------------------------------------
    // Interceptors
    // ------------------------------------------------------------------------

    /// Register an interceptor with default constraints (`Mid`, no relations).
    pub fn inject<I>(&self, key: impl Into<EventKey>, id: impl Into<Id>, interceptor: I) -> Result<&Self>
    where
        I: Interceptor<D>,
    {
        self.inject_with(key, id, interceptor, Constraints::new())
    }

    /// Register an interceptor with explicit constraints.
    ///
    /// Fails if `id` is already registered under the same key. Ordering
    /// problems are only detected when a name resolves.
    pub fn inject_with<I>(
        &self,
        key: impl Into<EventKey>,
        id: impl Into<Id>,
        interceptor: I,
        constraints: impl Into<Constraints>,
    ) -> Result<&Self>
    where
        I: Interceptor<D>,
    {
        let key = key.into();
        let entry = InterceptorEntry::new(id, interceptor, constraints.into());
        trace!(key = %key, id = %entry.id(), "interceptor registered");

        let mut state = self.shared.state.lock();
        let scope = state.interceptors.insert(&key, entry)?;
        state.resolver.invalidate(&scope);
        Ok(self)
    }

    /// Unregister the interceptor `id` from `key`.
    pub fn remove(&self, key: impl Into<EventKey>, id: &str) -> Result<&Self> {
        let key = key.into();
        let mut state = self.shared.state.lock();
        let scope = state.interceptors.remove(&key, id)?;
        state.resolver.invalidate(&scope);
        trace!(key = %key, id, "interceptor removed");
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------------

    /// Emit `data` under `name`.
    ///
    /// Resolution errors are returned immediately; interceptors and handlers
    /// run later, on the [`Driver`].
    pub fn emit(&self, name: &str, data: D) -> Result<&Self> {
        self.enqueue(name, data, None)
    }

    /// Emit `data` under `name`, calling `on_complete` with the final
    /// payload before any handler if the chain completes.
    pub fn emit_with<F>(&self, name: &str, data: D, on_complete: F) -> Result<&Self>
    where
        F: FnOnce(&D, &str) + Send + 'static,
    {
        self.enqueue(name, data, Some(Box::new(on_complete)))
    }

    fn enqueue(&self, name: &str, data: D, on_complete: Option<OnComplete<D>>) -> Result<&Self> {
        let chain = self.shared.resolve(name)?;
        let emission = Emission {
            event: Arc::from(name),
            data,
            chain,
            on_complete,
        };
        if self.shared.jobs.send(Job::Emit(emission)).is_err() {
            warn!(event = name, "driver is gone; emission dropped");
        } else {
            trace!(event = name, "emission queued");
        }
        Ok(self)
    }

    /// Wait until the driver has started every emission queued so far,
    /// including the ones those emissions queued in turn.
    ///
    /// Returns immediately if the driver has been dropped.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.shared.jobs.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve `name` without emitting, surfacing ordering errors.
    pub fn validate(&self, name: &str) -> Result<&Self> {
        self.shared.resolve(name)?;
        Ok(self)
    }

    /// Resolve every concrete name that has an interceptor or a handler.
    ///
    /// Names are checked in lexical order; the first failure is returned.
    /// Names reached only through filters cannot be enumerated and are not
    /// checked.
    pub fn validate_all(&self) -> Result<&Self> {
        let names: BTreeSet<Arc<str>> = {
            let state = self.shared.state.lock();
            state
                .interceptors
                .names()
                .chain(state.handlers.names())
                .cloned()
                .collect()
        };
        for name in names {
            self.shared.resolve(&name)?;
        }
        Ok(self)
    }

    /// The resolved chain for `name` (cached between mutations).
    pub fn resolve(&self, name: &str) -> Result<Chain<D>> {
        self.shared.resolve(name)
    }

    /// Interceptor ids for `name`, in execution order.
    pub fn resolved_order(&self, name: &str) -> Result<Vec<Id>> {
        Ok(self.resolve(name)?.ids().cloned().collect())
    }

    /// Whether `name` currently has a cached resolution.
    ///
    /// Names without interceptors resolve to a shared empty chain and are
    /// never cached.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.shared.state.lock().resolver.is_resolved(name)
    }

    /// Number of handlers registered directly under `key`.
    pub fn handler_count(&self, key: impl Into<EventKey>) -> usize {
        self.shared.state.lock().handlers.count(&key.into())
    }

    /// Number of interceptors registered directly under `key`.
    pub fn interceptor_count(&self, key: impl Into<EventKey>) -> usize {
        self.shared.state.lock().interceptors.count(&key.into())
    }
}

impl<D: Message> Hooks<D> {
    /// A handle that does not keep the registry alive.
    pub fn downgrade(&self) -> WeakHooks<D> {
        WeakHooks {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl<D: Message> Clone for Hooks<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D: Message> fmt::Debug for Hooks<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Hooks")
            .field("names", &state.interceptors.names().count())
            .field("handler_names", &state.handlers.names().count())
            .finish_non_exhaustive()
    }
}

/// A non-owning [`Hooks`] handle, for handlers that emit into their own
/// registry.
pub struct WeakHooks<D: Message> {
    shared: Weak<Shared<D>>,
}

impl<D: Message> WeakHooks<D> {
    /// The registry, if any [`Hooks`] handle is still alive.
    pub fn upgrade(&self) -> Option<Hooks<D>> {
        self.shared.upgrade().map(|shared| Hooks { shared })
    }
}

impl<D: Message> Clone for WeakHooks<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<D: Message> fmt::Debug for WeakHooks<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHooks")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

// ============================================================================
// Driver - executes queued emissions
// ============================================================================

/// Executes the emissions of one [`Hooks`] registry, strictly in FIFO order.
///
/// Either spawn [`Driver::run`] on an executor, or call [`Driver::tick`]
/// from the host's own loop.
pub struct Driver<D: Message> {
    queue: mpsc::UnboundedReceiver<Job<D>>,
    shared: Weak<Shared<D>>,
}

impl<D: Message> Driver<D> {
    /// Process emissions until every [`Hooks`] handle has been dropped.
    ///
    /// Handles captured by registered handlers or interceptors count too; a
    /// registry that holds a `Hooks` clone of itself never stops. Use
    /// [`WeakHooks`] there.
    pub async fn run(mut self) {
        while let Some(job) = self.queue.recv().await {
            if !self.execute(job) {
                break;
            }
        }
    }

    /// Process every queued emission, including ones queued while doing so.
    /// Returns the number of jobs handled.
    pub fn tick(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(job) = self.queue.try_recv() {
            if !self.execute(job) {
                break;
            }
            handled += 1;
        }
        handled
    }

    fn execute(&mut self, job: Job<D>) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            warn!("registry dropped with emissions queued; driver stopping");
            return false;
        };
        match job {
            Job::Emit(emission) => run_emission(shared, emission),
            Job::Flush(done) => {
                // Emissions queued after the barrier: move it behind them.
                if self.queue.is_empty() {
                    let _ = done.send(());
                } else {
                    let _ = shared.jobs.send(Job::Flush(done));
                }
            }
        }
        true
    }
}

impl<D: Message> fmt::Debug for Driver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("queued", &self.queue.len())
            .finish()
    }
}

fn run_emission<D: Message>(shared: Arc<Shared<D>>, emission: Emission<D>) {
    let Emission {
        event,
        data,
        chain,
        on_complete,
    } = emission;
    trace!(event = %event, interceptors = chain.len(), "running interceptor chain");

    let name = Arc::clone(&event);
    chain.run(event, data, move |data| {
        let handlers = shared.take_handlers(&name);
        trace!(event = %name, handlers = handlers.len(), "chain completed");
        dispatch::deliver(&name, &data, on_complete, &handlers);
    });
}
