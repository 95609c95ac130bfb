//! Interceptor resolution.
//!
//! Turning the interceptors registered for a name into an executable
//! [`Chain`] happens in four steps:
//!
//! 1. **Collect** the pool: the exact-name pool, then every filter pool whose
//!    predicate accepted the name. An id seen twice fails the pool.
//! 2. **Validate** `depends` and `conflicts` across the whole pool.
//! 3. **Bucket** by [`Order`]: `Pre`, `Mid`, `Post`.
//! 4. **Sort** each bucket by its `after` / `before` relations and
//!    concatenate the buckets.
//!
//! Results are cached per name until a store mutation invalidates them.
//! Names without any interceptor are not cached; they all share one empty
//! chain, so emitting arbitrary names does not grow the cache.
//!
//! Filter predicates are evaluated by the caller (see
//! [`accepting`](crate::store::accepting)), which passes the accepted filters in.

use crate::store::{InterceptorStore, Invalidate};
use hookline_core::{Chain, Filter, HookError, Id, InterceptorEntry, Message, Order, Result};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

type Entry<D> = Arc<InterceptorEntry<D>>;

/// Caches resolved chains per concrete event name.
pub struct Resolver<D: Message> {
    cache: HashMap<Arc<str>, Chain<D>>,
    empty: Chain<D>,
}

impl<D: Message> Resolver<D> {
    /// Create a resolver with an empty cache.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            empty: Chain::empty(),
        }
    }

    /// The cached chain for `name`, if any.
    pub fn cached(&self, name: &str) -> Option<Chain<D>> {
        self.cache.get(name).cloned()
    }

    /// Resolve `name`, reusing the cached chain when there is one.
    ///
    /// `accepted` are the filters whose predicate accepts `name`. A cache hit
    /// returns a clone of the same allocation (see [`Chain::ptr_eq`]);
    /// nothing is re-sorted until an invalidation.
    pub fn resolve(
        &mut self,
        store: &InterceptorStore<D>,
        name: &str,
        accepted: &[Filter],
    ) -> Result<Chain<D>> {
        if let Some(chain) = self.cache.get(name) {
            trace!(event = name, "resolved chain cache hit");
            return Ok(chain.clone());
        }

        let pool = collect(store, name, accepted)?;
        if pool.is_empty() {
            return Ok(self.empty.clone());
        }
        let chain = Chain::new(order(pool)?);
        debug!(event = name, len = chain.len(), "resolved interceptor chain");
        self.cache.insert(Arc::from(name), chain.clone());
        Ok(chain)
    }

    /// Drop the cached chains a mutation may have affected.
    pub fn invalidate(&mut self, scope: &Invalidate) {
        match scope {
            Invalidate::Name(name) => {
                if self.cache.remove(name).is_some() {
                    debug!(event = %name, "invalidated resolved chain");
                }
            }
            Invalidate::All => {
                debug!(cached = self.cache.len(), "invalidated all resolved chains");
                self.cache.clear();
            }
        }
    }

    /// Whether `name` currently has a cached chain. Names without
    /// interceptors never do.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }
}

impl<D: Message> Default for Resolver<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every pool matching `name`, rejecting repeated ids.
fn collect<D: Message>(
    store: &InterceptorStore<D>,
    name: &str,
    accepted: &[Filter],
) -> Result<Vec<Entry<D>>> {
    let mut seen = HashSet::new();
    let mut pool = Vec::new();
    for entry in store.pools_for(name, accepted).flat_map(|pool| pool.values()) {
        if !seen.insert(entry.id()) {
            return Err(HookError::DuplicateId {
                id: entry.id().clone(),
            });
        }
        pool.push(Arc::clone(entry));
    }
    Ok(pool)
}

/// Validate, bucket and sort a collected pool.
fn order<D: Message>(pool: Vec<Entry<D>>) -> Result<Vec<Entry<D>>> {
    validate(&pool)?;

    let mut ordered = Vec::with_capacity(pool.len());
    for bucket in Order::ALL {
        let members = pool
            .iter()
            .filter(|entry| entry.constraints().order == bucket)
            .cloned()
            .collect();
        ordered.extend(sort_bucket(members)?);
    }
    Ok(ordered)
}

fn validate<D: Message>(pool: &[Entry<D>]) -> Result<()> {
    let present: HashSet<&Id> = pool.iter().map(|entry| entry.id()).collect();

    for entry in pool {
        let constraints = entry.constraints();
        if let Some(missing) = constraints.depends.iter().find(|id| !present.contains(id)) {
            return Err(HookError::MissingDependency {
                id: entry.id().clone(),
                dependency: missing.clone(),
            });
        }
        if let Some(other) = constraints.conflicts.iter().find(|id| present.contains(id)) {
            return Err(HookError::Conflict {
                id: entry.id().clone(),
                other: other.clone(),
            });
        }
    }
    Ok(())
}

/// Repeated-pass worklist over one bucket.
///
/// Each pass emits, in pool order, every pending entry that neither waits on
/// a pending `after` id nor is named in the `before` list of a pending entry.
/// Ids outside the bucket never block anything.
fn sort_bucket<D: Message>(mut pending: Vec<Entry<D>>) -> Result<Vec<Entry<D>>> {
    let mut sorted = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let unresolved: HashSet<&Id> = pending.iter().map(|entry| entry.id()).collect();
        let ready: Vec<bool> = pending
            .iter()
            .map(|entry| {
                let waits_after = entry
                    .constraints()
                    .after
                    .iter()
                    .any(|id| unresolved.contains(id));
                let held_before = pending
                    .iter()
                    .any(|other| other.constraints().before.contains(entry.id()));
                !waits_after && !held_before
            })
            .collect();

        if !ready.contains(&true) {
            return Err(HookError::CircularDependency {
                ids: pending.iter().map(|entry| entry.id().clone()).collect(),
            });
        }

        let mut flags = ready.into_iter();
        let (emitted, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|_| flags.next().unwrap_or(false));
        sorted.extend(emitted);
        pending = blocked;
    }

    Ok(sorted)
}
