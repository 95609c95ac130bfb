//! Interceptor and handler storage.
//!
//! Both stores keep concrete-name pools and filter pools apart: a name pool
//! is found by hashing, filter pools have to be scanned and evaluated for
//! every name. Pools keep insertion order, which is what ties are broken by
//! during resolution and the order handlers fire in.
//!
//! Filter predicates are user code, so the stores never evaluate them.
//! Callers snapshot the keys with `filters()`, run [`accepting`] without
//! holding any lock, and pass the accepted filters back in.

use hookline_core::{
    EventKey, Filter, HookError, Id, InterceptorEntry, Message, Missing, Result, SharedHandler,
    same_handler,
};
use indexmap::IndexMap;
use std::{collections::HashMap, sync::Arc};

/// Interceptors registered under one key, by id, in insertion order.
pub type Pool<D> = IndexMap<Id, Arc<InterceptorEntry<D>>>;

/// Which resolved chains a store mutation may have changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidate {
    /// Only the chain for this concrete name.
    Name(Arc<str>),
    /// Any chain: a filter may match any name.
    All,
}

/// The filters in `filters` whose predicate accepts `name`.
pub fn accepting(filters: &[Filter], name: &str) -> Vec<Filter> {
    filters
        .iter()
        .filter(|filter| filter.matches(name))
        .cloned()
        .collect()
}

fn is_accepted(accepted: &[Filter], filter: &Filter) -> bool {
    accepted.iter().any(|other| other.ptr_eq(filter))
}

impl Invalidate {
    fn for_key(key: &EventKey) -> Self {
        match key {
            EventKey::Name(name) => Invalidate::Name(Arc::clone(name)),
            EventKey::Filter(_) => Invalidate::All,
        }
    }
}

/// A per-key collection that is either hashed by name or scanned by filter.
struct Keyed<T> {
    names: HashMap<Arc<str>, T>,
    filters: Vec<(Filter, T)>,
}

impl<T: Default> Keyed<T> {
    fn new() -> Self {
        Self {
            names: HashMap::new(),
            filters: Vec::new(),
        }
    }

    fn get(&self, key: &EventKey) -> Option<&T> {
        match key {
            EventKey::Name(name) => self.names.get(name),
            EventKey::Filter(filter) => self
                .filters
                .iter()
                .find(|(own, _)| own.ptr_eq(filter))
                .map(|(_, value)| value),
        }
    }

    fn get_mut(&mut self, key: &EventKey) -> Option<&mut T> {
        match key {
            EventKey::Name(name) => self.names.get_mut(name),
            EventKey::Filter(filter) => self
                .filters
                .iter_mut()
                .find(|(own, _)| own.ptr_eq(filter))
                .map(|(_, value)| value),
        }
    }

    fn entry(&mut self, key: &EventKey) -> &mut T {
        match key {
            EventKey::Name(name) => self.names.entry(Arc::clone(name)).or_default(),
            EventKey::Filter(filter) => {
                let position = match self.filters.iter().position(|(own, _)| own.ptr_eq(filter)) {
                    Some(position) => position,
                    None => {
                        self.filters.push((filter.clone(), T::default()));
                        self.filters.len() - 1
                    }
                };
                &mut self.filters[position].1
            }
        }
    }

    fn drop_key(&mut self, key: &EventKey) {
        match key {
            EventKey::Name(name) => {
                self.names.remove(name);
            }
            EventKey::Filter(filter) => self.filters.retain(|(own, _)| !own.ptr_eq(filter)),
        }
    }

    fn filter_keys(&self) -> Vec<Filter> {
        self.filters.iter().map(|(filter, _)| filter.clone()).collect()
    }

    fn same_filters(&self, snapshot: &[Filter]) -> bool {
        self.filters.len() == snapshot.len()
            && self
                .filters
                .iter()
                .zip(snapshot)
                .all(|((own, _), other)| own.ptr_eq(other))
    }

    /// The name pool for `name` first, then every accepted filter pool.
    fn matching<'a>(
        &'a self,
        name: &'a str,
        accepted: &'a [Filter],
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.names.get(name).into_iter().chain(
            self.filters
                .iter()
                .filter(move |(filter, _)| is_accepted(accepted, filter))
                .map(|(_, value)| value),
        )
    }
}

// ============================================================================
// InterceptorStore
// ============================================================================

/// Owns every registered interceptor, grouped by key.
pub struct InterceptorStore<D: Message> {
    pools: Keyed<Pool<D>>,
}

impl<D: Message> InterceptorStore<D> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            pools: Keyed::new(),
        }
    }

    /// Add an interceptor under `key`.
    ///
    /// Fails with [`HookError::DuplicateId`] if the id is already taken
    /// under the same key. Ids under different keys are only checked
    /// against each other when a name resolves to both.
    pub fn insert(&mut self, key: &EventKey, entry: InterceptorEntry<D>) -> Result<Invalidate> {
        let pool = self.pools.entry(key);
        if pool.contains_key(entry.id()) {
            return Err(HookError::DuplicateId {
                id: entry.id().clone(),
            });
        }
        pool.insert(entry.id().clone(), Arc::new(entry));
        Ok(Invalidate::for_key(key))
    }

    /// Remove the interceptor `id` from `key`, dropping the key once empty.
    pub fn remove(&mut self, key: &EventKey, id: &str) -> Result<Invalidate> {
        let not_found = || HookError::NotFound {
            key: key.to_string(),
            what: Missing::Interceptor(Id::from(id)),
        };
        let pool = self.pools.get_mut(key).ok_or_else(not_found)?;
        pool.shift_remove(id).ok_or_else(not_found)?;
        if pool.is_empty() {
            self.pools.drop_key(key);
        }
        Ok(Invalidate::for_key(key))
    }

    /// Pools for `name`: the exact pool, then the pools of `accepted`
    /// filters in registration order.
    pub fn pools_for<'a>(
        &'a self,
        name: &'a str,
        accepted: &'a [Filter],
    ) -> impl Iterator<Item = &'a Pool<D>> + 'a {
        self.pools.matching(name, accepted)
    }

    /// Filter keys with at least one interceptor, in registration order.
    pub fn filters(&self) -> Vec<Filter> {
        self.pools.filter_keys()
    }

    /// Whether the filter keys are still exactly `snapshot`.
    pub fn has_filters(&self, snapshot: &[Filter]) -> bool {
        self.pools.same_filters(snapshot)
    }

    /// Concrete names that have at least one interceptor.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.pools.names.keys()
    }

    /// Number of interceptors registered directly under `key`.
    pub fn count(&self, key: &EventKey) -> usize {
        self.pools.get(key).map_or(0, IndexMap::len)
    }
}

impl<D: Message> Default for InterceptorStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HandlerStore
// ============================================================================

struct HandlerEntry<D: Message> {
    handler: SharedHandler<D>,
    once: bool,
}

/// Owns every registered handler, grouped by key, in registration order.
pub struct HandlerStore<D: Message> {
    lists: Keyed<Vec<HandlerEntry<D>>>,
}

impl<D: Message> HandlerStore<D> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            lists: Keyed::new(),
        }
    }

    /// Register `handler` under `key`. `once` handlers are unregistered the
    /// first time they are collected by [`HandlerStore::take_matching`].
    pub fn insert(&mut self, key: &EventKey, handler: SharedHandler<D>, once: bool) {
        self.lists.entry(key).push(HandlerEntry { handler, once });
    }

    /// Remove the first handler under `key` with the same identity.
    pub fn remove(&mut self, key: &EventKey, handler: &SharedHandler<D>) -> Result<()> {
        let not_found = || HookError::NotFound {
            key: key.to_string(),
            what: Missing::Handler,
        };
        let list = self.lists.get_mut(key).ok_or_else(not_found)?;
        let position = list
            .iter()
            .position(|entry| same_handler(&entry.handler, handler))
            .ok_or_else(not_found)?;
        list.remove(position);
        if list.is_empty() {
            self.lists.drop_key(key);
        }
        Ok(())
    }

    /// Collect the handlers for `name`: exact-name handlers first, then
    /// those of every `accepted` filter. One-shot handlers are removed.
    pub fn take_matching(&mut self, name: &str, accepted: &[Filter]) -> Vec<SharedHandler<D>> {
        let handlers: Vec<SharedHandler<D>> = self
            .lists
            .matching(name, accepted)
            .flatten()
            .map(|entry| Arc::clone(&entry.handler))
            .collect();

        let has_once = self
            .lists
            .matching(name, accepted)
            .flatten()
            .any(|entry| entry.once);
        if has_once {
            if let Some(list) = self.lists.names.get_mut(name) {
                list.retain(|entry| !entry.once);
            }
            for (filter, list) in &mut self.lists.filters {
                if is_accepted(accepted, filter) {
                    list.retain(|entry| !entry.once);
                }
            }
            self.lists.names.retain(|_, list| !list.is_empty());
            self.lists.filters.retain(|(_, list)| !list.is_empty());
        }

        handlers
    }

    /// Filter keys with at least one handler, in registration order.
    pub fn filters(&self) -> Vec<Filter> {
        self.lists.filter_keys()
    }

    /// Concrete names that have at least one handler.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.lists.names.keys()
    }

    /// Number of handlers registered directly under `key`.
    pub fn count(&self, key: &EventKey) -> usize {
        self.lists.get(key).map_or(0, Vec::len)
    }
}

impl<D: Message> Default for HandlerStore<D> {
    fn default() -> Self {
        Self::new()
    }
}
