#![allow(dead_code)]

use hookline::{Constraints, Driver, Hooks, Id, Next, SharedHandler};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Payloads
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub body: String,
    pub tags: Vec<String>,
}

impl Document {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            tags: Vec::new(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn registry() -> (Hooks<Document>, Driver<Document>) {
    Hooks::new()
}

/// Interceptor appending `tag` to the document and continuing.
pub fn tagger(tag: &'static str) -> impl Fn(Document, Next<Document>, &str) + Send + Sync + 'static {
    move |mut doc, next, _| {
        doc.tags.push(tag.to_string());
        next.call(doc);
    }
}

/// Register a tagging interceptor whose id is also its tag.
pub fn inject_tag(hooks: &Hooks<Document>, key: &str, tag: &'static str, constraints: Constraints) {
    hooks
        .inject_with(key, tag, tagger(tag), constraints)
        .unwrap();
}

/// A handler pushing a label into a shared log.
pub fn labelled(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> SharedHandler<Document> {
    let log = Arc::clone(log);
    Arc::new(move |_: &Document, event: &str| {
        log.lock().unwrap().push(format!("{label}:{event}"));
    })
}

/// Owned ids, for comparing against resolved orders.
pub fn ids(list: &[&str]) -> Vec<Id> {
    list.iter().map(|id| Id::from(*id)).collect()
}
