//! Keyed listener registry.
//!
//! A [`Registry`] maps a unique string key to one callback and an integer
//! depth. Registering under a key that is already present replaces the old
//! entry, so a subscriber that re-registers (for example after being rebuilt)
//! never ends up with two live callbacks. Snapshots are ordered by descending
//! depth, with ties broken by registration order.
//!
//! `register` hands back a [`Subscription`]. Dropping it removes the entry it
//! created, but only that entry: if the key has since been re-registered, the
//! newer callback stays.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Entry<F: ?Sized> {
    key: String,
    depth: i32,
    seq: u64,
    callback: Rc<RefCell<F>>,
}

/// Callback registry keyed by unique string.
pub struct Registry<F: ?Sized> {
    entries: Rc<RefCell<Vec<Entry<F>>>>,
    next_seq: Cell<u64>,
}

impl<F: ?Sized + 'static> Registry<F> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Rc::new(RefCell::new(Vec::new())), next_seq: Cell::new(0) }
    }

    /// Register `callback` under `key`, replacing any existing entry for that key.
    pub fn register(&self, key: impl Into<String>, depth: i32, callback: Rc<RefCell<F>>) -> Subscription {
        let key = key.into();
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|e| e.key != key);
            entries.push(Entry { key: key.clone(), depth, seq, callback });
            entries.sort_by(|a, b| b.depth.cmp(&a.depth).then(a.seq.cmp(&b.seq)));
        }

        let weak = Rc::downgrade(&self.entries);
        let owned_key = key.clone();
        Subscription {
            key,
            release: Some(Box::new(move || {
                if let Some(entries) = weak.upgrade() {
                    entries
                        .borrow_mut()
                        .retain(|e| !(e.key == owned_key && e.seq == seq));
                }
            })),
        }
    }

    /// Callbacks in invocation order (descending depth).
    ///
    /// Callers invoke the snapshot rather than iterating the registry so a
    /// callback may register or drop subscriptions while it runs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<RefCell<F>>> {
        self.entries.borrow().iter().map(|e| Rc::clone(&e.callback)).collect()
    }

    /// Registered keys in invocation order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.key.clone()).collect()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().iter().any(|e| e.key == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<F: ?Sized + 'static> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one registry entry. Dropping it unregisters the entry.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    key: String,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// The key this subscription was registered under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish_non_exhaustive()
    }
}
