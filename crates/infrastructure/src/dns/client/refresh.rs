use super::super::cache::CacheKey;
use rustc_hash::FxHashSet;
use std::sync::{Mutex, PoisonError};

/// Keys with a background refresh in flight.
#[derive(Default)]
pub(crate) struct RefreshSet {
    keys: Mutex<FxHashSet<CacheKey>>,
}

pub(crate) struct RefreshGuard<'a> {
    set: &'a RefreshSet,
    key: CacheKey,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.set
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl RefreshSet {
    /// `None` when another refresh already owns `key`.
    pub(crate) fn try_acquire(&self, key: CacheKey) -> Option<RefreshGuard<'_>> {
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then(|| RefreshGuard { set: self, key })
    }
}
