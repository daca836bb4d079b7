use std::sync::Arc;

use tracing::warn;

use super::Watcher;

/// Watchers known to one client
///
/// Every registered watcher stores its own position so that removal is O(1):
/// the last element is moved into the freed position and its stored position
/// is updated.
#[derive(Debug, Default)]
pub(crate) struct WatcherRegistry {
    watchers: Vec<Arc<Watcher>>,
}

impl WatcherRegistry {
    /// Registers `watcher`; returns `false` if it is registered already
    pub(crate) fn add(
        &mut self,
        watcher: &Arc<Watcher>,
    ) -> bool {
        let mut slot = watcher.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(self.watchers.len());
        self.watchers.push(watcher.clone());
        true
    }

    /// Removes `watcher`; returns `false` if it is not registered here
    pub(crate) fn del(
        &mut self,
        watcher: &Watcher,
    ) -> bool {
        let mut slot = watcher.slot.lock();
        let Some(index) = *slot else {
            return false;
        };
        let owned = self
            .watchers
            .get(index)
            .is_some_and(|w| std::ptr::eq(Arc::as_ptr(w), watcher));
        if !owned {
            warn!("[{}] watcher position {} does not match the registry", watcher.key(), index);
            return false;
        }
        *slot = None;
        drop(slot);

        self.watchers.swap_remove(index);
        if let Some(moved) = self.watchers.get(index) {
            *moved.slot.lock() = Some(index);
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.watchers.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Watcher>> {
        self.watchers.iter()
    }

    /// Unregisters every watcher and hands them back
    pub(crate) fn clear(&mut self) -> Vec<Arc<Watcher>> {
        let watchers = std::mem::take(&mut self.watchers);
        for watcher in &watchers {
            *watcher.slot.lock() = None;
        }
        watchers
    }
}
