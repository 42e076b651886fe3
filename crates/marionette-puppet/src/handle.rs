//! Shared puppet handle
//!
//! The stage owns the puppet; the director and the lip-sync engine receive
//! a clone of this handle at construction. Writes are last-write-wins
//! within a frame and each call holds the lock only for its own duration.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::{CapabilityAdapter, Puppet, ResolutionTable};

/// Cloneable, lockable handle to one puppet's capability adapter
#[derive(Clone)]
pub struct PuppetHandle {
    inner: Arc<Mutex<CapabilityAdapter>>,
}

impl PuppetHandle {
    pub fn new(puppet: Box<dyn Puppet>) -> Self {
        Self::from_adapter(CapabilityAdapter::new(puppet))
    }

    pub fn with_table(puppet: Box<dyn Puppet>, table: ResolutionTable) -> Self {
        Self::from_adapter(CapabilityAdapter::with_table(puppet, table))
    }

    pub fn from_adapter(adapter: CapabilityAdapter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(adapter)),
        }
    }

    /// Lock the adapter for the duration of one operation
    pub fn lock(&self) -> MutexGuard<'_, CapabilityAdapter> {
        self.inner.lock()
    }

    /// Run `f` against the adapter
    pub fn with<R>(&self, f: impl FnOnce(&mut CapabilityAdapter) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Do two handles point at the same puppet?
    pub fn same_puppet(&self, other: &PuppetHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for PuppetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(adapter) => f.debug_tuple("PuppetHandle").field(&*adapter).finish(),
            None => f.debug_tuple("PuppetHandle").field(&"<locked>").finish(),
        }
    }
}
