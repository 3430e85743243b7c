//! Poison-tolerant guards for the in-process store's `RwLock`.
//!
//! A panic while holding the lock poisons it, but cached entries are always
//! complete values, so the map stays structurally sound. Readers and writers
//! therefore take the inner guard and keep going rather than propagating the
//! poison to every later request.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(
            target = "marquee::cache::store",
            op,
            access = "read",
            "continuing past poisoned store lock"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(
            target = "marquee::cache::store",
            op,
            access = "write",
            "continuing past poisoned store lock"
        );
        poisoned.into_inner()
    })
}
