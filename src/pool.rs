//! A small thread-safe object pool for reusing [`crate::exec::Cache`]
//! scratch space across searches.
//!
//! `Regex` is meant to be cheaply clonable and shareable (an `Arc<Program>`
//! under the hood), but each concurrent search still needs its own mutable
//! scratch buffers. Rather than allocate fresh buffers per call or force
//! callers to manage a `Cache` themselves, `Pool<T>` hands one out from a
//! small free list and returns it automatically when the guard drops, so
//! cloning a `Regex` doesn't force unrelated threads to contend on the
//! same lock.
//!
//! No existing crate in this workspace's dependency graph is pulled in
//! just for this; it's a couple dozen lines over `std::sync::Mutex` (or, in
//! `alloc`-only builds without `std`, a `spin`-style busy-wait lock built
//! from `core::sync::atomic`), so a dependency would buy nothing here.

use alloc::vec::Vec;

#[cfg(feature = "std")]
use std::sync::Mutex;

#[cfg(not(feature = "std"))]
use core::sync::atomic::{AtomicBool, Ordering};

/// A pool of reusable `T`s created on demand by `factory`.
pub struct Pool<T> {
    #[cfg(feature = "std")]
    free: Mutex<Vec<T>>,
    #[cfg(not(feature = "std"))]
    free: Spinlock<Vec<T>>,
    factory: fn() -> T,
}

impl<T> Pool<T> {
    pub fn new(factory: fn() -> T) -> Pool<T> {
        Pool {
            #[cfg(feature = "std")]
            free: Mutex::new(Vec::new()),
            #[cfg(not(feature = "std"))]
            free: Spinlock::new(Vec::new()),
            factory,
        }
    }

    /// Take an item from the pool, creating one with `factory` if it's
    /// empty. The returned guard puts the item back on drop.
    pub fn get(&self) -> PoolGuard<'_, T> {
        let item = self.pop().unwrap_or_else(|| (self.factory)());
        PoolGuard { pool: self, item: Some(item) }
    }

    #[cfg(feature = "std")]
    fn pop(&self) -> Option<T> {
        self.free.lock().unwrap_or_else(|p| p.into_inner()).pop()
    }

    #[cfg(not(feature = "std"))]
    fn pop(&self) -> Option<T> {
        self.free.lock(|v| v.pop())
    }

    #[cfg(feature = "std")]
    fn push(&self, item: T) {
        self.free.lock().unwrap_or_else(|p| p.into_inner()).push(item);
    }

    #[cfg(not(feature = "std"))]
    fn push(&self, item: T) {
        self.free.lock(|v| v.push(item));
    }
}

/// A borrowed item from a [`Pool`]; returns itself to the pool when dropped.
pub struct PoolGuard<'a, T> {
    pool: &'a Pool<T>,
    item: Option<T>,
}

impl<'a, T> core::ops::Deref for PoolGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.item.as_ref().expect("PoolGuard item taken before drop")
    }
}

impl<'a, T> core::ops::DerefMut for PoolGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("PoolGuard item taken before drop")
    }
}

impl<'a, T> Drop for PoolGuard<'a, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.push(item);
        }
    }
}

/// A minimal spin-lock for `alloc`-only builds where `std::sync::Mutex`
/// isn't available. Busy-waits rather than parking the thread — acceptable
/// here because the critical section is a single `Vec::push`/`pop`, never
/// blocked on I/O or a page fault.
#[cfg(not(feature = "std"))]
struct Spinlock<T> {
    locked: AtomicBool,
    value: core::cell::UnsafeCell<T>,
}

#[cfg(not(feature = "std"))]
unsafe impl<T: Send> Sync for Spinlock<T> {}

#[cfg(not(feature = "std"))]
impl<T> Spinlock<T> {
    fn new(value: T) -> Spinlock<T> {
        Spinlock { locked: AtomicBool::new(false), value: core::cell::UnsafeCell::new(value) }
    }

    fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        while self.locked.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed).is_err() {
            core::hint::spin_loop();
        }
        let result = f(unsafe { &mut *self.value.get() });
        self.locked.store(false, Ordering::Release);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_returned_item() {
        let pool: Pool<Vec<u8>> = Pool::new(Vec::new);
        {
            let mut guard = pool.get();
            guard.push(1);
        }
        let guard = pool.get();
        assert_eq!(*guard, alloc::vec![1u8]);
    }

    #[test]
    fn creates_new_item_when_empty() {
        let pool: Pool<Vec<u8>> = Pool::new(Vec::new);
        let g1 = pool.get();
        let g2 = pool.get();
        assert_eq!(*g1, Vec::<u8>::new());
        assert_eq!(*g2, Vec::<u8>::new());
    }
}
