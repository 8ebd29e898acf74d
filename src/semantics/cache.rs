//! Compute-once cells with cycle detection.
//!
//! Semantic elements resolve their names lazily: a base type, a property type or the function
//! bound by an `Apply` expression is computed on first access and then reused. Some of these
//! computations are recursive (a base type evaluates the base type of its base to detect
//! inheritance cycles), so a cell may be read again while it is still being computed.
//! [`Cache`] detects that re-entrant read and answers it with a caller-provided *cycle value*,
//! which then becomes the permanent value of the cell.
//!
//! # Thread Safety
//!
//! Cells are backed by [`OnceLock`] and can be shared across threads. The set of cells under
//! computation is tracked per thread, so a cell being computed on one thread is never mistaken
//! for a cycle on another. Two threads reading the same empty cell may both compute it; the
//! first stored value wins and, since all computations are deterministic, both observe the
//! same result.

use std::{cell::RefCell, collections::HashSet, fmt, sync::OnceLock};

thread_local! {
    static IN_FLIGHT: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// Marks a cell as being computed on the current thread until dropped.
struct InFlightGuard {
    key: usize,
}

impl InFlightGuard {
    /// Returns `None` if the cell is already being computed on this thread.
    fn enter(key: usize) -> Option<Self> {
        IN_FLIGHT
            .with(|set| set.borrow_mut().insert(key))
            .then(|| InFlightGuard { key })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|set| {
            set.borrow_mut().remove(&self.key);
        });
    }
}

/// A lazily computed, cycle-safe value.
pub struct Cache<T> {
    cell: OnceLock<T>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Cache<T> {
    /// Creates an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Cache {
            cell: OnceLock::new(),
        }
    }

    /// Returns the stored value without computing it.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Returns `true` once a value has been stored.
    pub fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the stored value, computing it on first access.
    ///
    /// If this cell is read again while `compute` is running on the same thread, the nested
    /// read stores and returns `on_cycle()`. The outer computation's result is then discarded
    /// in favour of the cycle value.
    ///
    /// ## Arguments
    /// * 'compute'  - Produces the value
    /// * 'on_cycle' - Produces the value for a re-entrant read
    pub fn get_or_compute<F, C>(&self, compute: F, on_cycle: C) -> &T
    where
        F: FnOnce() -> T,
        C: FnOnce() -> T,
    {
        if let Some(value) = self.cell.get() {
            return value;
        }

        let key = std::ptr::from_ref(self) as usize;
        let Some(guard) = InFlightGuard::enter(key) else {
            log::trace!("cycle detected on cache cell {key:#x}");
            return self.cell.get_or_init(on_cycle);
        };

        let value = compute();
        drop(guard);

        self.cell.get_or_init(|| value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Cache").field(value).finish(),
            None => f.write_str("Cache(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_computes_once() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new();

        for _ in 0..3 {
            let value = cache.get_or_compute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    42
                },
                || 0,
            );
            assert_eq!(*value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_computed());
    }

    struct Node {
        next: OnceLock<Arc<Node>>,
        depth: Cache<i64>,
    }

    impl Node {
        fn depth(&self) -> i64 {
            *self.depth.get_or_compute(
                || match self.next.get() {
                    Some(next) => next.depth() + 1,
                    None => 0,
                },
                || -100,
            )
        }
    }

    #[test]
    fn test_cycle_stores_cycle_value() {
        let a = Arc::new(Node {
            next: OnceLock::new(),
            depth: Cache::new(),
        });
        let b = Arc::new(Node {
            next: OnceLock::new(),
            depth: Cache::new(),
        });
        a.next.set(Arc::clone(&b)).ok();
        b.next.set(Arc::clone(&a)).ok();

        // a -> b -> a: the re-entrant read of `a` stores the cycle value, `b` builds on it
        assert_eq!(a.depth(), -100);
        assert_eq!(b.depth(), -99);
    }

    #[test]
    fn test_self_cycle() {
        let cache: Cache<u32> = Cache::new();
        let value = cache.get_or_compute(|| *cache.get_or_compute(|| 1, || 7) + 1, || 99);
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(Cache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || *cache.get_or_compute(|| 5u32, || 0))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 5);
        }
    }
}
