use std::fmt;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

/// A lazily computed, write-once value with a re-entrancy guard.
///
/// Declaration getters re-enter the solver and may come back to the same
/// cell (class `A` whose supertype lookup needs `A`'s inherited member types).
/// A re-entrant call on the thread that is already computing the value gets
/// `None` instead of recursing; callers substitute a placeholder. Other
/// threads may compute concurrently; the first value stored wins.
pub struct Memo<T> {
    value: OnceLock<T>,
    in_flight: Mutex<Vec<ThreadId>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
            in_flight: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.lock().contains(&thread::current().id())
    }

    /// Returns the cached value, computing it with `init` on first use.
    /// Returns `None` when called re-entrantly from within `init`.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> Option<&T> {
        if let Some(value) = self.value.get() {
            return Some(value);
        }

        let me = thread::current().id();
        {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains(&me) {
                return None;
            }
            in_flight.push(me);
        }

        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            thread: me,
        };
        let computed = init();
        // Another thread may have won the race; keep the stored value.
        let _ = self.value.set(computed);
        self.value.get()
    }

    /// Like [`Memo::get_or_init`], cloning the value out and falling back to
    /// `placeholder` on re-entry.
    pub fn get_or(&self, init: impl FnOnce() -> T, placeholder: impl FnOnce() -> T) -> T
    where
        T: Clone,
    {
        match self.get_or_init(init) {
            Some(value) => value.clone(),
            None => placeholder(),
        }
    }
}

struct InFlightGuard<'a> {
    in_flight: &'a Mutex<Vec<ThreadId>>,
    thread: ThreadId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().retain(|t| *t != self.thread);
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("Memo").field(value).finish(),
            None => f.write_str("Memo(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn computes_once() {
        let calls = AtomicUsize::new(0);
        let memo = Memo::new();
        for _ in 0..3 {
            let v = memo.get_or_init(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                42
            });
            assert_eq!(v, Some(&42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentry_yields_placeholder_and_does_not_recurse() {
        let memo: Memo<Vec<&str>> = Memo::new();
        let outer = memo.get_or(
            || {
                let inner = memo.get_or(|| vec!["never"], Vec::new);
                assert!(inner.is_empty());
                vec!["outer"]
            },
            Vec::new,
        );
        assert_eq!(outer, vec!["outer"]);
        assert!(!memo.is_in_flight());
        assert_eq!(memo.get(), Some(&vec!["outer"]));
    }

    #[test]
    fn other_threads_are_not_treated_as_reentrant() {
        let memo = Arc::new(Memo::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let memo = Arc::clone(&memo);
                std::thread::spawn(move || *memo.get_or_init(|| i).unwrap())
            })
            .collect();
        let results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| *r == results[0]));
    }
}
