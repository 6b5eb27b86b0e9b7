//! Bounded recursion for nested containers.
//!
//! Archives inside archives are unpacked by calling back into the unpacker.
//! A [`RecursionGuard`] caps how deep that goes. It belongs to one unpacking
//! session; two sessions never share a depth counter.
//!
//! When a stack size is configured, each guarded level runs on a scoped
//! worker thread with that stack, so deep nesting cannot overflow the
//! caller's stack.

use std::panic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, warn};

/// Depth limit used when none is configured.
pub const DEFAULT_RECURSION_LIMIT: usize = 10;

/// Session-scoped depth counter with a ceiling.
#[derive(Debug)]
pub struct RecursionGuard {
    depth: AtomicUsize,
    limit: usize,
    limit_reached: AtomicBool,
    stack_size: Option<usize>,
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_RECURSION_LIMIT)
    }
}

impl RecursionGuard {
    /// Create a guard allowing `limit` nested levels.
    pub fn new(limit: usize) -> Self {
        Self {
            depth: AtomicUsize::new(0),
            limit,
            limit_reached: AtomicBool::new(false),
            stack_size: None,
        }
    }

    /// Run every guarded level on a worker thread with `stack_size` bytes of
    /// stack.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Configured ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of levels currently active.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Whether some call was refused because the ceiling was hit.
    pub fn recursion_limit_reached(&self) -> bool {
        self.limit_reached.load(Ordering::SeqCst)
    }

    /// Run `action` one level deeper.
    ///
    /// Returns `None` without running `action` when the ceiling is reached.
    /// A panic inside `action` is resumed on the calling thread after the
    /// depth has been restored.
    pub fn recurse<T, F>(&self, action: F) -> Option<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let depth = self.depth.load(Ordering::SeqCst);
        if depth >= self.limit {
            warn!(depth, limit = self.limit, "recursion limit reached");
            self.limit_reached.store(true, Ordering::SeqCst);
            return None;
        }

        self.depth.fetch_add(1, Ordering::SeqCst);
        debug!(depth = depth + 1, "entering nested level");
        let _level = LevelGuard(&self.depth);

        match self.stack_size {
            None => Some(action()),
            Some(stack_size) => Some(run_with_stack(stack_size, action)),
        }
    }
}

/// Decrements the depth when a level ends, including by unwinding.
struct LevelGuard<'a>(&'a AtomicUsize);

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn run_with_stack<T, F>(stack_size: usize, action: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("vnarc-nested".into())
            .stack_size(stack_size)
            .spawn_scoped(scope, action);
        match worker {
            Ok(handle) => match handle.join() {
                Ok(value) => value,
                Err(payload) => panic::resume_unwind(payload),
            },
            // Same outcome as `Scope::spawn` when the OS refuses a thread.
            Err(e) => panic!("failed to spawn nested worker: {e}"),
        }
    })
}
