use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared busy indicator with two states, Idle and Busy.
///
/// Cloning hands out another handle to the same flag; the handle lives in
/// `AppState` and is passed to whatever needs it rather than sitting in a
/// module-level global. The flag is not reference counted: `end` clears it
/// no matter how many `begin` calls preceded it, so overlapping operations
/// share one indicator and the first to finish clears it for everyone.
#[derive(Clone, Default)]
pub struct Activity {
    busy: Arc<AtomicBool>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Busy. Idempotent when already busy.
    pub fn begin(&self) {
        self.busy.store(true, Ordering::SeqCst);
    }

    /// Busy -> Idle. Idempotent when already idle.
    pub fn end(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Bracket a future with begin/end. The flag is cleared whatever the
    /// future resolves to.
    pub async fn track<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        self.begin();
        let out = fut.await;
        self.end();
        out
    }
}
