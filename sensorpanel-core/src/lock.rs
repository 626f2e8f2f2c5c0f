//! Renderer lock
//!
//! The GUI library is not reentrant. The render loop holds this lock for a
//! whole iteration; other tasks take it with a bounded wait and skip their
//! work when it stays busy.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

/// Async mutex around the renderer state
pub struct RendererLock<M: RawMutex, R> {
    inner: Mutex<M, R>,
}

impl<M: RawMutex, R> RendererLock<M, R> {
    pub const fn new(renderer: R) -> Self {
        Self {
            inner: Mutex::new(renderer),
        }
    }

    /// Wait as long as it takes
    pub async fn lock(&self) -> MutexGuard<'_, M, R> {
        self.inner.lock().await
    }

    /// Wait at most `timeout`; `None` when the lock stayed busy
    pub async fn lock_within(&self, timeout: Duration) -> Option<MutexGuard<'_, M, R>> {
        with_timeout(timeout, self.inner.lock()).await.ok()
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, M, R>> {
        self.inner.try_lock().ok()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}
