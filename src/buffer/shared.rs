use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::BufferPoolManager;

/// A buffer pool shared between owners or threads.
///
/// One lock guards the whole pool and is held across every pin, unpin and
/// eviction a caller performs inside `with`. Clones share the same pool.
#[derive(Clone)]
pub struct SharedBufferPool {
    inner: Arc<Mutex<BufferPoolManager>>,
}

impl SharedBufferPool {
    pub fn new(pool: BufferPoolManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Runs `f` with exclusive access to the pool.
    pub fn with<R>(&self, f: impl FnOnce(&mut BufferPoolManager) -> R) -> R {
        let mut pool = self.inner.lock();
        f(&mut pool)
    }

    /// Locks the pool until the returned guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, BufferPoolManager> {
        self.inner.lock()
    }

    /// Returns the pool if this is the last handle to it.
    pub fn try_unwrap(self) -> Result<BufferPoolManager, Self> {
        Arc::try_unwrap(self.inner)
            .map(|mutex| mutex.into_inner())
            .map_err(|inner| Self { inner })
    }
}
