use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::common::PageId;

use super::{BufferPoolManager, PageHandle};

fn release(pool: &mut BufferPoolManager, handle: PageHandle) {
    if let Err(e) = pool.unpin(handle) {
        warn!(
            page = handle.page_id().as_u32(),
            error = %e,
            "page guard failed to unpin"
        );
    }
}

/// RAII guard for read-only access to a pinned page.
/// Automatically unpins the page when dropped.
pub struct ReadPageGuard<'a> {
    pool: &'a mut BufferPoolManager,
    handle: PageHandle,
}

impl<'a> ReadPageGuard<'a> {
    pub(crate) fn new(pool: &'a mut BufferPoolManager, handle: PageHandle) -> Self {
        Self { pool, handle }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.handle.page_id()
    }

    /// Returns a reference to the page data.
    pub fn data(&self) -> &[u8] {
        self.pool.frame(self.handle.frame_id()).data()
    }
}

impl Deref for ReadPageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl Drop for ReadPageGuard<'_> {
    fn drop(&mut self) {
        release(self.pool, self.handle);
    }
}

/// RAII guard for read-write access to a pinned page.
/// Marks the page dirty on first mutable access and unpins it when dropped.
pub struct WritePageGuard<'a> {
    pool: &'a mut BufferPoolManager,
    handle: PageHandle,
}

impl<'a> WritePageGuard<'a> {
    pub(crate) fn new(pool: &'a mut BufferPoolManager, handle: PageHandle) -> Self {
        Self { pool, handle }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.handle.page_id()
    }

    /// Returns a reference to the page data.
    pub fn data(&self) -> &[u8] {
        self.pool.frame(self.handle.frame_id()).data()
    }

    /// Returns a mutable reference to the page data.
    /// Automatically marks the page as dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.mark_dirty();
        self.data_mut_unmarked()
    }

    /// Returns the page data for writing without touching the dirty flag.
    /// The caller must call `mark_dirty` if it changes any byte.
    pub(crate) fn data_mut_unmarked(&mut self) -> &mut [u8] {
        self.pool.frame_mut(self.handle.frame_id()).data_mut()
    }

    /// Marks the page as dirty.
    pub fn mark_dirty(&mut self) {
        self.pool.frame_mut(self.handle.frame_id()).set_dirty(true);
    }
}

impl Deref for WritePageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl DerefMut for WritePageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}

impl Drop for WritePageGuard<'_> {
    fn drop(&mut self) {
        release(self.pool, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ReplacementPolicy;
    use crate::storage::disk::DiskManager;
    use tempfile::TempDir;

    fn create_bpm() -> (BufferPoolManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guard.tbl");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        dm.ensure_capacity(2).unwrap();
        let bpm = BufferPoolManager::new(dm, 2, ReplacementPolicy::Clock).unwrap();
        (bpm, dir)
    }

    #[test]
    fn test_read_page_guard() {
        let (mut bpm, _dir) = create_bpm();

        let guard = bpm.checked_read_page(PageId::new(1)).unwrap();
        assert_eq!(guard.page_id(), PageId::new(1));
        assert_eq!(guard.len(), crate::common::PAGE_SIZE);
        drop(guard);

        assert_eq!(bpm.pin_count(PageId::new(1)), Some(0));
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(false));
    }

    #[test]
    fn test_write_page_guard() {
        let (mut bpm, _dir) = create_bpm();

        {
            let mut guard = bpm.checked_write_page(PageId::new(1)).unwrap();
            assert_eq!(bpm_pin_count_while_held(&guard), 1);
            guard[0] = 42;
        }

        assert_eq!(bpm.pin_count(PageId::new(1)), Some(0));
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(true));

        let guard = bpm.checked_read_page(PageId::new(1)).unwrap();
        assert_eq!(guard[0], 42);
    }

    #[test]
    fn test_write_guard_without_mutation_stays_clean() {
        let (mut bpm, _dir) = create_bpm();

        {
            let guard = bpm.checked_write_page(PageId::new(1)).unwrap();
            assert_eq!(guard.data()[0], 0);
        }
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(false));
    }

    #[test]
    fn test_unmarked_write_dirty_only_when_marked() {
        let (mut bpm, _dir) = create_bpm();

        {
            let mut guard = bpm.checked_write_page(PageId::new(1)).unwrap();
            assert_eq!(guard.data_mut_unmarked()[0], 0);
        }
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(false));

        {
            let mut guard = bpm.checked_write_page(PageId::new(1)).unwrap();
            guard.data_mut_unmarked()[0] = 9;
            guard.mark_dirty();
        }
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(true));
    }

    fn bpm_pin_count_while_held(guard: &WritePageGuard<'_>) -> u32 {
        guard.pool.frame(guard.handle.frame_id()).pin_count()
    }
}
