use std::collections::{HashMap, VecDeque};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::common::{FrameId, PageId, Result, StoreError};
use crate::storage::disk::DiskManager;

use super::{create_replacer, FrameHeader, ReadPageGuard, ReplacementPolicy, Replacer, WritePageGuard};

/// Token for one pin on a resident page.
///
/// Returned by `pin` and consumed by `unpin`. A handle only stays valid while
/// the pin it stands for is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    page_id: PageId,
    frame_id: FrameId,
}

impl PageHandle {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

/// BufferPoolManager caches pages of one file in a fixed number of frames.
///
/// Pages are pinned while in use and only unpinned frames are handed to the
/// replacer as eviction candidates. A dirty victim is written back before its
/// frame is reused. The pool is single-threaded; wrap it in a
/// `SharedBufferPool` to share it.
pub struct BufferPoolManager {
    /// The buffer pool frames
    frames: Vec<FrameHeader>,
    /// Page table: maps resident page IDs to frame IDs
    page_table: HashMap<PageId, FrameId>,
    /// Frames that hold no page
    free_list: VecDeque<FrameId>,
    /// Eviction policy
    replacer: Box<dyn Replacer>,
    policy: ReplacementPolicy,
    /// The page file behind the pool
    disk_manager: DiskManager,
    /// Pages read from disk by this pool
    num_read_io: u64,
    /// Pages written to disk by this pool
    num_write_io: u64,
}

impl BufferPoolManager {
    /// Creates a pool of `pool_size` frames over an open page file.
    pub fn new(
        disk_manager: DiskManager,
        pool_size: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(StoreError::invalid("buffer pool needs at least one frame"));
        }
        let frame_count = u32::try_from(pool_size)
            .map_err(|_| StoreError::invalid(format!("pool size {} too large", pool_size)))?;

        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        for i in 0..frame_count {
            let frame_id = FrameId::new(i);
            frames.push(FrameHeader::new(frame_id));
            free_list.push_back(frame_id);
        }

        let replacer = create_replacer(policy, pool_size)?;

        debug!(
            path = %disk_manager.path().display(),
            pool_size,
            ?policy,
            "opened buffer pool"
        );

        Ok(Self {
            frames,
            page_table: HashMap::with_capacity(pool_size),
            free_list,
            replacer,
            policy,
            disk_manager,
            num_read_io: 0,
            num_write_io: 0,
        })
    }

    /// Pins a page, reading it from disk on a miss.
    ///
    /// Fails with `PageNotFound` if the page is beyond the end of the file and
    /// with `BufferPoolFull` if every frame is pinned.
    pub fn pin(&mut self, page_id: PageId) -> Result<PageHandle> {
        let frame_id = self.fetch_page(page_id)?;
        Ok(PageHandle { page_id, frame_id })
    }

    /// Releases one pin. The frame becomes an eviction candidate when its pin
    /// count drops to zero.
    pub fn unpin(&mut self, handle: PageHandle) -> Result<()> {
        let frame = self.resident_frame_mut(handle)?;
        match frame.unpin() {
            None => Err(StoreError::PageNotPinned(handle.page_id)),
            Some(0) => {
                self.replacer.set_evictable(handle.frame_id, true);
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    /// Marks a pinned page as modified. No I/O happens until the frame is
    /// flushed, forced or evicted.
    pub fn mark_dirty(&mut self, handle: PageHandle) -> Result<()> {
        self.pinned_frame_mut(handle)?.set_dirty(true);
        Ok(())
    }

    /// Writes a pinned page to disk whether or not it is dirty.
    pub fn force(&mut self, handle: PageHandle) -> Result<()> {
        self.pinned_frame_mut(handle)?;
        self.write_frame(handle.frame_id)
    }

    /// Writes a resident page to disk whether or not it is dirty.
    /// Returns false if the page is not in the pool.
    pub fn force_page(&mut self, page_id: PageId) -> Result<bool> {
        match self.page_table.get(&page_id) {
            Some(&frame_id) => {
                self.write_frame(frame_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes every dirty resident page to disk. Pages stay resident.
    pub fn flush_all(&mut self) -> Result<()> {
        for index in 0..self.frames.len() {
            let frame = &self.frames[index];
            if frame.page_id().is_none() || !frame.is_dirty() {
                continue;
            }
            let frame_id = frame.frame_id();
            self.write_frame(frame_id)?;
        }
        Ok(())
    }

    /// Flushes every dirty page and closes the page file.
    ///
    /// Fails with `PageStillPinned` if a page is still pinned; dirty pages
    /// have been written by then.
    pub fn shutdown(mut self) -> Result<()> {
        self.flush_all()?;

        if let Some(frame) = self.frames.iter().find(|f| f.pin_count() > 0) {
            if let Some(page_id) = frame.page_id() {
                return Err(StoreError::PageStillPinned(page_id));
            }
        }

        info!(
            path = %self.disk_manager.path().display(),
            reads = self.num_read_io,
            writes = self.num_write_io,
            "buffer pool shut down"
        );
        self.disk_manager.close()
    }

    /// Returns the bytes of a pinned page.
    pub fn page_data(&self, handle: PageHandle) -> Result<&[u8]> {
        Ok(self.pinned_frame(handle)?.data())
    }

    /// Returns the bytes of a pinned page for writing. Call `mark_dirty` to
    /// have the change written back.
    pub fn page_data_mut(&mut self, handle: PageHandle) -> Result<&mut [u8]> {
        Ok(self.pinned_frame_mut(handle)?.data_mut())
    }

    /// Pins a page for reading. The guard unpins it when dropped.
    pub fn checked_read_page(&mut self, page_id: PageId) -> Result<ReadPageGuard<'_>> {
        let handle = self.pin(page_id)?;
        Ok(ReadPageGuard::new(self, handle))
    }

    /// Pins a page for writing. The guard marks it dirty on `data_mut` and
    /// unpins it when dropped.
    pub fn checked_write_page(&mut self, page_id: PageId) -> Result<WritePageGuard<'_>> {
        let handle = self.pin(page_id)?;
        Ok(WritePageGuard::new(self, handle))
    }

    /// Grows the page file until it holds at least `num_pages` pages.
    pub fn ensure_capacity(&mut self, num_pages: u32) -> Result<()> {
        self.disk_manager.ensure_capacity(num_pages)
    }

    /// Returns the number of pages in the page file.
    pub fn num_pages(&self) -> u32 {
        self.disk_manager.num_pages()
    }

    /// Returns the path of the page file.
    pub fn path(&self) -> &Path {
        self.disk_manager.path()
    }

    /// Returns the number of pages this pool read from disk.
    pub fn num_read_io(&self) -> u64 {
        self.num_read_io
    }

    /// Returns the number of pages this pool wrote to disk.
    pub fn num_write_io(&self) -> u64 {
        self.num_write_io
    }

    /// Returns the page held by each frame, in frame order.
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        self.frames.iter().map(|f| f.page_id()).collect()
    }

    /// Returns the dirty flag of each frame, in frame order.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.is_dirty()).collect()
    }

    /// Returns the pin count of each frame, in frame order.
    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.pin_count()).collect()
    }

    /// Returns the pin count for a page, or None if it is not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.page_table
            .get(&page_id)
            .map(|&frame_id| self.frames[frame_id.as_usize()].pin_count())
    }

    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.page_table.contains_key(&page_id)
    }

    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.page_table
            .get(&page_id)
            .map(|&frame_id| self.frames[frame_id.as_usize()].is_dirty())
    }

    /// Returns the pool size.
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of resident pages that could be evicted.
    pub fn evictable_count(&self) -> usize {
        self.replacer.size()
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub(crate) fn frame(&self, frame_id: FrameId) -> &FrameHeader {
        &self.frames[frame_id.as_usize()]
    }

    pub(crate) fn frame_mut(&mut self, frame_id: FrameId) -> &mut FrameHeader {
        &mut self.frames[frame_id.as_usize()]
    }

    /// Fetches a page into the buffer pool, pins it and returns its frame ID.
    fn fetch_page(&mut self, page_id: PageId) -> Result<FrameId> {
        // Check if page is already in the buffer pool
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.frames[frame_id.as_usize()].pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(frame_id);
        }

        if page_id.as_u32() >= self.disk_manager.num_pages() {
            return Err(StoreError::PageNotFound(page_id));
        }

        // Need to fetch from disk - get a free frame first
        let frame_id = self.get_free_frame()?;
        let frame = &mut self.frames[frame_id.as_usize()];

        if let Err(e) = self.disk_manager.read_page(page_id, frame.data_mut()) {
            frame.reset();
            self.free_list.push_front(frame_id);
            return Err(e);
        }
        self.num_read_io += 1;

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        self.page_table.insert(page_id, frame_id);

        self.replacer.record_load(frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        debug!(
            page = page_id.as_u32(),
            frame = frame_id.as_u32(),
            "buffer miss, page loaded"
        );
        Ok(frame_id)
    }

    /// Gets a free frame, either from the free list or by evicting a page.
    fn get_free_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.victim().ok_or(StoreError::BufferPoolFull)?;
        let frame = &self.frames[frame_id.as_usize()];
        let Some(old_page_id) = frame.page_id() else {
            self.replacer.remove(frame_id);
            return Ok(frame_id);
        };
        let was_dirty = frame.is_dirty();

        if was_dirty {
            if let Err(e) = self.write_frame(frame_id) {
                // The victim keeps its page, its dirty bytes and its replacer history
                warn!(
                    page = old_page_id.as_u32(),
                    error = %e,
                    "write-back of eviction victim failed"
                );
                return Err(e);
            }
        }

        self.replacer.remove(frame_id);
        self.page_table.remove(&old_page_id);
        self.frames[frame_id.as_usize()].reset();

        debug!(
            page = old_page_id.as_u32(),
            frame = frame_id.as_u32(),
            dirty = was_dirty,
            "evicted page"
        );
        Ok(frame_id)
    }

    /// Writes a frame's page to disk and clears its dirty flag.
    fn write_frame(&mut self, frame_id: FrameId) -> Result<()> {
        let frame = &mut self.frames[frame_id.as_usize()];
        let Some(page_id) = frame.page_id() else {
            return Ok(());
        };

        self.disk_manager.write_page(page_id, frame.data())?;
        frame.set_dirty(false);
        self.num_write_io += 1;

        debug!(page = page_id.as_u32(), "flushed page");
        Ok(())
    }

    fn resident_frame_mut(&mut self, handle: PageHandle) -> Result<&mut FrameHeader> {
        self.frames
            .get_mut(handle.frame_id.as_usize())
            .filter(|f| f.page_id() == Some(handle.page_id))
            .ok_or(StoreError::PageNotPinned(handle.page_id))
    }

    fn pinned_frame(&self, handle: PageHandle) -> Result<&FrameHeader> {
        self.frames
            .get(handle.frame_id.as_usize())
            .filter(|f| f.page_id() == Some(handle.page_id) && f.pin_count() > 0)
            .ok_or(StoreError::PageNotPinned(handle.page_id))
    }

    fn pinned_frame_mut(&mut self, handle: PageHandle) -> Result<&mut FrameHeader> {
        self.frames
            .get_mut(handle.frame_id.as_usize())
            .filter(|f| f.page_id() == Some(handle.page_id) && f.pin_count() > 0)
            .ok_or(StoreError::PageNotPinned(handle.page_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_bpm(pool_size: usize, num_pages: u32) -> (BufferPoolManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.tbl");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        dm.ensure_capacity(num_pages).unwrap();
        let bpm = BufferPoolManager::new(dm, pool_size, ReplacementPolicy::Lru).unwrap();
        (bpm, dir)
    }

    #[test]
    fn test_buffer_pool_manager_new() {
        let (bpm, _dir) = create_bpm(10, 1);
        assert_eq!(bpm.pool_size(), 10);
        assert_eq!(bpm.free_frame_count(), 10);
        assert_eq!(bpm.policy(), ReplacementPolicy::Lru);
        assert_eq!(bpm.frame_contents(), vec![None; 10]);
    }

    #[test]
    fn test_zero_frames_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.tbl");
        DiskManager::create(&path).unwrap();
        let dm = DiskManager::open(&path).unwrap();
        assert!(matches!(
            BufferPoolManager::new(dm, 0, ReplacementPolicy::Fifo),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pin_hit_does_no_io() {
        let (mut bpm, _dir) = create_bpm(4, 3);

        let h1 = bpm.pin(PageId::new(2)).unwrap();
        assert_eq!(bpm.num_read_io(), 1);
        let h2 = bpm.pin(PageId::new(2)).unwrap();
        assert_eq!(bpm.num_read_io(), 1);
        assert_eq!(h1, h2);
        assert_eq!(bpm.pin_count(PageId::new(2)), Some(2));

        bpm.unpin(h1).unwrap();
        bpm.unpin(h2).unwrap();
        assert_eq!(bpm.pin_count(PageId::new(2)), Some(0));
        assert!(matches!(bpm.unpin(h1), Err(StoreError::PageNotPinned(_))));
    }

    #[test]
    fn test_pin_beyond_eof() {
        let (mut bpm, _dir) = create_bpm(4, 2);
        assert!(matches!(
            bpm.pin(PageId::new(2)),
            Err(StoreError::PageNotFound(_))
        ));
        assert_eq!(bpm.free_frame_count(), 4);
    }

    #[test]
    fn test_dirty_page_written_on_eviction() {
        let (mut bpm, _dir) = create_bpm(1, 3);

        let h = bpm.pin(PageId::new(1)).unwrap();
        bpm.page_data_mut(h).unwrap()[0] = 42;
        bpm.mark_dirty(h).unwrap();
        assert_eq!(bpm.dirty_flags(), vec![true]);
        bpm.unpin(h).unwrap();

        // Loading page 2 evicts page 1 and writes it back
        let h = bpm.pin(PageId::new(2)).unwrap();
        assert_eq!(bpm.num_write_io(), 1);
        assert!(!bpm.is_resident(PageId::new(1)));
        bpm.unpin(h).unwrap();

        let h = bpm.pin(PageId::new(1)).unwrap();
        assert_eq!(bpm.page_data(h).unwrap()[0], 42);
        assert_eq!(bpm.dirty_flags(), vec![false]);
        bpm.unpin(h).unwrap();
    }

    #[test]
    fn test_failed_write_back_keeps_fifo_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.tbl");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        dm.ensure_capacity(4).unwrap();
        let mut bpm = BufferPoolManager::new(dm, 2, ReplacementPolicy::Fifo).unwrap();

        let h3 = bpm.pin(PageId::new(3)).unwrap();
        bpm.page_data_mut(h3).unwrap()[0] = 7;
        bpm.mark_dirty(h3).unwrap();
        bpm.unpin(h3).unwrap();
        let h2 = bpm.pin(PageId::new(2)).unwrap();
        bpm.unpin(h2).unwrap();

        // A two-page file still holds page 1 but cannot take page 3's write-back
        let short_path = dir.path().join("short.tbl");
        DiskManager::create(&short_path).unwrap();
        let mut short = DiskManager::open(&short_path).unwrap();
        short.ensure_capacity(2).unwrap();
        let full = std::mem::replace(&mut bpm.disk_manager, short);

        assert!(matches!(
            bpm.pin(PageId::new(1)),
            Err(StoreError::PageNotFound(p)) if p == PageId::new(3)
        ));
        assert!(bpm.is_resident(PageId::new(3)));
        assert_eq!(bpm.is_dirty(PageId::new(3)), Some(true));
        assert_eq!(bpm.evictable_count(), 2);

        // Page 3 is still the earliest load and goes first once writes succeed
        bpm.disk_manager = full;
        let h1 = bpm.pin(PageId::new(1)).unwrap();
        assert_eq!(
            bpm.frame_contents(),
            vec![Some(PageId::new(1)), Some(PageId::new(2))]
        );
        bpm.unpin(h1).unwrap();

        let h3 = bpm.pin(PageId::new(3)).unwrap();
        assert_eq!(bpm.page_data(h3).unwrap()[0], 7);
        bpm.unpin(h3).unwrap();
    }

    #[test]
    fn test_force_clears_dirty_flag() {
        let (mut bpm, _dir) = create_bpm(2, 2);

        let h = bpm.pin(PageId::new(1)).unwrap();
        bpm.force(h).unwrap();
        assert_eq!(bpm.num_write_io(), 1);

        bpm.mark_dirty(h).unwrap();
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(true));
        bpm.force(h).unwrap();
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(false));
        assert_eq!(bpm.num_write_io(), 2);
        bpm.unpin(h).unwrap();

        assert!(bpm.force_page(PageId::new(1)).unwrap());
        assert!(!bpm.force_page(PageId::new(0)).unwrap());
    }

    #[test]
    fn test_stale_handle_rejected() {
        let (mut bpm, _dir) = create_bpm(1, 3);

        let h = bpm.pin(PageId::new(1)).unwrap();
        bpm.unpin(h).unwrap();
        let other = bpm.pin(PageId::new(2)).unwrap();

        assert!(bpm.page_data(h).is_err());
        assert!(bpm.mark_dirty(h).is_err());
        bpm.unpin(other).unwrap();
    }

    #[test]
    fn test_guards_unpin_on_drop() {
        let (mut bpm, _dir) = create_bpm(2, 2);

        {
            let mut guard = bpm.checked_write_page(PageId::new(1)).unwrap();
            guard.data_mut()[7] = 9;
        }
        assert_eq!(bpm.pin_count(PageId::new(1)), Some(0));
        assert_eq!(bpm.is_dirty(PageId::new(1)), Some(true));

        {
            let guard = bpm.checked_read_page(PageId::new(1)).unwrap();
            assert_eq!(guard.data()[7], 9);
        }
        assert_eq!(bpm.fix_counts(), vec![0, 0]);
    }

    #[test]
    fn test_shutdown_with_pinned_page() {
        let (mut bpm, _dir) = create_bpm(2, 2);
        let _h = bpm.pin(PageId::new(1)).unwrap();
        assert!(matches!(
            bpm.shutdown(),
            Err(StoreError::PageStillPinned(_))
        ));
    }
}
