use crate::common::{FrameId, PageId, PAGE_SIZE};

/// FrameHeader manages a single buffer frame in the buffer pool.
/// It stores metadata about the frame and the cached page bytes.
pub struct FrameHeader {
    /// The frame ID (index in the buffer pool)
    frame_id: FrameId,
    /// The page held by this frame, None while the frame is on the free list
    page_id: Option<PageId>,
    /// Number of outstanding pins on this frame
    pin_count: u32,
    /// Whether the page has been modified since it was read or last written
    is_dirty: bool,
    /// The cached page bytes
    data: Box<[u8; PAGE_SIZE]>,
}

impl FrameHeader {
    /// Creates an empty frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: None,
            pin_count: 0,
            is_dirty: false,
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page held by this frame.
    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    pub(crate) fn set_page_id(&mut self, page_id: PageId) {
        self.page_id = Some(page_id);
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Increments the pin count and returns the new value.
    pub(crate) fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub(crate) fn unpin(&mut self) -> Option<u32> {
        if self.pin_count == 0 {
            return None;
        }
        self.pin_count -= 1;
        Some(self.pin_count)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.is_dirty = dirty;
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Resets the frame to its empty state.
    pub(crate) fn reset(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
        self.data.fill(0);
    }
}
