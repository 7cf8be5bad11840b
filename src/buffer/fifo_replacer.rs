use std::collections::VecDeque;

use crate::common::FrameId;

use super::Replacer;

/// FIFO replacement: victims are chosen in page load order. Accesses after
/// the load do not change a frame's position.
pub struct FifoReplacer {
    /// Frames in load order (front = loaded earliest)
    queue: VecDeque<FrameId>,
    /// Evictable flag per frame
    evictable: Vec<bool>,
    num_evictable: usize,
}

impl FifoReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(num_frames),
            evictable: vec![false; num_frames],
            num_evictable: 0,
        }
    }
}

impl Replacer for FifoReplacer {
    fn record_load(&mut self, frame_id: FrameId) {
        if frame_id.as_usize() >= self.evictable.len() {
            return;
        }
        self.remove(frame_id);
        self.queue.push_back(frame_id);
    }

    fn record_access(&mut self, _frame_id: FrameId) {}

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(flag) = self.evictable.get_mut(frame_id.as_usize()) else {
            return;
        };
        if !self.queue.contains(&frame_id) || *flag == evictable {
            return;
        }
        *flag = evictable;
        if evictable {
            self.num_evictable += 1;
        } else {
            self.num_evictable -= 1;
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        self.queue
            .iter()
            .copied()
            .find(|f| self.evictable[f.as_usize()])
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.queue.iter().position(|&f| f == frame_id) {
            self.queue.remove(pos);
            if std::mem::take(&mut self.evictable[frame_id.as_usize()]) {
                self.num_evictable -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}
