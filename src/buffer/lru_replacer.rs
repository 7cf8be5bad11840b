use std::collections::HashMap;

use crate::common::{FrameId, Timestamp};

use super::Replacer;

#[derive(Debug)]
struct LruEntry {
    last_used: Timestamp,
    is_evictable: bool,
}

/// LRU replacement: evicts the evictable frame whose most recent access or
/// unpin is oldest.
pub struct LruReplacer {
    max_frames: usize,
    current_timestamp: Timestamp,
    entries: HashMap<FrameId, LruEntry>,
    num_evictable: usize,
}

impl LruReplacer {
    pub fn new(max_frames: usize) -> Self {
        Self {
            max_frames,
            current_timestamp: 0,
            entries: HashMap::with_capacity(max_frames),
            num_evictable: 0,
        }
    }

    fn tick(&mut self) -> Timestamp {
        let now = self.current_timestamp;
        self.current_timestamp += 1;
        now
    }
}

impl Replacer for LruReplacer {
    fn record_load(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
    }

    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id.as_usize() >= self.max_frames {
            return;
        }
        let now = self.tick();
        self.entries
            .entry(frame_id)
            .or_insert(LruEntry {
                last_used: now,
                is_evictable: false,
            })
            .last_used = now;
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let now = self.tick();
        let Some(entry) = self.entries.get_mut(&frame_id) else {
            return;
        };
        if entry.is_evictable == evictable {
            return;
        }
        entry.is_evictable = evictable;
        if evictable {
            // An unpin counts as a use
            entry.last_used = now;
            self.num_evictable += 1;
        } else {
            self.num_evictable -= 1;
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_evictable)
            .min_by_key(|(_, e)| e.last_used)
            .map(|(&frame_id, _)| frame_id)
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(entry) = self.entries.remove(&frame_id) {
            if entry.is_evictable {
                self.num_evictable -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}
