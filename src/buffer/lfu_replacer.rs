use crate::common::FrameId;

use super::Replacer;

#[derive(Debug, Clone, Copy)]
struct LfuEntry {
    access_count: u64,
    is_evictable: bool,
}

/// LFU replacement: evicts the evictable frame with the fewest accesses since
/// its page was loaded. Ties go to the lowest frame index.
pub struct LfuReplacer {
    entries: Vec<Option<LfuEntry>>,
    num_evictable: usize,
}

impl LfuReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            entries: vec![None; num_frames],
            num_evictable: 0,
        }
    }

    /// Returns the access count of a tracked frame.
    pub fn access_count(&self, frame_id: FrameId) -> Option<u64> {
        self.entries
            .get(frame_id.as_usize())
            .copied()
            .flatten()
            .map(|e| e.access_count)
    }
}

impl Replacer for LfuReplacer {
    fn record_load(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
    }

    fn record_access(&mut self, frame_id: FrameId) {
        if let Some(slot) = self.entries.get_mut(frame_id.as_usize()) {
            slot.get_or_insert(LfuEntry {
                access_count: 0,
                is_evictable: false,
            })
            .access_count += 1;
        }
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(Some(entry)) = self.entries.get_mut(frame_id.as_usize()) else {
            return;
        };
        if entry.is_evictable == evictable {
            return;
        }
        entry.is_evictable = evictable;
        if evictable {
            self.num_evictable += 1;
        } else {
            self.num_evictable -= 1;
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        let mut victim: Option<(usize, u64)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            if !entry.is_evictable {
                continue;
            }
            // Strictly fewer, so the lowest index wins a tie
            if victim.map_or(true, |(_, count)| entry.access_count < count) {
                victim = Some((index, entry.access_count));
            }
        }

        victim.map(|(index, _)| FrameId::new(index as u32))
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(slot) = self.entries.get_mut(frame_id.as_usize()) {
            if let Some(entry) = slot.take() {
                if entry.is_evictable {
                    self.num_evictable -= 1;
                }
            }
        }
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}
