use crate::common::FrameId;

use super::Replacer;

#[derive(Debug, Clone, Copy, Default)]
struct ClockSlot {
    tracked: bool,
    is_evictable: bool,
    referenced: bool,
}

/// CLOCK (second chance) replacement.
///
/// A hand sweeps the frames in index order. An evictable frame with its
/// reference bit set loses the bit and is skipped; the first evictable frame
/// found with a clear bit is the victim. The hand rests on the victim until
/// it is removed, then moves past it.
pub struct ClockReplacer {
    slots: Vec<ClockSlot>,
    hand: usize,
    num_evictable: usize,
}

impl ClockReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            slots: vec![ClockSlot::default(); num_frames],
            hand: 0,
            num_evictable: 0,
        }
    }

    /// Returns the frame the hand points at.
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand as u32)
    }
}

impl Replacer for ClockReplacer {
    fn record_load(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
        if let Some(slot) = self.slots.get_mut(frame_id.as_usize()) {
            slot.tracked = true;
        }
    }

    fn record_access(&mut self, frame_id: FrameId) {
        if let Some(slot) = self.slots.get_mut(frame_id.as_usize()) {
            slot.tracked = true;
            slot.referenced = true;
        }
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(slot) = self.slots.get_mut(frame_id.as_usize()) else {
            return;
        };
        if !slot.tracked || slot.is_evictable == evictable {
            return;
        }
        slot.is_evictable = evictable;
        if evictable {
            self.num_evictable += 1;
        } else {
            self.num_evictable -= 1;
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        if self.num_evictable == 0 {
            return None;
        }

        // Two sweeps suffice: the first clears every reference bit
        let n = self.slots.len();
        for _ in 0..2 * n {
            let slot = &mut self.slots[self.hand];
            if slot.tracked && slot.is_evictable {
                if !slot.referenced {
                    return Some(FrameId::new(self.hand as u32));
                }
                slot.referenced = false;
            }
            self.hand = (self.hand + 1) % n;
        }
        None
    }

    fn remove(&mut self, frame_id: FrameId) {
        let index = frame_id.as_usize();
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let was_tracked = slot.tracked;
        if slot.is_evictable {
            self.num_evictable -= 1;
        }
        *slot = ClockSlot::default();
        if was_tracked && index == self.hand {
            self.hand = (self.hand + 1) % self.slots.len();
        }
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_all(replacer: &mut ClockReplacer, n: u32) {
        for f in 0..n {
            replacer.record_load(FrameId::new(f));
            replacer.record_access(FrameId::new(f));
            replacer.set_evictable(FrameId::new(f), true);
        }
    }

    #[test]
    fn test_clock_second_chance() {
        let mut replacer = ClockReplacer::new(3);
        load_all(&mut replacer, 3);

        // All bits set: the first sweep clears them, then frame 0 goes
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.hand(), FrameId::new(1));

        // Frame 1 is referenced again and survives the next sweep
        replacer.record_access(FrameId::new(1));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_clock_skips_pinned() {
        let mut replacer = ClockReplacer::new(3);
        load_all(&mut replacer, 3);
        replacer.set_evictable(FrameId::new(0), false);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.size(), 1);
    }
}
