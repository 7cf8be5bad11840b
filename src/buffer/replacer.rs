use crate::common::{FrameId, Result, StoreError, DEFAULT_LRUK_K};

use super::{ClockReplacer, FifoReplacer, LfuReplacer, LruKReplacer, LruReplacer};

/// Eviction policy of a buffer pool, fixed when the pool is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    /// Evict the frame whose page was loaded earliest
    Fifo,
    /// Evict the frame whose last access or unpin is oldest
    #[default]
    Lru,
    /// Second-chance sweep over reference bits
    Clock,
    /// Evict the frame with the fewest accesses, lowest frame index on ties
    Lfu,
    /// Evict the frame with the largest backward k-distance
    LruK(usize),
}

impl ReplacementPolicy {
    /// LRU-K with the default `k`.
    pub fn lru_k() -> Self {
        ReplacementPolicy::LruK(DEFAULT_LRUK_K)
    }
}

/// Bookkeeping interface between the buffer pool and an eviction policy.
///
/// The pool reports every page load and every pin as an access, and flips a
/// frame's evictable flag when its pin count moves between 0 and 1. `victim`
/// only ever returns a frame currently marked evictable and keeps tracking it
/// until the pool calls `remove`, so a victim whose write-back fails keeps its
/// place in the policy's order.
pub trait Replacer: Send {
    /// A page was just read into `frame_id`. Previous history of the frame is dropped.
    fn record_load(&mut self, frame_id: FrameId);

    /// The page in `frame_id` was pinned.
    fn record_access(&mut self, frame_id: FrameId);

    /// Marks whether `frame_id` may be chosen as a victim.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Picks a victim among the evictable frames without forgetting it.
    fn victim(&mut self) -> Option<FrameId>;

    /// Picks a victim among the evictable frames and stops tracking it.
    fn evict(&mut self) -> Option<FrameId> {
        let frame_id = self.victim()?;
        self.remove(frame_id);
        Some(frame_id)
    }

    /// Stops tracking `frame_id`.
    fn remove(&mut self, frame_id: FrameId);

    /// Returns the number of evictable frames.
    fn size(&self) -> usize;
}

/// Builds the replacer for a policy over `num_frames` frames.
pub fn create_replacer(policy: ReplacementPolicy, num_frames: usize) -> Result<Box<dyn Replacer>> {
    let replacer: Box<dyn Replacer> = match policy {
        ReplacementPolicy::Fifo => Box::new(FifoReplacer::new(num_frames)),
        ReplacementPolicy::Lru => Box::new(LruReplacer::new(num_frames)),
        ReplacementPolicy::Clock => Box::new(ClockReplacer::new(num_frames)),
        ReplacementPolicy::Lfu => Box::new(LfuReplacer::new(num_frames)),
        ReplacementPolicy::LruK(0) => {
            return Err(StoreError::invalid("LRU-K needs k >= 1"));
        }
        ReplacementPolicy::LruK(k) => Box::new(LruKReplacer::new(k, num_frames)),
    };
    Ok(replacer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(replacer: &mut dyn Replacer, frames: &[u32]) {
        for &f in frames {
            replacer.record_load(FrameId::new(f));
            replacer.record_access(FrameId::new(f));
            replacer.set_evictable(FrameId::new(f), true);
        }
    }

    #[test]
    fn test_every_policy_skips_pinned_frames() {
        for policy in [
            ReplacementPolicy::Fifo,
            ReplacementPolicy::Lru,
            ReplacementPolicy::Clock,
            ReplacementPolicy::Lfu,
            ReplacementPolicy::lru_k(),
        ] {
            let mut replacer = create_replacer(policy, 4).unwrap();
            fill(replacer.as_mut(), &[0, 1, 2, 3]);
            replacer.set_evictable(FrameId::new(0), false);
            replacer.set_evictable(FrameId::new(2), false);
            assert_eq!(replacer.size(), 2, "{:?}", policy);

            let mut victims = vec![
                replacer.evict().unwrap(),
                replacer.evict().unwrap(),
            ];
            victims.sort();
            assert_eq!(victims, vec![FrameId::new(1), FrameId::new(3)], "{:?}", policy);
            assert_eq!(replacer.evict(), None, "{:?}", policy);
        }
    }

    #[test]
    fn test_victim_keeps_tracking_frame() {
        for policy in [
            ReplacementPolicy::Fifo,
            ReplacementPolicy::Lru,
            ReplacementPolicy::Clock,
            ReplacementPolicy::Lfu,
            ReplacementPolicy::lru_k(),
        ] {
            let mut replacer = create_replacer(policy, 3).unwrap();
            fill(replacer.as_mut(), &[0, 1, 2]);

            let first = replacer.victim().unwrap();
            assert_eq!(replacer.size(), 3, "{:?}", policy);
            assert_eq!(replacer.victim(), Some(first), "{:?}", policy);
            assert_eq!(replacer.evict(), Some(first), "{:?}", policy);
            assert_eq!(replacer.size(), 2, "{:?}", policy);
            assert_ne!(replacer.victim(), Some(first), "{:?}", policy);
        }
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(create_replacer(ReplacementPolicy::LruK(0), 4).is_err());
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(ReplacementPolicy::default(), ReplacementPolicy::Lru);
        assert_eq!(ReplacementPolicy::lru_k(), ReplacementPolicy::LruK(DEFAULT_LRUK_K));
    }
}
