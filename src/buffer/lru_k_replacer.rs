use std::collections::{HashMap, VecDeque};

use crate::common::{FrameId, Timestamp};

use super::Replacer;

/// Tracks access history for a single frame
#[derive(Debug)]
struct FrameAccessInfo {
    /// History of access timestamps (most recent at back)
    history: VecDeque<Timestamp>,
    /// Whether this frame is currently evictable
    is_evictable: bool,
}

impl FrameAccessInfo {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    /// Records an access, keeping only the last k timestamps
    fn record_access(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Returns the backward k-distance, or None (+inf) with fewer than k accesses
    fn k_distance(&self, current_timestamp: Timestamp, k: usize) -> Option<Timestamp> {
        if self.history.len() < k {
            None
        } else {
            Some(current_timestamp - self.history[self.history.len() - k])
        }
    }

    fn earliest_timestamp(&self) -> Option<Timestamp> {
        self.history.front().copied()
    }
}

/// LRU-K Replacement Policy
///
/// The LRU-K algorithm evicts a frame whose backward k-distance is the maximum
/// of all frames in the replacer. Backward k-distance is computed as the difference
/// in time between the current timestamp and the timestamp of kth previous access.
///
/// A frame with fewer than k historical accesses is given +inf as its backward k-distance.
/// If multiple frames have +inf backward k-distance, the replacer evicts the frame
/// with the earliest overall timestamp.
pub struct LruKReplacer {
    k: usize,
    max_frames: usize,
    current_timestamp: Timestamp,
    frame_info: HashMap<FrameId, FrameAccessInfo>,
    num_evictable: usize,
}

impl LruKReplacer {
    /// Creates a new LRU-K replacer with the given k value and maximum frame count.
    pub fn new(k: usize, max_frames: usize) -> Self {
        Self {
            k,
            max_frames,
            current_timestamp: 0,
            frame_info: HashMap::new(),
            num_evictable: 0,
        }
    }

    /// Returns the k value of this replacer.
    pub fn k(&self) -> usize {
        self.k
    }
}

impl Replacer for LruKReplacer {
    fn record_load(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
    }

    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id.as_usize() >= self.max_frames {
            return;
        }

        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;

        self.frame_info
            .entry(frame_id)
            .or_insert_with(FrameAccessInfo::new)
            .record_access(timestamp, self.k);
    }

    fn set_evictable(&mut self, frame_id: FrameId, is_evictable: bool) {
        if frame_id.as_usize() >= self.max_frames {
            return;
        }

        if let Some(info) = self.frame_info.get_mut(&frame_id) {
            if info.is_evictable != is_evictable {
                if is_evictable {
                    self.num_evictable += 1;
                } else {
                    self.num_evictable -= 1;
                }
                info.is_evictable = is_evictable;
            }
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        if self.num_evictable == 0 {
            return None;
        }

        let current_ts = self.current_timestamp;

        let mut victim: Option<FrameId> = None;
        let mut victim_k_dist: Option<Timestamp> = None;
        let mut victim_earliest_ts: Option<Timestamp> = None;

        for (frame_id, info) in self.frame_info.iter() {
            if !info.is_evictable {
                continue;
            }

            let k_dist = info.k_distance(current_ts, self.k);
            let earliest_ts = info.earliest_timestamp();

            let should_replace = match (victim_k_dist, k_dist) {
                // Current victim has +inf, candidate has finite
                (None, Some(_)) => false,
                // Current victim has finite, candidate has +inf
                (Some(_), None) => true,
                // Both +inf: earliest first access loses
                (None, None) => match (victim_earliest_ts, earliest_ts) {
                    (Some(v_ts), Some(c_ts)) => c_ts < v_ts,
                    (None, Some(_)) => true,
                    _ => false,
                },
                (Some(v_dist), Some(c_dist)) => c_dist > v_dist,
            };

            if victim.is_none() || should_replace {
                victim = Some(*frame_id);
                victim_k_dist = k_dist;
                victim_earliest_ts = earliest_ts;
            }
        }

        victim
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(info) = self.frame_info.remove(&frame_id) {
            if info.is_evictable {
                self.num_evictable -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}
