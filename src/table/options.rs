use crate::buffer::ReplacementPolicy;
use crate::common::DEFAULT_BUFFER_POOL_SIZE;

/// Settings for the buffer pool a table is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Number of frames in the table's buffer pool
    pub pool_size: usize,
    /// Eviction policy of the table's buffer pool
    pub policy: ReplacementPolicy,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_BUFFER_POOL_SIZE,
            policy: ReplacementPolicy::Lru,
        }
    }
}

impl TableOptions {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let opts = TableOptions::default();
        assert_eq!(opts.pool_size, 100);
        assert_eq!(opts.policy, ReplacementPolicy::Lru);

        let opts = opts.with_pool_size(3).with_policy(ReplacementPolicy::Clock);
        assert_eq!(opts.pool_size, 3);
        assert_eq!(opts.policy, ReplacementPolicy::Clock);
    }
}
