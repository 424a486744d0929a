//! Store configuration.

/// Configuration for opening a hash-indexed store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of slots in the mapped region.
    ///
    /// Should be prime to reduce clustering under linear probing.
    pub max_slots: usize,

    /// Number of buffered mutations that triggers an automatic flush.
    pub flush_threshold: usize,

    /// Maximum number of probe steps before a lookup reports not-found
    /// or an insert reports store-full.
    pub probe_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_slots: 1009, // prime
            flush_threshold: 100,
            probe_limit: 100,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the slot count.
    #[must_use]
    pub const fn max_slots(mut self, value: usize) -> Self {
        self.max_slots = value;
        self
    }

    /// Sets the automatic flush threshold.
    #[must_use]
    pub const fn flush_threshold(mut self, value: usize) -> Self {
        self.flush_threshold = value;
        self
    }

    /// Sets the probe bound.
    #[must_use]
    pub const fn probe_limit(mut self, value: usize) -> Self {
        self.probe_limit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.max_slots, 1009);
        assert_eq!(config.flush_threshold, 100);
        assert_eq!(config.probe_limit, 100);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .max_slots(31)
            .flush_threshold(5)
            .probe_limit(10);

        assert_eq!(config.max_slots, 31);
        assert_eq!(config.flush_threshold, 5);
        assert_eq!(config.probe_limit, 10);
    }
}
