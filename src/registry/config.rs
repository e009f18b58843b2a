//! Registry configuration

/// Default number of concurrently registered clients
pub const DEFAULT_CAPACITY: usize = 5;

/// Connection registry options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum registered connections; the oldest is evicted beyond this
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the capacity (at least 1)
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(RegistryConfig::default().capacity, 5);
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(RegistryConfig::default().capacity(0).capacity, 1);
    }
}
