//! Supervisor tuning knobs.

/// Default number of work units advanced per chunk.
pub const DEFAULT_CHUNK_SIZE: u64 = 1_000;

/// Default number of work units between durable checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 10_000;

/// Per-run execution parameters shared by every supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Work units per chunk. Control signals are only observed between
    /// chunks, so this bounds pause and stop latency. Must be nonzero.
    pub chunk_size: u64,
    /// Work units between checkpoint requests. Zero disables periodic
    /// checkpointing.
    pub checkpoint_interval: u64,
}

impl SupervisorConfig {
    pub fn new(chunk_size: u64, checkpoint_interval: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be greater than zero");
        Self {
            chunk_size,
            checkpoint_interval,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
    }

    #[test]
    fn test_new_accepts_zero_checkpoint_interval() {
        let config = SupervisorConfig::new(500, 0);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.checkpoint_interval, 0);
    }

    #[test]
    #[should_panic(expected = "chunk size must be greater than zero")]
    fn test_new_rejects_zero_chunk_size() {
        let _ = SupervisorConfig::new(0, 100);
    }
}
