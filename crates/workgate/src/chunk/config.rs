use crate::ExecutorConfig;

/// Static configuration for a [`ChunkWorker`](crate::ChunkWorker).
///
/// | Field | Default |
/// |-------|---------|
/// | `chunk_size` | `1` |
/// | `executor.queue_size` | `1` |
/// | `executor.fan_out` | `false` |
///
/// With the `serde` feature the executor fields are flattened, so a chunk
/// configuration reads as `{"chunk_size": 3, "queue_size": 5, "fan_out": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChunkConfig {
    /// Number of elements per chunk. Must be at least 1.
    pub chunk_size: usize,
    /// Configuration of the underlying executor.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub executor: ExecutorConfig,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1,
            executor: ExecutorConfig::default(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn flattened_round_trip() {
        let config: ChunkConfig =
            serde_json::from_str(r#"{"chunk_size": 3, "queue_size": 5, "fan_out": true}"#).unwrap();
        assert_eq!(config.chunk_size, 3);
        assert_eq!(config.executor.queue_size, 5);
        assert!(config.executor.fan_out);

        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["queue_size"], 5);
        assert_eq!(serde_json::from_value::<ChunkConfig>(json).unwrap(), config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: ChunkConfig = serde_json::from_str(r#"{"chunk_size": 8}"#).unwrap();
        assert_eq!(config.executor, ExecutorConfig::default());
    }
}
