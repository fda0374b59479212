//! Tunable knobs for a [`crate::WriteEngine`].

use crate::gather::VectorLimits;

const DEFAULT_SPIN_COUNT: usize = 16;
const DEFAULT_WATERMARK_LOW: usize = 32 * 1024;
const DEFAULT_WATERMARK_HIGH: usize = 64 * 1024;

/// Configuration for a [`crate::WriteEngine`].
///
/// Every field defaults to the value described in the engine's design
/// notes; most callers only need [`WriteEngineConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteEngineConfig {
    /// Maximum drain iterations per `trigger` call, bounding how long one
    /// connection can hold the event loop.
    pub write_spin_count: usize,
    /// Below this many buffered bytes, the engine reports writable again.
    pub watermark_low: usize,
    /// Above this many buffered bytes, `add` reports the engine as no
    /// longer writable.
    pub watermark_high: usize,
    /// Platform limits for a single vectored-write syscall.
    pub vector_limits: VectorLimits,
}

impl WriteEngineConfig {
    /// Builds a config, asserting the watermarks and spin count make sense.
    ///
    /// # Panics
    ///
    /// Panics if `watermark_low >= watermark_high` or `write_spin_count`
    /// is zero; either would make the engine unable to ever report
    /// progress or recover writability.
    #[must_use]
    pub fn new(write_spin_count: usize, watermark_low: usize, watermark_high: usize) -> Self {
        assert!(write_spin_count > 0, "write_spin_count must be positive");
        assert!(
            watermark_low < watermark_high,
            "watermark_low must be below watermark_high"
        );
        Self {
            write_spin_count,
            watermark_low,
            watermark_high,
            vector_limits: VectorLimits::platform_default(),
        }
    }
}

impl Default for WriteEngineConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_SPIN_COUNT,
            DEFAULT_WATERMARK_LOW,
            DEFAULT_WATERMARK_HIGH,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = WriteEngineConfig::default();
        assert_eq!(config.write_spin_count, 16);
        assert_eq!(config.watermark_low, 32 * 1024);
        assert_eq!(config.watermark_high, 64 * 1024);
    }

    #[test]
    #[should_panic(expected = "watermark_low must be below watermark_high")]
    fn rejects_inverted_watermarks() {
        let _ = WriteEngineConfig::new(16, 64 * 1024, 32 * 1024);
    }

    #[test]
    #[should_panic(expected = "write_spin_count must be positive")]
    fn rejects_zero_spin_count() {
        let _ = WriteEngineConfig::new(0, 0, 1);
    }
}
