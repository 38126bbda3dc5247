//! Engine configuration.
//!
//! Embedding applications build these at startup, either in code with the
//! builder methods or by deserializing them from their own settings file:
//! - `IdConfig`: internal id allocation for one `MacroViewModel`
//! - `ViewConfig`: presentation tuning for the `SpatialViewModel`
//! - `WorldConfig`: combines the above with the simulation seed

use serde::{Deserialize, Serialize};

/// Internal id allocation for a `MacroViewModel`.
///
/// Several view models may feed the same renderers (the world map and the
/// inventory pad, for instance). Giving each a distinct `start` with a
/// shared `stride`, or a shared `start` with interleaved offsets, keeps
/// their internal ids from colliding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdConfig {
    /// First internal id handed out.
    pub start: u32,
    /// Increment between consecutive ids. Must be non-zero.
    pub stride: u32,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self { start: 1, stride: 1 }
    }
}

impl IdConfig {
    /// Create an id configuration.
    ///
    /// Panics if `stride` is zero.
    #[must_use]
    pub fn new(start: u32, stride: u32) -> Self {
        assert!(stride > 0, "Id stride must be non-zero");
        Self { start, stride }
    }
}

/// Presentation tuning for button pressure.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Fraction of the remaining distance to the target pressure kept per
    /// elapsed millisecond. Smaller values snap faster.
    pub pressure_decay_per_ms: f64,

    /// Distance from a released target below which pressure settles to
    /// exactly zero and stops being animated.
    pub settle_epsilon: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            pressure_decay_per_ms: 0.985,
            settle_epsilon: 0.001,
        }
    }
}

impl ViewConfig {
    /// Set the per-millisecond decay factor.
    #[must_use]
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.pressure_decay_per_ms = decay;
        self
    }

    /// Set the settle threshold.
    #[must_use]
    pub fn with_settle_epsilon(mut self, epsilon: f64) -> Self {
        self.settle_epsilon = epsilon;
        self
    }
}

/// Configuration for a `WorldModel`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Seed for NPC wandering and auction tie-breaks.
    /// Same seed and same intents produce the same turn.
    pub seed: u64,

    /// First world entity id.
    pub first_entity: u32,

    /// Internal id allocation for the world's view model.
    pub ids: IdConfig,

    /// Presentation tuning.
    pub view: ViewConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            first_entity: 1,
            ids: IdConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the first world entity id.
    #[must_use]
    pub fn with_first_entity(mut self, first: u32) -> Self {
        self.first_entity = first;
        self
    }

    /// Set internal id allocation.
    #[must_use]
    pub fn with_ids(mut self, ids: IdConfig) -> Self {
        self.ids = ids;
        self
    }

    /// Set presentation tuning.
    #[must_use]
    pub fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorldConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.ids, IdConfig { start: 1, stride: 1 });
        assert!((config.view.pressure_decay_per_ms - 0.985).abs() < 1e-9);
    }

    #[test]
    fn test_builder_pattern() {
        let config = WorldConfig::default()
            .with_seed(123)
            .with_first_entity(100)
            .with_ids(IdConfig::new(2, 2))
            .with_view(ViewConfig::default().with_decay(0.9));

        assert_eq!(config.seed, 123);
        assert_eq!(config.first_entity, 100);
        assert_eq!(config.ids.stride, 2);
        assert_eq!(config.view.pressure_decay_per_ms, 0.9);
    }

    #[test]
    #[should_panic(expected = "stride")]
    fn test_zero_stride_panics() {
        let _ = IdConfig::new(1, 0);
    }

    #[test]
    fn test_serialization() {
        let config = WorldConfig::default().with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: WorldConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
