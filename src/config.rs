//! Pipeline configuration and construction-time validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a [`TrackingConfig`] fails validation.
///
/// Validation runs once at engine construction; a failed validation leaves
/// no partial engine behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("angle_bins must be at least 1 (got {0})")]
    AngleBins(usize),

    #[error("background_learning_rate must be in (0, 1] (got {0})")]
    LearningRate(f32),

    #[error("{name} must be a finite, non-negative distance in mm (got {value})")]
    Distance { name: &'static str, value: f32 },

    #[error("cluster_eps_mm must be positive and finite (got {0})")]
    ClusterEps(f32),

    #[error("cluster_min_samples must be at least 1")]
    ClusterMinSamples,

    #[error("min_confirm_frames must be at least 1")]
    MinConfirmFrames,
}

/// Tunable parameters for the whole tracking pipeline.
///
/// All fields have working defaults for a room-scale scene scanned by a
/// 360° lidar; construct with `TrackingConfig::default()` and override
/// what you need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// EMA coefficient for background range learning. Convergence takes
    /// roughly 1/rate frames.
    /// Default: 0.02
    pub background_learning_rate: f32,

    /// How much closer than the learned background a return must be to
    /// count as foreground (mm).
    /// Default: 150.0
    pub foreground_threshold_mm: f32,

    /// Number of frames to observe before the background model is trusted.
    /// Tracking output is suppressed until then.
    /// Default: 30
    pub min_learning_frames: u32,

    /// Number of angular bins partitioning [0°, 360°).
    /// Default: 720 (0.5° per bin)
    pub angle_bins: usize,

    /// Neighborhood radius for density clustering (mm).
    /// Default: 200.0
    pub cluster_eps_mm: f32,

    /// Minimum neighbors (including the point itself) for a core point.
    /// Default: 3
    pub cluster_min_samples: usize,

    /// Clusters whose bounding radius exceeds this are discarded as
    /// not person-sized (mm).
    /// Default: 500.0
    pub max_cluster_radius_mm: f32,

    /// Maximum distance between a predicted track position and a cluster
    /// centroid for association (mm).
    /// Default: 800.0
    pub max_match_distance_mm: f32,

    /// Consecutive missed frames after which a confirmed track is retired.
    /// Default: 10
    pub max_missing_frames: u32,

    /// Consecutive sightings required before a track is confirmed and
    /// assigned a public object id.
    /// Default: 2
    pub min_confirm_frames: u32,

    /// Maximum recorded positions per object trajectory. 0 = unbounded.
    /// Default: 0
    pub max_trajectory_length: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            background_learning_rate: 0.02,
            foreground_threshold_mm: 150.0,
            min_learning_frames: 30,
            angle_bins: 720,
            cluster_eps_mm: 200.0,
            cluster_min_samples: 3,
            max_cluster_radius_mm: 500.0,
            max_match_distance_mm: 800.0,
            max_missing_frames: 10,
            min_confirm_frames: 2,
            max_trajectory_length: 0,
        }
    }
}

impl TrackingConfig {
    /// Check every parameter against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.angle_bins < 1 {
            return Err(ConfigError::AngleBins(self.angle_bins));
        }
        if !(self.background_learning_rate > 0.0 && self.background_learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate(self.background_learning_rate));
        }
        for (name, value) in [
            ("foreground_threshold_mm", self.foreground_threshold_mm),
            ("max_cluster_radius_mm", self.max_cluster_radius_mm),
            ("max_match_distance_mm", self.max_match_distance_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Distance { name, value });
            }
        }
        if !self.cluster_eps_mm.is_finite() || self.cluster_eps_mm <= 0.0 {
            return Err(ConfigError::ClusterEps(self.cluster_eps_mm));
        }
        if self.cluster_min_samples < 1 {
            return Err(ConfigError::ClusterMinSamples);
        }
        if self.min_confirm_frames < 1 {
            return Err(ConfigError::MinConfirmFrames);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrackingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_bins_rejected() {
        let config = TrackingConfig {
            angle_bins: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AngleBins(0)));
    }

    #[test]
    fn test_learning_rate_bounds() {
        for rate in [0.0, -0.1, 1.5, f32::NAN] {
            let config = TrackingConfig {
                background_learning_rate: rate,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "rate {} accepted", rate);
        }

        // 1.0 is inclusive
        let config = TrackingConfig {
            background_learning_rate: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let config = TrackingConfig {
            max_match_distance_mm: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Distance {
                name: "max_match_distance_mm",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_eps_rejected() {
        let config = TrackingConfig {
            cluster_eps_mm: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ClusterEps(0.0)));
    }

    #[test]
    fn test_min_confirm_frames_floor() {
        let config = TrackingConfig {
            min_confirm_frames: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MinConfirmFrames));
    }

    #[test]
    fn test_error_message_is_descriptive() {
        let err = ConfigError::LearningRate(2.0);
        assert!(err.to_string().contains("background_learning_rate"));
    }
}
