//! Scan-to-objects orchestration.
//!
//! [`TrackingEngine`] stitches the pipeline stages together:
//!
//! ```text
//! polar scan → normalize → BackgroundModel → foreground → Cartesian
//!            → Clusterer → ObjectTracker → TrackingFrame (+ trajectories)
//! ```
//!
//! Processing is synchronous and single-threaded; each `process_scan` call
//! runs to completion before the next, and all state is quiescent between
//! calls.
//!
//! # Example
//!
//! ```
//! use drishti_track::{TrackingConfig, TrackingEngine};
//!
//! let mut engine = TrackingEngine::new(TrackingConfig::default()).unwrap();
//!
//! // 720 wall returns at 4 meters
//! let scan: Vec<(f32, f32)> = (0..720).map(|i| (i as f32 * 0.5, 4000.0)).collect();
//! let frame = engine.process_scan(scan.clone());
//! assert!(frame.objects.is_empty()); // still learning the background
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::background::{BackgroundConfig, BackgroundModel, BackgroundStats, SampleLabel};
use crate::clustering::{ClusterConfig, Clusterer};
use crate::config::{ConfigError, TrackingConfig};
use crate::core::math::polar_to_cartesian;
use crate::core::{Point2D, PolarSample};
use crate::tracker::{ObjectTracker, TrackedObject, TrackerConfig};
use crate::trajectory::{TrajectoryPoint, TrajectoryStore};

/// Result of processing a single scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    /// Zero-based index of this scan.
    pub frame_number: u64,
    /// Confirmed objects, ascending by public id.
    pub objects: Vec<TrackedObject>,
    /// Whether the background model was ready during this frame.
    pub background_ready: bool,
    /// Caller-supplied timestamp, if any.
    pub timestamp: Option<f64>,
}

/// Main entry point: feed scans in, get identified objects out.
///
/// Owns every pipeline stage. Not internally synchronized; callers
/// serialize `process_scan` invocations.
#[derive(Debug, Clone)]
pub struct TrackingEngine {
    background: BackgroundModel,
    clusterer: Clusterer,
    tracker: ObjectTracker,
    trajectories: TrajectoryStore,
    frame_count: u64,
}

impl TrackingEngine {
    /// Create an engine after validating the configuration.
    ///
    /// Fails with a descriptive [`ConfigError`] when any parameter is out
    /// of range; no partial engine is constructed.
    pub fn new(config: TrackingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: TrackingConfig) -> Self {
        Self {
            background: BackgroundModel::new(BackgroundConfig {
                angle_bins: config.angle_bins,
                learning_rate: config.background_learning_rate,
                foreground_threshold_mm: config.foreground_threshold_mm,
                min_learning_frames: config.min_learning_frames,
            }),
            clusterer: Clusterer::new(ClusterConfig {
                eps_mm: config.cluster_eps_mm,
                min_samples: config.cluster_min_samples,
                max_cluster_radius_mm: config.max_cluster_radius_mm,
            }),
            tracker: ObjectTracker::new(TrackerConfig {
                max_match_distance_mm: config.max_match_distance_mm,
                max_missing_frames: config.max_missing_frames,
                min_confirm_frames: config.min_confirm_frames,
            }),
            trajectories: TrajectoryStore::new(config.max_trajectory_length),
            frame_count: 0,
        }
    }

    /// Process one scan and return the tracking results.
    ///
    /// Accepts anything iterable over [`PolarSample`]s or
    /// `(angle_deg, range_mm)` tuples. Angles outside [0°, 360°) wrap;
    /// samples with non-positive or non-finite range are discarded before
    /// any stage sees them.
    pub fn process_scan<I, S>(&mut self, samples: I) -> TrackingFrame
    where
        I: IntoIterator<Item = S>,
        S: Into<PolarSample>,
    {
        self.process(samples, None)
    }

    /// Like [`process_scan`](Self::process_scan), with a timestamp recorded
    /// into the trajectories of this frame's objects.
    pub fn process_scan_at<I, S>(&mut self, samples: I, timestamp: f64) -> TrackingFrame
    where
        I: IntoIterator<Item = S>,
        S: Into<PolarSample>,
    {
        self.process(samples, Some(timestamp))
    }

    fn process<I, S>(&mut self, samples: I, timestamp: Option<f64>) -> TrackingFrame
    where
        I: IntoIterator<Item = S>,
        S: Into<PolarSample>,
    {
        let polar: Vec<PolarSample> = samples
            .into_iter()
            .map(Into::into)
            .filter_map(PolarSample::normalized)
            .collect();

        self.background.update(&polar);

        // While the model learns, the frame still counts but nothing is
        // tracked.
        let objects = if self.background.is_ready() {
            let foreground: Vec<Point2D> = polar
                .iter()
                .filter(|s| self.background.classify(s) == SampleLabel::Foreground)
                .map(|s| polar_to_cartesian(s.angle_deg, s.range_mm))
                .collect();

            let clusters = self.clusterer.cluster(&foreground);
            let update = self.tracker.update(&clusters);

            for object in &update.objects {
                self.trajectories.record(
                    object.object_id,
                    TrajectoryPoint {
                        x: object.centroid.x,
                        y: object.centroid.y,
                        frame_number: self.frame_count,
                        timestamp,
                    },
                );
            }

            log::debug!(
                "frame {}: {} samples, {} foreground, {} clusters, {} objects",
                self.frame_count,
                polar.len(),
                foreground.len(),
                clusters.len(),
                update.objects.len()
            );
            update.objects
        } else {
            Vec::new()
        };

        let frame = TrackingFrame {
            frame_number: self.frame_count,
            objects,
            background_ready: self.background.is_ready(),
            timestamp,
        };
        self.frame_count += 1;
        frame
    }

    /// True once the background model has learned the static scene.
    pub fn background_ready(&self) -> bool {
        self.background.is_ready()
    }

    /// Learning progress of the background model.
    pub fn background_stats(&self) -> BackgroundStats {
        self.background.stats()
    }

    /// Number of scans processed since construction or the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Position history for one object, in frame order. Empty if the id is
    /// unknown or its history was pruned.
    pub fn get_trajectory(&self, object_id: u64) -> Vec<TrajectoryPoint> {
        self.trajectories.get(object_id)
    }

    /// All recorded trajectories.
    pub fn get_all_trajectories(&self) -> HashMap<u64, Vec<TrajectoryPoint>> {
        self.trajectories.get_all()
    }

    /// Drop history for objects whose track has been retired, returning the
    /// removed trajectories.
    pub fn prune_inactive_trajectories(&mut self) -> HashMap<u64, Vec<TrajectoryPoint>> {
        self.trajectories
            .prune_inactive(&self.tracker.live_object_ids())
    }

    /// Clear the background model only (call when the room layout changes).
    ///
    /// Tracking output stays suppressed, and live tracks frozen, until the
    /// model is ready again.
    pub fn reset_background(&mut self) {
        log::info!("background model reset");
        self.background.reset();
    }

    /// Full reset: background, tracks, trajectories, and frame counter.
    pub fn reset(&mut self) {
        log::info!("tracking engine reset");
        let background_config = self.background.config().clone();
        let cluster_config = self.clusterer.config().clone();
        let tracker_config = self.tracker.config().clone();

        self.background = BackgroundModel::new(background_config);
        self.clusterer = Clusterer::new(cluster_config);
        self.tracker = ObjectTracker::new(tracker_config);
        self.trajectories.clear();
        self.frame_count = 0;
    }
}

impl Default for TrackingEngine {
    fn default() -> Self {
        Self::from_config(TrackingConfig::default())
    }
}
