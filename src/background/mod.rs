//! Static-scene background estimation.
//!
//! Learns the typical range at each angle with a per-bin exponential moving
//! average, then labels returns significantly closer than the learned range
//! as foreground.
//!
//! # Algorithm
//!
//! The full circle is partitioned into `angle_bins` equal arcs. Each bin
//! remembers one learned range. The EMA update is asymmetric: a return at or
//! beyond `learned - foreground_threshold_mm` relaxes the estimate toward the
//! new range, while a closer return is presumed to be a moving body and
//! leaves the estimate untouched. A person lingering at one angle therefore
//! cannot pull the learned wall inward.
//!
//! # Example
//!
//! ```
//! use drishti_track::background::{BackgroundConfig, BackgroundModel, SampleLabel};
//! use drishti_track::core::PolarSample;
//!
//! let mut model = BackgroundModel::new(BackgroundConfig {
//!     min_learning_frames: 2,
//!     ..Default::default()
//! });
//!
//! let wall = vec![PolarSample::new(90.0, 4000.0)];
//! model.update(&wall);
//! model.update(&wall);
//! assert!(model.is_ready());
//!
//! let person = PolarSample::new(90.0, 2000.0);
//! assert_eq!(model.classify(&person), SampleLabel::Foreground);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::PolarSample;

/// Configuration for the background model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Number of angular bins partitioning [0°, 360°).
    /// Default: 720 (0.5° per bin)
    pub angle_bins: usize,

    /// EMA coefficient; convergence takes roughly 1/rate frames.
    /// Default: 0.02
    pub learning_rate: f32,

    /// A return must be at least this much closer than the learned range
    /// to be labeled foreground (mm).
    /// Default: 150.0
    pub foreground_threshold_mm: f32,

    /// Frames to observe before the model reports ready.
    /// Default: 30
    pub min_learning_frames: u32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            angle_bins: 720,
            learning_rate: 0.02,
            foreground_threshold_mm: 150.0,
            min_learning_frames: 30,
        }
    }
}

/// Classification of a single polar return against the learned background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleLabel {
    /// Consistent with the learned static scene.
    Background,
    /// Significantly closer than the learned range: a moving object.
    Foreground,
    /// The bin has never received a sample; nothing to compare against.
    Unknown,
}

/// Learned state for one angular bin.
#[derive(Debug, Clone, Copy)]
struct Bin {
    /// Learned static range (mm). Meaningless until `sample_count > 0`.
    learned_range_mm: f32,
    /// Total samples ever observed in this bin.
    sample_count: u64,
}

impl Default for Bin {
    fn default() -> Self {
        Self {
            learned_range_mm: f32::NAN,
            sample_count: 0,
        }
    }
}

impl Bin {
    #[inline]
    fn is_learned(&self) -> bool {
        self.sample_count > 0
    }
}

/// Per-angular-bin background estimator.
///
/// Owns the learned scene; feed every normalized scan through [`update`]
/// and gate tracking on [`is_ready`].
///
/// [`update`]: BackgroundModel::update
/// [`is_ready`]: BackgroundModel::is_ready
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    config: BackgroundConfig,
    bins: Vec<Bin>,
    bin_width_deg: f32,
    frame_count: u64,
}

impl BackgroundModel {
    /// Create an unlearned model.
    pub fn new(config: BackgroundConfig) -> Self {
        let bins = vec![Bin::default(); config.angle_bins.max(1)];
        let bin_width_deg = 360.0 / bins.len() as f32;
        Self {
            config,
            bins,
            bin_width_deg,
            frame_count: 0,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    /// Feed one scan of normalized samples into the model.
    ///
    /// Samples sharing a bin apply in input order. Counts as one completed
    /// frame regardless of how many samples the scan carries.
    pub fn update(&mut self, samples: &[PolarSample]) {
        for sample in samples {
            let idx = Self::bin_index(sample.angle_deg, self.bin_width_deg, self.bins.len());
            let bin = &mut self.bins[idx];

            if !bin.is_learned() {
                bin.learned_range_mm = sample.range_mm;
            } else if sample.range_mm
                >= bin.learned_range_mm - self.config.foreground_threshold_mm
            {
                // Asymmetric EMA: closer returns are likely a moving body
                // and must not pull the background inward.
                bin.learned_range_mm += self.config.learning_rate
                    * (sample.range_mm - bin.learned_range_mm);
            }
            bin.sample_count += 1;
        }
        self.frame_count += 1;

        if self.frame_count == u64::from(self.config.min_learning_frames) {
            log::info!(
                "background model ready after {} frames ({} of {} bins learned)",
                self.frame_count,
                self.learned_bin_count(),
                self.bins.len()
            );
        }
    }

    /// Label a single normalized sample against the learned scene.
    ///
    /// Pure with respect to model state; the caller decides whether the
    /// model is trustworthy yet (see [`is_ready`](Self::is_ready)).
    pub fn classify(&self, sample: &PolarSample) -> SampleLabel {
        let bin =
            &self.bins[Self::bin_index(sample.angle_deg, self.bin_width_deg, self.bins.len())];
        if !bin.is_learned() {
            return SampleLabel::Unknown;
        }
        if bin.learned_range_mm - sample.range_mm >= self.config.foreground_threshold_mm {
            SampleLabel::Foreground
        } else {
            SampleLabel::Background
        }
    }

    /// True once enough frames have been observed to trust the model.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.frame_count >= u64::from(self.config.min_learning_frames)
    }

    /// Number of completed frames since construction or the last reset.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Learned range for the bin covering `angle_deg`, if any.
    pub fn learned_range_at(&self, angle_deg: f32) -> Option<f32> {
        let bin = &self.bins[Self::bin_index(angle_deg, self.bin_width_deg, self.bins.len())];
        bin.is_learned().then_some(bin.learned_range_mm)
    }

    /// Forget everything (call when the room layout changes).
    pub fn reset(&mut self) {
        for bin in &mut self.bins {
            *bin = Bin::default();
        }
        self.frame_count = 0;
    }

    /// Snapshot of learning progress.
    pub fn stats(&self) -> BackgroundStats {
        BackgroundStats {
            total_bins: self.bins.len(),
            learned_bins: self.learned_bin_count(),
            frame_count: self.frame_count,
            ready: self.is_ready(),
        }
    }

    fn learned_bin_count(&self) -> usize {
        self.bins.iter().filter(|b| b.is_learned()).count()
    }

    /// Map a normalized angle to its bin: floor(angle · B / 360) mod B.
    #[inline]
    fn bin_index(angle_deg: f32, bin_width_deg: f32, num_bins: usize) -> usize {
        (angle_deg / bin_width_deg) as usize % num_bins
    }
}

/// Snapshot of background model learning progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundStats {
    /// Total number of angular bins.
    pub total_bins: usize,
    /// Bins that have received at least one sample.
    pub learned_bins: usize,
    /// Completed frames since construction or reset.
    pub frame_count: u64,
    /// Whether the readiness gate is open.
    pub ready: bool,
}
