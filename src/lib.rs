//! DrishtiTrack - Indoor person tracking from a stationary 2D LiDAR.
//!
//! Feed raw polar scans in, get persistently-identified moving objects and
//! their trajectories out. Everything runs in memory on the calling thread:
//! no device I/O, no network, no persistence.
//!
//! # Architecture
//!
//! Each scan flows through three stages:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │        (TrackingEngine, trajectory store)           │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │          background / clustering / tracker          │  ← Pipeline stages
//! │   (scene learning, DBSCAN grouping, association)    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │              (types, angular math)                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! 1. **Background**: a per-angular-bin EMA learns the static scene and
//!    labels returns significantly closer than the learned range as
//!    foreground.
//! 2. **Clustering**: foreground points, converted to Cartesian
//!    millimeters, are grouped by grid-accelerated DBSCAN; blobs wider
//!    than a person are discarded.
//! 3. **Tracking**: clusters are matched to live tracks by greedy
//!    nearest-neighbor association on velocity-predicted positions, with a
//!    tentative → confirmed → lost lifecycle and stable public ids.
//!
//! # Example
//!
//! ```
//! use drishti_track::{TrackingConfig, TrackingEngine};
//!
//! let mut engine = TrackingEngine::new(TrackingConfig {
//!     min_learning_frames: 5,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! // Learn an empty room: 720 returns from a wall 4m away
//! let room: Vec<(f32, f32)> = (0..720).map(|i| (i as f32 * 0.5, 4000.0)).collect();
//! for _ in 0..5 {
//!     engine.process_scan(room.clone());
//! }
//! assert!(engine.background_ready());
//!
//! // Someone walks in at 2m, bearing 90°
//! let mut scan = room.clone();
//! scan.extend((0..8).map(|i| (88.0 + i as f32 * 0.5, 2000.0)));
//! engine.process_scan(scan.clone());
//! let frame = engine.process_scan(scan);
//!
//! assert_eq!(frame.objects.len(), 1);
//! println!(
//!     "object {} at ({:.0}, {:.0}) mm",
//!     frame.objects[0].object_id,
//!     frame.objects[0].centroid.x,
//!     frame.objects[0].centroid.y
//! );
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Pipeline stages (depend on core)
// ============================================================================
pub mod background;
pub mod clustering;
pub mod tracker;

// ============================================================================
// Layer 3: Orchestration (depends on everything below)
// ============================================================================
pub mod config;
pub mod engine;
pub mod trajectory;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

pub use crate::core::{math, Point2D, PolarSample};

pub use background::{BackgroundConfig, BackgroundModel, BackgroundStats, SampleLabel};
pub use clustering::{Cluster, ClusterConfig, Clusterer};
pub use tracker::{ObjectTracker, TrackStatus, TrackedObject, TrackerConfig, TrackerUpdate};

pub use config::{ConfigError, TrackingConfig};
pub use engine::{TrackingEngine, TrackingFrame};
pub use trajectory::{TrajectoryPoint, TrajectoryStore};
