//! Internal track record and lifecycle status.

use serde::{Deserialize, Serialize};

use crate::core::Point2D;

/// Lifecycle state of a track.
///
/// Transitions are explicit and happen only inside the tracker's per-frame
/// update:
///
/// ```text
/// spawn ──► Tentative ──(seen ≥ min_confirm)──► Confirmed ◄──┐
///               │                                  │         │ re-match
///               │ missed frame                     │ missed  │
///               ▼                                  ▼         │
///            retired                             Lost ───────┘
///                                                  │ missing > max_missing
///                                                  ▼
///                                               retired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Newly spawned; not yet trusted, never emitted.
    Tentative,
    /// Sighted often enough to carry a public object id; emitted every frame.
    Confirmed,
    /// Confirmed but currently unseen; coasting on dead-reckoning, not
    /// emitted, id preserved.
    Lost,
}

/// Mutable per-object state owned exclusively by the tracker.
#[derive(Debug, Clone)]
pub(crate) struct Track {
    /// Internal id, monotonic across the tracker's lifetime.
    pub id: u64,
    /// Public object id, assigned once on confirmation and never reused.
    pub public_id: Option<u64>,
    /// Last known (or dead-reckoned) centroid in mm.
    pub centroid: Point2D,
    /// Displacement per frame in mm.
    pub velocity: Point2D,
    /// Bounding radius of the last matched cluster (mm).
    pub bounding_radius_mm: f32,
    /// Consecutive frames this track was matched.
    pub consecutive_seen: u32,
    /// Consecutive frames this track went unmatched.
    pub consecutive_missing: u32,
    /// Lifecycle state.
    pub status: TrackStatus,
}

impl Track {
    /// Where the object should be this frame, assuming constant velocity.
    #[inline]
    pub fn predicted(&self) -> Point2D {
        self.centroid + self.velocity
    }
}
