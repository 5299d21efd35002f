//! Per-object position history.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// One recorded position in an object's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// X coordinate in millimeters.
    pub x: f32,
    /// Y coordinate in millimeters.
    pub y: f32,
    /// Frame in which the position was recorded.
    pub frame_number: u64,
    /// Caller-supplied timestamp, if any.
    pub timestamp: Option<f64>,
}

/// Records position history for tracked objects, keyed by public object id.
///
/// Each trajectory is a ring buffer capped at `max_length` entries
/// (0 = unbounded; the caller then owns growth).
#[derive(Debug, Clone, Default)]
pub struct TrajectoryStore {
    max_length: usize,
    trajectories: HashMap<u64, VecDeque<TrajectoryPoint>>,
}

impl TrajectoryStore {
    /// Create a store; `max_length` caps each trajectory (0 = unbounded).
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            trajectories: HashMap::new(),
        }
    }

    /// Append a position to an object's trajectory, evicting the oldest
    /// entry when the cap is reached.
    pub fn record(&mut self, object_id: u64, point: TrajectoryPoint) {
        let trajectory = self.trajectories.entry(object_id).or_default();
        if self.max_length > 0 && trajectory.len() == self.max_length {
            trajectory.pop_front();
        }
        trajectory.push_back(point);
    }

    /// Full trajectory for an object, in frame order. Empty if the id is
    /// unknown or has been pruned.
    pub fn get(&self, object_id: u64) -> Vec<TrajectoryPoint> {
        self.trajectories
            .get(&object_id)
            .map(|t| t.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All trajectories, in frame order each.
    pub fn get_all(&self) -> HashMap<u64, Vec<TrajectoryPoint>> {
        self.trajectories
            .iter()
            .map(|(&id, t)| (id, t.iter().copied().collect()))
            .collect()
    }

    /// Number of objects with recorded history.
    pub fn object_count(&self) -> usize {
        self.trajectories.len()
    }

    /// Drop trajectories whose id is not in `active_ids`, returning the
    /// removed histories.
    pub fn prune_inactive(&mut self, active_ids: &[u64]) -> HashMap<u64, Vec<TrajectoryPoint>> {
        let stale: Vec<u64> = self
            .trajectories
            .keys()
            .filter(|id| !active_ids.contains(id))
            .copied()
            .collect();

        stale
            .into_iter()
            .filter_map(|id| {
                self.trajectories
                    .remove(&id)
                    .map(|t| (id, t.into_iter().collect()))
            })
            .collect()
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.trajectories.clear();
    }
}
