//! Cluster-to-track association and object lifecycle.
//!
//! Assigns persistent public ids to clusters across frames. Each frame the
//! tracker predicts every live track forward by its velocity, gates
//! (track, cluster) pairs by distance, and resolves them greedily from the
//! globally smallest distance up. Matched tracks advance toward
//! confirmation; unmatched tracks coast on dead-reckoning through a `Lost`
//! grace period before retirement.
//!
//! Greedy assignment is within a rounding error of optimal for the handful
//! of simultaneous tracks an indoor scene produces, and the dead-reckoned
//! prediction keeps ids stable when two people cross with divergent
//! velocities.

mod track;

pub use track::TrackStatus;
pub(crate) use track::Track;

use serde::{Deserialize, Serialize};

use crate::clustering::Cluster;
use crate::core::Point2D;

/// Configuration for the object tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum distance between a predicted track position and a cluster
    /// centroid for association (mm).
    /// Default: 800.0
    pub max_match_distance_mm: f32,

    /// Consecutive missed frames after which a confirmed track is retired.
    /// Default: 10
    pub max_missing_frames: u32,

    /// Consecutive sightings required before a track is confirmed.
    /// Default: 2
    pub min_confirm_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_match_distance_mm: 800.0,
            max_missing_frames: 10,
            min_confirm_frames: 2,
        }
    }
}

/// A confirmed object as emitted for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    /// Public id, stable for the object's lifetime and never reused.
    pub object_id: u64,
    /// Current centroid (mm).
    pub centroid: Point2D,
    /// Displacement since the previous frame (mm/frame).
    pub velocity: Point2D,
    /// Bounding radius of the matched cluster (mm).
    pub bounding_radius_mm: f32,
}

/// Result of one tracker update.
#[derive(Debug, Clone, Default)]
pub struct TrackerUpdate {
    /// Confirmed objects, ascending by public id.
    pub objects: Vec<TrackedObject>,
    /// Public ids retired this frame; their trajectory storage may be pruned.
    pub retired_ids: Vec<u64>,
}

/// A gated candidate pairing, resolved greedily.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    track_idx: usize,
    cluster_idx: usize,
}

/// Greedy nearest-neighbor multi-object tracker.
///
/// Owns the live track set exclusively; all mutation happens inside
/// [`update`](ObjectTracker::update).
#[derive(Debug, Clone)]
pub struct ObjectTracker {
    config: TrackerConfig,
    /// Live tracks in creation order (ascending internal id).
    tracks: Vec<Track>,
    next_track_id: u64,
    next_public_id: u64,
}

impl ObjectTracker {
    /// Create a tracker with no live tracks.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_track_id: 1,
            next_public_id: 1,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of live tracks, including tentative and lost ones.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Public ids of all live confirmed or lost tracks.
    pub fn live_object_ids(&self) -> Vec<u64> {
        self.tracks.iter().filter_map(|t| t.public_id).collect()
    }

    /// Match this frame's clusters to live tracks, advance every lifecycle,
    /// and emit the confirmed objects.
    pub fn update(&mut self, clusters: &[Cluster]) -> TrackerUpdate {
        let assignment = self.assign(clusters);
        let mut cluster_matched = vec![false; clusters.len()];
        for ci in assignment.iter().flatten() {
            cluster_matched[*ci] = true;
        }

        // Apply all per-track mutations in one pass, splitting retirees out.
        let mut retired_ids = Vec::new();
        let mut survivors = Vec::with_capacity(self.tracks.len());
        let min_confirm = self.config.min_confirm_frames;
        let mut next_public_id = self.next_public_id;

        for (ti, mut track) in self.tracks.drain(..).enumerate() {
            match assignment[ti] {
                Some(ci) => {
                    let cluster = &clusters[ci];
                    let missed = track.consecutive_missing;
                    track.velocity = cluster.centroid - track.centroid;
                    track.centroid = cluster.centroid;
                    track.bounding_radius_mm = cluster.bounding_radius_mm;
                    track.consecutive_seen += 1;
                    track.consecutive_missing = 0;

                    match track.status {
                        TrackStatus::Tentative => {
                            if track.consecutive_seen >= min_confirm {
                                track.status = TrackStatus::Confirmed;
                                track.public_id = Some(next_public_id);
                                log::debug!(
                                    "track {} confirmed as object {}",
                                    track.id,
                                    next_public_id
                                );
                                next_public_id += 1;
                            }
                        }
                        TrackStatus::Lost => {
                            track.status = TrackStatus::Confirmed;
                            log::debug!(
                                "object {} reacquired after {} missed frames",
                                track.public_id.unwrap_or(0),
                                missed
                            );
                        }
                        TrackStatus::Confirmed => {}
                    }
                    survivors.push(track);
                }
                None => {
                    // Dead-reckon so reassociation stays centered on where
                    // the object would be; compounds while lost.
                    track.centroid = track.centroid + track.velocity;
                    track.consecutive_seen = 0;
                    track.consecutive_missing += 1;

                    match track.status {
                        TrackStatus::Tentative => {
                            // Tentative tracks do not survive a missed frame.
                            log::debug!("tentative track {} dropped", track.id);
                        }
                        TrackStatus::Confirmed | TrackStatus::Lost => {
                            track.status = TrackStatus::Lost;
                            if track.consecutive_missing > self.config.max_missing_frames {
                                if let Some(public_id) = track.public_id {
                                    log::debug!(
                                        "object {} retired after {} missed frames",
                                        public_id,
                                        track.consecutive_missing
                                    );
                                    retired_ids.push(public_id);
                                }
                            } else {
                                survivors.push(track);
                            }
                        }
                    }
                }
            }
        }
        self.tracks = survivors;
        self.next_public_id = next_public_id;

        // Unmatched clusters spawn tentative tracks.
        for (ci, cluster) in clusters.iter().enumerate() {
            if !cluster_matched[ci] {
                self.spawn(cluster);
            }
        }

        TrackerUpdate {
            objects: self.emit(),
            retired_ids,
        }
    }

    /// Gate candidate pairs by distance and resolve them greedily.
    ///
    /// Returns, per live track index, the matched cluster index if any.
    /// Candidates are sorted once by (distance, internal track id, cluster
    /// index) so ties resolve deterministically, then swept with two
    /// occupancy masks.
    fn assign(&self, clusters: &[Cluster]) -> Vec<Option<usize>> {
        let mut candidates = Vec::new();
        for (track_idx, track) in self.tracks.iter().enumerate() {
            let pred = track.predicted();
            for (cluster_idx, cluster) in clusters.iter().enumerate() {
                let distance = pred.distance(&cluster.centroid);
                if distance <= self.config.max_match_distance_mm {
                    candidates.push(Candidate {
                        distance,
                        track_idx,
                        cluster_idx,
                    });
                }
            }
        }

        // tracks is in ascending internal-id order, so track_idx order and
        // internal-id order coincide.
        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.track_idx.cmp(&b.track_idx))
                .then_with(|| a.cluster_idx.cmp(&b.cluster_idx))
        });

        let mut assignment = vec![None; self.tracks.len()];
        let mut cluster_taken = vec![false; clusters.len()];
        for c in candidates {
            if assignment[c.track_idx].is_none() && !cluster_taken[c.cluster_idx] {
                assignment[c.track_idx] = Some(c.cluster_idx);
                cluster_taken[c.cluster_idx] = true;
            }
        }
        assignment
    }

    /// Open a tentative track on an unmatched cluster.
    fn spawn(&mut self, cluster: &Cluster) {
        let mut track = Track {
            id: self.next_track_id,
            public_id: None,
            centroid: cluster.centroid,
            velocity: Point2D::ZERO,
            bounding_radius_mm: cluster.bounding_radius_mm,
            consecutive_seen: 1,
            consecutive_missing: 0,
            status: TrackStatus::Tentative,
        };
        self.next_track_id += 1;
        log::debug!(
            "spawned tentative track {} at ({:.0}, {:.0})",
            track.id,
            track.centroid.x,
            track.centroid.y
        );

        // With min_confirm_frames = 1 the first sighting already confirms.
        if track.consecutive_seen >= self.config.min_confirm_frames {
            track.status = TrackStatus::Confirmed;
            track.public_id = Some(self.next_public_id);
            log::debug!(
                "track {} confirmed as object {}",
                track.id,
                self.next_public_id
            );
            self.next_public_id += 1;
        }
        self.tracks.push(track);
    }

    /// Confirmed tracks only, ascending by public id.
    fn emit(&self) -> Vec<TrackedObject> {
        let mut objects: Vec<TrackedObject> = self
            .tracks
            .iter()
            .filter(|t| t.status == TrackStatus::Confirmed)
            .filter_map(|t| {
                t.public_id.map(|object_id| TrackedObject {
                    object_id,
                    centroid: t.centroid,
                    velocity: t.velocity,
                    bounding_radius_mm: t.bounding_radius_mm,
                })
            })
            .collect();
        objects.sort_by_key(|o| o.object_id);
        objects
    }
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cluster(x: f32, y: f32) -> Cluster {
        let points = (0..5)
            .map(|i| Point2D::new(x + i as f32, y + i as f32))
            .collect();
        Cluster {
            centroid: Point2D::new(x, y),
            points,
            bounding_radius_mm: 100.0,
        }
    }

    fn tracker(min_confirm_frames: u32) -> ObjectTracker {
        ObjectTracker::new(TrackerConfig {
            min_confirm_frames,
            ..Default::default()
        })
    }

    #[test]
    fn test_no_clusters_no_objects() {
        let mut tracker = ObjectTracker::default();
        let update = tracker.update(&[]);
        assert!(update.objects.is_empty());
        assert!(update.retired_ids.is_empty());
    }

    #[test]
    fn test_new_track_not_emitted_immediately() {
        let mut tracker = tracker(2);
        let update = tracker.update(&[make_cluster(1000.0, 1000.0)]);
        assert!(update.objects.is_empty());
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn test_confirmed_after_min_frames() {
        let mut tracker = tracker(2);
        tracker.update(&[make_cluster(1000.0, 1000.0)]);
        let update = tracker.update(&[make_cluster(1000.0, 1000.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
    }

    #[test]
    fn test_min_confirm_one_emits_first_sighting() {
        let mut tracker = tracker(1);
        let update = tracker.update(&[make_cluster(500.0, 0.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
        assert_eq!(update.objects[0].velocity, Point2D::ZERO);
    }

    #[test]
    fn test_persistent_id_across_frames() {
        let mut tracker = tracker(1);
        let first = tracker.update(&[make_cluster(1000.0, 1000.0)]);
        let id = first.objects[0].object_id;

        let second = tracker.update(&[make_cluster(1050.0, 1050.0)]);
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].object_id, id);
    }

    #[test]
    fn test_velocity_is_frame_delta() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(1000.0, 1000.0)]);
        let update = tracker.update(&[make_cluster(1100.0, 1000.0)]);
        let velocity = update.objects[0].velocity;
        assert!((velocity.x - 100.0).abs() < 0.1);
        assert!(velocity.y.abs() < 0.1);
    }

    #[test]
    fn test_two_objects_distinct_ids() {
        let mut tracker = tracker(1);
        let update = tracker.update(&[make_cluster(1000.0, 1000.0), make_cluster(3000.0, 3000.0)]);
        assert_eq!(update.objects.len(), 2);
        assert_ne!(update.objects[0].object_id, update.objects[1].object_id);
        // Emission is ordered by public id
        assert!(update.objects[0].object_id < update.objects[1].object_id);
    }

    #[test]
    fn test_tentative_track_dropped_on_first_miss() {
        let mut tracker = tracker(3);
        tracker.update(&[make_cluster(1000.0, 0.0)]);
        assert_eq!(tracker.track_count(), 1);

        tracker.update(&[]);
        assert_eq!(tracker.track_count(), 0);
    }

    #[test]
    fn test_lost_track_not_emitted_but_kept() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(1000.0, 0.0)]);

        let update = tracker.update(&[]);
        assert!(update.objects.is_empty());
        assert!(update.retired_ids.is_empty());
        assert_eq!(tracker.track_count(), 1);
        assert_eq!(tracker.live_object_ids(), vec![1]);
    }

    #[test]
    fn test_reacquired_within_grace_keeps_id() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(0.0, 2000.0)]);

        for _ in 0..5 {
            let update = tracker.update(&[]);
            assert!(update.objects.is_empty());
        }

        let update = tracker.update(&[make_cluster(0.0, 2050.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
    }

    #[test]
    fn test_retired_after_max_missing() {
        let mut tracker = ObjectTracker::new(TrackerConfig {
            min_confirm_frames: 1,
            max_missing_frames: 3,
            ..Default::default()
        });
        tracker.update(&[make_cluster(1000.0, 0.0)]);

        // Three misses reach the limit but stay within it
        for _ in 0..3 {
            let update = tracker.update(&[]);
            assert!(update.retired_ids.is_empty());
        }
        assert_eq!(tracker.track_count(), 1);

        // The fourth miss exceeds it
        let update = tracker.update(&[]);
        assert_eq!(update.retired_ids, vec![1]);
        assert_eq!(tracker.track_count(), 0);
    }

    #[test]
    fn test_id_not_reused_after_retirement() {
        let mut tracker = ObjectTracker::new(TrackerConfig {
            min_confirm_frames: 1,
            max_missing_frames: 0,
            ..Default::default()
        });
        tracker.update(&[make_cluster(1000.0, 0.0)]);
        tracker.update(&[]); // retires object 1 immediately

        let update = tracker.update(&[make_cluster(1000.0, 0.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 2);
    }

    #[test]
    fn test_dead_reckoning_compounds_while_lost() {
        let mut tracker = tracker(1);
        // Establish a velocity of (100, 0)
        tracker.update(&[make_cluster(0.0, 0.0)]);
        tracker.update(&[make_cluster(100.0, 0.0)]);

        // Disappear for 5 frames: the track coasts to x = 600 predicted
        for _ in 0..5 {
            tracker.update(&[]);
        }

        // Reappear where dead-reckoning predicts; a stale match radius
        // around x = 100 would have missed this by 600mm
        let update = tracker.update(&[make_cluster(700.0, 0.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
    }

    #[test]
    fn test_match_at_exact_gate_distance() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(0.0, 0.0)]);
        tracker.update(&[make_cluster(0.0, 0.0)]); // velocity settles at zero

        let update = tracker.update(&[make_cluster(800.0, 0.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
    }

    #[test]
    fn test_no_match_beyond_gate_distance() {
        let mut tracker = tracker(2);
        tracker.update(&[make_cluster(0.0, 0.0)]);
        tracker.update(&[make_cluster(0.0, 0.0)]);

        // 801mm away: outside the gate, so the old track goes lost and a
        // new tentative track spawns
        let update = tracker.update(&[make_cluster(801.0, 0.0)]);
        assert!(update.objects.is_empty());
        assert_eq!(tracker.track_count(), 2);
    }

    #[test]
    fn test_greedy_prefers_globally_closest_pair() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(0.0, 0.0), make_cluster(600.0, 0.0)]);

        // Track 1 is 300 from cluster A and 200 from cluster B; track 2 is
        // 100 from B. Greedy takes (track2, B) first, forcing track 1 onto A.
        let update = tracker.update(&[make_cluster(-300.0, 0.0), make_cluster(500.0, 0.0)]);
        assert_eq!(update.objects.len(), 2);
        let by_id: Vec<_> = update.objects.iter().map(|o| (o.object_id, o.centroid.x)).collect();
        assert_eq!(by_id[0], (1, -300.0));
        assert_eq!(by_id[1], (2, 500.0));
    }

    #[test]
    fn test_tie_breaks_by_track_then_cluster() {
        let mut tracker = tracker(1);
        tracker.update(&[make_cluster(0.0, 0.0), make_cluster(200.0, 0.0)]);

        // Both tracks are equidistant (100mm) from the cluster at 100:
        // the smaller internal id wins it.
        let update = tracker.update(&[make_cluster(100.0, 0.0)]);
        assert_eq!(update.objects.len(), 1);
        assert_eq!(update.objects[0].object_id, 1);
    }

    #[test]
    fn test_crossing_tracks_keep_ids_with_prediction() {
        let mut tracker = tracker(1);

        // Two objects approach along x, pass through the origin, continue.
        // Clusters are fed in adversarial order (B first) after the cross
        // so that a velocity-blind matcher would swap the ids.
        let pos_a = |t: i32| -1000.0 + 100.0 * t as f32;
        let pos_b = |t: i32| 1000.0 - 100.0 * t as f32;

        let first = tracker.update(&[
            make_cluster(pos_a(0), 0.0),
            make_cluster(pos_b(0), 0.0),
        ]);
        let id_a = first.objects[0].object_id;
        let id_b = first.objects[1].object_id;

        for t in 1..=20 {
            let update = tracker.update(&[
                make_cluster(pos_b(t), 0.0),
                make_cluster(pos_a(t), 0.0),
            ]);
            assert_eq!(update.objects.len(), 2, "frame {}", t);
            for object in &update.objects {
                let expected = if object.object_id == id_a {
                    pos_a(t)
                } else {
                    assert_eq!(object.object_id, id_b);
                    pos_b(t)
                };
                assert!(
                    (object.centroid.x - expected).abs() < 0.5,
                    "frame {}: object {} at {}, expected {}",
                    t,
                    object.object_id,
                    object.centroid.x,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_update_is_deterministic() {
        let run = || {
            let mut tracker = tracker(2);
            let mut emitted = Vec::new();
            for t in 0..30 {
                let clusters = vec![
                    make_cluster(t as f32 * 50.0, 0.0),
                    make_cluster(3000.0 - t as f32 * 40.0, 1000.0),
                ];
                emitted.push(tracker.update(&clusters).objects);
            }
            emitted
        };
        assert_eq!(run(), run());
    }
}
