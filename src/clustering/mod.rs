//! Density-based clustering of foreground points.
//!
//! Groups nearby Cartesian points into clusters using DBSCAN over a uniform
//! cell grid. Hashing each point into a cell of side `eps_mm` confines every
//! neighborhood query to the 3×3 block of cells around the query point, so
//! the expected cost stays linear for the point counts a single scan
//! produces.
//!
//! Noise points are discarded. Clusters wider than a person
//! (`max_cluster_radius_mm`) are discarded too.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::Point2D;

/// Configuration for the density clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Neighborhood radius (mm).
    /// Default: 200.0
    pub eps_mm: f32,

    /// Minimum neighbors (including the point itself) for a core point.
    /// Default: 3
    pub min_samples: usize,

    /// Clusters whose bounding radius exceeds this are discarded (mm).
    /// Default: 500.0
    pub max_cluster_radius_mm: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps_mm: 200.0,
            min_samples: 3,
            max_cluster_radius_mm: 500.0,
        }
    }
}

/// A group of spatially dense points detected as a single object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Arithmetic mean of member coordinates (mm).
    pub centroid: Point2D,
    /// Member points, in cluster-absorption order.
    pub points: Vec<Point2D>,
    /// Maximum member distance from the centroid (mm).
    pub bounding_radius_mm: f32,
}

impl Cluster {
    /// Number of member points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the cluster has no members (never produced by the clusterer).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Per-point state during expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointState {
    Unvisited,
    /// Too sparse to seed a cluster; may still be absorbed as a border.
    Noise,
    /// Assigned to the cluster with this index.
    Member(usize),
}

/// Uniform cell grid over the input points, cell side = eps.
///
/// One-frame spatial index: built, queried, dropped.
struct CellGrid {
    cell_size_mm: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl CellGrid {
    fn build(points: &[Point2D], cell_size_mm: f32) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells
                .entry(Self::cell_of(p, cell_size_mm))
                .or_default()
                .push(i);
        }
        Self {
            cell_size_mm,
            cells,
        }
    }

    /// Cell coordinate with floor semantics (negative axes included).
    #[inline]
    fn cell_of(p: &Point2D, cell_size_mm: f32) -> (i32, i32) {
        (
            (p.x / cell_size_mm).floor() as i32,
            (p.y / cell_size_mm).floor() as i32,
        )
    }

    /// Indices of all points within `eps` of `points[query]`, gathered from
    /// the 3×3 cell block around the query point. Includes the query point
    /// itself. Order is deterministic: cells scanned in a fixed pattern,
    /// points within a cell in input order.
    fn neighbors_of(&self, query: usize, points: &[Point2D], eps_sq: f32, out: &mut Vec<usize>) {
        out.clear();
        let p = &points[query];
        let (cx, cy) = Self::cell_of(p, self.cell_size_mm);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in cell {
                    if points[j].distance_squared(p) <= eps_sq {
                        out.push(j);
                    }
                }
            }
        }
    }
}

/// Grid-accelerated DBSCAN over planar points.
#[derive(Debug, Clone)]
pub struct Clusterer {
    config: ClusterConfig,
}

impl Clusterer {
    /// Create a clusterer with the given configuration.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Group points into clusters.
    ///
    /// Points are visited in input order; output clusters appear in the
    /// order they were opened, which makes the whole operation
    /// deterministic for a given input sequence.
    pub fn cluster(&self, points: &[Point2D]) -> Vec<Cluster> {
        if points.len() < self.config.min_samples {
            return Vec::new();
        }

        let eps_sq = self.config.eps_mm * self.config.eps_mm;
        let grid = CellGrid::build(points, self.config.eps_mm);

        let mut states = vec![PointState::Unvisited; points.len()];
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut neighbors = Vec::new();
        let mut seeds = Vec::new();

        for i in 0..points.len() {
            if states[i] != PointState::Unvisited {
                continue;
            }

            grid.neighbors_of(i, points, eps_sq, &mut neighbors);
            if neighbors.len() < self.config.min_samples {
                states[i] = PointState::Noise;
                continue;
            }

            // Open a cluster and expand from the seed's neighborhood.
            let cluster_id = members.len();
            states[i] = PointState::Member(cluster_id);
            members.push(vec![i]);

            seeds.clear();
            seeds.extend_from_slice(&neighbors);
            let mut cursor = 0;
            while cursor < seeds.len() {
                let q = seeds[cursor];
                cursor += 1;

                match states[q] {
                    PointState::Member(_) => continue,
                    PointState::Noise => {
                        // Border point: absorbed, but never expands.
                        states[q] = PointState::Member(cluster_id);
                        members[cluster_id].push(q);
                    }
                    PointState::Unvisited => {
                        states[q] = PointState::Member(cluster_id);
                        members[cluster_id].push(q);

                        grid.neighbors_of(q, points, eps_sq, &mut neighbors);
                        if neighbors.len() >= self.config.min_samples {
                            seeds.extend_from_slice(&neighbors);
                        }
                    }
                }
            }
        }

        let clusters: Vec<Cluster> = members
            .into_iter()
            .filter_map(|indices| self.finalize(points, &indices))
            .collect();

        log::trace!(
            "clustered {} points into {} clusters",
            points.len(),
            clusters.len()
        );
        clusters
    }

    /// Compute centroid and bounding radius; drop oversized clusters.
    fn finalize(&self, points: &[Point2D], indices: &[usize]) -> Option<Cluster> {
        let n = indices.len() as f32;
        let (sum_x, sum_y) = indices.iter().fold((0.0f32, 0.0f32), |(sx, sy), &i| {
            (sx + points[i].x, sy + points[i].y)
        });
        let centroid = Point2D::new(sum_x / n, sum_y / n);

        let bounding_radius_mm = indices
            .iter()
            .map(|&i| points[i].distance(&centroid))
            .fold(0.0f32, f32::max);

        if bounding_radius_mm > self.config.max_cluster_radius_mm {
            return None;
        }

        Some(Cluster {
            centroid,
            points: indices.iter().map(|&i| points[i]).collect(),
            bounding_radius_mm,
        })
    }
}

impl Default for Clusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}
