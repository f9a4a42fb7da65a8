use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use crate::{Error, FeatureVector, Result};

/// Neighbors a fitted index must be able to return
pub const DEFAULT_NEIGHBORS: usize = 6;

/// One query hit: distance to the query and position in training order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub distance: f32,
    pub index: usize,
}

/// k-nearest-neighbor lookup over fitted feature vectors.
///
/// Results are ordered by non-decreasing distance with ties broken by
/// ascending training index, so the same query always yields the same list.
/// A training point identical to the query is returned at distance 0.
pub trait NeighborIndex: Send + Sync {
    /// Number of training points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension every query point must have
    fn dim(&self) -> usize;

    /// Return `min(k, len())` nearest training points
    fn query(&self, point: &FeatureVector, k: usize) -> Result<Vec<Neighbor>>;
}

/// Heap entry ordered by (distance, index); the max is the worst kept hit
#[derive(Clone, Copy, PartialEq, Eq)]
struct Candidate {
    dist: OrderedFloat<f32>,
    idx: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .cmp(&other.dist)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Brute-force index: stores the points and scans them on every query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    n_neighbors: usize,
    points: Vec<FeatureVector>,
}

impl FlatIndex {
    /// Store `features` in training order.
    ///
    /// Fails with `InsufficientData` when fewer than `n_neighbors` points are
    /// given, and with `InvalidDimension` on empty or mixed-dimension input.
    pub fn fit(features: Vec<FeatureVector>, n_neighbors: usize) -> Result<Self> {
        if n_neighbors == 0 {
            return Err(Error::InvalidConfig("n_neighbors must be at least 1".to_string()));
        }
        if features.len() < n_neighbors {
            return Err(Error::InsufficientData {
                required: n_neighbors,
                actual: features.len(),
            });
        }

        let dim = features[0].dim();
        if dim == 0 {
            return Err(Error::InvalidDimension { expected: 1, actual: 0 });
        }
        if let Some(bad) = features.iter().find(|f| f.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }

        Ok(Self {
            dim,
            n_neighbors,
            points: features,
        })
    }

    #[inline]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    #[inline]
    pub fn points(&self) -> &[FeatureVector] {
        &self.points
    }
}

impl NeighborIndex for FlatIndex {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn query(&self, point: &FeatureVector, k: usize) -> Result<Vec<Neighbor>> {
        if point.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: point.dim(),
            });
        }

        let k = k.min(self.points.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for (idx, candidate) in self.points.iter().enumerate() {
            heap.push(Candidate {
                dist: OrderedFloat(point.l2_distance(candidate)),
                idx,
            });
            if heap.len() > k {
                heap.pop();
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                distance: c.dist.into_inner(),
                index: c.idx,
            })
            .collect())
    }
}
