use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use crate::category::CategoryCode;

/// Numeric representation of a book used for distance computation.
///
/// Today this is a single category code, but nothing below assumes one
/// dimension; the inline capacity just keeps small vectors off the heap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    data: SmallVec<[f32; 4]>,
}

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data: SmallVec::from_vec(data),
        }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: SmallVec::from_slice(data),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Euclidean distance; reduces to `|a - b|` in one dimension
    #[inline]
    pub fn l2_distance(&self, other: &FeatureVector) -> f32 {
        if self.dim() != other.dim() {
            return f32::INFINITY;
        }

        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

impl From<CategoryCode> for FeatureVector {
    fn from(code: CategoryCode) -> Self {
        Self::from_slice(&[code as f32])
    }
}
