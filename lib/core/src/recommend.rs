//! Rating-filtered "similar books" on top of a fitted neighbor index.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::index::DEFAULT_NEIGHBORS;
use crate::{
    Book, Catalog, CategoryCode, CategoryEncoder, Error, FeatureVector, FlatIndex, NeighborIndex,
    Rating, Result,
};

/// Tunables for fitting and post-filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Minimum training size, and the neighbor count the index is fitted for
    pub n_neighbors: usize,
    /// Neighbors requested per query before filtering
    pub candidate_pool: usize,
    pub max_results: usize,
    /// Largest accepted rating distance
    pub rating_tolerance: u8,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_NEIGHBORS,
            candidate_pool: 10,
            max_results: 5,
            rating_tolerance: 1,
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_neighbors == 0 {
            return Err(Error::InvalidConfig("n_neighbors must be at least 1".to_string()));
        }
        if self.max_results == 0 {
            return Err(Error::InvalidConfig("max_results must be at least 1".to_string()));
        }
        if self.candidate_pool < self.max_results {
            return Err(Error::InvalidConfig(format!(
                "candidate_pool ({}) must not be smaller than max_results ({})",
                self.candidate_pool, self.max_results
            )));
        }
        Ok(())
    }
}

/// A fitted index plus the catalog position of every training point.
///
/// Books with unknown categories are skipped during training, so training
/// index `i` refers to catalog position `positions[i]`, not `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationModel {
    index: FlatIndex,
    positions: Vec<usize>,
}

impl RecommendationModel {
    /// Encode every book with a known category and fit the index on them
    pub fn fit(catalog: &Catalog, encoder: &CategoryEncoder, n_neighbors: usize) -> Result<Self> {
        let mut features = Vec::with_capacity(catalog.len());
        let mut positions = Vec::with_capacity(catalog.len());
        for (pos, book) in catalog.iter().enumerate() {
            if let Ok(feature) = encoder.feature(&book.category) {
                features.push(feature);
                positions.push(pos);
            }
        }

        let index = FlatIndex::fit(features, n_neighbors)?;
        Ok(Self { index, positions })
    }

    /// Reassemble a model, e.g. after loading it from disk
    pub fn from_parts(index: FlatIndex, positions: Vec<usize>) -> Result<Self> {
        if index.len() != positions.len() {
            return Err(Error::InvalidConfig(format!(
                "index has {} points but {} catalog positions",
                index.len(),
                positions.len()
            )));
        }
        Ok(Self { index, positions })
    }

    #[inline]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn into_parts(self) -> (FlatIndex, Vec<usize>) {
        (self.index, self.positions)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub category: String,
    pub rating: Rating,
    pub price: f64,
}

impl From<&Book> for Recommendation {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            category: book.category.clone(),
            rating: book.rating,
            price: book.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    /// Title as stored in the catalog, not as typed by the caller
    pub input_book: String,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookFeature {
    pub title: String,
    pub category: String,
    pub category_feature: CategoryCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureReport {
    pub features: Vec<BookFeature>,
    /// Books left out because their category is not in the table
    pub skipped: usize,
}

/// Title, category and code of every book whose category can be encoded
pub fn features(catalog: &Catalog, encoder: &CategoryEncoder) -> FeatureReport {
    let mut skipped = 0;
    let features = catalog
        .iter()
        .filter_map(|book| match encoder.encode(&book.category) {
            Ok(code) => Some(BookFeature {
                title: book.title.clone(),
                category: book.category.clone(),
                category_feature: code,
            }),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    FeatureReport { features, skipped }
}

/// Serves recommendations from an immutable catalog and fitted index.
///
/// Nothing is mutated after construction, so a shared reference can be used
/// from any number of threads at once.
pub struct RecommendationService {
    catalog: Arc<Catalog>,
    encoder: CategoryEncoder,
    index: Box<dyn NeighborIndex>,
    positions: Vec<usize>,
    config: RecommenderConfig,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<Catalog>,
        encoder: CategoryEncoder,
        model: RecommendationModel,
        config: RecommenderConfig,
    ) -> Result<Self> {
        let (index, positions) = model.into_parts();
        Self::with_index(catalog, encoder, Box::new(index), positions, config)
    }

    /// Use any index implementation; `positions[i]` is the catalog position
    /// of training point `i`
    pub fn with_index(
        catalog: Arc<Catalog>,
        encoder: CategoryEncoder,
        index: Box<dyn NeighborIndex>,
        positions: Vec<usize>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;
        if index.len() != positions.len() {
            return Err(Error::InvalidConfig(format!(
                "index has {} points but {} catalog positions",
                index.len(),
                positions.len()
            )));
        }
        if index.len() < config.n_neighbors {
            return Err(Error::InsufficientData {
                required: config.n_neighbors,
                actual: index.len(),
            });
        }
        if let Some(bad) = positions.iter().find(|&&p| p >= catalog.len()) {
            return Err(Error::InvalidConfig(format!(
                "catalog position {} out of range for {} books",
                bad,
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            encoder,
            index,
            positions,
            config,
        })
    }

    /// Fit a fresh index over `catalog`
    pub fn fit(
        catalog: Arc<Catalog>,
        encoder: CategoryEncoder,
        config: RecommenderConfig,
    ) -> Result<Self> {
        let model = RecommendationModel::fit(&catalog, &encoder, config.n_neighbors)?;
        Self::new(catalog, encoder, model, config)
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[inline]
    pub fn encoder(&self) -> &CategoryEncoder {
        &self.encoder
    }

    #[inline]
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Number of books the index was fitted on
    #[inline]
    pub fn training_size(&self) -> usize {
        self.index.len()
    }

    /// Books similar to the one titled `title`.
    ///
    /// The nearest `candidate_pool` books by category code are taken in index
    /// order, books with the input's exact title are dropped, the rest must be
    /// within `rating_tolerance` of the input's rating, and at most
    /// `max_results` survive. An empty list is a valid answer.
    pub fn recommend(&self, title: &str) -> Result<RecommendationResult> {
        let book = self
            .catalog
            .find_by_title(title)
            .ok_or_else(|| Error::BookNotFound(title.to_string()))?;

        let code = self
            .encoder
            .encode(&book.category)
            .map_err(|_| Error::CategoryUnreconciled {
                title: book.title.clone(),
                category: book.category.clone(),
            })?;

        let pool = self.config.candidate_pool.min(self.index.len());
        let neighbors = self.index.query(&FeatureVector::from(code), pool)?;

        let recommendations = neighbors
            .iter()
            .filter_map(|n| self.positions.get(n.index))
            .filter_map(|&pos| self.catalog.get(pos))
            .filter(|candidate| candidate.title != book.title)
            .filter(|candidate| candidate.rating.distance(book.rating) <= self.config.rating_tolerance)
            .take(self.config.max_results)
            .map(Recommendation::from)
            .collect();

        Ok(RecommendationResult {
            input_book: book.title.clone(),
            recommendations,
        })
    }
}

impl std::fmt::Debug for RecommendationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationService")
            .field("books", &self.catalog.len())
            .field("training_size", &self.index.len())
            .field("scheme", &self.encoder.scheme())
            .field("config", &self.config)
            .finish()
    }
}
