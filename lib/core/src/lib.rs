//! # shelfwise Core
//!
//! Core library for the shelfwise book catalog service.
//!
//! This crate provides the data model and the recommendation engine:
//!
//! - [`Book`] - A catalog entry with id, title, price, rating and category
//! - [`Catalog`] - Immutable, ordered collection of books with lookups, search and stats
//! - [`CategoryEncoder`] - Static category -> code tables
//! - [`FlatIndex`] - Exact k-nearest-neighbor index behind the [`NeighborIndex`] trait
//! - [`RecommendationService`] - Rating-filtered "similar books"
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shelfwise_core::{Book, Catalog, CategoryEncoder, Rating, RecommendationService, RecommenderConfig};
//!
//! let books = (0..6u64)
//!     .map(|i| Book::new(i, format!("Book {}", i), 20.0, Rating::Four, "In stock", "Fiction"))
//!     .collect();
//! let catalog = Arc::new(Catalog::new(books));
//!
//! let service = RecommendationService::fit(catalog, CategoryEncoder::default(), RecommenderConfig::default())
//!     .unwrap();
//! let result = service.recommend("book 0").unwrap();
//! assert_eq!(result.recommendations.len(), 5);
//! ```

pub mod book;
pub mod catalog;
pub mod category;
pub mod error;
pub mod feature;
pub mod filter;
pub mod index;
pub mod recommend;

pub use book::{Book, BookId, Rating, parse_price};
pub use catalog::{Catalog, CatalogStats, CategoryStats};
pub use category::{CategoryCode, CategoryEncoder, CategoryScheme};
pub use error::{Error, Result};
pub use feature::FeatureVector;
pub use filter::{BookFilter, FieldFilter, FilterCondition};
pub use index::{FlatIndex, Neighbor, NeighborIndex, DEFAULT_NEIGHBORS};
pub use recommend::{
    features, BookFeature, FeatureReport, Recommendation, RecommendationModel,
    RecommendationResult, RecommendationService, RecommenderConfig,
};
