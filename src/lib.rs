//! # shelfwise
//!
//! A book catalog service that recommends titles from the same or a nearby
//! category with a similar star rating.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! SECRET_KEY=... shelfwise --catalog ./books.json --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use shelfwise::prelude::*;
//!
//! let manager = CatalogManager::open(&StoreConfig::new("./books.json"));
//! let result = manager.recommender()?.recommend("Sharp Objects")?;
//! for rec in result.recommendations {
//!     println!("{} ({}, {})", rec.title, rec.category, rec.rating);
//! }
//! # Ok::<(), shelfwise::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - `shelfwise-core` - books, catalog, category encoding, neighbor index, recommender
//! - `shelfwise-storage` - catalog loading, index snapshots, startup manager
//! - `shelfwise-api` - REST API and bearer-token auth

// Re-export core types
pub use shelfwise_core::{
    Book, BookId, Rating,
    Catalog, CatalogStats, CategoryStats,
    CategoryCode, CategoryEncoder, CategoryScheme,
    FeatureVector, FlatIndex, Neighbor, NeighborIndex,
    BookFilter, FieldFilter, FilterCondition,
    RecommendationService, RecommenderConfig, RecommendationResult, Recommendation,
    Error, Result,
};

// Re-export storage
pub use shelfwise_storage::{CatalogManager, InitError, StoreConfig, SnapshotStore};

// Re-export API
pub use shelfwise_api::{AuthConfig, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Book, BookId, Rating,
        Catalog, CategoryEncoder, CategoryScheme,
        FeatureVector, FlatIndex, NeighborIndex,
        FieldFilter, FilterCondition,
        RecommendationService, RecommenderConfig,
        Error, Result,
        CatalogManager, StoreConfig,
        RestApi, AuthConfig,
    };
}
