use shelfwise_core::{
    Catalog, CategoryEncoder, CategoryScheme, Error, FeatureReport, RecommendationModel,
    RecommendationService, RecommenderConfig, Result,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use crate::loader::CatalogLoader;
use crate::snapshot::{IndexSnapshot, SnapshotStore};

/// Where the catalog lives and how the recommender is built
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub catalog_path: PathBuf,
    /// Persist the fitted index here and reuse it on restart
    pub snapshot_path: Option<PathBuf>,
    pub scheme: CategoryScheme,
    pub recommender: RecommenderConfig,
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>>(catalog_path: P) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            snapshot_path: None,
            scheme: CategoryScheme::default(),
            recommender: RecommenderConfig::default(),
        }
    }
}

/// Why the recommender could not be brought up
#[derive(thiserror::Error, Debug, Clone)]
pub enum InitError {
    #[error("catalog unavailable: {0}")]
    Catalog(String),

    #[error("failed to fit recommendation index: {0}")]
    Fit(#[from] Error),
}

/// Owns the loaded catalog and, when startup succeeded, the recommender.
///
/// Browsing only needs the catalog, so a failed recommender never takes the
/// rest of the service down with it.
pub struct CatalogManager {
    catalog: Arc<Catalog>,
    encoder: CategoryEncoder,
    recommender: std::result::Result<Arc<RecommendationService>, InitError>,
}

impl CatalogManager {
    /// Load the catalog from disk and bring up the recommender
    pub fn open(config: &StoreConfig) -> Self {
        match CatalogLoader::new(&config.catalog_path).load() {
            Ok(catalog) => Self::from_catalog(catalog, config),
            Err(e) => {
                warn!("Serving an empty catalog: {:#}", e);
                Self {
                    catalog: Arc::new(Catalog::default()),
                    encoder: CategoryEncoder::new(config.scheme),
                    recommender: Err(InitError::Catalog(format!("{:#}", e))),
                }
            }
        }
    }

    pub fn from_catalog(catalog: Catalog, config: &StoreConfig) -> Self {
        let catalog = Arc::new(catalog);
        let encoder = CategoryEncoder::new(config.scheme);
        let recommender = Self::init_recommender(&catalog, &encoder, config);

        match &recommender {
            Ok(service) => info!(
                "Recommender ready: {} of {} books indexed ({})",
                service.training_size(),
                catalog.len(),
                encoder.scheme()
            ),
            Err(e) => warn!("Recommender unavailable: {}", e),
        }

        Self {
            catalog,
            encoder,
            recommender,
        }
    }

    fn init_recommender(
        catalog: &Arc<Catalog>,
        encoder: &CategoryEncoder,
        config: &StoreConfig,
    ) -> std::result::Result<Arc<RecommendationService>, InitError> {
        config.recommender.validate()?;
        let model = Self::restore_or_fit(catalog, encoder, config)?;
        let service = RecommendationService::new(
            catalog.clone(),
            encoder.clone(),
            model,
            config.recommender,
        )?;
        Ok(Arc::new(service))
    }

    fn restore_or_fit(
        catalog: &Catalog,
        encoder: &CategoryEncoder,
        config: &StoreConfig,
    ) -> std::result::Result<RecommendationModel, InitError> {
        let n_neighbors = config.recommender.n_neighbors;
        let store = config.snapshot_path.as_ref().map(SnapshotStore::new);

        if let Some(store) = &store {
            match store.load() {
                Ok(Some(snapshot)) => match snapshot.verify(catalog, encoder, n_neighbors) {
                    Ok(()) => {
                        info!("Restored index snapshot from {:?}", store.path());
                        return Ok(snapshot.model);
                    }
                    Err(e) => info!("Ignoring index snapshot {:?}: {}", store.path(), e),
                },
                Ok(None) => {}
                Err(e) => warn!("Failed to read index snapshot {:?}: {}", store.path(), e),
            }
        }

        let model = RecommendationModel::fit(catalog, encoder, n_neighbors)?;
        let skipped = catalog.len() - model.len();
        if skipped > 0 {
            warn!("{} books have categories outside the {} table and were not indexed", skipped, encoder.scheme());
        }

        if let Some(store) = &store {
            match store.save(&IndexSnapshot::new(model.clone(), encoder, catalog)) {
                Ok(()) => info!("Saved index snapshot to {:?}", store.path()),
                Err(e) => warn!("Failed to save index snapshot: {}", e),
            }
        }

        Ok(model)
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[inline]
    pub fn encoder(&self) -> &CategoryEncoder {
        &self.encoder
    }

    /// The recommender, or `IndexUnavailable` carrying the startup failure
    pub fn recommender(&self) -> Result<&Arc<RecommendationService>> {
        self.recommender
            .as_ref()
            .map_err(|e| Error::IndexUnavailable(e.to_string()))
    }

    #[inline]
    pub fn is_recommender_ready(&self) -> bool {
        self.recommender.is_ok()
    }

    pub fn init_error(&self) -> Option<&InitError> {
        self.recommender.as_ref().err()
    }

    /// Feature dump; works whether or not the recommender is up
    pub fn features(&self) -> FeatureReport {
        shelfwise_core::features(&self.catalog, &self.encoder)
    }
}
