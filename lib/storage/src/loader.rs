use anyhow::{Context, Result};
use shelfwise_core::{Book, Catalog};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reads the catalog from a JSON array of books
pub struct CatalogLoader {
    path: PathBuf,
}

impl CatalogLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Catalog> {
        let data = std::fs::read(&self.path)
            .with_context(|| format!("failed to read catalog {:?}", self.path))?;
        let catalog = parse_catalog(&data)
            .with_context(|| format!("failed to parse catalog {:?}", self.path))?;

        info!("Loaded {} books from {:?}", catalog.len(), self.path);
        let duplicates = catalog.duplicate_titles();
        if !duplicates.is_empty() {
            warn!(
                "{} titles appear more than once; lookups return the first: {:?}",
                duplicates.len(),
                duplicates
            );
        }

        Ok(catalog)
    }
}

pub fn parse_catalog(data: &[u8]) -> Result<Catalog> {
    let books: Vec<Book> = serde_json::from_slice(data)?;
    Ok(Catalog::new(books))
}
