// Persisted recommendation index, so a restart can skip refitting
use anyhow::{anyhow, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shelfwise_core::{Catalog, CategoryEncoder, CategoryScheme, RecommendationModel};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Fitted model plus what it was fitted against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub format_version: u32,
    pub scheme: CategoryScheme,
    pub scheme_version: u32,
    /// See [`catalog_fingerprint`]
    pub fingerprint: String,
    pub created_at: u64,
    pub model: RecommendationModel,
}

impl IndexSnapshot {
    pub fn new(model: RecommendationModel, encoder: &CategoryEncoder, catalog: &Catalog) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            scheme: encoder.scheme(),
            scheme_version: encoder.scheme().version(),
            fingerprint: catalog_fingerprint(catalog, encoder),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            model,
        }
    }

    /// Check the snapshot was fitted on this catalog, with this table and
    /// neighbor count
    pub fn verify(&self, catalog: &Catalog, encoder: &CategoryEncoder, n_neighbors: usize) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(anyhow!(
                "snapshot format {} does not match {}",
                self.format_version,
                SNAPSHOT_FORMAT_VERSION
            ));
        }
        if self.scheme != encoder.scheme() || self.scheme_version != encoder.scheme().version() {
            return Err(anyhow!(
                "snapshot fitted with category scheme {}-v{}, current is {}",
                self.scheme.name(),
                self.scheme_version,
                encoder.scheme()
            ));
        }
        if self.model.index().n_neighbors() != n_neighbors {
            return Err(anyhow!(
                "snapshot fitted for {} neighbors, configured {}",
                self.model.index().n_neighbors(),
                n_neighbors
            ));
        }
        if self.fingerprint != catalog_fingerprint(catalog, encoder) {
            return Err(anyhow!("catalog changed since the snapshot was taken"));
        }
        Ok(())
    }
}

/// SHA-256 over the scheme and every book's title and category, in catalog order
pub fn catalog_fingerprint(catalog: &Catalog, encoder: &CategoryEncoder) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoder.scheme().to_string().as_bytes());
    hasher.update((catalog.len() as u64).to_le_bytes());
    for book in catalog.iter() {
        hasher.update(book.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(book.category.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write through a temp file and rename, so readers never see a partial file
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = bincode::serialize(snapshot)
            .map_err(|e| anyhow!("Serialization error: {}", e))?;
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&data))
            .map_err(|e| anyhow!("failed to write snapshot {:?}: {}", self.path, e))?;
        Ok(())
    }

    /// `Ok(None)` when no snapshot has been written yet
    pub fn load(&self) -> Result<Option<IndexSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = std::fs::read(&self.path)?;
        let snapshot: IndexSnapshot = bincode::deserialize(&data)
            .map_err(|e| anyhow!("Deserialization error: {}", e))?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfwise_core::{Book, FeatureVector, NeighborIndex, Rating};

    fn catalog(categories: &[&str]) -> Catalog {
        Catalog::new(
            categories
                .iter()
                .enumerate()
                .map(|(i, c)| Book::new(i as u64, format!("Book {}", i), 12.5, Rating::Three, "In stock", *c))
                .collect(),
        )
    }

    #[test]
    fn test_round_trip_gives_identical_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("index").join("model.bin"));
        let catalog = catalog(&["Fiction", "Poetry", "Mystery", "Fiction", "Travel", "Art", "Fiction"]);
        let encoder = CategoryEncoder::default();

        let model = RecommendationModel::fit(&catalog, &encoder, 6).unwrap();
        store.save(&IndexSnapshot::new(model.clone(), &encoder, &catalog)).unwrap();

        let restored = store.load().unwrap().unwrap();
        restored.verify(&catalog, &encoder, 6).unwrap();
        assert_eq!(restored.model, model);

        for code in 0..21 {
            let query = FeatureVector::from(code);
            assert_eq!(
                restored.model.index().query(&query, 7).unwrap(),
                model.index().query(&query, 7).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SnapshotStore::new(dir.path().join("none.bin")).load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"not a snapshot").unwrap();
        assert!(SnapshotStore::new(&path).load().is_err());
    }

    #[test]
    fn test_stale_snapshot_rejected() {
        let encoder = CategoryEncoder::default();
        let original = catalog(&["Fiction", "Poetry", "Mystery", "Fiction", "Travel", "Art"]);
        let changed = catalog(&["Fiction", "Poetry", "Mystery", "Fiction", "Travel", "Music"]);

        let model = RecommendationModel::fit(&original, &encoder, 6).unwrap();
        let snapshot = IndexSnapshot::new(model, &encoder, &original);

        assert!(snapshot.verify(&original, &encoder, 6).is_ok());
        assert!(snapshot.verify(&changed, &encoder, 6).is_err());
        assert!(snapshot.verify(&original, &encoder, 5).is_err());
        assert!(snapshot
            .verify(&original, &CategoryEncoder::new(CategoryScheme::Grouped), 6)
            .is_err());
    }
}
