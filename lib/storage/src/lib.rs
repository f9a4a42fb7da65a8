pub mod loader;
pub mod manager;
pub mod snapshot;

pub use loader::{parse_catalog, CatalogLoader};
pub use manager::{CatalogManager, InitError, StoreConfig};
pub use snapshot::{catalog_fingerprint, IndexSnapshot, SnapshotStore, SNAPSHOT_FORMAT_VERSION};
