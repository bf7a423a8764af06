use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::error::DataAccessError;

/// Capability for resolving private storage and reading bundled assets.
///
/// The access layer never touches the platform directly; it asks this trait
/// where materialized database files live and for the bytes of a named
/// bundled asset. An implementation whose backing context is gone (for
/// example, a dropped application handle) should return a
/// [`DataAccessError::SetupError`] from either method.
pub trait AssetContext: Send + Sync + 'static {
    /// Directory where materialized database files are kept.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] if the storage location cannot
    /// be resolved.
    fn storage_dir(&self) -> Result<PathBuf, DataAccessError>;

    /// Open the named bundled asset for reading.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] if no asset with that name can
    /// be read.
    fn open_asset(&self, name: &str) -> Result<Box<dyn Read + Send>, DataAccessError>;
}

/// Directory-backed [`AssetContext`]: assets in one directory, storage in
/// another.
#[derive(Debug, Clone)]
pub struct DirContext {
    asset_dir: PathBuf,
    storage_dir: PathBuf,
}

impl DirContext {
    pub fn new(asset_dir: impl Into<PathBuf>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            storage_dir: storage_dir.into(),
        }
    }
}

impl AssetContext for DirContext {
    fn storage_dir(&self) -> Result<PathBuf, DataAccessError> {
        Ok(self.storage_dir.clone())
    }

    fn open_asset(&self, name: &str) -> Result<Box<dyn Read + Send>, DataAccessError> {
        let path = self.asset_dir.join(name);
        let file = File::open(&path).map_err(|err| {
            DataAccessError::SetupError(format!(
                "unable to read bundled asset {}: {err}",
                path.display()
            ))
        })?;
        Ok(Box::new(file))
    }
}
