use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::OwnedRwLockWriteGuard;
use tracing::{debug, error};

use crate::context::AssetContext;
use crate::error::DataAccessError;
use crate::gate::Gate;
use crate::worker::ConnectionWorker;

/// One cached database: its worker-backed handle, its gate, and its
/// transaction state.
pub(crate) struct DbEntry {
    pub(crate) worker: ConnectionWorker,
    pub(crate) gate: Gate,
    pub(crate) transaction: AsyncMutex<TransactionState>,
}

/// Per-database transaction state. While a transaction is open the gate's
/// exclusive guard is parked here, to be dropped exactly once when the
/// transaction ends.
#[derive(Default)]
pub(crate) struct TransactionState {
    pub(crate) guard: Option<OwnedRwLockWriteGuard<()>>,
}

impl TransactionState {
    pub(crate) fn is_open(&self) -> bool {
        self.guard.is_some()
    }
}

/// Name-keyed cache of open database handles.
///
/// Invariant: at most one entry per database name. The map is guarded by its
/// own mutex so racing first accesses to the same name cannot open two
/// handles or copy the asset twice.
pub(crate) struct Registry {
    context: Box<dyn AssetContext>,
    storage_dir: OnceLock<PathBuf>,
    entries: Mutex<HashMap<String, Arc<DbEntry>>>,
}

impl Registry {
    pub(crate) fn new(context: impl AssetContext) -> Self {
        Self {
            context: Box::new(context),
            storage_dir: OnceLock::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached entry for `name`, materializing the bundled asset
    /// and opening the connection on first access.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] for an empty name, an
    /// unresolvable storage location, or an unreadable asset, and
    /// [`DataAccessError::ConnectionError`] if the worker cannot be started.
    pub(crate) fn entry(&self, name: &str) -> Result<Arc<DbEntry>, DataAccessError> {
        if name.is_empty() {
            return Err(DataAccessError::SetupError(
                "database name is empty".into(),
            ));
        }

        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get(name) {
            return Ok(Arc::clone(entry));
        }

        let path = self.materialize(name).inspect_err(|err| {
            error!(database = name, %err, "database setup failed");
        })?;
        let worker = ConnectionWorker::open(name, &path)?;
        let entry = Arc::new(DbEntry {
            worker,
            gate: Gate::new(),
            transaction: AsyncMutex::new(TransactionState::default()),
        });
        entries.insert(name.to_owned(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Remove and return the entry for `name`, if cached.
    pub(crate) fn remove(&self, name: &str) -> Option<Arc<DbEntry>> {
        self.lock_entries().remove(name)
    }

    /// Remove and return every cached entry.
    pub(crate) fn drain(&self) -> Vec<(String, Arc<DbEntry>)> {
        self.lock_entries().drain().collect()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Arc<DbEntry>>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy the bundled asset into private storage unless the destination
    /// file already exists, returning the on-disk path. Runs at most once
    /// per name while the entry stays cached.
    fn materialize(&self, name: &str) -> Result<PathBuf, DataAccessError> {
        let dir = self.resolve_storage_dir()?;
        fs::create_dir_all(&dir).map_err(|err| {
            DataAccessError::SetupError(format!(
                "unable to create storage directory {}: {err}",
                dir.display()
            ))
        })?;

        let path = dir.join(name);
        if !path.exists() {
            debug!(database = name, path = %path.display(), "materializing bundled asset");
            let mut asset = self.context.open_asset(name)?;
            let mut destination = fs::File::create(&path).map_err(|err| {
                DataAccessError::SetupError(format!(
                    "unable to create database file {}: {err}",
                    path.display()
                ))
            })?;
            io::copy(&mut asset, &mut destination).map_err(|err| {
                // Leave no truncated database behind.
                let _ = fs::remove_file(&path);
                DataAccessError::SetupError(format!(
                    "unable to copy bundled asset {name}: {err}"
                ))
            })?;
        }
        Ok(path)
    }

    /// Resolve the storage directory from the context once and cache it.
    fn resolve_storage_dir(&self) -> Result<PathBuf, DataAccessError> {
        if let Some(dir) = self.storage_dir.get() {
            return Ok(dir.clone());
        }
        let dir = self.context.storage_dir()?;
        Ok(self.storage_dir.get_or_init(|| dir).clone())
    }
}
