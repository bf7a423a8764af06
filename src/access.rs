use tracing::debug;

use crate::context::AssetContext;
use crate::error::DataAccessError;
use crate::params::{params_as_strings, SqliteParams};
use crate::registry::{DbEntry, Registry};
use crate::results::AccessResult;
use crate::types::ParamValue;

/// Thread-safe access to `SQLite` databases bundled as application assets.
///
/// Databases are addressed by the name of their bundled asset file. On the
/// first access to a name, the asset is copied byte-for-byte into the
/// context's private storage directory and opened there; every later access
/// with the same name reuses the cached handle.
///
/// Concurrency: reads run concurrently with each other; a mutation or an
/// explicit transaction has exclusive access, waiting for in-flight reads to
/// finish and holding back new ones until it completes. Acquisition is fair,
/// with no timeouts.
///
/// Error policy: the data entry points return `Err` only for setup-class
/// failures (bad name, unreachable storage, unreadable asset). Bind and
/// execution failures are captured in the returned result's `error` field,
/// so inspect the result even on `Ok`.
pub struct DataAccess {
    registry: Registry,
}

impl DataAccess {
    /// Create an access layer over the given context.
    ///
    /// Each `DataAccess` owns its registry, so independent database sets can
    /// coexist in one process.
    pub fn new(context: impl AssetContext) -> Self {
        Self {
            registry: Registry::new(context),
        }
    }

    /// Run a read statement and capture its rows.
    ///
    /// Bind parameters are coerced to their string form before binding; the
    /// read path binds strings only. The read claim on the gate is released
    /// once every row has been consumed.
    ///
    /// Calling this from the task that holds an open transaction on the same
    /// database deadlocks: the read waits for the transaction's exclusive
    /// claim, which only `end_transaction` releases.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] if the database cannot be set
    /// up; all other failures land in the result's `error` field.
    pub async fn query(
        &self,
        name: &str,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<AccessResult, DataAccessError> {
        let entry = self.registry.entry(name)?;
        Ok(read(&entry, sql, params).await)
    }

    /// Run a mutating statement.
    ///
    /// With bind parameters the statement is prepared and the values bound by
    /// type; without parameters it runs as a literal statement string, with
    /// no injection protection at this layer.
    ///
    /// Outside an explicit transaction the call wraps itself in an implicit
    /// one: exclusive gate claim, `BEGIN`, execute, `COMMIT` on success or
    /// `ROLLBACK` on failure, release. Inside an explicit transaction the
    /// statement simply joins it, without touching the gate or the
    /// transaction boundary.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] if the database cannot be set
    /// up; all other failures land in the result's `error` field.
    pub async fn mutate(
        &self,
        name: &str,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<AccessResult, DataAccessError> {
        let entry = self.registry.entry(name)?;
        Ok(write(&entry, sql, params).await)
    }

    /// Run a statement, classifying it as a read when its first token is
    /// `select` (case-insensitive, leading whitespace ignored) and as a
    /// mutation otherwise.
    ///
    /// This is a heuristic, not a parser: a write statement led by a `WITH`
    /// clause is misclassified. Use [`query`](Self::query) and
    /// [`mutate`](Self::mutate) when the intent is known.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SetupError`] if the database cannot be set
    /// up; all other failures land in the result's `error` field.
    pub async fn execute(
        &self,
        name: &str,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<AccessResult, DataAccessError> {
        if is_read_statement(sql) {
            debug!(database = name, "classified statement as a read");
            self.query(name, sql, params).await
        } else {
            debug!(database = name, "classified statement as a mutation");
            self.mutate(name, sql, params).await
        }
    }

    /// Open an explicit transaction on the named database.
    ///
    /// Claims the exclusive gate (waiting for in-flight reads and writers),
    /// issues `BEGIN`, and holds the claim until
    /// [`end_transaction`](Self::end_transaction). Mutations on this database
    /// from any task now join the open transaction.
    ///
    /// # Errors
    /// Returns [`DataAccessError::ExecutionError`] if a transaction is
    /// already open on this database, setup errors as usual, and any engine
    /// error from `BEGIN`.
    pub async fn begin_transaction(&self, name: &str) -> Result<(), DataAccessError> {
        let entry = self.registry.entry(name)?;
        let mut tx = entry.transaction.lock().await;
        if tx.is_open() {
            return Err(DataAccessError::ExecutionError(format!(
                "a transaction is already open on {name}"
            )));
        }
        debug!(database = name, "claiming exclusive gate for transaction");
        let guard = entry.gate.exclusive().await;
        entry.worker.begin().await?;
        tx.guard = Some(guard);
        debug!(database = name, "transaction open");
        Ok(())
    }

    /// Close the explicit transaction on the named database, committing when
    /// `commit` is true and rolling back otherwise.
    ///
    /// The exclusive gate claim is released exactly once, even if the native
    /// commit or rollback fails.
    ///
    /// # Errors
    /// Returns [`DataAccessError::ExecutionError`] if no transaction is open
    /// on this database, setup errors as usual, and any engine error from
    /// `COMMIT`/`ROLLBACK`.
    pub async fn end_transaction(&self, name: &str, commit: bool) -> Result<(), DataAccessError> {
        let entry = self.registry.entry(name)?;
        let mut tx = entry.transaction.lock().await;
        let guard = tx.guard.take().ok_or_else(|| {
            DataAccessError::ExecutionError(format!("no open transaction on {name}"))
        })?;
        let outcome = if commit {
            entry.worker.commit().await
        } else {
            entry.worker.rollback().await
        };
        drop(guard);
        debug!(database = name, commit, "transaction closed");
        outcome
    }

    /// Close the named database and remove it from the registry.
    ///
    /// A later access with the same name opens a fresh handle (the
    /// materialized file is left in place, so no re-copy happens).
    ///
    /// # Errors
    /// Returns [`DataAccessError::ConnectionError`] if the worker is already
    /// gone.
    pub async fn close(&self, name: &str) -> Result<(), DataAccessError> {
        if let Some(entry) = self.registry.remove(name) {
            debug!(database = name, "closing database");
            entry.worker.close().await?;
        }
        Ok(())
    }

    /// Close every cached database and empty the registry.
    ///
    /// # Errors
    /// Returns the first [`DataAccessError::ConnectionError`] encountered.
    pub async fn close_all(&self) -> Result<(), DataAccessError> {
        for (name, entry) in self.registry.drain() {
            debug!(database = %name, "closing database");
            entry.worker.close().await?;
        }
        Ok(())
    }
}

fn is_read_statement(sql: &str) -> bool {
    sql.trim_start()
        .as_bytes()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case(b"select"))
}

async fn read(entry: &DbEntry, sql: &str, params: &[ParamValue]) -> AccessResult {
    let strings = match params_as_strings(params) {
        Ok(strings) => strings,
        Err(err) => return AccessResult::failed(&err.to_string()),
    };
    let _claim = entry.gate.shared().await;
    match entry.worker.run_select(sql.to_owned(), strings).await {
        Ok(result) => result,
        Err(err) => AccessResult::failed(&err.to_string()),
    }
}

async fn write(entry: &DbEntry, sql: &str, params: &[ParamValue]) -> AccessResult {
    let tx = entry.transaction.lock().await;
    let outcome = if tx.is_open() {
        // Joining an open explicit transaction: the gate is already held and
        // commit/rollback belongs to end_transaction.
        run_mutation(entry, sql, params).await
    } else {
        let guard = entry.gate.exclusive().await;
        let outcome = run_in_implicit_transaction(entry, sql, params).await;
        drop(guard);
        outcome
    };
    drop(tx);
    match outcome {
        Ok(()) => AccessResult::default(),
        Err(err) => AccessResult::failed(&err.to_string()),
    }
}

/// Auto-commit wrapper for a single mutation. Any failure after `BEGIN`
/// rolls the implicit transaction back before the error is surfaced.
async fn run_in_implicit_transaction(
    entry: &DbEntry,
    sql: &str,
    params: &[ParamValue],
) -> Result<(), DataAccessError> {
    entry.worker.begin().await?;
    match run_mutation(entry, sql, params).await {
        Ok(()) => entry.worker.commit().await,
        Err(err) => {
            let _ = entry.worker.rollback().await;
            Err(err)
        }
    }
}

async fn run_mutation(
    entry: &DbEntry,
    sql: &str,
    params: &[ParamValue],
) -> Result<(), DataAccessError> {
    if params.is_empty() {
        entry.worker.run_batch(sql.to_owned()).await
    } else {
        let converted = SqliteParams::convert(params);
        entry
            .worker
            .run_dml(sql.to_owned(), converted.0)
            .await
            .map(|_rows_affected| ())
    }
}
