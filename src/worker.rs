use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::{Connection, ToSql};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::DataAccessError;
use crate::query::build_access_result;
use crate::results::AccessResult;

/// Handle to a database connection owned by a dedicated worker thread.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so the connection lives
/// on its own thread and callers talk to it over a channel, awaiting replies
/// on oneshot channels. Statements therefore execute in dispatch order on
/// one connection, and a transaction opened with [`begin`](Self::begin)
/// stays open across commands until [`commit`](Self::commit) or
/// [`rollback`](Self::rollback).
pub(crate) struct ConnectionWorker {
    sender: Sender<Command>,
}

impl ConnectionWorker {
    /// Open the database file and spawn its worker thread.
    ///
    /// The file is created if necessary, matching the embedded engine's
    /// create-if-missing open mode.
    ///
    /// # Errors
    /// Returns [`DataAccessError::SqliteError`] if the file cannot be opened
    /// and [`DataAccessError::ConnectionError`] if the thread cannot be
    /// spawned.
    pub(crate) fn open(name: &str, path: &Path) -> Result<Self, DataAccessError> {
        let conn = Connection::open(path)?;
        let (sender, receiver) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name(format!("sqlite-worker-{name}"))
            .spawn(move || run_connection_worker(&conn, &receiver))
            .map_err(|err| {
                DataAccessError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;
        debug!(database = name, "opened database connection");
        Ok(Self { sender })
    }

    /// Run a read statement with string-typed bind values and capture its
    /// rows.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] produced while preparing or walking
    /// the statement, or if the worker channel is closed.
    pub(crate) async fn run_select(
        &self,
        sql: String,
        params: Vec<String>,
    ) -> Result<AccessResult, DataAccessError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::RunSelect {
            sql,
            params,
            respond_to: tx,
        })?;
        rx.await
            .map_err(|_| worker_dropped("while running a select"))?
    }

    /// Run a mutating statement with typed bind values, returning the
    /// affected row count.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] reported while executing the
    /// statement, or if the worker channel is closed.
    pub(crate) async fn run_dml(
        &self,
        sql: String,
        params: Vec<rusqlite::types::Value>,
    ) -> Result<usize, DataAccessError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::RunDml {
            sql,
            params,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| worker_dropped("while running dml"))?
    }

    /// Run a literal statement string with no bind parameters.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] reported while executing the batch,
    /// or if the worker channel is closed.
    pub(crate) async fn run_batch(&self, sql: String) -> Result<(), DataAccessError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::RunBatch {
            sql,
            respond_to: tx,
        })?;
        rx.await
            .map_err(|_| worker_dropped("while running a batch"))?
    }

    /// Begin a native transaction on the worker's connection.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] from the engine, or if the worker
    /// channel is closed.
    pub(crate) async fn begin(&self) -> Result<(), DataAccessError> {
        self.transaction_control(TxControl::Begin).await
    }

    /// Commit the open native transaction.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] from the engine, or if the worker
    /// channel is closed.
    pub(crate) async fn commit(&self) -> Result<(), DataAccessError> {
        self.transaction_control(TxControl::Commit).await
    }

    /// Roll back the open native transaction.
    ///
    /// # Errors
    /// Returns any [`DataAccessError`] from the engine, or if the worker
    /// channel is closed.
    pub(crate) async fn rollback(&self) -> Result<(), DataAccessError> {
        self.transaction_control(TxControl::Rollback).await
    }

    /// Close the connection and stop the worker thread, waiting for
    /// acknowledgement.
    ///
    /// # Errors
    /// Returns [`DataAccessError::ConnectionError`] if the worker is already
    /// gone.
    pub(crate) async fn close(&self) -> Result<(), DataAccessError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Close { respond_to: tx })?;
        rx.await.map_err(|_| worker_dropped("while closing"))
    }

    async fn transaction_control(&self, control: TxControl) -> Result<(), DataAccessError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Transaction {
            control,
            respond_to: tx,
        })?;
        rx.await
            .map_err(|_| worker_dropped("during transaction control"))?
    }

    fn send_command(&self, command: Command) -> Result<(), DataAccessError> {
        self.sender
            .send(command)
            .map_err(|_| DataAccessError::ConnectionError("SQLite worker closed".into()))
    }
}

impl Drop for ConnectionWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn worker_dropped(when: &str) -> DataAccessError {
    DataAccessError::ConnectionError(format!("SQLite worker dropped {when}"))
}

#[derive(Debug, Clone, Copy)]
enum TxControl {
    Begin,
    Commit,
    Rollback,
}

impl TxControl {
    fn sql(self) -> &'static str {
        match self {
            TxControl::Begin => "BEGIN",
            TxControl::Commit => "COMMIT",
            TxControl::Rollback => "ROLLBACK",
        }
    }
}

enum Command {
    RunSelect {
        sql: String,
        params: Vec<String>,
        respond_to: oneshot::Sender<Result<AccessResult, DataAccessError>>,
    },
    RunDml {
        sql: String,
        params: Vec<rusqlite::types::Value>,
        respond_to: oneshot::Sender<Result<usize, DataAccessError>>,
    },
    RunBatch {
        sql: String,
        respond_to: oneshot::Sender<Result<(), DataAccessError>>,
    },
    Transaction {
        control: TxControl,
        respond_to: oneshot::Sender<Result<(), DataAccessError>>,
    },
    Close {
        respond_to: oneshot::Sender<()>,
    },
    Shutdown,
}

fn run_connection_worker(conn: &Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::RunSelect {
                sql,
                params,
                respond_to,
            } => {
                let outcome = conn
                    .prepare(&sql)
                    .map_err(DataAccessError::from)
                    .and_then(|mut stmt| build_access_result(&mut stmt, &params));
                let _ = respond_to.send(outcome);
            }
            Command::RunDml {
                sql,
                params,
                respond_to,
            } => {
                // No implicit rusqlite transaction here: the access layer
                // drives BEGIN/COMMIT/ROLLBACK so a statement can join an
                // already-open explicit transaction.
                let outcome = (|| -> Result<usize, DataAccessError> {
                    let param_refs: Vec<&dyn ToSql> =
                        params.iter().map(|value| value as &dyn ToSql).collect();
                    let mut stmt = conn.prepare(&sql)?;
                    Ok(stmt.execute(&param_refs[..])?)
                })();
                let _ = respond_to.send(outcome);
            }
            Command::RunBatch { sql, respond_to } => {
                let outcome = conn.execute_batch(&sql).map_err(DataAccessError::from);
                let _ = respond_to.send(outcome);
            }
            Command::Transaction {
                control,
                respond_to,
            } => {
                let outcome = conn
                    .execute_batch(control.sql())
                    .map_err(DataAccessError::from);
                let _ = respond_to.send(outcome);
            }
            Command::Close { respond_to } => {
                debug!("closing worker connection");
                let _ = respond_to.send(());
                break;
            }
            Command::Shutdown => break,
        }
    }
}
