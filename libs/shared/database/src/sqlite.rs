use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::error::{DatabaseError, Result};
use crate::schema;

const MEMORY_PATH: &str = ":memory:";

/// Process-scoped handle to the SQLite store.
///
/// Cloning is cheap; all clones share one connection. Work runs on the
/// blocking thread pool so handlers never stall the async runtime, and the
/// connection mutex serializes statements and transactions.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl Database {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.database_file == MEMORY_PATH {
            Self::open_in_memory()
        } else {
            Self::open(&config.database_file)
        }
    }

    /// Open or create the database file and initialize the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    DatabaseError::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| DatabaseError::Open {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        schema::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self::wrap(path, conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::Open {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize_schema(&conn)?;

        Ok(Self::wrap(PathBuf::from(MEMORY_PATH), conn))
    }

    fn wrap(path: PathBuf, conn: Connection) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                conn: Mutex::new(Some(conn)),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Connection) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let mut guard = inner.conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            let conn = guard.as_mut().ok_or(DatabaseError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| E::from(DatabaseError::TaskFailed(e.to_string())))?
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// The transaction commits only when `f` returns `Ok`; any error, including
    /// domain errors raised by `f`, rolls everything back.
    pub async fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
    {
        self.call(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(DatabaseError::from)?;

            match f(&tx) {
                Ok(value) => {
                    tx.commit().map_err(DatabaseError::from)?;
                    Ok(value)
                }
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback() {
                        warn!("Transaction rollback failed: {}", rollback_err);
                    }
                    Err(e)
                }
            }
        })
        .await
    }

    /// Cheap connectivity probe used by the health check.
    pub async fn ping(&self) -> Result<()> {
        self.call(|conn| {
            let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            if one == 1 {
                Ok(())
            } else {
                Err(DatabaseError::InvalidData(format!("SELECT 1 returned {one}")))
            }
        })
        .await
    }

    /// Close the connection. Later calls on any clone fail with `Closed`.
    pub async fn close(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let mut guard = inner.conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            match guard.take() {
                Some(conn) => {
                    conn.close().map_err(|(_, e)| DatabaseError::from(e))?;
                    info!("Database connection closed");
                    Ok(())
                }
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| DatabaseError::TaskFailed(e.to_string()))?
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .conn
            .lock()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_ping_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.ping().await.unwrap();
        assert_eq!(db.path(), Path::new(MEMORY_PATH));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: std::result::Result<(), DatabaseError> = db
            .transaction(|tx| {
                tx.execute(
                    "INSERT INTO metadata (key, value) VALUES ('probe', '1')",
                    [],
                )?;
                Err(DatabaseError::InvalidData("abort".into()))
            })
            .await;
        assert_matches!(result, Err(DatabaseError::InvalidData(_)));

        let count: i64 = db
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM metadata WHERE key = 'probe'", [], |row| row.get(0))
                    .map_err(DatabaseError::from)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let db = Database::open_in_memory().unwrap();

        db.transaction(|tx| {
            tx.execute("INSERT INTO metadata (key, value) VALUES ('probe', '1')", [])
                .map_err(DatabaseError::from)
        })
        .await
        .unwrap();

        let value: String = db
            .call(|conn| {
                conn.query_row("SELECT value FROM metadata WHERE key = 'probe'", [], |row| row.get(0))
                    .map_err(DatabaseError::from)
            })
            .await
            .unwrap();
        assert_eq!(value, "1");
    }

    #[tokio::test]
    async fn test_close_rejects_later_calls() {
        let db = Database::open_in_memory().unwrap();
        let clone = db.clone();

        db.close().await.unwrap();
        assert!(clone.is_closed());
        assert_matches!(clone.ping().await, Err(DatabaseError::Closed));
        // closing twice is harmless
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clinic.db");

        let db = Database::open(&path).unwrap();
        db.ping().await.unwrap();
        assert!(path.exists());
        db.close().await.unwrap();
    }
}
