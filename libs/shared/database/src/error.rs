use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("schema migration failed: {0}")]
    Migration(String),

    #[error("database connection is closed")]
    Closed,

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    TaskFailed(String),
}
