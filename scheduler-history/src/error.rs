use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error backing up {path}: {source}")]
    Backup {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no period recorded with slug '{0}'")]
    UnknownPeriod(String),

    #[error("history store already initialized for this process")]
    AlreadyInitialized,

    #[error("history store not initialized; call HistoryStore::open first")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, HistoryError>;
