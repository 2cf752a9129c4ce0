use thiserror::Error;

// SQLite primary result codes; extended codes carry them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CORRUPT: i32 = 11;
const SQLITE_NOTADB: i32 = 26;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Write contention outlasted the busy timeout. Safe to retry.
    #[error("storage is busy")]
    Busy(#[source] sqlx::Error),

    #[error("storage is unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// A stored row no longer satisfies the domain invariants.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage I/O error")]
    Io(#[from] std::io::Error),

    #[error("query failed")]
    Query(#[source] sqlx::Error),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Busy(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match primary_code(&err) {
            Some(SQLITE_BUSY | SQLITE_LOCKED) => return StorageError::Busy(err),
            Some(SQLITE_CORRUPT | SQLITE_NOTADB) => return StorageError::Unavailable(err),
            _ => {}
        }

        match err {
            sqlx::Error::PoolTimedOut => StorageError::Busy(err),
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                StorageError::Unavailable(err)
            }
            other => StorageError::Query(other),
        }
    }
}

fn primary_code(err: &sqlx::Error) -> Option<i32> {
    let code = err.as_database_error()?.code()?;
    code.parse::<i32>().ok().map(|c| c & 0xff)
}

pub type StorageResult<T> = Result<T, StorageError>;
