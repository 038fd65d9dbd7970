use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("schema migration to version {version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// Maps constraint failures on insert: unique keys become `AlreadyExists`,
    /// dangling references become `BadRequest`. Anything else stays a
    /// database error.
    pub(crate) fn from_insert(err: rusqlite::Error, what: impl Into<String>) -> Self {
        use rusqlite::ffi::{
            SQLITE_CONSTRAINT_FOREIGNKEY, SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE,
        };

        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Error::AlreadyExists(what.into())
            }
            rusqlite::Error::SqliteFailure(e, _) if e.extended_code == SQLITE_CONSTRAINT_FOREIGNKEY => {
                Error::BadRequest(format!("{} references a missing row", what.into()))
            }
            e => Error::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
