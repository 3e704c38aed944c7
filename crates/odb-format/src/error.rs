use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors raised while reading, writing or routing ODB containers.
#[derive(Debug, Error)]
pub enum OdbError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Pre-flight failure, one entry per missing file name.
    #[error("Missing Files: {}.", .0.join(", "))]
    MissingFiles(Vec<String>),

    /// The container ended inside a record header or payload.
    #[error("unexpected eof: {0}")]
    UnexpectedEof(String),

    #[error("line of {len} bytes in table {table} does not fit a record (max 65535)")]
    LineTooLong { table: u8, len: usize },

    /// A record references a slot with no file name in the active list.
    #[error("table index {0} has no file name for this schema")]
    UndefinedTable(u8),

    #[error("fingerprint record is missing column 3: {0:?}")]
    MissingColumn(String),

    #[error("schema version is unknown, detect it before asking for table names")]
    UnknownVersion,

    #[error("{0} table slots do not fit a one byte table index")]
    TooManyTables(usize),

    #[error("invalid database config: {0}")]
    Config(String),
}

pub type OdbResult<T> = std::result::Result<T, OdbError>;

impl OdbError {
    #[inline]
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        OdbError::File {
            path: path.into(),
            source,
        }
    }

    /// Attach `path` to a bare I/O error, leave the rest untouched.
    pub(crate) fn at(self, path: &Path) -> Self {
        match self {
            OdbError::Io(source) => OdbError::file(path, source),
            other => other,
        }
    }
}
