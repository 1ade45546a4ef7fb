use rusqlite::types::FromSqlError;

use crate::domain::draft::MutableDraft;

/// Result type alias for notes storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the storage layer and the repositories built on it
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any failure reported by SQLite while preparing, binding, stepping or
    /// controlling a transaction.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Incomplete draft{}: {draft:?}", describe_id(.id))]
    IncompleteDraft {
        id: Option<i64>,
        draft: MutableDraft,
    },

    #[error("Cursor is not positioned on a row, next() must return true first")]
    CursorNotPositioned,

    #[error("Column index {index} out of bounds (column count is {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("Column {index} can't be converted: {source}")]
    ColumnType {
        index: usize,
        #[source]
        source: FromSqlError,
    },

    #[error("Can't generate any statement from the query \"{0}\"")]
    EmptyStatement(String),

    #[error("Can't downgrade database from version {current} to version {target}")]
    SchemaDowngrade { current: i64, target: i64 },

    #[error("Note {0} not found")]
    NoteNotFound(i64),
}

fn describe_id(id: &Option<i64>) -> String {
    match id {
        Some(id) => format!(" for note {id}"),
        None => String::new(),
    }
}
