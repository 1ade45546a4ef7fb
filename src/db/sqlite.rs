//! SQLite implementation of the storage traits

use std::{cell::RefCell, path::Path, rc::Rc, vec};

use rusqlite::{
    Connection,
    types::{FromSql, Value, ValueRef},
};

use super::{BoxStatement, Database, cursor::BoxCursor, cursor::Cursor, statement::Statement};
use crate::error::{Error, Result};

/// Prepared statement shared between a [`SqliteStatement`] and the cursors it
/// opened. SQLite finalizes it when the last owner drops.
type SharedStatement<'conn> = Rc<RefCell<rusqlite::Statement<'conn>>>;

/// SQLite-backed [`Database`]
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        tracing::debug!("Opened in-memory database");
        Ok(Self { conn })
    }

    /// Same as [`Database::create_statement`] without boxing.
    pub fn prepare(&self, sql: &str) -> Result<SqliteStatement<'_>> {
        SqliteStatement::new(&self.conn, sql)
    }
}

impl Drop for SqliteDatabase {
    fn drop(&mut self) {
        tracing::debug!("Database closed");
    }
}

impl Database for SqliteDatabase {
    fn create_statement<'conn>(&'conn self, sql: &str) -> Result<BoxStatement<'conn>> {
        Ok(Box::new(self.prepare(sql)?))
    }

    fn execute_transaction(&self, body: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        if !self.conn.is_autocommit() {
            tracing::trace!("Joining the enclosing transaction");
            return body();
        }

        // Dropping the guard without commit rolls back.
        let tx = self.conn.unchecked_transaction()?;
        if let Err(err) = body() {
            tracing::warn!("Rolling back transaction: {}", err);
            return Err(err);
        }
        tx.commit()?;
        tracing::debug!("Transaction committed");
        Ok(())
    }
}

/// A prepared SQLite statement
pub struct SqliteStatement<'conn> {
    handle: SharedStatement<'conn>,
}

impl<'conn> SqliteStatement<'conn> {
    fn new(conn: &'conn Connection, sql: &str) -> Result<Self> {
        // SQLite prepares nothing out of blank input and reports success.
        if sql.trim().is_empty() {
            return Err(Error::EmptyStatement(sql.to_string()));
        }
        let stmt = conn.prepare(sql)?;
        tracing::trace!("Prepared statement: {}", sql);
        Ok(Self {
            handle: Rc::new(RefCell::new(stmt)),
        })
    }

    /// Number of owners of the prepared handle: this statement plus every
    /// cursor still alive.
    pub fn use_count(&self) -> usize {
        Rc::strong_count(&self.handle)
    }

    fn first_value<T: FromSql>(&mut self) -> Result<Option<T>> {
        let mut stmt = self.handle.borrow_mut();
        let mut rows = stmt.raw_query();
        let value = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(value)
    }
}

impl<'conn> Statement<'conn> for SqliteStatement<'conn> {
    fn bind_int(&mut self, index: usize, value: i64) -> Result<()> {
        self.handle.borrow_mut().raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn bind_double(&mut self, index: usize, value: f64) -> Result<()> {
        self.handle.borrow_mut().raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn bind_string(&mut self, index: usize, value: &str) -> Result<()> {
        self.handle.borrow_mut().raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn bind_bool(&mut self, index: usize, value: bool) -> Result<()> {
        self.handle.borrow_mut().raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn execute_void(&mut self) -> Result<()> {
        let mut stmt = self.handle.borrow_mut();
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
        Ok(())
    }

    fn execute_int(&mut self) -> Result<i64> {
        self.first_value()?
            .ok_or(Error::Storage(rusqlite::Error::QueryReturnedNoRows))
    }

    fn execute_optional_int(&mut self) -> Result<Option<i64>> {
        Ok(self.first_value::<Option<i64>>()?.flatten())
    }

    fn execute_optional_string(&mut self) -> Result<Option<String>> {
        Ok(self.first_value::<Option<String>>()?.flatten())
    }

    fn execute_cursor(&mut self) -> Result<BoxCursor<'conn>> {
        let mut stmt = self.handle.borrow_mut();
        let column_count = stmt.column_count();
        let mut buffered = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let values = (0..column_count)
                .map(|index| row.get::<_, Value>(index))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            buffered.push(values);
        }
        drop(rows);
        drop(stmt);

        Ok(Box::new(SqliteCursor {
            _statement: Rc::clone(&self.handle),
            rows: buffered.into_iter(),
            current: None,
            column_count,
        }))
    }
}

/// Cursor over the rows of a [`SqliteStatement`].
///
/// Rows are read out of SQLite when the cursor is opened, which resets the
/// statement for the next execution; the cursor then walks them forward only.
pub struct SqliteCursor<'conn> {
    _statement: SharedStatement<'conn>,
    rows: vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
    column_count: usize,
}

impl SqliteCursor<'_> {
    fn value<T: FromSql>(&self, index: usize) -> Result<T> {
        let row = self.current.as_ref().ok_or(Error::CursorNotPositioned)?;
        let value = row.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: self.column_count,
        })?;
        T::column_result(ValueRef::from(value)).map_err(|source| Error::ColumnType { index, source })
    }
}

impl Cursor for SqliteCursor<'_> {
    fn next(&mut self) -> Result<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn is_positioned(&self) -> bool {
        self.current.is_some()
    }

    fn get_int(&self, index: usize) -> Result<i64> {
        self.value(index)
    }

    fn get_double(&self, index: usize) -> Result<f64> {
        self.value(index)
    }

    fn get_string(&self, index: usize) -> Result<String> {
        self.value(index)
    }

    fn get_bool(&self, index: usize) -> Result<bool> {
        self.value(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CursorExt, StatementExt};

    fn sample_db() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.create_statement(
            "CREATE TABLE samples (id INTEGER NOT NULL, ratio REAL NOT NULL, name TEXT NOT NULL, flag INTEGER NOT NULL)",
        )
        .unwrap()
        .execute::<()>()
        .unwrap();
        db
    }

    fn insert_sample(db: &SqliteDatabase, id: i64, ratio: f64, name: &str, flag: bool) {
        let mut stmt = db
            .create_statement("INSERT INTO samples (id, ratio, name, flag) VALUES (?1, ?2, ?3, ?4)")
            .unwrap();
        stmt.bind(1, id).unwrap();
        stmt.bind(2, ratio).unwrap();
        stmt.bind(3, name).unwrap();
        stmt.bind(4, flag).unwrap();
        stmt.execute::<()>().unwrap();
    }

    fn count_samples(db: &SqliteDatabase) -> i64 {
        db.create_statement("SELECT COUNT(*) FROM samples")
            .unwrap()
            .execute()
            .unwrap()
    }

    #[test]
    fn test_cursor_reads_typed_columns() {
        let db = sample_db();
        insert_sample(&db, 1, 0.5, "first", true);
        insert_sample(&db, 2, 1.5, "second", false);

        let mut stmt = db
            .create_statement("SELECT id, ratio, name, flag FROM samples ORDER BY id")
            .unwrap();
        let mut cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert_eq!(cursor.column_count(), 4);

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 1);
        assert_eq!(cursor.get::<f64>(1).unwrap(), 0.5);
        assert_eq!(cursor.get::<String>(2).unwrap(), "first");
        assert!(cursor.get::<bool>(3).unwrap());

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.get::<String>(2).unwrap(), "second");
        assert!(!cursor.get::<bool>(3).unwrap());

        assert!(!cursor.next().unwrap());
    }

    #[test]
    fn test_cursor_get_before_next_fails() {
        let db = sample_db();
        insert_sample(&db, 1, 0.0, "row", true);

        let mut stmt = db.create_statement("SELECT id, ratio, name FROM samples").unwrap();
        let cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert!(matches!(cursor.get::<i64>(0), Err(Error::CursorNotPositioned)));
    }

    #[test]
    fn test_cursor_index_out_of_bounds() {
        let db = sample_db();
        insert_sample(&db, 1, 0.0, "row", true);

        let mut stmt = db.create_statement("SELECT id, ratio, name FROM samples").unwrap();
        let mut cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert!(cursor.next().unwrap());
        assert!(matches!(
            cursor.get::<i64>(99),
            Err(Error::IndexOutOfBounds { index: 99, count: 3 })
        ));
    }

    #[test]
    fn test_cursor_stays_exhausted() {
        let db = sample_db();
        insert_sample(&db, 1, 0.0, "row", true);

        let mut stmt = db.create_statement("SELECT id FROM samples").unwrap();
        let mut cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert!(cursor.next().unwrap());
        assert!(!cursor.next().unwrap());
        assert!(!cursor.next().unwrap());
        assert!(matches!(cursor.get::<i64>(0), Err(Error::CursorNotPositioned)));
    }

    #[test]
    fn test_cursor_type_mismatch() {
        let db = sample_db();
        insert_sample(&db, 1, 0.0, "text", true);

        let mut stmt = db.create_statement("SELECT name FROM samples").unwrap();
        let mut cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert!(cursor.next().unwrap());
        assert!(matches!(
            cursor.get::<i64>(0),
            Err(Error::ColumnType { index: 0, .. })
        ));
    }

    #[test]
    fn test_cursor_outlives_statement() {
        let db = sample_db();
        insert_sample(&db, 7, 0.0, "kept", true);

        let mut stmt = db.prepare("SELECT id, name FROM samples").unwrap();
        assert_eq!(stmt.use_count(), 1);

        let cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        assert_eq!(stmt.use_count(), 2);
        drop(cursor);
        assert_eq!(stmt.use_count(), 1);

        let mut cursor = stmt.execute::<BoxCursor<'_>>().unwrap();
        drop(stmt);
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 7);
        assert_eq!(cursor.get::<String>(1).unwrap(), "kept");
    }

    #[test]
    fn test_scalar_modes() {
        let db = sample_db();
        insert_sample(&db, 3, 0.0, "three", true);

        let mut stmt = db.create_statement("SELECT name FROM samples WHERE id = ?1").unwrap();
        stmt.bind(1, 3_i64).unwrap();
        assert_eq!(stmt.execute::<Option<String>>().unwrap().as_deref(), Some("three"));
        stmt.bind(1, 4_i64).unwrap();
        assert_eq!(stmt.execute::<Option<String>>().unwrap(), None);

        let mut stmt = db.create_statement("SELECT id FROM samples WHERE name = ?1").unwrap();
        stmt.bind(1, "three").unwrap();
        assert_eq!(stmt.execute::<Option<i64>>().unwrap(), Some(3));
        assert_eq!(stmt.execute::<i64>().unwrap(), 3);

        stmt.bind(1, String::from("missing")).unwrap();
        assert_eq!(stmt.execute::<Option<i64>>().unwrap(), None);
        assert!(matches!(
            stmt.execute::<i64>(),
            Err(Error::Storage(rusqlite::Error::QueryReturnedNoRows))
        ));
    }

    #[test]
    fn test_pragma_read_and_write() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let version: i64 = db.create_statement("PRAGMA user_version").unwrap().execute().unwrap();
        assert_eq!(version, 0);

        db.create_statement("PRAGMA user_version = 3")
            .unwrap()
            .execute::<()>()
            .unwrap();
        let version: i64 = db.create_statement("PRAGMA user_version").unwrap().execute().unwrap();
        assert_eq!(version, 3);
    }

    #[test]
    fn test_empty_statement_is_rejected() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.create_statement("   "),
            Err(Error::EmptyStatement(_))
        ));
    }

    #[test]
    fn test_invalid_sql_is_a_storage_error() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.create_statement("SELECT FROM nowhere WHERE"),
            Err(Error::Storage(_))
        ));
    }

    #[test]
    fn test_transaction_commits() {
        let db = sample_db();
        db.execute_transaction(&mut || {
            insert_sample(&db, 1, 0.0, "a", true);
            insert_sample(&db, 2, 0.0, "b", true);
            Ok(())
        })
        .unwrap();
        assert_eq!(count_samples(&db), 2);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = sample_db();
        let result = db.execute_transaction(&mut || {
            insert_sample(&db, 1, 0.0, "a", true);
            Err(Error::NoteNotFound(1))
        });
        assert!(matches!(result, Err(Error::NoteNotFound(1))));
        assert_eq!(count_samples(&db), 0);

        // The connection is usable again after the rollback.
        insert_sample(&db, 2, 0.0, "b", true);
        assert_eq!(count_samples(&db), 1);
    }

    #[test]
    fn test_nested_transaction_joins_outer() {
        let db = sample_db();
        let result = db.execute_transaction(&mut || {
            db.execute_transaction(&mut || {
                insert_sample(&db, 1, 0.0, "inner", true);
                Ok(())
            })?;
            Err(Error::NoteNotFound(9))
        });
        assert!(result.is_err());
        assert_eq!(count_samples(&db), 0);
    }
}
