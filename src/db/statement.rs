//! Prepared statements with typed binding and typed execution.
//!
//! An engine implements the handful of primitives on [`Statement`]. Callers go
//! through [`StatementExt::bind`] and [`StatementExt::execute`], which pick the
//! primitive from the Rust type of the value or of the requested result:
//!
//! ```ignore
//! let mut stmt = db.create_statement("SELECT title FROM notes WHERE id = ?1")?;
//! stmt.bind(1, 42_i64)?;
//! let title: Option<String> = stmt.execute()?;
//! ```

use super::cursor::BoxCursor;
use crate::error::Result;

/// Engine primitives behind a prepared statement. Positions are 1-based.
pub trait Statement<'conn> {
    fn bind_int(&mut self, index: usize, value: i64) -> Result<()>;

    fn bind_double(&mut self, index: usize, value: f64) -> Result<()>;

    fn bind_string(&mut self, index: usize, value: &str) -> Result<()>;

    fn bind_bool(&mut self, index: usize, value: bool) -> Result<()>;

    /// Runs the statement, discarding any row it yields.
    fn execute_void(&mut self) -> Result<()>;

    /// Reads the first column of the single row the statement must yield.
    fn execute_int(&mut self) -> Result<i64>;

    fn execute_optional_int(&mut self) -> Result<Option<i64>>;

    fn execute_optional_string(&mut self) -> Result<Option<String>>;

    /// Opens a cursor positioned before the first row. The cursor keeps the
    /// prepared statement alive on its own.
    fn execute_cursor(&mut self) -> Result<BoxCursor<'conn>>;
}

/// Values that can be bound to a statement parameter.
pub trait Bind {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize)
    -> Result<()>;
}

impl Bind for i64 {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize) -> Result<()> {
        stmt.bind_int(index, self)
    }
}

impl Bind for f64 {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize) -> Result<()> {
        stmt.bind_double(index, self)
    }
}

impl Bind for &str {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize) -> Result<()> {
        stmt.bind_string(index, self)
    }
}

impl Bind for String {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize) -> Result<()> {
        stmt.bind_string(index, &self)
    }
}

impl Bind for bool {
    fn bind_to<'conn, S: Statement<'conn> + ?Sized>(self, stmt: &mut S, index: usize) -> Result<()> {
        stmt.bind_bool(index, self)
    }
}

/// Result shapes a statement can be executed into.
pub trait Execute<'conn>: Sized {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self>;
}

impl<'conn> Execute<'conn> for () {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self> {
        stmt.execute_void()
    }
}

impl<'conn> Execute<'conn> for i64 {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self> {
        stmt.execute_int()
    }
}

impl<'conn> Execute<'conn> for Option<i64> {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self> {
        stmt.execute_optional_int()
    }
}

impl<'conn> Execute<'conn> for Option<String> {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self> {
        stmt.execute_optional_string()
    }
}

impl<'conn> Execute<'conn> for BoxCursor<'conn> {
    fn execute_on<S: Statement<'conn> + ?Sized>(stmt: &mut S) -> Result<Self> {
        stmt.execute_cursor()
    }
}

/// Typed front end over the [`Statement`] primitives.
pub trait StatementExt<'conn>: Statement<'conn> {
    fn bind<T: Bind>(&mut self, index: usize, value: T) -> Result<()> {
        value.bind_to(self, index)
    }

    fn execute<R: Execute<'conn>>(&mut self) -> Result<R> {
        R::execute_on(self)
    }
}

impl<'conn, S: Statement<'conn> + ?Sized> StatementExt<'conn> for S {}
