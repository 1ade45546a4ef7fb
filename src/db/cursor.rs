//! Forward-only cursor over the rows produced by a statement.
//!
//! [`Cursor`] is the small set of primitives an engine has to provide;
//! [`CursorExt::get`] is the typed front end callers use.

use crate::error::{Error, Result};

/// Row-by-row access to a result set.
pub trait Cursor {
    /// Moves to the next row. Returns `false` once the rows are exhausted,
    /// and keeps returning `false` afterwards.
    fn next(&mut self) -> Result<bool>;

    fn column_count(&self) -> usize;

    /// Whether the cursor currently sits on a row.
    fn is_positioned(&self) -> bool;

    fn get_int(&self, index: usize) -> Result<i64>;

    fn get_double(&self, index: usize) -> Result<f64>;

    fn get_string(&self, index: usize) -> Result<String>;

    fn get_bool(&self, index: usize) -> Result<bool>;
}

/// Boxed cursor borrowing the connection it reads from.
pub type BoxCursor<'conn> = Box<dyn Cursor + 'conn>;

/// Column types a cursor can hand out.
pub trait Column: Sized {
    fn read_from<C: Cursor + ?Sized>(cursor: &C, index: usize) -> Result<Self>;
}

impl Column for i64 {
    fn read_from<C: Cursor + ?Sized>(cursor: &C, index: usize) -> Result<Self> {
        cursor.get_int(index)
    }
}

impl Column for f64 {
    fn read_from<C: Cursor + ?Sized>(cursor: &C, index: usize) -> Result<Self> {
        cursor.get_double(index)
    }
}

impl Column for String {
    fn read_from<C: Cursor + ?Sized>(cursor: &C, index: usize) -> Result<Self> {
        cursor.get_string(index)
    }
}

impl Column for bool {
    fn read_from<C: Cursor + ?Sized>(cursor: &C, index: usize) -> Result<Self> {
        cursor.get_bool(index)
    }
}

/// Typed column access with the positioning and bounds checks every cursor
/// needs.
pub trait CursorExt: Cursor {
    fn get<T: Column>(&self, index: usize) -> Result<T> {
        if !self.is_positioned() {
            return Err(Error::CursorNotPositioned);
        }
        let count = self.column_count();
        if index >= count {
            return Err(Error::IndexOutOfBounds { index, count });
        }
        T::read_from(self, index)
    }
}

impl<C: Cursor + ?Sized> CursorExt for C {}
