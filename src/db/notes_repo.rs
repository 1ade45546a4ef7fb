use chrono::Local;

use super::{BoxCursor, Cursor, CursorExt, Database, StatementExt};
use crate::domain::{draft::Draft, note::Note};
use crate::error::{Error, Result};

const SELECT_NOTES: &str = "SELECT id, title, description, last_update_date FROM notes";

/// Committed notes, stored in the `notes` table.
pub struct NotesRepository<'db> {
    db: &'db dyn Database,
}

impl<'db> NotesRepository<'db> {
    pub fn new(db: &'db dyn Database) -> Self {
        Self { db }
    }

    /// Inserts a note and returns its id.
    pub fn insert(&self, draft: &Draft) -> Result<i64> {
        let now = Local::now().to_rfc3339();
        let mut stmt = self.db.create_statement(
            "INSERT INTO notes (title, description, last_update_date) VALUES (?1, ?2, ?3)",
        )?;
        stmt.bind(1, draft.title())?;
        stmt.bind(2, draft.description())?;
        stmt.bind(3, now)?;
        stmt.execute::<()>()?;

        let id: i64 = self
            .db
            .create_statement("SELECT last_insert_rowid()")?
            .execute()?;
        tracing::debug!("Inserted note {}", id);
        Ok(id)
    }

    pub fn update(&self, id: i64, draft: &Draft) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let mut stmt = self.db.create_statement(
            "UPDATE notes SET title = ?1, description = ?2, last_update_date = ?3 WHERE id = ?4",
        )?;
        stmt.bind(1, draft.title())?;
        stmt.bind(2, draft.description())?;
        stmt.bind(3, now)?;
        stmt.bind(4, id)?;
        stmt.execute::<()>()?;
        self.require_changed(id)
    }

    /// Deletes note `id`, failing with [`Error::NoteNotFound`] when there is
    /// no such note.
    pub fn delete_with_id(&self, id: i64) -> Result<()> {
        let mut stmt = self.db.create_statement("DELETE FROM notes WHERE id = ?1")?;
        stmt.bind(1, id)?;
        stmt.execute::<()>()?;
        self.require_changed(id)?;
        tracing::debug!("Deleted note {}", id);
        Ok(())
    }

    pub fn delete_all(&self) -> Result<()> {
        self.db.create_statement("DELETE FROM notes")?.execute()
    }

    pub fn get(&self, id: i64) -> Result<Option<Note>> {
        let mut stmt = self
            .db
            .create_statement(&format!("{SELECT_NOTES} WHERE id = ?1"))?;
        stmt.bind(1, id)?;
        let mut cursor = stmt.execute::<BoxCursor<'_>>()?;
        Ok(read_notes(&mut *cursor)?.pop())
    }

    pub fn get_all(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .db
            .create_statement(&format!("{SELECT_NOTES} ORDER BY id"))?;
        let mut cursor = stmt.execute::<BoxCursor<'_>>()?;
        read_notes(&mut *cursor)
    }

    /// Notes whose title or description contains `text`, ignoring ASCII case.
    pub fn get_by_text(&self, text: &str) -> Result<Vec<Note>> {
        let mut stmt = self.db.create_statement(&format!(
            "{SELECT_NOTES}
             WHERE instr(lower(title), lower(?1)) > 0 OR instr(lower(description), lower(?1)) > 0
             ORDER BY id"
        ))?;
        stmt.bind(1, text)?;
        let mut cursor = stmt.execute::<BoxCursor<'_>>()?;
        read_notes(&mut *cursor)
    }

    fn require_changed(&self, id: i64) -> Result<()> {
        let changed: i64 = self.db.create_statement("SELECT changes()")?.execute()?;
        if changed == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}

fn read_notes(cursor: &mut dyn Cursor) -> Result<Vec<Note>> {
    let mut notes = Vec::new();
    while cursor.next()? {
        notes.push(Note {
            id: cursor.get(0)?,
            title: cursor.get(1)?,
            description: cursor.get(2)?,
            last_update_date: cursor.get(3)?,
        });
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SqliteDatabase, schema};

    fn test_db() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        schema::initialize(&db).unwrap();
        db
    }

    #[test]
    fn test_note_crud() {
        let db = test_db();
        let repository = NotesRepository::new(&db);

        let id = repository.insert(&Draft::new("groceries", "milk, eggs")).unwrap();
        let note = repository.get(id).unwrap().unwrap();
        assert_eq!(note.title, "groceries");
        assert_eq!(note.description, "milk, eggs");
        assert!(!note.last_update_date.is_empty());

        repository.update(id, &Draft::new("groceries", "bread")).unwrap();
        assert_eq!(repository.get(id).unwrap().unwrap().description, "bread");

        repository.delete_with_id(id).unwrap();
        assert_eq!(repository.get(id).unwrap(), None);
    }

    #[test]
    fn test_ids_increase() {
        let db = test_db();
        let repository = NotesRepository::new(&db);
        let first = repository.insert(&Draft::new("a", "")).unwrap();
        let second = repository.insert(&Draft::new("b", "")).unwrap();
        assert!(second > first);

        let titles: Vec<_> = repository
            .get_all()
            .unwrap()
            .into_iter()
            .map(|note| note.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_update_missing_note() {
        let db = test_db();
        let repository = NotesRepository::new(&db);
        assert!(matches!(
            repository.update(42, &Draft::new("x", "y")),
            Err(Error::NoteNotFound(42))
        ));
    }

    #[test]
    fn test_delete_missing_note() {
        let db = test_db();
        let repository = NotesRepository::new(&db);
        let id = repository.insert(&Draft::new("keep", "me")).unwrap();

        assert!(matches!(
            repository.delete_with_id(id + 1),
            Err(Error::NoteNotFound(missing)) if missing == id + 1
        ));
        assert!(repository.get(id).unwrap().is_some());
    }

    #[test]
    fn test_get_by_text() {
        let db = test_db();
        let repository = NotesRepository::new(&db);
        repository.insert(&Draft::new("Shopping", "milk")).unwrap();
        repository.insert(&Draft::new("Work", "call the shop")).unwrap();
        repository.insert(&Draft::new("Travel", "pack bags")).unwrap();

        let found = repository.get_by_text("SHOP").unwrap();
        assert_eq!(found.len(), 2);
        assert!(repository.get_by_text("nothing like it").unwrap().is_empty());
    }

    #[test]
    fn test_delete_all() {
        let db = test_db();
        let repository = NotesRepository::new(&db);
        repository.insert(&Draft::new("a", "b")).unwrap();
        repository.insert(&Draft::new("c", "d")).unwrap();

        repository.delete_all().unwrap();
        assert!(repository.get_all().unwrap().is_empty());
    }
}
