//! Drafts of notes, kept in memory and written back to the staging tables on
//! [`DraftsRepository::persist`].
//!
//! Two kinds of drafts exist: the single draft of the note being created
//! (`pending_draft_creation`, singleton row with id 0) and drafts of existing
//! notes keyed by note id (`pending_drafts_update`). The first edit of a field
//! hydrates the other field from its staging row, so a partial edit never
//! clobbers what was saved before.
//!
//! `persist` clears the in-memory state before its transaction runs. When the
//! transaction fails nothing of the batch reaches storage, and the pending
//! edits are gone from memory as well: callers must treat a failed persist as
//! lost edits, not as something a retry would reapply.

use std::collections::BTreeMap;
use std::mem;

use super::{BoxCursor, Cursor, CursorExt, Database, StatementExt};
use crate::domain::draft::{Draft, DraftField, MutableDraft};
use crate::error::{Error, Result};

const UPSERT_NEW: &str = "INSERT INTO pending_draft_creation (id, title, description)
     VALUES (0, ?1, ?2)
     ON CONFLICT(id) DO UPDATE SET title = excluded.title, description = excluded.description";

const UPSERT_EXISTING: &str = "INSERT INTO pending_drafts_update (note_id, title, description)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(note_id) DO UPDATE SET title = excluded.title, description = excluded.description";

pub struct DraftsRepository<'db> {
    db: &'db dyn Database,
    pending_new: Option<MutableDraft>,
    pending_existing: BTreeMap<i64, MutableDraft>,
}

impl<'db> DraftsRepository<'db> {
    pub fn new(db: &'db dyn Database) -> Self {
        Self {
            db,
            pending_new: None,
            pending_existing: BTreeMap::new(),
        }
    }

    pub fn update_new_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.update_new(DraftField::Title, title.into())
    }

    pub fn update_new_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.update_new(DraftField::Description, description.into())
    }

    pub fn update_existing_title(&mut self, id: i64, title: impl Into<String>) -> Result<()> {
        self.update_existing(id, DraftField::Title, title.into())
    }

    pub fn update_existing_description(
        &mut self,
        id: i64,
        description: impl Into<String>,
    ) -> Result<()> {
        self.update_existing(id, DraftField::Description, description.into())
    }

    /// The new-note draft, or `None` when there is none or it is still
    /// missing a field.
    ///
    /// A half-filled new draft reads as absent instead of failing the way
    /// [`get_existing`](Self::get_existing) does: there is no committed note
    /// to fall back on, and `persist` saves it with the unset field empty.
    pub fn get_new(&self) -> Result<Option<Draft>> {
        match &self.pending_new {
            Some(draft) if draft.is_incomplete() => Ok(None),
            Some(draft) => draft.to_draft().map(Some),
            None => self.new_from_db(),
        }
    }

    /// The draft of note `id`. A draft still missing a field is an error.
    pub fn get_existing(&self, id: i64) -> Result<Option<Draft>> {
        match self.pending_existing.get(&id) {
            Some(draft) => require_complete(id, draft).map(Some),
            None => self.existing_from_db(id),
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending_new.is_some() || !self.pending_existing.is_empty()
    }

    pub fn delete_new(&mut self) -> Result<()> {
        self.pending_new = None;
        self.delete_new_row()
    }

    pub fn delete_existing(&mut self, id: i64) -> Result<()> {
        self.pending_existing.remove(&id);
        let mut stmt = self
            .db
            .create_statement("DELETE FROM pending_drafts_update WHERE note_id = ?1")?;
        stmt.bind(1, id)?;
        stmt.execute()
    }

    /// Drops every draft, in memory and in storage, as one unit.
    pub fn delete_all(&mut self) -> Result<()> {
        let db = self.db;
        db.execute_transaction(&mut || {
            self.delete_new()?;
            self.pending_existing.clear();
            db.create_statement("DELETE FROM pending_drafts_update")?
                .execute()
        })
    }

    /// Writes every pending draft to the staging tables in one transaction.
    ///
    /// An existing-note draft missing a field aborts the whole batch with
    /// [`Error::IncompleteDraft`]. See the module docs for what a failure does
    /// to the in-memory state.
    pub fn persist(&mut self) -> Result<()> {
        let pending_new = self.pending_new.take();
        let pending_existing = mem::take(&mut self.pending_existing);
        if pending_new.is_none() && pending_existing.is_empty() {
            tracing::trace!("No pending drafts to persist");
            return Ok(());
        }

        tracing::debug!(
            "Persisting drafts (new: {}, existing: {})",
            pending_new.is_some(),
            pending_existing.len()
        );
        self.db.execute_transaction(&mut || {
            if let Some(draft) = &pending_new {
                self.persist_new(draft)?;
            }
            if !pending_existing.is_empty() {
                self.persist_existing(&pending_existing)?;
            }
            Ok(())
        })
    }

    fn update_new(&mut self, field: DraftField, value: String) -> Result<()> {
        if self.pending_new.is_none() {
            let draft = self.hydrate_new(field.counterpart())?;
            self.pending_new = Some(draft);
        }
        self.pending_new
            .get_or_insert_with(MutableDraft::default)
            .update(field, value);
        Ok(())
    }

    fn update_existing(&mut self, id: i64, field: DraftField, value: String) -> Result<()> {
        if !self.pending_existing.contains_key(&id) {
            let draft = self.hydrate_existing(id, field.counterpart())?;
            self.pending_existing.insert(id, draft);
        }
        self.pending_existing
            .entry(id)
            .or_default()
            .update(field, value);
        Ok(())
    }

    fn hydrate_new(&self, field: DraftField) -> Result<MutableDraft> {
        let sql = match field {
            DraftField::Title => "SELECT title FROM pending_draft_creation LIMIT 1",
            DraftField::Description => "SELECT description FROM pending_draft_creation LIMIT 1",
        };
        let stored: Option<String> = self.db.create_statement(sql)?.execute()?;
        tracing::trace!("Hydrated new draft {:?} (stored: {})", field, stored.is_some());
        Ok(with_field(field, stored))
    }

    fn hydrate_existing(&self, id: i64, field: DraftField) -> Result<MutableDraft> {
        let sql = match field {
            DraftField::Title => "SELECT title FROM pending_drafts_update WHERE note_id = ?1 LIMIT 1",
            DraftField::Description => {
                "SELECT description FROM pending_drafts_update WHERE note_id = ?1 LIMIT 1"
            }
        };
        let mut stmt = self.db.create_statement(sql)?;
        stmt.bind(1, id)?;
        let stored: Option<String> = stmt.execute()?;
        tracing::trace!(
            "Hydrated draft {:?} of note {} (stored: {})",
            field,
            id,
            stored.is_some()
        );
        Ok(with_field(field, stored))
    }

    fn persist_new(&self, draft: &MutableDraft) -> Result<()> {
        let title = draft.title().unwrap_or_default();
        let description = draft.description().unwrap_or_default();
        if title.is_empty() && description.is_empty() {
            // An emptied draft is the same as one never started.
            return self.delete_new_row();
        }

        let mut stmt = self.db.create_statement(UPSERT_NEW)?;
        stmt.bind(1, title)?;
        stmt.bind(2, description)?;
        stmt.execute()
    }

    fn persist_existing(&self, drafts: &BTreeMap<i64, MutableDraft>) -> Result<()> {
        let mut stmt = self.db.create_statement(UPSERT_EXISTING)?;
        for (&id, draft) in drafts {
            let draft = require_complete(id, draft)?;
            stmt.bind(1, id)?;
            stmt.bind(2, draft.title())?;
            stmt.bind(3, draft.description())?;
            stmt.execute::<()>()?;
        }
        Ok(())
    }

    fn delete_new_row(&self) -> Result<()> {
        self.db
            .create_statement("DELETE FROM pending_draft_creation")?
            .execute()
    }

    fn new_from_db(&self) -> Result<Option<Draft>> {
        let mut stmt = self
            .db
            .create_statement("SELECT title, description FROM pending_draft_creation LIMIT 1")?;
        let mut cursor = stmt.execute::<BoxCursor<'_>>()?;
        read_draft(&mut *cursor)
    }

    fn existing_from_db(&self, id: i64) -> Result<Option<Draft>> {
        let mut stmt = self.db.create_statement(
            "SELECT title, description FROM pending_drafts_update WHERE note_id = ?1 LIMIT 1",
        )?;
        stmt.bind(1, id)?;
        let mut cursor = stmt.execute::<BoxCursor<'_>>()?;
        read_draft(&mut *cursor)
    }
}

fn with_field(field: DraftField, value: Option<String>) -> MutableDraft {
    let mut draft = MutableDraft::default();
    if let Some(value) = value {
        draft.update(field, value);
    }
    draft
}

fn require_complete(id: i64, draft: &MutableDraft) -> Result<Draft> {
    if draft.is_incomplete() {
        return Err(Error::IncompleteDraft {
            id: Some(id),
            draft: draft.clone(),
        });
    }
    draft.to_draft()
}

fn read_draft(cursor: &mut dyn Cursor) -> Result<Option<Draft>> {
    if !cursor.next()? {
        return Ok(None);
    }
    let title = cursor.get::<String>(0)?;
    let description = cursor.get::<String>(1)?;
    Ok(Some(Draft::new(title, description)))
}
