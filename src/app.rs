use anyhow::{Context, Result};
use std::path::PathBuf;

use notes_cli::{SqliteDatabase, db::schema};

use crate::config;

pub(crate) struct AppContext {
    db: SqliteDatabase,
}

impl AppContext {
    pub(crate) fn new(database: Option<PathBuf>) -> Result<Self> {
        let path = config::db_path(database)?;
        let db = SqliteDatabase::open(&path)
            .with_context(|| format!("opening database {}", path.display()))?;
        schema::initialize(&db).context("initializing the database schema")?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &SqliteDatabase {
        &self.db
    }
}
