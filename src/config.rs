use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const DB_ENV_VAR: &str = "NOTES_DB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct NotesConfig {
    pub(crate) database: Option<PathBuf>,
}

pub(crate) fn notes_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".notes")
}

pub(crate) fn default_config_path() -> PathBuf {
    notes_dir().join("config.toml")
}

pub(crate) fn load_config(path: &Path) -> Result<Option<NotesConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(config))
}

/// Database location: `--database`, then `NOTES_DB`, then the config file,
/// then `~/.notes/notes.db`.
pub(crate) fn db_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    let path = match flag {
        Some(path) => path,
        None => match env::var_os(DB_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => load_config(&default_config_path())?
                .and_then(|config| config.database)
                .unwrap_or_else(|| notes_dir().join("notes.db")),
        },
    };
    ensure_db_dir(&path)?;
    Ok(path)
}

fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn test_load_config_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database = \"/tmp/elsewhere.db\"\n").unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/tmp/elsewhere.db")));
    }

    #[test]
    fn test_flag_wins_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("nested").join("notes.db");

        let path = db_path(Some(flag.clone())).unwrap();
        assert_eq!(path, flag);
        assert!(dir.path().join("nested").is_dir());
    }
}
