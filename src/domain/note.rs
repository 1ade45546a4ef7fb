/// A committed note as stored in the notes table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// RFC 3339 timestamp of the last insert or update.
    pub last_update_date: String,
}
