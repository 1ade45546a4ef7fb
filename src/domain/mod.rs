pub mod draft;
pub mod note;

pub use draft::{Draft, DraftField, MutableDraft};
pub use note::Note;
