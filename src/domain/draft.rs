use crate::error::{Error, Result};

/// Complete, immutable note content that has not been committed to the
/// notes table yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    title: String,
    description: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// One of the two editable fields of a draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
}

impl DraftField {
    /// The field that has to be read back from storage when this one is the
    /// first to be edited.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Title,
        }
    }
}

/// A draft being edited. Each field stays unset until explicitly written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutableDraft {
    title: Option<String>,
    description: Option<String>,
}

impl MutableDraft {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn update_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn update_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn update(&mut self, field: DraftField, value: impl Into<String>) {
        match field {
            DraftField::Title => self.update_title(value),
            DraftField::Description => self.update_description(value),
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    pub fn is_incomplete(&self) -> bool {
        !self.has_title() || !self.has_description()
    }

    /// Narrows to a [`Draft`], failing with [`Error::IncompleteDraft`] while a
    /// field is still unset.
    pub fn to_draft(&self) -> Result<Draft> {
        match (&self.title, &self.description) {
            (Some(title), Some(description)) => Ok(Draft::new(title, description)),
            _ => Err(Error::IncompleteDraft {
                id: None,
                draft: self.clone(),
            }),
        }
    }
}

impl From<Draft> for MutableDraft {
    fn from(draft: Draft) -> Self {
        Self {
            title: Some(draft.title),
            description: Some(draft.description),
        }
    }
}
