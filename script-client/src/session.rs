//! Create/edit form state.
//!
//! The session stages form input in a [`Draft`] and never touches the store's
//! collection directly; every change goes through [`ScriptStore`].

use shared_types::{normalize_optional, ImportedFields, NewScript, Script, ScriptId, ScriptPatch, Tags};

use crate::error::ScriptError;
use crate::store::ScriptStore;

/// Form fields exactly as typed. Tags stay a raw comma string until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub style: String,
    pub tags: String,
    pub lyrics: String,
}

impl From<&Script> for Draft {
    fn from(script: &Script) -> Self {
        Self {
            title: script.title.clone(),
            style: script.style.clone().unwrap_or_default(),
            tags: script.tags.to_wire(),
            lyrics: script.lyrics.clone(),
        }
    }
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        [&self.title, &self.style, &self.tags, &self.lyrics]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    pub fn to_new_script(&self) -> NewScript {
        NewScript {
            title: self.title.clone(),
            lyrics: self.lyrics.clone(),
            style: normalize_optional(Some(self.style.clone())),
            tags: Tags::parse(&self.tags),
        }
    }

    /// Fields that differ from `original`. Tags are compared after parsing,
    /// so reformatting the same tags is not a change.
    pub fn diff(&self, original: &Draft) -> ScriptPatch {
        let changed = |now: &String, before: &String| (now != before).then(|| now.clone());
        let tags = Tags::parse(&self.tags);
        ScriptPatch {
            title: changed(&self.title, &original.title),
            lyrics: changed(&self.lyrics, &original.lyrics),
            style: changed(&self.style, &original.style),
            tags: (tags != Tags::parse(&original.tags)).then_some(tags),
        }
    }

    /// Overwrite the fields the import returned; leave the rest as typed.
    pub fn merge_import(&mut self, fields: &ImportedFields) {
        let fill = |slot: &mut String, value: &Option<String>| {
            if let Some(text) = value.as_deref().filter(|t| !t.trim().is_empty()) {
                *slot = text.to_string();
            }
        };
        fill(&mut self.title, &fields.title);
        fill(&mut self.style, &fields.style);
        fill(&mut self.lyrics, &fields.lyrics);
        if let Some(tags) = fields.tags.as_ref().filter(|t| !t.is_empty()) {
            self.tags = tags.to_wire();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// The form, if open, describes a new script.
    #[default]
    Idle,
    Editing(ScriptId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Script),
    Updated(Script),
    /// Edit submitted with nothing changed; no request was made.
    Unchanged(ScriptId),
}

#[derive(Debug, Default)]
pub struct EditSession {
    mode: SessionMode,
    draft: Draft,
    /// Snapshot taken by `begin_edit`, used to compute the patch.
    original: Draft,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, SessionMode::Editing(_))
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Switch to editing `script`, replacing whatever was staged.
    pub fn begin_edit(&mut self, script: &Script) {
        tracing::debug!(id = %script.id, "Begin editing script");
        self.mode = SessionMode::Editing(script.id);
        self.draft = Draft::from(script);
        self.original = self.draft.clone();
    }

    /// Drop staged input and go back to creating.
    pub fn cancel(&mut self) {
        self.mode = SessionMode::Idle;
        self.draft = Draft::default();
        self.original = Draft::default();
    }

    /// Create or update depending on the mode.
    ///
    /// On failure the mode and staged input are kept so nothing typed is lost.
    pub async fn submit(&mut self, store: &ScriptStore) -> Result<SubmitOutcome, ScriptError> {
        match self.mode {
            SessionMode::Idle => {
                let created = store.add(self.draft.to_new_script()).await?;
                self.draft = Draft::default();
                Ok(SubmitOutcome::Created(created))
            }
            SessionMode::Editing(id) => {
                let patch = self.draft.diff(&self.original);
                if patch.is_empty() {
                    tracing::debug!(id = %id, "Nothing changed, skipping update");
                    self.cancel();
                    return Ok(SubmitOutcome::Unchanged(id));
                }
                let updated = store.edit(id, patch).await?;
                self.cancel();
                Ok(SubmitOutcome::Updated(updated))
            }
        }
    }

    /// Fill the draft from a song page. Only available while creating.
    pub async fn import_from_url(&mut self, store: &ScriptStore, url: &str) -> Result<(), ScriptError> {
        if self.is_editing() {
            let error = ScriptError::Import("import is only available for new scripts".to_string());
            return Err(store.report("import", error));
        }
        let fields = store.import_from_url(url).await?;
        self.draft.merge_import(&fields);
        Ok(())
    }
}
