//! Shared types between the script backend and its clients
//!
//! These types are used by both:
//! - the REST backend (`script-server`)
//! - the client-side store and edit session (`script-client`)
//!
//! Serializable with serde for JSON over HTTP. TypeScript bindings for the
//! browser front-end are exported with ts-rs by `cargo test -p shared-types`
//! into `shared-types/bindings/scripts.ts` (override the directory with
//! `TS_RS_EXPORT_DIR`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

// ============================================================================
// Identity
// ============================================================================

/// Backend-assigned script identifier.
///
/// Opaque to clients: only equality, ordering and display are meaningful.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct ScriptId(#[ts(type = "number")] pub i64);

impl ScriptId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScriptId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Tags attached to a script.
///
/// On the wire tags travel as one comma-separated string. Internally they are
/// an ordered list of trimmed, non-empty, distinct entries; empty segments and
/// repeats in the wire string are dropped while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(Vec<String>);

pub const TAG_SEPARATOR: char = ',';

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the legacy comma-separated form.
    pub fn parse(raw: &str) -> Self {
        raw.split(TAG_SEPARATOR).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Comma-separated form sent to the backend.
    pub fn to_wire(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for raw in iter {
            let tag = raw.as_ref().trim();
            if tag.is_empty() || tags.iter().any(|t| t == tag) {
                continue;
            }
            tags.push(tag.to_string());
        }
        Self(tags)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Tags::parse).unwrap_or_default())
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// A persisted script as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct Script {
    pub id: ScriptId,
    pub title: String,
    pub lyrics: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    #[ts(type = "string | null")]
    pub tags: Tags,
    /// Set by the backend on creation
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Script {
    /// Apply a partial update. Fields absent from the patch are left alone.
    pub fn apply(&mut self, patch: &ScriptPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(lyrics) = &patch.lyrics {
            self.lyrics = lyrics.clone();
        }
        if let Some(style) = &patch.style {
            self.style = normalize_optional(Some(style.clone()));
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }
}

/// Create payload (`POST /scripts/`). The id is assigned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct NewScript {
    pub title: String,
    pub lyrics: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    #[ts(type = "string | null")]
    pub tags: Tags,
}

impl NewScript {
    pub fn new(title: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lyrics: lyrics.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, ValidationError::EmptyTitle)?;
        require_text(&self.lyrics, ValidationError::EmptyLyrics)
    }

    /// Materialize the persisted record once the backend picked an id.
    pub fn into_script(self, id: ScriptId, created_at: DateTime<Utc>) -> Script {
        Script {
            id,
            title: self.title,
            lyrics: self.lyrics,
            style: normalize_optional(self.style),
            tags: self.tags,
            created_at: Some(created_at),
        }
    }
}

/// Partial update payload (`PATCH /scripts/{id}`).
///
/// `None` means "leave unchanged". An empty `style` clears the style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct ScriptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub tags: Option<Tags>,
}

impl ScriptPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.lyrics.is_none() && self.style.is_none() && self.tags.is_none()
    }

    /// Only fields that are present are checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text(title, ValidationError::EmptyTitle)?;
        }
        if let Some(lyrics) = &self.lyrics {
            require_text(lyrics, ValidationError::EmptyLyrics)?;
        }
        Ok(())
    }
}

// ============================================================================
// URL import
// ============================================================================

/// Body of `POST /import-url`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct ImportRequest {
    pub url: String,
}

/// Fields scraped from a song page. Any of them may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "scripts.ts")]
pub struct ImportedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub tags: Option<Tags>,
}

impl ImportedFields {
    /// True when at least one field carries usable text.
    pub fn has_content(&self) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.title)
            || filled(&self.style)
            || filled(&self.lyrics)
            || self.tags.as_ref().is_some_and(|t| !t.is_empty())
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Client-side required-field check. The backend runs the same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    EmptyTitle,
    #[error("lyrics are required")]
    EmptyLyrics,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyLyrics => "lyrics",
        }
    }
}

fn require_text(value: &str, error: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error)
    } else {
        Ok(())
    }
}

/// Empty optional text is stored as absent.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_LIST_OFFSET: u32 = 0;
pub const DEFAULT_LIST_LIMIT: u32 = 100;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    fn sample_script() -> Script {
        Script {
            id: ScriptId(7),
            title: "A".to_string(),
            lyrics: "L".to_string(),
            style: Some("Rock".to_string()),
            tags: Tags::parse("x"),
            created_at: None,
        }
    }

    #[test]
    fn test_tags_parse_trims_and_drops_empty_segments() {
        let tags = Tags::parse(" rock, ,pop ,,  chill ");
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["rock", "pop", "chill"]);
        assert_eq!(tags.to_wire(), "rock, pop, chill");
    }

    #[test]
    fn test_tags_parse_drops_repeats_keeping_first_position() {
        let tags = Tags::parse("b, a, b, a");
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_tags_parse_blank_is_empty() {
        assert!(Tags::parse("").is_empty());
        assert!(Tags::parse(" , ,").is_empty());
    }

    #[test]
    fn test_script_decodes_null_and_missing_optionals() {
        let script: Script = serde_json::from_str(
            r#"{"id": 3, "title": "T", "lyrics": "L", "style": null, "tags": null}"#,
        )
        .unwrap();
        assert_eq!(script.id, ScriptId(3));
        assert_eq!(script.style, None);
        assert!(script.tags.is_empty());
        assert_eq!(script.created_at, None);

        let script: Script =
            serde_json::from_str(r#"{"id": 4, "title": "T", "lyrics": "L"}"#).unwrap();
        assert!(script.tags.is_empty());
    }

    #[test]
    fn test_script_decodes_backend_timestamp() {
        let script: Script = serde_json::from_str(
            r#"{"id": 1, "title": "T", "lyrics": "L", "tags": "a,b", "created_at": "2025-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(script.tags.len(), 2);
        assert!(script.created_at.is_some());
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = ScriptPatch {
            style: Some("Pop".to_string()),
            ..ScriptPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"style": "Pop"}));
    }

    #[test]
    fn test_patch_can_clear_tags() {
        let patch = ScriptPatch {
            tags: Some(Tags::new()),
            ..ScriptPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"tags": ""}));

        let back: ScriptPatch = serde_json::from_value(json).unwrap();
        assert_eq!(back.tags, Some(Tags::new()));
    }

    #[test]
    fn test_apply_patch_preserves_untouched_fields() {
        let mut script = sample_script();
        script.apply(&ScriptPatch {
            style: Some("Pop".to_string()),
            ..ScriptPatch::default()
        });
        assert_eq!(script.title, "A");
        assert_eq!(script.style.as_deref(), Some("Pop"));
        assert_eq!(script.tags.to_wire(), "x");
        assert_eq!(script.lyrics, "L");
    }

    #[test]
    fn test_apply_patch_empty_style_clears_it() {
        let mut script = sample_script();
        script.apply(&ScriptPatch {
            style: Some(String::new()),
            ..ScriptPatch::default()
        });
        assert_eq!(script.style, None);
    }

    #[test]
    fn test_new_script_validation() {
        assert_eq!(
            NewScript::new("", "L").validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            NewScript::new("T", "   \n").validate(),
            Err(ValidationError::EmptyLyrics)
        );
        assert!(NewScript::new("T", "L").validate().is_ok());
    }

    #[test]
    fn test_patch_validation_ignores_absent_fields() {
        assert!(ScriptPatch::default().validate().is_ok());
        let patch = ScriptPatch {
            lyrics: Some(" ".to_string()),
            ..ScriptPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::EmptyLyrics));
    }

    #[test]
    fn test_imported_fields_has_content() {
        assert!(!ImportedFields::default().has_content());
        let blank = ImportedFields {
            title: Some("  ".to_string()),
            tags: Some(Tags::new()),
            ..ImportedFields::default()
        };
        assert!(!blank.has_content());
        let titled = ImportedFields {
            title: Some("Song".to_string()),
            ..ImportedFields::default()
        };
        assert!(titled.has_content());
    }

    #[test]
    fn export_types() {
        let config = Config::from_env();
        ScriptId::export(&config).unwrap();
        Script::export(&config).unwrap();
        NewScript::export(&config).unwrap();
        ScriptPatch::export(&config).unwrap();
        ImportRequest::export(&config).unwrap();
        ImportedFields::export(&config).unwrap();

        let generated = std::fs::read_to_string(config.out_dir().join("scripts.ts")).unwrap();
        for name in ["ScriptId", "Script", "NewScript", "ScriptPatch", "ImportedFields"] {
            assert!(generated.contains(&format!("export type {name} ")), "{name} missing");
        }
    }
}
