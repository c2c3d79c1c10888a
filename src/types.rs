//! Core, format-agnostic types for locmerge.
//!
//! Format adapters decode into these; the reconciliation engine and the
//! merge applier operate on them. Field names serialize in camelCase so
//! persisted projects match the original editor's snapshot JSON.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Language key under which the native source text of every resource lives.
pub const DEFAULT_LANG: &str = "default";

/// Sentinel stored when a source file carries no comment for an entry.
pub const NO_CONTEXT: &str = "No context provided.";

/// Advisory tag set by the merge applier, cleared on manual edit or
/// explicit acknowledgement. Drives highlighting only; never consulted
/// by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    New,
    Updated,
}

/// Native platform of a project's source file, fixed at initial upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// The file extension native source files of this platform use.
    pub fn extension(&self) -> &'static str {
        match self {
            Platform::Android => "xml",
            Platform::Ios => "strings",
        }
    }
}

/// One localizable string entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringResource {
    /// Stable unique key within a project; the join key for all
    /// reconciliation operations.
    pub id: String,

    /// Free-text description or translator comment.
    pub context: String,

    /// Language code → translated text. Always contains [`DEFAULT_LANG`]
    /// for resources that came from a native source file.
    pub values: BTreeMap<String, String>,

    /// Original serialized fragment from the native file, shown in the
    /// provenance view. Empty for entries that came from a tabular import.
    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_text: String,

    /// Soft-delete flag: removed from the latest source file but retained
    /// for history. Archived entries are excluded from exports and from
    /// the default visible set, but reappearing ids merge back as new.
    #[serde(default)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_archived: bool,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

impl StringResource {
    pub fn value(&self, lang_code: &str) -> &str {
        self.values.get(lang_code).map(String::as_str).unwrap_or("")
    }
}

/// One record as produced by a format adapter, before reconciliation.
///
/// `context` is `None` when the source carries no context at all (e.g. a
/// tabular file without a `context` column), which suppresses context
/// comparison for that record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub context: Option<String>,
    pub values: BTreeMap<String, String>,
    pub source_text: String,
}

impl RawRecord {
    /// Materializes this record as a live resource, used when an incoming
    /// record is accepted as an addition.
    pub fn into_resource(self) -> StringResource {
        StringResource {
            id: self.id,
            context: self.context.unwrap_or_else(|| NO_CONTEXT.to_string()),
            values: self.values,
            source_text: self.source_text,
            is_archived: false,
            status: None,
        }
    }
}

/// A named, persisted container of string resources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,

    /// Unix milliseconds; refreshed on every mutation.
    pub last_modified: u64,

    /// Keyed by `id`; no duplicate ids at any time.
    pub resources: Vec<StringResource>,

    pub file_name: Option<String>,
    pub platform: Option<Platform>,

    /// Language codes known to the project. Always includes
    /// [`DEFAULT_LANG`]; grows as translations or tabular columns
    /// introduce new codes; shrinks only via explicit removal.
    pub languages: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Project {
            id: id.into(),
            name: name.into(),
            last_modified: current_timestamp(),
            resources: Vec::new(),
            file_name: None,
            platform: None,
            languages: vec![DEFAULT_LANG.to_string()],
        }
    }

    pub fn find_resource(&self, id: &str) -> Option<&StringResource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn find_resource_mut(&mut self, id: &str) -> Option<&mut StringResource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    /// Non-archived resources, the set all exports and default views use.
    pub fn live_resources(&self) -> impl Iterator<Item = &StringResource> {
        self.resources.iter().filter(|r| !r.is_archived)
    }

    pub fn has_language(&self, lang_code: &str) -> bool {
        self.languages.iter().any(|l| l == lang_code)
    }

    /// Registers a language code, preserving first-seen order.
    pub fn add_language(&mut self, lang_code: &str) {
        if !self.has_language(lang_code) {
            self.languages.push(lang_code.to_string());
        }
    }

    /// True when any resource still carries a `new`/`updated` tag.
    pub fn has_pending_changes(&self) -> bool {
        self.resources.iter().any(|r| r.status.is_some())
    }

    pub fn touch(&mut self) {
        self.last_modified = current_timestamp();
    }
}

/// Per-language before/after pair for one updated resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    pub lang_code: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChange {
    pub old_context: String,
    pub new_context: String,
}

/// Field-level change detail for a resource present in both record sets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiff {
    pub id: String,

    /// One entry per language in the comparison scope whose value differs.
    pub value_changes: Vec<ValueChange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_change: Option<ContextChange>,

    /// Replacement source fragment; present only when the incoming file
    /// was a native source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_source_text: Option<String>,
}

/// The reviewable result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergeComparison {
    /// Incoming records with no live counterpart.
    pub added: Vec<StringResource>,
    /// Records present in both sets with at least one changed field.
    pub updated: Vec<UpdateDiff>,
    /// Live records absent from the incoming set (native updates only).
    pub removed: Vec<StringResource>,
}

impl MergeComparison {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateResolution {
    Keep,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalResolution {
    Keep,
    Delete,
}

/// Per-item user decisions for an applied merge. Ids absent from a map
/// receive no action. Additions carry no resolution; they always apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MergeResolutions {
    pub updates: HashMap<String, UpdateResolution>,
    pub removals: HashMap<String, RemovalResolution>,
}

impl MergeResolutions {
    /// Convenience for flows that accept everything as-is: every update
    /// applied, every removal deleted.
    pub fn accept_all(comparison: &MergeComparison) -> Self {
        MergeResolutions {
            updates: comparison
                .updated
                .iter()
                .map(|u| (u.id.clone(), UpdateResolution::Update))
                .collect(),
            removals: comparison
                .removed
                .iter()
                .map(|r| (r.id.clone(), RemovalResolution::Delete))
                .collect(),
        }
    }
}

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
