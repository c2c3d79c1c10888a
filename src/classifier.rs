//! Column classification for tabular imports.
//!
//! A tabular file's header row is classified once, before reconciliation:
//! `id` and `context` are structural, `value_<code>` columns carry the
//! translation values for `<code>`, and anything else must be resolved by
//! the user (mapped to a language code, or ignored) before records are
//! built.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// Header prefix that marks a recognized language-value column.
pub const VALUE_PREFIX: &str = "value_";

/// Role of a single tabular column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    /// The structural `id` column.
    Id,
    /// The structural `context` column.
    Context,
    /// A recognized `value_<code>` column carrying the given language.
    Language(String),
    /// Anything else; blocks reconciliation until resolved.
    Unrecognized,
}

/// Classifies one header. Structural names are matched exactly and are
/// never treated as language columns.
pub fn classify_header(header: &str) -> ColumnRole {
    match header {
        "id" => ColumnRole::Id,
        "context" => ColumnRole::Context,
        _ => match header.strip_prefix(VALUE_PREFIX) {
            Some(code) if !code.is_empty() => ColumnRole::Language(code.to_string()),
            _ => ColumnRole::Unrecognized,
        },
    }
}

/// Result of classifying a full header row against a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAnalysis {
    /// The header row, in file order.
    pub headers: Vec<String>,
    /// Recognized language codes the project does not know yet.
    pub new_languages: Vec<String>,
    /// Headers that require user resolution.
    pub unrecognized: Vec<String>,
}

impl HeaderAnalysis {
    /// True when reconciliation is blocked pending user resolution.
    pub fn needs_resolution(&self) -> bool {
        !self.unrecognized.is_empty()
    }
}

/// Classifies a header row. Fails when no `id` column is present.
pub fn analyze_headers(
    headers: &[String],
    known_languages: &[String],
) -> Result<HeaderAnalysis, Error> {
    if !headers.iter().any(|h| h == "id") {
        return Err(Error::validation_error("file must contain an 'id' column"));
    }

    let mut new_languages = Vec::new();
    let mut unrecognized = Vec::new();
    for header in headers {
        match classify_header(header) {
            ColumnRole::Id | ColumnRole::Context => {}
            ColumnRole::Language(code) => {
                if !known_languages.iter().any(|l| *l == code) && !new_languages.contains(&code) {
                    new_languages.push(code);
                }
            }
            ColumnRole::Unrecognized => {
                if !unrecognized.contains(header) {
                    unrecognized.push(header.clone());
                }
            }
        }
    }

    Ok(HeaderAnalysis {
        headers: headers.to_vec(),
        new_languages,
        unrecognized,
    })
}

/// User decision for one unrecognized column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ColumnResolution {
    /// Treat the column as the values of an explicit language code,
    /// equivalent to a synthetic `value_<code>` header.
    Map {
        #[serde(rename = "langCode")]
        lang_code: String,
    },
    /// Drop the column entirely; it contributes no values.
    Ignore,
}

/// Resolutions keyed by the original (unrecognized) header.
pub type ColumnResolutions = HashMap<String, ColumnResolution>;

/// Final purpose of each column, aligned with the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedColumn {
    Id,
    Context,
    Value(String),
    Skip,
}

/// Applies resolutions to a header row, producing the per-column plan
/// record construction uses.
///
/// Fails with a validation error when an unrecognized column was left
/// without a resolution, or when a mapped code is not a valid language
/// identifier.
pub fn resolve_columns(
    headers: &[String],
    resolutions: &ColumnResolutions,
) -> Result<Vec<ResolvedColumn>, Error> {
    headers
        .iter()
        .map(|header| match classify_header(header) {
            ColumnRole::Id => Ok(ResolvedColumn::Id),
            ColumnRole::Context => Ok(ResolvedColumn::Context),
            ColumnRole::Language(code) => Ok(ResolvedColumn::Value(code)),
            ColumnRole::Unrecognized => match resolutions.get(header) {
                Some(ColumnResolution::Map { lang_code }) => {
                    if lang_code.parse::<LanguageIdentifier>().is_err() {
                        return Err(Error::validation_error(format!(
                            "'{}' is not a valid language code",
                            lang_code
                        )));
                    }
                    Ok(ResolvedColumn::Value(lang_code.clone()))
                }
                Some(ColumnResolution::Ignore) => Ok(ResolvedColumn::Skip),
                None => Err(Error::validation_error(format!(
                    "column '{}' has no resolution",
                    header
                ))),
            },
        })
        .collect()
}
