//! The reconciliation engine: computes a reviewable [`MergeComparison`]
//! between a project's current record set and a freshly parsed incoming
//! record set.
//!
//! One algorithm serves both update kinds; the differences between a
//! native-source refresh and a translation-table refresh are captured
//! entirely by an [`ImportProfile`] so the diffing rules cannot drift
//! apart. Reconciliation never mutates the current set.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::{
    ContextChange, MergeComparison, RawRecord, StringResource, UpdateDiff, ValueChange,
};

/// Which language keys are compared for a record present in both sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonScope {
    /// Only the languages present on the incoming record. Native files
    /// carry only the default language, so other translations are left
    /// alone.
    IncomingLanguages,
    /// The union of current and incoming language keys, so a column
    /// disappearing from a sheet also surfaces as a change.
    UnionOfLanguages,
}

/// Capabilities of one import kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProfile {
    /// Incoming ids with no live counterpart become additions. When
    /// false, such ids are skipped entirely (they are still counted as
    /// seen, so they are not removal candidates either).
    pub can_add: bool,
    /// Live ids missing from the incoming set become removals.
    pub can_remove: bool,
    pub scope: ComparisonScope,
}

impl ImportProfile {
    /// A refreshed native source file: authoritative for id existence.
    pub fn native_source() -> Self {
        ImportProfile {
            can_add: true,
            can_remove: true,
            scope: ComparisonScope::IncomingLanguages,
        }
    }

    /// A refreshed translation table: updates values only; the source
    /// file remains authoritative for which ids exist.
    pub fn translation_table() -> Self {
        ImportProfile {
            can_add: false,
            can_remove: false,
            scope: ComparisonScope::UnionOfLanguages,
        }
    }
}

/// Computes the categorized difference between `current` (live and
/// archived) and `incoming`.
///
/// Returns `None` when nothing differs in any tracked field: the
/// no-change condition, reported distinctly so callers can skip the
/// review step instead of presenting an empty comparison.
///
/// An archived record whose id reappears is always classified as added,
/// never updated. Absent values compare as empty strings, and comparison
/// is exact textual equality with no normalization.
pub fn reconcile(
    current: &[StringResource],
    incoming: &[RawRecord],
    profile: &ImportProfile,
) -> Option<MergeComparison> {
    let by_id: HashMap<&str, &StringResource> =
        current.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in incoming {
        if !seen.insert(record.id.as_str()) {
            // A duplicate id later in the file is ignored.
            continue;
        }

        let existing = by_id.get(record.id.as_str());
        match existing {
            None => {
                if profile.can_add {
                    added.push(record.clone().into_resource());
                }
            }
            Some(old) if old.is_archived => {
                if profile.can_add {
                    added.push(record.clone().into_resource());
                }
            }
            Some(old) => {
                if let Some(diff) = diff_record(old, record, profile.scope) {
                    updated.push(diff);
                }
            }
        }
    }

    let removed: Vec<StringResource> = if profile.can_remove {
        current
            .iter()
            .filter(|r| !r.is_archived && !seen.contains(r.id.as_str()))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let comparison = MergeComparison {
        added,
        updated,
        removed,
    };
    if comparison.is_empty() {
        None
    } else {
        Some(comparison)
    }
}

fn diff_record(
    old: &StringResource,
    record: &RawRecord,
    scope: ComparisonScope,
) -> Option<UpdateDiff> {
    let langs: BTreeSet<&str> = match scope {
        ComparisonScope::IncomingLanguages => {
            record.values.keys().map(String::as_str).collect()
        }
        ComparisonScope::UnionOfLanguages => old
            .values
            .keys()
            .chain(record.values.keys())
            .map(String::as_str)
            .collect(),
    };

    let mut value_changes = Vec::new();
    for lang_code in langs {
        let old_value = old.value(lang_code);
        let new_value = record
            .values
            .get(lang_code)
            .map(String::as_str)
            .unwrap_or("");
        if old_value != new_value {
            value_changes.push(ValueChange {
                lang_code: lang_code.to_string(),
                old_value: old_value.to_string(),
                new_value: new_value.to_string(),
            });
        }
    }

    let context_change = match &record.context {
        Some(new_context) if *new_context != old.context => Some(ContextChange {
            old_context: old.context.clone(),
            new_context: new_context.clone(),
        }),
        _ => None,
    };

    if value_changes.is_empty() && context_change.is_none() {
        return None;
    }

    // Only native source files carry a fragment; tabular rows leave it
    // empty, so tabular updates never overwrite provenance.
    let new_source_text = if record.source_text.is_empty() {
        None
    } else {
        Some(record.source_text.clone())
    };

    Some(UpdateDiff {
        id: record.id.clone(),
        value_changes,
        context_change,
        new_source_text,
    })
}
