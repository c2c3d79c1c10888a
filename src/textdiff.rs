//! Minimal before/after text diff for highlighting a changed field.
//!
//! Finds the longest common prefix, then the longest common suffix of the
//! remainder; whatever is left in the middle is marked removed on the old
//! side and added on the new side. Display aid only — the reconciliation
//! engine compares values by exact string equality, never through this.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Unchanged,
    Removed,
    Added,
}

/// One run of characters in a diffed string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiffSegment {
    pub text: String,
    pub kind: SegmentKind,
}

impl DiffSegment {
    fn new(text: String, kind: SegmentKind) -> Self {
        DiffSegment { text, kind }
    }
}

/// Segment lists for the old and new side of one field value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextDiff {
    pub old: Vec<DiffSegment>,
    pub new: Vec<DiffSegment>,
}

/// Diffs two strings into old/new segment lists.
///
/// Equal inputs degenerate to a single unchanged segment on each side.
/// Operates on characters, so multi-byte UTF-8 never splits mid-scalar.
pub fn diff_strings(old: &str, new: &str) -> TextDiff {
    if old == new {
        return TextDiff {
            old: vec![DiffSegment::new(old.to_string(), SegmentKind::Unchanged)],
            new: vec![DiffSegment::new(new.to_string(), SegmentKind::Unchanged)],
        };
    }

    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut start = 0;
    while start < old_chars.len()
        && start < new_chars.len()
        && old_chars[start] == new_chars[start]
    {
        start += 1;
    }

    let mut end = 0;
    while end < old_chars.len() - start
        && end < new_chars.len() - start
        && old_chars[old_chars.len() - 1 - end] == new_chars[new_chars.len() - 1 - end]
    {
        end += 1;
    }

    let prefix: String = old_chars[..start].iter().collect();
    let old_middle: String = old_chars[start..old_chars.len() - end].iter().collect();
    let new_middle: String = new_chars[start..new_chars.len() - end].iter().collect();
    let suffix: String = old_chars[old_chars.len() - end..].iter().collect();

    let mut old_parts = Vec::new();
    let mut new_parts = Vec::new();

    if !prefix.is_empty() {
        old_parts.push(DiffSegment::new(prefix.clone(), SegmentKind::Unchanged));
        new_parts.push(DiffSegment::new(prefix, SegmentKind::Unchanged));
    }
    if !old_middle.is_empty() {
        old_parts.push(DiffSegment::new(old_middle, SegmentKind::Removed));
    }
    if !new_middle.is_empty() {
        new_parts.push(DiffSegment::new(new_middle, SegmentKind::Added));
    }
    if !suffix.is_empty() {
        old_parts.push(DiffSegment::new(suffix.clone(), SegmentKind::Unchanged));
        new_parts.push(DiffSegment::new(suffix, SegmentKind::Unchanged));
    }

    TextDiff {
        old: old_parts,
        new: new_parts,
    }
}
