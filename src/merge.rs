//! The merge applier: commits user-approved parts of a
//! [`MergeComparison`] into a project's canonical record set.
//!
//! Processing order is fixed (removals, then updates, then additions) so
//! the result is deterministic. Additions always apply; updates and
//! removals only act on ids the caller resolved. Pure in-memory
//! computation; the caller persists afterwards.

use crate::types::{
    MergeComparison, MergeResolutions, Project, RemovalResolution, ResourceStatus,
    UpdateResolution,
};

/// Applies resolved changes onto `project`, refreshing its language set
/// and `last_modified`.
///
/// - Removal resolved `delete`: the record is dropped permanently.
/// - Removal resolved `keep`: the record is archived, its status cleared.
/// - Update resolved `update`: value/context/source changes land on the
///   record, it is un-archived and tagged `updated`; new language codes
///   join the project's language set.
/// - Update resolved `keep` (or unresolved): no mutation.
/// - Every addition is inserted live with status `new`; an archived
///   record with the same id is replaced outright.
pub fn apply_merge(
    project: &mut Project,
    comparison: &MergeComparison,
    resolutions: &MergeResolutions,
) {
    for removal in &comparison.removed {
        match resolutions.removals.get(&removal.id) {
            Some(RemovalResolution::Delete) => {
                project.resources.retain(|r| r.id != removal.id);
            }
            Some(RemovalResolution::Keep) => {
                if let Some(existing) = project.find_resource_mut(&removal.id) {
                    existing.is_archived = true;
                    existing.status = None;
                }
            }
            None => {}
        }
    }

    let mut new_languages: Vec<String> = Vec::new();

    for update in &comparison.updated {
        if resolutions.updates.get(&update.id) != Some(&UpdateResolution::Update) {
            continue;
        }
        let Some(existing) = project.find_resource_mut(&update.id) else {
            continue;
        };
        for change in &update.value_changes {
            existing
                .values
                .insert(change.lang_code.clone(), change.new_value.clone());
            new_languages.push(change.lang_code.clone());
        }
        if let Some(context_change) = &update.context_change {
            existing.context = context_change.new_context.clone();
        }
        if let Some(source_text) = &update.new_source_text {
            existing.source_text = source_text.clone();
        }
        existing.is_archived = false;
        existing.status = Some(ResourceStatus::Updated);
    }

    for addition in &comparison.added {
        let mut resource = addition.clone();
        resource.is_archived = false;
        resource.status = Some(ResourceStatus::New);
        new_languages.extend(resource.values.keys().cloned());
        match project.find_resource_mut(&resource.id) {
            // Reappearing archived record: the incoming one takes over.
            Some(existing) => *existing = resource,
            None => project.resources.push(resource),
        }
    }

    for lang_code in new_languages {
        project.add_language(&lang_code);
    }
    project.touch();
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::types::{
        ContextChange, StringResource, UpdateDiff, ValueChange, DEFAULT_LANG, NO_CONTEXT,
    };

    fn resource(id: &str, default_value: &str) -> StringResource {
        StringResource {
            id: id.to_string(),
            context: NO_CONTEXT.to_string(),
            values: BTreeMap::from([(DEFAULT_LANG.to_string(), default_value.to_string())]),
            source_text: String::new(),
            is_archived: false,
            status: None,
        }
    }

    fn project_with(resources: Vec<StringResource>) -> Project {
        let mut project = Project::new("proj_1", "Test");
        project.resources = resources;
        project
    }

    fn update_diff(id: &str, lang: &str, old: &str, new: &str) -> UpdateDiff {
        UpdateDiff {
            id: id.to_string(),
            value_changes: vec![ValueChange {
                lang_code: lang.to_string(),
                old_value: old.to_string(),
                new_value: new.to_string(),
            }],
            context_change: None,
            new_source_text: None,
        }
    }

    // Scenario B: a removal kept becomes archived, a removal deleted
    // disappears.
    #[test]
    fn test_removal_keep_archives() {
        let mut project = project_with(vec![resource("a", "A"), resource("b", "B")]);
        let comparison = MergeComparison {
            removed: vec![resource("b", "B")],
            ..MergeComparison::default()
        };
        let resolutions = MergeResolutions {
            removals: HashMap::from([("b".to_string(), RemovalResolution::Keep)]),
            ..MergeResolutions::default()
        };

        apply_merge(&mut project, &comparison, &resolutions);

        let b = project.find_resource("b").unwrap();
        assert!(b.is_archived);
        assert_eq!(b.status, None);
        assert_eq!(project.resources.len(), 2);
    }

    #[test]
    fn test_removal_delete_drops_record() {
        let mut project = project_with(vec![resource("a", "A"), resource("b", "B")]);
        let comparison = MergeComparison {
            removed: vec![resource("b", "B")],
            ..MergeComparison::default()
        };
        let resolutions = MergeResolutions {
            removals: HashMap::from([("b".to_string(), RemovalResolution::Delete)]),
            ..MergeResolutions::default()
        };

        apply_merge(&mut project, &comparison, &resolutions);

        assert!(project.find_resource("b").is_none());
        assert!(project.find_resource("a").is_some());
    }

    #[test]
    fn test_unresolved_removal_stays_live() {
        let mut project = project_with(vec![resource("b", "B")]);
        let comparison = MergeComparison {
            removed: vec![resource("b", "B")],
            ..MergeComparison::default()
        };

        apply_merge(&mut project, &comparison, &MergeResolutions::default());

        let b = project.find_resource("b").unwrap();
        assert!(!b.is_archived);
    }

    #[test]
    fn test_update_applied_sets_status_and_values() {
        let mut project = project_with(vec![resource("hello", "Hi")]);
        let comparison = MergeComparison {
            updated: vec![UpdateDiff {
                id: "hello".to_string(),
                value_changes: vec![ValueChange {
                    lang_code: DEFAULT_LANG.to_string(),
                    old_value: "Hi".to_string(),
                    new_value: "Hi there".to_string(),
                }],
                context_change: Some(ContextChange {
                    old_context: NO_CONTEXT.to_string(),
                    new_context: "Greeting".to_string(),
                }),
                new_source_text: Some("<string name=\"hello\">Hi there</string>".to_string()),
            }],
            ..MergeComparison::default()
        };
        let resolutions = MergeResolutions {
            updates: HashMap::from([("hello".to_string(), UpdateResolution::Update)]),
            ..MergeResolutions::default()
        };

        apply_merge(&mut project, &comparison, &resolutions);

        let hello = project.find_resource("hello").unwrap();
        assert_eq!(hello.value(DEFAULT_LANG), "Hi there");
        assert_eq!(hello.context, "Greeting");
        assert_eq!(hello.source_text, "<string name=\"hello\">Hi there</string>");
        assert_eq!(hello.status, Some(ResourceStatus::Updated));
        assert!(!hello.is_archived);
    }

    #[test]
    fn test_update_kept_leaves_record_untouched() {
        let mut project = project_with(vec![resource("hello", "Hi")]);
        let before = project.resources.clone();
        let comparison = MergeComparison {
            updated: vec![update_diff("hello", DEFAULT_LANG, "Hi", "Hi there")],
            ..MergeComparison::default()
        };
        let resolutions = MergeResolutions {
            updates: HashMap::from([("hello".to_string(), UpdateResolution::Keep)]),
            ..MergeResolutions::default()
        };

        apply_merge(&mut project, &comparison, &resolutions);
        assert_eq!(project.resources, before);
    }

    // Scenario D: an addition carrying a new language extends the
    // project's language set.
    #[test]
    fn test_addition_registers_new_language() {
        let mut project = project_with(vec![]);
        let mut added = resource("greeting", "");
        added.values = BTreeMap::from([("fr".to_string(), "Bonjour".to_string())]);
        let comparison = MergeComparison {
            added: vec![added],
            ..MergeComparison::default()
        };

        apply_merge(&mut project, &comparison, &MergeResolutions::default());

        assert!(project.has_language("fr"));
        let greeting = project.find_resource("greeting").unwrap();
        assert_eq!(greeting.status, Some(ResourceStatus::New));
    }

    #[test]
    fn test_update_value_change_registers_language() {
        let mut project = project_with(vec![resource("a", "A")]);
        let comparison = MergeComparison {
            updated: vec![update_diff("a", "de", "", "Ah")],
            ..MergeComparison::default()
        };
        let resolutions = MergeResolutions {
            updates: HashMap::from([("a".to_string(), UpdateResolution::Update)]),
            ..MergeResolutions::default()
        };

        apply_merge(&mut project, &comparison, &resolutions);
        assert!(project.has_language("de"));
    }

    #[test]
    fn test_addition_replaces_archived_record() {
        let mut archived = resource("key", "old");
        archived.is_archived = true;
        let mut project = project_with(vec![archived]);

        let comparison = MergeComparison {
            added: vec![resource("key", "fresh")],
            ..MergeComparison::default()
        };
        apply_merge(&mut project, &comparison, &MergeResolutions::default());

        assert_eq!(project.resources.len(), 1);
        let key = project.find_resource("key").unwrap();
        assert!(!key.is_archived);
        assert_eq!(key.value(DEFAULT_LANG), "fresh");
        assert_eq!(key.status, Some(ResourceStatus::New));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let comparison = MergeComparison {
            added: vec![resource("new_key", "New")],
            updated: vec![update_diff("a", DEFAULT_LANG, "A", "A2")],
            removed: vec![resource("gone", "Bye")],
        };
        let resolutions = MergeResolutions {
            updates: HashMap::from([("a".to_string(), UpdateResolution::Update)]),
            removals: HashMap::from([("gone".to_string(), RemovalResolution::Keep)]),
        };

        let start = project_with(vec![resource("a", "A"), resource("gone", "Bye")]);
        let mut first = start.clone();
        let mut second = start.clone();
        apply_merge(&mut first, &comparison, &resolutions);
        apply_merge(&mut second, &comparison, &resolutions);

        assert_eq!(first.resources, second.resources);
        assert_eq!(first.languages, second.languages);
    }
}
