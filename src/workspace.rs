//! The top-level orchestration layer: owns the project list, routes
//! imports through classification and reconciliation, applies merges,
//! and keeps every mutation persisted through a [`ProjectStore`].

use unic_langid::LanguageIdentifier;

use crate::{
    classifier::{analyze_headers, resolve_columns, ColumnResolutions, HeaderAnalysis},
    error::Error,
    formats,
    merge,
    reconcile::{reconcile, ImportProfile},
    store::{build_snapshot, parse_snapshot, ProjectStore},
    translate,
    types::{current_timestamp, MergeComparison, MergeResolutions, Project, DEFAULT_LANG},
};

/// Outcome of starting a translation-table update: either the file can
/// be reconciled right away, or unrecognized columns need mapping first.
#[derive(Debug)]
pub enum TranslationUpdate {
    /// Reconciliation is blocked until the caller resolves these columns
    /// and calls [`Workspace::resume_translation_update`].
    NeedsMapping(HeaderAnalysis),
    /// The reconciliation result; `None` means the file matched the
    /// current state exactly.
    Comparison(Option<MergeComparison>),
}

/// A store-backed collection of projects with one active selection.
#[derive(Debug)]
pub struct Workspace {
    store: ProjectStore,
    pub projects: Vec<Project>,
    pub active_id: Option<String>,
}

impl Workspace {
    /// Opens the workspace rooted at `root`, loading every stored
    /// project and selecting the most recently modified one.
    pub fn open<P: AsRef<std::path::Path>>(root: P) -> Result<Self, Error> {
        let store = ProjectStore::open(root)?;
        let projects = store.load_all()?;
        let active_id = projects.first().map(|p| p.id.clone());
        Ok(Workspace {
            store,
            projects,
            active_id,
        })
    }

    fn new_project_id(&self) -> String {
        format!("proj_{}_{}", current_timestamp(), self.projects.len())
    }

    /// The active project, or a validation error when none is selected.
    pub fn active(&self) -> Result<&Project, Error> {
        let id = self
            .active_id
            .as_deref()
            .ok_or_else(|| Error::validation_error("no project selected"))?;
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::validation_error(format!("no project with id '{id}'")))
    }

    fn active_mut(&mut self) -> Result<&mut Project, Error> {
        let id = self
            .active_id
            .clone()
            .ok_or_else(|| Error::validation_error("no project selected"))?;
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::validation_error(format!("no project with id '{id}'")))
    }

    /// Creates, persists and selects a new empty project.
    pub fn create_project(&mut self, name: &str) -> Result<&Project, Error> {
        let project = Project::new(self.new_project_id(), name);
        self.store.save(&project)?;
        self.active_id = Some(project.id.clone());
        self.projects.insert(0, project);
        Ok(&self.projects[0])
    }

    pub fn select_project(&mut self, id: &str) -> Result<(), Error> {
        if !self.projects.iter().any(|p| p.id == id) {
            return Err(Error::validation_error(format!(
                "no project with id '{id}'"
            )));
        }
        self.active_id = Some(id.to_string());
        Ok(())
    }

    pub fn rename_project(&mut self, name: &str) -> Result<(), Error> {
        let project = self.active_mut()?;
        project.name = name.to_string();
        project.touch();
        self.persist_active()
    }

    /// Deletes the active project from memory and disk.
    pub fn delete_project(&mut self) -> Result<(), Error> {
        let id = self.active()?.id.clone();
        self.store.delete(&id)?;
        self.projects.retain(|p| p.id != id);
        self.active_id = self.projects.first().map(|p| p.id.clone());
        Ok(())
    }

    fn persist_active(&self) -> Result<(), Error> {
        self.store.save(self.active()?)
    }

    /// Initial upload of a native source file into the active project.
    ///
    /// Replaces the resource set wholesale, fixes the project's platform
    /// from the file extension, and resets the language set to just the
    /// default language.
    pub fn import_source_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), Error> {
        let platform = formats::detect_platform(file_name).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "'{file_name}' is not a supported source file (.xml or .strings)"
            ))
        })?;
        let records = formats::parse_native(platform, bytes)?;

        let mut resources = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for record in records {
            if seen.insert(record.id.clone()) {
                resources.push(record.into_resource());
            }
        }

        let project = self.active_mut()?;
        project.resources = resources;
        project.platform = Some(platform);
        project.file_name = Some(file_name.to_string());
        project.languages = vec![DEFAULT_LANG.to_string()];
        project.touch();
        self.persist_active()
    }

    /// Reconciles a refreshed native source file against the active
    /// project. `Ok(None)` means the file matched the current state.
    pub fn start_source_update(&self, bytes: &[u8]) -> Result<Option<MergeComparison>, Error> {
        let project = self.active()?;
        let platform = project
            .platform
            .ok_or_else(|| Error::validation_error("project has no source file yet"))?;
        let incoming = formats::parse_native(platform, bytes)?;
        Ok(reconcile(
            &project.resources,
            &incoming,
            &ImportProfile::native_source(),
        ))
    }

    /// Starts a translation-table update. When the header row contains
    /// unrecognized columns, returns them for user resolution instead of
    /// a comparison.
    pub fn start_translation_update(&self, bytes: &[u8]) -> Result<TranslationUpdate, Error> {
        let project = self.active()?;
        let headers = formats::csv::parse_headers(bytes)?;
        let analysis = analyze_headers(&headers, &project.languages)?;
        if analysis.needs_resolution() {
            return Ok(TranslationUpdate::NeedsMapping(analysis));
        }
        let comparison = self.resume_translation_update(bytes, &ColumnResolutions::new())?;
        Ok(TranslationUpdate::Comparison(comparison))
    }

    /// Finishes a translation-table update once every unrecognized
    /// column has a resolution.
    pub fn resume_translation_update(
        &self,
        bytes: &[u8],
        resolutions: &ColumnResolutions,
    ) -> Result<Option<MergeComparison>, Error> {
        let project = self.active()?;
        let headers = formats::csv::parse_headers(bytes)?;
        let plan = resolve_columns(&headers, resolutions)?;
        let incoming = formats::csv::parse_records(bytes, &plan)?;
        Ok(reconcile(
            &project.resources,
            &incoming,
            &ImportProfile::translation_table(),
        ))
    }

    /// Commits resolved changes to the active project, then persists.
    ///
    /// The in-memory mutation happens first; if the save fails the
    /// mutation is kept and the error reported, so memory and disk may
    /// diverge until the next successful save.
    pub fn apply_merge(
        &mut self,
        comparison: &MergeComparison,
        resolutions: &MergeResolutions,
    ) -> Result<(), Error> {
        let project = self.active_mut()?;
        merge::apply_merge(project, comparison, resolutions);
        self.persist_active()
    }

    /// Manual edit of one value cell. Clears the resource's change tag.
    pub fn edit_value(&mut self, id: &str, lang_code: &str, value: &str) -> Result<(), Error> {
        let project = self.active_mut()?;
        let resource = project
            .find_resource_mut(id)
            .ok_or_else(|| Error::validation_error(format!("no resource with id '{id}'")))?;
        resource
            .values
            .insert(lang_code.to_string(), value.to_string());
        resource.status = None;
        project.touch();
        self.persist_active()
    }

    /// Manual edit of a resource's context. Clears the change tag.
    pub fn edit_context(&mut self, id: &str, context: &str) -> Result<(), Error> {
        let project = self.active_mut()?;
        let resource = project
            .find_resource_mut(id)
            .ok_or_else(|| Error::validation_error(format!("no resource with id '{id}'")))?;
        resource.context = context.to_string();
        resource.status = None;
        project.touch();
        self.persist_active()
    }

    /// Clears the `new`/`updated` tag on one resource.
    pub fn acknowledge(&mut self, id: &str) -> Result<(), Error> {
        let project = self.active_mut()?;
        if let Some(resource) = project.find_resource_mut(id) {
            resource.status = None;
        }
        self.persist_active()
    }

    /// Clears every pending change tag in the active project.
    pub fn acknowledge_all(&mut self) -> Result<(), Error> {
        let project = self.active_mut()?;
        for resource in &mut project.resources {
            resource.status = None;
        }
        self.persist_active()
    }

    /// Adds a language column. The code must be a valid language
    /// identifier and not already present.
    pub fn add_language(&mut self, lang_code: &str) -> Result<(), Error> {
        if lang_code.parse::<LanguageIdentifier>().is_err() {
            return Err(Error::validation_error(format!(
                "'{lang_code}' is not a valid language code"
            )));
        }
        let project = self.active_mut()?;
        if project.has_language(lang_code) {
            return Err(Error::validation_error(format!(
                "language '{lang_code}' already exists"
            )));
        }
        project.add_language(lang_code);
        project.touch();
        self.persist_active()
    }

    /// Removes a language column and every value stored under it. The
    /// default language cannot be removed.
    pub fn remove_language(&mut self, lang_code: &str) -> Result<(), Error> {
        if lang_code == DEFAULT_LANG {
            return Err(Error::validation_error(
                "the default language cannot be removed",
            ));
        }
        let project = self.active_mut()?;
        if !project.has_language(lang_code) {
            return Err(Error::validation_error(format!(
                "no language '{lang_code}' in this project"
            )));
        }
        project.languages.retain(|l| l != lang_code);
        for resource in &mut project.resources {
            resource.values.remove(lang_code);
        }
        project.touch();
        self.persist_active()
    }

    /// Renders the active project in its native format for one language.
    pub fn export_native(&self, lang_code: &str) -> Result<String, Error> {
        formats::export_native(self.active()?, lang_code)
    }

    /// Exports the active project as a translation table.
    pub fn export_csv(&self) -> Result<String, Error> {
        formats::csv::export(self.active()?)
    }

    /// Exports the active project as a markdown table.
    pub fn export_markdown(&self) -> Result<String, Error> {
        Ok(formats::markdown::export(self.active()?))
    }

    /// Builds the machine-translation request batch for the active
    /// project.
    pub fn build_translation_batch(&self) -> Result<Vec<translate::TranslationRequest>, Error> {
        Ok(translate::build_translation_batch(self.active()?))
    }

    /// Parses, verifies and applies a translation provider response for
    /// one target language. Nothing is applied when verification fails.
    pub fn apply_translation_response(
        &mut self,
        lang_code: &str,
        body: &str,
    ) -> Result<(), Error> {
        let batch = self.build_translation_batch()?;
        let translations = translate::parse_translation_response(body)?;
        translate::verify_placeholders(&batch, &translations)?;
        let project = self.active_mut()?;
        translate::apply_translations(project, lang_code, &translations);
        self.persist_active()
    }

    /// Serializes every project into a snapshot document.
    pub fn export_snapshot(&self) -> Result<String, Error> {
        let snapshot = build_snapshot(&self.projects);
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replaces the whole workspace with a snapshot's contents, on disk
    /// and in memory.
    pub fn import_snapshot(&mut self, content: &str) -> Result<(), Error> {
        let snapshot = parse_snapshot(content)?;
        self.store.clear()?;
        for project in &snapshot.projects {
            self.store.save(project)?;
        }
        self.projects = snapshot.projects;
        self.projects
            .sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        self.active_id = self.projects.first().map(|p| p.id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::types::{RemovalResolution, ResourceStatus, UpdateResolution};

    fn workspace_with_project(dir: &TempDir) -> Workspace {
        let mut ws = Workspace::open(dir.path()).unwrap();
        ws.create_project("Test").unwrap();
        ws
    }

    const XML_V1: &[u8] =
        b"<resources><string name=\"hello\">Hello</string><string name=\"bye\">Bye</string></resources>";
    const XML_V2: &[u8] =
        b"<resources><string name=\"hello\">Hello there</string><string name=\"welcome\">Welcome</string></resources>";

    #[test]
    fn test_create_select_delete_project() {
        let dir = TempDir::new().unwrap();
        let mut ws = Workspace::open(dir.path()).unwrap();

        ws.create_project("First").unwrap();
        let first_id = ws.active().unwrap().id.clone();
        ws.create_project("Second").unwrap();
        assert_eq!(ws.projects.len(), 2);
        assert_ne!(ws.active().unwrap().id, first_id);

        ws.select_project(&first_id).unwrap();
        assert_eq!(ws.active().unwrap().name, "First");

        ws.delete_project().unwrap();
        assert_eq!(ws.projects.len(), 1);
        assert_eq!(ws.active().unwrap().name, "Second");
    }

    #[test]
    fn test_no_selection_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        assert!(matches!(ws.active(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_import_source_file_sets_platform_and_resources() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);

        ws.import_source_file("strings.xml", XML_V1).unwrap();
        let project = ws.active().unwrap();
        assert_eq!(project.platform, Some(crate::types::Platform::Android));
        assert_eq!(project.file_name.as_deref(), Some("strings.xml"));
        assert_eq!(project.resources.len(), 2);
        assert_eq!(project.languages, vec![DEFAULT_LANG.to_string()]);
    }

    #[test]
    fn test_import_unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        let err = ws.import_source_file("notes.txt", b"x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_import_deduplicates_ids() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        let xml = b"<resources><string name=\"a\">first</string><string name=\"a\">second</string></resources>";
        ws.import_source_file("strings.xml", xml).unwrap();

        let project = ws.active().unwrap();
        assert_eq!(project.resources.len(), 1);
        assert_eq!(project.resources[0].value(DEFAULT_LANG), "first");
    }

    #[test]
    fn test_source_update_and_apply() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        let comparison = ws.start_source_update(XML_V2).unwrap().unwrap();
        assert_eq!(comparison.added.len(), 1);
        assert_eq!(comparison.updated.len(), 1);
        assert_eq!(comparison.removed.len(), 1);

        let mut resolutions = MergeResolutions::default();
        resolutions
            .updates
            .insert("hello".to_string(), UpdateResolution::Update);
        resolutions
            .removals
            .insert("bye".to_string(), RemovalResolution::Keep);
        ws.apply_merge(&comparison, &resolutions).unwrap();

        let project = ws.active().unwrap();
        assert_eq!(
            project.find_resource("hello").unwrap().value(DEFAULT_LANG),
            "Hello there"
        );
        assert!(project.find_resource("bye").unwrap().is_archived);
        assert_eq!(
            project.find_resource("welcome").unwrap().status,
            Some(ResourceStatus::New)
        );
    }

    #[test]
    fn test_source_update_no_change_is_none() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();
        assert!(ws.start_source_update(XML_V1).unwrap().is_none());
    }

    #[test]
    fn test_translation_update_needs_mapping_then_resumes() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        let csv = b"id,Fran\xc3\xa7ais\nhello,Bonjour\n";
        let update = ws.start_translation_update(csv).unwrap();
        let analysis = match update {
            TranslationUpdate::NeedsMapping(a) => a,
            TranslationUpdate::Comparison(_) => panic!("expected mapping request"),
        };
        assert_eq!(analysis.unrecognized, vec!["Français".to_string()]);

        let resolutions = ColumnResolutions::from([(
            "Français".to_string(),
            crate::classifier::ColumnResolution::Map {
                lang_code: "fr".to_string(),
            },
        )]);
        let comparison = ws.resume_translation_update(csv, &resolutions).unwrap().unwrap();
        assert_eq!(comparison.updated.len(), 1);
        assert!(comparison.added.is_empty());
        assert!(comparison.removed.is_empty());

        ws.apply_merge(&comparison, &MergeResolutions::accept_all(&comparison))
            .unwrap();
        let project = ws.active().unwrap();
        assert!(project.has_language("fr"));
        assert_eq!(project.find_resource("hello").unwrap().value("fr"), "Bonjour");
    }

    #[test]
    fn test_translation_update_with_value_columns_goes_straight_to_comparison() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        let csv = b"id,value_fr\nhello,Bonjour\n";
        match ws.start_translation_update(csv).unwrap() {
            TranslationUpdate::Comparison(Some(c)) => assert_eq!(c.updated.len(), 1),
            other => panic!("expected a comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_value_clears_status() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        let comparison = ws.start_source_update(XML_V2).unwrap().unwrap();
        ws.apply_merge(&comparison, &MergeResolutions::accept_all(&comparison))
            .unwrap();
        assert!(ws.active().unwrap().has_pending_changes());

        ws.edit_value("hello", DEFAULT_LANG, "Hi!").unwrap();
        assert_eq!(ws.active().unwrap().find_resource("hello").unwrap().status, None);
    }

    #[test]
    fn test_acknowledge_all_clears_pending() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();
        let comparison = ws.start_source_update(XML_V2).unwrap().unwrap();
        ws.apply_merge(&comparison, &MergeResolutions::accept_all(&comparison))
            .unwrap();

        ws.acknowledge_all().unwrap();
        assert!(!ws.active().unwrap().has_pending_changes());
    }

    #[test]
    fn test_language_management() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        ws.add_language("fr").unwrap();
        assert!(ws.active().unwrap().has_language("fr"));
        assert!(matches!(ws.add_language("fr"), Err(Error::Validation(_))));
        assert!(matches!(
            ws.add_language("not a code"),
            Err(Error::Validation(_))
        ));

        ws.edit_value("hello", "fr", "Bonjour").unwrap();
        ws.remove_language("fr").unwrap();
        let project = ws.active().unwrap();
        assert!(!project.has_language("fr"));
        assert_eq!(project.find_resource("hello").unwrap().value("fr"), "");

        assert!(matches!(
            ws.remove_language(DEFAULT_LANG),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_translation_response_flow() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();

        let body = r#"[{"id":"hello","translation":"Bonjour"},{"id":"bye","translation":"Au revoir"}]"#;
        ws.apply_translation_response("fr", body).unwrap();

        let project = ws.active().unwrap();
        assert!(project.has_language("fr"));
        assert_eq!(project.find_resource("bye").unwrap().value("fr"), "Au revoir");
    }

    #[test]
    fn test_snapshot_round_trip_replaces_workspace() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace_with_project(&dir);
        ws.import_source_file("strings.xml", XML_V1).unwrap();
        let snapshot = ws.export_snapshot().unwrap();

        let dir2 = TempDir::new().unwrap();
        let mut ws2 = Workspace::open(dir2.path()).unwrap();
        ws2.create_project("Will be replaced").unwrap();
        ws2.import_snapshot(&snapshot).unwrap();

        assert_eq!(ws2.projects.len(), 1);
        assert_eq!(ws2.active().unwrap().name, "Test");
        assert_eq!(ws2.active().unwrap().resources.len(), 2);

        // The replacement also landed on disk.
        let reopened = Workspace::open(dir2.path()).unwrap();
        assert_eq!(reopened.projects.len(), 1);
        assert_eq!(reopened.projects[0].name, "Test");
    }
}
