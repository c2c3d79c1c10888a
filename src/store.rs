//! On-disk project persistence and snapshot import/export.
//!
//! Projects are stored as one JSON file per project under a root
//! directory. Snapshots bundle every project into a single versioned
//! JSON document for backup and transfer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    types::{current_timestamp, Project},
};

/// Version tag written into snapshots; import rejects anything else.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full-workspace backup document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_version: u32,
    pub export_date: String,
    pub projects: Vec<Project>,
}

/// One-JSON-file-per-project store rooted at a directory.
#[derive(Debug)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Opens a store, creating the root directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            Error::persistence_error(
                format!("failed to create store directory {}", root.display()),
                Some(Box::new(e)),
            )
        })?;
        Ok(ProjectStore { root })
    }

    fn project_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Writes one project, replacing any previous file for its id.
    pub fn save(&self, project: &Project) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(project)?;
        fs::write(self.project_path(&project.id), json).map_err(|e| {
            Error::persistence_error(
                format!("failed to save project '{}'", project.id),
                Some(Box::new(e)),
            )
        })
    }

    /// Loads every stored project, most recently modified first.
    /// Non-JSON files under the root are ignored.
    pub fn load_all(&self) -> Result<Vec<Project>, Error> {
        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let project: Project = serde_json::from_str(&content)?;
            projects.push(project);
        }
        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(projects)
    }

    /// Removes one project's file. Missing files are not an error.
    pub fn delete(&self, id: &str) -> Result<(), Error> {
        match fs::remove_file(self.project_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence_error(
                format!("failed to delete project '{id}'"),
                Some(Box::new(e)),
            )),
        }
    }

    /// Removes every stored project file.
    pub fn clear(&self) -> Result<(), Error> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Wraps projects in a versioned snapshot document.
pub fn build_snapshot(projects: &[Project]) -> Snapshot {
    Snapshot {
        snapshot_version: SNAPSHOT_VERSION,
        export_date: current_timestamp().to_string(),
        projects: projects.to_vec(),
    }
}

/// Parses and validates a snapshot document.
pub fn parse_snapshot(content: &str) -> Result<Snapshot, Error> {
    let snapshot: Snapshot = serde_json::from_str(content)?;
    if snapshot.snapshot_version != SNAPSHOT_VERSION {
        return Err(Error::validation_error(format!(
            "unsupported snapshot version {}",
            snapshot.snapshot_version
        )));
    }
    Ok(snapshot)
}
