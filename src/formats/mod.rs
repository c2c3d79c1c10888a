//! File format adapters.
//!
//! The two native formats (`android_strings`, `strings`) implement the
//! [`Parser`] trait and carry per-record context and source fragments.
//! The tabular adapter (`csv`) uses a two-phase header/records flow, and
//! `markdown` is export-only.
//!
//! [`Parser`]: crate::traits::Parser

pub mod android_strings;
pub mod csv;
pub mod markdown;
pub mod strings;

use crate::{
    error::Error,
    traits::Parser,
    types::{Platform, Project, RawRecord, DEFAULT_LANG},
};

/// Infers the platform from a source file's extension.
pub fn detect_platform(file_name: &str) -> Option<Platform> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "xml" => Some(Platform::Android),
        "strings" => Some(Platform::Ios),
        _ => None,
    }
}

/// Parses a native source file's bytes into raw records.
pub fn parse_native(platform: Platform, bytes: &[u8]) -> Result<Vec<RawRecord>, Error> {
    match platform {
        Platform::Android => Ok(android_strings::Format::from_bytes(bytes)?.records),
        Platform::Ios => Ok(strings::Format::from_bytes(bytes)?.records),
    }
}

/// Renders a project in its native format for one language.
pub fn export_native(project: &Project, lang_code: &str) -> Result<String, Error> {
    let platform = project
        .platform
        .ok_or_else(|| Error::validation_error("project has no source file platform"))?;

    let mut out = Vec::new();
    match platform {
        Platform::Android => {
            android_strings::Format::from_project(project, lang_code).to_writer(&mut out)?
        }
        Platform::Ios => strings::Format::from_project(project, lang_code).to_writer(&mut out)?,
    }
    String::from_utf8(out).map_err(|e| Error::format_error(e.to_string()))
}

/// Suggests a file name for a native export. The default language keeps
/// the imported name; other languages get a language-suffixed one.
pub fn export_file_name(project: &Project, lang_code: &str) -> String {
    let platform = project.platform;
    if lang_code == DEFAULT_LANG {
        if let Some(name) = &project.file_name {
            return name.clone();
        }
    }
    match platform {
        Some(Platform::Android) => {
            if lang_code == DEFAULT_LANG {
                "strings.xml".to_string()
            } else {
                format!("strings-{lang_code}.xml")
            }
        }
        Some(Platform::Ios) => {
            if lang_code == DEFAULT_LANG {
                "Localizable.strings".to_string()
            } else {
                format!("Localizable-{lang_code}.strings")
            }
        }
        None => format!("{lang_code}.txt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platform() {
        assert_eq!(detect_platform("strings.xml"), Some(Platform::Android));
        assert_eq!(detect_platform("Strings.XML"), Some(Platform::Android));
        assert_eq!(
            detect_platform("Localizable.strings"),
            Some(Platform::Ios)
        );
        assert_eq!(detect_platform("data.csv"), None);
        assert_eq!(detect_platform("noextension"), None);
    }

    #[test]
    fn test_parse_native_dispatch() {
        let xml = b"<resources><string name=\"a\">A</string></resources>";
        let records = parse_native(Platform::Android, xml).unwrap();
        assert_eq!(records[0].id, "a");

        let strings = b"\"a\" = \"A\";";
        let records = parse_native(Platform::Ios, strings).unwrap();
        assert_eq!(records[0].id, "a");
    }

    #[test]
    fn test_export_native_requires_platform() {
        let project = Project::new("p", "Test");
        let err = export_native(&project, DEFAULT_LANG).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_export_file_name() {
        let mut project = Project::new("p", "Test");
        project.platform = Some(Platform::Android);
        project.file_name = Some("app_strings.xml".to_string());
        assert_eq!(export_file_name(&project, DEFAULT_LANG), "app_strings.xml");
        assert_eq!(export_file_name(&project, "fr"), "strings-fr.xml");

        project.platform = Some(Platform::Ios);
        project.file_name = None;
        assert_eq!(
            export_file_name(&project, DEFAULT_LANG),
            "Localizable.strings"
        );
        assert_eq!(export_file_name(&project, "fr"), "Localizable-fr.strings");
    }
}
