//! Apple `.strings` adapter.
//!
//! Matches `"key" = "value";` pairs with an optional `/* comment */`
//! block immediately before the pair, which becomes the record's
//! context. Files are read through a BOM-aware decoder since Xcode
//! historically emitted UTF-16 `.strings` files.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use encoding_rs_io::DecodeReaderBytesBuilder;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    traits::Parser,
    types::{Project, RawRecord, DEFAULT_LANG, NO_CONTEXT},
};

lazy_static! {
    static ref ENTRY_RE: Regex =
        Regex::new(r#"(?:/\*((?s:.*?))\*/\s*)?"(.*?)"\s*=\s*"(.*?)";"#).unwrap();
}

fn unescape(raw: &str) -> String {
    raw.replace("\\\"", "\"").replace("\\n", "\n")
}

fn escape(value: &str) -> String {
    value.replace('"', "\\\"").replace('\n', "\\n")
}

/// Parsed view of one `.strings` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub records: Vec<RawRecord>,
}

impl Format {
    /// Builds the export view of a project for one language. Mirrors the
    /// Android adapter's filtering: live resources only, empty values
    /// skipped except for the default language.
    pub fn from_project(project: &Project, lang_code: &str) -> Self {
        let records = project
            .live_resources()
            .filter_map(|r| {
                let value = r.value(lang_code);
                if value.is_empty() && lang_code != DEFAULT_LANG {
                    return None;
                }
                Some(RawRecord {
                    id: r.id.clone(),
                    context: Some(r.context.clone()),
                    values: [(DEFAULT_LANG.to_string(), value.to_string())]
                        .into_iter()
                        .collect(),
                    source_text: String::new(),
                })
            })
            .collect();
        Format { records }
    }
}

impl Parser for Format {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        for line in reader.lines() {
            content.push_str(&line?);
            content.push('\n');
        }

        if !content.contains('=') {
            return Err(Error::format_error(
                "no \"key\" = \"value\"; pairs found in the .strings file",
            ));
        }

        let mut records = Vec::new();
        for caps in ENTRY_RE.captures_iter(&content) {
            let comment = caps.get(1).map(|m| m.as_str().trim().to_string());
            let id = unescape(&caps[2]);
            let value = unescape(&caps[3]);
            let source_text = caps[0].trim().to_string();
            records.push(RawRecord {
                id,
                context: Some(comment.unwrap_or_else(|| NO_CONTEXT.to_string())),
                values: [(DEFAULT_LANG.to_string(), value)].into_iter().collect(),
                source_text,
            });
        }

        if records.is_empty() {
            return Err(Error::format_error(
                "no \"key\" = \"value\"; pairs found in the .strings file",
            ));
        }
        Ok(Format { records })
    }

    // Xcode writes UTF-16 with a BOM; decode before parsing.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        let decoder = DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);
        Self::from_reader(BufReader::new(decoder))
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut first = true;
        for record in &self.records {
            if !first {
                writer.write_all(b"\n")?;
            }
            first = false;

            if let Some(context) = &record.context
                && context != NO_CONTEXT
                && !context.is_empty()
            {
                writeln!(writer, "/* {} */", context)?;
            }
            let value = record
                .values
                .get(DEFAULT_LANG)
                .map(String::as_str)
                .unwrap_or("");
            writeln!(writer, "\"{}\" = \"{}\";", escape(&record.id), escape(value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_parse_pairs_with_comments() {
        let content = indoc! {r#"
            /* Greeting shown on launch */
            "hello" = "Hello";

            "bye" = "Goodbye";
        "#};
        let format = Format::from_str(content).unwrap();
        assert_eq!(format.records.len(), 2);

        let hello = &format.records[0];
        assert_eq!(hello.id, "hello");
        assert_eq!(hello.context.as_deref(), Some("Greeting shown on launch"));
        assert_eq!(hello.values.get(DEFAULT_LANG).unwrap(), "Hello");
        assert!(hello.source_text.starts_with("/* Greeting shown on launch */"));

        assert_eq!(format.records[1].context.as_deref(), Some(NO_CONTEXT));
    }

    #[test]
    fn test_escaped_quotes_and_newlines() {
        let content = r#""quote" = "She said \"hi\"\nto me";"#;
        let format = Format::from_str(content).unwrap();
        assert_eq!(
            format.records[0].values.get(DEFAULT_LANG).unwrap(),
            "She said \"hi\"\nto me"
        );
    }

    #[test]
    fn test_no_pairs_is_format_error() {
        let err = Format::from_str("// just a comment\n").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_garbage_with_equals_but_no_pairs_is_format_error() {
        let err = Format::from_str("a = b\n").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_round_trip() {
        let content = indoc! {r#"
            /* Title */
            "title" = "My \"App\"";

            "subtitle" = "Line one\nLine two";
        "#};
        let format = Format::from_str(content).unwrap();

        let mut out = Vec::new();
        format.to_writer(&mut out).unwrap();
        let reparsed = Format::from_bytes(&out).unwrap();

        assert_eq!(reparsed.records.len(), format.records.len());
        for (a, b) in reparsed.records.iter().zip(&format.records) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.context, b.context);
            assert_eq!(a.values, b.values);
        }
    }

    #[test]
    fn test_reads_utf16_file_with_bom() {
        use std::io::Write as _;

        let mut bytes: Vec<u8> = vec![0xFF, 0xFE];
        for unit in "\"hello\" = \"Bonjour\";".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let format = Format::read_from(file.path()).unwrap();
        assert_eq!(format.records[0].values.get(DEFAULT_LANG).unwrap(), "Bonjour");
    }
}
