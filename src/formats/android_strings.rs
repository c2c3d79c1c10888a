//! Android `strings.xml` adapter.
//!
//! Parses singular `<string>` elements into raw records. A comment
//! immediately preceding a `<string>` element becomes its context, and
//! each record carries a reconstructed source fragment for the
//! provenance view. Export writes one `<string>` per live resource for a
//! single language, with the context as a preceding comment.

use std::io::{BufRead, Write};

use quick_xml::{
    Reader, Writer,
    escape::escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    error::Error,
    traits::Parser,
    types::{Project, RawRecord, DEFAULT_LANG, NO_CONTEXT},
};

/// Parsed view of one Android resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub records: Vec<RawRecord>,
}

impl Format {
    /// Builds the export view of a project for one language: live
    /// resources only, and for non-default languages entries without a
    /// value are left out entirely.
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
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut records = Vec::new();
        let mut pending_comment: Option<String> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Comment(e)) => {
                    let text = e.unescape().map_err(Error::XmlParse)?;
                    pending_comment = Some(text.trim().to_string());
                }
                Ok(Event::Start(ref e)) if e.name().as_ref() == b"string" => {
                    let name = string_name(e)?;
                    let value = read_string_value(&mut xml_reader)?;
                    records.push(build_record(name, value, pending_comment.take()));
                }
                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"string" => {
                    let name = string_name(e)?;
                    records.push(build_record(name, String::new(), pending_comment.take()));
                }
                // Any other element or text between a comment and a
                // <string> detaches the comment.
                Ok(Event::Start(_)) | Ok(Event::Empty(_)) | Ok(Event::Text(_)) => {
                    pending_comment = None;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::XmlParse(e)),
            }
            buf.clear();
        }

        if records.is_empty() {
            return Err(Error::format_error("no <string> tags found in the XML file"));
        }
        Ok(Format { records })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', 4);

        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        xml_writer.write_event(Event::Start(BytesStart::new("resources")))?;

        for record in &self.records {
            if let Some(context) = &record.context
                && context != NO_CONTEXT
                && !context.is_empty()
            {
                xml_writer.write_event(Event::Comment(BytesText::new(&format!(
                    " {} ",
                    context
                ))))?;
            }
            let mut elem = BytesStart::new("string");
            elem.push_attribute(("name", record.id.as_str()));
            xml_writer.write_event(Event::Start(elem))?;
            let value = record
                .values
                .get(DEFAULT_LANG)
                .map(String::as_str)
                .unwrap_or("");
            xml_writer.write_event(Event::Text(BytesText::new(value)))?;
            xml_writer.write_event(Event::End(BytesEnd::new("string")))?;
        }

        xml_writer.write_event(Event::End(BytesEnd::new("resources")))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn string_name(e: &BytesStart) -> Result<String, Error> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::format_error(e.to_string()))?;
        if attr.key.as_ref() == b"name" {
            return Ok(attr.unescape_value()?.to_string());
        }
    }
    Err(Error::format_error("string tag missing 'name' attribute"))
}

fn read_string_value<R: BufRead>(xml_reader: &mut Reader<R>) -> Result<String, Error> {
    let mut buf = Vec::new();
    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => return Ok(e.unescape().map_err(Error::XmlParse)?.to_string()),
            Ok(Event::End(_)) => return Ok(String::new()),
            Ok(Event::Eof) => return Err(Error::format_error("unexpected EOF inside <string>")),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }
}

fn build_record(name: String, value: String, comment: Option<String>) -> RawRecord {
    let source_text = match &comment {
        Some(c) => format!(
            "<!-- {} -->\n    <string name=\"{}\">{}</string>",
            c,
            escape(name.as_str()),
            escape(value.as_str())
        ),
        None => format!(
            "<string name=\"{}\">{}</string>",
            escape(name.as_str()),
            escape(value.as_str())
        ),
    };
    RawRecord {
        id: name,
        context: Some(comment.unwrap_or_else(|| NO_CONTEXT.to_string())),
        values: [(DEFAULT_LANG.to_string(), value)].into_iter().collect(),
        source_text,
    }
}
