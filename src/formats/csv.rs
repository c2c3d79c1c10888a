//! Tabular (CSV) adapter for translation tables.
//!
//! Unlike the native formats this adapter does not implement [`Parser`]:
//! tabular imports are a two-phase flow. The header row is read first and
//! classified (see [`crate::classifier`]); records are only built once
//! every column has a resolved purpose.
//!
//! [`Parser`]: crate::traits::Parser

use std::collections::HashSet;

use crate::{
    classifier::ResolvedColumn,
    error::Error,
    types::{Project, RawRecord, NO_CONTEXT},
};

/// Reads the header row of a tabular file.
pub fn parse_headers(content: &[u8]) -> Result<Vec<String>, Error> {
    let mut reader = csv::Reader::from_reader(content);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(Error::format_error("the file is empty"));
    }
    Ok(headers)
}

/// Builds records from the data rows using a resolved column plan.
///
/// Rows whose width does not match the plan are skipped, as are rows with
/// an empty id. Duplicate ids keep the first occurrence. Records carry no
/// context field when the plan has no context column, so reconciliation
/// will not see context changes for such files.
pub fn parse_records(content: &[u8], plan: &[ResolvedColumn]) -> Result<Vec<RawRecord>, Error> {
    let id_index = plan
        .iter()
        .position(|c| *c == ResolvedColumn::Id)
        .ok_or_else(|| Error::validation_error("file must contain an 'id' column"))?;
    let context_index = plan.iter().position(|c| *c == ResolvedColumn::Context);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let mut records = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in reader.records() {
        let row = row?;
        if row.len() != plan.len() {
            continue;
        }
        let id = row.get(id_index).unwrap_or("").trim().to_string();
        if id.is_empty() || !seen.insert(id.clone()) {
            continue;
        }

        // An empty context cell means "no context", same as a native file
        // entry without a comment.
        let context = context_index.map(|i| {
            let cell = row.get(i).unwrap_or("");
            if cell.is_empty() {
                NO_CONTEXT.to_string()
            } else {
                cell.to_string()
            }
        });
        let values = plan
            .iter()
            .enumerate()
            .filter_map(|(i, col)| match col {
                ResolvedColumn::Value(code) => {
                    Some((code.clone(), row.get(i).unwrap_or("").to_string()))
                }
                _ => None,
            })
            .collect();

        records.push(RawRecord {
            id,
            context,
            values,
            source_text: String::new(),
        });
    }

    Ok(records)
}

/// Exports a project's live resources as a translation table, one
/// `value_<code>` column per project language.
pub fn export(project: &Project) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["id".to_string(), "context".to_string()];
    header.extend(project.languages.iter().map(|l| format!("value_{l}")));
    writer.write_record(&header)?;

    for resource in project.live_resources() {
        let mut row = vec![resource.id.clone(), resource.context.clone()];
        row.extend(
            project
                .languages
                .iter()
                .map(|l| resource.value(l).to_string()),
        );
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::format_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::format_error(e.to_string()))
}
