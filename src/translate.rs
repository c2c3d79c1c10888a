//! Machine-translation batch plumbing.
//!
//! Builds the request payload from a project's default-language values,
//! renders the provider prompt, parses the provider's JSON response, and
//! verifies that format placeholders survived translation before any
//! value is applied. Network transport is the caller's concern.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    types::{Project, DEFAULT_LANG},
};

lazy_static! {
    // printf-style placeholders as they appear in Android/iOS resources,
    // including positional ones (%1$s, %2$d).
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"%(?:\d+\$)?[sdf@]").unwrap();
}

/// One string sent to the translation provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub id: String,
    pub source_text: String,
}

/// One translated string returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslatedString {
    pub id: String,
    pub translation: String,
}

/// Collects the default-language values of all live resources into a
/// request batch. Resources without a default value are left out.
pub fn build_translation_batch(project: &Project) -> Vec<TranslationRequest> {
    project
        .live_resources()
        .filter_map(|r| {
            let source_text = r.value(DEFAULT_LANG);
            if source_text.is_empty() {
                return None;
            }
            Some(TranslationRequest {
                id: r.id.clone(),
                source_text: source_text.to_string(),
            })
        })
        .collect()
}

/// Renders the provider prompt for a batch: instructions followed by the
/// batch as a JSON array.
pub fn translation_prompt(lang_code: &str, batch: &[TranslationRequest]) -> Result<String, Error> {
    let payload = serde_json::to_string_pretty(batch)?;
    Ok(format!(
        "Translate the following app strings to the language with code \"{lang_code}\".\n\
         Keep all format placeholders (such as %s, %1$d or %@) exactly as they are.\n\
         Respond with a JSON array of objects with \"id\" and \"translation\" fields,\n\
         one per input string, and nothing else.\n\n{payload}"
    ))
}

/// Parses the provider's response body. Tolerates a fenced code block
/// around the JSON, since chat-style providers often add one.
pub fn parse_translation_response(body: &str) -> Result<Vec<TranslatedString>, Error> {
    let trimmed = body.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(json)
        .map_err(|e| Error::TranslationProvider(format!("response was not valid JSON: {e}")))
}

fn placeholders(text: &str) -> Vec<String> {
    let mut found: Vec<String> = PLACEHOLDER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    found.sort();
    found
}

/// Checks that every translation preserves its source's placeholder
/// multiset. Fails on the first string that dropped or altered one, and
/// on translations for ids that were never requested.
pub fn verify_placeholders(
    batch: &[TranslationRequest],
    translations: &[TranslatedString],
) -> Result<(), Error> {
    for translated in translations {
        let request = batch
            .iter()
            .find(|r| r.id == translated.id)
            .ok_or_else(|| {
                Error::TranslationProvider(format!(
                    "response contains unknown id '{}'",
                    translated.id
                ))
            })?;
        if placeholders(&request.source_text) != placeholders(&translated.translation) {
            return Err(Error::TranslationProvider(format!(
                "placeholder mismatch in '{}': source '{}' vs translation '{}'",
                translated.id, request.source_text, translated.translation
            )));
        }
    }
    Ok(())
}

/// Writes verified translations into the project and registers the
/// target language. Unknown ids are skipped.
pub fn apply_translations(
    project: &mut Project,
    lang_code: &str,
    translations: &[TranslatedString],
) {
    for translated in translations {
        if let Some(resource) = project.find_resource_mut(&translated.id) {
            resource
                .values
                .insert(lang_code.to_string(), translated.translation.clone());
        }
    }
    project.add_language(lang_code);
    project.touch();
}
