//! Markdown table export, for pasting a project into docs or reviews.

use crate::types::Project;

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br/>")
}

/// Renders a project's live resources as a GitHub-flavored markdown
/// table with one value column per project language.
pub fn export(project: &Project) -> String {
    let mut out = String::new();

    out.push_str("| String ID | Context |");
    for lang in &project.languages {
        out.push_str(&format!(" Value ({lang}) |"));
    }
    out.push('\n');

    out.push_str("|---|---|");
    for _ in &project.languages {
        out.push_str("---|");
    }
    out.push('\n');

    for resource in project.live_resources() {
        out.push_str(&format!(
            "| `{}` | {} |",
            escape_cell(&resource.id),
            escape_cell(&resource.context)
        ));
        for lang in &project.languages {
            out.push_str(&format!(" {} |", escape_cell(resource.value(lang))));
        }
        out.push('\n');
    }

    out
}
