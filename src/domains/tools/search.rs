//! Catalog search and image link normalization.

use super::model::Tool;

const DRIVE_HOST: &str = "drive.google.com";

/// Filter tools whose name or description contains `term`, ignoring case.
///
/// The term is trimmed first; an empty term matches every tool.
pub fn search_tools(tools: Vec<Tool>, term: &str) -> Vec<Tool> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return tools;
    }

    tools
        .into_iter()
        .filter(|tool| matches_term(tool, &needle))
        .collect()
}

fn matches_term(tool: &Tool, needle: &str) -> bool {
    tool.name.to_lowercase().contains(needle)
        || tool
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Rewrite Google Drive share links into direct-view links.
///
/// Handles `/file/d/<id>/...` and `?id=<id>` forms. Anything else is returned
/// trimmed but otherwise untouched.
pub fn normalize_image_url(url: &str) -> String {
    let url = url.trim();
    if !url.contains(DRIVE_HOST) {
        return url.to_string();
    }

    let file_id = if let Some((_, rest)) = url.split_once("/file/d/") {
        rest.split('/').next()
    } else if let Some((_, rest)) = url.split_once("id=") {
        rest.split('&').next()
    } else {
        None
    };

    match file_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("https://{}/uc?export=view&id={}", DRIVE_HOST, id),
        None => url.to_string(),
    }
}
