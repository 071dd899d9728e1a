//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, MergeErrors};
use owo_colors::OwoColorize;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Merge(errors) => render_errors(errors),
        other => other.to_string(),
    }
}

/// One line per merge error: `kind at path: message`.
pub fn render_errors(errors: &MergeErrors) -> String {
    let mut lines = vec![format!(
        "{} ({} error{})",
        "Merge failed".bold(),
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    )];
    for error in errors {
        lines.push(format!(
            "  {} at {}: {}",
            error.kind.to_string().red(),
            error.path.to_string().bold(),
            error.message
        ));
    }
    lines.join("\n")
}
