//! CLI domain: parse, route, and output only.
//! Reads documents, hands them to the merge API, renders the result.

mod output;
mod parse;
mod route;

pub use output::{map_error, render_errors};
pub use parse::{Cli, Commands, OutputFormat, PolicyArgs};
pub use route::{load_document, RunContext};
