//! CLI domain: parse, route and output only.

mod output;
mod parse;
mod route;

pub use output::{format_report, format_tree_json, format_tree_text, map_error};
pub use parse::{parse_context, CategoryArg, Cli, Commands, OutputFormat};
pub use route::RunContext;
