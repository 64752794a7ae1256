//! CLI output: error mapping and tree rendering.

use crate::error::TreeError;
use crate::generation::PopulationReport;
use crate::tree::Tree;

/// Map service errors to CLI text, with a retry hint for backend failures.
pub fn map_error(e: &TreeError) -> String {
    if e.is_retryable() {
        format!("{}\nThe generation backend failed; retrying may succeed.", e)
    } else {
        e.to_string()
    }
}

pub fn format_tree_text(tree: &Tree) -> String {
    format!(
        "{}\n{} nodes, {} leaves, depth {}\n\n{}",
        tree.context,
        tree.node_count(),
        tree.leaves().count(),
        tree.depth(),
        tree.outline()
    )
}

pub fn format_tree_json(tree: &Tree) -> Result<String, TreeError> {
    serde_json::to_string_pretty(&tree.to_json())
        .map_err(|e| TreeError::ConfigError(format!("Failed to render tree: {}", e)))
}

pub fn format_report(tree: &Tree, report: &PopulationReport) -> String {
    let mut lines = vec![format!(
        "Generated {} for {:?}: {} iterations, {} leaf groups, {} leaves generated, {} reused",
        tree.context,
        report.plan_title,
        report.iterations(),
        report.leaf_groups,
        report.leaves_generated,
        report.leaves_reused
    )];
    for summary in &report.level_summaries {
        lines.push(format!(
            "  iteration {}: {} expanded, {} containers, {} leaves, {} cut off, {} coerced",
            summary.iteration,
            summary.containers_expanded,
            summary.containers_created,
            summary.leaves_created,
            summary.cutoff_count,
            summary.coerced_count
        ));
    }
    lines.join("\n")
}
