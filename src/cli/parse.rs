//! CLI parse: clap types only.

use crate::generation::CourseCategory;
use crate::types::ContextId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Coursetree CLI - generate, import and inspect course and template trees
#[derive(Parser)]
#[command(name = "coursetree")]
#[command(about = "Generate, store and inspect hierarchical course trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides storage.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Generic,
    LanguageVocabulary,
    LanguageGrammar,
    LanguageConversation,
    LanguageListening,
}

impl From<CategoryArg> for CourseCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Generic => CourseCategory::Generic,
            CategoryArg::LanguageVocabulary => CourseCategory::LanguageVocabulary,
            CategoryArg::LanguageGrammar => CourseCategory::LanguageGrammar,
            CategoryArg::LanguageConversation => CourseCategory::LanguageConversation,
            CategoryArg::LanguageListening => CourseCategory::LanguageListening,
        }
    }
}

/// `course:<id>` or `template:<id>`
pub fn parse_context(value: &str) -> Result<ContextId, String> {
    ContextId::parse(value)
        .ok_or_else(|| format!("expected course:<id> or template:<id>, got `{}`", value))
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a tree with the configured provider and store it
    Generate {
        /// Owning context, e.g. template:german-a1
        #[arg(long, value_parser = parse_context)]
        context: ContextId,
        /// JSON generation plan; flags below override its fields
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Levels below the root (1-6)
        #[arg(long)]
        max_depth: Option<usize>,
        /// Containers expanded per classification step
        #[arg(long)]
        item_cap: Option<usize>,
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
        /// Repeatable generation instruction
        #[arg(long = "instruction")]
        instructions: Vec<String>,
        /// Skeleton checkpoint: resumed from if present, written on failure
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Validate a nested JSON tree and store it
    Import {
        #[arg(long, value_parser = parse_context)]
        context: ContextId,
        /// JSON file holding the root node
        #[arg(long)]
        file: PathBuf,
    },
    /// Print a stored tree
    Show {
        #[arg(long, value_parser = parse_context)]
        context: ContextId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Copy a stored template into a new course
    Instantiate {
        /// Template id (without the `template:` prefix)
        #[arg(long)]
        template: String,
        /// Course id (without the `course:` prefix)
        #[arg(long)]
        course: String,
    },
    /// Delete a stored tree
    Delete {
        #[arg(long, value_parser = parse_context)]
        context: ContextId,
    },
}
