//! CLI route: run context and the single route table.

use crate::cli::output::{format_report, format_tree_json, format_tree_text};
use crate::cli::parse::{CategoryArg, Commands, OutputFormat};
use crate::config::{ConfigLoader, CourseTreeConfig};
use crate::error::{StorageError, TreeError};
use crate::generation::GenerationPlan;
use crate::provider::HttpContentGenerator;
use crate::service::TreeService;
use crate::skeleton::Skeleton;
use crate::store::SledTreeStore;
use crate::types::ContextId;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loaded configuration plus an opened store.
pub struct RunContext {
    config: CourseTreeConfig,
    service: TreeService<SledTreeStore>,
}

impl RunContext {
    pub fn new(config_path: Option<PathBuf>, store_path: Option<PathBuf>) -> Result<Self, TreeError> {
        let mut config = ConfigLoader::load(config_path.as_deref())?;
        if let Some(store_path) = store_path {
            config.storage.path = store_path;
        }
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            TreeError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        std::fs::create_dir_all(&config.storage.path).map_err(StorageError::IoError)?;
        let store = SledTreeStore::new(&config.storage.path)?;
        info!(store = %config.storage.path.display(), "Store opened");

        Ok(Self {
            config,
            service: TreeService::new(store),
        })
    }

    pub fn config(&self) -> &CourseTreeConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, TreeError> {
        match command {
            Commands::Generate {
                context,
                plan,
                title,
                description,
                max_depth,
                item_cap,
                category,
                instructions,
                checkpoint,
            } => {
                let plan = self.build_plan(
                    plan.as_deref(),
                    title.as_deref(),
                    description.as_deref(),
                    *max_depth,
                    *item_cap,
                    *category,
                    instructions,
                )?;
                self.generate(context.clone(), plan, checkpoint.as_deref())
                    .await
            }
            Commands::Import { context, file } => {
                let raw = std::fs::read_to_string(file).map_err(StorageError::IoError)?;
                let payload: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                    TreeError::ConfigError(format!("{} is not valid JSON: {}", file.display(), e))
                })?;
                let tree = self.service.import_tree(context.clone(), &payload)?;
                Ok(format!("Imported {} nodes into {}", tree.node_count(), tree.context))
            }
            Commands::Show { context, format } => match self.service.load_tree(context)? {
                Some(tree) => match format {
                    OutputFormat::Text => Ok(format_tree_text(&tree)),
                    OutputFormat::Json => format_tree_json(&tree),
                },
                None => Ok(format!("No tree stored for {}", context)),
            },
            Commands::Instantiate { template, course } => {
                let template = ContextId::template(template.as_str());
                match self
                    .service
                    .instantiate_template(&template, ContextId::course(course.as_str()))?
                {
                    Some(tree) => Ok(format!(
                        "Instantiated {} into {} ({} nodes)",
                        template,
                        tree.context,
                        tree.node_count()
                    )),
                    None => Ok(format!("No tree stored for {}", template)),
                }
            }
            Commands::Delete { context } => {
                let removed = self.service.delete_tree(context)?;
                Ok(format!("Deleted {} rows for {}", removed, context))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_plan(
        &self,
        plan_file: Option<&Path>,
        title: Option<&str>,
        description: Option<&str>,
        max_depth: Option<usize>,
        item_cap: Option<usize>,
        category: Option<CategoryArg>,
        instructions: &[String],
    ) -> Result<GenerationPlan, TreeError> {
        let mut plan = match plan_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(StorageError::IoError)?;
                parse_plan(path, &raw)?
            }
            None => {
                let title = title.ok_or_else(|| {
                    TreeError::ConfigError("Either --plan or --title is required".to_string())
                })?;
                self.config.generation.plan(title, "")
            }
        };

        if let Some(title) = title {
            plan.title = title.to_string();
        }
        if let Some(description) = description {
            plan.description = description.to_string();
        }
        if let Some(max_depth) = max_depth {
            plan.max_depth = max_depth;
        }
        if item_cap.is_some() {
            plan.item_cap = item_cap;
        }
        if let Some(category) = category {
            plan.category = category.into();
        }
        if !instructions.is_empty() {
            plan.instructions = instructions.to_vec();
        }
        plan.validate()?;
        Ok(plan)
    }

    async fn generate(
        &self,
        context: ContextId,
        plan: GenerationPlan,
        checkpoint: Option<&Path>,
    ) -> Result<String, TreeError> {
        let generator = HttpContentGenerator::from_config(&self.config.provider)?;
        let mut skeleton = match checkpoint.filter(|path| path.exists()) {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(StorageError::IoError)?;
                let skeleton = Skeleton::from_json(&raw)?;
                info!(checkpoint = %path.display(), nodes = skeleton.node_count(), "Resuming from checkpoint");
                skeleton
            }
            None => Skeleton::new(plan.title.clone()),
        };

        match self
            .service
            .generate_tree(&generator, plan, context, &mut skeleton)
            .await
        {
            Ok(outcome) => {
                if let Some(path) = checkpoint.filter(|path| path.exists()) {
                    std::fs::remove_file(path).map_err(StorageError::IoError)?;
                }
                Ok(format_report(&outcome.tree, &outcome.report))
            }
            Err(err) => {
                if let Some(path) = checkpoint {
                    write_checkpoint(path, &skeleton)?;
                    warn!(checkpoint = %path.display(), "Generation failed; skeleton saved");
                }
                Err(err)
            }
        }
    }
}

/// Plans are TOML when the file says so, JSON otherwise.
fn parse_plan(path: &Path, raw: &str) -> Result<GenerationPlan, TreeError> {
    let invalid = |e: String| TreeError::ConfigError(format!("Invalid plan {}: {}", path.display(), e));
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(raw).map_err(|e| invalid(e.to_string())),
        _ => serde_json::from_str(raw).map_err(|e| invalid(e.to_string())),
    }
}

fn write_checkpoint(path: &Path, skeleton: &Skeleton) -> Result<(), TreeError> {
    let raw = skeleton
        .to_json()
        .map_err(|e| StorageError::Encoding(format!("Failed to encode checkpoint: {}", e)))?;
    std::fs::write(path, raw).map_err(StorageError::IoError)?;
    Ok(())
}
