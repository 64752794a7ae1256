//! Node validation
//!
//! Turns an untyped nested payload into a typed [`Tree`], or fails with the first
//! violated rule. This is the only place leaf reading texts and quiz lists are
//! checked for presence; the codec trusts rows it wrote itself.

use crate::error::ValidationError;
use crate::tree::{ContainerNode, LeafKind, LeafNode, LeafType, Node, Tree};
use crate::types::{ContextId, NodeId};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Nesting ceiling for incoming payloads; deeper input is rejected, not recursed.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Validate a nested payload and bind it to `context`.
pub fn parse_tree(value: &Value, context: ContextId) -> Result<Tree, ValidationError> {
    let root = parse_node(value)?;
    debug!(context = %context, root = %root.id(), "Validated tree payload");
    Ok(Tree { context, root })
}

/// Validate a nested payload rooted at `value`.
pub fn parse_node(value: &Value) -> Result<Node, ValidationError> {
    let mut validator = Validator::default();
    validator.node(value, "root".to_string(), 0)
}

/// Check the structural invariants of an already typed tree.
///
/// Used on trees produced in-process (generation, instantiation) before they are
/// handed to persistence.
pub fn check_tree(tree: &Tree) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    check_node(&tree.root, "root".to_string(), 0, &mut seen)
}

fn check_node(
    node: &Node,
    path: String,
    depth: usize,
    seen: &mut HashSet<NodeId>,
) -> Result<(), ValidationError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ValidationError::DepthExceeded {
            path,
            limit: MAX_NESTING_DEPTH,
        });
    }
    if node.id().as_str().trim().is_empty() {
        return Err(ValidationError::EmptyField { path, field: "id" });
    }
    if !seen.insert(node.id().clone()) {
        return Err(ValidationError::DuplicateId {
            path,
            id: node.id().to_string(),
        });
    }
    match node {
        Node::Container(container) => {
            for (index, child) in container.children.iter().enumerate() {
                check_node(child, format!("{path}.children[{index}]"), depth + 1, seen)?;
            }
            Ok(())
        }
        Node::Leaf(leaf) => match &leaf.kind {
            LeafKind::LanguageVocabulary {
                target_language, ..
            } if target_language.trim().is_empty() => Err(ValidationError::EmptyField {
                path,
                field: "targetLanguage",
            }),
            LeafKind::Code {
                programming_language,
                ..
            } if programming_language.trim().is_empty() => Err(ValidationError::EmptyField {
                path,
                field: "programmingLanguage",
            }),
            _ => Ok(()),
        },
    }
}

#[derive(Default)]
struct Validator {
    seen: HashSet<String>,
}

impl Validator {
    fn node(&mut self, value: &Value, path: String, depth: usize) -> Result<Node, ValidationError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ValidationError::DepthExceeded {
                path,
                limit: MAX_NESTING_DEPTH,
            });
        }
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject { path: path.clone() })?;

        let id = required_string(obj, "id", &path)?;
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyField { path, field: "id" });
        }
        if !self.seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateId { path, id });
        }
        let title = optional_string(obj, "title", &path)?.unwrap_or_default();
        let description = optional_string(obj, "description", &path)?;

        let node_type = required_string(obj, "nodeType", &path)?;
        match node_type.as_str() {
            "container" => {
                let children = match obj.get("children") {
                    None => Vec::new(),
                    Some(Value::Null) => return Err(ValidationError::NullChildren { path }),
                    Some(Value::Array(items)) => {
                        let mut children = Vec::with_capacity(items.len());
                        for (index, item) in items.iter().enumerate() {
                            children.push(self.node(
                                item,
                                format!("{path}.children[{index}]"),
                                depth + 1,
                            )?);
                        }
                        children
                    }
                    Some(_) => {
                        return Err(ValidationError::WrongType {
                            path,
                            field: "children",
                            expected: "an array",
                        })
                    }
                };
                Ok(Node::Container(ContainerNode {
                    id: NodeId::new(id),
                    title,
                    description,
                    children,
                }))
            }
            "leaf" => {
                if obj.contains_key("children") {
                    return Err(ValidationError::LeafWithChildren { path });
                }
                let kind = leaf_kind(obj, &path)?;
                Ok(Node::Leaf(LeafNode {
                    id: NodeId::new(id),
                    title,
                    description,
                    reading_text_regular: required_string(obj, "readingTextRegular", &path)?,
                    reading_text_short: required_string(obj, "readingTextShort", &path)?,
                    reading_text_long: required_string(obj, "readingTextLong", &path)?,
                    quiz_questions: string_list(obj, "quizQuestions", &path)?,
                    kind,
                }))
            }
            other => Err(ValidationError::UnknownNodeType {
                path,
                value: other.to_string(),
            }),
        }
    }
}

fn leaf_kind(obj: &Map<String, Value>, path: &str) -> Result<LeafKind, ValidationError> {
    let raw = required_string(obj, "leafType", path)?;
    let leaf_type: LeafType = raw
        .parse()
        .map_err(|value| ValidationError::UnknownLeafType {
            path: path.to_string(),
            value,
        })?;

    Ok(match leaf_type {
        LeafType::Text => LeafKind::Text {
            text_category: optional_string(obj, "textCategory", path)?,
        },
        LeafType::LanguageVocabulary => LeafKind::LanguageVocabulary {
            target_language: non_empty_string(obj, "targetLanguage", path)?,
            reading_text_regular_translated: required_string(
                obj,
                "readingTextRegularTranslated",
                path,
            )?,
            reading_text_short_translated: required_string(
                obj,
                "readingTextShortTranslated",
                path,
            )?,
            reading_text_long_translated: required_string(obj, "readingTextLongTranslated", path)?,
        },
        LeafType::Code => LeafKind::Code {
            programming_language: non_empty_string(obj, "programmingLanguage", path)?,
            code_context: optional_string(obj, "codeContext", path)?,
        },
    })
}

/// Present and a string; `null` counts as absent.
fn required_string(
    obj: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            path: path.to_string(),
            field,
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            path: path.to_string(),
            field,
            expected: "a string",
        }),
    }
}

fn non_empty_string(
    obj: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<String, ValidationError> {
    let value = required_string(obj, field, path)?;
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            path: path.to_string(),
            field,
        });
    }
    Ok(value)
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::WrongType {
            path: path.to_string(),
            field,
            expected: "a string",
        }),
    }
}

fn string_list(
    obj: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<Vec<String>, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        path: path.to_string(),
        field,
        expected: "an array of strings",
    };
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            path: path.to_string(),
            field,
        }),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect(),
        Some(_) => Err(wrong_type()),
    }
}
