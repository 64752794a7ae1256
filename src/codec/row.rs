//! Flat row shape shared by the codec and the storage backends.

use crate::error::ConsistencyError;
use crate::tree::{LeafKind, LeafType, NodeType};
use crate::types::{ContextId, NodeId};
use serde::{Deserialize, Serialize};

/// One persisted node.
///
/// Container rows leave every leaf column (`leaf_type`, reading texts, quiz list,
/// `data`) as `None`; leaf rows always fill the reading texts and quiz list.
/// Type-specific leaf fields travel in `data`, a JSON document, so the row shape
/// stays identical across leaf types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: NodeId,
    pub context_id: ContextId,
    pub parent_id: Option<NodeId>,
    pub node_type: NodeType,
    pub leaf_type: Option<LeafType>,
    pub title: String,
    pub description: Option<String>,
    pub order_index: u32,
    pub reading_text_regular: Option<String>,
    pub reading_text_short: Option<String>,
    pub reading_text_long: Option<String>,
    pub quiz_questions: Option<Vec<String>>,
    pub data: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TextData {
    text_category: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct VocabularyData {
    target_language: String,
    reading_text_regular_translated: String,
    reading_text_short_translated: String,
    reading_text_long_translated: String,
}

#[derive(Serialize, Deserialize)]
struct CodeData {
    programming_language: String,
    code_context: Option<String>,
}

/// Pack the type-specific leaf fields into the side-channel document.
pub(crate) fn encode_leaf_data(kind: &LeafKind) -> String {
    let encoded = match kind {
        LeafKind::Text { text_category } => serde_json::to_string(&TextData {
            text_category: text_category.clone(),
        }),
        LeafKind::LanguageVocabulary {
            target_language,
            reading_text_regular_translated,
            reading_text_short_translated,
            reading_text_long_translated,
        } => serde_json::to_string(&VocabularyData {
            target_language: target_language.clone(),
            reading_text_regular_translated: reading_text_regular_translated.clone(),
            reading_text_short_translated: reading_text_short_translated.clone(),
            reading_text_long_translated: reading_text_long_translated.clone(),
        }),
        LeafKind::Code {
            programming_language,
            code_context,
        } => serde_json::to_string(&CodeData {
            programming_language: programming_language.clone(),
            code_context: code_context.clone(),
        }),
    };
    // Plain string fields only; serialization cannot fail.
    encoded.unwrap_or_else(|_| "{}".to_string())
}

/// Unpack the side-channel document of a leaf row.
pub(crate) fn decode_leaf_data(
    id: &NodeId,
    leaf_type: LeafType,
    data: Option<&str>,
) -> Result<LeafKind, ConsistencyError> {
    let raw = data.unwrap_or("{}");
    let invalid = |err: serde_json::Error| ConsistencyError::InvalidLeafData {
        id: id.clone(),
        message: err.to_string(),
    };
    Ok(match leaf_type {
        LeafType::Text => {
            let data: TextData = serde_json::from_str(raw).map_err(invalid)?;
            LeafKind::Text {
                text_category: data.text_category,
            }
        }
        LeafType::LanguageVocabulary => {
            let data: VocabularyData = serde_json::from_str(raw).map_err(invalid)?;
            LeafKind::LanguageVocabulary {
                target_language: data.target_language,
                reading_text_regular_translated: data.reading_text_regular_translated,
                reading_text_short_translated: data.reading_text_short_translated,
                reading_text_long_translated: data.reading_text_long_translated,
            }
        }
        LeafType::Code => {
            let data: CodeData = serde_json::from_str(raw).map_err(invalid)?;
            LeafKind::Code {
                programming_language: data.programming_language,
                code_context: data.code_context,
            }
        }
    })
}
