//! Skeleton-to-tree conversion.

use crate::error::ConsistencyError;
use crate::generation::generator::LeafContent;
use crate::skeleton::{Skeleton, SkeletonBody, SkeletonIndex};
use crate::tree::{ContainerNode, LeafKind, LeafNode, LeafType, Node, Tree};
use crate::types::ContextId;

pub const DEFAULT_TARGET_LANGUAGE: &str = "de";
pub const DEFAULT_PROGRAMMING_LANGUAGE: &str = "javascript";

/// Rewrite a fully populated skeleton into a finalized tree.
///
/// Skeleton ids are kept. A cut-off container with no children becomes an empty
/// container; any other container that was never populated is an error. Leaf
/// fields missing from the generated content fall back to the leaf title.
pub fn finalize(skeleton: &Skeleton, context: ContextId) -> Result<Tree, ConsistencyError> {
    let root = convert_node(skeleton, skeleton.root())?;
    Ok(Tree::new(context, root))
}

fn convert_node(skeleton: &Skeleton, index: SkeletonIndex) -> Result<Node, ConsistencyError> {
    let node = skeleton.node(index);
    match &node.body {
        SkeletonBody::Container {
            children,
            do_not_populate,
        } => {
            let children = match children {
                Some(children) => children
                    .iter()
                    .map(|child| convert_node(skeleton, *child))
                    .collect::<Result<Vec<_>, _>>()?,
                None if *do_not_populate => Vec::new(),
                None => {
                    return Err(ConsistencyError::UnpopulatedContainer {
                        id: node.id.clone(),
                    })
                }
            };
            Ok(Node::Container(ContainerNode {
                id: node.id.clone(),
                title: node.title.clone(),
                description: None,
                children,
            }))
        }
        SkeletonBody::Leaf { leaf_type, content } => {
            let empty = LeafContent::default();
            let content = content.as_ref().unwrap_or(&empty);
            let or_title = |text: &str| {
                if text.is_empty() {
                    node.title.clone()
                } else {
                    text.to_string()
                }
            };
            Ok(Node::Leaf(LeafNode {
                id: node.id.clone(),
                title: node.title.clone(),
                description: content.description.clone(),
                reading_text_regular: or_title(&content.reading_text_regular),
                reading_text_short: or_title(&content.reading_text_short),
                reading_text_long: or_title(&content.reading_text_long),
                quiz_questions: content.quiz_questions.clone(),
                kind: leaf_kind(*leaf_type, content),
            }))
        }
    }
}

fn leaf_kind(leaf_type: LeafType, content: &LeafContent) -> LeafKind {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
    match leaf_type {
        LeafType::Text => LeafKind::Text {
            text_category: content.text_category.clone(),
        },
        LeafType::LanguageVocabulary => LeafKind::LanguageVocabulary {
            target_language: non_empty(&content.target_language)
                .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string()),
            reading_text_regular_translated: content
                .reading_text_regular_translated
                .clone()
                .unwrap_or_default(),
            reading_text_short_translated: content
                .reading_text_short_translated
                .clone()
                .unwrap_or_default(),
            reading_text_long_translated: content
                .reading_text_long_translated
                .clone()
                .unwrap_or_default(),
        },
        LeafType::Code => LeafKind::Code {
            programming_language: non_empty(&content.programming_language)
                .unwrap_or_else(|| DEFAULT_PROGRAMMING_LANGUAGE.to_string()),
            code_context: content.code_context.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::NewChild;

    #[test]
    fn cut_off_container_becomes_empty_container() {
        let mut skeleton = Skeleton::new("Course");
        let root = skeleton.root();
        let children = skeleton
            .attach_children(
                root,
                vec![NewChild::Container {
                    title: "Later".to_string(),
                    do_not_populate: true,
                }],
            )
            .unwrap();

        let tree = finalize(&skeleton, ContextId::template("t1")).unwrap();
        let later = tree.find(&skeleton.node(children[0]).id).unwrap();
        assert!(later.as_container().unwrap().children.is_empty());
        assert_eq!(tree.root.id(), &skeleton.node(root).id);
    }

    #[test]
    fn unpopulated_container_is_inconsistent() {
        let skeleton = Skeleton::new("Course");
        assert!(matches!(
            finalize(&skeleton, ContextId::template("t1")),
            Err(ConsistencyError::UnpopulatedContainer { .. })
        ));
    }

    #[test]
    fn leaf_defaults_fill_missing_content() {
        let mut skeleton = Skeleton::new("Course");
        let root = skeleton.root();
        let leaves = skeleton
            .attach_children(
                root,
                vec![
                    NewChild::Leaf {
                        title: "Hund".to_string(),
                        leaf_type: LeafType::LanguageVocabulary,
                    },
                    NewChild::Leaf {
                        title: "Closures".to_string(),
                        leaf_type: LeafType::Code,
                    },
                ],
            )
            .unwrap();
        skeleton.set_leaf_content(
            leaves[1],
            LeafContent {
                reading_text_regular: "A closure captures".to_string(),
                quiz_questions: vec!["What is captured?".to_string()],
                ..LeafContent::default()
            },
        );

        let tree = finalize(&skeleton, ContextId::course("c1")).unwrap();
        let hund = tree.root.children()[0].as_leaf().unwrap();
        assert_eq!(hund.reading_text_regular, "Hund");
        assert_eq!(hund.reading_text_long, "Hund");
        assert!(matches!(
            &hund.kind,
            LeafKind::LanguageVocabulary { target_language, .. } if target_language == "de"
        ));

        let closures = tree.root.children()[1].as_leaf().unwrap();
        assert_eq!(closures.reading_text_regular, "A closure captures");
        assert_eq!(closures.reading_text_short, "Closures");
        assert_eq!(closures.quiz_questions.len(), 1);
        assert!(matches!(
            &closures.kind,
            LeafKind::Code { programming_language, .. } if programming_language == "javascript"
        ));
    }
}
