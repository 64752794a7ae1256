//! End-to-end flows through the tree service on a sled store.

use super::support::{leaf, two_leaf_tree, ScriptedGenerator};
use coursetree::error::{StorageError, TreeError};
use coursetree::generation::{GenerationPlan, ProposedChild};
use coursetree::service::TreeService;
use coursetree::skeleton::Skeleton;
use coursetree::store::{SledTreeStore, TreeStore};
use coursetree::types::ContextId;
use tempfile::TempDir;

fn sled_service(temp_dir: &TempDir) -> TreeService<SledTreeStore> {
    TreeService::new(SledTreeStore::new(temp_dir.path().join("store")).unwrap())
}

#[tokio::test]
async fn generated_tree_is_persisted_and_reloads_identically() {
    let temp_dir = TempDir::new().unwrap();
    let service = sled_service(&temp_dir);
    let generator = ScriptedGenerator::new()
        .with_children(
            "German A1",
            vec![ProposedChild::container("Greetings"), leaf("Numbers")],
        )
        .with_children("Greetings", vec![leaf("Hallo"), leaf("Tschuess")]);

    let plan = GenerationPlan::new("German A1", 2);
    let context = ContextId::template("german-a1");
    let mut skeleton = Skeleton::new("German A1");
    let outcome = service
        .generate_tree(&generator, plan, context.clone(), &mut skeleton)
        .await
        .unwrap();

    assert_eq!(outcome.tree.node_count(), 5);
    let loaded = service.load_tree(&context).unwrap().unwrap();
    assert_eq!(loaded, outcome.tree);
    assert_eq!(
        loaded.breadcrumb(&loaded.root.children()[0].children()[1].id().clone()),
        Some("German A1 > Greetings > Tschuess".to_string())
    );
}

#[tokio::test]
async fn failed_generation_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let service = sled_service(&temp_dir);
    let generator = ScriptedGenerator::new()
        .with_children("Course", vec![leaf("Broken")])
        .failing_leaf("Broken");

    let context = ContextId::template("t1");
    let mut skeleton = Skeleton::new("Course");
    assert!(service
        .generate_tree(&generator, GenerationPlan::new("Course", 1), context.clone(), &mut skeleton)
        .await
        .is_err());
    assert!(service.load_tree(&context).unwrap().is_none());
}

#[test]
fn template_instantiation_and_cascade_delete() {
    let temp_dir = TempDir::new().unwrap();
    let service = sled_service(&temp_dir);
    let template = ContextId::template("rust");
    service
        .save_tree(&two_leaf_tree(template.clone()))
        .unwrap();

    let course = service
        .instantiate_template(&template, ContextId::course("rust-2026"))
        .unwrap()
        .unwrap();
    let stored_template = service.load_tree(&template).unwrap().unwrap();
    for ((_, original), (_, copied)) in stored_template.walk().zip(course.walk()) {
        assert_ne!(original.id(), copied.id());
        assert_eq!(original.title(), copied.title());
    }

    assert_eq!(service.delete_tree(&template).unwrap(), 3);
    assert!(service.load_tree(&template).unwrap().is_none());
    assert!(service
        .load_tree(&ContextId::course("rust-2026"))
        .unwrap()
        .is_some());
}

#[test]
fn stored_trees_survive_reopening_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let context = ContextId::course("c1");
    let tree = two_leaf_tree(context.clone());
    {
        let service = sled_service(&temp_dir);
        service.save_tree(&tree).unwrap();
        service.store().flush().unwrap();
    }

    let service = sled_service(&temp_dir);
    assert_eq!(service.load_tree(&context).unwrap(), Some(tree.clone()));
    assert!(matches!(
        service.save_tree(&tree),
        Err(TreeError::Storage(StorageError::ContextExists(_)))
    ));
    assert!(service.store().contains(&context).unwrap());
}
