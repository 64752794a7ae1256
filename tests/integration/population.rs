//! Population scheduler and leaf fan-out against the scripted generator.

use super::support::{leaf, ScriptedGenerator};
use coursetree::codec::{flatten_tree, rebuild};
use coursetree::error::{GenerationError, TreeError};
use coursetree::generation::{
    CourseCategory, GenerationPlan, PopulationScheduler, ProposedChild,
};
use coursetree::skeleton::Skeleton;
use coursetree::tree::{LeafType, Node};
use coursetree::types::ContextId;

fn plan(max_depth: usize) -> GenerationPlan {
    GenerationPlan::new("Course", max_depth)
}

#[tokio::test]
async fn depth_one_coerces_proposed_containers_to_leaves() {
    let generator = ScriptedGenerator::new().with_children(
        "Course",
        vec![ProposedChild::container("Grammar"), leaf("Intro")],
    );
    let scheduler = PopulationScheduler::new(&generator, plan(1)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let outcome = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap();

    assert_eq!(outcome.report.iterations(), 1);
    assert_eq!(outcome.report.level_summaries[0].coerced_count, 1);
    assert!(outcome
        .tree
        .root
        .children()
        .iter()
        .all(|child| matches!(child, Node::Leaf(_))));
    let grammar = outcome.tree.root.children()[0].as_leaf().unwrap();
    assert_eq!(grammar.title, "Grammar");
    assert_eq!(grammar.leaf_type(), LeafType::Text);
}

#[tokio::test]
async fn coercion_uses_first_allowed_leaf_type_of_category() {
    let generator = ScriptedGenerator::new()
        .with_children("Course", vec![ProposedChild::container("Animals")]);
    let mut vocabulary = plan(1);
    vocabulary.category = CourseCategory::LanguageVocabulary;
    vocabulary.allowed_leaf_types = Some(vec![LeafType::LanguageVocabulary, LeafType::Text]);
    let scheduler = PopulationScheduler::new(&generator, vocabulary).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let outcome = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap();
    let animals = outcome.tree.root.children()[0].as_leaf().unwrap();
    assert_eq!(animals.leaf_type(), LeafType::LanguageVocabulary);
}

#[tokio::test]
async fn item_cap_cuts_off_extra_containers() {
    let generator = ScriptedGenerator::new()
        .with_children(
            "Course",
            (1..=5)
                .map(|i| ProposedChild::container(format!("Unit {i}")))
                .collect(),
        )
        .with_default_children(vec![leaf("Lesson")]);
    let mut capped = plan(3);
    capped.item_cap = Some(2);
    let scheduler = PopulationScheduler::new(&generator, capped).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let outcome = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap();

    let first = &outcome.report.level_summaries[0];
    assert_eq!(first.containers_created, 5);
    assert_eq!(first.cutoff_count, 3);
    assert_eq!(outcome.report.level_summaries[1].containers_expanded, 2);
    assert_eq!(
        generator.classified_titles(),
        vec!["Course", "Unit 1", "Unit 2"]
    );

    let units = outcome.tree.root.children();
    assert_eq!(units.len(), 5);
    for unit in &units[2..] {
        let container = unit.as_container().unwrap();
        assert!(container.children.is_empty());
    }

    let rebuilt = rebuild(&flatten_tree(&outcome.tree)).unwrap().unwrap();
    assert_eq!(rebuilt, outcome.tree);
    for unit in &rebuilt.root.children()[2..] {
        assert!(unit.as_container().unwrap().children.is_empty());
    }
}

#[tokio::test]
async fn expansion_never_exceeds_max_depth_iterations() {
    for max_depth in 1..=4 {
        let generator = ScriptedGenerator::new().with_default_children(vec![
            ProposedChild::container("Left"),
            ProposedChild::container("Right"),
        ]);
        let scheduler = PopulationScheduler::new(&generator, plan(max_depth)).unwrap();
        let mut skeleton = scheduler.initial_skeleton();

        let outcome = scheduler
            .run(&mut skeleton, ContextId::template("t1"))
            .await
            .unwrap();

        assert!(outcome.report.iterations() <= max_depth);
        assert_eq!(outcome.tree.depth(), max_depth);
        assert_eq!(outcome.tree.leaves().count(), 1 << max_depth);
        let deepest_classification = generator
            .classify_calls
            .lock()
            .iter()
            .map(|(_, level)| *level)
            .max()
            .unwrap();
        assert_eq!(deepest_classification, max_depth - 1);
    }
}

#[tokio::test]
async fn children_keep_classification_order() {
    let titles = ["Zeta", "Alpha", "Mu", "Beta"];
    let generator = ScriptedGenerator::new()
        .with_children("Course", titles.iter().map(|t| leaf(t)).collect());
    let scheduler = PopulationScheduler::new(&generator, plan(2)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let outcome = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap();
    let order: Vec<&str> = outcome.tree.root.children().iter().map(|n| n.title()).collect();
    assert_eq!(order, titles);
    let rows = flatten_tree(&outcome.tree);
    let indices: Vec<u32> = rows[1..].iter().map(|row| row.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn failed_leaf_keeps_siblings_and_reports_the_group() {
    let generator = ScriptedGenerator::new()
        .with_children("Course", vec![leaf("A"), leaf("B"), leaf("C")])
        .failing_leaf("B");
    let scheduler = PopulationScheduler::new(&generator, plan(2)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let err = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    match err {
        TreeError::Generation(GenerationError::LeafGroupFailed {
            total, failures, ..
        }) => {
            assert_eq!(total, 3);
            assert_eq!(failures.len(), 1);
            let failed = skeleton.find(&failures[0].leaf_id).unwrap();
            assert_eq!(skeleton.node(failed).title, "B");
        }
        other => panic!("unexpected error: {other}"),
    }

    let root = skeleton.root();
    let with_content: Vec<&str> = skeleton
        .children(root)
        .iter()
        .filter(|child| skeleton.leaf_content(**child).is_some())
        .map(|child| skeleton.node(*child).title.as_str())
        .collect();
    assert_eq!(with_content, vec!["A", "C"]);
}

#[tokio::test]
async fn parent_groups_run_in_sequence_and_stop_at_first_failure() {
    let generator = ScriptedGenerator::new()
        .with_children(
            "Course",
            vec![
                ProposedChild::container("First"),
                ProposedChild::container("Second"),
            ],
        )
        .with_children("First", vec![leaf("a1"), leaf("a2")])
        .with_children("Second", vec![leaf("b1")])
        .failing_leaf("a2");
    let scheduler = PopulationScheduler::new(&generator, plan(2)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    assert!(scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .is_err());
    assert_eq!(generator.leaf_titles(), vec!["a1", "a2"]);
}

#[tokio::test]
async fn checkpoint_resume_only_generates_missing_leaves() {
    let failing = ScriptedGenerator::new()
        .with_children("Course", vec![leaf("A"), leaf("B"), leaf("C")])
        .failing_leaf("C");
    let scheduler = PopulationScheduler::new(&failing, plan(2)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();
    assert!(scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .is_err());

    let checkpoint = skeleton.to_json().unwrap();
    let mut resumed = Skeleton::from_json(&checkpoint).unwrap();

    let healthy = ScriptedGenerator::new();
    let scheduler = PopulationScheduler::new(&healthy, plan(2)).unwrap();
    let outcome = scheduler
        .run(&mut resumed, ContextId::template("t1"))
        .await
        .unwrap();

    assert!(healthy.classified_titles().is_empty());
    assert_eq!(healthy.leaf_titles(), vec!["C"]);
    assert_eq!(outcome.report.iterations(), 0);
    assert_eq!(outcome.report.leaves_generated, 1);
    assert_eq!(outcome.report.leaves_reused, 2);
    assert_eq!(outcome.tree.leaves().count(), 3);
    assert!(outcome
        .tree
        .leaves()
        .all(|leaf| leaf.reading_text_regular.ends_with("(regular)")));
}

#[tokio::test]
async fn sibling_leaves_run_together_and_groups_do_not_overlap() {
    let generator = ScriptedGenerator::new()
        .with_children(
            "Course",
            vec![
                ProposedChild::container("Small"),
                ProposedChild::container("Large"),
            ],
        )
        .with_children("Small", vec![leaf("s1"), leaf("s2")])
        .with_children("Large", vec![leaf("l1"), leaf("l2"), leaf("l3")]);
    let scheduler = PopulationScheduler::new(&generator, plan(2)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let outcome = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap();

    assert_eq!(outcome.report.leaf_groups, 2);
    assert_eq!(outcome.report.leaves_generated, 5);
    assert_eq!(generator.in_flight.peak(), 3);
}

#[tokio::test]
async fn classification_failure_keeps_expanded_containers_for_resume() {
    let failing = ScriptedGenerator::new()
        .with_children(
            "Course",
            vec![
                ProposedChild::container("Unit 1"),
                ProposedChild::container("Unit 2"),
            ],
        )
        .with_children("Unit 1", vec![leaf("x")])
        .failing_container("Unit 2");
    let scheduler = PopulationScheduler::new(&failing, plan(3)).unwrap();
    let mut skeleton = scheduler.initial_skeleton();

    let err = scheduler
        .run(&mut skeleton, ContextId::template("t1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TreeError::Generation(GenerationError::RequestFailed(_))
    ));
    assert!(err.is_retryable());
    assert!(failing.leaf_titles().is_empty());

    let root = skeleton.root();
    let units = skeleton.children(root).to_vec();
    assert!(skeleton.node(root).is_populated());
    assert!(skeleton.node(units[0]).is_populated());
    assert!(!skeleton.node(units[1]).is_populated());
    assert_eq!(skeleton.containers_to_populate(), vec![units[1]]);

    let mut resumed = Skeleton::from_json(&skeleton.to_json().unwrap()).unwrap();
    let healthy = ScriptedGenerator::new().with_children("Unit 2", vec![leaf("y")]);
    let scheduler = PopulationScheduler::new(&healthy, plan(3)).unwrap();
    let outcome = scheduler
        .run(&mut resumed, ContextId::template("t1"))
        .await
        .unwrap();

    assert_eq!(healthy.classified_titles(), vec!["Unit 2"]);
    assert_eq!(healthy.leaf_titles(), vec!["x", "y"]);
    assert_eq!(outcome.tree.leaves().count(), 2);
}
