//! Tests for Tree construction: orphans, duplicates, re-linking, cycles

use std::collections::HashMap;

use rstest::rstest;
use serde_json::{json, Value};

use hiertree::domain::{
    DomainError, FieldValue, Fields, ListOptions, Tree, TreeConfig, TreeNodeConvert,
    MAX_RENDER_DEPTH,
};

fn parent_key(tree: &Tree<Value>, pk: i64) -> Option<FieldValue> {
    tree.find_by_pk(&FieldValue::Int(pk))
        .and_then(|n| n.parent())
        .and_then(|p| p.key().cloned())
}

fn level(tree: &Tree<Value>, pk: i64) -> usize {
    tree.find_by_pk(&FieldValue::Int(pk)).unwrap().level()
}

fn fixture_records() -> Vec<Value> {
    vec![
        json!({"id": 1, "parent_id": null, "title": "A"}),
        json!({"id": 2, "parent_id": 1, "title": "B"}),
        json!({"id": 3, "parent_id": 1, "title": "C"}),
        json!({"id": 4, "parent_id": 2, "title": "D"}),
    ]
}

// ============================================================
// Orphans and ordering
// ============================================================

#[test]
fn given_unknown_parent_when_adding_then_attaches_to_root() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();
    tree.add_one(json!({"id": 5, "parent_id": 999})).unwrap();

    assert_eq!(level(&tree, 5), 1);
    assert_eq!(parent_key(&tree, 5), None);
    assert!(tree.find_by_pk(&FieldValue::Int(5)).unwrap().parent().unwrap().is_root());
}

#[test]
fn given_child_before_parent_in_same_call_when_adding_then_links_correctly() {
    let mut tree = Tree::default();
    tree.add(vec![
        json!({"id": 4, "parent_id": 2}),
        json!({"id": 2, "parent_id": 1}),
        json!({"id": 1}),
    ])
    .unwrap();

    assert_eq!(level(&tree, 4), 3);
    assert_eq!(parent_key(&tree, 4), Some(FieldValue::Int(2)));
}

#[test]
fn given_child_added_before_parent_when_parent_arrives_later_then_relinks() {
    let mut tree = Tree::default();
    tree.add_one(json!({"id": 2, "parent_id": 1})).unwrap();
    assert_eq!(level(&tree, 2), 1);

    tree.add_one(json!({"id": 1})).unwrap();
    assert_eq!(level(&tree, 2), 2);
    assert_eq!(parent_key(&tree, 2), Some(FieldValue::Int(1)));
}

#[test]
fn given_empty_input_when_adding_then_tree_unchanged() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();
    let before = tree.list("id", "title", &ListOptions::default());
    let levels: Vec<_> = tree.nodes().map(|n| n.level()).collect();

    tree.add(Vec::new()).unwrap();

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.list("id", "title", &ListOptions::default()), before);
    let after: Vec<_> = tree.nodes().map(|n| n.level()).collect();
    assert_eq!(after, levels);
    assert_eq!(
        tree.list("id", "title", &ListOptions::default()).keys().collect::<Vec<_>>(),
        before.keys().collect::<Vec<_>>()
    );
}

#[test]
fn given_chained_calls_when_building_then_returns_self() {
    let mut tree = Tree::default();
    tree.reset()
        .add(vec![json!({"id": 1})])
        .unwrap()
        .add(vec![json!({"id": 2, "parent_id": 1})])
        .unwrap();
    assert_eq!(tree.len(), 2);
}

// ============================================================
// Duplicate keys
// ============================================================

#[test]
fn given_duplicate_key_in_one_call_when_adding_then_last_record_wins() {
    let mut tree = Tree::default();
    tree.set(vec![
        json!({"id": 1, "title": "old"}),
        json!({"id": 2, "title": "other"}),
        json!({"id": 1, "title": "new"}),
    ])
    .unwrap();

    assert_eq!(tree.len(), 2);
    let one = tree.find_by_pk(&FieldValue::Int(1)).unwrap();
    assert_eq!(one.field("title"), Some(FieldValue::from("new")));
    // replaced record keeps its index position
    let order: Vec<_> = tree.nodes().filter_map(|n| n.key().cloned()).collect();
    assert_eq!(order, vec![FieldValue::Int(1), FieldValue::Int(2)]);
    assert_eq!(tree.root().children().count(), 2);
}

#[test]
fn given_readded_key_with_new_parent_when_adding_then_reparents() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();

    tree.add_one(json!({"id": 4, "parent_id": 3, "title": "D2"})).unwrap();

    assert_eq!(tree.len(), 4);
    assert_eq!(parent_key(&tree, 4), Some(FieldValue::Int(3)));
    let two = tree.find_by_pk(&FieldValue::Int(2)).unwrap();
    assert!(!two.has_children());
    assert_eq!(tree.iter().count(), 4);
}

#[test]
fn given_replaced_parent_when_adding_then_children_follow_new_node() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();

    tree.add_one(json!({"id": 2, "parent_id": 3, "title": "B moved"})).unwrap();

    assert_eq!(parent_key(&tree, 4), Some(FieldValue::Int(2)));
    assert_eq!(level(&tree, 4), 4);
    let one = tree.find_by_pk(&FieldValue::Int(1)).unwrap();
    assert_eq!(one.children().count(), 1);
}

// ============================================================
// Cycles and malformed records
// ============================================================

#[test]
fn given_self_parent_when_adding_then_cycle_detected() {
    let mut tree: Tree<Value> = Tree::default();
    let result = tree.add(vec![json!({"id": 7, "parent_id": 7})]).map(|_| ());

    assert_eq!(result, Err(DomainError::CycleDetected(FieldValue::Int(7))));
    assert!(tree.is_empty());
}

#[test]
fn given_cycle_across_calls_when_adding_then_rejected_and_tree_unchanged() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();
    let before = tree.list("id", "title", &ListOptions::default());

    let result = tree.add_one(json!({"id": 1, "parent_id": 4, "title": "A"}));

    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
    assert_eq!(tree.list("id", "title", &ListOptions::default()), before);
    assert_eq!(level(&tree, 4), 3);
}

#[test]
fn given_cycle_when_setting_then_previous_contents_kept() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();

    let result = tree.set(vec![
        json!({"id": 10, "parent_id": 11}),
        json!({"id": 11, "parent_id": 10}),
    ]);

    assert!(result.is_err());
    assert_eq!(tree.len(), 4);
}

#[test]
fn given_record_without_key_when_adding_then_missing_key_and_nothing_added() {
    let mut tree = Tree::default();
    let result = tree
        .add(vec![json!({"id": 1}), json!({"title": "no key"})])
        .map(|t| t.len());

    assert_eq!(
        result,
        Err(DomainError::MissingKey {
            field: "id".to_string()
        })
    );
    assert!(tree.is_empty());
}

#[test]
fn given_reset_when_called_then_discards_all_nodes() {
    let mut tree = Tree::default();
    tree.set(fixture_records()).unwrap();
    tree.reset();

    assert!(tree.is_empty());
    assert_eq!(tree.root().children().count(), 0);
    assert!(tree.find_by_pk(&FieldValue::Int(1)).is_none());
}

#[test]
fn given_mixed_string_and_numeric_ids_when_building_then_links_as_one_key() {
    let mut tree = Tree::default();
    tree.set(vec![
        json!({"id": "1", "title": "A"}),
        json!({"id": 2, "parent_id": "1", "title": "B"}),
        json!({"id": "3", "parent_id": 2.0, "title": "C"}),
    ])
    .unwrap();

    assert_eq!(level(&tree, 2), 2);
    assert_eq!(level(&tree, 3), 3);
    assert_eq!(parent_key(&tree, 2), Some(FieldValue::Int(1)));

    tree.add_one(json!({"id": 1, "title": "A2"})).unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(
        tree.find_by_pk(&FieldValue::Int(1)).unwrap().field("title"),
        Some(FieldValue::from("A2"))
    );
}

#[test]
fn given_mixed_ids_closing_a_loop_when_adding_then_cycle_detected() {
    let mut tree = Tree::default();
    tree.set(vec![json!({"id": "1"}), json!({"id": 2, "parent_id": 1})])
        .unwrap();

    let result = tree.add_one(json!({"id": 1, "parent_id": "2"})).map(|_| ());

    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
    assert_eq!(level(&tree, 2), 2);
}

// ============================================================
// Configured fields and custom record types
// ============================================================

#[rstest]
#[case("code", "parent_code")]
#[case("slug", "up")]
fn given_custom_key_fields_when_building_then_uses_them(
    #[case] key_field: &str,
    #[case] parent_field: &str,
) {
    let mut tree = Tree::new(TreeConfig::new(key_field, parent_field));
    tree.set(vec![
        json!({key_field: "root", "title": "Root"}),
        json!({key_field: "leaf", parent_field: "root", "title": "Leaf"}),
    ])
    .unwrap();

    let leaf = tree.find_by_pk(&FieldValue::from("leaf")).unwrap();
    assert_eq!(leaf.level(), 2);
    assert_eq!(tree.config().key_field, key_field);
}

#[derive(Debug)]
struct Category {
    id: u32,
    parent: Option<u32>,
    name: &'static str,
}

impl Fields for Category {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Int(i64::from(self.id))),
            "parent_id" => self.parent.map(|p| FieldValue::Int(i64::from(p))),
            "name" => Some(FieldValue::from(self.name)),
            _ => None,
        }
    }
}

#[test]
fn given_struct_records_when_building_then_accessor_drives_linking() {
    let mut tree = Tree::default();
    tree.set(vec![
        Category { id: 1, parent: None, name: "Tools" },
        Category { id: 2, parent: Some(1), name: "Saws" },
    ])
    .unwrap();

    let saws = tree.find_by_pk(&FieldValue::Int(2)).unwrap();
    assert_eq!(saws.record().unwrap().name, "Saws");
    assert_eq!(
        tree.list("id", "name", &ListOptions::default())[&FieldValue::Int(2)],
        "- Saws"
    );
}

#[test]
fn given_hashmap_records_when_building_then_links() {
    let rec = |id: i64, parent: Option<i64>| {
        let mut m: HashMap<String, FieldValue> = HashMap::new();
        m.insert("id".into(), FieldValue::Int(id));
        if let Some(p) = parent {
            m.insert("parent_id".into(), FieldValue::Int(p));
        }
        m
    };

    let mut tree = Tree::default();
    tree.set(vec![rec(1, None), rec(2, Some(1)), rec(3, Some(2))]).unwrap();
    assert_eq!(tree.depth(), 3);
}

fn chain(len: i64) -> Tree<Value> {
    let records: Vec<Value> = (0..len)
        .map(|i| {
            if i == 0 {
                json!({"id": 0, "title": "n0"})
            } else {
                json!({"id": i, "parent_id": i - 1, "title": format!("n{}", i)})
            }
        })
        .collect();

    let mut tree = Tree::default();
    tree.set(records).unwrap();
    tree
}

#[test]
fn given_long_chain_when_querying_then_no_stack_exhaustion() {
    let tree = chain(50_000);

    assert_eq!(tree.depth(), 50_000);
    assert_eq!(tree.values("id", &ListOptions::plain()).len(), 50_000);
    assert_eq!(tree.level_roots(50_000).len(), 1);
}

#[test]
fn given_long_chain_when_rendering_then_too_deep_instead_of_overflow() {
    let tree = chain(50_000);

    let result = tree.to_tree_string("title").map(|t| t.to_string());

    assert_eq!(
        result,
        Err(DomainError::TooDeep {
            depth: 50_000,
            limit: MAX_RENDER_DEPTH
        })
    );
}

#[test]
fn given_chain_at_render_limit_when_rendering_then_draws_every_level() {
    let tree = chain(MAX_RENDER_DEPTH as i64);

    let rendered = tree.to_tree_string("title").unwrap().to_string();

    assert_eq!(rendered.lines().count(), MAX_RENDER_DEPTH + 1);
    let last = format!("n{} [{}]", MAX_RENDER_DEPTH - 1, MAX_RENDER_DEPTH - 1);
    assert!(rendered.lines().last().unwrap().ends_with(&last));
}
