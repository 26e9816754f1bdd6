use proptest::prelude::*;
use treecraft_core::{
    ConceptCatalog, ExchangeCodec, MemoryKv, SequenceIdGenerator, TreeEditor, TreeMeta, TreePatch,
    TreeRepository, validate_tree,
};

const USER: &str = "user-1";

fn concept() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f"]).prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_add_node_is_idempotent(concepts in prop::collection::vec(concept(), 1..12)) {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let tree = editor.create(USER, TreeMeta::default());

        for concept in &concepts {
            editor.add_node(USER, &tree.id, concept);
        }
        let once = editor.get(USER, &tree.id).expect("tree exists");
        for concept in &concepts {
            editor.add_node(USER, &tree.id, concept);
        }
        let twice = editor.get(USER, &tree.id).expect("tree exists");

        prop_assert_eq!(once.nodes.len(), twice.nodes.len());
        prop_assert_eq!(once.root_concept_id, concepts[0].clone());
    }

    #[test]
    fn prop_connect_before_nodes_is_noop(from in concept(), to in concept()) {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let tree = editor.create(USER, TreeMeta::default());

        let after = editor.connect(USER, &tree.id, &from, &to).expect("tree exists");
        prop_assert_eq!(after, tree);
    }

    #[test]
    fn prop_set_next_ids_never_stores_self_or_duplicates(
        next in prop::collection::vec(concept(), 0..16)
    ) {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let tree = editor.create(USER, TreeMeta::default());
        editor.add_node(USER, &tree.id, "a");

        let updated = editor.set_next_ids(USER, &tree.id, "a", next).expect("tree exists");
        let stored = &updated.node("a").expect("node exists").next_ids;
        let mut unique = stored.clone();
        unique.sort();
        unique.dedup();

        prop_assert!(!stored.iter().any(|id| id == "a"));
        prop_assert_eq!(unique.len(), stored.len());
    }

    #[test]
    fn prop_metadata_patch_keeps_nodes(
        concepts in prop::collection::vec(concept(), 0..8),
        titles in prop::collection::vec("[A-Za-z ]{0,12}", 1..5)
    ) {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let tree = editor.create(USER, TreeMeta::default());
        for concept in &concepts {
            editor.add_node(USER, &tree.id, concept);
        }
        let before = editor.get(USER, &tree.id).expect("tree exists").nodes;

        for title in titles {
            editor.patch(USER, &tree.id, TreePatch { title: Some(title), ..TreePatch::default() });
        }
        let after = editor.get(USER, &tree.id).expect("tree exists").nodes;
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_export_import_round_trip(
        concepts in prop::collection::vec(concept(), 0..6),
        edges in prop::collection::vec((concept(), concept()), 0..10)
    ) {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let codec = ExchangeCodec::new(&repo, &ids);
        let tree = editor.create(USER, TreeMeta { title: Some("Round trip".into()), ..TreeMeta::default() });
        for concept in &concepts {
            editor.add_node(USER, &tree.id, concept);
        }
        for (from, to) in &edges {
            editor.connect(USER, &tree.id, from, to);
        }
        let source = editor.get(USER, &tree.id).expect("tree exists");

        let exported = codec.export(&source).expect("export should succeed");
        let copy = codec.import("user-2", &exported).expect("import should succeed");

        prop_assert_ne!(&copy.id, &source.id);
        prop_assert_eq!(&copy.nodes, &source.nodes);
        prop_assert_eq!(&copy.title, &source.title);
        prop_assert_eq!(&copy.root_concept_id, &source.root_concept_id);

        let master = ConceptCatalog::from_ids(["a", "b", "c", "d", "e", "f"]);
        prop_assert_eq!(
            validate_tree(&copy, &master).messages(),
            validate_tree(&source, &master).messages()
        );
    }
}
