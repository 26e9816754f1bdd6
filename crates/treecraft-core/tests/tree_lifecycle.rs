//! End-to-end tree lifecycle over the directory-backed store.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use treecraft_core::{
    BadgeTier, ConceptCatalog, ExchangeCodec, ExchangeError, FileKv, KeyValueStore, MinBadge,
    TreeEditor, TreeMeta, TreePatch, TreeRepository, UnlockConditionsPatch, UuidIdGenerator,
    storage_key,
};

const USER: &str = "learner-7";

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "treecraft-core-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn master() -> ConceptCatalog {
    ConceptCatalog::from_ids(["counting", "addition", "subtraction", "multiplication"])
}

#[test]
fn build_validate_export_import_delete() {
    let dir = TempDirGuard::new("lifecycle");
    let repo = TreeRepository::new(FileKv::new(dir.path()));
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);
    let codec = ExchangeCodec::new(&repo, &ids);

    let tree = editor.create(
        USER,
        TreeMeta {
            title: Some("Arithmetic Basics".into()),
            primary_domain: Some("math".into()),
            tags: Some(vec!["k12".into(), "numbers".into()]),
            ..TreeMeta::default()
        },
    );
    assert!(tree.slug.starts_with("arithmetic-basics-"));

    for concept in ["counting", "addition", "subtraction", "multiplication"] {
        editor.add_node(USER, &tree.id, concept);
    }
    editor.connect(USER, &tree.id, "counting", "addition");
    editor.connect(USER, &tree.id, "counting", "subtraction");
    editor.set_next_ids(
        USER,
        &tree.id,
        "addition",
        vec!["multiplication".into(), "addition".into()],
    );
    editor.set_unlock_conditions(
        USER,
        &tree.id,
        "multiplication",
        UnlockConditionsPatch {
            required_concept_ids: Some(vec!["addition".into()]),
            min_badge: Some(BadgeTier::Bronze.into()),
            custom_rule_id: None,
        },
    );

    let report = editor
        .validate(USER, &tree.id, &master())
        .expect("tree exists");
    assert!(report.ok, "{}", report.render());

    let stored = editor.get(USER, &tree.id).expect("tree exists");
    assert_eq!(stored.root_concept_id, "counting");
    assert_eq!(
        stored.node("addition").expect("node exists").next_ids,
        vec!["multiplication"]
    );
    assert_eq!(
        stored
            .node("multiplication")
            .expect("node exists")
            .unlock_conditions
            .min_badge,
        MinBadge::Tier(BadgeTier::Bronze)
    );

    // Reopen through a fresh repository to prove the data hit disk.
    let reopened = TreeRepository::new(FileKv::new(dir.path()));
    assert_eq!(reopened.find(USER, &tree.id), Some(stored.clone()));

    let exported = codec.export(&stored).expect("export should succeed");
    let copy = codec
        .import_validated(USER, &exported, &master())
        .expect("import should succeed");
    assert_ne!(copy.id, stored.id);
    assert_ne!(copy.slug, stored.slug);
    assert_eq!(copy.nodes, stored.nodes);
    assert_eq!(copy.title, stored.title);
    assert_eq!(copy.primary_domain, stored.primary_domain);
    assert_eq!(copy.tags, stored.tags);
    assert_eq!(copy.root_concept_id, stored.root_concept_id);
    assert_eq!(editor.list(USER).len(), 2);

    assert!(editor.delete(USER, &tree.id));
    let remaining = editor.list(USER);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, copy.id);
}

#[test]
fn exported_snapshot_is_detached_from_later_edits() {
    let dir = TempDirGuard::new("detached");
    let repo = TreeRepository::new(FileKv::new(dir.path()));
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);
    let codec = ExchangeCodec::new(&repo, &ids);

    let tree = editor.create(USER, TreeMeta::default());
    let tree = editor.add_node(USER, &tree.id, "counting").expect("tree exists");
    let snapshot = codec.export(&tree).expect("export should succeed");

    editor.add_node(USER, &tree.id, "addition");
    editor.patch(
        USER,
        &tree.id,
        TreePatch {
            title: Some("Renamed".into()),
            ..TreePatch::default()
        },
    );

    assert_eq!(snapshot["nodes"].as_array().map(Vec::len), Some(1));
    assert_eq!(snapshot["title"], "Untitled Tree");
}

#[test]
fn rejected_import_leaves_disk_untouched() {
    let dir = TempDirGuard::new("rejected");
    let kv = FileKv::new(dir.path());
    let repo = TreeRepository::new(kv.clone());
    let ids = UuidIdGenerator;
    let codec = ExchangeCodec::new(&repo, &ids);

    let payload = serde_json::json!({
        "title": "Broken",
        "nodes": [{"conceptId": "counting", "unlockConditions": {"requiredConceptIds": ["ghost"]}}]
    });
    let err = codec
        .import_validated(USER, &payload, &master())
        .expect_err("unknown prerequisite must be rejected");
    assert!(matches!(err, ExchangeError::Validation { ref errors } if errors.len() == 1));
    assert_eq!(
        kv.get(&storage_key(USER)).expect("store should be readable"),
        None
    );
}

#[test]
fn corrupt_collection_reads_as_empty_and_is_overwritten() {
    let dir = TempDirGuard::new("corrupt");
    let kv = FileKv::new(dir.path());
    kv.set(&storage_key(USER), "[{\"id\": 1")
        .expect("fixture should write");
    let repo = TreeRepository::new(kv);
    let ids = UuidIdGenerator;
    let editor = TreeEditor::new(&repo, &ids);

    assert!(editor.list(USER).is_empty());
    assert!(repo.try_load(USER).is_err());

    let tree = editor.create(USER, TreeMeta::default());
    assert_eq!(repo.try_load(USER).expect("collection is valid again"), vec![tree]);
}
