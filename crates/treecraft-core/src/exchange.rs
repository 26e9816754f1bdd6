//! Export and import of creator trees.
//!
//! Export is a value snapshot with no ties to the stored tree. Import always
//! mints a new identity, and is all-or-nothing: a malformed payload or a
//! rejected integrity check leaves the user's collection untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::concept::{ConceptCatalog, MasterGraph};
use crate::error::ExchangeError;
use crate::ids::IdGenerator;
use crate::integrity::validate_tree;
use crate::kv::KeyValueStore;
use crate::repository::TreeRepository;
use crate::tree::{Node, Tree, TreeMeta};

/// Fields honored from an incoming payload. Identity fields (`id`, `slug`,
/// `creatorId`) and timestamps are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    primary_domain: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    root_concept_id: Option<String>,
    #[serde(default)]
    nodes: Option<Vec<Node>>,
}

/// Snapshot a tree into a transportable JSON value.
pub fn export_tree(tree: &Tree) -> Result<Value, ExchangeError> {
    snapshot(tree)
}

fn snapshot<T: Serialize + ?Sized>(value: &T) -> Result<Value, ExchangeError> {
    serde_json::to_value(value).map_err(|e| ExchangeError::Serialize(e.to_string()))
}

/// Parse JSON text into an import payload value.
pub fn parse_payload(raw: &str) -> Result<Value, ExchangeError> {
    serde_json::from_str(raw).map_err(|e| ExchangeError::Malformed(e.to_string()))
}

pub struct ExchangeCodec<'a, S, G: ?Sized> {
    repo: &'a TreeRepository<S>,
    ids: &'a G,
}

impl<'a, S, G> ExchangeCodec<'a, S, G>
where
    S: KeyValueStore,
    G: IdGenerator + ?Sized,
{
    pub fn new(repo: &'a TreeRepository<S>, ids: &'a G) -> Self {
        Self { repo, ids }
    }

    pub fn export(&self, tree: &Tree) -> Result<Value, ExchangeError> {
        export_tree(tree)
    }

    /// Export a stored tree; `None` when it does not exist.
    pub fn export_stored(
        &self,
        user_id: &str,
        tree_id: &str,
    ) -> Option<Result<Value, ExchangeError>> {
        self.repo.find(user_id, tree_id).map(|tree| export_tree(&tree))
    }

    /// Import without an integrity check.
    pub fn import(&self, user_id: &str, data: &Value) -> Result<Tree, ExchangeError> {
        self.import_with::<ConceptCatalog>(user_id, data, None)
    }

    /// Import, rejecting the payload if any integrity finding is reported.
    pub fn import_validated<M>(
        &self,
        user_id: &str,
        data: &Value,
        master: &M,
    ) -> Result<Tree, ExchangeError>
    where
        M: MasterGraph + ?Sized,
    {
        self.import_with(user_id, data, Some(master))
    }

    pub fn import_with<M>(
        &self,
        user_id: &str,
        data: &Value,
        master: Option<&M>,
    ) -> Result<Tree, ExchangeError>
    where
        M: MasterGraph + ?Sized,
    {
        let tree = self.rebuild(user_id, data)?;

        if let Some(master) = master {
            let report = validate_tree(&tree, master);
            if !report.ok {
                tracing::info!(
                    user_id,
                    errors = report.summary.error_count,
                    "import rejected by integrity check"
                );
                return Err(ExchangeError::Validation {
                    errors: report.messages(),
                });
            }
        }

        let mut trees = self.repo.load(user_id);
        trees.push(tree.clone());
        self.repo.save(user_id, &trees);
        tracing::info!(user_id, tree_id = %tree.id, nodes = tree.nodes.len(), "imported tree");
        Ok(tree)
    }

    fn rebuild(&self, user_id: &str, data: &Value) -> Result<Tree, ExchangeError> {
        if !data.is_object() {
            return Err(ExchangeError::Malformed(format!(
                "expected a JSON object, got {}",
                value_kind(data)
            )));
        }
        let payload =
            ImportPayload::deserialize(data).map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        let meta = TreeMeta {
            title: payload.title,
            description: payload.description,
            primary_domain: payload.primary_domain,
            tags: payload.tags,
            root_concept_id: payload.root_concept_id,
        };
        let mut tree = Tree::new(self.ids.tree_id(), String::new(), user_id, meta);
        tree.slug = self.ids.slug(&tree.title);
        tree.nodes = payload.nodes.unwrap_or_default();
        Ok(tree)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::TreeEditor;
    use crate::ids::SequenceIdGenerator;
    use crate::kv::MemoryKv;
    use crate::tree::DEFAULT_TITLE;
    use serde_json::json;

    const USER: &str = "user-1";

    #[test]
    fn import_rejects_non_objects() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let codec = ExchangeCodec::new(&repo, &ids);

        for payload in [json!(null), json!([1, 2]), json!("tree"), json!(3)] {
            let err = codec.import(USER, &payload).expect_err("non-object must fail");
            assert!(matches!(err, ExchangeError::Malformed(_)));
        }
        assert!(repo.load(USER).is_empty());
    }

    #[test]
    fn snapshot_failures_are_serialization_errors() {
        let mut unencodable = std::collections::BTreeMap::new();
        unencodable.insert((1u8, 2u8), "tuple keys have no JSON form");

        let err = snapshot(&unencodable).expect_err("tuple keys must fail");
        assert!(matches!(err, ExchangeError::Serialize(_)), "{err:?}");
        assert!(err.to_string().starts_with("export serialization error"));
    }

    #[test]
    fn import_rejects_wrongly_typed_fields() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let codec = ExchangeCodec::new(&repo, &ids);

        let err = codec
            .import(USER, &json!({"nodes": "not-a-list"}))
            .expect_err("bad nodes must fail");
        assert!(matches!(err, ExchangeError::Malformed(_)));
    }

    #[test]
    fn import_never_reuses_incoming_identity() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let codec = ExchangeCodec::new(&repo, &ids);

        let tree = codec
            .import(
                USER,
                &json!({"id": "stolen", "slug": "stolen-slug", "creatorId": "mallory"}),
            )
            .expect("import should succeed");
        assert_ne!(tree.id, "stolen");
        assert_ne!(tree.slug, "stolen-slug");
        assert_eq!(tree.creator_id, USER);
        assert_eq!(tree.title, DEFAULT_TITLE);
        assert_eq!(repo.load(USER), vec![tree]);
    }

    #[test]
    fn validated_import_is_all_or_nothing() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let codec = ExchangeCodec::new(&repo, &ids);
        let master = ConceptCatalog::from_ids(["A", "B"]);

        let payload = json!({
            "title": "Loop",
            "nodes": [
                {"conceptId": "A", "nextIds": ["B"]},
                {"conceptId": "B", "nextIds": ["A"]}
            ]
        });
        let err = codec
            .import_validated(USER, &payload, &master)
            .expect_err("cyclic tree must be rejected");
        match err {
            ExchangeError::Validation { errors } => {
                assert!(errors.iter().any(|e| e.contains("cycle")));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(repo.load(USER).is_empty());
    }

    #[test]
    fn non_string_min_badge_is_a_validation_failure() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let codec = ExchangeCodec::new(&repo, &ids);
        let master = ConceptCatalog::from_ids(["A"]);

        let payload = json!({"nodes": [{"conceptId": "A", "unlockConditions": {"minBadge": null}}]});
        let err = codec
            .import_validated(USER, &payload, &master)
            .expect_err("null minBadge must be rejected");
        match err {
            ExchangeError::Validation { errors } => {
                assert_eq!(errors, vec!["node \"A\": invalid minBadge \"null\"".to_string()]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(repo.load(USER).is_empty());

        let payload = json!({"nodes": [{"conceptId": "A", "unlockConditions": {"minBadge": 3}}]});
        let tree = codec.import(USER, &payload).expect("unchecked import keeps the value");
        assert_eq!(tree.nodes[0].unlock_conditions.min_badge.tier(), None);
        assert_eq!(repo.load(USER), vec![tree]);
    }

    #[test]
    fn export_then_import_preserves_graph() {
        let repo = TreeRepository::new(MemoryKv::new());
        let ids = SequenceIdGenerator::new();
        let editor = TreeEditor::new(&repo, &ids);
        let codec = ExchangeCodec::new(&repo, &ids);

        let source = editor.create(
            USER,
            TreeMeta {
                title: Some("Algebra".into()),
                tags: Some(vec!["math".into()]),
                ..TreeMeta::default()
            },
        );
        editor.add_node(USER, &source.id, "A");
        editor.add_node(USER, &source.id, "B");
        let source = editor
            .connect(USER, &source.id, "A", "B")
            .expect("tree exists");

        let exported = codec.export(&source).expect("export should succeed");
        let copy = codec
            .import_validated("user-2", &exported, &ConceptCatalog::from_ids(["A", "B"]))
            .expect("import should succeed");

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.creator_id, "user-2");
        assert_eq!(copy.title, source.title);
        assert_eq!(copy.tags, source.tags);
        assert_eq!(copy.root_concept_id, "A");
        assert_eq!(copy.nodes, source.nodes);
    }
}
