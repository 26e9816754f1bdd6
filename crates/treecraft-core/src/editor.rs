//! Structural editing of creator trees.
//!
//! Every operation is read-modify-write over the user's whole collection:
//! load, mutate one tree in memory, persist the collection back. Absent
//! trees and nodes are not errors; operations return `None` or the tree
//! unchanged and callers check the return value.

use std::collections::HashSet;

use crate::concept::{ConceptId, MasterGraph};
use crate::ids::IdGenerator;
use crate::integrity::{IntegrityReport, validate_tree};
use crate::kv::KeyValueStore;
use crate::repository::TreeRepository;
use crate::tree::{Node, Tree, TreeMeta, TreePatch, UnlockConditionsPatch};

pub struct TreeEditor<'a, S, G: ?Sized> {
    repo: &'a TreeRepository<S>,
    ids: &'a G,
}

impl<'a, S, G> TreeEditor<'a, S, G>
where
    S: KeyValueStore,
    G: IdGenerator + ?Sized,
{
    pub fn new(repo: &'a TreeRepository<S>, ids: &'a G) -> Self {
        Self { repo, ids }
    }

    pub fn list(&self, user_id: &str) -> Vec<Tree> {
        self.repo.load(user_id)
    }

    pub fn get(&self, user_id: &str, tree_id: &str) -> Option<Tree> {
        self.repo.find(user_id, tree_id)
    }

    /// Allocate an empty tree owned by `user_id` and append it to their
    /// collection.
    pub fn create(&self, user_id: &str, meta: TreeMeta) -> Tree {
        let mut tree = Tree::new(self.ids.tree_id(), String::new(), user_id, meta);
        tree.slug = self.ids.slug(&tree.title);

        let mut trees = self.repo.load(user_id);
        trees.push(tree.clone());
        self.repo.save(user_id, &trees);
        tracing::info!(user_id, tree_id = %tree.id, slug = %tree.slug, "created tree");
        tree
    }

    /// Merge top-level metadata. The node list is only replaced when the
    /// patch carries `nodes` explicitly.
    pub fn patch(&self, user_id: &str, tree_id: &str, patch: TreePatch) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            tree.apply_patch(patch);
            true
        })
    }

    /// Remove a tree. Returns whether anything was removed.
    pub fn delete(&self, user_id: &str, tree_id: &str) -> bool {
        let mut trees = self.repo.load(user_id);
        let before = trees.len();
        trees.retain(|tree| tree.id != tree_id);
        if trees.len() == before {
            return false;
        }
        self.repo.save(user_id, &trees);
        tracing::info!(user_id, tree_id, "deleted tree");
        true
    }

    /// Append a node for `concept_id` unless one already exists. The first
    /// node added becomes the root when no root is set.
    pub fn add_node(&self, user_id: &str, tree_id: &str, concept_id: &str) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            if tree.contains_node(concept_id) {
                return false;
            }
            tree.nodes.push(Node::new(concept_id));
            if tree.root_concept_id.is_empty() {
                tree.root_concept_id = concept_id.to_string();
            }
            true
        })
    }

    /// Add the edge `from_id -> to_id`. Both nodes must already exist;
    /// otherwise the tree comes back unchanged.
    pub fn connect(
        &self,
        user_id: &str,
        tree_id: &str,
        from_id: &str,
        to_id: &str,
    ) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            if !tree.contains_node(to_id) {
                return false;
            }
            let Some(from) = tree.node_mut(from_id) else {
                return false;
            };
            if from.next_ids.iter().any(|next| next == to_id) {
                return false;
            }
            from.next_ids.push(to_id.to_string());
            true
        })
    }

    /// Merge unlock conditions into an existing node.
    pub fn set_unlock_conditions(
        &self,
        user_id: &str,
        tree_id: &str,
        concept_id: &str,
        conditions: UnlockConditionsPatch,
    ) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            let Some(node) = tree.node_mut(concept_id) else {
                return false;
            };
            let before = node.unlock_conditions.clone();
            node.unlock_conditions.apply(conditions);
            node.unlock_conditions != before
        })
    }

    /// Replace a node's outgoing edges. Duplicates keep their first
    /// position and self references are dropped.
    pub fn set_next_ids(
        &self,
        user_id: &str,
        tree_id: &str,
        concept_id: &str,
        next_ids: Vec<ConceptId>,
    ) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            let Some(node) = tree.node_mut(concept_id) else {
                return false;
            };
            let cleaned = normalize_next_ids(concept_id, next_ids);
            if node.next_ids == cleaned {
                return false;
            }
            node.next_ids = cleaned;
            true
        })
    }

    /// Issue a fresh slug from the tree's current title.
    pub fn regenerate_slug(&self, user_id: &str, tree_id: &str) -> Option<Tree> {
        self.mutate(user_id, tree_id, |tree| {
            tree.slug = self.ids.slug(&tree.title);
            true
        })
    }

    /// Run the integrity check against a stored tree.
    pub fn validate<M>(&self, user_id: &str, tree_id: &str, master: &M) -> Option<IntegrityReport>
    where
        M: MasterGraph + ?Sized,
    {
        self.get(user_id, tree_id)
            .map(|tree| validate_tree(&tree, master))
    }

    /// Load, mutate one tree, persist when `mutator` reports a change.
    fn mutate<F>(&self, user_id: &str, tree_id: &str, mutator: F) -> Option<Tree>
    where
        F: FnOnce(&mut Tree) -> bool,
    {
        let mut trees = self.repo.load(user_id);
        let tree = trees.iter_mut().find(|tree| tree.id == tree_id)?;
        if !mutator(tree) {
            tracing::debug!(user_id, tree_id, "tree unchanged");
            return Some(tree.clone());
        }
        tree.touch_updated_at();
        let updated = tree.clone();
        self.repo.save(user_id, &trees);
        tracing::debug!(user_id, tree_id, nodes = updated.nodes.len(), "tree updated");
        Some(updated)
    }
}

fn normalize_next_ids(concept_id: &str, next_ids: Vec<ConceptId>) -> Vec<ConceptId> {
    let mut seen = HashSet::new();
    next_ids
        .into_iter()
        .filter(|next| next != concept_id)
        .filter(|next| seen.insert(next.clone()))
        .collect()
}
