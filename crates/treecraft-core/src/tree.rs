//! Creator tree types: the aggregate root and its nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::concept::ConceptId;

pub const DEFAULT_TITLE: &str = "Untitled Tree";
pub const DEFAULT_PRIMARY_DOMAIN: &str = "general";

/// Ordinal prerequisite strength gating a node's unlock.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl BadgeTier {
    pub const ALL: [BadgeTier; 4] = [
        BadgeTier::None,
        BadgeTier::Bronze,
        BadgeTier::Silver,
        BadgeTier::Gold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTier::None => "none",
            BadgeTier::Bronze => "bronze",
            BadgeTier::Silver => "silver",
            BadgeTier::Gold => "gold",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == raw)
    }
}

/// The `minBadge` value as stored.
///
/// Stored and imported data may carry values outside the four tiers,
/// including non-strings such as `null` or numbers. They are kept verbatim
/// so the integrity check can report them instead of the whole collection
/// failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinBadge {
    Tier(BadgeTier),
    Unrecognized(Value),
}

impl MinBadge {
    pub fn tier(&self) -> Option<BadgeTier> {
        match self {
            MinBadge::Tier(tier) => Some(*tier),
            MinBadge::Unrecognized(_) => None,
        }
    }

    /// Classify a raw string, keeping unknown values.
    pub fn from_raw(raw: &str) -> Self {
        match BadgeTier::parse(raw) {
            Some(tier) => MinBadge::Tier(tier),
            None => MinBadge::Unrecognized(Value::String(raw.to_string())),
        }
    }
}

impl Default for MinBadge {
    fn default() -> Self {
        MinBadge::Tier(BadgeTier::None)
    }
}

impl From<BadgeTier> for MinBadge {
    fn from(tier: BadgeTier) -> Self {
        MinBadge::Tier(tier)
    }
}

impl fmt::Display for MinBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinBadge::Tier(tier) => f.write_str(tier.as_str()),
            MinBadge::Unrecognized(Value::String(raw)) => f.write_str(raw),
            MinBadge::Unrecognized(other) => write!(f, "{other}"),
        }
    }
}

/// Conditions that must hold before a node unlocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConditions {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub required_concept_ids: Vec<ConceptId>,
    #[serde(default)]
    pub min_badge: MinBadge,
    /// Reserved for external rule engines; kept as opaque JSON and never
    /// interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rule_id: Option<Value>,
}

/// Partial update for [`UnlockConditions`]. Absent fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConditionsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_concept_ids: Option<Vec<ConceptId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_badge: Option<MinBadge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rule_id: Option<Value>,
}

impl UnlockConditions {
    pub fn apply(&mut self, patch: UnlockConditionsPatch) {
        if let Some(required) = patch.required_concept_ids {
            self.required_concept_ids = required;
        }
        if let Some(min_badge) = patch.min_badge {
            self.min_badge = min_badge;
        }
        if let Some(rule) = patch.custom_rule_id {
            self.custom_rule_id = Some(rule);
        }
    }
}

/// One concept participating in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub concept_id: ConceptId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub next_ids: Vec<ConceptId>,
    #[serde(default)]
    pub unlock_conditions: UnlockConditions,
}

impl Node {
    pub fn new(concept_id: impl Into<ConceptId>) -> Self {
        Self {
            concept_id: concept_id.into(),
            next_ids: Vec::new(),
            unlock_conditions: UnlockConditions::default(),
        }
    }
}

/// A user-authored directed graph of concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    // ── Identity ──
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub creator_id: String,

    // ── Metadata ──
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_primary_domain")]
    pub primary_domain: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    // ── Graph ──
    #[serde(default)]
    pub root_concept_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodes: Vec<Node>,

    // ── Timestamps ──
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// An explicit `null` list reads as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_primary_domain() -> String {
    DEFAULT_PRIMARY_DOMAIN.to_string()
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Metadata accepted when a tree is created or imported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_domain: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub root_concept_id: Option<String>,
}

/// Top-level fields merged by a patch.
///
/// `nodes` replaces the node list only when it is explicitly present, so a
/// metadata-only patch can never wipe the graph. Identity fields are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_domain: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub root_concept_id: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
}

impl Tree {
    /// Build an empty tree, defaulting every metadata field that `meta`
    /// leaves out.
    pub fn new(
        id: impl Into<String>,
        slug: impl Into<String>,
        creator_id: impl Into<String>,
        meta: TreeMeta,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            slug: slug.into(),
            creator_id: creator_id.into(),
            title: non_blank(meta.title).unwrap_or_else(default_title),
            description: meta.description.unwrap_or_default(),
            primary_domain: non_blank(meta.primary_domain)
                .unwrap_or_else(default_primary_domain),
            tags: meta.tags.unwrap_or_default(),
            root_concept_id: meta.root_concept_id.unwrap_or_default(),
            nodes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn node(&self, concept_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.concept_id == concept_id)
    }

    pub fn node_mut(&mut self, concept_id: &str) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|node| node.concept_id == concept_id)
    }

    pub fn contains_node(&self, concept_id: &str) -> bool {
        self.node(concept_id).is_some()
    }

    /// Count of `nextIds` edges across all nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.next_ids.len()).sum()
    }

    pub fn apply_patch(&mut self, patch: TreePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(domain) = patch.primary_domain {
            self.primary_domain = domain;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(root) = patch.root_concept_id {
            self.root_concept_id = root;
        }
        if let Some(nodes) = patch.nodes {
            self.nodes = nodes;
        }
    }

    pub fn touch_updated_at(&mut self) {
        self.updated_at = Utc::now();
    }
}
