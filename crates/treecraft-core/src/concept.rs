//! Master-graph lookup: the fixed reference set of valid concepts.
//!
//! Trees only ever ask "does this id resolve, and to what". Everything else
//! about the master graph is owned elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Opaque concept identifier, meaningful only through a [`MasterGraph`].
pub type ConceptId = String;

/// A concept record as served by the master graph.
///
/// Only `id` is interpreted. Remaining fields are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: ConceptId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Concept {
    pub fn new(id: impl Into<ConceptId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            domain: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Resolve concept ids against the master graph.
pub trait MasterGraph {
    fn resolve(&self, concept_id: &str) -> Option<&Concept>;

    fn contains(&self, concept_id: &str) -> bool {
        self.resolve(concept_id).is_some()
    }
}

impl MasterGraph for BTreeMap<ConceptId, Concept> {
    fn resolve(&self, concept_id: &str) -> Option<&Concept> {
        self.get(concept_id)
    }
}

impl MasterGraph for HashMap<ConceptId, Concept> {
    fn resolve(&self, concept_id: &str) -> Option<&Concept> {
        self.get(concept_id)
    }
}

impl<M: MasterGraph + ?Sized> MasterGraph for &M {
    fn resolve(&self, concept_id: &str) -> Option<&Concept> {
        (**self).resolve(concept_id)
    }
}

/// In-memory master graph, typically hydrated from a JSONL export.
#[derive(Debug, Clone, Default)]
pub struct ConceptCatalog {
    concepts: BTreeMap<ConceptId, Concept>,
}

impl ConceptCatalog {
    /// Build a catalog. Duplicate ids resolve last-write-wins.
    pub fn from_concepts(concepts: impl IntoIterator<Item = Concept>) -> Self {
        let concepts = concepts
            .into_iter()
            .map(|concept| (concept.id.clone(), concept))
            .collect();
        Self { concepts }
    }

    /// Catalog of bare ids, mostly useful for tests and fixtures.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConceptId>,
    {
        Self::from_concepts(ids.into_iter().map(Concept::new))
    }

    /// Read concepts from a JSONL reader, one concept per line.
    pub fn read_jsonl(reader: impl BufRead) -> Result<Self, CatalogError> {
        let mut concepts = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CatalogError::Io(line_no + 1, e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let concept: Concept = serde_json::from_str(trimmed)
                .map_err(|e| CatalogError::Parse(line_no + 1, e.to_string()))?;
            concepts.push(concept);
        }
        Ok(Self::from_concepts(concepts))
    }

    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file =
            fs::File::open(path).map_err(|e| CatalogError::Io(0, format!("{}: {e}", path.display())))?;
        let catalog = Self::read_jsonl(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), concepts = catalog.len(), "loaded master graph");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }
}

impl MasterGraph for ConceptCatalog {
    fn resolve(&self, concept_id: &str) -> Option<&Concept> {
        self.concepts.get(concept_id)
    }
}

/// Errors from loading a master-graph catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_jsonl_skips_blank_and_comment_lines() {
        let raw = "# master graph\n{\"id\":\"algebra\",\"title\":\"Algebra\"}\n\n{\"id\":\"calculus\",\"level\":3}\n";
        let catalog = ConceptCatalog::read_jsonl(raw.as_bytes()).expect("catalog should parse");

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("algebra"));
        let calculus = catalog.resolve("calculus").expect("calculus must resolve");
        assert_eq!(calculus.extra.get("level"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn read_jsonl_reports_line_numbers() {
        let raw = "{\"id\":\"algebra\"}\nnot json\n";
        let err = ConceptCatalog::read_jsonl(raw.as_bytes()).expect_err("bad line must fail");
        assert!(matches!(err, CatalogError::Parse(2, _)));
    }

    #[test]
    fn maps_implement_master_graph() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Concept::new("a"));
        assert!(map.contains("a"));
        assert!(!map.contains("b"));
    }
}
