//! # treecraft-core
//!
//! Creator trees: small user-authored learning progressions layered over a
//! fixed master graph of concepts.
//!
//! This crate provides:
//! - `Tree`, `Node`, `UnlockConditions` (the data model)
//! - `TreeRepository` (per-user collections over a key-value store)
//! - `TreeEditor` (read-modify-write structural edits)
//! - `validate_tree` (duplicates, references, cycles, reachability)
//! - `ExchangeCodec` (export snapshots, all-or-nothing import)
//!
//! Storage, identity and the master graph are collaborators behind traits
//! (`KeyValueStore`, `IdGenerator`, `MasterGraph`).
//!
//! ## Data flow
//!
//! ```text
//! TreeEditor ──┐            ┌── validate_tree ── MasterGraph
//!              ├─ TreeRepository ── KeyValueStore
//! ExchangeCodec┘
//! ```

pub mod concept;
pub mod editor;
pub mod error;
pub mod exchange;
pub mod ids;
pub mod integrity;
pub mod kv;
pub mod repository;
pub mod tree;

pub use concept::{CatalogError, Concept, ConceptCatalog, ConceptId, MasterGraph};
pub use editor::TreeEditor;
pub use error::{ExchangeError, StorageError};
pub use exchange::{ExchangeCodec, export_tree, parse_payload};
pub use ids::{IdGenerator, SequenceIdGenerator, UuidIdGenerator, slug_stem};
pub use integrity::{
    FAILURE_CLASS_CYCLE, FAILURE_CLASS_DUPLICATE_NODE, FAILURE_CLASS_INVALID_MIN_BADGE,
    FAILURE_CLASS_NEXT_NOT_IN_TREE, FAILURE_CLASS_NEXT_UNKNOWN, FAILURE_CLASS_SELF_LOOP,
    FAILURE_CLASS_UNKNOWN_CONCEPT, FAILURE_CLASS_UNKNOWN_REQUIRED, FAILURE_CLASS_UNREACHABLE,
    INTEGRITY_CHECK_KIND, IntegrityFinding, IntegrityReport, IntegritySummary, validate_tree,
};
pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use repository::{STORAGE_KEY_PREFIX, TreeRepository, storage_key};
pub use tree::{
    BadgeTier, DEFAULT_PRIMARY_DOMAIN, DEFAULT_TITLE, MinBadge, Node, Tree, TreeMeta, TreePatch,
    UnlockConditions, UnlockConditionsPatch,
};
