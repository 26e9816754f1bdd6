//! Integrity checking for creator trees.
//!
//! Four independent passes, each accumulating findings:
//! 1. duplicate nodes and unresolved references
//! 2. self-loops
//! 3. cycles (iterative DFS, visiting/settled marking)
//! 4. reachability from start nodes (zero in-degree)
//!
//! The report is always complete; no pass stops at its first finding. A
//! broken edge can legitimately show up twice, once for tree membership and
//! once for master-graph resolution.

use crate::concept::{ConceptId, MasterGraph};
use crate::tree::{MinBadge, Tree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Write as _;

pub const INTEGRITY_CHECK_KIND: &str = "treecraft.integrity.check.v1";

pub const FAILURE_CLASS_DUPLICATE_NODE: &str = "integrity.node.duplicate";
pub const FAILURE_CLASS_UNKNOWN_CONCEPT: &str = "integrity.concept.unknown";
pub const FAILURE_CLASS_UNKNOWN_REQUIRED: &str = "integrity.required_concept.unknown";
pub const FAILURE_CLASS_INVALID_MIN_BADGE: &str = "integrity.min_badge.invalid";
pub const FAILURE_CLASS_NEXT_NOT_IN_TREE: &str = "integrity.next_id.not_in_tree";
pub const FAILURE_CLASS_NEXT_UNKNOWN: &str = "integrity.next_id.unknown";
pub const FAILURE_CLASS_SELF_LOOP: &str = "integrity.next_id.self_loop";
pub const FAILURE_CLASS_CYCLE: &str = "integrity.graph.cycle";
pub const FAILURE_CLASS_UNREACHABLE: &str = "integrity.graph.unreachable";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityFinding {
    pub concept_id: ConceptId,
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegritySummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub start_node_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub check_kind: String,
    pub tree_id: String,
    pub ok: bool,
    pub failure_classes: Vec<String>,
    pub errors: Vec<IntegrityFinding>,
    pub summary: IntegritySummary,
}

impl IntegrityReport {
    /// Plain error strings, in detection order.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|finding| finding.message.clone())
            .collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.errors.iter().any(|finding| finding.class == class)
    }

    /// Human-readable report, one finding per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "[integrity] {} {} (nodes={}, edges={}, starts={}, errors={})",
            if self.ok { "OK" } else { "FAIL" },
            self.tree_id,
            self.summary.node_count,
            self.summary.edge_count,
            self.summary.start_node_count,
            self.summary.error_count
        );
        for finding in &self.errors {
            let _ = writeln!(out, "  - {} {}", finding.class, finding.message);
        }
        out
    }
}

struct Findings {
    errors: Vec<IntegrityFinding>,
}

impl Findings {
    fn push(&mut self, concept_id: &str, class: &str, message: String) {
        self.errors.push(IntegrityFinding {
            concept_id: concept_id.to_string(),
            class: class.to_string(),
            message,
        });
    }
}

/// Check `tree` against `master`.
pub fn validate_tree<M>(tree: &Tree, master: &M) -> IntegrityReport
where
    M: MasterGraph + ?Sized,
{
    let mut findings = Findings { errors: Vec::new() };

    check_references(tree, master, &mut findings);
    check_self_loops(tree, &mut findings);
    check_cycles(tree, &mut findings);
    let start_node_count = check_reachability(tree, &mut findings);

    let failure_classes = findings
        .errors
        .iter()
        .map(|finding| finding.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let summary = IntegritySummary {
        node_count: tree.nodes.len(),
        edge_count: tree.edge_count(),
        start_node_count,
        error_count: findings.errors.len(),
    };
    tracing::debug!(
        tree_id = %tree.id,
        nodes = summary.node_count,
        errors = summary.error_count,
        "integrity check finished"
    );

    IntegrityReport {
        check_kind: INTEGRITY_CHECK_KIND.to_string(),
        tree_id: tree.id.clone(),
        ok: findings.errors.is_empty(),
        failure_classes,
        errors: findings.errors,
        summary,
    }
}

fn check_references<M>(tree: &Tree, master: &M, findings: &mut Findings)
where
    M: MasterGraph + ?Sized,
{
    let node_ids: HashSet<&str> = tree.nodes.iter().map(|n| n.concept_id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for node in &tree.nodes {
        let id = node.concept_id.as_str();
        if !seen.insert(id) {
            findings.push(
                id,
                FAILURE_CLASS_DUPLICATE_NODE,
                format!("duplicate node conceptId \"{id}\""),
            );
        }
        if !master.contains(id) {
            findings.push(
                id,
                FAILURE_CLASS_UNKNOWN_CONCEPT,
                format!("unknown conceptId \"{id}\""),
            );
        }

        let conditions = &node.unlock_conditions;
        for required in &conditions.required_concept_ids {
            if !master.contains(required) {
                findings.push(
                    id,
                    FAILURE_CLASS_UNKNOWN_REQUIRED,
                    format!("node \"{id}\": unknown requiredConceptId \"{required}\""),
                );
            }
        }
        if let badge @ MinBadge::Unrecognized(_) = &conditions.min_badge {
            findings.push(
                id,
                FAILURE_CLASS_INVALID_MIN_BADGE,
                format!("node \"{id}\": invalid minBadge \"{badge}\""),
            );
        }

        for next in &node.next_ids {
            if !node_ids.contains(next.as_str()) {
                findings.push(
                    id,
                    FAILURE_CLASS_NEXT_NOT_IN_TREE,
                    format!("node \"{id}\": nextId \"{next}\" is not a node in this tree"),
                );
            }
            if !master.contains(next) {
                findings.push(
                    id,
                    FAILURE_CLASS_NEXT_UNKNOWN,
                    format!("node \"{id}\": unknown nextId \"{next}\""),
                );
            }
        }
    }
}

fn check_self_loops(tree: &Tree, findings: &mut Findings) {
    for node in &tree.nodes {
        let id = node.concept_id.as_str();
        if node.next_ids.iter().any(|next| next == id) {
            findings.push(
                id,
                FAILURE_CLASS_SELF_LOOP,
                format!("node \"{id}\": nextIds contains a self-loop"),
            );
        }
    }
}

/// Adjacency over `nextIds`. A duplicated node id keeps its last entry.
fn adjacency(tree: &Tree) -> HashMap<&str, &[ConceptId]> {
    tree.nodes
        .iter()
        .map(|node| (node.concept_id.as_str(), node.next_ids.as_slice()))
        .collect()
}

/// Depth-first search from every node in storage order. Reaching a node
/// that is still on the current path reports a cycle at that node; settled
/// nodes are never explored twice.
fn check_cycles(tree: &Tree, findings: &mut Findings) {
    let adjacency = adjacency(tree);
    let neighbors = |id: &str| adjacency.get(id).copied().unwrap_or(&[]);

    let mut visiting: HashSet<&str> = HashSet::new();
    let mut settled: HashSet<&str> = HashSet::new();

    for node in &tree.nodes {
        let start = node.concept_id.as_str();
        if settled.contains(start) {
            continue;
        }

        visiting.insert(start);
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        while let Some(frame) = stack.last_mut() {
            let (current, cursor) = *frame;
            let next_ids = neighbors(current);
            if cursor < next_ids.len() {
                frame.1 += 1;
                let next = next_ids[cursor].as_str();
                if visiting.contains(next) {
                    findings.push(
                        next,
                        FAILURE_CLASS_CYCLE,
                        format!("cycle detected at \"{next}\""),
                    );
                } else if !settled.contains(next) {
                    visiting.insert(next);
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
                visiting.remove(current);
                settled.insert(current);
            }
        }
    }
}

/// Multi-source traversal from zero in-degree nodes. Skipped entirely when
/// no start node exists. Returns the number of distinct start nodes.
fn check_reachability(tree: &Tree, findings: &mut Findings) -> usize {
    let mut in_degree: HashMap<&str, usize> = tree
        .nodes
        .iter()
        .map(|node| (node.concept_id.as_str(), 0))
        .collect();
    for node in &tree.nodes {
        for next in &node.next_ids {
            *in_degree.entry(next.as_str()).or_insert(0) += 1;
        }
    }

    let mut starts: Vec<&str> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    for node in &tree.nodes {
        let id = node.concept_id.as_str();
        if in_degree.get(id) == Some(&0) && visited.insert(id) {
            starts.push(id);
        }
    }
    if starts.is_empty() {
        return 0;
    }

    let adjacency = adjacency(tree);
    let mut queue: VecDeque<&str> = starts.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        for next in adjacency.get(current).copied().unwrap_or(&[]) {
            if visited.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }

    let mut reported: HashSet<&str> = HashSet::new();
    for node in &tree.nodes {
        let id = node.concept_id.as_str();
        if !visited.contains(id) && reported.insert(id) {
            findings.push(
                id,
                FAILURE_CLASS_UNREACHABLE,
                format!("node \"{id}\" is unreachable from any start node"),
            );
        }
    }

    starts.len()
}
