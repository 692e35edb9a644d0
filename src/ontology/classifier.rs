//! Sensitivity classification over concept-path hierarchies
//!
//! Ontology concepts are identified by delimiter-separated paths, root to
//! leaf (`\Diagnoses\Neoplasms\Benign neoplasms\`). A concept is sensitive if
//! it is explicitly marked, or if any proper ancestor of its path is
//! sensitive. The classifier also assigns sequential encrypt IDs to sensitive
//! nodes and aggregates each node's direct children's IDs, both consumed by
//! the tagging phase.

use std::collections::{BTreeMap, HashSet};

use crate::domain::Result;

/// Segment delimiter used by ontology concept paths
pub const PATH_DELIMITER: char = '\\';

/// A single ontology concept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyNode {
    /// Full concept path, root to leaf
    pub path: String,
    /// Sensitive either by direct marking or by ancestor propagation
    pub sensitive: bool,
    /// Sequential identifier submitted to the encryption/tagging phase;
    /// assigned to sensitive nodes only
    pub encrypt_id: Option<i64>,
    /// Opaque tag identifier returned by the tagging collaborator
    pub tag_id: Option<i64>,
    /// Encrypt IDs of the node's direct children (one extra path segment)
    pub children_encrypt_ids: Vec<i64>,
}

impl OntologyNode {
    /// Creates an unclassified node for a concept path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sensitive: false,
            encrypt_id: None,
            tag_id: None,
            children_encrypt_ids: Vec::new(),
        }
    }
}

/// Splits a concept path into its non-empty segments
fn segments(path: &str) -> Vec<&str> {
    path.split(PATH_DELIMITER)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Rejoins segments into canonical path form, with leading and trailing
/// delimiter. An empty segment list yields the empty string, not a bare
/// delimiter.
fn join_segments(segs: &[&str]) -> String {
    if segs.is_empty() {
        return String::new();
    }
    format!("{PATH_DELIMITER}{}{PATH_DELIMITER}", segs.join("\\"))
}

/// Truncates a concept path by whole segments.
///
/// With `from_start` set, the first `level` segments are removed and the
/// remaining suffix is returned (keeping its trailing delimiter). Otherwise
/// only the first `level` segments are kept and the rest discarded. Returns
/// the empty string when `level` meets or exceeds the number of segments.
///
/// Used to normalize path prefixes that differ between ontology sources
/// (e.g. stripping a source-root label) without touching node identity.
pub fn strip_by_level(path: &str, level: usize, from_start: bool) -> String {
    let segs = segments(path);
    if level >= segs.len() {
        return String::new();
    }
    if from_start {
        join_segments(&segs[level..])
    } else {
        join_segments(&segs[..level])
    }
}

/// The full set of ontology concepts for one classifier run
///
/// Keyed by concept path. A `BTreeMap` keeps iteration deterministic, which
/// matters for encrypt-ID assignment.
#[derive(Debug, Default)]
pub struct ConceptTable {
    nodes: BTreeMap<String, OntologyNode>,
}

impl ConceptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a set of concept paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for path in paths {
            table.insert(OntologyNode::new(path));
        }
        table
    }

    pub fn insert(&mut self, node: OntologyNode) {
        self.nodes.insert(node.path.clone(), node);
    }

    pub fn get(&self, path: &str) -> Option<&OntologyNode> {
        self.nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in path order
    pub fn iter(&self) -> impl Iterator<Item = &OntologyNode> {
        self.nodes.values()
    }

    /// Walks the ancestor chain of `path`, immediate parent first, and
    /// returns the first ancestor whose own sensitivity flag is set.
    ///
    /// Ancestors are obtained by truncating one segment at a time; the walk
    /// stops without a match once the root is passed. Ancestors absent from
    /// the table are skipped.
    pub fn has_sensitive_parents(&self, path: &str) -> Option<&str> {
        let segs = segments(path);
        if segs.is_empty() {
            return None;
        }
        for keep in (1..segs.len()).rev() {
            let ancestor = join_segments(&segs[..keep]);
            if let Some(node) = self.nodes.get(&ancestor) {
                if node.sensitive {
                    return Some(node.path.as_str());
                }
            }
        }
        None
    }

    /// Classifies every node: sensitive iff directly listed in
    /// `direct_sensitive` or descending from a directly listed path.
    ///
    /// Sensitive nodes receive sequential encrypt IDs in path order, starting
    /// at 0; IDs feed the batch-encryption and tagging phases.
    pub fn classify(&mut self, direct_sensitive: &HashSet<String>) {
        // Direct marks first so the ancestor walk sees them.
        for node in self.nodes.values_mut() {
            node.sensitive = direct_sensitive.contains(&node.path);
        }

        let inherited: Vec<String> = self
            .nodes
            .values()
            .filter(|n| !n.sensitive && self.has_sensitive_parents(&n.path).is_some())
            .map(|n| n.path.clone())
            .collect();
        for path in inherited {
            if let Some(node) = self.nodes.get_mut(&path) {
                node.sensitive = true;
            }
        }

        let mut next_id: i64 = 0;
        for node in self.nodes.values_mut() {
            if node.sensitive {
                node.encrypt_id = Some(next_id);
                next_id += 1;
            } else {
                node.encrypt_id = None;
            }
        }
    }

    /// For every node, collects the encrypt IDs of its direct children: nodes
    /// whose path has exactly one more segment and shares the full parent
    /// prefix. Descendants deeper than one level are not included.
    ///
    /// Quadratic over the node count; the classifier runs it once per run, on
    /// tables small enough that a sorted-prefix index is not worth carrying.
    pub fn update_children_encrypt_ids(&mut self) {
        let keyed: Vec<(String, Vec<String>, Option<i64>)> = self
            .nodes
            .values()
            .map(|n| {
                (
                    n.path.clone(),
                    segments(&n.path).iter().map(|s| s.to_string()).collect(),
                    n.encrypt_id,
                )
            })
            .collect();

        for (path, parent_segs, _) in &keyed {
            let mut children = Vec::new();
            for (_, child_segs, child_id) in &keyed {
                if child_segs.len() == parent_segs.len() + 1
                    && child_segs[..parent_segs.len()] == parent_segs[..]
                {
                    if let Some(id) = child_id {
                        children.push(*id);
                    }
                }
            }
            if let Some(node) = self.nodes.get_mut(path) {
                node.children_encrypt_ids = children;
            }
        }
    }

    /// Records the tag identifier the tagging collaborator assigned to a node
    pub fn set_tag_id(&mut self, path: &str, tag_id: i64) -> Result<()> {
        match self.nodes.get_mut(path) {
            Some(node) => {
                node.tag_id = Some(tag_id);
                Ok(())
            }
            None => Err(crate::domain::CloakError::MissingState(format!(
                "concept path {path:?} not present in the ontology table"
            ))),
        }
    }
}
