use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Identity of one discovered page/application state.
///
/// Derived deterministically from `(url, state_hash)`, so revisits of the
/// same logical state collapse onto one node and two SPA states sharing a
/// URL stay distinct as long as their hashes differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn derive(url: &str, state_hash: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        // Separator keeps ("a", Some("b")) distinct from ("ab", None)
        hasher.update([0x1f]);
        if let Some(hash) = state_hash {
            hasher.update(hash.as_bytes());
        }
        let digest = hasher.finalize();
        let mut out = String::with_capacity(16);
        for byte in &digest[..8] {
            out.push_str(&format!("{:02x}", byte));
        }
        NodeId(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An outbound link captured on a page but not yet followed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub text: String,
    pub href: String,
    pub selector: String,
    /// Whether the anchor sits inside `nav`/`header`/`[role=navigation]`
    pub is_nav: bool,
}

/// One discovered page or application state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationNode {
    pub id: NodeId,
    pub url: String,
    pub state_hash: Option<String>,
    pub title: String,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub visit_count: usize,
    pub unexplored_links: Vec<LinkCandidate>,
    /// Hrefs already issued to the strategy for this node, explored or
    /// discarded. A processed href is never offered again.
    pub processed_links: HashSet<String>,
    pub is_leaf: bool,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl NavigationNode {
    pub fn new(
        url: impl Into<String>,
        state_hash: Option<String>,
        title: impl Into<String>,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Self {
        let url = url.into();
        let id = NodeId::derive(&url, state_hash.as_deref());
        Self {
            id,
            url,
            state_hash,
            title: title.into(),
            parent,
            depth,
            visit_count: 0,
            unexplored_links: Vec::new(),
            processed_links: HashSet::new(),
            is_leaf: false,
            metadata: HashMap::new(),
        }
    }

    pub fn record_visit(&mut self) {
        self.visit_count += 1;
    }

    /// Replace the unexplored set, dropping anything already processed.
    pub fn set_unexplored_links(&mut self, links: Vec<LinkCandidate>) {
        self.unexplored_links = links
            .into_iter()
            .filter(|l| !self.processed_links.contains(&l.href))
            .collect();
        self.is_leaf = self.unexplored_links.is_empty();
    }

    /// Mark an href as processed for this node. Returns false if the href
    /// was not in the unexplored set (already processed or never captured).
    pub fn mark_link_explored(&mut self, href: &str) -> bool {
        let before = self.unexplored_links.len();
        self.unexplored_links.retain(|l| l.href != href);
        let removed = self.unexplored_links.len() != before;
        self.processed_links.insert(href.to_string());
        if self.unexplored_links.is_empty() {
            self.is_leaf = true;
        }
        removed
    }

    pub fn has_unexplored_links(&self) -> bool {
        !self.unexplored_links.is_empty()
    }

    /// Path component of the node URL, "/" for the bare origin.
    pub fn path(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .map(|u| {
                let path = u.path().to_string();
                if path.is_empty() { "/".to_string() } else { path }
            })
            .unwrap_or_else(|| self.url.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Simulated click on an in-page element
    Click,
    /// Full navigation (address-bar style load)
    Load,
    /// History traversal (back/forward)
    History,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Click => "click",
            EdgeKind::Load => "load",
            EdgeKind::History => "history",
        }
    }
}

/// A directed edge between two observed states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Link text or selector that triggered the transition, if any
    pub via: Option<String>,
    pub kind: EdgeKind,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("graph already holds {0} nodes (configured ceiling)")]
    CapacityReached(usize),

    #[error("root already set to {0}")]
    RootAlreadySet(NodeId),
}

/// Directed graph of discovered states, deduplicated by state identity.
///
/// Nodes and edges are appended strictly in visitation order, so a partial
/// graph is always a valid prefix of the final one.
#[derive(Debug)]
pub struct NavigationGraph {
    structure: DiGraph<NodeId, EdgeKind>,
    node_map: HashMap<NodeId, NodeIndex>,
    nodes: HashMap<NodeId, NavigationNode>,
    order: Vec<NodeId>,
    edges: Vec<Edge>,
    root: Option<NodeId>,
    max_nodes: usize,
}

impl NavigationGraph {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            structure: DiGraph::new(),
            node_map: HashMap::new(),
            nodes: HashMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
            root: None,
            max_nodes,
        }
    }

    /// Insert a node iff its id is absent. Returns whether an insert
    /// happened; inserting a present id is a no-op, not an error.
    pub fn add_node(&mut self, node: NavigationNode) -> Result<bool, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Ok(false);
        }
        if self.nodes.len() >= self.max_nodes {
            return Err(GraphError::CapacityReached(self.max_nodes));
        }
        let idx = self.structure.add_node(node.id.clone());
        self.node_map.insert(node.id.clone(), idx);
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(true)
    }

    /// Append an edge. Both endpoints must already be present.
    pub fn add_edge(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        via: Option<String>,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        let from_idx = *self
            .node_map
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.clone()))?;
        let to_idx = *self
            .node_map
            .get(to)
            .ok_or_else(|| GraphError::UnknownNode(to.clone()))?;
        self.structure.add_edge(from_idx, to_idx, kind);
        self.edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            via,
            kind,
        });
        Ok(())
    }

    pub fn set_root(&mut self, id: &NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownNode(id.clone()));
        }
        if let Some(ref existing) = self.root
            && existing != id
        {
            return Err(GraphError::RootAlreadySet(existing.clone()));
        }
        self.root = Some(id.clone());
        Ok(())
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&NavigationNode> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: &NodeId) -> Option<&mut NavigationNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.max_nodes
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion (visitation) order.
    pub fn nodes(&self) -> impl Iterator<Item = &NavigationNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// First recorded edge from `from` to `to`, if any.
    pub fn direct_edge(&self, from: &NodeId, to: &NodeId) -> Option<&Edge> {
        let from_idx = *self.node_map.get(from)?;
        let to_idx = *self.node_map.get(to)?;
        self.structure.find_edge(from_idx, to_idx)?;
        self.edges.iter().find(|e| &e.from == from && &e.to == to)
    }

    /// Ids reachable from `id` over a single edge, in edge insertion order.
    pub fn children_of(&self, id: &NodeId) -> Vec<&NodeId> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        // petgraph yields the newest edge first
        let mut ordered: Vec<&NodeId> = self
            .structure
            .neighbors(idx)
            .map(|child| &self.structure[child])
            .collect();
        ordered.reverse();
        let mut seen = HashSet::new();
        ordered.retain(|child| seen.insert(*child));
        ordered
    }

    pub fn summary(&self) -> GraphSummary {
        let mut by_depth: BTreeMap<usize, usize> = BTreeMap::new();
        let mut by_edge_kind: BTreeMap<String, usize> = BTreeMap::new();
        let mut leaf_count = 0;
        let mut spa_states = 0;
        let mut max_depth = 0;

        for node in self.nodes() {
            *by_depth.entry(node.depth).or_insert(0) += 1;
            if node.is_leaf {
                leaf_count += 1;
            }
            if node.state_hash.is_some() {
                spa_states += 1;
            }
            max_depth = max_depth.max(node.depth);
        }
        for edge in &self.edges {
            *by_edge_kind.entry(edge.kind.as_str().to_string()).or_insert(0) += 1;
        }

        GraphSummary {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            max_depth,
            leaf_count,
            spa_states,
            by_depth,
            by_edge_kind,
        }
    }

    /// Render the graph as a Mermaid flowchart. Diagnostic output only.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        for node in self.nodes() {
            let label = if node.title.is_empty() {
                node.path()
            } else {
                node.title.clone()
            };
            // Mermaid chokes on quotes and brackets inside labels
            let label: String = label
                .chars()
                .map(|c| match c {
                    '"' | '[' | ']' | '(' | ')' | '{' | '}' => ' ',
                    c => c,
                })
                .collect();
            let shape = if Some(&node.id) == self.root.as_ref() {
                format!("    {}((\"{}\"))\n", node.id, label.trim())
            } else {
                format!("    {}[\"{}\"]\n", node.id, label.trim())
            };
            out.push_str(&shape);
        }
        for edge in &self.edges {
            let arrow = match edge.kind {
                EdgeKind::History => format!("    {} -.->|{}| {}\n", edge.from, edge.kind.as_str(), edge.to),
                kind => {
                    let label = edge
                        .via
                        .as_deref()
                        .filter(|v| !v.is_empty())
                        .unwrap_or(kind.as_str());
                    let label: String = label
                        .chars()
                        .filter(|c| !matches!(c, '"' | '|' | '[' | ']'))
                        .take(24)
                        .collect();
                    format!("    {} -->|{}| {}\n", edge.from, label.trim(), edge.to)
                }
            };
            out.push_str(&arrow);
        }
        out
    }
}

/// Counts by depth and edge kind, for reports and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_depth: usize,
    pub leaf_count: usize,
    pub spa_states: usize,
    pub by_depth: BTreeMap<usize, usize>,
    pub by_edge_kind: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(url: &str, hash: Option<&str>, depth: usize) -> NavigationNode {
        NavigationNode::new(url, hash.map(String::from), "t", None, depth)
    }

    #[test]
    fn test_node_id_deterministic() {
        let a = NodeId::derive("https://example.com/", Some("abc"));
        let b = NodeId::derive("https://example.com/", Some("abc"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_node_id_distinct_hash_distinct_id() {
        let a = NodeId::derive("https://example.com/app", Some("state-1"));
        let b = NodeId::derive("https://example.com/app", Some("state-2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_node_id_hash_absence_matters() {
        let a = NodeId::derive("https://example.com/", None);
        let b = NodeId::derive("https://example.com/", Some(""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut graph = NavigationGraph::new(10);
        assert!(graph.add_node(node("https://example.com/", None, 0)).unwrap());
        assert!(!graph.add_node(node("https://example.com/", None, 0)).unwrap());
        assert_eq!(graph.size(), 1);
    }

    #[test]
    fn test_add_node_ceiling() {
        let mut graph = NavigationGraph::new(1);
        graph.add_node(node("https://example.com/", None, 0)).unwrap();
        let err = graph.add_node(node("https://example.com/a", None, 1));
        assert!(matches!(err, Err(GraphError::CapacityReached(1))));
    }

    #[test]
    fn test_add_edge_requires_both_nodes() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let a_id = a.id.clone();
        graph.add_node(a).unwrap();
        let ghost = NodeId::derive("https://example.com/ghost", None);
        assert!(graph.add_edge(&a_id, &ghost, None, EdgeKind::Click).is_err());
    }

    #[test]
    fn test_edges_append_in_order() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let b = node("https://example.com/x", None, 1);
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        graph.add_node(a).unwrap();
        graph.add_node(b).unwrap();
        graph
            .add_edge(&a_id, &b_id, Some("x".into()), EdgeKind::Click)
            .unwrap();
        graph.add_edge(&b_id, &a_id, None, EdgeKind::History).unwrap();
        assert_eq!(graph.edges()[0].kind, EdgeKind::Click);
        assert_eq!(graph.edges()[1].kind, EdgeKind::History);
        assert!(graph.direct_edge(&a_id, &b_id).is_some());
        assert!(graph.direct_edge(&b_id, &a_id).is_some());
    }

    #[test]
    fn test_children_in_edge_order() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let b = node("https://example.com/x", None, 1);
        let c = node("https://example.com/y", None, 1);
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
        graph.add_node(a).unwrap();
        graph.add_node(b).unwrap();
        graph.add_node(c).unwrap();
        graph.add_edge(&a_id, &b_id, None, EdgeKind::Click).unwrap();
        graph.add_edge(&a_id, &c_id, None, EdgeKind::Click).unwrap();
        // Parallel edge to an already-known child must not duplicate it.
        graph.add_edge(&a_id, &b_id, None, EdgeKind::Load).unwrap();

        assert_eq!(graph.children_of(&a_id), vec![&b_id, &c_id]);
        assert!(graph.children_of(&b_id).is_empty());
        let ghost = NodeId::derive("https://example.com/ghost", None);
        assert!(graph.children_of(&ghost).is_empty());
        assert!(graph.direct_edge(&a_id, &ghost).is_none());
    }

    #[test]
    fn test_set_root_twice_fails() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let b = node("https://example.com/x", None, 1);
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        graph.add_node(a).unwrap();
        graph.add_node(b).unwrap();
        graph.set_root(&a_id).unwrap();
        assert!(graph.set_root(&a_id).is_ok());
        assert!(graph.set_root(&b_id).is_err());
    }

    #[test]
    fn test_mark_link_explored_removes_and_records() {
        let mut n = node("https://example.com/", None, 0);
        n.set_unexplored_links(vec![
            LinkCandidate {
                text: "Pricing".into(),
                href: "https://example.com/pricing".into(),
                selector: "a[href=\"/pricing\"]".into(),
                is_nav: true,
            },
            LinkCandidate {
                text: "Blog".into(),
                href: "https://example.com/blog".into(),
                selector: "a[href=\"/blog\"]".into(),
                is_nav: false,
            },
        ]);
        assert!(!n.is_leaf);
        assert!(n.mark_link_explored("https://example.com/pricing"));
        assert!(!n.mark_link_explored("https://example.com/pricing"));
        assert!(n.processed_links.contains("https://example.com/pricing"));
        assert!(n.mark_link_explored("https://example.com/blog"));
        assert!(n.is_leaf);
    }

    #[test]
    fn test_set_unexplored_drops_processed() {
        let mut n = node("https://example.com/", None, 0);
        n.processed_links.insert("https://example.com/old".into());
        n.set_unexplored_links(vec![LinkCandidate {
            text: "Old".into(),
            href: "https://example.com/old".into(),
            selector: "a".into(),
            is_nav: false,
        }]);
        assert!(n.unexplored_links.is_empty());
        assert!(n.is_leaf);
    }

    #[test]
    fn test_summary_counts() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let mut b = node("https://example.com/x", Some("h1"), 1);
        b.is_leaf = true;
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        graph.add_node(a).unwrap();
        graph.add_node(b).unwrap();
        graph.set_root(&a_id).unwrap();
        graph.add_edge(&a_id, &b_id, None, EdgeKind::Load).unwrap();

        let summary = graph.summary();
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.edge_count, 1);
        assert_eq!(summary.max_depth, 1);
        assert_eq!(summary.leaf_count, 1);
        assert_eq!(summary.spa_states, 1);
        assert_eq!(summary.by_depth.get(&0), Some(&1));
        assert_eq!(summary.by_edge_kind.get("load"), Some(&1));
    }

    #[test]
    fn test_mermaid_contains_nodes_and_edges() {
        let mut graph = NavigationGraph::new(10);
        let a = node("https://example.com/", None, 0);
        let b = node("https://example.com/pricing", None, 1);
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        graph.add_node(a).unwrap();
        graph.add_node(b).unwrap();
        graph.set_root(&a_id).unwrap();
        graph
            .add_edge(&a_id, &b_id, Some("Pricing".into()), EdgeKind::Click)
            .unwrap();

        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains(&format!("{}((", a_id)));
        assert!(mermaid.contains(&format!("{} -->|Pricing| {}", a_id, b_id)));
    }
}
