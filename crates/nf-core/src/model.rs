//! Workflow graph data model.
//!
//! A workflow is a set of typed, positioned nodes plus a list of edges that
//! connect a named output port of one node to a named input port of another.
//! Nodes live in a `StableDiGraph` arena so that indices survive removals and
//! removal itself is O(1). Edges are *weak* references: they store node ids,
//! not arena indices, and simply become dangling when an endpoint is removed.
//! Dangling edges are skipped by `live_edges` and never treated as errors.

use crate::error::DocumentError;
use crate::id::{EdgeId, NodeId};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::{Add, Sub};

/// Arbitrary per-type configuration attached to a node.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

// ─── Geometry ────────────────────────────────────────────────────────────

/// A 2D point. Used for both screen space and canvas space; the viewport
/// decides which one a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height, e.g. of the on-screen viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle (top-left anchor).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// AABB overlap test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow by `pad` on every side.
    pub fn inflate(&self, pad: f64) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Union of all rectangles, or `None` for an empty slice.
    pub fn union_all(items: &[Bounds]) -> Option<Bounds> {
        let (first, rest) = items.split_first()?;
        Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
    }
}

// ─── Nodes & edges ───────────────────────────────────────────────────────

/// A positioned, typed unit of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Foreign key into the node registry.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas-space top-left corner.
    pub position: Point,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, node_type: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            position,
            data: NodeData::new(),
        }
    }

    /// Shallow-merge `patch` into this node's data: top-level keys in the
    /// patch overwrite, everything else is kept.
    pub fn merge_data(&mut self, patch: NodeData) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
    }
}

/// A directed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
}

/// Endpoint description for a new edge, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
}

impl Connection {
    pub fn new(
        source: NodeId,
        source_handle: impl Into<String>,
        target: NodeId,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_handle: source_handle.into(),
            target,
            target_handle: target_handle.into(),
        }
    }

    pub fn into_edge(self, id: EdgeId) -> Edge {
        Edge {
            id,
            source: self.source,
            source_handle: self.source_handle,
            target: self.target,
            target_handle: self.target_handle,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

/// What the inspector is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

impl Selection {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Selection::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<EdgeId> {
        match self {
            Selection::Edge(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────

/// The in-memory graph document: node arena plus weak edge list.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    /// Node arena. Arena edges are unused; connections live in `edges`.
    pub graph: StableDiGraph<Node, ()>,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Connections between named ports, in insertion order.
    pub edges: Vec<Edge>,

    /// Paint order, back to front. Arena slots are reused after removal,
    /// so slot order alone does not track insertion.
    z_order: Vec<NodeIndex>,
}

impl WorkflowGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from plain node and edge lists.
    ///
    /// Fails on duplicate node or edge ids. Edges that reference missing
    /// nodes are kept (they are dangling, not invalid).
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, DocumentError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node)?;
        }
        let mut seen = HashSet::new();
        for edge in edges {
            if !seen.insert(edge.id) {
                return Err(DocumentError::DuplicateEdge(edge.id));
            }
            graph.edges.push(edge);
        }
        let dangling = graph.edges.len() - graph.live_edges().count();
        if dangling > 0 {
            log::debug!("graph built with {dangling} dangling edge(s)");
        }
        Ok(graph)
    }

    /// Clone out plain node (paint order) and edge lists.
    pub fn to_parts(&self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes().cloned().collect(), self.edges.clone())
    }

    /// Add a node. Fails if a node with the same id already exists.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeIndex, DocumentError> {
        if self.id_index.contains_key(&node.id) {
            return Err(DocumentError::DuplicateNode(node.id));
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.z_order.push(idx);
        Ok(idx)
    }

    /// Remove a node, keeping the `id_index` synchronized. Edges touching
    /// it are left in place and become dangling.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.id_index.remove(&id)?;
        self.z_order.retain(|i| *i != idx);
        self.graph.remove_node(idx)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Nodes in paint order (back to front): the most recently inserted
    /// node is on top.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.z_order.iter().map(move |idx| &self.graph[*idx])
    }

    pub fn node_count(&self) -> usize {
        self.id_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_index.is_empty() && self.edges.is_empty()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    /// Edges whose endpoints both exist.
    pub fn live_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(move |e| self.contains_node(e.source) && self.contains_node(e.target))
    }

    /// Whether an edge already connects exactly these two ports.
    pub fn has_connection(&self, conn: &Connection) -> bool {
        self.edges.iter().any(|e| {
            e.source == conn.source
                && e.target == conn.target
                && e.source_handle == conn.source_handle
                && e.target_handle == conn.target_handle
        })
    }

    /// A fresh `<prefix>-<n>` node id not present in this graph.
    pub fn unique_node_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.contains_node(id) {
                return id;
            }
        }
    }

    /// A fresh edge id not present in this graph.
    pub fn unique_edge_id(&self) -> EdgeId {
        loop {
            let id = EdgeId::fresh();
            if self.edge(id).is_none() {
                return id;
            }
        }
    }
}
