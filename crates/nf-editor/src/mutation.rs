//! Graph mutation API.
//!
//! `GraphStore` owns the authoritative graph as a copy-on-write snapshot.
//! Readers (frame builder, hit testing, the wasm bridge) take an
//! `Arc<WorkflowGraph>` and keep a consistent view no matter what happens
//! afterwards. Single mutations go through `Arc::make_mut`, which clones only
//! while a reader still holds the previous snapshot. `replace_graph` builds
//! the complete new graph first and swaps it in with one assignment, so no
//! reader can ever observe a half-replaced document.
//!
//! Stale ids are silent no-ops (logged); only edge creation and graph
//! replacement can fail.

use nf_core::id::{EdgeId, NodeId};
use nf_core::{
    Connection, DocumentError, Edge, EdgePolicy, Node, NodeData, Point, WorkflowGraph,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("edge would connect node `{0}` to itself")]
    SelfLoop(NodeId),

    #[error("an edge from {source_node}.{source_port} to {target_node}.{target_port} already exists")]
    DuplicateEdge {
        source_node: NodeId,
        source_port: String,
        target_node: NodeId,
        target_port: String,
    },

    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A graph change expressed as data. The interaction machine emits these;
/// `GraphStore::apply` executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddNode {
        node_type: String,
        position: Point,
    },
    MoveNode {
        id: NodeId,
        position: Point,
    },
    PatchNodeData {
        id: NodeId,
        patch: NodeData,
    },
    RemoveNode {
        id: NodeId,
    },
    /// Copy a node, with its data, at a fixed offset.
    DuplicateNode {
        id: NodeId,
    },
    AddEdge(Connection),
    RemoveEdge {
        id: EdgeId,
    },
    ReplaceGraph {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    },
    Clear,
}

/// Authoritative graph holder.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: Arc<WorkflowGraph>,
    policy: EdgePolicy,
    duplicate_offset: f64,
    revision: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(EdgePolicy::default(), 20.0)
    }
}

impl GraphStore {
    pub fn new(policy: EdgePolicy, duplicate_offset: f64) -> Self {
        Self {
            graph: Arc::new(WorkflowGraph::new()),
            policy,
            duplicate_offset,
            revision: 0,
        }
    }

    /// Current graph. Cheap; the returned snapshot never changes.
    pub fn snapshot(&self) -> Arc<WorkflowGraph> {
        Arc::clone(&self.graph)
    }

    /// Borrow the current graph without bumping the refcount.
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Incremented on every change that reached the graph.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: EdgePolicy) {
        self.policy = policy;
    }

    fn touch(&mut self) -> &mut WorkflowGraph {
        self.revision += 1;
        Arc::make_mut(&mut self.graph)
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Add a node of `node_type` at a canvas position with a fresh
    /// `<type>-<n>` id and empty data.
    pub fn add_node(&mut self, node_type: &str, position: Point) -> Node {
        let id = self.graph.unique_node_id(node_type);
        let node = Node::new(id, node_type, position);
        self.insert_fresh(node.clone());
        log::debug!("added node {id} at ({}, {})", position.x, position.y);
        node
    }

    fn insert_fresh(&mut self, node: Node) {
        // the id was just checked for uniqueness
        if let Err(err) = self.touch().insert_node(node) {
            log::warn!("node insert rejected: {err}");
        }
    }

    /// Set a node's position. Unknown ids are ignored.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> bool {
        if !self.graph.contains_node(id) {
            log::debug!("move ignored: no node {id}");
            return false;
        }
        if let Some(node) = self.touch().node_mut(id) {
            node.position = position;
        }
        true
    }

    /// Shallow-merge `patch` into a node's data. Unknown ids are ignored.
    pub fn patch_node_data(&mut self, id: NodeId, patch: NodeData) -> bool {
        if !self.graph.contains_node(id) {
            log::debug!("data patch ignored: no node {id}");
            return false;
        }
        if let Some(node) = self.touch().node_mut(id) {
            node.merge_data(patch);
        }
        true
    }

    /// Remove a node; edges that touch it are left dangling.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        if !self.graph.contains_node(id) {
            return None;
        }
        let removed = self.touch().remove_node(id);
        log::debug!("removed node {id}");
        removed
    }

    pub fn duplicate_node(&mut self, id: NodeId) -> Option<Node> {
        let original = self.graph.node(id)?.clone();
        let offset = Point::new(self.duplicate_offset, self.duplicate_offset);
        let copy = Node {
            id: self.graph.unique_node_id(&original.node_type),
            position: original.position + offset,
            ..original
        };
        self.insert_fresh(copy.clone());
        log::debug!("duplicated {id} as {}", copy.id);
        Some(copy)
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Connect two ports. Port names and data types are not validated.
    pub fn add_edge(&mut self, conn: Connection) -> Result<Edge, MutationError> {
        for id in [conn.source, conn.target] {
            if !self.graph.contains_node(id) {
                return Err(MutationError::UnknownNode(id));
            }
        }
        if conn.is_self_loop() && !self.policy.allow_self_loops {
            log::warn!("rejected self loop on {}", conn.source);
            return Err(MutationError::SelfLoop(conn.source));
        }
        if !self.policy.allow_duplicate_edges && self.graph.has_connection(&conn) {
            log::warn!("rejected duplicate edge {}.{}", conn.source, conn.source_handle);
            return Err(MutationError::DuplicateEdge {
                source_node: conn.source,
                source_port: conn.source_handle,
                target_node: conn.target,
                target_port: conn.target_handle,
            });
        }

        let edge = conn.into_edge(self.graph.unique_edge_id());
        self.touch().push_edge(edge.clone());
        log::debug!(
            "connected {}.{} → {}.{}",
            edge.source,
            edge.source_handle,
            edge.target,
            edge.target_handle
        );
        Ok(edge)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        self.graph.edge(id)?;
        self.touch().remove_edge(id)
    }

    // ─── Whole graph ─────────────────────────────────────────────────────

    /// Atomically replace all nodes and edges.
    ///
    /// The new graph is fully built before the swap; on error the current
    /// graph is untouched.
    pub fn replace_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<(), MutationError> {
        let next = WorkflowGraph::from_parts(nodes, edges)?;
        self.replace_with(next);
        Ok(())
    }

    /// Swap in an already-built graph.
    pub fn replace_with(&mut self, graph: WorkflowGraph) {
        log::debug!(
            "replacing graph: {} node(s), {} edge(s)",
            graph.node_count(),
            graph.edges.len()
        );
        self.graph = Arc::new(graph);
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.replace_with(WorkflowGraph::new());
    }

    /// Execute a mutation. Returns whether the graph changed.
    pub fn apply(&mut self, mutation: GraphMutation) -> Result<bool, MutationError> {
        match mutation {
            GraphMutation::AddNode {
                node_type,
                position,
            } => {
                self.add_node(&node_type, position);
                Ok(true)
            }
            GraphMutation::MoveNode { id, position } => Ok(self.move_node(id, position)),
            GraphMutation::PatchNodeData { id, patch } => Ok(self.patch_node_data(id, patch)),
            GraphMutation::RemoveNode { id } => Ok(self.remove_node(id).is_some()),
            GraphMutation::DuplicateNode { id } => Ok(self.duplicate_node(id).is_some()),
            GraphMutation::AddEdge(conn) => self.add_edge(conn).map(|_| true),
            GraphMutation::RemoveEdge { id } => Ok(self.remove_edge(id).is_some()),
            GraphMutation::ReplaceGraph { nodes, edges } => {
                self.replace_graph(nodes, edges).map(|_| true)
            }
            GraphMutation::Clear => {
                self.clear();
                Ok(true)
            }
        }
    }
}
