//! Serialized documents: workflows, stored records and export bundles.
//!
//! These are the JSON shapes the UI shell and the persistence layer exchange.
//! Field names are camelCase; timestamps are RFC 3339 via `chrono`.

use crate::error::DocumentError;
use crate::model::{Edge, Node, WorkflowGraph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version written into export bundles. Bundles with a higher version are
/// rejected on import.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Draft,
    Verifying,
    Verified,
    Failed,
}

/// A named graph document as persisted and exchanged with the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            verification_status: None,
        }
    }

    /// Snapshot a live graph into a document.
    pub fn from_graph(id: impl Into<String>, name: impl Into<String>, graph: &WorkflowGraph) -> Self {
        let (nodes, edges) = graph.to_parts();
        Self {
            nodes,
            edges,
            ..Self::new(id, name)
        }
    }

    pub fn to_graph(&self) -> Result<WorkflowGraph, DocumentError> {
        WorkflowGraph::from_parts(self.nodes.clone(), self.edges.clone())
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A bare `{nodes, edges}` payload, e.g. a generated graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphPayload {
    /// Parse a payload, requiring both `nodes` and `edges` to be present.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        for field in ["nodes", "edges"] {
            if value.get(field).is_none_or(|v| v.is_null()) {
                return Err(DocumentError::MissingField(field));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_graph(self) -> Result<WorkflowGraph, DocumentError> {
        WorkflowGraph::from_parts(self.nodes, self.edges)
    }
}

// ─── Stored records ──────────────────────────────────────────────────────

/// A workflow as held by a store, stamped with creation and update times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reusable starting point offered in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub workflow: Workflow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
    Running,
}

/// One recorded run of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─── Export bundle ───────────────────────────────────────────────────────

/// Everything a store holds, as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default)]
    pub workflows: Vec<WorkflowRecord>,
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub exported_at: DateTime<Utc>,
    #[serde(default = "current_version")]
    pub version: u32,
}

fn current_version() -> u32 {
    SCHEMA_VERSION
}

impl ExportBundle {
    /// Parse a bundle, rejecting versions newer than [`SCHEMA_VERSION`].
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let bundle: ExportBundle = serde_json::from_str(json)?;
        if bundle.version > SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: bundle.version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(bundle)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use pretty_assertions::assert_eq;

    #[test]
    fn workflow_accepts_minimal_json() {
        let wf = Workflow::from_json(r#"{"id": "wf-1", "name": "Empty"}"#).unwrap();
        assert!(wf.nodes.is_empty());
        assert_eq!(wf.verification_status, None);
        let json = wf.to_json().unwrap();
        assert!(!json.contains("verificationStatus"));
    }

    #[test]
    fn verification_status_is_lowercase() {
        let mut wf = Workflow::new("wf-2", "Checked");
        wf.verification_status = Some(VerificationStatus::Verified);
        let value = serde_json::to_value(&wf).unwrap();
        assert_eq!(value["verificationStatus"], "verified");
    }

    #[test]
    fn payload_requires_nodes_and_edges() {
        let err = GraphPayload::from_json(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingField("edges")));

        let err = GraphPayload::from_json(r#"{"nodes": null, "edges": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingField("nodes")));

        let err = GraphPayload::from_json("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn payload_builds_graph() {
        let payload = GraphPayload::from_json(
            r#"{"nodes": [{"id": "n1", "type": "action-log", "position": {"x": 1, "y": 2}}],
                "edges": []}"#,
        )
        .unwrap();
        let graph = payload.into_graph().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node(NodeId::intern("n1")).unwrap().data.is_empty());
    }

    #[test]
    fn record_flattens_workflow() {
        let record = WorkflowRecord {
            workflow: Workflow::new("wf-3", "Flat"),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "wf-3");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("workflow").is_none());
    }

    #[test]
    fn newer_bundle_version_is_rejected() {
        let err = ExportBundle::from_json(r#"{"version": 2}"#).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnsupportedVersion { found: 2, supported: 1 }
        ));
        let ok = ExportBundle::from_json(r#"{"workflows": []}"#).unwrap();
        assert_eq!(ok.version, SCHEMA_VERSION);
    }
}
