//! AI generation boundary.
//!
//! The service itself lives outside the engine: the host sends
//! `{prompt}` somewhere and eventually hands back `{workflowJson}`. This
//! module parses that response into a graph and decides whether a response
//! may still be applied. Each request gets a ticket; only the most recent
//! ticket is honoured and nothing is honoured after teardown.

use nf_core::{DocumentError, GraphPayload, NodeRegistry, NodeSpec, WorkflowGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub workflow_json: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service failed: {0}")]
    Service(String),

    #[error("generated workflow is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("generated workflow has no `{0}` list")]
    MissingField(&'static str),

    #[error("generated workflow is inconsistent: {0}")]
    InvalidGraph(#[source] DocumentError),
}

impl From<DocumentError> for GenerationError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Json(e) => GenerationError::MalformedJson(e),
            DocumentError::MissingField(f) => GenerationError::MissingField(f),
            other => GenerationError::InvalidGraph(other),
        }
    }
}

/// Handle for one in-flight generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationTicket(pub u64);

/// Why a finished generation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// A newer request was started after this one.
    Superseded,
    /// The canvas was torn down.
    TornDown,
}

/// Tracks which ticket, if any, may still apply its result.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    epoch: u64,
    torn_down: bool,
}

impl GenerationGate {
    pub fn begin(&mut self) -> GenerationTicket {
        self.epoch += 1;
        GenerationTicket(self.epoch)
    }

    pub fn check(&self, ticket: GenerationTicket) -> Result<(), Discard> {
        if self.torn_down {
            Err(Discard::TornDown)
        } else if ticket.0 != self.epoch {
            Err(Discard::Superseded)
        } else {
            Ok(())
        }
    }

    /// Close the gate for good; every outstanding ticket becomes stale.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Latest ticket handed out, if any.
    pub fn latest(&self) -> Option<GenerationTicket> {
        (self.epoch > 0).then_some(GenerationTicket(self.epoch))
    }
}

/// Remove a surrounding Markdown code fence (```` ```json … ``` ````) if
/// present; otherwise return the trimmed text. Only a "```" at the start of
/// a line counts as a fence.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = fence_at_line_start(trimmed) else {
        return trimmed;
    };
    // skip an info string such as `json`
    let body_start = trimmed[open..].find('\n').map_or(trimmed.len(), |i| open + i + 1);
    let body = &trimmed[body_start..];
    match fence_at_line_start(body) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn fence_at_line_start(text: &str) -> Option<usize> {
    let mut pos = 0;
    while let Some(i) = text[pos..].find("```") {
        let at = pos + i;
        if at == 0 || text[..at].ends_with('\n') {
            return Some(at);
        }
        pos = at + 3;
    }
    None
}

/// Turn a service response into a ready-to-swap graph. Bare JSON is tried
/// first; fenced replies fall back to the fence body.
pub fn parse_response(response: &GenerationResponse) -> Result<WorkflowGraph, GenerationError> {
    let raw = response.workflow_json.trim();
    let payload = match GraphPayload::from_json(raw) {
        Ok(payload) => payload,
        Err(DocumentError::Json(_)) => GraphPayload::from_json(strip_code_fence(raw))?,
        Err(other) => return Err(other.into()),
    };
    Ok(payload.into_graph()?)
}

// ─── Node suggestions ────────────────────────────────────────────────────

/// Ask the service which node types would help with a task, given the
/// current graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// The current graph as `{nodes, edges}` JSON.
    pub current_workflow: String,
    pub task_requirements: String,
}

impl SuggestionRequest {
    pub fn for_graph(graph: &WorkflowGraph, task: &str) -> Result<Self, serde_json::Error> {
        let (nodes, edges) = graph.to_parts();
        Ok(Self {
            current_workflow: serde_json::to_string(&GraphPayload { nodes, edges })?,
            task_requirements: task.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggested_nodes: Vec<String>,
}

impl SuggestionResponse {
    /// Parse a reply, bare or fenced.
    pub fn from_reply(text: &str) -> Result<Self, GenerationError> {
        let raw = text.trim();
        serde_json::from_str(raw)
            .or_else(|_| serde_json::from_str(strip_code_fence(raw)))
            .map_err(GenerationError::MalformedJson)
    }
}

/// Keep the suggestions the registry knows, by type or by label
/// (case-insensitive), first mention wins.
pub fn filter_suggestions<'r>(
    response: &SuggestionResponse,
    registry: &'r dyn NodeRegistry,
) -> Vec<&'r NodeSpec> {
    let specs = registry.specs();
    let mut out: Vec<&NodeSpec> = Vec::new();
    for name in &response.suggested_nodes {
        let name = name.trim();
        let found = registry.spec(name).or_else(|| {
            specs
                .iter()
                .copied()
                .find(|s| s.label.eq_ignore_ascii_case(name))
        });
        match found {
            Some(spec) if !out.iter().any(|s| s.node_type == spec.node_type) => out.push(spec),
            Some(_) => {}
            None => log::debug!("suggested node `{name}` is not registered"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::id::NodeId;
    use pretty_assertions::assert_eq;

    fn response(json: &str) -> GenerationResponse {
        GenerationResponse {
            workflow_json: json.to_string(),
        }
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("Here you go:\n```\n[]\n```\nEnjoy"), "[]");
        assert_eq!(strip_code_fence("  {\"plain\":true} "), "{\"plain\":true}");
        assert_eq!(strip_code_fence("{\"code\": \"```js\"}"), "{\"code\": \"```js\"}");
    }

    #[test]
    fn bare_json_with_backticks_in_data_parses() {
        let graph = parse_response(&response(
            r#"{"nodes": [{"id": "c1", "type": "logic-code", "position": {"x": 0, "y": 0},
                           "data": {"code": "```js\nreturn 1\n```"}}],
                "edges": []}"#,
        ))
        .unwrap();
        let node = graph.node(NodeId::intern("c1")).unwrap();
        assert_eq!(node.data["code"], "```js\nreturn 1\n```");
    }

    #[test]
    fn fenced_reply_with_backticks_in_data_parses() {
        let reply = "Sure:\n```json\n{\"nodes\": [{\"id\": \"c2\", \"type\": \"logic-code\", \"position\": {\"x\": 0, \"y\": 0}, \"data\": {\"code\": \"```py\"}}], \"edges\": []}\n```";
        let graph = parse_response(&response(reply)).unwrap();
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn response_parses_into_graph() {
        let graph = parse_response(&response(
            r#"```json
{"nodes": [{"id": "g1", "type": "trigger-http", "position": {"x": 0, "y": 0}},
           {"id": "g2", "type": "action-log", "position": {"x": 300, "y": 0}}],
 "edges": [{"id": "ge", "source": "g1", "sourceHandle": "body", "target": "g2", "targetHandle": "data"}]}
```"#,
        ))
        .unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.live_edges().count(), 1);
    }

    #[test]
    fn bad_responses_are_typed() {
        assert!(matches!(
            parse_response(&response("definitely not json")),
            Err(GenerationError::MalformedJson(_))
        ));
        assert!(matches!(
            parse_response(&response(r#"{"nodes": []}"#)),
            Err(GenerationError::MissingField("edges"))
        ));
        let dup = r#"{"nodes": [
            {"id": "same", "type": "a", "position": {"x": 0, "y": 0}},
            {"id": "same", "type": "b", "position": {"x": 0, "y": 0}}], "edges": []}"#;
        assert!(matches!(
            parse_response(&response(dup)),
            Err(GenerationError::InvalidGraph(_))
        ));
    }

    #[test]
    fn suggestions_are_filtered_to_registry() {
        let registry = nf_core::StaticRegistry::builtin();
        let reply = "```json\n{\"suggestedNodes\": [\"action-log\", \"teleporter\", \"log to console\", \"Send Email\"]}\n```";
        let response = SuggestionResponse::from_reply(reply).unwrap();
        let types: Vec<&str> = filter_suggestions(&response, &registry)
            .into_iter()
            .map(|s| s.node_type.as_str())
            .collect();
        assert_eq!(types, vec!["action-log", "action-email"]);
        assert!(matches!(
            SuggestionResponse::from_reply("nope"),
            Err(GenerationError::MalformedJson(_))
        ));
    }

    #[test]
    fn suggestion_request_carries_graph() {
        let mut graph = WorkflowGraph::new();
        graph
            .insert_node(nf_core::Node::new(
                NodeId::intern("s1"),
                "action-log",
                nf_core::Point::new(0.0, 0.0),
            ))
            .unwrap();
        let request = SuggestionRequest::for_graph(&graph, "log errors").unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["taskRequirements"], "log errors");
        let payload = GraphPayload::from_json(&request.current_workflow).unwrap();
        assert_eq!(payload.nodes.len(), 1);
    }

    #[test]
    fn only_latest_ticket_passes() {
        let mut gate = GenerationGate::default();
        assert_eq!(gate.latest(), None);
        let first = gate.begin();
        let second = gate.begin();
        assert_eq!(gate.check(first), Err(Discard::Superseded));
        assert_eq!(gate.check(second), Ok(()));
        gate.tear_down();
        assert_eq!(gate.check(second), Err(Discard::TornDown));
    }

    #[test]
    fn response_json_is_camel_case() {
        let r: GenerationResponse = serde_json::from_str(r#"{"workflowJson": "{}"}"#).unwrap();
        assert_eq!(r.workflow_json, "{}");
    }
}
