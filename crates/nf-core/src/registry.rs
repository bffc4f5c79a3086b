//! Node registry: node-type identifier → display and port specification.
//!
//! The canvas only needs width and port lists from a spec; label, category,
//! description and icon are carried for the palette and inspector. The icon
//! is an opaque display token that the UI layer resolves to a glyph.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Palette grouping of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    Trigger,
    Action,
    Logic,
    Output,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 4] = [
        NodeCategory::Trigger,
        NodeCategory::Action,
        NodeCategory::Logic,
        NodeCategory::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCategory::Trigger => "trigger",
            NodeCategory::Action => "action",
            NodeCategory::Logic => "logic",
            NodeCategory::Output => "output",
        }
    }
}

/// Inline configuration control rendered inside an input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    String,
    Number,
    Boolean,
    Textarea,
}

/// One named port of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub name: String,
    #[serde(rename = "type", default = "any_type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

fn any_type() -> String {
    "any".to_string()
}

impl PortSpec {
    /// A connection-only port.
    pub fn plain(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            label: None,
            widget: None,
            placeholder: None,
        }
    }

    /// A port whose row embeds a configuration widget.
    pub fn widget(name: &str, data_type: &str, widget: WidgetKind) -> Self {
        Self {
            widget: Some(widget),
            ..Self::plain(name, data_type)
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn has_widget(&self) -> bool {
        self.widget.is_some()
    }

    /// Label shown next to the handle; falls back to the port name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered list of ports; most node types have four or fewer per side.
pub type PortList = SmallVec<[PortSpec; 4]>;

/// Display and port specification for one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub category: NodeCategory,
    #[serde(default)]
    pub description: String,
    /// Opaque display token, e.g. `"zap"`.
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    pub inputs: PortList,
    #[serde(default)]
    pub outputs: PortList,
}

impl NodeSpec {
    pub fn new(node_type: &str, label: &str, category: NodeCategory, icon: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            label: label.to_string(),
            category,
            description: String::new(),
            icon: icon.to_string(),
            width: None,
            inputs: PortList::new(),
            outputs: PortList::new(),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    /// Case-insensitive match against label, description and category.
    /// `query` must already be lowercase.
    fn matches(&self, query: &str) -> bool {
        self.label.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
            || self.category.as_str().contains(query)
    }
}

/// Lookup from node-type identifier to its spec.
pub trait NodeRegistry {
    fn spec(&self, node_type: &str) -> Option<&NodeSpec>;

    /// All specs, in palette order.
    fn specs(&self) -> Vec<&NodeSpec>;
}

/// Registry backed by a fixed list of tagged records.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    specs: Vec<NodeSpec>,
    by_type: HashMap<String, usize>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec. A later spec with the same type replaces the earlier one.
    pub fn register(&mut self, spec: NodeSpec) {
        if let Some(&i) = self.by_type.get(&spec.node_type) {
            self.specs[i] = spec;
        } else {
            self.by_type.insert(spec.node_type.clone(), self.specs.len());
            self.specs.push(spec);
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Palette search. An empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<&NodeSpec> {
        let query = query.trim().to_lowercase();
        self.specs
            .iter()
            .filter(|s| query.is_empty() || s.matches(&query))
            .collect()
    }

    /// Search results grouped by category, in category order. Categories
    /// with no matches are omitted.
    pub fn grouped(&self, query: &str) -> Vec<(NodeCategory, Vec<&NodeSpec>)> {
        let hits = self.search(query);
        NodeCategory::ALL
            .iter()
            .filter_map(|cat| {
                let group: Vec<&NodeSpec> =
                    hits.iter().copied().filter(|s| s.category == *cat).collect();
                (!group.is_empty()).then_some((*cat, group))
            })
            .collect()
    }

    /// The node types shipped with the editor.
    pub fn builtin() -> Self {
        use NodeCategory::*;
        use WidgetKind::{Boolean, Number, Textarea};

        let mut r = Self::new();
        r.register(
            NodeSpec::new("trigger-http", "HTTP Request", Trigger, "zap")
                .describe("Triggers workflow on an incoming HTTP request")
                .input(PortSpec::widget("path", "string", WidgetKind::String).with_placeholder("/hook"))
                .output(PortSpec::plain("body", "object"))
                .output(PortSpec::plain("headers", "object")),
        );
        r.register(
            NodeSpec::new("trigger-webhook", "Webhook", Trigger, "server")
                .describe("Listen for webhook events")
                .input(PortSpec::widget("event", "string", WidgetKind::String))
                .output(PortSpec::plain("payload", "object")),
        );
        r.register(
            NodeSpec::new("action-log", "Log to Console", Action, "message-square")
                .describe("Logs the input data to the console")
                .input(PortSpec::plain("data", "any"))
                .input(PortSpec::widget("prefix", "string", WidgetKind::String))
                .output(PortSpec::plain("data", "any")),
        );
        r.register(
            NodeSpec::new("action-function", "Function", Action, "code")
                .describe("Runs a JavaScript function")
                .width(300.0)
                .input(PortSpec::plain("input", "any"))
                .input(PortSpec::widget("code", "string", Textarea).with_label("Code"))
                .output(PortSpec::plain("result", "any")),
        );
        r.register(
            NodeSpec::new("action-email", "Send Email", Action, "mail")
                .describe("Sends an email using a configured SMTP service")
                .input(PortSpec::widget("to", "string", WidgetKind::String).with_placeholder("name@example.com"))
                .input(PortSpec::widget("subject", "string", WidgetKind::String))
                .input(PortSpec::plain("body", "string"))
                .output(PortSpec::plain("status", "object")),
        );
        r.register(
            NodeSpec::new("action-db", "Database Query", Action, "database")
                .describe("Executes a query against a connected database")
                .input(PortSpec::widget("query", "string", Textarea).with_label("SQL"))
                .input(PortSpec::plain("params", "object"))
                .output(PortSpec::plain("rows", "array")),
        );
        r.register(
            NodeSpec::new("logic-router", "Router", Logic, "git-branch")
                .describe("Routes data to different branches based on conditions")
                .input(PortSpec::plain("data", "any"))
                .input(PortSpec::widget("rules", "string", Textarea))
                .output(PortSpec::plain("route_a", "any"))
                .output(PortSpec::plain("route_b", "any"))
                .output(PortSpec::plain("fallback", "any")),
        );
        r.register(
            NodeSpec::new("logic-if", "If/Else Branch", Logic, "git-branch")
                .describe("Splits the workflow based on a true/false condition")
                .input(PortSpec::plain("data", "any"))
                .input(PortSpec::widget("condition", "string", WidgetKind::String))
                .output(PortSpec::plain("true", "any"))
                .output(PortSpec::plain("false", "any")),
        );
        r.register(
            NodeSpec::new("logic-filter", "Filter Data", Logic, "filter")
                .describe("Filters an array of items based on a condition")
                .input(PortSpec::plain("items", "array"))
                .input(PortSpec::widget("condition", "string", WidgetKind::String))
                .output(PortSpec::plain("kept", "array"))
                .output(PortSpec::plain("dropped", "array")),
        );
        r.register(
            NodeSpec::new("logic-code", "Run Code", Logic, "code")
                .describe("Executes a custom JavaScript snippet")
                .width(300.0)
                .input(PortSpec::plain("input", "any"))
                .input(PortSpec::widget("code", "string", Textarea))
                .output(PortSpec::plain("output", "any")),
        );
        r.register(
            NodeSpec::new("output-response", "HTTP Response", Output, "message-square")
                .describe("Sends a response back to the initial HTTP trigger")
                .input(PortSpec::plain("body", "any"))
                .input(PortSpec::widget("status", "number", Number).with_placeholder("200")),
        );
        r.register(
            NodeSpec::new("output-file", "Save File", Output, "file-text")
                .describe("Saves data to a file")
                .input(PortSpec::plain("data", "any"))
                .input(PortSpec::widget("path", "string", WidgetKind::String))
                .input(PortSpec::widget("overwrite", "boolean", Boolean)),
        );
        r
    }
}

impl NodeRegistry for StaticRegistry {
    fn spec(&self, node_type: &str) -> Option<&NodeSpec> {
        self.by_type.get(node_type).map(|&i| &self.specs[i])
    }

    fn specs(&self) -> Vec<&NodeSpec> {
        self.specs.iter().collect()
    }
}
