pub mod config;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod ports;
pub mod registry;
pub mod store;
pub mod viewport;

pub use config::{CanvasConfig, EdgePolicy, NotificationConfig, PortLayout, ZoomLimits};
pub use document::{ExportBundle, GraphPayload, SCHEMA_VERSION, Workflow, WorkflowRecord};
pub use error::DocumentError;
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use ports::{PortAnchor, PortDirection, resolve_port};
pub use registry::{NodeCategory, NodeRegistry, NodeSpec, PortSpec, StaticRegistry, WidgetKind};
pub use store::{MemoryStore, WorkflowStore};
pub use viewport::{GridSpec, Viewport};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
