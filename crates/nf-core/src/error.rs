//! Error types for document loading and graph construction.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("duplicate node id `{0}`")]
    DuplicateNode(NodeId),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(EdgeId),

    #[error("zoom limits must be positive, finite and ordered (got min {min}, max {max})")]
    InvalidZoomLimits { min: f64, max: f64 },

    #[error("export bundle version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
