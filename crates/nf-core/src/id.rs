use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node and edge ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic suffix source shared by every generated id.
static COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Identifier of a node in a workflow graph.
/// Internally a 4-byte `Spur` index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

/// Identifier of an edge in a workflow graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate an id of the form `<prefix>-<n>`, e.g. `action-log-7`.
    ///
    /// The suffix is process-wide monotonic; callers that need uniqueness
    /// within a particular graph still check for collisions with ids that
    /// were loaded from a document.
    pub fn with_prefix(prefix: &str) -> Self {
        Self::intern(&format!("{prefix}-{}", next_suffix()))
    }
}

impl EdgeId {
    pub fn intern(s: &str) -> Self {
        EdgeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate an id of the form `edge-<n>`.
    pub fn fresh() -> Self {
        Self::intern(&format!("edge-{}", next_suffix()))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.as_str())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EdgeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("trigger-http");
        let b = NodeId::intern("trigger-http");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "trigger-http");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::with_prefix("action-log");
        let b = NodeId::with_prefix("action-log");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("action-log-"));

        let e1 = EdgeId::fresh();
        let e2 = EdgeId::fresh();
        assert_ne!(e1, e2);
        assert!(e1.as_str().starts_with("edge-"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = NodeId::intern("n1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"n1\"");
        let back: EdgeId = serde_json::from_str("\"e1-2\"").unwrap();
        assert_eq!(back.as_str(), "e1-2");
    }
}
