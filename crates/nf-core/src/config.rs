//! Canvas configuration.
//!
//! Every field has a default matching the stock editor, so a host only
//! needs to supply the values it wants to change:
//!
//! ```
//! let config = nf_core::CanvasConfig::from_json(r#"{ "zoom": { "max": 2.0 } }"#).unwrap();
//! assert_eq!(config.zoom.max, 2.0);
//! assert_eq!(config.zoom.min, 0.1);
//! ```

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

// ─── Zoom ────────────────────────────────────────────────────────────────

/// Inclusive zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 4.0 }
    }
}

impl ZoomLimits {
    /// Clamp `zoom` into range. Never panics, even on limits that failed
    /// [`ZoomLimits::validate`]; `max` wins when the pair is inverted.
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.max(self.min).min(self.max)
    }

    /// Both bounds finite and positive, `min <= max`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let ok = self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.min <= self.max;
        if ok {
            Ok(())
        } else {
            Err(DocumentError::InvalidZoomLimits {
                min: self.min,
                max: self.max,
            })
        }
    }
}

// ─── Port layout ─────────────────────────────────────────────────────────

/// Row metrics used to place port handles inside a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortLayout {
    /// Offset of the first port row below the node's top edge.
    pub header_offset: f64,
    /// Row height of a connection-only port.
    pub plain_row_height: f64,
    /// Row height of a port that embeds a configuration widget.
    pub widget_row_height: f64,
    /// Hit radius around a port anchor, in canvas units.
    pub handle_radius: f64,
    /// Horizontal inset of an embedded widget from the node's left edge.
    pub widget_inset_left: f64,
    /// Horizontal inset of an embedded widget from the node's right edge.
    pub widget_inset_right: f64,
    /// Space below the last port row.
    pub footer: f64,
    /// Width used when a spec does not declare one.
    pub default_node_width: f64,
    /// Nodes are never drawn shorter than this.
    pub min_node_height: f64,
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            header_offset: 40.0,
            plain_row_height: 24.0,
            widget_row_height: 40.0,
            handle_radius: 8.0,
            widget_inset_left: 16.0,
            widget_inset_right: 8.0,
            footer: 8.0,
            default_node_width: 250.0,
            min_node_height: 100.0,
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Which edges the graph mutation layer accepts.
///
/// Both checks default to permissive; hosts that want stricter graphs opt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePolicy {
    /// Accept edges whose source and target are the same node.
    pub allow_self_loops: bool,
    /// Accept a second edge between the exact same pair of ports.
    pub allow_duplicate_edges: bool,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        Self {
            allow_self_loops: true,
            allow_duplicate_edges: true,
        }
    }
}

// ─── Notifications ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Maximum visible notifications; the oldest is evicted first.
    pub capacity: usize,
    pub default_duration_ms: u64,
    /// Requested durations are raised to at least this.
    pub min_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            default_duration_ms: 2500,
            min_duration_ms: 800,
        }
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// Top-level configuration for one canvas instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub zoom: ZoomLimits,
    /// Wheel factor when scrolling up (zoom in).
    pub wheel_zoom_in: f64,
    /// Wheel factor when scrolling down (zoom out).
    pub wheel_zoom_out: f64,
    /// Toolbar / keyboard zoom-in factor.
    pub step_zoom_in: f64,
    /// Toolbar / keyboard zoom-out factor.
    pub step_zoom_out: f64,
    /// Padding around content for fit-to-content, in canvas units.
    pub fit_padding: f64,
    /// Background grid spacing, in canvas units.
    pub grid_spacing: f64,
    pub ports: PortLayout,
    /// Lower bound for the horizontal control-point offset of edge curves.
    pub edge_min_control_offset: f64,
    /// Pointer distance (canvas units) within which an edge curve counts as hit.
    pub edge_hit_tolerance: f64,
    /// Offset applied to a duplicated node.
    pub duplicate_offset: f64,
    pub edges: EdgePolicy,
    pub notifications: NotificationConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            step_zoom_in: 1.2,
            step_zoom_out: 0.8,
            fit_padding: 100.0,
            grid_spacing: 20.0,
            ports: PortLayout::default(),
            edge_min_control_offset: 50.0,
            edge_hit_tolerance: 6.0,
            duplicate_offset: 20.0,
            edges: EdgePolicy::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON configuration. Zoom limits are
    /// checked after defaults are filled in.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let config: Self = serde_json::from_str(json)?;
        config.zoom.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_is_default() {
        assert_eq!(CanvasConfig::from_json("{}").unwrap(), CanvasConfig::default());
    }

    #[test]
    fn nested_partial_override() {
        let config = CanvasConfig::from_json(
            r#"{ "ports": { "widget_row_height": 48 }, "edges": { "allow_self_loops": false } }"#,
        )
        .unwrap();
        assert_eq!(config.ports.widget_row_height, 48.0);
        assert_eq!(config.ports.plain_row_height, 24.0);
        assert!(!config.edges.allow_self_loops);
        assert!(config.edges.allow_duplicate_edges);
    }

    #[test]
    fn zoom_clamp() {
        let z = ZoomLimits::default();
        assert_eq!(z.clamp(10.0), 4.0);
        assert_eq!(z.clamp(0.001), 0.1);
        assert_eq!(z.clamp(1.5), 1.5);
    }

    #[test]
    fn inverted_zoom_limits_are_rejected() {
        // min above the default max of 4.0
        assert!(matches!(
            CanvasConfig::from_json(r#"{ "zoom": { "min": 5.0 } }"#),
            Err(DocumentError::InvalidZoomLimits { min, max }) if min == 5.0 && max == 4.0
        ));
        assert!(CanvasConfig::from_json(r#"{ "zoom": { "min": 0 } }"#).is_err());
        assert!(CanvasConfig::from_json(r#"{ "zoom": { "min": -1, "max": 2 } }"#).is_err());
        assert!(CanvasConfig::from_json(r#"{ "zoom": { "min": 0.5, "max": 0.5 } }"#).is_ok());
    }

    #[test]
    fn clamp_survives_inverted_limits() {
        let z = ZoomLimits { min: 5.0, max: 4.0 };
        assert_eq!(z.clamp(1.0), 4.0);
        assert_eq!(z.clamp(10.0), 4.0);
    }
}
