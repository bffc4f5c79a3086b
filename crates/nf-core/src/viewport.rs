//! Viewport model: the pan/zoom transform between screen and canvas space.
//!
//! `screen = canvas * zoom + origin`, where `origin = (x, y)` is the
//! screen-space position of the canvas origin.

use crate::config::ZoomLimits;
use crate::model::{Bounds, Point, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    #[serde(skip)]
    pub limits: ZoomLimits,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            limits: ZoomLimits::default(),
        }
    }
}

/// Background grid placement for the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// On-screen distance between grid lines.
    pub step: f64,
    /// Screen-space offset of the grid pattern.
    pub offset: Point,
}

impl Viewport {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.zoom + self.x, canvas.y * self.zoom + self.y)
    }

    /// Move the canvas by a raw screen-space delta (not scaled by zoom).
    pub fn pan_by(&mut self, delta: Point) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Multiply zoom by `factor` (clamped), keeping the canvas point under
    /// `screen` fixed on screen.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = self.limits.clamp(self.zoom * factor);
        let ratio = new_zoom / self.zoom;
        self.x = screen.x - (screen.x - self.x) * ratio;
        self.y = screen.y - (screen.y - self.y) * ratio;
        self.zoom = new_zoom;
    }

    /// Zoom around the centre of a viewport of the given size.
    pub fn zoom_by(&mut self, factor: f64, size: Size) {
        self.zoom_at(Point::new(size.width / 2.0, size.height / 2.0), factor);
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.zoom = 1.0;
    }

    /// Zoom as a rounded percentage for the zoom indicator.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Fit every rectangle in `nodes` (plus `padding` on each side) inside a
    /// viewport of `size`, centred, never zooming in past 1.0.
    ///
    /// Returns `false` without touching the viewport when there is nothing to
    /// fit or the viewport has no area.
    pub fn fit_to_content(&mut self, nodes: &[Bounds], size: Size, padding: f64) -> bool {
        let Some(content) = Bounds::union_all(nodes) else {
            return false;
        };
        if size.width <= 0.0 || size.height <= 0.0 {
            return false;
        }
        let area = content.inflate(padding);
        let zoom_x = size.width / area.width;
        let zoom_y = size.height / area.height;
        let zoom = self.limits.clamp(zoom_x.min(zoom_y).min(1.0));

        self.zoom = zoom;
        self.x = (size.width - area.width * zoom) / 2.0 - area.x * zoom;
        self.y = (size.height - area.height * zoom) / 2.0 - area.y * zoom;
        log::debug!(
            "fit {} node(s): zoom={:.3} origin=({:.1}, {:.1})",
            nodes.len(),
            self.zoom,
            self.x,
            self.y
        );
        true
    }

    /// Canvas-space rectangle currently visible in a viewport of `size`.
    pub fn visible_canvas_rect(&self, size: Size) -> Bounds {
        let tl = self.screen_to_canvas(Point::ZERO);
        Bounds::new(tl.x, tl.y, size.width / self.zoom, size.height / self.zoom)
    }

    /// Map a canvas-space rectangle to screen space.
    pub fn bounds_to_screen(&self, b: &Bounds) -> Bounds {
        let tl = self.canvas_to_screen(Point::new(b.x, b.y));
        Bounds::new(tl.x, tl.y, b.width * self.zoom, b.height * self.zoom)
    }

    pub fn grid(&self, spacing: f64) -> GridSpec {
        GridSpec {
            step: spacing * self.zoom,
            offset: self.origin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn sample_viewport() -> Viewport {
        Viewport {
            x: 37.5,
            y: -120.0,
            zoom: 1.75,
            ..Viewport::default()
        }
    }

    #[test]
    fn round_trip_screen_canvas() {
        let vp = sample_viewport();
        for p in [
            Point::new(0.0, 0.0),
            Point::new(640.0, 480.0),
            Point::new(-13.25, 9000.5),
        ] {
            assert!(close(vp.canvas_to_screen(vp.screen_to_canvas(p)), p));
        }
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let cursor = Point::new(412.0, 233.0);
        for factor in [1.1, 0.9, 2.5, 0.3] {
            let mut vp = sample_viewport();
            let before = vp.screen_to_canvas(cursor);
            vp.zoom_at(cursor, factor);
            let after = vp.screen_to_canvas(cursor);
            assert!(close(before, after), "factor {factor}: {before:?} vs {after:?}");
        }
    }

    #[test]
    fn zoom_in_then_out_restores_viewport() {
        let mut vp = sample_viewport();
        let original = vp;
        let cursor = Point::new(100.0, 50.0);
        vp.zoom_at(cursor, 1.25);
        vp.zoom_at(cursor, 1.0 / 1.25);
        assert!((vp.zoom - original.zoom).abs() < EPS);
        assert!((vp.x - original.x).abs() < 1e-6);
        assert!((vp.y - original.y).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        let p = Point::new(10.0, 10.0);
        for _ in 0..20 {
            vp.zoom_at(p, 10.0);
            assert!(vp.zoom <= 4.0);
        }
        assert_eq!(vp.zoom, 4.0);
        for _ in 0..20 {
            vp.zoom_at(p, 0.01);
            assert!(vp.zoom >= 0.1);
        }
        assert_eq!(vp.zoom, 0.1);
    }

    #[test]
    fn clamped_zoom_still_keeps_cursor_fixed() {
        let mut vp = Viewport::default();
        let cursor = Point::new(300.0, 200.0);
        let before = vp.screen_to_canvas(cursor);
        vp.zoom_at(cursor, 100.0);
        assert!(close(before, vp.screen_to_canvas(cursor)));
    }

    #[test]
    fn pan_uses_raw_screen_delta() {
        let mut vp = sample_viewport();
        vp.pan_by(Point::new(10.0, -5.0));
        assert_eq!(vp.origin(), Point::new(47.5, -125.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut vp = sample_viewport();
        vp.reset();
        assert_eq!((vp.x, vp.y, vp.zoom), (0.0, 0.0, 1.0));
    }

    #[test]
    fn fit_to_content_two_nodes() {
        let nodes = [
            Bounds::new(0.0, 0.0, 200.0, 150.0),
            Bounds::new(500.0, 500.0, 200.0, 150.0),
        ];
        let size = Size::new(1000.0, 800.0);
        let mut vp = Viewport::default();
        assert!(vp.fit_to_content(&nodes, size, 100.0));
        assert!(vp.zoom <= 1.0);

        let screen = Bounds::new(0.0, 0.0, size.width, size.height);
        for b in &nodes {
            let s = vp.bounds_to_screen(b);
            assert!(s.x >= 0.0 && s.y >= 0.0, "{s:?} starts off screen");
            assert!(s.right() <= screen.right() && s.bottom() <= screen.bottom(), "{s:?} overflows");
        }
    }

    #[test]
    fn fit_to_content_never_zooms_in() {
        let nodes = [Bounds::new(10.0, 10.0, 50.0, 50.0)];
        let mut vp = Viewport::default();
        vp.fit_to_content(&nodes, Size::new(2000.0, 2000.0), 10.0);
        assert_eq!(vp.zoom, 1.0);
        // centred: box centre maps to viewport centre
        let c = vp.canvas_to_screen(Point::new(35.0, 35.0));
        assert!(close(c, Point::new(1000.0, 1000.0)));
    }

    #[test]
    fn fit_to_content_without_nodes_is_noop() {
        let mut vp = sample_viewport();
        let before = vp;
        assert!(!vp.fit_to_content(&[], Size::new(800.0, 600.0), 100.0));
        assert_eq!(vp, before);
    }

    #[test]
    fn visible_rect_and_grid() {
        let vp = Viewport {
            x: -100.0,
            y: -50.0,
            zoom: 2.0,
            ..Viewport::default()
        };
        let r = vp.visible_canvas_rect(Size::new(800.0, 600.0));
        assert_eq!(r, Bounds::new(50.0, 25.0, 400.0, 300.0));
        let g = vp.grid(20.0);
        assert_eq!(g.step, 40.0);
        assert_eq!(g.offset, Point::new(-100.0, -50.0));
        assert_eq!(vp.zoom_percent(), 200);
    }
}
