//! Edge geometry: cubic Bézier curves between port anchors.
//!
//! Control points leave the source horizontally to the right and enter the
//! target horizontally from the left, offset by half the horizontal span but
//! never less than a fixed minimum, so short or backwards edges still bow.

use kurbo::{BezPath, CubicBez, ParamCurveExtrema, ParamCurveNearest, PathEl};
use nf_core::{Bounds, Point};

/// Tolerance passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-3;

pub(crate) fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub(crate) fn from_kurbo(p: kurbo::Point) -> Point {
    Point::new(p.x, p.y)
}

/// Horizontal control-point offset for an edge spanning `source → target`.
pub fn control_offset(source: Point, target: Point, min_offset: f64) -> f64 {
    ((target.x - source.x).abs() / 2.0).max(min_offset)
}

/// A drawable connection curve in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePath {
    pub curve: CubicBez,
}

impl EdgePath {
    pub fn build(source: Point, target: Point, min_offset: f64) -> Self {
        let dx = control_offset(source, target, min_offset);
        Self {
            curve: CubicBez::new(
                to_kurbo(source),
                to_kurbo(Point::new(source.x + dx, source.y)),
                to_kurbo(Point::new(target.x - dx, target.y)),
                to_kurbo(target),
            ),
        }
    }

    pub fn source(&self) -> Point {
        from_kurbo(self.curve.p0)
    }

    pub fn target(&self) -> Point {
        from_kurbo(self.curve.p3)
    }

    /// The two interior control points.
    pub fn controls(&self) -> (Point, Point) {
        (from_kurbo(self.curve.p1), from_kurbo(self.curve.p2))
    }

    pub fn to_bez_path(&self) -> BezPath {
        BezPath::from_vec(vec![
            PathEl::MoveTo(self.curve.p0),
            PathEl::CurveTo(self.curve.p1, self.curve.p2, self.curve.p3),
        ])
    }

    /// SVG path data (`M … C …`).
    pub fn to_svg(&self) -> String {
        self.to_bez_path().to_svg()
    }

    /// Shortest distance from `p` to the curve.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.curve
            .nearest(to_kurbo(p), NEAREST_ACCURACY)
            .distance_sq
            .sqrt()
    }

    /// Tight bounding box of the curve (not just its control hull).
    pub fn bounds(&self) -> Bounds {
        let r = self.curve.bounding_box();
        Bounds::new(r.x0, r.y0, r.width(), r.height())
    }
}
