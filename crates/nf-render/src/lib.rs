pub mod edge_path;
pub mod frame;
pub mod hit;
pub mod paint;

pub use edge_path::EdgePath;
pub use frame::{EdgeCurve, Frame, LiveConnection, NodeBox, build_frame, viewport_transform};
pub use hit::{HitTarget, hit_test};
pub use paint::{Theme, paint_frame};
