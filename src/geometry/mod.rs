pub use bounding_box::BoundingBox;
pub use cubic_bezier::CubicBezierCurve;
pub use path::{Path, PathSegment, Polyline};
pub use path_builder::PathBuilder;
pub use point::Point;
pub use quadratic_bezier::QuadraticBezierCurve;

mod bounding_box;
mod cubic_bezier;
mod path;
mod path_builder;
mod point;
mod quadratic_bezier;
