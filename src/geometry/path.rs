use crate::data_structures::Matrix;

use super::{BoundingBox, CubicBezierCurve, Point, QuadraticBezierCurve};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, end: Point },
    CubicTo { c1: Point, c2: Point, end: Point },
    Close,
}

/// A sequence of subpaths, each begun by a `MoveTo`
///
/// Drawing operations made before any `MoveTo` start a subpath at the origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    current_point: Option<Point>,
    subpath_start: Point,
}

/// A flattened subpath
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, PathSegment::MoveTo(..) | PathSegment::Close))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn current_point(&self) -> Option<Point> {
        self.current_point
    }

    fn ensure_started(&mut self) -> Point {
        match self.current_point {
            Some(p) => p,
            None => {
                self.move_to(Point::origin());
                Point::origin()
            }
        }
    }

    pub fn move_to(&mut self, point: Point) {
        // consecutive moves collapse into one
        if let Some(PathSegment::MoveTo(last)) = self.segments.last_mut() {
            *last = point;
        } else {
            self.segments.push(PathSegment::MoveTo(point));
        }

        self.current_point = Some(point);
        self.subpath_start = point;
    }

    pub fn relative_move_to(&mut self, dx: f32, dy: f32) {
        let current = self.current_point.unwrap_or_else(Point::origin);

        self.move_to(Point::new(current.x + dx, current.y + dy));
    }

    pub fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.segments.push(PathSegment::LineTo(p));
        self.current_point = Some(p);
    }

    pub fn relative_line_to(&mut self, dx: f32, dy: f32) {
        let current = self.ensure_started();

        self.line_to(Point::new(current.x + dx, current.y + dy));
    }

    pub fn quadratic_curve_to(&mut self, control: Point, end: Point) {
        self.ensure_started();
        self.segments.push(PathSegment::QuadTo { control, end });
        self.current_point = Some(end);
    }

    pub fn cubic_curve_to(&mut self, first_control_point: Point, second_control_point: Point, end: Point) {
        self.ensure_started();
        self.segments.push(PathSegment::CubicTo {
            c1: first_control_point,
            c2: second_control_point,
            end,
        });
        self.current_point = Some(end);
    }

    /// Closing returns the current point to the start of the subpath
    pub fn close_path(&mut self) {
        if self.current_point.is_none() {
            return;
        }

        if !matches!(self.segments.last(), Some(PathSegment::Close)) {
            self.segments.push(PathSegment::Close);
        }

        self.current_point = Some(self.subpath_start);
    }

    /// A closed rectangle subpath, as drawn by the `re` operator
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(Point::new(x, y));
        self.line_to(Point::new(x + width, y));
        self.line_to(Point::new(x + width, y + height));
        self.line_to(Point::new(x, y + height));
        self.close_path();
    }

    pub fn extend(&mut self, other: &Path) {
        self.segments.extend_from_slice(&other.segments);

        if other.current_point.is_some() {
            self.current_point = other.current_point;
            self.subpath_start = other.subpath_start;
        }
    }

    pub fn apply_transform(&mut self, transformation: Matrix) {
        for segment in &mut self.segments {
            match segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => *p *= transformation,
                PathSegment::QuadTo { control, end } => {
                    *control *= transformation;
                    *end *= transformation;
                }
                PathSegment::CubicTo { c1, c2, end } => {
                    *c1 *= transformation;
                    *c2 *= transformation;
                    *end *= transformation;
                }
                PathSegment::Close => {}
            }
        }

        self.current_point = self.current_point.map(|p| transformation * p);
        self.subpath_start *= transformation;
    }

    pub fn transformed(&self, transformation: Matrix) -> Path {
        let mut path = self.clone();
        path.apply_transform(transformation);
        path
    }

    /// Conservative bounds, including curve control points
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => bbox.add_point(p),
                PathSegment::QuadTo { control, end } => {
                    bbox.add_point(control);
                    bbox.add_point(end);
                }
                PathSegment::CubicTo { c1, c2, end } => {
                    bbox.add_point(c1);
                    bbox.add_point(c2);
                    bbox.add_point(end);
                }
                PathSegment::Close => {}
            }
        }

        bbox
    }

    /// Replaces curves with chords no further than `tolerance` from them
    pub fn flatten(&self, tolerance: f32) -> Vec<Polyline> {
        let mut polylines = Vec::new();
        let mut current: Option<Polyline> = None;

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    if let Some(done) = current.take() {
                        polylines.push(done);
                    }

                    current = Some(Polyline {
                        points: vec![p],
                        closed: false,
                    });
                }
                PathSegment::LineTo(p) => {
                    if let Some(line) = &mut current {
                        line.points.push(p);
                    }
                }
                PathSegment::QuadTo { control, end } => {
                    if let Some(line) = &mut current {
                        let start = line.points[line.points.len() - 1];
                        QuadraticBezierCurve::new(start, end, control)
                            .flatten_into(tolerance, &mut line.points);
                    }
                }
                PathSegment::CubicTo { c1, c2, end } => {
                    if let Some(line) = &mut current {
                        let start = line.points[line.points.len() - 1];
                        CubicBezierCurve::new(start, end, c1, c2)
                            .flatten_into(tolerance, &mut line.points);
                    }
                }
                PathSegment::Close => {
                    if let Some(mut done) = current.take() {
                        let start = done.points[0];
                        done.closed = true;
                        polylines.push(done);

                        // drawing after a close continues from the subpath's start
                        current = Some(Polyline {
                            points: vec![start],
                            closed: false,
                        });
                    }
                }
            }
        }

        if let Some(done) = current {
            polylines.push(done);
        }

        polylines.retain(|line| line.closed || line.points.len() > 1);

        polylines
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rect_is_one_closed_polyline() {
        let mut path = Path::new();
        path.rect(0.0, 0.0, 10.0, 20.0);

        let polylines = path.flatten(0.25);

        assert_eq!(polylines.len(), 1);
        assert!(polylines[0].closed);
        assert_eq!(polylines[0].points.len(), 4);
        assert_eq!(path.current_point(), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn line_without_move_starts_at_origin() {
        let mut path = Path::new();
        path.line_to(Point::new(5.0, 5.0));

        assert_eq!(
            path.segments(),
            &[
                PathSegment::MoveTo(Point::origin()),
                PathSegment::LineTo(Point::new(5.0, 5.0))
            ]
        );
    }

    #[test]
    fn moves_alone_are_empty() {
        let mut path = Path::new();
        assert!(path.is_empty());

        path.move_to(Point::new(1.0, 1.0));
        path.move_to(Point::new(2.0, 2.0));

        assert!(path.is_empty());
        assert_eq!(path.segments().len(), 1);
        assert!(path.flatten(0.25).is_empty());
    }

    #[test]
    fn transform_moves_every_point() {
        let mut path = Path::new();
        path.move_to(Point::new(1.0, 1.0));
        path.cubic_curve_to(Point::new(2.0, 2.0), Point::new(3.0, 3.0), Point::new(4.0, 4.0));

        let bbox = path
            .transformed(Matrix::new_translation(10.0, 0.0))
            .bounding_box();

        assert_eq!(bbox.min, Point::new(11.0, 1.0));
        assert_eq!(bbox.max, Point::new(14.0, 4.0));
    }
}
