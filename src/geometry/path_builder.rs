use super::{Path, PathSegment, Point};

/// Builds glyph outlines from the relative drawing operators of Type 2 charstrings
///
/// Every `moveto` implicitly closes the open contour, as does finishing the glyph
#[derive(Debug, Default)]
pub struct PathBuilder {
    path: Path,
    current_point: Point,
    open: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_point(&self) -> Point {
        self.current_point
    }

    pub fn relative_move_to(&mut self, dx: f32, dy: f32) {
        self.close_path();

        self.current_point = Point::new(self.current_point.x + dx, self.current_point.y + dy);
        self.path.move_to(self.current_point);
    }

    pub fn relative_line_to(&mut self, dx: f32, dy: f32) {
        self.begin();

        self.current_point = Point::new(self.current_point.x + dx, self.current_point.y + dy);
        self.path.line_to(self.current_point);
    }

    pub fn horizontal_line_to(&mut self, dx: f32) {
        self.relative_line_to(dx, 0.0);
    }

    pub fn vertical_line_to(&mut self, dy: f32) {
        self.relative_line_to(0.0, dy);
    }

    pub fn relative_relative_curve_to(
        &mut self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        dx3: f32,
        dy3: f32,
    ) {
        self.begin();

        let current_point = self.current_point;

        let first_control_point = Point::new(current_point.x + dx1, current_point.y + dy1);
        let second_control_point =
            Point::new(first_control_point.x + dx2, first_control_point.y + dy2);
        let end = Point::new(second_control_point.x + dx3, second_control_point.y + dy3);

        self.path
            .cubic_curve_to(first_control_point, second_control_point, end);
        self.current_point = end;
    }

    pub fn horizontal_vertical_curve_to(&mut self, dx1: f32, dx2: f32, dy2: f32, dy3: f32) {
        self.relative_relative_curve_to(dx1, 0.0, dx2, dy2, 0.0, dy3)
    }

    pub fn vertical_horizontal_curve_to(&mut self, dy1: f32, dx2: f32, dy2: f32, dx3: f32) {
        self.relative_relative_curve_to(0.0, dy1, dx2, dy2, dx3, 0.0)
    }

    pub fn close_path(&mut self) {
        if self.open {
            self.path.close_path();
            self.open = false;
        }
    }

    /// Appends an already built outline, as `seac` does for the accent
    pub fn append(&mut self, other: &Path) {
        self.close_path();
        self.path.extend(other);
    }

    pub fn finish(mut self) -> Path {
        self.close_path();
        self.path
    }

    fn begin(&mut self) {
        if !self.open {
            let needs_move = self.path.current_point().is_none()
                || self.path.segments().last() == Some(&PathSegment::Close);

            if needs_move {
                self.path.move_to(self.current_point);
            }
            self.open = true;
        }
    }
}
