use super::{quadratic_bezier::segment_count, BoundingBox, Point};

#[derive(Debug, Clone, Copy)]
pub struct CubicBezierCurve {
    pub start: Point,
    pub end: Point,
    pub first_control_point: Point,
    pub second_control_point: Point,
}

impl CubicBezierCurve {
    pub fn new(
        start: Point,
        end: Point,
        first_control_point: Point,
        second_control_point: Point,
    ) -> Self {
        Self {
            start,
            first_control_point,
            second_control_point,
            end,
        }
    }

    pub fn basis(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;

        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        self.start * mt3
            + 3.0 * self.first_control_point * mt2 * t
            + 3.0 * self.second_control_point * mt * t2
            + self.end * t3
    }

    /// Appends points along the curve, excluding `start`
    ///
    /// The chord error of a uniform subdivision into `n` pieces is bounded by `3 * dd / (4 n^2)`,
    /// where `dd` is the largest second difference of the control polygon
    pub fn flatten_into(&self, tolerance: f32, out: &mut Vec<Point>) {
        let dd = (self.start - 2.0 * self.first_control_point + self.second_control_point)
            .distance_from_origin()
            .max(
                (self.first_control_point - 2.0 * self.second_control_point + self.end)
                    .distance_from_origin(),
            );

        let n = segment_count(0.75 * dd / tolerance);

        for i in 1..n {
            out.push(self.basis(i as f32 / n as f32));
        }

        out.push(self.end);
    }

    /// The hull of the control points, which always contains the curve
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::from_points(self.start, self.end);

        bbox.add_point(self.first_control_point);
        bbox.add_point(self.second_control_point);

        bbox
    }
}
