use super::{BoundingBox, CubicBezierCurve, Point};

#[derive(Debug, Clone, Copy)]
pub struct QuadraticBezierCurve {
    pub start: Point,
    pub end: Point,
    pub control_point: Point,
}

#[derive(Debug, Clone, Copy)]
struct Parabola {
    x0: f32,
    x2: f32,
    scale: f32,
}

impl QuadraticBezierCurve {
    pub fn new(start: Point, end: Point, control_point: Point) -> Self {
        Self {
            start,
            control_point,
            end,
        }
    }

    pub fn into_cubic(self) -> CubicBezierCurve {
        let q1 = (1.0 / 3.0) * self.start + (2.0 / 3.0) * self.control_point;
        let q2 = (2.0 / 3.0) * self.control_point + (1.0 / 3.0) * self.end;

        CubicBezierCurve::new(self.start, self.end, q1, q2)
    }

    pub fn basis(&self, t: f32) -> Point {
        let t2 = t * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;

        self.start * mt2 + self.control_point * 2.0 * mt * t + self.end * t2
    }

    /// Appends points along the curve, excluding `start`, so that no point of the curve is
    /// further than `tolerance` from the polyline
    ///
    /// Algorithm adapted from <https://raphlinus.github.io/graphics/curves/2019/12/23/flatten-quadbez.html>
    pub fn flatten_into(&self, tolerance: f32, out: &mut Vec<Point>) {
        /// Compute an approximation to int (1 + 4x^2) ^ -0.25 dx
        fn approx_myint(x: f32) -> f32 {
            const D: f32 = 0.67;

            x / (1.0 - D + (D.powf(4.0) + 0.25 * x * x).powf(0.25))
        }

        /// Approximate the inverse of the function above
        fn approx_inv_myint(x: f32) -> f32 {
            const B: f32 = 0.39;

            x * (1.0 - B + (B * B + 0.25 * x * x).sqrt())
        }

        let params = match self.map_to_basic() {
            Some(params) => params,
            None => return self.flatten_uniform(tolerance, out),
        };

        let a0 = approx_myint(params.x0);
        let a2 = approx_myint(params.x2);

        let count = (0.5 * (a2 - a0).abs() * (params.scale / tolerance).sqrt()).ceil();

        if !count.is_finite() || count > MAX_SEGMENTS as f32 {
            return self.flatten_uniform(tolerance, out);
        }

        let n = count.max(1.0);

        let x0 = approx_inv_myint(a0);
        let x2 = approx_inv_myint(a2);

        for i in 1..(n as u32) {
            let x = approx_inv_myint(a0 + ((a2 - a0) * i as f32) / n);
            let t = (x - x0) / (x2 - x0);

            out.push(self.basis(t));
        }

        out.push(self.end);
    }

    /// Used for (nearly) collinear control points, where the parabola mapping degenerates
    fn flatten_uniform(&self, tolerance: f32, out: &mut Vec<Point>) {
        let dd = (self.start - 2.0 * self.control_point + self.end).distance_from_origin();
        let n = segment_count(dd / (4.0 * tolerance));

        for i in 1..n {
            out.push(self.basis(i as f32 / n as f32));
        }

        out.push(self.end);
    }

    fn map_to_basic(&self) -> Option<Parabola> {
        let dd = 2.0 * self.control_point - self.start - self.end;

        let u0 = (self.control_point.x - self.start.x) * dd.x
            + (self.control_point.y - self.start.y) * dd.y;
        let u2 =
            (self.end.x - self.control_point.x) * dd.x + (self.end.y - self.control_point.y) * dd.y;

        let cross = (self.end.x - self.start.x) * dd.y - (self.end.y - self.start.y) * dd.x;

        if cross.abs() < 1e-6 {
            return None;
        }

        let x0 = u0 / cross;
        let x2 = u2 / cross;

        let scale = cross.abs() / dd.x.hypot(dd.y) * (x2 - x0).abs();

        if !scale.is_finite() {
            return None;
        }

        Some(Parabola { x0, x2, scale })
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::from_points(self.start, self.end);

        // the curve lies within the hull of its control points; tighten with the extrema
        for (p0, p1, p2) in [
            (self.start.x, self.control_point.x, self.end.x),
            (self.start.y, self.control_point.y, self.end.y),
        ] {
            let denominator = p0 - 2.0 * p1 + p2;

            if denominator.abs() > f32::EPSILON {
                let t = (p0 - p1) / denominator;

                if t > 0.0 && t < 1.0 {
                    bbox.add_point(self.basis(t));
                }
            }
        }

        bbox
    }
}

pub(super) const MAX_SEGMENTS: u32 = 1000;

/// Number of chords for a uniform subdivision whose squared count is `n_squared`
pub(super) fn segment_count(n_squared: f32) -> u32 {
    let n = n_squared.sqrt().ceil();

    if n.is_finite() {
        (n as u32).clamp(1, MAX_SEGMENTS)
    } else {
        1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flattening_stays_within_tolerance() {
        let curve = QuadraticBezierCurve::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 100.0),
        );

        let mut points = vec![curve.start];
        curve.flatten_into(0.25, &mut points);

        assert_eq!(*points.last().unwrap(), curve.end);
        assert!(points.len() > 4);

        for i in 0..=100 {
            let p = curve.basis(i as f32 / 100.0);
            let nearest = points
                .windows(2)
                .map(|w| distance_to_segment(p, w[0], w[1]))
                .fold(f32::INFINITY, f32::min);

            assert!(nearest < 0.5, "{:?} is {} away", p, nearest);
        }
    }

    #[test]
    fn degenerate_curve_is_a_line() {
        let curve = QuadraticBezierCurve::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 0.0),
        );

        let mut points = Vec::new();
        curve.flatten_into(0.25, &mut points);

        assert_eq!(points, vec![Point::new(10.0, 0.0)]);
    }

    fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
        let ab = b - a;
        let len2 = ab.x * ab.x + ab.y * ab.y;

        if len2 == 0.0 {
            return p.euclidean_distance(a);
        }

        let t = (((p - a).x * ab.x + (p - a).y * ab.y) / len2).clamp(0.0, 1.0);

        p.euclidean_distance(a + ab * t)
    }
}
