use crate::{
    command::{DashPattern, LineCap, LineJoin, StrokeAttrs},
    data_structures::Matrix,
    geometry::{Path, Point},
};

use super::rasterize::FLATTEN_TOLERANCE;

/// Control point distance for a quarter circle drawn as one cubic
const KAPPA: f32 = 0.552_284_8;

const EPSILON: f32 = 1e-6;

/// The area covered by stroking `path`, as polygons of the same orientation to be filled
/// with the nonzero rule
///
/// `scale` is the number of device pixels per unit of the path's space. Lines are never
/// thinner than one device pixel
pub(crate) fn stroke(path: &Path, attrs: &StrokeAttrs, scale: f32) -> Path {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let half_width = attrs.width.abs().max(1.0 / scale) / 2.0;

    let mut outline = Path::new();

    for line in path.flatten(FLATTEN_TOLERANCE / scale) {
        if attrs.dash.is_solid() {
            stroke_polyline(&line.points, line.closed, attrs, half_width, &mut outline);
            continue;
        }

        let mut points = line.points.clone();

        if line.closed {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }

        for dash in dash(&points, &attrs.dash) {
            stroke_polyline(&dash, false, attrs, half_width, &mut outline);
        }
    }

    outline
}

/// Splits an open polyline into the pieces drawn by a dash pattern
fn dash(points: &[Point], pattern: &DashPattern) -> Vec<Vec<Point>> {
    let array = &pattern.array;
    let total: f32 = array.iter().sum();

    if points.is_empty() || array.is_empty() || total <= 0.0 {
        return vec![points.to_vec()];
    }

    // odd length patterns alternate on and off across repetitions
    let period = if array.len() % 2 == 0 { total } else { total * 2.0 };

    let mut index = 0;
    let mut on = true;
    let mut remaining = array[0];
    let mut phase = pattern.phase.rem_euclid(period);

    while phase > 0.0 {
        if phase < remaining {
            remaining -= phase;
            break;
        }

        phase -= remaining;
        index = (index + 1) % array.len();
        on = !on;
        remaining = array[index];
    }

    let mut dashes = Vec::new();
    let mut current = if on { vec![points[0]] } else { Vec::new() };

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = a.euclidean_distance(b);

        if len <= EPSILON {
            continue;
        }

        let mut t = 0.0;

        loop {
            let step = remaining.min(len - t);
            t += step;
            remaining -= step;

            let p = a + (b - a) * t / len;

            if on {
                current.push(p);
            }

            if remaining > 0.0 {
                break;
            }

            if on {
                dashes.push(std::mem::take(&mut current));
            }

            on = !on;
            index = (index + 1) % array.len();
            remaining = array[index];

            if on {
                current.push(p);
            }
        }
    }

    if on && !current.is_empty() {
        dashes.push(current);
    }

    dashes
}

fn stroke_polyline(
    points: &[Point],
    closed: bool,
    attrs: &StrokeAttrs,
    half_width: f32,
    out: &mut Path,
) {
    let mut points = points.to_vec();
    points.dedup_by(|b, a| a.euclidean_distance(*b) <= EPSILON);

    if closed && points.len() > 1 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first.euclidean_distance(last) <= EPSILON {
                points.pop();
            }
        }
    }

    match points.len() {
        0 => return,
        1 => {
            // a zero length subpath only shows its caps
            let p = points[0];

            match attrs.cap {
                LineCap::Butt => {}
                LineCap::Round => circle(out, p, half_width),
                LineCap::ProjectingSquare => polygon(
                    out,
                    &[
                        Point::new(p.x - half_width, p.y - half_width),
                        Point::new(p.x + half_width, p.y - half_width),
                        Point::new(p.x + half_width, p.y + half_width),
                        Point::new(p.x - half_width, p.y + half_width),
                    ],
                ),
            }

            return;
        }
        _ => {}
    }

    let closed = closed && points.len() > 2;

    let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();

    if closed {
        segments.push((points[points.len() - 1], points[0]));
    }

    for &(p0, p1) in &segments {
        let n = normal(p0, p1) * half_width;
        polygon(out, &[p0 - n, p1 - n, p1 + n, p0 + n]);
    }

    for i in 1..segments.len() {
        join(out, segments[i - 1], segments[i], attrs, half_width);
    }

    if closed {
        join(out, segments[segments.len() - 1], segments[0], attrs, half_width);
        return;
    }

    let (start, second) = segments[0];
    let (before_end, end) = segments[segments.len() - 1];

    cap(out, start, direction(second, start), attrs.cap, half_width);
    cap(out, end, direction(before_end, end), attrs.cap, half_width);
}

fn direction(from: Point, to: Point) -> Point {
    (to - from).with_distance_from_origin(1.0)
}

/// Unit normal to the left of the direction of travel
fn normal(from: Point, to: Point) -> Point {
    direction(from, to).rotate_90()
}

/// `outward` points away from the line, along its direction
fn cap(out: &mut Path, at: Point, outward: Point, cap: LineCap, half_width: f32) {
    match cap {
        LineCap::Butt => {}
        LineCap::Round => circle(out, at, half_width),
        LineCap::ProjectingSquare => {
            let n = outward.rotate_90() * half_width;
            let tip = at + outward * half_width;

            polygon(out, &[at - n, tip - n, tip + n, at + n]);
        }
    }
}

fn join(
    out: &mut Path,
    incoming: (Point, Point),
    outgoing: (Point, Point),
    attrs: &StrokeAttrs,
    half_width: f32,
) {
    let vertex = incoming.1;
    let d_in = direction(incoming.0, incoming.1);
    let d_out = direction(outgoing.0, outgoing.1);

    let turn = d_in.cross(d_out);
    let cos_turn = d_in.dot(d_out);

    if turn.abs() <= EPSILON && cos_turn > 0.0 {
        return;
    }

    // the gap opens on the side away from the turn
    let side = if turn > 0.0 { -1.0 } else { 1.0 };
    let outer_in = d_in.rotate_90() * (half_width * side);
    let outer_out = d_out.rotate_90() * (half_width * side);

    match attrs.join {
        LineJoin::Round => circle(out, vertex, half_width),
        LineJoin::Bevel => polygon(out, &[vertex, vertex + outer_in, vertex + outer_out]),
        LineJoin::Miter => {
            // ratio of miter length to line width is 1 / sin(angle between segments / 2)
            let cos_half_turn = ((1.0 + cos_turn) / 2.0).max(0.0).sqrt();

            if cos_half_turn <= EPSILON || 1.0 / cos_half_turn > attrs.miter_limit {
                polygon(out, &[vertex, vertex + outer_in, vertex + outer_out]);
                return;
            }

            let tip = vertex + (outer_in + outer_out).with_distance_from_origin(half_width / cos_half_turn);

            polygon(out, &[vertex, vertex + outer_in, tip, vertex + outer_out]);
        }
    }
}

fn signed_area(points: &[Point]) -> f32 {
    let mut area = 0.0;

    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a.cross(b);
    }

    area / 2.0
}

/// Adds a closed polygon, counterclockwise
fn polygon(out: &mut Path, points: &[Point]) {
    let area = signed_area(points);

    if area.abs() <= EPSILON * EPSILON || !area.is_finite() {
        return;
    }

    let mut iter: Box<dyn Iterator<Item = &Point>> = if area > 0.0 {
        Box::new(points.iter())
    } else {
        Box::new(points.iter().rev())
    };

    if let Some(&first) = iter.next() {
        out.move_to(first);

        for &p in iter {
            out.line_to(p);
        }

        out.close_path();
    }
}

/// A counterclockwise circle from four cubics
fn circle(out: &mut Path, center: Point, radius: f32) {
    if radius <= 0.0 {
        return;
    }

    let k = radius * KAPPA;
    let Point { x, y } = center;

    out.move_to(Point::new(x + radius, y));
    out.cubic_curve_to(Point::new(x + radius, y + k), Point::new(x + k, y + radius), Point::new(x, y + radius));
    out.cubic_curve_to(Point::new(x - k, y + radius), Point::new(x - radius, y + k), Point::new(x - radius, y));
    out.cubic_curve_to(Point::new(x - radius, y - k), Point::new(x - k, y - radius), Point::new(x, y - radius));
    out.cubic_curve_to(Point::new(x + k, y - radius), Point::new(x + radius, y - k), Point::new(x + radius, y));
    out.close_path();
}

/// Device pixels per unit of the space `transform` maps from
pub(crate) fn scale_factor(transform: &Matrix) -> f32 {
    let expansion = transform.expansion();

    if expansion > 0.0 && expansion.is_finite() {
        return expansion;
    }

    // degenerate transforms keep the length of the surviving axis
    let axis = (transform.a * transform.a + transform.b * transform.b)
        .max(transform.c * transform.c + transform.d * transform.d)
        .sqrt();

    if axis > 0.0 && axis.is_finite() {
        axis
    } else {
        1.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        command::FillRule,
        render::{pixmap::IntRect, rasterize::rasterize},
    };

    const BOUNDS: IntRect = IntRect {
        x: 0,
        y: 0,
        width: 24,
        height: 24,
    };

    fn line(points: &[(f32, f32)]) -> Path {
        let mut path = Path::new();
        path.move_to(Point::new(points[0].0, points[0].1));

        for &(x, y) in &points[1..] {
            path.line_to(Point::new(x, y));
        }

        path
    }

    fn attrs(width: f32, cap: LineCap, join: LineJoin) -> StrokeAttrs {
        StrokeAttrs {
            width,
            cap,
            join,
            ..StrokeAttrs::default()
        }
    }

    fn coverage(outline: &Path, x: u32, y: u32) -> f32 {
        rasterize(outline, Matrix::identity(), FillRule::NonZero, BOUNDS, true).get(x, y)
    }

    #[test]
    fn caps_change_the_ends() {
        let path = line(&[(2.0, 5.0), (12.0, 5.0)]);

        let butt = stroke(&path, &attrs(2.0, LineCap::Butt, LineJoin::Miter), 1.0).bounding_box();
        assert_eq!(butt.min, Point::new(2.0, 4.0));
        assert_eq!(butt.max, Point::new(12.0, 6.0));

        let square = stroke(&path, &attrs(2.0, LineCap::ProjectingSquare, LineJoin::Miter), 1.0)
            .bounding_box();
        assert_eq!(square.min, Point::new(1.0, 4.0));
        assert_eq!(square.max, Point::new(13.0, 6.0));

        let round = stroke(
            &line(&[(4.0, 10.0), (14.0, 10.0)]),
            &attrs(8.0, LineCap::Round, LineJoin::Miter),
            1.0,
        );
        assert_eq!(round.bounding_box().min.x, 0.0);

        let edge = coverage(&round, 17, 7);
        assert!(edge > 0.0 && edge < 1.0);
        assert_eq!(coverage(&round, 19, 10), 0.0);
    }

    #[test]
    fn stroke_covers_the_band_around_the_line() {
        let outline = stroke(&line(&[(2.0, 5.0), (12.0, 5.0)]), &StrokeAttrs { width: 2.0, ..StrokeAttrs::default() }, 1.0);

        assert_eq!(coverage(&outline, 6, 4), 1.0);
        assert_eq!(coverage(&outline, 6, 5), 1.0);
        assert_eq!(coverage(&outline, 6, 6), 0.0);
        assert_eq!(coverage(&outline, 12, 5), 0.0);
    }

    #[test]
    fn miter_fills_the_outer_corner_and_bevel_cuts_it() {
        let path = line(&[(2.0, 10.0), (10.0, 10.0), (10.0, 18.0)]);

        let miter = stroke(&path, &attrs(4.0, LineCap::Butt, LineJoin::Miter), 1.0);
        let bevel = stroke(&path, &attrs(4.0, LineCap::Butt, LineJoin::Bevel), 1.0);

        assert!(coverage(&miter, 11, 8) > 0.99);
        assert_eq!(coverage(&bevel, 11, 8), 0.0);
        assert_eq!(coverage(&bevel, 10, 9), 1.0);
    }

    #[test]
    fn sharp_corners_fall_back_to_bevels_past_the_miter_limit() {
        let path = line(&[(2.0, 10.0), (12.0, 10.0), (2.0, 11.0)]);
        let outline = stroke(
            &path,
            &StrokeAttrs {
                width: 2.0,
                miter_limit: 2.0,
                ..StrokeAttrs::default()
            },
            1.0,
        );

        assert!(outline.bounding_box().max.x < 14.0);
    }

    #[test]
    fn closed_subpaths_leave_the_interior_unpainted() {
        let mut path = Path::new();
        path.rect(2.0, 2.0, 10.0, 10.0);

        let outline = stroke(&path, &StrokeAttrs { width: 2.0, ..StrokeAttrs::default() }, 1.0);

        assert_eq!(coverage(&outline, 7, 7), 0.0);
        assert_eq!(coverage(&outline, 2, 7), 1.0);
        assert!(coverage(&outline, 1, 1) > 0.99);
    }

    #[test]
    fn zero_width_is_one_device_pixel() {
        let path = line(&[(0.0, 0.0), (10.0, 0.0)]);

        let bbox = stroke(&path, &StrokeAttrs { width: 0.0, ..StrokeAttrs::default() }, 4.0).bounding_box();

        assert_eq!(bbox.height(), 0.25);
    }

    #[test]
    fn dashes_split_the_line() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];

        let dashes = dash(
            &points,
            &DashPattern {
                array: vec![2.0, 2.0],
                phase: 0.0,
            },
        );

        let spans: Vec<(f32, f32)> = dashes
            .iter()
            .map(|d| (d[0].x, d[d.len() - 1].x))
            .collect();

        assert_eq!(spans, vec![(0.0, 2.0), (4.0, 6.0), (8.0, 10.0)]);
    }

    #[test]
    fn dash_phase_starts_part_way_through_the_pattern() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];

        let dashes = dash(
            &points,
            &DashPattern {
                array: vec![2.0],
                phase: 1.0,
            },
        );

        let spans: Vec<(f32, f32)> = dashes
            .iter()
            .map(|d| (d[0].x, d[d.len() - 1].x))
            .collect();

        assert_eq!(spans, vec![(0.0, 1.0), (3.0, 5.0), (7.0, 9.0)]);
    }

    #[test]
    fn round_capped_dot() {
        let path = line(&[(5.0, 5.0), (5.0, 5.0)]);

        let dot = stroke(&path, &attrs(4.0, LineCap::Round, LineJoin::Miter), 1.0);
        let nothing = stroke(&path, &attrs(4.0, LineCap::Butt, LineJoin::Miter), 1.0);

        assert!(!dot.is_empty());
        assert!(nothing.is_empty());
    }
}
