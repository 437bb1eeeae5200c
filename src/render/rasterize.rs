use crate::{
    command::FillRule,
    data_structures::Matrix,
    geometry::{Path, Point, Polyline},
};

use super::pixmap::IntRect;

/// Maximum distance, in device pixels, between a curve and the chords replacing it
pub(crate) const FLATTEN_TOLERANCE: f32 = 0.2;

/// Scanlines sampled per pixel row when anti-aliasing. Horizontal coverage is exact
const SUBSAMPLES: usize = 4;

/// Per-pixel coverage in `0.0..=1.0` over a rectangle of device pixels, zero outside it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mask {
    rect: IntRect,
    coverage: Vec<f32>,
}

impl Mask {
    pub fn empty() -> Self {
        Self {
            rect: IntRect::default(),
            coverage: Vec::new(),
        }
    }

    fn zeroed(rect: IntRect) -> Self {
        Self {
            rect,
            coverage: vec![0.0; rect.width as usize * rect.height as usize],
        }
    }

    pub fn rect(&self) -> IntRect {
        self.rect
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        if !self.rect.contains(x, y) {
            return 0.0;
        }

        self.coverage[(y - self.rect.y) as usize * self.rect.width as usize + (x - self.rect.x) as usize]
    }

    /// Pixels with any coverage, as `(x, y, coverage)`
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        let width = self.rect.width.max(1) as usize;

        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0.0)
            .map(move |(i, &c)| {
                (
                    self.rect.x + (i % width) as u32,
                    self.rect.y + (i / width) as u32,
                    c,
                )
            })
    }

    /// Coverage of both masks multiplied
    pub fn intersect(&self, other: &Mask) -> Mask {
        let mut mask = Mask::zeroed(self.rect.intersect(&other.rect));

        for y in mask.rect.y..mask.rect.bottom() {
            for x in mask.rect.x..mask.rect.right() {
                let i = (y - mask.rect.y) as usize * mask.rect.width as usize + (x - mask.rect.x) as usize;
                mask.coverage[i] = self.get(x, y) * other.get(x, y);
            }
        }

        mask
    }
}

/// A polygon edge, stored top to bottom
#[derive(Debug, Clone, Copy)]
struct Edge {
    top: f32,
    bottom: f32,
    x_at_top: f32,
    slope: f32,
    winding: i32,
}

impl Edge {
    fn new(a: Point, b: Point) -> Option<Self> {
        if a.y == b.y || !(a.y.is_finite() && b.y.is_finite() && a.x.is_finite() && b.x.is_finite()) {
            return None;
        }

        let (start, end, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };

        Some(Self {
            top: start.y,
            bottom: end.y,
            x_at_top: start.x,
            slope: (end.x - start.x) / (end.y - start.y),
            winding,
        })
    }

    fn x_at(&self, y: f32) -> f32 {
        self.x_at_top + (y - self.top) * self.slope
    }
}

/// Edges of every subpath, each implicitly closed
fn edges(polylines: &[Polyline]) -> Vec<Edge> {
    let mut edges = Vec::new();

    for line in polylines {
        let points = &line.points;

        for pair in points.windows(2) {
            edges.extend(Edge::new(pair[0], pair[1]));
        }

        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            edges.extend(Edge::new(last, first));
        }
    }

    edges.sort_by(|a, b| a.top.total_cmp(&b.top));

    edges
}

/// The pixels of `bounds` a path covers once `transform` takes it to device space
pub(crate) fn rasterize(
    path: &Path,
    transform: Matrix,
    rule: FillRule,
    bounds: IntRect,
    anti_alias: bool,
) -> Mask {
    let device = path.transformed(transform);
    let bbox = device.bounding_box();

    if bbox.is_empty() || !(bbox.min.x.is_finite() && bbox.max.x.is_finite()) {
        return Mask::empty();
    }

    let x0 = bbox.min.x.floor().max(bounds.x as f32) as u32;
    let y0 = bbox.min.y.floor().max(bounds.y as f32) as u32;
    let x1 = (bbox.max.x.ceil().max(0.0) as u32).min(bounds.right());
    let y1 = (bbox.max.y.ceil().max(0.0) as u32).min(bounds.bottom());

    if x0 >= x1 || y0 >= y1 {
        return Mask::empty();
    }

    let mut mask = Mask::zeroed(IntRect::new(x0, y0, x1 - x0, y1 - y0));
    let edges = edges(&device.flatten(FLATTEN_TOLERANCE));

    let samples = if anti_alias { SUBSAMPLES } else { 1 };
    let weight = 1.0 / samples as f32;

    let mut next_edge = 0;
    let mut active: Vec<Edge> = Vec::new();
    let mut crossings: Vec<(f32, i32)> = Vec::new();

    for row in y0..y1 {
        let row_start = (row - y0) as usize * mask.rect.width as usize;
        let coverage = &mut mask.coverage[row_start..row_start + mask.rect.width as usize];

        for sample in 0..samples {
            let y = row as f32 + (sample as f32 + 0.5) * weight;

            while next_edge < edges.len() && edges[next_edge].top <= y {
                active.push(edges[next_edge]);
                next_edge += 1;
            }
            active.retain(|edge| edge.bottom > y);

            crossings.clear();
            crossings.extend(
                active
                    .iter()
                    .filter(|edge| edge.top <= y)
                    .map(|edge| (edge.x_at(y), edge.winding)),
            );
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;

            for i in 0..crossings.len().saturating_sub(1) {
                winding += crossings[i].1;

                let inside = match rule {
                    FillRule::NonZero => winding != 0,
                    FillRule::EvenOdd => winding % 2 != 0,
                };

                if inside {
                    let (start, end) = (crossings[i].0, crossings[i + 1].0);
                    add_span(coverage, start - x0 as f32, end - x0 as f32, weight, anti_alias);
                }
            }
        }
    }

    for c in &mut mask.coverage {
        *c = c.min(1.0);
    }

    mask
}

/// Adds a covered span of one sample line, in coordinates relative to the row's first pixel
fn add_span(row: &mut [f32], start: f32, end: f32, weight: f32, anti_alias: bool) {
    let width = row.len() as f32;
    let start = start.clamp(0.0, width);
    let end = end.clamp(0.0, width);

    if end <= start {
        return;
    }

    if anti_alias {
        let first = start.floor() as usize;
        let last = (end.ceil() as usize).min(row.len());

        for (px, c) in row.iter_mut().enumerate().take(last).skip(first) {
            let px = px as f32;
            let overlap = end.min(px + 1.0) - start.max(px);

            if overlap > 0.0 {
                *c += overlap * weight;
            }
        }
    } else {
        // pixels whose centres fall inside the span
        let first = (start - 0.5).ceil().max(0.0) as usize;
        let last = ((end - 0.5).ceil().max(0.0) as usize).min(row.len());

        for c in row.iter_mut().take(last).skip(first) {
            *c += weight;
        }
    }
}
