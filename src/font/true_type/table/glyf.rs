use crate::{
    data_structures::Matrix,
    geometry::{Path, Point},
};

#[derive(Debug, Clone, PartialEq)]
pub enum TrueTypeGlyph {
    /// A glyph with no description, such as a space
    Empty,
    Simple(SimpleGlyph),
    Compound(Vec<CompoundGlyphPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleGlyph {
    /// Index of the last point of each contour
    pub end_points_of_contours: Vec<u16>,
    pub points: Vec<GlyphPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPoint {
    pub x: i32,
    pub y: i32,
    pub on_curve: bool,
}

impl GlyphPoint {
    fn point(self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

pub struct OutlineFlag;

impl OutlineFlag {
    pub const ON_CURVE: u8 = 1 << 0;
    pub const X_SHORT_VECTOR: u8 = 1 << 1;
    pub const Y_SHORT_VECTOR: u8 = 1 << 2;
    pub const REPEAT: u8 = 1 << 3;
    pub const X_SAME_OR_POSITIVE: u8 = 1 << 4;
    pub const Y_SAME_OR_POSITIVE: u8 = 1 << 5;
}

pub struct CompoundGlyphComponentFlags;

impl CompoundGlyphComponentFlags {
    pub const ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
    pub const ARGS_ARE_XY_VALUES: u16 = 1 << 1;
    pub const WE_HAVE_A_SCALE: u16 = 1 << 3;
    pub const MORE_COMPONENTS: u16 = 1 << 5;
    pub const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 1 << 6;
    pub const WE_HAVE_A_TWO_BY_TWO: u16 = 1 << 7;
}

/// A component of a compound glyph, placed by a 2x2 transform and an offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundGlyphPart {
    pub glyph_index: u16,
    pub transform: Matrix,
}

impl SimpleGlyph {
    /// Builds the outline in font units
    ///
    /// Consecutive off-curve points imply an on-curve point midway between them
    pub fn outline(&self) -> Path {
        let mut path = Path::new();
        let mut start = 0;

        for &end in &self.end_points_of_contours {
            let end = usize::from(end);

            if let Some(contour) = self.points.get(start..=end) {
                add_contour(&mut path, contour);
            }

            start = end + 1;
        }

        path
    }
}

fn add_contour(path: &mut Path, contour: &[GlyphPoint]) {
    let (Some(&first), Some(&last)) = (contour.first(), contour.last()) else {
        return;
    };

    let (start, rest) = if first.on_curve {
        (first.point(), &contour[1..])
    } else if last.on_curve {
        (last.point(), &contour[..contour.len() - 1])
    } else {
        (first.point().midpoint(last.point()), contour)
    };

    path.move_to(start);

    let mut pending_control: Option<Point> = None;

    for p in rest {
        let point = p.point();

        match (p.on_curve, pending_control) {
            (true, Some(control)) => {
                path.quadratic_curve_to(control, point);
                pending_control = None;
            }
            (true, None) => path.line_to(point),
            (false, Some(control)) => {
                path.quadratic_curve_to(control, control.midpoint(point));
                pending_control = Some(point);
            }
            (false, None) => pending_control = Some(point),
        }
    }

    if let Some(control) = pending_control {
        path.quadratic_curve_to(control, start);
    }

    path.close_path();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::PathSegment;

    fn on(x: i32, y: i32) -> GlyphPoint {
        GlyphPoint { x, y, on_curve: true }
    }

    fn off(x: i32, y: i32) -> GlyphPoint {
        GlyphPoint {
            x,
            y,
            on_curve: false,
        }
    }

    #[test]
    fn straight_contour() {
        let glyph = SimpleGlyph {
            end_points_of_contours: vec![2],
            points: vec![on(0, 0), on(100, 0), on(100, 100)],
        };

        assert_eq!(
            glyph.outline().segments(),
            &[
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(100.0, 0.0)),
                PathSegment::LineTo(Point::new(100.0, 100.0)),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn consecutive_off_curve_points_imply_midpoints() {
        let glyph = SimpleGlyph {
            end_points_of_contours: vec![2],
            points: vec![on(0, 0), off(100, 0), off(100, 100)],
        };

        assert_eq!(
            glyph.outline().segments(),
            &[
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::QuadTo {
                    control: Point::new(100.0, 0.0),
                    end: Point::new(100.0, 50.0),
                },
                PathSegment::QuadTo {
                    control: Point::new(100.0, 100.0),
                    end: Point::new(0.0, 0.0),
                },
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn contour_of_only_off_curve_points_starts_at_midpoint() {
        let glyph = SimpleGlyph {
            end_points_of_contours: vec![3],
            points: vec![off(0, 0), off(100, 0), off(100, 100), off(0, 100)],
        };

        let path = glyph.outline();
        let segments = path.segments();

        assert_eq!(segments[0], PathSegment::MoveTo(Point::new(0.0, 50.0)));
        assert_eq!(segments.len(), 6);
        assert_eq!(
            segments[4],
            PathSegment::QuadTo {
                control: Point::new(0.0, 100.0),
                end: Point::new(0.0, 50.0),
            }
        );
    }

    #[test]
    fn starts_at_trailing_on_curve_point() {
        let glyph = SimpleGlyph {
            end_points_of_contours: vec![1, 4],
            points: vec![on(0, 0), on(5, 5), off(10, 0), on(20, 0), on(20, 20)],
        };

        let path = glyph.outline();

        assert_eq!(path.segments()[3], PathSegment::MoveTo(Point::new(20.0, 20.0)));
        assert_eq!(
            path.segments()[4],
            PathSegment::QuadTo {
                control: Point::new(10.0, 0.0),
                end: Point::new(20.0, 0.0),
            }
        );
    }
}
