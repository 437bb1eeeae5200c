use std::ops::{Mul, MulAssign};

use crate::{
    error::{PdfError, PdfResult},
    geometry::Point,
    objects::Object,
    FromObj, Resolve,
};

/// A 3x3 matrix
///
/// It is only possible to specify 6 out of the 9 possible values.
///
/// The full matrix is of the form:
///
/// [a b 0]
/// [c d 0]
/// [e f 1]
///
/// Points are row vectors, so `m1 * m2` applies `m1` first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Matrix> for Matrix {
    type Output = Matrix;

    fn mul(self, other: Matrix) -> Self::Output {
        Matrix::new(
            self.a * other.a + self.b * other.c,
            self.a * other.b + self.b * other.d,
            self.c * other.a + self.d * other.c,
            self.c * other.b + self.d * other.d,
            self.e * other.a + self.f * other.c + other.e,
            self.e * other.b + self.f * other.d + other.f,
        )
    }
}

impl Mul<Point> for Matrix {
    type Output = Point;

    fn mul(self, other: Point) -> Self::Output {
        let x = self.a * other.x + self.c * other.y + self.e;
        let y = self.b * other.x + self.d * other.y + self.f;

        Point::new(x, y)
    }
}

impl MulAssign<Matrix> for Point {
    fn mul_assign(&mut self, rhs: Matrix) {
        *self = rhs * *self;
    }
}

impl MulAssign<Matrix> for Matrix {
    fn mul_assign(&mut self, rhs: Matrix) {
        *self = *self * rhs;
    }
}

impl Matrix {
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn new_translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn new_scale(x: f32, y: f32) -> Self {
        Self::new(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    /// Rotate by `q` degrees
    pub fn new_rotation(q: f32) -> Self {
        let q = q.to_radians();

        Self::new(q.cos(), q.sin(), -q.sin(), q.cos(), 0.0, 0.0)
    }

    pub fn from_arr(arr: [f32; 6]) -> Self {
        let [a, b, c, d, e, f] = arr;
        Self { a, b, c, d, e, f }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// `None` for degenerate matrices, which collapse everything onto a line or point
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();

        if det.abs() < f32::EPSILON * 1e-3 || !det.is_finite() {
            return None;
        }

        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;

        Some(Matrix::new(
            a,
            b,
            c,
            d,
            -(self.e * a + self.f * c),
            -(self.e * b + self.f * d),
        ))
    }

    /// Applies only the linear part, for vectors such as glyph advances
    pub fn transform_vector(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y, self.b * p.x + self.d * p.y)
    }

    /// The factor by which lengths grow on average, used for line widths
    pub fn expansion(&self) -> f32 {
        self.determinant().abs().sqrt()
    }
}

impl FromObj for Matrix {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        let arr = resolver.assert_arr(obj)?;

        if arr.len() != 6 {
            return Err(PdfError::ArrayOfInvalidLength {
                expected: 6,
                found: arr.len(),
            });
        }

        let mut values = [0.0; 6];

        for (value, obj) in values.iter_mut().zip(arr) {
            *value = resolver.assert_number(obj)?;
        }

        Ok(Self::from_arr(values))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn left_operand_applies_first() {
        let scale = Matrix::new_scale(2.0, 3.0);
        let translate = Matrix::new_translation(10.0, 20.0);

        assert_close((scale * translate) * Point::new(1.0, 1.0), Point::new(12.0, 23.0));
        assert_close((translate * scale) * Point::new(1.0, 1.0), Point::new(22.0, 63.0));
    }

    #[test]
    fn inverse_round_trips() {
        let m = Matrix::new(2.0, 1.0, -1.0, 3.0, 5.0, 7.0);
        let inverse = m.inverse().unwrap();
        let p = Point::new(3.0, -4.0);

        assert_close(inverse * (m * p), p);
        assert!(Matrix::new_scale(0.0, 1.0).inverse().is_none());
    }
}
