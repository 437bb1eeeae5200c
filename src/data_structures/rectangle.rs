use crate::{
    error::{PdfError, PdfResult},
    objects::Object,
    FromObj, Resolve,
};

/// An axis-aligned rectangle, normalized so that the lower left corner is the minimum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub lower_left_x: f32,
    pub lower_left_y: f32,
    pub upper_right_x: f32,
    pub upper_right_y: f32,
}

impl FromObj for Rectangle {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        let arr = resolver.assert_number_arr(obj)?;

        match arr.as_slice() {
            &[x0, y0, x1, y1] => Ok(Rectangle::new(x0, y0, x1, y1)),
            _ => Err(PdfError::ArrayOfInvalidLength {
                expected: 4,
                found: arr.len(),
            }),
        }
    }
}

impl Rectangle {
    /// Any two opposite corners
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            lower_left_x: x0.min(x1),
            lower_left_y: y0.min(y1),
            upper_right_x: x0.max(x1),
            upper_right_y: y0.max(y1),
        }
    }

    /// US letter, the fallback for pages with no usable `/MediaBox`
    pub fn letter() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }

    pub fn width(&self) -> f32 {
        self.upper_right_x - self.lower_left_x
    }

    pub fn height(&self) -> f32 {
        self.upper_right_y - self.lower_left_y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        let rect = Rectangle {
            lower_left_x: self.lower_left_x.max(other.lower_left_x),
            lower_left_y: self.lower_left_y.max(other.lower_left_y),
            upper_right_x: self.upper_right_x.min(other.upper_right_x),
            upper_right_y: self.upper_right_y.min(other.upper_right_y),
        };

        if rect.is_empty() {
            None
        } else {
            Some(rect)
        }
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            lower_left_x: self.lower_left_x.min(other.lower_left_x),
            lower_left_y: self.lower_left_y.min(other.lower_left_y),
            upper_right_x: self.upper_right_x.max(other.upper_right_x),
            upper_right_y: self.upper_right_y.max(other.upper_right_y),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolve::NoResolve;

    #[test]
    fn corners_are_normalized() {
        let obj = Object::Array(vec![
            Object::Integer(100),
            Object::Integer(50),
            Object::Real(0.0),
            Object::Integer(0),
        ]);

        let rect = Rectangle::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(rect, Rectangle::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect.width(), 100.0);
    }

    #[test]
    fn intersection() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(5.0, 5.0, 20.0, 20.0);

        assert_eq!(a.intersect(&b), Some(Rectangle::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersect(&Rectangle::new(11.0, 0.0, 12.0, 1.0)), None);
    }
}
