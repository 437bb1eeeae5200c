use super::Point;

/// An axis-aligned box in whatever space its points came from. Starts out empty, with `min`
/// above `max`, so the first added point defines it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    pub const fn new() -> Self {
        Self {
            min: Point::new(f32::INFINITY, f32::INFINITY),
            max: Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        let mut bbox = Self::new();
        bbox.add_point(a);
        bbox.add_point(b);
        bbox
    }

    pub fn add_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);

        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    pub fn merge(&mut self, other: Self) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);

        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }

    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Grows the box by `amount` on every side
    pub fn outset(&self, amount: f32) -> Self {
        if self.is_empty() {
            return *self;
        }

        Self {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.max.x >= self.min.x && self.max.y >= self.min.y)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_until_a_point_is_added() {
        let mut bbox = BoundingBox::new();
        assert!(bbox.is_empty());

        bbox.add_point(Point::new(3.0, 4.0));
        assert!(!bbox.is_empty());
        assert_eq!(bbox.width(), 0.0);

        bbox.add_point(Point::new(-1.0, 10.0));
        assert_eq!(bbox.width(), 4.0);
        assert_eq!(bbox.height(), 6.0);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = BoundingBox::from_points(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = BoundingBox::from_points(Point::new(2.0, 2.0), Point::new(3.0, 3.0));

        assert!(a.intersect(&b).is_empty());
    }
}
