use std::sync::Arc;

use crate::geometry::{Path, Point};

#[derive(Debug, Clone)]
pub struct Glyph {
    /// In text space, relative to the glyph origin, before the font size is applied
    pub outline: Arc<Path>,

    /// Displacement to the next glyph origin, also in unscaled text space
    pub advance: Point,
}

impl Glyph {
    pub fn empty() -> Self {
        Self {
            outline: Arc::new(Path::new()),
            advance: Point::origin(),
        }
    }

    pub fn horizontal(outline: Path, advance: f32) -> Self {
        Self {
            outline: Arc::new(outline),
            advance: Point::new(advance, 0.0),
        }
    }

    pub fn vertical(outline: Path, advance: f32) -> Self {
        Self {
            outline: Arc::new(outline),
            advance: Point::new(0.0, advance),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.outline.is_empty()
    }
}
