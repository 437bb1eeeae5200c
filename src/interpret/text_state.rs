use std::sync::Arc;

use crate::{data_structures::Matrix, font::Font};

#[derive(Debug, Clone)]
pub(crate) struct TextState {
    /// Tc, in unscaled text space units. Added to every glyph's displacement
    pub character_spacing: f32,

    /// Tw, added on top of Tc for single byte code 32 only
    pub word_spacing: f32,

    /// Tz / 100. Scales glyphs, displacements and `TJ` adjustments horizontally
    pub horizontal_scaling: f32,

    /// TL, the distance between baselines used by `T*`, `'` and `"`
    pub leading: f32,
    pub font: Option<Arc<Font>>,
    pub font_size: f32,
    pub rendering_mode: TextRenderingMode,

    /// Ts, moves the baseline up, regardless of writing mode
    pub rise: f32,

    pub text_matrix: Matrix,
    pub text_line_matrix: Matrix,
}

impl TextState {
    /// Called at `BT`
    pub fn reinit(&mut self) {
        self.text_matrix = Matrix::identity();
        self.text_line_matrix = Matrix::identity();
    }

    /// Moves to the start of the next line, offset from the start of the current one
    pub fn next_line(&mut self, tx: f32, ty: f32) {
        self.text_line_matrix = Matrix::new_translation(tx, ty) * self.text_line_matrix;
        self.text_matrix = self.text_line_matrix;
    }

    /// Glyph space to user space for a glyph at the current text position
    pub fn glyph_matrix(&self) -> Matrix {
        Matrix::new(
            self.font_size * self.horizontal_scaling,
            0.0,
            0.0,
            self.font_size,
            0.0,
            self.rise,
        ) * self.text_matrix
    }

    /// Moves the text position by `(tx, ty)` in text space
    pub fn advance(&mut self, tx: f32, ty: f32) {
        self.text_matrix = Matrix::new_translation(tx, ty) * self.text_matrix;
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rendering_mode: TextRenderingMode::Fill,
            rise: 0.0,
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
        }
    }
}

#[pdf_enum(Integer)]
pub enum TextRenderingMode {
    Fill = 0,
    Stroke = 1,
    FillThenStroke = 2,
    Invisible = 3,
    FillAndAddToClipping = 4,
    StrokeAndAddToClipping = 5,
    FillThenStrokeAndAddToClipping = 6,
    AddToClipping = 7,
}

impl TextRenderingMode {
    pub fn fills(self) -> bool {
        matches!(
            self,
            Self::Fill | Self::FillThenStroke | Self::FillAndAddToClipping | Self::FillThenStrokeAndAddToClipping
        )
    }

    pub fn strokes(self) -> bool {
        matches!(
            self,
            Self::Stroke
                | Self::FillThenStroke
                | Self::StrokeAndAddToClipping
                | Self::FillThenStrokeAndAddToClipping
        )
    }

    pub fn clips(self) -> bool {
        matches!(
            self,
            Self::FillAndAddToClipping
                | Self::StrokeAndAddToClipping
                | Self::FillThenStrokeAndAddToClipping
                | Self::AddToClipping
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn line_moves_are_relative_to_the_line_start() {
        let mut state = TextState::default();

        state.next_line(10.0, 100.0);
        state.advance(5.0, 0.0);
        state.next_line(0.0, -12.0);

        assert_eq!(state.text_matrix * Point::origin(), Point::new(10.0, 88.0));
    }

    #[test]
    fn glyph_matrix_applies_size_scaling_and_rise() {
        let state = TextState {
            font_size: 10.0,
            horizontal_scaling: 0.5,
            rise: 2.0,
            text_matrix: Matrix::new_translation(100.0, 200.0),
            ..TextState::default()
        };

        assert_eq!(state.glyph_matrix() * Point::new(1.0, 1.0), Point::new(105.0, 212.0));
    }

    #[test]
    fn rendering_modes() {
        assert_eq!(TextRenderingMode::from_integer(7).unwrap(), TextRenderingMode::AddToClipping);
        assert!(TextRenderingMode::from_integer(8).is_err());
        assert!(!TextRenderingMode::Invisible.fills());
        assert!(TextRenderingMode::FillThenStroke.strokes());
        assert!(TextRenderingMode::StrokeAndAddToClipping.clips());
    }
}
