use crate::{
    color::{Color, ColorSpace},
    command::{PaintTarget, StrokeAttrs},
    data_structures::Matrix,
};

use super::text_state::TextState;

/// The parameters saved by `q` and restored by `Q`
#[derive(Debug, Clone)]
pub(crate) struct GraphicsState {
    /// The current transformation matrix, mapping user space to the page's default user space
    pub current_transformation_matrix: Matrix,

    pub stroke_attrs: StrokeAttrs,
    pub stroking: PaintState,
    pub nonstroking: PaintState,
    pub text_state: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            current_transformation_matrix: Matrix::identity(),
            stroke_attrs: StrokeAttrs::default(),
            stroking: PaintState::default(),
            nonstroking: PaintState::default(),
            text_state: TextState::default(),
        }
    }
}

impl GraphicsState {
    pub fn paint(&self, target: PaintTarget) -> &PaintState {
        match target {
            PaintTarget::Fill => &self.nonstroking,
            PaintTarget::Stroke => &self.stroking,
        }
    }

    pub fn paint_mut(&mut self, target: PaintTarget) -> &mut PaintState {
        match target {
            PaintTarget::Fill => &mut self.nonstroking,
            PaintTarget::Stroke => &mut self.stroking,
        }
    }
}

/// A colour space, a colour within it and the constant alpha (`CA` or `ca`) to paint with
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PaintState {
    pub color_space: ColorSpace,
    pub components: Vec<f32>,
    pub alpha: f32,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::DeviceGray,
            components: vec![0.0],
            alpha: 1.0,
        }
    }
}

impl PaintState {
    /// Selecting a colour space resets the colour to that space's initial value
    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        self.components = color_space.initial_color();
        self.color_space = color_space;
    }

    pub fn color(&self) -> Color {
        self.color_space
            .to_color(&self.components)
            .with_alpha(self.alpha.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initial_paint_is_opaque_black() {
        let state = GraphicsState::default();

        assert_eq!(state.paint(PaintTarget::Fill).color(), Color::BLACK);
        assert_eq!(state.paint(PaintTarget::Stroke).color(), Color::BLACK);
    }

    #[test]
    fn selecting_a_space_resets_the_color() {
        let mut paint = PaintState {
            components: vec![0.5],
            ..PaintState::default()
        };

        paint.set_color_space(ColorSpace::DeviceCMYK);

        assert_eq!(paint.components, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(paint.color(), Color::BLACK);
    }

    #[test]
    fn constant_alpha_applies() {
        let mut paint = PaintState::default();
        paint.alpha = 0.25;

        assert_eq!(paint.color().a, 0.25);
    }
}
