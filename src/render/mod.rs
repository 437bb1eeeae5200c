pub use self::pixmap::{IntRect, Pixmap};

pub(crate) mod pixmap;
mod rasterize;
mod stroke;

use std::{
    sync::{Arc, Mutex, Weak},
    time::{Duration, Instant},
};

use crate::{
    color::Color,
    command::{CommandList, DrawCommand, FillRule, PaintTarget, PathPaint, StrokeAttrs},
    config::RenderConfig,
    data_structures::{Matrix, Rectangle},
    error::{PdfError, PdfResult},
    geometry::{Path, Point},
    task::{Task, TaskStatus},
    xobject::Image,
};

use self::rasterize::{rasterize, Mask};

/// Maps the `clip` rectangle of a page, in default user space, onto a `width` by `height`
/// raster with its origin at the top left, after turning the page clockwise by `rotation`
/// degrees
pub fn page_to_device(clip: Rectangle, rotation: i32, width: u32, height: u32) -> Matrix {
    let Rectangle {
        lower_left_x: llx,
        lower_left_y: lly,
        upper_right_x: urx,
        upper_right_y: ury,
    } = clip;

    let (w, h) = (width as f32, height as f32);
    let (cw, ch) = (clip.width().max(f32::EPSILON), clip.height().max(f32::EPSILON));

    match rotation.rem_euclid(360) / 90 {
        1 => {
            let (sx, sy) = (w / ch, h / cw);
            Matrix::new(0.0, sy, sx, 0.0, -lly * sx, -llx * sy)
        }
        2 => {
            let (sx, sy) = (w / cw, h / ch);
            Matrix::new(-sx, 0.0, 0.0, sy, urx * sx, -lly * sy)
        }
        3 => {
            let (sx, sy) = (w / ch, h / cw);
            Matrix::new(0.0, -sy, -sx, 0.0, ury * sx, urx * sy)
        }
        _ => {
            let (sx, sy) = (w / cw, h / ch);
            Matrix::new(sx, 0.0, 0.0, -sy, -llx * sx, ury * sy)
        }
    }
}

/// Device regions a renderer has changed, published at most once per notify interval
#[derive(Debug, Default)]
pub struct Damage {
    regions: Mutex<Vec<IntRect>>,
}

impl Damage {
    fn publish(&self, region: IntRect) {
        self.regions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(region);
    }

    /// Removes and returns the regions published since the last call
    pub fn take(&self) -> Vec<IntRect> {
        std::mem::take(&mut *self.regions.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[derive(Debug, Clone)]
struct RenderState {
    /// User space to device space
    transform: Matrix,
    clip: Option<Arc<Mask>>,
    stroke_attrs: StrokeAttrs,
    fill: Color,
    stroke: Color,
}

impl RenderState {
    fn new(transform: Matrix) -> Self {
        Self {
            transform,
            clip: None,
            stroke_attrs: StrokeAttrs::default(),
            fill: Color::BLACK,
            stroke: Color::BLACK,
        }
    }

    fn clip_coverage(&self, x: u32, y: u32) -> f32 {
        match &self.clip {
            Some(mask) => mask.get(x, y),
            None => 1.0,
        }
    }
}

/// Replays a page's draw commands onto a pixmap, one command per iteration
///
/// The pixmap is held weakly. Once its owners let it go the renderer stops
pub struct Renderer {
    commands: Arc<CommandList>,
    surface: Weak<Mutex<Pixmap>>,
    cursor: usize,
    bounds: IntRect,
    anti_alias: bool,

    state: RenderState,
    stack: Vec<RenderState>,

    dirty: IntRect,
    damage: Arc<Damage>,
    notify_interval: Duration,
    last_notify: Instant,

    failures: usize,
}

impl Renderer {
    pub fn new(
        commands: Arc<CommandList>,
        surface: &Arc<Mutex<Pixmap>>,
        base: Matrix,
        config: &RenderConfig,
    ) -> Self {
        let bounds = surface.lock().unwrap_or_else(|e| e.into_inner()).bounds();

        Self {
            commands,
            surface: Arc::downgrade(surface),
            cursor: 0,
            bounds,
            anti_alias: config.anti_alias,
            state: RenderState::new(base),
            stack: Vec::new(),
            dirty: IntRect::default(),
            damage: Arc::new(Damage::default()),
            notify_interval: config.notify_interval,
            last_notify: Instant::now(),
            failures: 0,
        }
    }

    pub fn damage(&self) -> Arc<Damage> {
        Arc::clone(&self.damage)
    }

    /// Number of commands replayed so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Commands that failed and were skipped
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn notify(&mut self, force: bool) {
        if self.dirty.is_empty() {
            return;
        }

        if force || self.last_notify.elapsed() >= self.notify_interval {
            log::trace!("damaged {:?}", self.dirty);

            self.damage.publish(self.dirty);
            self.dirty = IntRect::default();
            self.last_notify = Instant::now();
        }
    }

    /// Pixels drawing may touch under the current clip
    fn drawable(&self) -> IntRect {
        match &self.state.clip {
            Some(mask) => self.bounds.intersect(&mask.rect()),
            None => self.bounds,
        }
    }

    fn execute(&mut self, command: &DrawCommand, pixmap: &mut Pixmap) -> PdfResult<IntRect> {
        match command {
            DrawCommand::Push => self.stack.push(self.state.clone()),
            DrawCommand::Pop => self.state = self.stack.pop().ok_or(PdfError::UnbalancedRestore)?,
            DrawCommand::SetTransform(matrix) => {
                self.state.transform = *matrix * self.state.transform;
            }
            DrawCommand::SetStrokeAttrs(attrs) => self.state.stroke_attrs = attrs.clone(),
            DrawCommand::SetPaint { target, color } => match target {
                PaintTarget::Fill => self.state.fill = *color,
                PaintTarget::Stroke => self.state.stroke = *color,
            },
            DrawCommand::DrawPath(path, paint) => return Ok(self.draw_path(path, *paint, pixmap)),
            DrawCommand::DrawText(run) => {
                let paint = PathPaint {
                    fill: run.fill.then_some(FillRule::NonZero),
                    stroke: run.stroke,
                    clip: None,
                };

                return Ok(self.draw_path(&run.to_path(), paint, pixmap));
            }
            DrawCommand::DrawImage(image) => return self.draw_image(image, pixmap),
        }

        Ok(IntRect::default())
    }

    fn draw_path(&mut self, path: &Path, paint: PathPaint, pixmap: &mut Pixmap) -> IntRect {
        let mut damaged = IntRect::default();
        let transform = self.state.transform;

        if let Some(rule) = paint.fill {
            let mask = rasterize(path, transform, rule, self.drawable(), self.anti_alias);
            damaged = damaged.union(&self.paint_mask(&mask, self.state.fill, pixmap));
        }

        if paint.stroke {
            let scale = stroke::scale_factor(&transform);
            let outline = stroke::stroke(path, &self.state.stroke_attrs, scale);
            let mask = rasterize(&outline, transform, FillRule::NonZero, self.drawable(), self.anti_alias);

            damaged = damaged.union(&self.paint_mask(&mask, self.state.stroke, pixmap));
        }

        if let Some(rule) = paint.clip {
            let mask = rasterize(path, transform, rule, self.bounds, self.anti_alias);

            let clip = match &self.state.clip {
                Some(current) => current.intersect(&mask),
                None => mask,
            };

            self.state.clip = Some(Arc::new(clip));
        }

        damaged
    }

    fn paint_mask(&self, mask: &Mask, color: Color, pixmap: &mut Pixmap) -> IntRect {
        if color.a <= 0.0 {
            return IntRect::default();
        }

        let src = color.to_rgba8();

        for (x, y, coverage) in mask.pixels() {
            pixmap.blend_pixel(x, y, src, coverage * self.state.clip_coverage(x, y));
        }

        mask.rect()
    }

    /// Samples the image at the centre of every device pixel the unit square covers
    fn draw_image(&self, image: &Image, pixmap: &mut Pixmap) -> PdfResult<IntRect> {
        if image.width == 0 || image.height == 0 {
            return Ok(IntRect::default());
        }

        let transform = self.state.transform;
        let inverse = transform.inverse().ok_or(PdfError::NonInvertibleTransform)?;

        let mut unit = Path::new();
        unit.rect(0.0, 0.0, 1.0, 1.0);
        let bbox = unit.transformed(transform).bounding_box();

        let drawable = self.drawable();
        let x0 = bbox.min.x.floor().max(drawable.x as f32) as u32;
        let y0 = bbox.min.y.floor().max(drawable.y as f32) as u32;
        let x1 = (bbox.max.x.ceil().max(0.0) as u32).min(drawable.right());
        let y1 = (bbox.max.y.ceil().max(0.0) as u32).min(drawable.bottom());

        if x0 >= x1 || y0 >= y1 {
            return Ok(IntRect::default());
        }

        let alpha = self.state.fill.a;

        for y in y0..y1 {
            for x in x0..x1 {
                let u = inverse * Point::new(x as f32 + 0.5, y as f32 + 0.5);

                if !(0.0..1.0).contains(&u.x) || !(0.0..1.0).contains(&u.y) {
                    continue;
                }

                // the image's first row is the top of the unit square
                let ix = ((u.x * image.width as f32) as u32).min(image.width - 1);
                let iy = (((1.0 - u.y) * image.height as f32) as u32).min(image.height - 1);

                let sample = image.pixel(ix, iy);

                let (src, coverage) = if image.is_mask {
                    (self.state.fill.mask_pixel(sample), 1.0)
                } else {
                    (sample, alpha)
                };

                pixmap.blend_pixel(x, y, src, coverage * self.state.clip_coverage(x, y));
            }
        }

        Ok(IntRect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

impl Task for Renderer {
    fn iterate(&mut self) -> TaskStatus {
        let Some(surface) = self.surface.upgrade() else {
            log::debug!("surface dropped after {} commands", self.cursor);
            return TaskStatus::Stopped;
        };

        let commands = Arc::clone(&self.commands);

        // read before indexing, so a list finished after this point is seen next time
        let finished = commands.is_finished();

        let Some(command) = commands.get(self.cursor) else {
            if finished {
                self.notify(true);
                return TaskStatus::Completed;
            }

            self.notify(false);
            return TaskStatus::NeedsData;
        };

        let index = self.cursor;
        self.cursor += 1;

        let mut pixmap = surface.lock().unwrap_or_else(|e| e.into_inner());

        match self.execute(command, &mut pixmap) {
            Ok(region) => self.dirty = self.dirty.union(&region.intersect(&self.bounds)),
            Err(err) => {
                self.failures += 1;
                log::warn!("draw command {} ({:?}) failed: {}", index, command_name(command), err);
            }
        }

        drop(pixmap);
        self.notify(false);

        TaskStatus::Running
    }

    fn wait_for_data(&self, timeout: Duration) {
        self.commands.wait_for_more(self.cursor, timeout);
    }

    fn is_abandoned(&self) -> bool {
        self.surface.strong_count() == 0
    }
}

fn command_name(command: &DrawCommand) -> &'static str {
    match command {
        DrawCommand::Push => "Push",
        DrawCommand::Pop => "Pop",
        DrawCommand::SetTransform(..) => "SetTransform",
        DrawCommand::SetStrokeAttrs(..) => "SetStrokeAttrs",
        DrawCommand::SetPaint { .. } => "SetPaint",
        DrawCommand::DrawPath(..) => "DrawPath",
        DrawCommand::DrawImage(..) => "DrawImage",
        DrawCommand::DrawText(..) => "DrawText",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::task::{Gate, Watchable};

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    fn surface(width: u32, height: u32) -> Arc<Mutex<Pixmap>> {
        Arc::new(Mutex::new(Pixmap::new(width, height)))
    }

    /// A renderer for a page whose media box matches the surface
    fn renderer(commands: &Arc<CommandList>, surface: &Arc<Mutex<Pixmap>>) -> Arc<Watchable<Renderer>> {
        let (width, height) = {
            let pixmap = surface.lock().unwrap();
            (pixmap.width(), pixmap.height())
        };

        let base = page_to_device(
            Rectangle::new(0.0, 0.0, width as f32, height as f32),
            0,
            width,
            height,
        );

        Watchable::new(Renderer::new(
            Arc::clone(commands),
            surface,
            base,
            &RenderConfig::default().with_notify_interval(Duration::from_secs(3600)),
        ))
    }

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Arc<Path> {
        let mut path = Path::new();
        path.rect(x, y, width, height);
        Arc::new(path)
    }

    fn fill(color: Color) -> DrawCommand {
        DrawCommand::SetPaint {
            target: PaintTarget::Fill,
            color,
        }
    }

    fn pixel(surface: &Arc<Mutex<Pixmap>>, x: u32, y: u32) -> [u8; 4] {
        surface.lock().unwrap().pixel(x, y)
    }

    #[test]
    fn waits_for_data_until_the_page_is_finished() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::NeedsData);
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::NeedsData);

        commands.finish();

        assert_eq!(task.run(Gate::Iterations(1)), TaskStatus::Completed);
        assert_eq!(task.with_task(|r| r.cursor()), 0);
    }

    #[test]
    fn dropped_surface_stops_the_renderer() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(DrawCommand::Push);
        drop(surface);

        assert!(task.with_task(|r| r.is_abandoned()));
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Stopped);
        assert_eq!(task.with_task(|r| r.cursor()), 0);
    }

    #[test]
    fn resumes_where_it_left_off() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(fill(RED));
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::NeedsData);
        assert_eq!(task.with_task(|r| r.cursor()), 1);

        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 5.0, 5.0), PathPaint::fill(FillRule::NonZero)));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(task.with_task(|r| r.cursor()), 2);
    }

    #[test]
    fn fills_in_page_space() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(fill(RED));
        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 5.0, 5.0), PathPaint::fill(FillRule::NonZero)));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);

        // the page's lower left is the raster's bottom left
        assert_eq!(pixel(&surface, 2, 7), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 2, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&surface, 7, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn clips_until_restored() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(DrawCommand::Push);
        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 5.0, 10.0), PathPaint::clip(FillRule::NonZero)));
        commands.push(fill(RED));
        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 10.0, 10.0), PathPaint::fill(FillRule::NonZero)));
        commands.push(DrawCommand::Pop);
        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 10.0, 2.0), PathPaint::fill(FillRule::NonZero)));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);

        assert_eq!(pixel(&surface, 2, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 7, 2), [0, 0, 0, 0]);

        // the restored paint is black, and unclipped
        assert_eq!(pixel(&surface, 7, 9), [0, 0, 0, 255]);
    }

    #[test]
    fn transforms_concatenate_and_restore() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(fill(BLUE));
        commands.push(DrawCommand::Push);
        commands.push(DrawCommand::SetTransform(Matrix::new_translation(5.0, 0.0)));
        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 5.0, 5.0), PathPaint::fill(FillRule::NonZero)));
        commands.push(DrawCommand::Pop);
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(pixel(&surface, 7, 7), [0, 0, 255, 255]);
        assert_eq!(pixel(&surface, 2, 7), [0, 0, 0, 0]);
        assert_eq!(task.with_task(|r| r.stack.len()), 0);
    }

    #[test]
    fn failed_commands_are_skipped() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        commands.push(DrawCommand::Pop);
        commands.push(DrawCommand::SetTransform(Matrix::new_scale(0.0, 0.0)));
        commands.push(DrawCommand::DrawImage(Arc::new(Image {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
            is_mask: false,
        })));
        commands.push(DrawCommand::SetTransform(Matrix::identity()));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(task.with_task(|r| r.failures()), 2);
        assert_eq!(task.with_task(|r| r.cursor()), 4);
    }

    #[test]
    fn strokes_use_the_stroke_paint() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);

        let mut line = Path::new();
        line.move_to(Point::new(0.0, 5.0));
        line.line_to(Point::new(10.0, 5.0));

        commands.push(fill(RED));
        commands.push(DrawCommand::SetPaint {
            target: PaintTarget::Stroke,
            color: BLUE,
        });
        commands.push(DrawCommand::SetStrokeAttrs(StrokeAttrs {
            width: 2.0,
            ..StrokeAttrs::default()
        }));
        commands.push(DrawCommand::DrawPath(Arc::new(line), PathPaint::stroke()));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(pixel(&surface, 5, 4), [0, 0, 255, 255]);
        assert_eq!(pixel(&surface, 5, 5), [0, 0, 255, 255]);
        assert_eq!(pixel(&surface, 5, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn image_masks_take_the_fill_colour() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(2, 1);
        let task = renderer(&commands, &surface);

        commands.push(fill(RED));
        commands.push(DrawCommand::SetTransform(Matrix::new_scale(2.0, 1.0)));
        commands.push(DrawCommand::DrawImage(Arc::new(Image {
            width: 2,
            height: 1,
            pixels: vec![0, 0, 0, 255, 0, 0, 0, 0],
            is_mask: true,
        })));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(pixel(&surface, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn images_fill_the_unit_square_top_row_first() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(4, 4);
        let task = renderer(&commands, &surface);

        commands.push(DrawCommand::SetTransform(Matrix::new_scale(4.0, 4.0)));
        commands.push(DrawCommand::DrawImage(Arc::new(Image {
            width: 1,
            height: 2,
            pixels: vec![255, 0, 0, 255, 0, 0, 255, 255],
            is_mask: false,
        })));
        commands.finish();

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(pixel(&surface, 1, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 1, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn damage_is_published_on_completion() {
        let commands = Arc::new(CommandList::new());
        let surface = surface(10, 10);
        let task = renderer(&commands, &surface);
        let damage = task.with_task(|r| r.damage());

        commands.push(DrawCommand::DrawPath(rect(0.0, 0.0, 5.0, 5.0), PathPaint::fill(FillRule::NonZero)));
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::NeedsData);

        // the interval has not passed
        assert!(damage.take().is_empty());

        commands.push(DrawCommand::DrawPath(rect(5.0, 5.0, 5.0, 5.0), PathPaint::fill(FillRule::NonZero)));
        commands.finish();
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);

        assert_eq!(damage.take(), vec![IntRect::new(0, 0, 10, 10)]);
        assert!(damage.take().is_empty());
    }

    #[test]
    fn unrotated_pages_flip_vertically() {
        let m = page_to_device(Rectangle::new(0.0, 0.0, 200.0, 100.0), 0, 400, 200);

        assert_eq!(m * Point::new(0.0, 0.0), Point::new(0.0, 200.0));
        assert_eq!(m * Point::new(200.0, 100.0), Point::new(400.0, 0.0));
    }

    #[test]
    fn rotations_turn_clockwise() {
        let clip = Rectangle::new(0.0, 0.0, 200.0, 100.0);

        let quarter = page_to_device(clip, 90, 100, 200);
        assert_eq!(quarter * Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        assert_eq!(quarter * Point::new(200.0, 0.0), Point::new(0.0, 200.0));
        assert_eq!(quarter * Point::new(200.0, 100.0), Point::new(100.0, 200.0));

        let half = page_to_device(clip, 180, 200, 100);
        assert_eq!(half * Point::new(0.0, 0.0), Point::new(200.0, 0.0));
        assert_eq!(half * Point::new(200.0, 100.0), Point::new(0.0, 100.0));

        let three_quarters = page_to_device(clip, -90, 100, 200);
        assert_eq!(three_quarters * Point::new(0.0, 0.0), Point::new(100.0, 200.0));
        assert_eq!(three_quarters * Point::new(200.0, 100.0), Point::new(0.0, 0.0));
    }

    #[test]
    fn clip_origin_is_translated_away() {
        let m = page_to_device(Rectangle::new(50.0, 50.0, 150.0, 100.0), 0, 100, 50);

        assert_eq!(m * Point::new(50.0, 100.0), Point::new(0.0, 0.0));
        assert_eq!(m * Point::new(150.0, 50.0), Point::new(100.0, 50.0));
    }
}
