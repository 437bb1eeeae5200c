use std::{
    mem,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use bytes::Bytes;

use crate::{
    cache::Cache,
    color::ColorSpace,
    command::{
        CommandList, DashPattern, DrawCommand, FillRule, LineCap, LineJoin, PaintTarget, PathPaint,
        PlacedGlyph, TextRun,
    },
    config::RenderConfig,
    content::{ContentLexer, ContentToken, PdfGraphicsOperator},
    data_structures::Matrix,
    error::{PdfError, PdfResult},
    font::Font,
    geometry::{Path, Point},
    objects::{Dictionary, Object, PdfString, Reference},
    stream::Stream,
    task::{Task, TaskStatus},
    xobject::{Form, Image, XObjectSubtype},
    FromObj, Resolve,
};

use self::{graphics_state::GraphicsState, text_state::TextRenderingMode};

mod graphics_state;
mod text_state;

const FONT_CACHE_CAPACITY: usize = 64;
const FORM_CACHE_CAPACITY: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fonts and forms parsed once per document, keyed by the object they were read from
#[derive(Debug)]
pub(crate) struct SharedResources {
    fonts: Mutex<Cache<Reference, Arc<Font>>>,
    forms: Mutex<Cache<Reference, Arc<Form>>>,
}

impl Default for SharedResources {
    fn default() -> Self {
        Self {
            fonts: Mutex::new(Cache::new(FONT_CACHE_CAPACITY)),
            forms: Mutex::new(Cache::new(FORM_CACHE_CAPACITY)),
        }
    }
}

impl SharedResources {
    pub fn clear(&self) {
        lock(&self.fonts).clear();
        lock(&self.forms).clear();
    }

    pub fn cached_fonts(&self) -> usize {
        lock(&self.fonts).len()
    }

    pub fn cached_forms(&self) -> usize {
        lock(&self.forms).len()
    }
}

/// What every interpreter working on one document shares
#[derive(Clone)]
pub(crate) struct DocumentContext {
    pub resolver: Arc<dyn Resolve + Send + Sync>,
    pub config: Arc<RenderConfig>,
    pub shared: Arc<SharedResources>,
}

/// Counts of malformed content the interpreter recovered from
#[derive(Debug, Default)]
pub struct ContentDiagnostics {
    leftover_operands: AtomicUsize,
    failed_operators: AtomicUsize,
    unknown_operators: AtomicUsize,
}

impl ContentDiagnostics {
    /// Operators that finished with operands still on the stack, which were discarded
    pub fn leftover_operands(&self) -> usize {
        self.leftover_operands.load(Ordering::Relaxed)
    }

    /// Operators whose execution failed and was skipped
    pub fn failed_operators(&self) -> usize {
        self.failed_operators.load(Ordering::Relaxed)
    }

    pub fn unknown_operators(&self) -> usize {
        self.unknown_operators.load(Ordering::Relaxed)
    }

    fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A content stream being interpreted: the page's own, or that of a form it invoked
struct Frame {
    lexer: ContentLexer,
    resources: Arc<Dictionary>,

    /// Depth of the graphics state stack when the frame began. `Q` never restores past it
    base_depth: usize,

    /// `None` for the page
    form: Option<FormSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormSource {
    Indirect(Reference),
    Direct,
}

/// Turns a page's content stream into drawing commands, one operator per iteration
pub(crate) struct Interpreter {
    context: DocumentContext,
    commands: Arc<CommandList>,
    diagnostics: Arc<ContentDiagnostics>,
    frames: Vec<Frame>,
    operand_stack: Vec<Object>,
    graphics_state: GraphicsState,
    graphics_state_stack: Vec<GraphicsState>,
    current_path: Path,

    /// Set by `W` and `W*`, applied by the next path painting operator
    pending_clip: Option<FillRule>,

    /// Glyph outlines shown in a clipping text mode, added to the clip at `ET`
    text_clip: Option<Path>,
}

impl Task for Interpreter {
    fn iterate(&mut self) -> TaskStatus {
        loop {
            let next = match self.frames.last_mut() {
                Some(frame) => frame
                    .lexer
                    .next_token()
                    .map_err(|err| (err, frame.lexer.position())),
                None => {
                    self.commands.finish();
                    return TaskStatus::Completed;
                }
            };

            match next {
                Ok(Some(ContentToken::Object(obj))) => self.operand_stack.push(obj),
                Ok(Some(ContentToken::Operator(op))) => {
                    self.run_operator(op);
                    return TaskStatus::Running;
                }
                Ok(Some(ContentToken::InlineImage(stream))) => {
                    if let Err(err) = self.draw_image(&stream) {
                        log::warn!("inline image: {}", err);
                        ContentDiagnostics::record(&self.diagnostics.failed_operators);
                    }

                    self.check_operands("BI");
                    return TaskStatus::Running;
                }
                Ok(None) => return self.end_frame(),
                Err((PdfError::UnknownOperator { operator }, _)) => {
                    log::warn!("unknown operator {:?}", operator);
                    ContentDiagnostics::record(&self.diagnostics.unknown_operators);
                    self.operand_stack.clear();

                    return TaskStatus::Running;
                }
                Err((err, pos)) => {
                    log::warn!("content stream truncated at byte {}: {}", pos, err);

                    if self.frames.len() > 1 {
                        return self.end_frame();
                    }

                    self.end_frame();
                    return TaskStatus::Error;
                }
            }
        }
    }
}

impl Interpreter {
    pub fn new(
        content: Bytes,
        resources: Dictionary,
        context: DocumentContext,
        commands: Arc<CommandList>,
    ) -> Self {
        Self {
            context,
            commands,
            diagnostics: Arc::new(ContentDiagnostics::default()),
            frames: vec![Frame {
                lexer: ContentLexer::new(content),
                resources: Arc::new(resources),
                base_depth: 0,
                form: None,
            }],
            operand_stack: Vec::new(),
            graphics_state: GraphicsState::default(),
            graphics_state_stack: Vec::new(),
            current_path: Path::new(),
            pending_clip: None,
            text_clip: None,
        }
    }

    pub fn diagnostics(&self) -> Arc<ContentDiagnostics> {
        Arc::clone(&self.diagnostics)
    }

    fn resolver(&self) -> &dyn Resolve {
        &*self.context.resolver
    }

    fn emit(&self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn run_operator(&mut self, op: PdfGraphicsOperator) {
        if let Err(err) = self.execute(op) {
            log::warn!("{:?} failed: {}", op, err);
            ContentDiagnostics::record(&self.diagnostics.failed_operators);
            self.operand_stack.clear();
        }

        self.check_operands(op.as_str());
    }

    /// Operands left behind by an operator are discarded
    fn check_operands(&mut self, op: &str) {
        if self.operand_stack.is_empty() {
            return;
        }

        log::warn!(
            "{} operands left on the stack after {}",
            self.operand_stack.len(),
            op
        );
        ContentDiagnostics::record(&self.diagnostics.leftover_operands);
        self.operand_stack.clear();
    }

    /// Finishes the innermost content stream, restoring any state it left saved
    fn end_frame(&mut self) -> TaskStatus {
        let Some(frame) = self.frames.pop() else {
            self.commands.finish();
            return TaskStatus::Completed;
        };

        self.check_operands("the end of the content stream");

        if self.text_clip.is_some() {
            self.end_text();
        }

        self.current_path = Path::new();
        self.pending_clip = None;

        while self.graphics_state_stack.len() > frame.base_depth {
            self.pop_graphics_state();
        }

        if frame.form.is_some() {
            self.pop_graphics_state();
        }

        if self.frames.is_empty() {
            self.commands.finish();
            return TaskStatus::Completed;
        }

        TaskStatus::Running
    }

    fn execute(&mut self, op: PdfGraphicsOperator) -> PdfResult<()> {
        match op {
            PdfGraphicsOperator::w => self.set_line_width(),
            PdfGraphicsOperator::J => self.set_line_cap(),
            PdfGraphicsOperator::j => self.set_line_join(),
            PdfGraphicsOperator::M => self.set_miter_limit(),
            PdfGraphicsOperator::d => self.set_dash_pattern(),
            PdfGraphicsOperator::gs => self.set_graphics_state_parameters(),
            PdfGraphicsOperator::q => {
                self.save_graphics_state();
                Ok(())
            }
            PdfGraphicsOperator::Q => {
                self.restore_graphics_state();
                Ok(())
            }
            PdfGraphicsOperator::cm => self.transform_ctm(),

            PdfGraphicsOperator::m => self.move_to(),
            PdfGraphicsOperator::l => self.line_to(),
            PdfGraphicsOperator::c => self.cubic_curve_to(),
            PdfGraphicsOperator::v => self.cubic_curve_to_current(),
            PdfGraphicsOperator::y => self.cubic_curve_to_end(),
            PdfGraphicsOperator::h => {
                self.current_path.close_path();
                Ok(())
            }
            PdfGraphicsOperator::re => self.append_rectangle(),

            PdfGraphicsOperator::S => self.paint_path(PathPaint::stroke(), false),
            PdfGraphicsOperator::s => self.paint_path(PathPaint::stroke(), true),
            PdfGraphicsOperator::f | PdfGraphicsOperator::F => {
                self.paint_path(PathPaint::fill(FillRule::NonZero), false)
            }
            PdfGraphicsOperator::f_star => self.paint_path(PathPaint::fill(FillRule::EvenOdd), false),
            PdfGraphicsOperator::B => self.paint_path(fill_and_stroke(FillRule::NonZero), false),
            PdfGraphicsOperator::B_star => self.paint_path(fill_and_stroke(FillRule::EvenOdd), false),
            PdfGraphicsOperator::b => self.paint_path(fill_and_stroke(FillRule::NonZero), true),
            PdfGraphicsOperator::b_star => self.paint_path(fill_and_stroke(FillRule::EvenOdd), true),
            PdfGraphicsOperator::n => self.paint_path(PathPaint::default(), false),
            PdfGraphicsOperator::W => {
                self.pending_clip = Some(FillRule::NonZero);
                Ok(())
            }
            PdfGraphicsOperator::W_star => {
                self.pending_clip = Some(FillRule::EvenOdd);
                Ok(())
            }

            PdfGraphicsOperator::BT => {
                self.begin_text();
                Ok(())
            }
            PdfGraphicsOperator::ET => {
                self.end_text();
                Ok(())
            }
            PdfGraphicsOperator::Tc => {
                self.graphics_state.text_state.character_spacing = self.pop_number()?;
                Ok(())
            }
            PdfGraphicsOperator::Tw => {
                self.graphics_state.text_state.word_spacing = self.pop_number()?;
                Ok(())
            }
            PdfGraphicsOperator::Tz => {
                self.graphics_state.text_state.horizontal_scaling = self.pop_number()? / 100.0;
                Ok(())
            }
            PdfGraphicsOperator::TL => {
                self.graphics_state.text_state.leading = self.pop_number()?;
                Ok(())
            }
            PdfGraphicsOperator::Tf => self.set_font_and_size(),
            PdfGraphicsOperator::Tr => self.set_text_rendering_mode(),
            PdfGraphicsOperator::Ts => {
                self.graphics_state.text_state.rise = self.pop_number()?;
                Ok(())
            }
            PdfGraphicsOperator::Td => self.move_text_position(),
            PdfGraphicsOperator::TD => self.move_text_position_and_set_leading(),
            PdfGraphicsOperator::Tm => self.set_text_matrix(),
            PdfGraphicsOperator::T_star => {
                self.next_line();
                Ok(())
            }
            PdfGraphicsOperator::Tj => {
                let text = self.pop_string()?;
                self.show_text(&[Object::String(text)])
            }
            PdfGraphicsOperator::TJ => {
                let elements = self.pop_arr()?;
                self.show_text(&elements)
            }
            PdfGraphicsOperator::single_quote => {
                let text = self.pop_string()?;
                self.next_line();
                self.show_text(&[Object::String(text)])
            }
            PdfGraphicsOperator::double_quote => {
                let text = self.pop_string()?;
                let character_spacing = self.pop_number()?;
                let word_spacing = self.pop_number()?;

                let text_state = &mut self.graphics_state.text_state;
                text_state.character_spacing = character_spacing;
                text_state.word_spacing = word_spacing;

                self.next_line();
                self.show_text(&[Object::String(text)])
            }

            PdfGraphicsOperator::CS => self.set_color_space(PaintTarget::Stroke),
            PdfGraphicsOperator::cs => self.set_color_space(PaintTarget::Fill),
            PdfGraphicsOperator::SC | PdfGraphicsOperator::SCN => self.set_color(PaintTarget::Stroke),
            PdfGraphicsOperator::sc | PdfGraphicsOperator::scn => self.set_color(PaintTarget::Fill),
            PdfGraphicsOperator::G => self.set_device_color(PaintTarget::Stroke, ColorSpace::DeviceGray),
            PdfGraphicsOperator::g => self.set_device_color(PaintTarget::Fill, ColorSpace::DeviceGray),
            PdfGraphicsOperator::RG => self.set_device_color(PaintTarget::Stroke, ColorSpace::DeviceRGB),
            PdfGraphicsOperator::rg => self.set_device_color(PaintTarget::Fill, ColorSpace::DeviceRGB),
            PdfGraphicsOperator::K => self.set_device_color(PaintTarget::Stroke, ColorSpace::DeviceCMYK),
            PdfGraphicsOperator::k => self.set_device_color(PaintTarget::Fill, ColorSpace::DeviceCMYK),

            PdfGraphicsOperator::Do => self.draw_xobject(),
            PdfGraphicsOperator::sh => {
                let name = self.pop_name()?;
                log::debug!("shading /{} is not drawn", name);
                Ok(())
            }

            // accepted, but with no effect on the rasterized page
            PdfGraphicsOperator::ri
            | PdfGraphicsOperator::i
            | PdfGraphicsOperator::d0
            | PdfGraphicsOperator::d1
            | PdfGraphicsOperator::MP
            | PdfGraphicsOperator::DP
            | PdfGraphicsOperator::BMC
            | PdfGraphicsOperator::BDC
            | PdfGraphicsOperator::EMC => self.discard_operands(op),

            // the lexer consumes inline images whole
            PdfGraphicsOperator::BI | PdfGraphicsOperator::ID | PdfGraphicsOperator::EI => Ok(()),
            PdfGraphicsOperator::BX | PdfGraphicsOperator::EX => Ok(()),
        }
    }
}

fn fill_and_stroke(rule: FillRule) -> PathPaint {
    PathPaint {
        fill: Some(rule),
        stroke: true,
        clip: None,
    }
}

/// Operand stack
impl Interpreter {
    fn pop(&mut self) -> PdfResult<Object> {
        self.operand_stack.pop().ok_or(PdfError::StackUnderflow)
    }

    fn pop_number(&mut self) -> PdfResult<f32> {
        let obj = self.pop()?;

        self.resolver().assert_number(obj)
    }

    fn pop_integer(&mut self) -> PdfResult<i32> {
        let obj = self.pop()?;

        self.resolver().assert_integer(obj)
    }

    fn pop_name(&mut self) -> PdfResult<String> {
        let obj = self.pop()?;

        self.resolver().assert_name(obj)
    }

    fn pop_string(&mut self) -> PdfResult<PdfString> {
        let obj = self.pop()?;

        self.resolver().assert_string(obj)
    }

    fn pop_arr(&mut self) -> PdfResult<Vec<Object>> {
        let obj = self.pop()?;

        self.resolver().assert_arr(obj)
    }

    fn pop_point(&mut self) -> PdfResult<Point> {
        let y = self.pop_number()?;
        let x = self.pop_number()?;

        Ok(Point::new(x, y))
    }

    fn pop_matrix(&mut self) -> PdfResult<Matrix> {
        let f = self.pop_number()?;
        let e = self.pop_number()?;
        let d = self.pop_number()?;
        let c = self.pop_number()?;
        let b = self.pop_number()?;
        let a = self.pop_number()?;

        Ok(Matrix::new(a, b, c, d, e, f))
    }

    fn discard_operands(&mut self, op: PdfGraphicsOperator) -> PdfResult<()> {
        for _ in 0..op.arity().unwrap_or(0) {
            self.pop()?;
        }

        Ok(())
    }
}

/// Resources
impl Interpreter {
    fn resources(&self) -> Arc<Dictionary> {
        self.frames
            .last()
            .map(|frame| Arc::clone(&frame.resources))
            .unwrap_or_default()
    }

    /// An entry of one of the resource subdictionaries, unresolved so references can key caches
    fn resource(&self, category: &'static str, name: &str) -> PdfResult<Object> {
        self.resources()
            .get_dict(category, self.resolver())?
            .and_then(|dict| dict.get(name).cloned())
            .ok_or_else(|| PdfError::MissingResource {
                category,
                name: name.to_owned(),
            })
    }

    fn load_font(&self, obj: Object) -> PdfResult<Arc<Font>> {
        let reference = obj.as_reference();

        if let Some(reference) = reference {
            if let Some(font) = lock(&self.context.shared.fonts).get(&reference) {
                return Ok(font);
            }
        }

        let dict = self.resolver().assert_dict(obj)?;
        let font = Arc::new(Font::from_dict(dict, self.resolver(), &self.context.config)?);

        if let Some(reference) = reference {
            lock(&self.context.shared.fonts).insert(reference, Arc::clone(&font));
        }

        Ok(font)
    }

    /// Device and CIE-based families by name, anything else through `/ColorSpace`
    fn color_space_by_name(&self, name: &str) -> PdfResult<ColorSpace> {
        match self.resource("ColorSpace", name) {
            Ok(obj) => ColorSpace::from_obj(obj, self.resolver()),
            Err(PdfError::MissingResource { .. }) => {
                ColorSpace::from_obj(Object::Name(name.to_owned()), self.resolver())
            }
            Err(err) => Err(err),
        }
    }
}

/// Graphics state
impl Interpreter {
    fn emit_stroke_attrs(&self) {
        self.emit(DrawCommand::SetStrokeAttrs(
            self.graphics_state.stroke_attrs.clone(),
        ));
    }

    fn emit_paint(&self, target: PaintTarget) {
        self.emit(DrawCommand::SetPaint {
            target,
            color: self.graphics_state.paint(target).color(),
        });
    }

    fn set_line_width(&mut self) -> PdfResult<()> {
        self.graphics_state.stroke_attrs.width = self.pop_number()?;
        self.emit_stroke_attrs();

        Ok(())
    }

    fn set_line_cap(&mut self) -> PdfResult<()> {
        let cap = LineCap::from_integer(self.pop_integer()?)?;
        self.graphics_state.stroke_attrs.cap = cap;
        self.emit_stroke_attrs();

        Ok(())
    }

    fn set_line_join(&mut self) -> PdfResult<()> {
        let join = LineJoin::from_integer(self.pop_integer()?)?;
        self.graphics_state.stroke_attrs.join = join;
        self.emit_stroke_attrs();

        Ok(())
    }

    fn set_miter_limit(&mut self) -> PdfResult<()> {
        self.graphics_state.stroke_attrs.miter_limit = self.pop_number()?;
        self.emit_stroke_attrs();

        Ok(())
    }

    fn set_dash_pattern(&mut self) -> PdfResult<()> {
        let phase = self.pop_number()?;
        let array = self.pop_arr()?;

        self.graphics_state.stroke_attrs.dash = self.dash_pattern(array, phase)?;
        self.emit_stroke_attrs();

        Ok(())
    }

    fn dash_pattern(&self, array: Vec<Object>, phase: f32) -> PdfResult<DashPattern> {
        let array = array
            .into_iter()
            .map(|obj| self.resolver().assert_number(obj))
            .collect::<PdfResult<Vec<f32>>>()?;

        Ok(DashPattern { array, phase })
    }

    /// Applies the parameters of an `/ExtGState` resource. Keys this renderer has no use for
    /// are ignored
    fn set_graphics_state_parameters(&mut self) -> PdfResult<()> {
        let name = self.pop_name()?;
        let resolver = Arc::clone(&self.context.resolver);
        let dict = resolver.assert_dict(self.resource("ExtGState", &name)?)?;

        let mut attrs = self.graphics_state.stroke_attrs.clone();

        if let Some(width) = dict.get_number("LW", &*resolver)? {
            attrs.width = width;
        }

        if let Some(cap) = dict.get_typed::<LineCap>("LC", &*resolver)? {
            attrs.cap = cap;
        }

        if let Some(join) = dict.get_typed::<LineJoin>("LJ", &*resolver)? {
            attrs.join = join;
        }

        if let Some(miter_limit) = dict.get_number("ML", &*resolver)? {
            attrs.miter_limit = miter_limit;
        }

        if let Some(dash) = dict.get_arr("D", &*resolver)? {
            let mut dash = dash.into_iter();

            if let (Some(array), Some(phase)) = (dash.next(), dash.next()) {
                attrs.dash = self.dash_pattern(resolver.assert_arr(array)?, resolver.assert_number(phase)?)?;
            }
        }

        if attrs != self.graphics_state.stroke_attrs {
            self.graphics_state.stroke_attrs = attrs;
            self.emit_stroke_attrs();
        }

        if let Some(font) = dict.get_arr("Font", &*resolver)? {
            let mut font = font.into_iter();

            if let (Some(font), Some(size)) = (font.next(), font.next()) {
                let size = resolver.assert_number(size)?;
                let font = self.load_font(font)?;

                let text_state = &mut self.graphics_state.text_state;
                text_state.font = Some(font);
                text_state.font_size = size;
            }
        }

        for (key, target) in [("CA", PaintTarget::Stroke), ("ca", PaintTarget::Fill)] {
            if let Some(alpha) = dict.get_number(key, &*resolver)? {
                self.graphics_state.paint_mut(target).alpha = alpha;
                self.emit_paint(target);
            }
        }

        Ok(())
    }

    fn save_graphics_state(&mut self) {
        self.graphics_state_stack.push(self.graphics_state.clone());
        self.emit(DrawCommand::Push);
    }

    /// A `Q` without a matching `q` in the same content stream is ignored
    fn restore_graphics_state(&mut self) {
        let base_depth = self.frames.last().map_or(0, |frame| frame.base_depth);

        if self.graphics_state_stack.len() <= base_depth {
            log::warn!("Q without matching q");
            return;
        }

        self.pop_graphics_state();
    }

    fn pop_graphics_state(&mut self) {
        if let Some(state) = self.graphics_state_stack.pop() {
            self.graphics_state = state;
            self.emit(DrawCommand::Pop);
        }
    }

    fn concat_matrix(&mut self, matrix: Matrix) {
        self.graphics_state.current_transformation_matrix =
            matrix * self.graphics_state.current_transformation_matrix;
        self.emit(DrawCommand::SetTransform(matrix));
    }

    fn transform_ctm(&mut self) -> PdfResult<()> {
        let matrix = self.pop_matrix()?;
        self.concat_matrix(matrix);

        Ok(())
    }
}

/// Paths
impl Interpreter {
    fn move_to(&mut self) -> PdfResult<()> {
        let point = self.pop_point()?;
        self.current_path.move_to(point);

        Ok(())
    }

    fn line_to(&mut self) -> PdfResult<()> {
        let point = self.pop_point()?;
        self.current_path.line_to(point);

        Ok(())
    }

    fn cubic_curve_to(&mut self) -> PdfResult<()> {
        let end = self.pop_point()?;
        let c2 = self.pop_point()?;
        let c1 = self.pop_point()?;

        self.current_path.cubic_curve_to(c1, c2, end);

        Ok(())
    }

    /// `v`: the first control point is the current point
    fn cubic_curve_to_current(&mut self) -> PdfResult<()> {
        let end = self.pop_point()?;
        let c2 = self.pop_point()?;
        let c1 = self.current_path.current_point().unwrap_or_else(Point::origin);

        self.current_path.cubic_curve_to(c1, c2, end);

        Ok(())
    }

    /// `y`: the second control point is the end point
    fn cubic_curve_to_end(&mut self) -> PdfResult<()> {
        let end = self.pop_point()?;
        let c1 = self.pop_point()?;

        self.current_path.cubic_curve_to(c1, end, end);

        Ok(())
    }

    fn append_rectangle(&mut self) -> PdfResult<()> {
        let height = self.pop_number()?;
        let width = self.pop_number()?;
        let y = self.pop_number()?;
        let x = self.pop_number()?;

        self.current_path.rect(x, y, width, height);

        Ok(())
    }

    /// Ends the path object, painting it and then applying any pending clip
    fn paint_path(&mut self, paint: PathPaint, close: bool) -> PdfResult<()> {
        if close {
            self.current_path.close_path();
        }

        let path = mem::take(&mut self.current_path);
        let paint = PathPaint {
            clip: self.pending_clip.take(),
            ..paint
        };

        if paint.clip.is_none() && (!paint.paints() || path.is_empty()) {
            return Ok(());
        }

        self.emit(DrawCommand::DrawPath(Arc::new(path), paint));

        Ok(())
    }
}

/// Text
impl Interpreter {
    fn begin_text(&mut self) {
        self.graphics_state.text_state.reinit();
        self.text_clip = None;
    }

    fn end_text(&mut self) {
        if let Some(clip) = self.text_clip.take() {
            self.emit(DrawCommand::DrawPath(
                Arc::new(clip),
                PathPaint::clip(FillRule::NonZero),
            ));
        }
    }

    fn set_font_and_size(&mut self) -> PdfResult<()> {
        let size = self.pop_number()?;
        let name = self.pop_name()?;

        let font = self.load_font(self.resource("Font", &name)?)?;

        let text_state = &mut self.graphics_state.text_state;
        text_state.font = Some(font);
        text_state.font_size = size;

        Ok(())
    }

    fn set_text_rendering_mode(&mut self) -> PdfResult<()> {
        let mode = TextRenderingMode::from_integer(self.pop_integer()?)?;
        self.graphics_state.text_state.rendering_mode = mode;

        Ok(())
    }

    fn move_text_position(&mut self) -> PdfResult<()> {
        let ty = self.pop_number()?;
        let tx = self.pop_number()?;

        self.graphics_state.text_state.next_line(tx, ty);

        Ok(())
    }

    fn move_text_position_and_set_leading(&mut self) -> PdfResult<()> {
        let ty = self.pop_number()?;
        let tx = self.pop_number()?;

        let text_state = &mut self.graphics_state.text_state;
        text_state.leading = -ty;
        text_state.next_line(tx, ty);

        Ok(())
    }

    fn set_text_matrix(&mut self) -> PdfResult<()> {
        let matrix = self.pop_matrix()?;

        let text_state = &mut self.graphics_state.text_state;
        text_state.text_matrix = matrix;
        text_state.text_line_matrix = matrix;

        Ok(())
    }

    fn next_line(&mut self) {
        let text_state = &mut self.graphics_state.text_state;
        let leading = text_state.leading;

        text_state.next_line(0.0, -leading);
    }

    /// Shows strings and applies `TJ` adjustments, which are thousandths of text space
    /// subtracted from the advance. Glyphs are positioned even when nothing is painted
    fn show_text(&mut self, elements: &[Object]) -> PdfResult<()> {
        let font = self
            .graphics_state
            .text_state
            .font
            .clone()
            .ok_or_else(|| PdfError::malformed("text shown before Tf"))?;

        let vertical = font.is_vertical();
        let mode = self.graphics_state.text_state.rendering_mode;
        let run_matrix = self.graphics_state.text_state.text_matrix;

        let mut shown = Vec::new();
        let mut glyphs = Vec::new();

        for element in elements {
            let text_state = &mut self.graphics_state.text_state;

            match element {
                Object::String(text) => {
                    shown.extend_from_slice(text.as_bytes());

                    for code in font.char_codes(text.as_bytes()) {
                        let glyph = font.glyph(code);

                        if !glyph.is_blank() {
                            glyphs.push(PlacedGlyph {
                                outline: Arc::clone(&glyph.outline),
                                transform: text_state.glyph_matrix(),
                            });
                        }

                        let mut spacing = text_state.character_spacing;
                        if font.is_word_space(code) {
                            spacing += text_state.word_spacing;
                        }

                        if vertical {
                            text_state.advance(0.0, glyph.advance.y * text_state.font_size + spacing);
                        } else {
                            text_state.advance(
                                (glyph.advance.x * text_state.font_size + spacing)
                                    * text_state.horizontal_scaling,
                                0.0,
                            );
                        }
                    }
                }
                other => match other.as_number() {
                    Some(adjustment) => {
                        let shift = -adjustment / 1000.0 * text_state.font_size;

                        if vertical {
                            text_state.advance(0.0, shift);
                        } else {
                            text_state.advance(shift * text_state.horizontal_scaling, 0.0);
                        }
                    }
                    None => log::warn!("ignoring {:?} in TJ array", other.object_type()),
                },
            }
        }

        if mode.clips() {
            let clip = self.text_clip.get_or_insert_with(Path::new);

            for glyph in &glyphs {
                clip.extend(&glyph.outline.transformed(glyph.transform));
            }
        }

        if (mode.fills() || mode.strokes()) && !glyphs.is_empty() {
            self.emit(DrawCommand::DrawText(Arc::new(TextRun {
                text: PdfString::new(shown),
                matrix: run_matrix,
                glyphs,
                fill: mode.fills(),
                stroke: mode.strokes(),
            })));
        }

        Ok(())
    }
}

/// Colour
impl Interpreter {
    fn set_color_space(&mut self, target: PaintTarget) -> PdfResult<()> {
        let name = self.pop_name()?;
        let color_space = self.color_space_by_name(&name)?;

        self.graphics_state.paint_mut(target).set_color_space(color_space);
        self.emit_paint(target);

        Ok(())
    }

    /// `sc`, `scn` and their stroking forms take as many operands as the colour space has
    /// components. A trailing pattern name is accepted, and patterns paint as a flat colour
    fn set_color(&mut self, target: PaintTarget) -> PdfResult<()> {
        let operands = mem::take(&mut self.operand_stack);

        let numbers = operands
            .iter()
            .filter_map(Object::as_number)
            .collect::<Vec<f32>>();

        let paint = self.graphics_state.paint_mut(target);

        if paint.color_space != ColorSpace::Pattern {
            let n = paint.color_space.components();

            if numbers.len() < n {
                return Err(PdfError::StackUnderflow);
            }

            paint.components = numbers[numbers.len() - n..].to_vec();
        }

        self.emit_paint(target);

        Ok(())
    }

    fn set_device_color(&mut self, target: PaintTarget, color_space: ColorSpace) -> PdfResult<()> {
        let n = color_space.components();

        let mut components = vec![0.0; n];
        for component in components.iter_mut().rev() {
            *component = self.pop_number()?;
        }

        let paint = self.graphics_state.paint_mut(target);
        paint.color_space = color_space;
        paint.components = components;

        self.emit_paint(target);

        Ok(())
    }
}

/// External objects
impl Interpreter {
    fn draw_xobject(&mut self) -> PdfResult<()> {
        let name = self.pop_name()?;
        let obj = self.resource("XObject", &name)?;
        let reference = obj.as_reference();

        if let Some(reference) = reference {
            let cached = lock(&self.context.shared.forms).get(&reference);

            if let Some(form) = cached {
                return self.begin_form(&form, FormSource::Indirect(reference));
            }
        }

        let stream = self.resolver().assert_stream(obj)?;

        match XObjectSubtype::of(&stream, self.resolver())? {
            XObjectSubtype::Image => self.draw_image(&stream),
            XObjectSubtype::Form => {
                let form = Arc::new(Form::from_stream(&stream, self.resolver())?);

                let source = match reference {
                    Some(reference) => {
                        lock(&self.context.shared.forms).insert(reference, Arc::clone(&form));
                        FormSource::Indirect(reference)
                    }
                    None => FormSource::Direct,
                };

                self.begin_form(&form, source)
            }
            XObjectSubtype::PostScript => {
                log::debug!("PostScript XObject /{} is not drawn", name);
                Ok(())
            }
        }
    }

    /// Image XObjects and inline images alike fill the unit square of user space
    fn draw_image(&mut self, stream: &Stream) -> PdfResult<()> {
        if !self.context.config.show_images {
            return Ok(());
        }

        let color_space = match stream.dict.get_object("ColorSpace", self.resolver())? {
            Some(Object::Name(name)) => Some(self.color_space_by_name(&name)?),
            Some(obj) => Some(ColorSpace::from_obj(obj, self.resolver())?),
            None => None,
        };

        let image = Image::decode(stream, color_space, self.resolver())?;
        self.emit(DrawCommand::DrawImage(Arc::new(image)));

        Ok(())
    }

    /// Splices the form's content into the command list, bracketed by a push and a pop, with
    /// the form matrix applied and its bounding box clipped to
    fn begin_form(&mut self, form: &Form, source: FormSource) -> PdfResult<()> {
        let depth = self.frames.len().saturating_sub(1);

        if depth >= self.context.config.max_form_depth {
            log::warn!("forms nested more than {} deep are not drawn", depth);
            return Ok(());
        }

        if let FormSource::Indirect(..) = source {
            if self.frames.iter().any(|frame| frame.form == Some(source)) {
                log::warn!("form invokes itself");
                return Ok(());
            }
        }

        self.save_graphics_state();

        if form.matrix != Matrix::identity() {
            self.concat_matrix(form.matrix);
        }

        let mut clip = Path::new();
        clip.rect(
            form.bbox.lower_left_x,
            form.bbox.lower_left_y,
            form.bbox.width(),
            form.bbox.height(),
        );
        self.emit(DrawCommand::DrawPath(
            Arc::new(clip),
            PathPaint::clip(FillRule::NonZero),
        ));

        let resources = match &form.resources {
            Some(resources) => Arc::new(resources.clone()),
            None => self.resources(),
        };

        self.frames.push(Frame {
            lexer: ContentLexer::new(form.content.clone()),
            resources,
            base_depth: self.graphics_state_stack.len(),
            form: Some(source),
        });

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        color::Color,
        resolve::NoResolve,
        task::{Gate, Watchable},
        test_util::{parse_object, PdfBuilder},
    };

    fn context(resolver: Arc<dyn Resolve + Send + Sync>) -> DocumentContext {
        DocumentContext {
            resolver,
            config: Arc::new(RenderConfig::default()),
            shared: Arc::new(SharedResources::default()),
        }
    }

    fn resources(src: &str) -> Dictionary {
        match parse_object(src.as_bytes()) {
            Object::Dictionary(dict) => dict,
            other => panic!("{:?}", other),
        }
    }

    fn interpret_with(
        content: &[u8],
        resources: Dictionary,
        context: DocumentContext,
    ) -> (Vec<DrawCommand>, TaskStatus, Arc<ContentDiagnostics>) {
        let commands = Arc::new(CommandList::new());
        let interpreter = Interpreter::new(
            Bytes::copy_from_slice(content),
            resources,
            context,
            Arc::clone(&commands),
        );
        let diagnostics = interpreter.diagnostics();

        let status = Watchable::new(interpreter).run(Gate::Unbounded);

        (commands.iter().cloned().collect(), status, diagnostics)
    }

    fn interpret(content: &[u8]) -> Vec<DrawCommand> {
        let (commands, status, _) = interpret_with(content, Dictionary::default(), context(Arc::new(NoResolve)));
        assert_eq!(status, TaskStatus::Completed);

        commands
    }

    #[test]
    fn save_transform_fill_restore() {
        let commands = Arc::new(CommandList::new());
        let task = Watchable::new(Interpreter::new(
            Bytes::from_static(b"q 1 0 0 1 10 20 cm 0 0 100 100 re f Q"),
            Dictionary::default(),
            context(Arc::new(NoResolve)),
            Arc::clone(&commands),
        ));

        // one operator per iteration, each leaving the operand stack empty
        while task.run(Gate::Iterations(1)) == TaskStatus::Paused {
            assert!(task.with_task(|interpreter| interpreter.operand_stack.is_empty()));
        }

        assert_eq!(task.status(), TaskStatus::Completed);
        assert!(commands.is_finished());

        let commands = commands.iter().collect::<Vec<_>>();
        assert_eq!(commands.len(), 4);

        assert!(matches!(commands[0], DrawCommand::Push));
        assert!(matches!(
            commands[1],
            DrawCommand::SetTransform(m) if *m == Matrix::new_translation(10.0, 20.0)
        ));
        match commands[2] {
            DrawCommand::DrawPath(path, paint) => {
                assert_eq!(*paint, PathPaint::fill(FillRule::NonZero));

                let bbox = path.bounding_box();
                assert_eq!((bbox.width(), bbox.height()), (100.0, 100.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(commands[3], DrawCommand::Pop));
    }

    #[test]
    fn leftover_operands_are_counted_and_cleared() {
        let (commands, status, diagnostics) = interpret_with(
            b"1 2 3 0 0 m 5 5 l S",
            Dictionary::default(),
            context(Arc::new(NoResolve)),
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(diagnostics.leftover_operands(), 1);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn failed_operators_do_not_stop_the_page() {
        let (commands, status, diagnostics) = interpret_with(
            b"0 0 100 re f 0 0 10 10 re f",
            Dictionary::default(),
            context(Arc::new(NoResolve)),
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(diagnostics.failed_operators(), 1);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn unknown_operators_are_skipped() {
        let (commands, status, diagnostics) = interpret_with(
            b"1 2 foo BX 3 bar EX 0.5 g",
            Dictionary::default(),
            context(Arc::new(NoResolve)),
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(diagnostics.unknown_operators(), 1);
        assert_eq!(diagnostics.leftover_operands(), 1);
        assert!(matches!(
            commands[..],
            [DrawCommand::SetPaint { target: PaintTarget::Fill, color }] if color == Color::gray(0.5)
        ));
    }

    #[test]
    fn clip_applies_after_painting() {
        let commands = interpret(b"0 0 10 10 re W n 0 0 5 5 re W* f");

        match &commands[..] {
            [DrawCommand::DrawPath(_, first), DrawCommand::DrawPath(_, second)] => {
                assert_eq!(*first, PathPaint::clip(FillRule::NonZero));
                assert_eq!(
                    *second,
                    PathPaint {
                        fill: Some(FillRule::NonZero),
                        stroke: false,
                        clip: Some(FillRule::EvenOdd)
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unbalanced_restore_is_ignored_and_saves_are_closed() {
        let commands = interpret(b"Q q q 2 w");

        assert!(matches!(
            commands[..],
            [
                DrawCommand::Push,
                DrawCommand::Push,
                DrawCommand::SetStrokeAttrs(..),
                DrawCommand::Pop,
                DrawCommand::Pop
            ]
        ));
    }

    #[test]
    fn colors() {
        let commands = interpret(b"1 0 0 RG 0 0 1 0 k /DeviceRGB cs 0 1 0 sc");

        let colors = commands
            .iter()
            .map(|command| match command {
                DrawCommand::SetPaint { target, color } => (*target, *color),
                other => panic!("unexpected {:?}", other),
            })
            .collect::<Vec<_>>();

        assert_eq!(
            colors,
            vec![
                (PaintTarget::Stroke, Color::rgb(1.0, 0.0, 0.0)),
                (PaintTarget::Fill, Color::cmyk(0.0, 0.0, 1.0, 0.0)),
                (PaintTarget::Fill, Color::BLACK),
                (PaintTarget::Fill, Color::rgb(0.0, 1.0, 0.0)),
            ]
        );
    }

    #[test]
    fn graphics_state_parameters() {
        let (commands, status, _) = interpret_with(
            b"/GS0 gs",
            resources("<< /ExtGState << /GS0 << /LW 3 /LC 1 /D [[2 1] 0] /ca 0.5 >> >> >>"),
            context(Arc::new(NoResolve)),
        );

        assert_eq!(status, TaskStatus::Completed);

        match &commands[..] {
            [DrawCommand::SetStrokeAttrs(attrs), DrawCommand::SetPaint { target, color }] => {
                assert_eq!(attrs.width, 3.0);
                assert_eq!(attrs.cap, LineCap::Round);
                assert_eq!(attrs.dash.array, vec![2.0, 1.0]);
                assert_eq!(*target, PaintTarget::Fill);
                assert_eq!(color.a, 0.5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    /// A non-embedded font where space is 250 units wide and `A` is 500
    fn font_resources() -> Dictionary {
        let widths = format!("250{} 500", " 0".repeat(32));

        resources(&format!(
            "<< /Font << /F1 << /Type /Font /Subtype /Type1 /BaseFont /Helvetica /FirstChar 32 /Widths [{}] >> >> >>",
            widths
        ))
    }

    fn final_text_matrix(content: &str) -> Matrix {
        let commands = Arc::new(CommandList::new());
        let task = Watchable::new(Interpreter::new(
            Bytes::copy_from_slice(content.as_bytes()),
            font_resources(),
            context(Arc::new(NoResolve)),
            commands,
        ));

        task.run(Gate::Unbounded);
        task.with_task(|interpreter| interpreter.graphics_state.text_state.text_matrix)
    }

    #[test]
    fn text_advances_without_glyph_programs() {
        let matrix = final_text_matrix("BT /F1 10 Tf 100 200 Td 2 Tw (A A) Tj ET");

        assert_eq!(matrix * Point::origin(), Point::new(100.0 + 5.0 + 2.5 + 2.0 + 5.0, 200.0));
    }

    #[test]
    fn tj_adjustments_are_subtracted() {
        let matrix = final_text_matrix("BT /F1 10 Tf 50 Tz [(A) 1000 (A)] TJ ET");

        assert_eq!(matrix * Point::origin(), Point::new((5.0 - 10.0 + 5.0) * 0.5, 0.0));
    }

    #[test]
    fn leading_moves_lines_down() {
        let matrix = final_text_matrix("BT /F1 10 Tf 0 100 Td 0 -14 TD (A) ' T* ET");

        assert_eq!(matrix * Point::origin(), Point::new(0.0, 100.0 - 14.0 * 3.0));
    }

    #[test]
    fn missing_font_is_an_operator_failure() {
        let (_, status, diagnostics) = interpret_with(
            b"BT /F9 12 Tf (x) Tj ET",
            Dictionary::default(),
            context(Arc::new(NoResolve)),
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(diagnostics.failed_operators(), 2);
    }

    #[test]
    fn forms_are_bracketed_and_cached() {
        let pdf = PdfBuilder::new()
            .object(1, "<< /Type /Catalog >>")
            .stream(
                2,
                "/Type /XObject /Subtype /Form /BBox [0 0 50 50] /Matrix [2 0 0 2 0 0]",
                b"q 0 0 10 10 re f",
            )
            .build();
        let store = Arc::new(pdf.store());
        let context = context(store);
        let shared = Arc::clone(&context.shared);

        let (commands, status, _) = interpret_with(
            b"/Fm0 Do /Fm0 Do",
            resources("<< /XObject << /Fm0 2 0 R >> >>"),
            context,
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(shared.cached_forms(), 1);

        // push, matrix, bbox clip, the form's own q and fill, two pops
        assert_eq!(commands.len(), 14);
        assert!(matches!(commands[0], DrawCommand::Push));
        assert!(matches!(commands[1], DrawCommand::SetTransform(m) if m.a == 2.0));
        assert!(matches!(
            commands[2],
            DrawCommand::DrawPath(_, paint) if paint == PathPaint::clip(FillRule::NonZero)
        ));
        assert!(matches!(commands[5], DrawCommand::Pop));
        assert!(matches!(commands[6], DrawCommand::Pop));
    }

    #[test]
    fn self_invoking_forms_stop() {
        let pdf = PdfBuilder::new()
            .object(1, "<< /Type /Catalog >>")
            .stream(
                2,
                "/Subtype /Form /BBox [0 0 50 50] /Resources << /XObject << /Me 2 0 R >> >>",
                b"/Me Do",
            )
            .build();

        let (commands, status, _) = interpret_with(
            b"/Me Do",
            resources("<< /XObject << /Me 2 0 R >> >>"),
            context(Arc::new(pdf.store())),
        );

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn inline_images() {
        let commands = interpret(b"q 10 0 0 10 0 0 cm BI /W 2 /H 1 /CS /G /BPC 8 ID \x00\xff EI Q");

        match &commands[..] {
            [DrawCommand::Push, DrawCommand::SetTransform(..), DrawCommand::DrawImage(image), DrawCommand::Pop] => {
                assert_eq!((image.width, image.height), (2, 1));
                assert_eq!(image.pixel(1, 0), [255, 255, 255, 255]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn text_clip_modes() {
        let commands = interpret(b"BT 7 Tr ET");
        assert!(commands.is_empty());
    }

    #[test]
    fn truncated_content_finishes_the_page() {
        let commands = Arc::new(CommandList::new());
        let task = Watchable::new(Interpreter::new(
            Bytes::from_static(b"q 0 0 1 1 re f ] Q"),
            Dictionary::default(),
            context(Arc::new(NoResolve)),
            Arc::clone(&commands),
        ));

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Error);
        assert!(commands.is_finished());
        // the unclosed q is popped
        assert!(matches!(commands.get(2), Some(DrawCommand::Pop)));
    }
}
