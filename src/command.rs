use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Condvar, Mutex,
    },
    time::Duration,
};

use once_cell::sync::OnceCell;

use crate::{
    color::Color,
    data_structures::Matrix,
    geometry::{BoundingBox, Path, Point},
    objects::PdfString,
    xobject::Image,
};

#[pdf_enum(Integer)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    ProjectingSquare = 2,
}

#[pdf_enum(Integer)]
pub enum LineJoin {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashPattern {
    pub array: Vec<f32>,
    pub phase: f32,
}

impl DashPattern {
    /// Patterns whose entries are all zero, or negative, draw solid lines
    pub fn is_solid(&self) -> bool {
        self.array.is_empty()
            || self.array.iter().any(|&d| d < 0.0)
            || self.array.iter().all(|&d| d == 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeAttrs {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: DashPattern,
}

impl Default for StrokeAttrs {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashPattern::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintTarget {
    Fill,
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

/// What a path painting operator does with the current path. A `clip` intersects the clip
/// region after painting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathPaint {
    pub fill: Option<FillRule>,
    pub stroke: bool,
    pub clip: Option<FillRule>,
}

impl PathPaint {
    pub fn fill(rule: FillRule) -> Self {
        Self {
            fill: Some(rule),
            ..Self::default()
        }
    }

    pub fn stroke() -> Self {
        Self {
            stroke: true,
            ..Self::default()
        }
    }

    pub fn clip(rule: FillRule) -> Self {
        Self {
            clip: Some(rule),
            ..Self::default()
        }
    }

    pub fn paints(&self) -> bool {
        self.fill.is_some() || self.stroke
    }
}

/// A glyph outline placed in user space
#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    pub outline: Arc<Path>,
    pub transform: Matrix,
}

#[derive(Debug, Clone)]
pub struct TextRun {
    /// The shown string, before decoding into glyphs
    pub text: PdfString,

    /// Text space to user space at the start of the run
    pub matrix: Matrix,

    pub glyphs: Vec<PlacedGlyph>,
    pub fill: bool,
    pub stroke: bool,
}

impl TextRun {
    /// Glyph outlines combined into one user space path
    pub fn to_path(&self) -> Path {
        let mut path = Path::new();

        for glyph in &self.glyphs {
            path.extend(&glyph.outline.transformed(glyph.transform));
        }

        path
    }
}

/// One step of a page's drawing. Paths and images are in the user space established by the
/// `SetTransform` commands before them
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Saves the transform, clip, stroke attributes and paints
    Push,
    Pop,

    /// Concatenated onto the current transform, as `cm` does
    SetTransform(Matrix),
    SetStrokeAttrs(StrokeAttrs),
    SetPaint {
        target: PaintTarget,
        color: Color,
    },
    DrawPath(Arc<Path>, PathPaint),

    /// The image fills the unit square of user space
    DrawImage(Arc<Image>),
    DrawText(Arc<TextRun>),
}

impl DrawCommand {
    /// Bounds in user space, for anything that marks the surface
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            DrawCommand::DrawPath(path, paint) if paint.paints() => Some(path.bounding_box()),
            DrawCommand::DrawImage(..) => Some(BoundingBox::from_points(
                Point::origin(),
                Point::new(1.0, 1.0),
            )),
            DrawCommand::DrawText(run) => Some(run.to_path().bounding_box()),
            _ => None,
        }
    }
}

const FIRST_SEGMENT_BITS: u32 = 5;
const MAX_SEGMENTS: usize = 26;

type Segment = Box<[OnceCell<DrawCommand>]>;

/// An append-only list with one writer and any number of readers
///
/// Commands are stored in segments that double in size and never move, so a reader can hold
/// a reference to a command while the writer keeps appending. The writer fills a slot before
/// publishing the new length, and readers only index below the length they observed
pub struct CommandList {
    segments: [OnceCell<Segment>; MAX_SEGMENTS],
    len: AtomicUsize,
    finished: AtomicBool,
    append: Mutex<()>,
    signal: Signal,
}

impl fmt::Debug for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandList")
            .field("len", &self.len())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an index to its segment and the offset within it. Segment `k` holds `32 << k` slots
fn locate(index: usize) -> (usize, usize) {
    let j = (index >> FIRST_SEGMENT_BITS) + 1;
    let segment = (usize::BITS - 1 - j.leading_zeros()) as usize;
    let start = ((1 << segment) - 1) << FIRST_SEGMENT_BITS;

    (segment, index - start)
}

impl CommandList {
    pub fn new() -> Self {
        Self {
            segments: Default::default(),
            len: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            append: Mutex::new(()),
            signal: Signal::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns false, dropping the command, once the list is finished or full
    pub fn push(&self, command: DrawCommand) -> bool {
        let _guard = self.append.lock().unwrap_or_else(|e| e.into_inner());

        if self.is_finished() {
            log::warn!("command appended to a finished page");
            return false;
        }

        let index = self.len.load(Ordering::Relaxed);
        let (segment, offset) = locate(index);

        if segment >= MAX_SEGMENTS {
            log::warn!("page has too many drawing commands");
            return false;
        }

        let slots = self.segments[segment].get_or_init(|| {
            (0..(1usize << (segment as u32 + FIRST_SEGMENT_BITS)))
                .map(|_| OnceCell::new())
                .collect()
        });

        if slots[offset].set(command).is_err() {
            return false;
        }

        self.len.store(index + 1, Ordering::Release);
        self.signal.notify();

        true
    }

    pub fn get(&self, index: usize) -> Option<&DrawCommand> {
        if index >= self.len() {
            return None;
        }

        let (segment, offset) = locate(index);

        self.segments.get(segment)?.get()?.get(offset)?.get()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        let len = self.len();
        (0..len).filter_map(move |i| self.get(i))
    }

    /// Marks the list complete. Happens once; later calls do nothing
    pub fn finish(&self) {
        let _guard = self.append.lock().unwrap_or_else(|e| e.into_inner());

        if !self.finished.swap(true, Ordering::AcqRel) {
            self.signal.notify();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Blocks until more than `seen` commands exist, the list is finished, or `timeout` passes
    pub fn wait_for_more(&self, seen: usize, timeout: Duration) {
        self.signal
            .wait_while(timeout, || self.len() <= seen && !self.is_finished());
    }
}

/// A change counter readers can sleep on
#[derive(Debug, Default)]
struct Signal {
    version: Mutex<u64>,
    changed: Condvar,
}

impl Signal {
    fn notify(&self) {
        let mut version = self.version.lock().unwrap_or_else(|e| e.into_inner());
        *version = version.wrapping_add(1);
        self.changed.notify_all();
    }

    fn wait_while(&self, timeout: Duration, mut condition: impl FnMut() -> bool) {
        let guard = self.version.lock().unwrap_or_else(|e| e.into_inner());

        let _ = self
            .changed
            .wait_timeout_while(guard, timeout, |_| condition());
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    #[test]
    fn segments_cover_every_index() {
        assert_eq!(locate(0), (0, 0));
        assert_eq!(locate(31), (0, 31));
        assert_eq!(locate(32), (1, 0));
        assert_eq!(locate(95), (1, 63));
        assert_eq!(locate(96), (2, 0));
    }

    #[test]
    fn append_then_read() {
        let list = CommandList::new();

        for i in 0..200 {
            assert!(list.push(DrawCommand::SetTransform(Matrix::new_translation(i as f32, 0.0))));
        }

        assert_eq!(list.len(), 200);

        match list.get(150) {
            Some(DrawCommand::SetTransform(m)) => assert_eq!(m.e, 150.0),
            other => panic!("unexpected {:?}", other),
        }

        assert!(list.get(200).is_none());
        assert_eq!(list.iter().count(), 200);
    }

    #[test]
    fn finish_is_monotonic() {
        let list = CommandList::new();
        assert!(!list.is_finished());

        list.finish();
        list.finish();

        assert!(list.is_finished());
        assert!(!list.push(DrawCommand::Push));
        assert!(list.is_empty());
    }

    #[test]
    fn reader_sees_commands_from_another_thread() {
        let list = Arc::new(CommandList::new());
        let writer = Arc::clone(&list);

        let handle = thread::spawn(move || {
            for _ in 0..1000 {
                writer.push(DrawCommand::Push);
                writer.push(DrawCommand::Pop);
            }
            writer.finish();
        });

        let mut seen = 0;

        while !(list.is_finished() && seen == list.len()) {
            let len = list.len();

            for i in seen..len {
                assert!(list.get(i).is_some());
            }

            seen = len;
            list.wait_for_more(seen, Duration::from_millis(50));
        }

        handle.join().unwrap();
        assert_eq!(seen, 2000);
    }
}
