use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    cache::Cache,
    command::CommandList,
    content::content_bytes,
    data_structures::Rectangle,
    error::{PdfError, PdfResult},
    interpret::{ContentDiagnostics, DocumentContext, Interpreter},
    objects::{Dictionary, Object, Reference},
    render::{page_to_device, Damage, IntRect, Pixmap, Renderer},
    task::{Gate, TaskStatus, Watchable},
    Resolve,
};

/// Page trees nested deeper than this are assumed to contain a cycle
const MAX_TREE_DEPTH: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Attributes a page takes from its nearest ancestor that has them
#[derive(Debug, Clone, Default)]
pub(crate) struct InheritablePageFields {
    resources: Option<Dictionary>,
    media_box: Option<Rectangle>,
    crop_box: Option<Rectangle>,
    rotate: Option<i32>,
}

impl InheritablePageFields {
    pub fn from_dict(dict: &Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        Ok(Self {
            resources: dict.get_dict("Resources", resolver)?,
            media_box: dict.get_typed("MediaBox", resolver).unwrap_or_else(|err| {
                log::warn!("unusable /MediaBox: {}", err);
                None
            }),
            crop_box: dict.get_typed("CropBox", resolver).unwrap_or_else(|err| {
                log::warn!("unusable /CropBox: {}", err);
                None
            }),
            rotate: dict.get_integer("Rotate", resolver)?,
        })
    }

    /// Fields of a child node, falling back to this node's for whatever the child lacks
    fn inherit(&self, child: InheritablePageFields) -> InheritablePageFields {
        InheritablePageFields {
            resources: child.resources.or_else(|| self.resources.clone()),
            media_box: child.media_box.or(self.media_box),
            crop_box: child.crop_box.or(self.crop_box),
            rotate: child.rotate.or(self.rotate),
        }
    }
}

/// A page dictionary with every inherited attribute filled in
#[derive(Debug, Clone)]
pub struct PageObject {
    /// `None` for a page written directly in its parent's `/Kids`
    pub reference: Option<Reference>,

    /// Falls back to US letter when neither the page nor an ancestor has one
    pub media_box: Rectangle,

    /// The visible region, within the media box
    pub crop_box: Rectangle,

    /// Degrees clockwise, a multiple of 90 in `0..360`
    pub rotate: i32,

    pub resources: Dictionary,

    /// The raw `/Contents`, a stream or an array of streams
    contents: Option<Object>,
}

impl PageObject {
    fn new(
        reference: Option<Reference>,
        dict: &Dictionary,
        fields: InheritablePageFields,
    ) -> Self {
        let media_box = fields.media_box.unwrap_or_else(Rectangle::letter);
        let crop_box = fields
            .crop_box
            .and_then(|crop| crop.intersect(&media_box))
            .unwrap_or(media_box);

        let rotate = fields.rotate.unwrap_or(0);

        if rotate % 90 != 0 {
            log::warn!("/Rotate {} is not a multiple of 90", rotate);
        }

        Self {
            reference,
            media_box,
            crop_box,
            rotate: (rotate - rotate % 90).rem_euclid(360),
            resources: fields.resources.unwrap_or_default(),
            contents: dict.get("Contents").cloned(),
        }
    }

    /// The decoded content stream. A page without one is empty
    pub fn content(&self, resolver: &dyn Resolve) -> PdfResult<bytes::Bytes> {
        match &self.contents {
            Some(contents) => content_bytes(contents.clone(), resolver),
            None => Ok(bytes::Bytes::new()),
        }
    }

    /// Width and height as displayed, after rotation
    pub fn display_size(&self) -> (f32, f32) {
        match self.rotate {
            90 | 270 => (self.crop_box.height(), self.crop_box.width()),
            _ => (self.crop_box.width(), self.crop_box.height()),
        }
    }
}

/// The document's `/Pages` tree
#[derive(Debug, Clone)]
pub struct PageTree {
    root: Dictionary,
    count: usize,
}

enum PageNode {
    Node(Dictionary),
    Leaf(Dictionary),
}

impl PageNode {
    fn classify(dict: Dictionary) -> Self {
        let is_node = match dict.get("Type").and_then(Object::as_name) {
            Some("Pages") => true,
            Some("Page") => false,
            _ => dict.contains_key("Kids"),
        };

        if is_node {
            PageNode::Node(dict)
        } else {
            PageNode::Leaf(dict)
        }
    }
}

impl PageTree {
    pub fn from_catalog(catalog: &Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        let root = catalog
            .get_dict("Pages", resolver)?
            .ok_or_else(|| PdfError::malformed("catalog has no /Pages"))?;

        let count = match root.get_integer("Count", resolver)? {
            Some(count) if count >= 0 => count as usize,
            _ => {
                log::warn!("page tree has no usable /Count");
                0
            }
        };

        Ok(Self { root, count })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Finds a page by its 1-based number, skipping whole subtrees by their `/Count`
    pub fn page(&self, number: usize, resolver: &dyn Resolve) -> PdfResult<PageObject> {
        if number == 0 || number > self.count {
            return Err(PdfError::PageOutOfRange {
                page: number,
                page_count: self.count,
            });
        }

        let mut index = number - 1;
        let mut node = self.root.clone();
        let mut fields = InheritablePageFields::from_dict(&node, resolver)?;

        'descend: for _ in 0..MAX_TREE_DEPTH {
            let kids = node.get_arr("Kids", resolver)?.unwrap_or_default();

            for kid in kids {
                let reference = kid.as_reference();

                let dict = match resolver.resolve(kid)? {
                    Object::Dictionary(dict) => dict,
                    found => {
                        log::warn!("page tree kid is a {:?}", found.object_type());
                        continue;
                    }
                };

                match PageNode::classify(dict) {
                    PageNode::Node(dict) => {
                        let count = dict.get_integer("Count", resolver)?.unwrap_or(0).max(0) as usize;

                        if index < count {
                            fields = fields.inherit(InheritablePageFields::from_dict(&dict, resolver)?);
                            node = dict;
                            continue 'descend;
                        }

                        index -= count;
                    }
                    PageNode::Leaf(dict) => {
                        if index == 0 {
                            let fields = fields.inherit(InheritablePageFields::from_dict(&dict, resolver)?);
                            return Ok(PageObject::new(reference, &dict, fields));
                        }

                        index -= 1;
                    }
                }
            }

            break;
        }

        Err(PdfError::malformed(format!(
            "page {} is counted but missing from the page tree",
            number
        )))
    }

    /// Page numbers of every page object reachable by reference, for resolving destinations
    pub fn page_numbers(&self, resolver: &dyn Resolve) -> HashMap<Reference, usize> {
        let mut numbers = HashMap::new();
        let mut visited = HashSet::new();
        let mut next = 1;

        self.walk(&self.root, resolver, 0, &mut visited, &mut |reference| {
            if let Some(reference) = reference {
                numbers.insert(reference, next);
            }
            next += 1;
        });

        numbers
    }

    fn walk(
        &self,
        node: &Dictionary,
        resolver: &dyn Resolve,
        depth: usize,
        visited: &mut HashSet<Reference>,
        leaf: &mut dyn FnMut(Option<Reference>),
    ) {
        if depth > MAX_TREE_DEPTH {
            log::warn!("page tree deeper than {} levels", MAX_TREE_DEPTH);
            return;
        }

        let kids = match node.get_arr("Kids", resolver) {
            Ok(kids) => kids.unwrap_or_default(),
            Err(err) => {
                log::warn!("unusable /Kids: {}", err);
                return;
            }
        };

        for kid in kids {
            let reference = kid.as_reference();

            if let Some(reference) = reference {
                if !visited.insert(reference) {
                    log::warn!("page tree revisits {}", reference);
                    continue;
                }
            }

            match resolver.resolve(kid) {
                Ok(Object::Dictionary(dict)) => match PageNode::classify(dict) {
                    PageNode::Node(dict) => self.walk(&dict, resolver, depth + 1, visited, leaf),
                    PageNode::Leaf(..) => leaf(reference),
                },
                Ok(..) => {}
                Err(err) => log::warn!("unreadable page tree kid: {}", err),
            }
        }
    }
}

/// Identifies a rendering of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ImageKey {
    width: u32,
    height: u32,
    clip: Option<[u32; 4]>,
    background: bool,
}

impl ImageKey {
    fn new(width: u32, height: u32, clip: Option<Rectangle>, background: bool) -> Self {
        Self {
            width,
            height,
            clip: clip.map(|r| {
                [
                    r.lower_left_x.to_bits(),
                    r.lower_left_y.to_bits(),
                    r.upper_right_x.to_bits(),
                    r.upper_right_y.to_bits(),
                ]
            }),
            background,
        }
    }
}

/// A page rendered, or being rendered, into a pixmap
///
/// The renderer holds the pixmap weakly. Dropping every handle to the image stops it
pub struct RenderedImage {
    pixmap: Arc<Mutex<Pixmap>>,
    task: Arc<Watchable<Renderer>>,
    damage: Arc<Damage>,
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl RenderedImage {
    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    /// Blocks until rendering ends
    pub fn wait(&self) -> TaskStatus {
        self.task.wait()
    }

    pub fn stop(&self) {
        self.task.stop();
    }

    /// Locks the pixmap. A renderer running on another thread waits until the guard drops
    pub fn pixmap(&self) -> MutexGuard<'_, Pixmap> {
        lock(&self.pixmap)
    }

    /// Regions repainted since the last call
    pub fn take_damage(&self) -> Vec<IntRect> {
        self.damage.take()
    }

    /// Commands replayed and commands that failed
    pub fn progress(&self) -> (usize, usize) {
        self.task.with_task(|renderer| (renderer.cursor(), renderer.failures()))
    }
}

/// A page whose content is being interpreted into draw commands
pub struct Page {
    number: usize,
    object: PageObject,
    context: DocumentContext,
    commands: Arc<CommandList>,
    interpreter: Arc<Watchable<Interpreter>>,
    diagnostics: Arc<ContentDiagnostics>,
    images: Mutex<Cache<ImageKey, Arc<RenderedImage>>>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("number", &self.number)
            .field("object", &self.object)
            .field("status", &self.status())
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl Page {
    /// Starts interpreting the page, on a worker thread when the configuration allows, and
    /// otherwise to completion before returning
    pub(crate) fn open(number: usize, object: PageObject, context: DocumentContext) -> PdfResult<Self> {
        let content = object.content(&*context.resolver)?;

        log::debug!("page {}: {} bytes of content", number, content.len());

        let commands = Arc::new(CommandList::new());
        let interpreter = Interpreter::new(
            content,
            object.resources.clone(),
            context.clone(),
            Arc::clone(&commands),
        );
        let diagnostics = interpreter.diagnostics();
        let interpreter = Watchable::new(interpreter);

        if context.config.threaded {
            // the handle is dropped; status is observed through the watchable
            let _ = interpreter.go();
        } else {
            interpreter.run(Gate::Unbounded);
        }

        let images = Mutex::new(Cache::new(context.config.image_cache_capacity));

        Ok(Self {
            number,
            object,
            context,
            commands,
            interpreter,
            diagnostics,
            images,
        })
    }

    /// 1-based
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn object(&self) -> &PageObject {
        &self.object
    }

    pub fn media_box(&self) -> Rectangle {
        self.object.media_box
    }

    pub fn crop_box(&self) -> Rectangle {
        self.object.crop_box
    }

    pub fn rotation(&self) -> i32 {
        self.object.rotate
    }

    pub fn commands(&self) -> &Arc<CommandList> {
        &self.commands
    }

    pub fn diagnostics(&self) -> &ContentDiagnostics {
        &self.diagnostics
    }

    /// Status of the content stream interpreter
    pub fn status(&self) -> TaskStatus {
        self.interpreter.status()
    }

    /// Blocks until every draw command has been produced, or interpretation ended early
    pub fn wait(&self) -> TaskStatus {
        self.interpreter.wait()
    }

    /// Like [`Page::wait`], giving up after `timeout`
    pub fn wait_for(&self, timeout: Duration) -> TaskStatus {
        self.interpreter.wait_until(timeout, TaskStatus::is_terminal)
    }

    /// Renders the `clip` rectangle of the page, in default user space, or the crop box, into
    /// a `width` by `height` pixmap. Renderings are cached by their arguments
    ///
    /// With `draw_background` the pixmap starts out white, and otherwise transparent. Without
    /// `wait`, a threaded configuration returns while rendering continues
    pub fn get_image(
        &self,
        width: u32,
        height: u32,
        clip: Option<Rectangle>,
        draw_background: bool,
        wait: bool,
    ) -> Arc<RenderedImage> {
        let key = ImageKey::new(width, height, clip, draw_background);

        let cached = lock(&self.images).get(&key);

        let image = match cached {
            Some(image) if image.status() != TaskStatus::Stopped => image,
            _ => {
                let image = Arc::new(self.start_render(width, height, clip, draw_background));
                lock(&self.images).insert(key, Arc::clone(&image));
                image
            }
        };

        if wait {
            image.wait();
        }

        image
    }

    fn start_render(
        &self,
        width: u32,
        height: u32,
        clip: Option<Rectangle>,
        draw_background: bool,
    ) -> RenderedImage {
        let pixmap = if draw_background {
            Pixmap::filled(width, height, crate::color::Color::WHITE)
        } else {
            Pixmap::new(width, height)
        };
        let pixmap = Arc::new(Mutex::new(pixmap));

        let base = page_to_device(
            clip.unwrap_or(self.object.crop_box),
            self.object.rotate,
            width,
            height,
        );

        let renderer = Renderer::new(
            Arc::clone(&self.commands),
            &pixmap,
            base,
            &self.context.config,
        );
        let damage = renderer.damage();
        let task = Watchable::new(renderer);

        log::debug!("page {}: rendering at {}x{}", self.number, width, height);

        if self.context.config.threaded {
            let _ = task.go();
        } else {
            // the commands are complete unless interpretation was stopped part way
            if task.run(Gate::Unbounded) == TaskStatus::NeedsData {
                task.stop();
            }
        }

        RenderedImage {
            pixmap,
            task,
            damage,
        }
    }

    /// Forgets a cached rendering. It carries on for as long as someone holds it
    pub fn evict_image(&self, width: u32, height: u32, clip: Option<Rectangle>, draw_background: bool) {
        lock(&self.images).evict(&ImageKey::new(width, height, clip, draw_background));
    }

    /// Keeps only the cached renderings of the given sizes
    pub fn retain_images(&self, mut keep: impl FnMut(u32, u32) -> bool) {
        lock(&self.images).retain(|key, _| keep(key.width, key.height));
    }

    pub fn cached_images(&self) -> usize {
        lock(&self.images).len()
    }

    /// Stops interpretation and every rendering. Renderings keep whatever they had drawn
    pub fn stop(&self) {
        self.interpreter.stop();

        // wait out an operator in progress, then let readers see the end of the list
        self.interpreter.with_task(|_| ());
        self.commands.finish();

        let mut images = lock(&self.images);

        for key in images.keys() {
            if let Some(image) = images.get(&key) {
                image.stop();
            }
        }
    }
}
