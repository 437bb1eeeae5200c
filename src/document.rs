use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;

use crate::{
    cache::Cache,
    config::RenderConfig,
    encryption::SecurityHandler,
    error::{PdfError, PdfResult},
    info::Info,
    interpret::{DocumentContext, SharedResources},
    lex::PdfVersion,
    objects::{Dictionary, Object},
    outline::{OutlineItem, OutlineReader},
    page::{Page, PageTree},
    store::Store,
    task::TaskStatus,
    trailer::Trailer,
    xref::XrefParser,
    FromObj, Resolve,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An open PDF file
///
/// Pages are parsed on demand and kept in a small cache. Every page shares the document's
/// object store, fonts and forms, and may be used from any thread
pub struct Document {
    store: Arc<Store>,
    trailer: Trailer,
    catalog: Dictionary,
    pages: PageTree,
    security: Option<Arc<SecurityHandler>>,
    config: Arc<RenderConfig>,
    shared: Arc<SharedResources>,
    page_cache: Mutex<Cache<usize, Arc<Page>>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version())
            .field("page_count", &self.page_count())
            .field("encrypted", &self.is_encrypted())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Opens a document with the default configuration
    ///
    /// Encrypted documents are opened with `password`, which may be either the user or the owner
    /// password. Without one the empty user password is tried, and `AuthenticationRequired`
    /// returned if that fails
    pub fn open(bytes: impl Into<Bytes>, password: Option<&[u8]>) -> PdfResult<Self> {
        Self::open_with_config(bytes, password, RenderConfig::default())
    }

    pub fn open_with_config(
        bytes: impl Into<Bytes>,
        password: Option<&[u8]>,
        config: RenderConfig,
    ) -> PdfResult<Self> {
        let bytes = bytes.into();

        let parsed = XrefParser::new(bytes.clone()).read_xref()?;
        let trailer = parsed.trailer;

        log::debug!(
            "cross-reference table: {} entries, /Size {}",
            parsed.xref.len(),
            trailer.size
        );

        let store = Arc::new(Store::new(bytes, parsed.xref, trailer.size, &config));

        let security = match &trailer.encrypt {
            Some(encrypt) => {
                let dict = store.assert_dict(encrypt.clone())?;
                let handler = SecurityHandler::new(&dict, trailer.first_id(), password, &*store)?;
                let handler = Arc::new(handler);

                store.set_security(Arc::clone(&handler));

                Some(handler)
            }
            None => None,
        };

        let root = trailer
            .root
            .ok_or_else(|| PdfError::malformed("trailer has no /Root"))?;
        let catalog = store.assert_dict(Object::Reference(root))?;
        let pages = PageTree::from_catalog(&catalog, &*store)?;

        log::debug!("{} pages", pages.count());

        let page_cache = Mutex::new(Cache::new(config.page_cache_capacity));

        Ok(Self {
            store,
            trailer,
            catalog,
            pages,
            security,
            config: Arc::new(config),
            shared: Arc::new(SharedResources::default()),
            page_cache,
        })
    }

    pub fn version(&self) -> Option<PdfVersion> {
        self.store.version()
    }

    pub fn page_count(&self) -> usize {
        self.pages.count()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Opens page `number`, counting from 1, or returns it from the cache. Parsing the page's
    /// content continues in the background unless `wait` is set
    pub fn get_page(&self, number: usize, wait: bool) -> PdfResult<Arc<Page>> {
        let cached = lock(&self.page_cache).get(&number);

        let page = match cached {
            Some(page) if page.status() != TaskStatus::Stopped => page,
            _ => {
                let object = self.pages.page(number, &*self.store)?;
                let page = Arc::new(Page::open(number, object, self.context())?);

                lock(&self.page_cache).insert(number, Arc::clone(&page));

                page
            }
        };

        if wait {
            page.wait();
        }

        Ok(page)
    }

    fn context(&self) -> DocumentContext {
        DocumentContext {
            resolver: Arc::clone(&self.store) as Arc<dyn Resolve + Send + Sync>,
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stops parsing and rendering of a cached page. Returns false when the page isn't cached
    pub fn stop(&self, number: usize) -> bool {
        let page = lock(&self.page_cache).get(&number);

        match page {
            Some(page) => {
                page.stop();
                true
            }
            None => false,
        }
    }

    /// Stops every cached page
    pub fn stop_all(&self) {
        let pages = {
            let mut cache = lock(&self.page_cache);
            cache
                .keys()
                .into_iter()
                .filter_map(|number| cache.get(&number))
                .collect::<Vec<_>>()
        };

        for page in pages {
            page.stop();
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.security.is_some()
    }

    /// Whether the document may be printed. Always true when unencrypted
    pub fn is_printable(&self) -> bool {
        self.security.as_ref().map_or(true, |s| s.is_printable())
    }

    /// Whether the document may be modified and saved. Always true when unencrypted
    pub fn is_saveable(&self) -> bool {
        self.security.as_ref().map_or(true, |s| s.is_saveable())
    }

    /// The information dictionary. Empty when the document has none
    pub fn info(&self) -> PdfResult<Info> {
        match self.trailer.info {
            Some(info) => Info::from_obj(Object::Reference(info), &*self.store),
            None => Ok(Info::default()),
        }
    }

    /// The document outline, or bookmarks
    pub fn outline(&self) -> PdfResult<Vec<OutlineItem>> {
        let page_numbers = self.pages.page_numbers(&*self.store);

        OutlineReader::new(&self.catalog, page_numbers, &*self.store).read()
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Drops a page from the cache. Anyone still holding it may keep using it
    pub fn evict_page(&self, number: usize) {
        lock(&self.page_cache).evict(&number);
    }

    pub fn retain_pages(&self, mut keep: impl FnMut(usize) -> bool) {
        lock(&self.page_cache).retain(|&number, _| keep(number));
    }

    pub fn cached_pages(&self) -> usize {
        lock(&self.page_cache).len()
    }

    /// Empties every cache: pages, objects, object streams, fonts and forms
    pub fn clear_caches(&self) {
        lock(&self.page_cache).clear();
        self.store.clear_caches();
        self.shared.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        data_structures::Rectangle,
        encryption::test::{encrypt_rc4, standard_dict, FILE_ID},
        objects::Reference,
        test_util::{single_page, PdfBuilder},
    };

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn string_entry(dict: &Dictionary, key: &str) -> Vec<u8> {
        match dict.get(key) {
            Some(Object::String(s)) => s.as_bytes().to_vec(),
            other => panic!("/{} is {:?}", key, other),
        }
    }

    const CONTENT: &[u8] = b"0 0 1 rg 0 0 200 100 re f";

    /// A one page document encrypted with RC4, whose page content is encrypted as a writer would
    fn encrypted(user: &[u8], owner: &[u8], permissions: i32) -> Bytes {
        let dict = standard_dict(3, user, owner, permissions);
        let handler = SecurityHandler::new(&dict, FILE_ID, Some(owner), &crate::resolve::NoResolve).unwrap();

        let content = encrypt_rc4(&handler, Reference::new(4, 0), CONTENT);

        PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(
                3,
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] /Contents 4 0 R >>",
            )
            .stream(4, "", &content)
            .trailer(&format!(
                "/Encrypt << /Filter /Standard /V 2 /R 3 /Length 128 /P {} /O <{}> /U <{}> >> /ID [<{}> <{}>]",
                permissions,
                hex(&string_entry(&dict, "O")),
                hex(&string_entry(&dict, "U")),
                hex(FILE_ID),
                hex(FILE_ID),
            ))
            .build()
            .bytes
    }

    fn sync_config() -> RenderConfig {
        RenderConfig::default().with_threaded(false)
    }

    #[test]
    fn opens_and_renders_a_page() {
        let doc = Document::open(single_page("0 1 0 rg 0 0 100 100 re f").bytes, None).unwrap();

        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.version(), Some(PdfVersion { major: 1, minor: 7 }));
        assert!(!doc.is_encrypted());
        assert!(doc.is_printable() && doc.is_saveable());

        let page = doc.get_page(1, true).unwrap();
        assert_eq!(page.status(), TaskStatus::Completed);
        assert_eq!(page.media_box(), Rectangle::new(0.0, 0.0, 200.0, 100.0));

        let image = page.get_image(200, 100, None, true, true);
        assert_eq!(image.status(), TaskStatus::Completed);
        assert_eq!(image.pixmap().pixel(50, 50), [0, 255, 0, 255]);
        assert_eq!(image.pixmap().pixel(150, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn pages_are_cached() {
        let doc = Document::open_with_config(single_page("").bytes, None, sync_config()).unwrap();

        let first = doc.get_page(1, false).unwrap();
        let again = doc.get_page(1, false).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(doc.cached_pages(), 1);

        doc.evict_page(1);
        assert_eq!(doc.cached_pages(), 0);

        let reopened = doc.get_page(1, false).unwrap();
        assert!(!Arc::ptr_eq(&first, &reopened));

        doc.clear_caches();
        assert_eq!(doc.cached_pages(), 0);
        assert_eq!(doc.store().cached_objects(), 0);
    }

    #[test]
    fn out_of_range_pages() {
        let doc = Document::open(single_page("").bytes, None).unwrap();

        assert!(matches!(
            doc.get_page(2, true),
            Err(PdfError::PageOutOfRange {
                page: 2,
                page_count: 1
            })
        ));
        assert!(!doc.stop(2));
    }

    #[test]
    fn stopped_pages_are_reopened() {
        let doc = Document::open(single_page("0 0 10 10 re f").bytes, None).unwrap();

        let page = doc.get_page(1, true).unwrap();
        assert!(doc.stop(1));

        let reopened = doc.get_page(1, true).unwrap();
        assert_eq!(reopened.status(), TaskStatus::Completed);

        // a page that had already completed stays completed
        assert_eq!(page.status(), TaskStatus::Completed);
    }

    #[test]
    fn encrypted_with_user_and_owner_passwords() {
        let bytes = encrypted(b"user", b"owner", -4);

        for password in [&b"user"[..], b"owner"] {
            let doc = Document::open_with_config(bytes.clone(), Some(password), sync_config()).unwrap();
            assert!(doc.is_encrypted());

            let page = doc.get_page(1, true).unwrap();
            assert_eq!(page.status(), TaskStatus::Completed);
            assert_eq!(page.commands().len(), 2);
            assert_eq!(page.diagnostics().unknown_operators(), 0);

            let image = page.get_image(20, 10, None, false, true);
            assert_eq!(image.pixmap().pixel(10, 5), [0, 0, 255, 255]);
        }
    }

    #[test]
    fn encrypted_without_the_right_password() {
        let bytes = encrypted(b"user", b"owner", -4);

        assert!(matches!(
            Document::open(bytes.clone(), None),
            Err(PdfError::AuthenticationRequired)
        ));
        assert!(matches!(
            Document::open(bytes, Some(b"guess")),
            Err(PdfError::AuthenticationFailed)
        ));
    }

    #[test]
    fn empty_user_password_and_permissions() {
        // printing allowed, saving denied
        let doc = Document::open(encrypted(b"", b"owner", !16), None).unwrap();

        assert!(doc.is_encrypted());
        assert!(doc.is_printable());
        assert!(!doc.is_saveable());
    }

    #[test]
    fn metadata_and_outline() {
        let bytes = PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R /Outlines 5 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(3, "<< /Type /Page /Parent 2 0 R >>")
            .object(4, "<< /Title (Report) /Producer (test) >>")
            .object(5, "<< /First 6 0 R >>")
            .object(6, "<< /Title (Start) /Dest [3 0 R /Fit] >>")
            .trailer("/Info 4 0 R")
            .build()
            .bytes;

        let doc = Document::open(bytes, None).unwrap();

        let info = doc.info().unwrap();
        assert_eq!(info.title.as_deref(), Some("Report"));
        assert_eq!(info.producer.as_deref(), Some("test"));
        assert_eq!(info.author, None);

        let outline = doc.outline().unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Start");
        assert_eq!(outline[0].page, Some(1));
    }

    #[test]
    fn missing_info_is_empty() {
        let doc = Document::open(single_page("").bytes, None).unwrap();

        assert!(doc.info().unwrap().is_empty());
        assert!(doc.outline().unwrap().is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Document::open(&b"not a pdf at all"[..], None).is_err());
    }
}
