use std::{path::PathBuf, time::Duration};

/// Where glyph programs come from when a font is not embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSubstitution {
    /// Non-embedded fonts draw nothing, but still advance the text position
    Disabled,

    /// Look for `<BaseFont>.ttf`, `.otf` or `.cff` in a directory
    Directory(PathBuf),
}

/// Options fixed for the lifetime of a document and everything opened from it
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub font_substitution: FontSubstitution,
    pub anti_alias: bool,
    pub show_images: bool,

    /// Parse and render on worker threads. Otherwise work runs in the calling thread
    pub threaded: bool,

    pub object_cache_capacity: usize,
    pub object_stream_cache_capacity: usize,
    pub page_cache_capacity: usize,
    pub image_cache_capacity: usize,

    /// Minimum time between dirty-region notifications from a renderer
    pub notify_interval: Duration,

    /// How deeply form XObjects may invoke one another
    pub max_form_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_substitution: FontSubstitution::Disabled,
            anti_alias: true,
            show_images: true,
            threaded: true,
            object_cache_capacity: 4096,
            object_stream_cache_capacity: 16,
            page_cache_capacity: 8,
            image_cache_capacity: 4,
            notify_interval: Duration::from_millis(200),
            max_form_depth: 12,
        }
    }
}

impl RenderConfig {
    pub fn with_font_substitution(mut self, font_substitution: FontSubstitution) -> Self {
        self.font_substitution = font_substitution;
        self
    }

    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    pub fn with_show_images(mut self, show_images: bool) -> Self {
        self.show_images = show_images;
        self
    }

    pub fn with_threaded(mut self, threaded: bool) -> Self {
        self.threaded = threaded;
        self
    }

    pub fn with_object_cache_capacity(mut self, capacity: usize) -> Self {
        self.object_cache_capacity = capacity;
        self
    }

    pub fn with_object_stream_cache_capacity(mut self, capacity: usize) -> Self {
        self.object_stream_cache_capacity = capacity;
        self
    }

    pub fn with_page_cache_capacity(mut self, capacity: usize) -> Self {
        self.page_cache_capacity = capacity;
        self
    }

    pub fn with_image_cache_capacity(mut self, capacity: usize) -> Self {
        self.image_cache_capacity = capacity;
        self
    }

    pub fn with_notify_interval(mut self, notify_interval: Duration) -> Self {
        self.notify_interval = notify_interval;
        self
    }

    pub fn with_max_form_depth(mut self, max_form_depth: usize) -> Self {
        self.max_form_depth = max_form_depth;
        self
    }
}
