//! A PDF parser and incremental rasterizer
//!
//! [`Document::open`] reads the cross-reference table and trailer; objects are parsed lazily
//! as pages ask for them. [`Document::get_page`] starts interpreting a page's content stream
//! into [`DrawCommand`]s, and [`Page::get_image`] replays those commands into a [`Pixmap`],
//! while interpretation may still be in progress

#[macro_use]
extern crate pdf_macro;

pub use crate::{
    color::Color,
    command::{CommandList, DrawCommand, FillRule, LineCap, LineJoin, PathPaint, StrokeAttrs},
    config::{FontSubstitution, RenderConfig},
    data_structures::{Matrix, Rectangle},
    document::Document,
    error::{PdfError, PdfResult, UnsupportedEncryption},
    geometry::{Path, Point},
    info::Info,
    interpret::ContentDiagnostics,
    lex::PdfVersion,
    objects::{Dictionary, Object, ObjectType, PdfString, Reference},
    outline::OutlineItem,
    page::{Page, PageObject, RenderedImage},
    render::{page_to_device, IntRect, Pixmap},
    resolve::{FromObj, Resolve},
    store::Store,
    task::TaskStatus,
    trailer::Trailer,
};

mod cache;
mod color;
mod command;
mod config;
mod content;
mod data_structures;
mod document;
mod encryption;
mod error;
mod filter;
mod font;
mod geometry;
mod info;
mod interpret;
mod lex;
mod object_stream;
mod objects;
mod outline;
mod page;
mod parse_binary;
mod render;
mod resolve;
mod store;
mod stream;
mod task;
mod trailer;
mod xobject;
mod xref;

#[cfg(test)]
mod test_util;
