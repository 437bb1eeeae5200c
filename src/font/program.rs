use std::{fmt, fs, path::Path as FsPath};

use anyhow::Context;
use bytes::Bytes;

use crate::{
    config::{FontSubstitution, RenderConfig},
    Resolve,
};

use super::{
    cff::CffFont,
    descriptor::{FontFile, FontFile3Subtype},
    true_type::TrueTypeFont,
    OutlineSource,
};

/// The glyph outlines behind a font, resolved once when the font is loaded
pub(crate) enum FontProgram {
    TrueType(TrueTypeFont),
    Cff(CffFont),

    /// Nothing usable was embedded or found. Glyphs are empty
    Missing,
}

impl fmt::Debug for FontProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TrueType(..) => "TrueType",
            Self::Cff(..) => "Cff",
            Self::Missing => "Missing",
        })
    }
}

impl FontProgram {
    /// Never fails. A font program that can't be read degrades to [`FontProgram::Missing`]
    pub fn load(
        font_file: Option<&FontFile>,
        base_font: &str,
        resolver: &dyn Resolve,
        config: &RenderConfig,
    ) -> Self {
        if let Some(font_file) = font_file {
            match Self::from_embedded(font_file, resolver) {
                Ok(program) => return program,
                Err(err) => log::warn!("unable to read embedded font {}: {:#}", base_font, err),
            }
        }

        match &config.font_substitution {
            FontSubstitution::Disabled => Self::Missing,
            FontSubstitution::Directory(dir) => Self::from_directory(dir, base_font),
        }
    }

    fn from_embedded(font_file: &FontFile, resolver: &dyn Resolve) -> anyhow::Result<Self> {
        let data = font_file.stream().decode(resolver)?;

        match font_file {
            FontFile::TrueType(..) => Self::from_sfnt(data),
            FontFile::Compact {
                subtype: FontFile3Subtype::OpenType,
                ..
            } => Self::from_sfnt(data),
            FontFile::Compact { .. } => Ok(Self::Cff(CffFont::parse(data)?)),
            FontFile::Type1(..) => anyhow::bail!("Type 1 font programs are not supported"),
        }
    }

    /// TrueType, or OpenType with either kind of outline
    fn from_sfnt(data: Bytes) -> anyhow::Result<Self> {
        match TrueTypeFont::open_type_cff_table(&data)? {
            Some(cff) => Ok(Self::Cff(CffFont::parse(cff)?)),
            None => Ok(Self::TrueType(TrueTypeFont::parse(data)?)),
        }
    }

    fn from_directory(dir: &FsPath, base_font: &str) -> Self {
        let name = strip_subset_prefix(base_font);

        for extension in ["ttf", "otf", "cff"] {
            let path = dir.join(format!("{}.{}", name, extension));

            if !path.is_file() {
                continue;
            }

            let program = fs::read(&path)
                .with_context(|| format!("reading {}", path.display()))
                .and_then(|data| {
                    let data = Bytes::from(data);

                    if extension == "cff" {
                        Ok(Self::Cff(CffFont::parse(data)?))
                    } else {
                        Self::from_sfnt(data)
                    }
                });

            match program {
                Ok(program) => {
                    log::debug!("substituting {} for {}", path.display(), base_font);
                    return program;
                }
                Err(err) => log::warn!("unable to read substitute font: {:#}", err),
            }
        }

        log::debug!("no substitute found for {}", base_font);

        Self::Missing
    }

    pub fn source(&self) -> Option<&dyn OutlineSource> {
        match self {
            Self::TrueType(font) => Some(font),
            Self::Cff(font) => Some(font),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Subset fonts are named like `ABCDEF+Helvetica`
pub(crate) fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}
