use bytes::Bytes;

use crate::{
    data_structures::Matrix,
    parse_binary::{BinaryParser, ByteReader},
};

use super::{
    charset::CffCharset,
    dict::{FontDict, PrivateDict, TopDict},
    encoding::CffEncoding,
    index::CffIndex,
    CffFont, CffKind, PrivateData,
};

pub(super) fn parse_font(data: Bytes) -> anyhow::Result<CffFont> {
    let mut parser = ByteReader::new(&data);

    let major = parser.next()?;
    let _minor = parser.next()?;
    let header_size = parser.next()?;
    let _offsize = parser.next()?;

    anyhow::ensure!(major == 1, "unsupported CFF version: {}", major);
    parser.seek(usize::from(header_size))?;

    let _name_index = CffIndex::parse(&mut parser)?;
    let top_dicts = CffIndex::parse(&mut parser)?;
    let strings = CffIndex::parse(&mut parser)?;
    let global_subrs = CffIndex::parse(&mut parser)?;

    // a font set in a PDF holds exactly one font, any others are ignored
    let top = TopDict::parse(
        top_dicts
            .get(&data, 0)
            .ok_or(anyhow::anyhow!("CFF font set is empty"))?,
    )?;

    let charstrings = CffIndex::parse(&mut ByteReader::at(&data, top.char_strings))?;
    anyhow::ensure!(!charstrings.is_empty(), "CFF font has no glyphs");

    let num_glyphs = charstrings.len();

    let charset = match top.charset {
        0 => CffCharset::IsoAdobe,
        1 => CffCharset::Expert,
        2 => CffCharset::ExpertSubset,
        offset => CffCharset::parse(&mut ByteReader::at(&data, offset), num_glyphs)?,
    };

    let encoding = match top.encoding {
        _ if top.is_cid => CffEncoding::Standard,
        0 => CffEncoding::Standard,
        1 => CffEncoding::Expert,
        offset => CffEncoding::parse(&mut ByteReader::at(&data, offset))?,
    };

    let kind = if top.is_cid {
        let fd_array_offset = top
            .fd_array
            .ok_or(anyhow::anyhow!("CID-keyed font has no FDArray"))?;
        let fd_select_offset = top
            .fd_select
            .ok_or(anyhow::anyhow!("CID-keyed font has no FDSelect"))?;

        let fd_array = CffIndex::parse(&mut ByteReader::at(&data, fd_array_offset))?;

        let fonts = fd_array
            .iter(&data)
            .map(|buffer| {
                let font_dict = FontDict::parse(buffer)?;
                load_private(&data, font_dict.private, font_dict.font_matrix)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let fd_select =
            parse_fd_select(&mut ByteReader::at(&data, fd_select_offset), num_glyphs)?;

        anyhow::ensure!(
            fd_select.iter().all(|&fd| usize::from(fd) < fonts.len()),
            "FDSelect refers past the end of FDArray"
        );

        CffKind::Cid { fonts, fd_select }
    } else {
        CffKind::Simple(load_private(&data, top.private, None)?)
    };

    Ok(CffFont {
        font_matrix: top
            .font_matrix
            .map(Matrix::from_arr)
            .unwrap_or(Matrix::new_scale(0.001, 0.001)),
        charstrings,
        global_subrs,
        strings,
        charset,
        encoding,
        kind,
        data,
    })
}

fn load_private(
    data: &[u8],
    range: Option<(usize, usize)>,
    font_matrix: Option<[f32; 6]>,
) -> anyhow::Result<PrivateData> {
    let font_matrix = font_matrix.map(Matrix::from_arr);

    let Some((size, offset)) = range else {
        return Ok(PrivateData {
            dict: PrivateDict::default(),
            subrs: None,
            font_matrix,
        });
    };

    let buffer = offset
        .checked_add(size)
        .and_then(|end| data.get(offset..end))
        .ok_or(anyhow::anyhow!("private dict extends past end of font"))?;

    let dict = PrivateDict::parse(buffer)?;

    let subrs = match dict.subrs {
        Some(relative) => Some(CffIndex::parse(&mut ByteReader::at(data, offset + relative))?),
        None => None,
    };

    Ok(PrivateData {
        dict,
        subrs,
        font_matrix,
    })
}

/// The font dict index of every glyph
fn parse_fd_select(parser: &mut impl BinaryParser, num_glyphs: usize) -> anyhow::Result<Vec<u8>> {
    let mut fds = Vec::with_capacity(num_glyphs);

    match parser.next()? {
        0 => {
            for _ in 0..num_glyphs {
                fds.push(parser.next()?);
            }
        }
        3 => {
            let n_ranges = parser.parse_u16()?;
            let mut first = parser.parse_u16()?;

            anyhow::ensure!(first == 0, "first FDSelect range does not start at glyph 0");

            for _ in 0..n_ranges {
                let fd = parser.next()?;
                let next = parser.parse_u16()?;

                anyhow::ensure!(next > first, "FDSelect ranges are not ascending");

                for _ in first..next {
                    fds.push(fd);
                }

                first = next;
            }

            anyhow::ensure!(
                fds.len() >= num_glyphs,
                "FDSelect does not cover every glyph"
            );
            fds.truncate(num_glyphs);
        }
        format => anyhow::bail!("invalid FDSelect format: {}", format),
    }

    Ok(fds)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fd_select_format_3() {
        // glyphs 0..2 use font 1, 2..5 use font 0
        let data = [3, 0, 2, 0, 0, 1, 0, 2, 0, 0, 5];
        let fds = parse_fd_select(&mut ByteReader::new(&data), 5).unwrap();

        assert_eq!(fds, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn fd_select_must_cover_glyphs() {
        let data = [3, 0, 1, 0, 0, 0, 0, 2];

        assert!(parse_fd_select(&mut ByteReader::new(&data), 5).is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let data = Bytes::from_static(&[2, 0, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(parse_font(data).is_err());
    }
}
