//! Builds small, well-formed documents in memory, with correct cross-reference offsets

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use crate::{
    config::RenderConfig,
    lex::{LexObject, Lexer},
    objects::Object,
    store::Store,
    xref::XrefParser,
};

#[derive(Debug, Clone)]
enum Body {
    Plain(Vec<u8>),
    /// An object stream and the objects compressed inside it
    Container(Vec<(usize, String)>),
}

#[derive(Debug, Default)]
pub(crate) struct PdfBuilder {
    objects: BTreeMap<usize, Body>,
    xref_stream: bool,
    trailer: String,
    version: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) struct BuiltPdf {
    pub bytes: Bytes,
    /// Byte offset of each uncompressed object
    pub offsets: HashMap<usize, usize>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(mut self, number: usize, body: &str) -> Self {
        self.objects
            .insert(number, Body::Plain(body.as_bytes().to_vec()));
        self
    }

    /// A stream object with a correct direct `/Length`. `dict` holds any other entries
    pub fn stream(mut self, number: usize, dict: &str, data: &[u8]) -> Self {
        let mut body = format!("<< /Length {} {} >>\nstream\n", data.len(), dict).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");

        self.objects.insert(number, Body::Plain(body));
        self
    }

    /// An `/ObjStm` holding `objects`. Implies a cross-reference stream
    pub fn object_stream(mut self, number: usize, objects: &[(usize, &str)]) -> Self {
        self.objects.insert(
            number,
            Body::Container(
                objects
                    .iter()
                    .map(|&(n, body)| (n, body.to_owned()))
                    .collect(),
            ),
        );
        self.xref_stream = true;
        self
    }

    pub fn xref_stream(mut self) -> Self {
        self.xref_stream = true;
        self
    }

    /// Extra trailer entries, after `/Size` and `/Root`
    pub fn trailer(mut self, entries: &str) -> Self {
        self.trailer = entries.to_owned();
        self
    }

    pub fn version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn build(self) -> BuiltPdf {
        let mut out = format!("%PDF-{}\n%\u{e2}\u{e3}\n", self.version.unwrap_or("1.7")).into_bytes();
        let mut offsets = HashMap::new();
        // object number -> (container, index)
        let mut compressed = HashMap::new();

        for (&number, body) in &self.objects {
            offsets.insert(number, out.len());

            match body {
                Body::Plain(body) => {
                    out.extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
                    out.extend_from_slice(body);
                    out.extend_from_slice(b"\nendobj\n");
                }
                Body::Container(objects) => {
                    let mut header = String::new();
                    let mut data = String::new();

                    for (idx, (n, body)) in objects.iter().enumerate() {
                        header.push_str(&format!("{} {} ", n, data.len()));
                        data.push_str(body);
                        data.push(' ');
                        compressed.insert(*n, (number, idx));
                    }

                    let content = format!("{}{}", header, data);
                    out.extend_from_slice(
                        format!(
                            "{} 0 obj\n<< /Type /ObjStm /N {} /First {} /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                            number,
                            objects.len(),
                            header.len(),
                            content.len(),
                            content
                        )
                        .as_bytes(),
                    );
                }
            }
        }

        let max_number = self
            .objects
            .keys()
            .copied()
            .chain(compressed.keys().copied())
            .max()
            .unwrap_or(0);

        let xref_pos = out.len();

        if self.xref_stream {
            let own_number = max_number + 1;
            let size = own_number + 1;
            offsets.insert(own_number, xref_pos);

            let mut data = Vec::new();
            for number in 0..size {
                let (ty, field2, field3): (u8, u32, u16) = if number == own_number {
                    (1, xref_pos as u32, 0)
                } else if let Some(&offset) = offsets.get(&number) {
                    (1, offset as u32, 0)
                } else if let Some(&(container, idx)) = compressed.get(&number) {
                    (2, container as u32, idx as u16)
                } else {
                    (0, 0, 0xffff)
                };

                data.push(ty);
                data.extend_from_slice(&field2.to_be_bytes());
                data.extend_from_slice(&field3.to_be_bytes());
            }

            out.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /XRef /Size {} /W [1 4 2] /Root 1 0 R {} /Length {} >>\nstream\n",
                    own_number,
                    size,
                    self.trailer,
                    data.len()
                )
                .as_bytes(),
            );
            out.extend_from_slice(&data);
            out.extend_from_slice(b"\nendstream\nendobj\n");
        } else {
            let size = max_number + 1;
            out.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());

            for number in 0..size {
                let row = match offsets.get(&number) {
                    Some(offset) => format!("{:010} 00000 n \n", offset),
                    None => "0000000000 65535 f \n".to_owned(),
                };
                out.extend_from_slice(row.as_bytes());
            }

            out.extend_from_slice(
                format!(
                    "trailer\n<< /Size {} /Root 1 0 R {} >>\n",
                    size, self.trailer
                )
                .as_bytes(),
            );
        }

        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());

        BuiltPdf {
            bytes: Bytes::from(out),
            offsets,
        }
    }
}

impl BuiltPdf {
    /// An object store over the built bytes, without encryption
    pub fn store(&self) -> Store {
        let parsed = XrefParser::new(self.bytes.clone()).read_xref().unwrap();

        Store::new(
            self.bytes.clone(),
            parsed.xref,
            parsed.trailer.size,
            &RenderConfig::default(),
        )
    }
}

/// A one page document whose page draws `content`
pub(crate) fn single_page(content: &str) -> BuiltPdf {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] /Contents 4 0 R /Resources << >> >>",
        )
        .stream(4, "", content.as_bytes())
        .build()
}

/// Parses a single direct object
pub(crate) fn parse_object(src: &[u8]) -> Object {
    Lexer::new(Bytes::copy_from_slice(src)).lex_object().unwrap()
}
