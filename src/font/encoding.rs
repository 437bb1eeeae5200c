use std::collections::HashMap;

use crate::{
    error::{PdfError, PdfResult},
    objects::{Object, ObjectType},
    resolve::Resolve,
};

#[pdf_enum]
pub enum BaseEncoding {
    StandardEncoding = "StandardEncoding",
    MacRomanEncoding = "MacRomanEncoding",

    /// Only meaningful for expert fonts. Treated as `StandardEncoding`, which no text in the
    /// expert character set agrees with anyway
    MacExpertEncoding = "MacExpertEncoding",

    /// Windows code page 1252
    WinAnsiEncoding = "WinAnsiEncoding",
}

impl BaseEncoding {
    pub fn glyph_name(self, code: u8) -> Option<&'static str> {
        let table = match self {
            Self::StandardEncoding | Self::MacExpertEncoding => &STANDARD,
            Self::MacRomanEncoding => &MAC_ROMAN,
            Self::WinAnsiEncoding => &WIN_ANSI,
        };

        table[usize::from(code)]
    }
}

/// The `/Encoding` of a simple font: a base table plus `/Differences`
///
/// Without a base the font program's built-in encoding applies, which only the font backend
/// knows about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleEncoding {
    pub base: Option<BaseEncoding>,
    differences: HashMap<u8, String>,
}

impl SimpleEncoding {
    pub fn new(base: Option<BaseEncoding>) -> Self {
        Self {
            base,
            differences: HashMap::new(),
        }
    }

    pub fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        match resolver.resolve(obj)? {
            Object::Name(name) => Ok(Self::new(Some(BaseEncoding::from_str(&name)?))),
            Object::Dictionary(dict) => {
                dict.expect_type("Encoding", resolver, true)?;

                let base = dict
                    .get_name("BaseEncoding", resolver)?
                    .as_deref()
                    .map(BaseEncoding::from_str)
                    .transpose()?;

                let differences = match dict.get_arr("Differences", resolver)? {
                    Some(arr) => parse_differences(arr, resolver)?,
                    None => HashMap::new(),
                };

                Ok(Self { base, differences })
            }
            found => Err(PdfError::MismatchedObjectTypeAny {
                expected: &[ObjectType::Dictionary, ObjectType::Name],
                found: found.object_type(),
            }),
        }
    }

    /// Fills in a missing base encoding
    pub fn or_base(mut self, base: BaseEncoding) -> Self {
        self.base.get_or_insert(base);
        self
    }

    pub fn glyph_name(&self, code: u8) -> Option<&str> {
        match self.differences.get(&code) {
            Some(name) => Some(name.as_str()),
            None => self.base?.glyph_name(code),
        }
    }
}

/// `[code name name ... code name ...]`, each run of names taking consecutive codes
fn parse_differences(arr: Vec<Object>, resolver: &dyn Resolve) -> PdfResult<HashMap<u8, String>> {
    let mut differences = HashMap::new();
    let mut code: Option<u32> = None;

    for obj in arr {
        match resolver.resolve(obj)? {
            Object::Integer(i) => code = Some(u32::try_from(i)?),
            Object::Name(name) => {
                let Some(current) = code else {
                    log::warn!("glyph name /{} in /Differences before any code", name);
                    continue;
                };

                if let Ok(byte) = u8::try_from(current) {
                    differences.insert(byte, name);
                }

                code = Some(current + 1);
            }
            found => {
                return Err(PdfError::MismatchedObjectTypeAny {
                    expected: &[ObjectType::Integer, ObjectType::Name],
                    found: found.object_type(),
                })
            }
        }
    }

    Ok(differences)
}

pub(crate) fn standard_name(code: u8) -> Option<&'static str> {
    STANDARD[usize::from(code)]
}

/// The Unicode value a glyph name stands for, following the `uniXXXX` and `uXXXX[XX]`
/// conventions for names outside the Latin text set
pub(crate) fn unicode_for_name(name: &str) -> Option<u32> {
    if let Ok(idx) = GLYPH_UNICODE.binary_search_by(|&(n, _)| n.cmp(name)) {
        return Some(GLYPH_UNICODE[idx].1);
    }

    let hex = |digits: &str| {
        if digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            u32::from_str_radix(digits, 16).ok()
        } else {
            None
        }
    };

    if let Some(digits) = name.strip_prefix("uni") {
        if digits.len() == 4 {
            return hex(digits);
        }
    }

    match name.strip_prefix('u') {
        Some(digits) if (4..=6).contains(&digits.len()) => hex(digits),
        _ => None,
    }
}

#[rustfmt::skip]
static STANDARD: [Option<&str>; 256] = [
    /*\00x*/ None, None, None, None, None, None, None, None,
    /*\01x*/ None, None, None, None, None, None, None, None,
    /*\02x*/ None, None, None, None, None, None, None, None,
    /*\03x*/ None, None, None, None, None, None, None, None,
    /*\04x*/ Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
             Some("dollar"), Some("percent"), Some("ampersand"), Some("quoteright"),
    /*\05x*/ Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
             Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    /*\06x*/ Some("zero"), Some("one"), Some("two"), Some("three"),
             Some("four"), Some("five"), Some("six"), Some("seven"),
    /*\07x*/ Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
             Some("less"), Some("equal"), Some("greater"), Some("question"),
    /*\10x*/ Some("at"), Some("A"), Some("B"), Some("C"),
             Some("D"), Some("E"), Some("F"), Some("G"),
    /*\11x*/ Some("H"), Some("I"), Some("J"), Some("K"),
             Some("L"), Some("M"), Some("N"), Some("O"),
    /*\12x*/ Some("P"), Some("Q"), Some("R"), Some("S"),
             Some("T"), Some("U"), Some("V"), Some("W"),
    /*\13x*/ Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
             Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    /*\14x*/ Some("quoteleft"), Some("a"), Some("b"), Some("c"),
             Some("d"), Some("e"), Some("f"), Some("g"),
    /*\15x*/ Some("h"), Some("i"), Some("j"), Some("k"),
             Some("l"), Some("m"), Some("n"), Some("o"),
    /*\16x*/ Some("p"), Some("q"), Some("r"), Some("s"),
             Some("t"), Some("u"), Some("v"), Some("w"),
    /*\17x*/ Some("x"), Some("y"), Some("z"), Some("braceleft"),
             Some("bar"), Some("braceright"), Some("asciitilde"), None,
    /*\20x*/ None, None, None, None, None, None, None, None,
    /*\21x*/ None, None, None, None, None, None, None, None,
    /*\22x*/ None, None, None, None, None, None, None, None,
    /*\23x*/ None, None, None, None, None, None, None, None,
    /*\24x*/ None, Some("exclamdown"), Some("cent"), Some("sterling"),
             Some("fraction"), Some("yen"), Some("florin"), Some("section"),
    /*\25x*/ Some("currency"), Some("quotesingle"), Some("quotedblleft"), Some("guillemotleft"),
             Some("guilsinglleft"), Some("guilsinglright"), Some("fi"), Some("fl"),
    /*\26x*/ None, Some("endash"), Some("dagger"), Some("daggerdbl"),
             Some("periodcentered"), None, Some("paragraph"), Some("bullet"),
    /*\27x*/ Some("quotesinglbase"), Some("quotedblbase"), Some("quotedblright"), Some("guillemotright"),
             Some("ellipsis"), Some("perthousand"), None, Some("questiondown"),
    /*\30x*/ None, Some("grave"), Some("acute"), Some("circumflex"),
             Some("tilde"), Some("macron"), Some("breve"), Some("dotaccent"),
    /*\31x*/ Some("dieresis"), None, Some("ring"), Some("cedilla"),
             None, Some("hungarumlaut"), Some("ogonek"), Some("caron"),
    /*\32x*/ Some("emdash"), None, None, None, None, None, None, None,
    /*\33x*/ None, None, None, None, None, None, None, None,
    /*\34x*/ None, Some("AE"), None, Some("ordfeminine"), None, None, None, None,
    /*\35x*/ Some("Lslash"), Some("Oslash"), Some("OE"), Some("ordmasculine"), None, None, None, None,
    /*\36x*/ None, Some("ae"), None, None, None, Some("dotlessi"), None, None,
    /*\37x*/ Some("lslash"), Some("oslash"), Some("oe"), Some("germandbls"), None, None, None, None,
];

#[rustfmt::skip]
static WIN_ANSI: [Option<&str>; 256] = [
    /*\00x*/ None, None, None, None, None, None, None, None,
    /*\01x*/ None, None, None, None, None, None, None, None,
    /*\02x*/ None, None, None, None, None, None, None, None,
    /*\03x*/ None, None, None, None, None, None, None, None,
    /*\04x*/ Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
             Some("dollar"), Some("percent"), Some("ampersand"), Some("quotesingle"),
    /*\05x*/ Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
             Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    /*\06x*/ Some("zero"), Some("one"), Some("two"), Some("three"),
             Some("four"), Some("five"), Some("six"), Some("seven"),
    /*\07x*/ Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
             Some("less"), Some("equal"), Some("greater"), Some("question"),
    /*\10x*/ Some("at"), Some("A"), Some("B"), Some("C"),
             Some("D"), Some("E"), Some("F"), Some("G"),
    /*\11x*/ Some("H"), Some("I"), Some("J"), Some("K"),
             Some("L"), Some("M"), Some("N"), Some("O"),
    /*\12x*/ Some("P"), Some("Q"), Some("R"), Some("S"),
             Some("T"), Some("U"), Some("V"), Some("W"),
    /*\13x*/ Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
             Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    /*\14x*/ Some("grave"), Some("a"), Some("b"), Some("c"),
             Some("d"), Some("e"), Some("f"), Some("g"),
    /*\15x*/ Some("h"), Some("i"), Some("j"), Some("k"),
             Some("l"), Some("m"), Some("n"), Some("o"),
    /*\16x*/ Some("p"), Some("q"), Some("r"), Some("s"),
             Some("t"), Some("u"), Some("v"), Some("w"),
    /*\17x*/ Some("x"), Some("y"), Some("z"), Some("braceleft"),
             Some("bar"), Some("braceright"), Some("asciitilde"), Some("bullet"),
    /*\20x*/ Some("Euro"), Some("bullet"), Some("quotesinglbase"), Some("florin"),
             Some("quotedblbase"), Some("ellipsis"), Some("dagger"), Some("daggerdbl"),
    /*\21x*/ Some("circumflex"), Some("perthousand"), Some("Scaron"), Some("guilsinglleft"),
             Some("OE"), Some("bullet"), Some("Zcaron"), Some("bullet"),
    /*\22x*/ Some("bullet"), Some("quoteleft"), Some("quoteright"), Some("quotedblleft"),
             Some("quotedblright"), Some("bullet"), Some("endash"), Some("emdash"),
    /*\23x*/ Some("tilde"), Some("trademark"), Some("scaron"), Some("guilsinglright"),
             Some("oe"), Some("bullet"), Some("zcaron"), Some("Ydieresis"),
    /*\24x*/ Some("space"), Some("exclamdown"), Some("cent"), Some("sterling"),
             Some("currency"), Some("yen"), Some("brokenbar"), Some("section"),
    /*\25x*/ Some("dieresis"), Some("copyright"), Some("ordfeminine"), Some("guillemotleft"),
             Some("logicalnot"), Some("hyphen"), Some("registered"), Some("macron"),
    /*\26x*/ Some("degree"), Some("plusminus"), Some("twosuperior"), Some("threesuperior"),
             Some("acute"), Some("mu"), Some("paragraph"), Some("periodcentered"),
    /*\27x*/ Some("cedilla"), Some("onesuperior"), Some("ordmasculine"), Some("guillemotright"),
             Some("onequarter"), Some("onehalf"), Some("threequarters"), Some("questiondown"),
    /*\30x*/ Some("Agrave"), Some("Aacute"), Some("Acircumflex"), Some("Atilde"),
             Some("Adieresis"), Some("Aring"), Some("AE"), Some("Ccedilla"),
    /*\31x*/ Some("Egrave"), Some("Eacute"), Some("Ecircumflex"), Some("Edieresis"),
             Some("Igrave"), Some("Iacute"), Some("Icircumflex"), Some("Idieresis"),
    /*\32x*/ Some("Eth"), Some("Ntilde"), Some("Ograve"), Some("Oacute"),
             Some("Ocircumflex"), Some("Otilde"), Some("Odieresis"), Some("multiply"),
    /*\33x*/ Some("Oslash"), Some("Ugrave"), Some("Uacute"), Some("Ucircumflex"),
             Some("Udieresis"), Some("Yacute"), Some("Thorn"), Some("germandbls"),
    /*\34x*/ Some("agrave"), Some("aacute"), Some("acircumflex"), Some("atilde"),
             Some("adieresis"), Some("aring"), Some("ae"), Some("ccedilla"),
    /*\35x*/ Some("egrave"), Some("eacute"), Some("ecircumflex"), Some("edieresis"),
             Some("igrave"), Some("iacute"), Some("icircumflex"), Some("idieresis"),
    /*\36x*/ Some("eth"), Some("ntilde"), Some("ograve"), Some("oacute"),
             Some("ocircumflex"), Some("otilde"), Some("odieresis"), Some("divide"),
    /*\37x*/ Some("oslash"), Some("ugrave"), Some("uacute"), Some("ucircumflex"),
             Some("udieresis"), Some("yacute"), Some("thorn"), Some("ydieresis"),
];

#[rustfmt::skip]
static MAC_ROMAN: [Option<&str>; 256] = [
    /*\00x*/ None, None, None, None, None, None, None, None,
    /*\01x*/ None, None, None, None, None, None, None, None,
    /*\02x*/ None, None, None, None, None, None, None, None,
    /*\03x*/ None, None, None, None, None, None, None, None,
    /*\04x*/ Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
             Some("dollar"), Some("percent"), Some("ampersand"), Some("quotesingle"),
    /*\05x*/ Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
             Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    /*\06x*/ Some("zero"), Some("one"), Some("two"), Some("three"),
             Some("four"), Some("five"), Some("six"), Some("seven"),
    /*\07x*/ Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
             Some("less"), Some("equal"), Some("greater"), Some("question"),
    /*\10x*/ Some("at"), Some("A"), Some("B"), Some("C"),
             Some("D"), Some("E"), Some("F"), Some("G"),
    /*\11x*/ Some("H"), Some("I"), Some("J"), Some("K"),
             Some("L"), Some("M"), Some("N"), Some("O"),
    /*\12x*/ Some("P"), Some("Q"), Some("R"), Some("S"),
             Some("T"), Some("U"), Some("V"), Some("W"),
    /*\13x*/ Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
             Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    /*\14x*/ Some("grave"), Some("a"), Some("b"), Some("c"),
             Some("d"), Some("e"), Some("f"), Some("g"),
    /*\15x*/ Some("h"), Some("i"), Some("j"), Some("k"),
             Some("l"), Some("m"), Some("n"), Some("o"),
    /*\16x*/ Some("p"), Some("q"), Some("r"), Some("s"),
             Some("t"), Some("u"), Some("v"), Some("w"),
    /*\17x*/ Some("x"), Some("y"), Some("z"), Some("braceleft"),
             Some("bar"), Some("braceright"), Some("asciitilde"), None,
    /*\20x*/ Some("Adieresis"), Some("Aring"), Some("Ccedilla"), Some("Eacute"),
             Some("Ntilde"), Some("Odieresis"), Some("Udieresis"), Some("aacute"),
    /*\21x*/ Some("agrave"), Some("acircumflex"), Some("adieresis"), Some("atilde"),
             Some("aring"), Some("ccedilla"), Some("eacute"), Some("egrave"),
    /*\22x*/ Some("ecircumflex"), Some("edieresis"), Some("iacute"), Some("igrave"),
             Some("icircumflex"), Some("idieresis"), Some("ntilde"), Some("oacute"),
    /*\23x*/ Some("ograve"), Some("ocircumflex"), Some("odieresis"), Some("otilde"),
             Some("uacute"), Some("ugrave"), Some("ucircumflex"), Some("udieresis"),
    /*\24x*/ Some("dagger"), Some("degree"), Some("cent"), Some("sterling"),
             Some("section"), Some("bullet"), Some("paragraph"), Some("germandbls"),
    /*\25x*/ Some("registered"), Some("copyright"), Some("trademark"), Some("acute"),
             Some("dieresis"), Some("notequal"), Some("AE"), Some("Oslash"),
    /*\26x*/ Some("infinity"), Some("plusminus"), Some("lessequal"), Some("greaterequal"),
             Some("yen"), Some("mu"), Some("partialdiff"), Some("summation"),
    /*\27x*/ Some("product"), Some("pi"), Some("integral"), Some("ordfeminine"),
             Some("ordmasculine"), Some("Omega"), Some("ae"), Some("oslash"),
    /*\30x*/ Some("questiondown"), Some("exclamdown"), Some("logicalnot"), Some("radical"),
             Some("florin"), Some("approxequal"), Some("Delta"), Some("guillemotleft"),
    /*\31x*/ Some("guillemotright"), Some("ellipsis"), Some("space"), Some("Agrave"),
             Some("Atilde"), Some("Otilde"), Some("OE"), Some("oe"),
    /*\32x*/ Some("endash"), Some("emdash"), Some("quotedblleft"), Some("quotedblright"),
             Some("quoteleft"), Some("quoteright"), Some("divide"), Some("lozenge"),
    /*\33x*/ Some("ydieresis"), Some("Ydieresis"), Some("fraction"), Some("currency"),
             Some("guilsinglleft"), Some("guilsinglright"), Some("fi"), Some("fl"),
    /*\34x*/ Some("daggerdbl"), Some("periodcentered"), Some("quotesinglbase"), Some("quotedblbase"),
             Some("perthousand"), Some("Acircumflex"), Some("Ecircumflex"), Some("Aacute"),
    /*\35x*/ Some("Edieresis"), Some("Egrave"), Some("Iacute"), Some("Icircumflex"),
             Some("Idieresis"), Some("Igrave"), Some("Oacute"), Some("Ocircumflex"),
    /*\36x*/ Some("apple"), Some("Ograve"), Some("Uacute"), Some("Ucircumflex"),
             Some("Ugrave"), Some("dotlessi"), Some("circumflex"), Some("tilde"),
    /*\37x*/ Some("macron"), Some("breve"), Some("dotaccent"), Some("ring"),
             Some("cedilla"), Some("hungarumlaut"), Some("ogonek"), Some("caron"),
];

/// Glyph names of the Latin text set, sorted by name
#[rustfmt::skip]
static GLYPH_UNICODE: &[(&str, u32)] = &[
    ("A", 0x0041), ("AE", 0x00c6), ("Aacute", 0x00c1), ("Acircumflex", 0x00c2),
    ("Adieresis", 0x00c4), ("Agrave", 0x00c0), ("Aring", 0x00c5), ("Atilde", 0x00c3),
    ("B", 0x0042), ("C", 0x0043), ("Cacute", 0x0106), ("Ccaron", 0x010c),
    ("Ccedilla", 0x00c7), ("D", 0x0044), ("Delta", 0x2206), ("E", 0x0045),
    ("Eacute", 0x00c9), ("Ecircumflex", 0x00ca), ("Edieresis", 0x00cb), ("Egrave", 0x00c8),
    ("Eth", 0x00d0), ("Euro", 0x20ac), ("F", 0x0046), ("G", 0x0047),
    ("Gbreve", 0x011e), ("H", 0x0048), ("I", 0x0049), ("Iacute", 0x00cd),
    ("Icircumflex", 0x00ce), ("Idieresis", 0x00cf), ("Idotaccent", 0x0130), ("Igrave", 0x00cc),
    ("J", 0x004a), ("K", 0x004b), ("L", 0x004c), ("Lslash", 0x0141),
    ("M", 0x004d), ("N", 0x004e), ("Ntilde", 0x00d1), ("O", 0x004f),
    ("OE", 0x0152), ("Oacute", 0x00d3), ("Ocircumflex", 0x00d4), ("Odieresis", 0x00d6),
    ("Ograve", 0x00d2), ("Omega", 0x2126), ("Oslash", 0x00d8), ("Otilde", 0x00d5),
    ("P", 0x0050), ("Q", 0x0051), ("R", 0x0052), ("S", 0x0053),
    ("Scaron", 0x0160), ("Scedilla", 0x015e), ("T", 0x0054), ("Thorn", 0x00de),
    ("U", 0x0055), ("Uacute", 0x00da), ("Ucircumflex", 0x00db), ("Udieresis", 0x00dc),
    ("Ugrave", 0x00d9), ("V", 0x0056), ("W", 0x0057), ("X", 0x0058),
    ("Y", 0x0059), ("Yacute", 0x00dd), ("Ydieresis", 0x0178), ("Z", 0x005a),
    ("Zcaron", 0x017d), ("a", 0x0061), ("aacute", 0x00e1), ("acircumflex", 0x00e2),
    ("acute", 0x00b4), ("adieresis", 0x00e4), ("ae", 0x00e6), ("agrave", 0x00e0),
    ("ampersand", 0x0026), ("apple", 0xf8ff), ("approxequal", 0x2248), ("aring", 0x00e5),
    ("asciicircum", 0x005e), ("asciitilde", 0x007e), ("asterisk", 0x002a), ("at", 0x0040),
    ("atilde", 0x00e3), ("b", 0x0062), ("backslash", 0x005c), ("bar", 0x007c),
    ("braceleft", 0x007b), ("braceright", 0x007d), ("bracketleft", 0x005b), ("bracketright", 0x005d),
    ("breve", 0x02d8), ("brokenbar", 0x00a6), ("bullet", 0x2022), ("c", 0x0063),
    ("cacute", 0x0107), ("caron", 0x02c7), ("ccaron", 0x010d), ("ccedilla", 0x00e7),
    ("cedilla", 0x00b8), ("cent", 0x00a2), ("circumflex", 0x02c6), ("colon", 0x003a),
    ("comma", 0x002c), ("copyright", 0x00a9), ("currency", 0x00a4), ("d", 0x0064),
    ("dagger", 0x2020), ("daggerdbl", 0x2021), ("dcroat", 0x0111), ("degree", 0x00b0),
    ("dieresis", 0x00a8), ("divide", 0x00f7), ("dollar", 0x0024), ("dotaccent", 0x02d9),
    ("dotlessi", 0x0131), ("e", 0x0065), ("eacute", 0x00e9), ("ecircumflex", 0x00ea),
    ("edieresis", 0x00eb), ("egrave", 0x00e8), ("eight", 0x0038), ("ellipsis", 0x2026),
    ("emdash", 0x2014), ("endash", 0x2013), ("equal", 0x003d), ("eth", 0x00f0),
    ("exclam", 0x0021), ("exclamdown", 0x00a1), ("f", 0x0066), ("fi", 0xfb01),
    ("five", 0x0035), ("fl", 0xfb02), ("florin", 0x0192), ("four", 0x0034),
    ("fraction", 0x2044), ("franc", 0x20a3), ("g", 0x0067), ("gbreve", 0x011f),
    ("germandbls", 0x00df), ("grave", 0x0060), ("greater", 0x003e), ("greaterequal", 0x2265),
    ("guillemotleft", 0x00ab), ("guillemotright", 0x00bb), ("guilsinglleft", 0x2039), ("guilsinglright", 0x203a),
    ("h", 0x0068), ("hungarumlaut", 0x02dd), ("hyphen", 0x002d), ("i", 0x0069),
    ("iacute", 0x00ed), ("icircumflex", 0x00ee), ("idieresis", 0x00ef), ("igrave", 0x00ec),
    ("infinity", 0x221e), ("integral", 0x222b), ("j", 0x006a), ("k", 0x006b),
    ("l", 0x006c), ("less", 0x003c), ("lessequal", 0x2264), ("logicalnot", 0x00ac),
    ("lozenge", 0x25ca), ("lslash", 0x0142), ("m", 0x006d), ("macron", 0x00af),
    ("minus", 0x2212), ("mu", 0x00b5), ("multiply", 0x00d7), ("n", 0x006e),
    ("nine", 0x0039), ("nonbreakingspace", 0x00a0), ("notequal", 0x2260), ("ntilde", 0x00f1),
    ("numbersign", 0x0023), ("o", 0x006f), ("oacute", 0x00f3), ("ocircumflex", 0x00f4),
    ("odieresis", 0x00f6), ("oe", 0x0153), ("ogonek", 0x02db), ("ograve", 0x00f2),
    ("one", 0x0031), ("onehalf", 0x00bd), ("onequarter", 0x00bc), ("onesuperior", 0x00b9),
    ("ordfeminine", 0x00aa), ("ordmasculine", 0x00ba), ("oslash", 0x00f8), ("otilde", 0x00f5),
    ("p", 0x0070), ("paragraph", 0x00b6), ("parenleft", 0x0028), ("parenright", 0x0029),
    ("partialdiff", 0x2202), ("percent", 0x0025), ("period", 0x002e), ("periodcentered", 0x00b7),
    ("perthousand", 0x2030), ("pi", 0x03c0), ("plus", 0x002b), ("plusminus", 0x00b1),
    ("product", 0x220f), ("q", 0x0071), ("question", 0x003f), ("questiondown", 0x00bf),
    ("quotedbl", 0x0022), ("quotedblbase", 0x201e), ("quotedblleft", 0x201c), ("quotedblright", 0x201d),
    ("quoteleft", 0x2018), ("quoteright", 0x2019), ("quotesinglbase", 0x201a), ("quotesingle", 0x0027),
    ("r", 0x0072), ("radical", 0x221a), ("registered", 0x00ae), ("ring", 0x02da),
    ("s", 0x0073), ("scaron", 0x0161), ("scedilla", 0x015f), ("section", 0x00a7),
    ("semicolon", 0x003b), ("seven", 0x0037), ("six", 0x0036), ("slash", 0x002f),
    ("space", 0x0020), ("sterling", 0x00a3), ("summation", 0x2211), ("t", 0x0074),
    ("thorn", 0x00fe), ("three", 0x0033), ("threequarters", 0x00be), ("threesuperior", 0x00b3),
    ("tilde", 0x02dc), ("trademark", 0x2122), ("two", 0x0032), ("twosuperior", 0x00b2),
    ("u", 0x0075), ("uacute", 0x00fa), ("ucircumflex", 0x00fb), ("udieresis", 0x00fc),
    ("ugrave", 0x00f9), ("underscore", 0x005f), ("v", 0x0076), ("w", 0x0077),
    ("x", 0x0078), ("y", 0x0079), ("yacute", 0x00fd), ("ydieresis", 0x00ff),
    ("yen", 0x00a5), ("z", 0x007a), ("zcaron", 0x017e), ("zero", 0x0030),
];

#[cfg(test)]
mod test {
    use super::*;
    use crate::{resolve::NoResolve, test_util::parse_object};

    #[test]
    fn base_tables_disagree_where_they_should() {
        assert_eq!(standard_name(0o47), Some("quoteright"));
        assert_eq!(BaseEncoding::WinAnsiEncoding.glyph_name(0o47), Some("quotesingle"));
        assert_eq!(BaseEncoding::MacRomanEncoding.glyph_name(0x8a), Some("adieresis"));
        assert_eq!(BaseEncoding::WinAnsiEncoding.glyph_name(0xe4), Some("adieresis"));
        assert_eq!(BaseEncoding::WinAnsiEncoding.glyph_name(0x80), Some("Euro"));
        assert_eq!(standard_name(0o305), Some("macron"));
        assert_eq!(standard_name(0o352), Some("OE"));
        assert_eq!(standard_name(0o372), Some("oe"));
        assert_eq!(standard_name(0x80), None);
    }

    #[test]
    fn glyph_names_are_sorted() {
        assert!(GLYPH_UNICODE.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn unicode_for_names() {
        assert_eq!(unicode_for_name("A"), Some(0x41));
        assert_eq!(unicode_for_name("eacute"), Some(0xe9));
        assert_eq!(unicode_for_name("uni20AC"), Some(0x20ac));
        assert_eq!(unicode_for_name("u1F600"), Some(0x1f600));
        assert_eq!(unicode_for_name("uniXYZW"), None);
        assert_eq!(unicode_for_name("tri.alt"), None);
        assert_eq!(unicode_for_name("unknownglyph"), None);
    }

    #[test]
    fn differences_override_the_base() {
        let obj = parse_object(
            b"<< /Type /Encoding /BaseEncoding /WinAnsiEncoding /Differences [65 /Alpha /Beta 97 /alpha] >>",
        );
        let encoding = SimpleEncoding::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(encoding.glyph_name(65), Some("Alpha"));
        assert_eq!(encoding.glyph_name(66), Some("Beta"));
        assert_eq!(encoding.glyph_name(67), Some("C"));
        assert_eq!(encoding.glyph_name(97), Some("alpha"));
        assert_eq!(encoding.glyph_name(0x80), Some("Euro"));
    }

    #[test]
    fn differences_without_base_leave_other_codes_to_the_font() {
        let obj = parse_object(b"<< /Differences [32 /space] >>");
        let encoding = SimpleEncoding::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(encoding.glyph_name(32), Some("space"));
        assert_eq!(encoding.glyph_name(65), None);
        assert_eq!(
            encoding.or_base(BaseEncoding::StandardEncoding).glyph_name(65),
            Some("A")
        );
    }

    #[test]
    fn encoding_by_name() {
        let obj = Object::Name("MacRomanEncoding".to_owned());
        let encoding = SimpleEncoding::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(encoding.base, Some(BaseEncoding::MacRomanEncoding));
        assert!(SimpleEncoding::from_obj(Object::Integer(3), &NoResolve).is_err());
    }
}
