/// Every operator a content stream may contain, keyed by its spelling
#[pdf_enum]
#[allow(non_camel_case_types)]
pub enum PdfGraphicsOperator {
    // general graphics state
    /// Set line width
    w = "w",
    /// Set line cap style
    J = "J",
    /// Set line join style
    j = "j",
    /// Set miter limit
    M = "M",
    /// Set line dash pattern
    d = "d",
    /// Set colour rendering intent
    ri = "ri",
    /// Set flatness tolerance
    i = "i",
    /// Set parameters from an ExtGState resource
    gs = "gs",

    // special graphics state
    q = "q",
    Q = "Q",
    cm = "cm",

    // path construction
    m = "m",
    l = "l",
    /// Cubic curve with both control points given
    c = "c",
    /// Cubic curve whose first control point is the current point
    v = "v",
    /// Cubic curve whose second control point is the end point
    y = "y",
    h = "h",
    re = "re",

    // path painting
    S = "S",
    /// Close and stroke
    s = "s",
    f = "f",
    /// Obsolete spelling of `f`
    F = "F",
    f_star = "f*",
    B = "B",
    B_star = "B*",
    b = "b",
    b_star = "b*",
    /// End the path without painting, used after a clip
    n = "n",

    // clipping, applied when the path is next painted
    W = "W",
    W_star = "W*",

    // text objects
    BT = "BT",
    ET = "ET",

    // text state
    Tc = "Tc",
    Tw = "Tw",
    Tz = "Tz",
    TL = "TL",
    Tf = "Tf",
    Tr = "Tr",
    Ts = "Ts",

    // text positioning
    Td = "Td",
    /// Like `Td`, also setting the leading to `-ty`
    TD = "TD",
    Tm = "Tm",
    T_star = "T*",

    // text showing
    Tj = "Tj",
    TJ = "TJ",
    /// Move to the next line, then show text
    single_quote = "'",
    /// Set word and character spacing, move to the next line, then show text
    double_quote = "\"",

    // type 3 glyph metrics
    d0 = "d0",
    d1 = "d1",

    // colour
    CS = "CS",
    cs = "cs",
    SC = "SC",
    SCN = "SCN",
    sc = "sc",
    scn = "scn",
    G = "G",
    g = "g",
    RG = "RG",
    rg = "rg",
    K = "K",
    k = "k",

    /// Paint a shading
    sh = "sh",

    // images and forms
    BI = "BI",
    ID = "ID",
    EI = "EI",
    Do = "Do",

    // marked content
    MP = "MP",
    DP = "DP",
    BMC = "BMC",
    BDC = "BDC",
    EMC = "EMC",

    // compatibility
    BX = "BX",
    EX = "EX",
}

impl PdfGraphicsOperator {
    /// How many operands the operator takes, when fixed
    pub fn arity(self) -> Option<usize> {
        use PdfGraphicsOperator::*;

        Some(match self {
            q | Q | h | S | s | f | F | f_star | B | B_star | b | b_star | n | W | W_star | BT
            | ET | T_star | BI | ID | EI | EMC | BX | EX => 0,
            w | J | j | M | ri | i | gs | Tc | Tw | Tz | TL | Tr | Ts | Tj | TJ | single_quote
            | CS | cs | G | g | sh | Do | MP | BMC => 1,
            d | Tf | Td | TD | d0 | DP | BDC | m | l => 2,
            double_quote | RG | rg => 3,
            v | y | re | K | k => 4,
            cm | Tm | c | d1 => 6,
            SC | SCN | sc | scn => return None,
        })
    }
}
