use std::collections::VecDeque;

use crate::{
    data_structures::Matrix,
    font::encoding::standard_name,
    geometry::{Path, PathBuilder},
    parse_binary::{BinaryParser, ByteReader},
};

use super::{
    charset::CffCharset,
    consts::STANDARD_SIDS,
    dict::PrivateDict,
    index::CffIndex,
};

/// Subroutine calls nest at most this deep
const MAX_CALL_DEPTH: usize = 10;

/// The argument stack holds at most this many numbers
const MAX_STACK: usize = 48;

const TRANSIENT_ARRAY_SIZE: usize = 32;

/// Added to the operand of `callsubr` and `callgsubr` to find the subroutine to call
pub(super) fn subroutine_bias(count: usize) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

/// Everything a charstring may refer to outside of itself
pub(super) struct CharStringContext<'a> {
    pub data: &'a [u8],
    pub charstrings: &'a CffIndex,
    pub global_subrs: &'a CffIndex,
    pub local_subrs: Option<&'a CffIndex>,
    pub private: &'a PrivateDict,

    /// Used to find the components of an accented glyph
    pub charset: &'a CffCharset,
}

/// A glyph's outline in glyph space, with its advance width
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CharString {
    pub outline: Path,
    pub width: f32,
}

impl CharStringContext<'_> {
    pub fn evaluate(&self, glyph_id: u16) -> anyhow::Result<CharString> {
        self.evaluate_inner(glyph_id, true)
    }

    fn evaluate_inner(&self, glyph_id: u16, allow_seac: bool) -> anyhow::Result<CharString> {
        let code = self
            .charstrings
            .get(self.data, usize::from(glyph_id))
            .ok_or(anyhow::anyhow!("no charstring for glyph {}", glyph_id))?;

        let mut interpreter = CffCharStringInterpreter::new(self);
        interpreter.execute(code, 0)?;

        let width = match interpreter.width {
            Some(w) => self.private.nominal_width_x + w,
            None => self.private.default_width_x,
        };

        let mut outline = interpreter.path_builder.finish();

        if let Some(Seac { adx, ady, bchar, achar }) = interpreter.seac {
            anyhow::ensure!(allow_seac, "nested accented glyph");

            let base = self.evaluate_inner(self.standard_glyph(bchar)?, false)?;
            let accent = self.evaluate_inner(self.standard_glyph(achar)?, false)?;

            outline.extend(&base.outline);
            outline.extend(&accent.outline.transformed(Matrix::new_translation(adx, ady)));
        }

        Ok(CharString { outline, width })
    }

    /// The glyph a standard encoding code names
    fn standard_glyph(&self, code: u8) -> anyhow::Result<u16> {
        standard_name(code)
            .and_then(|name| STANDARD_SIDS.get(name))
            .and_then(|&sid| self.charset.glyph_id(sid))
            .ok_or(anyhow::anyhow!("no glyph for standard code {}", code))
    }
}

#[derive(Debug, Clone, Copy)]
struct Seac {
    adx: f32,
    ady: f32,
    bchar: u8,
    achar: u8,
}

/// A Type 2 charstring interpreter
struct CffCharStringInterpreter<'a, 'b> {
    ctx: &'b CharStringContext<'a>,
    operand_stack: VecDeque<f32>,
    transient: [f32; TRANSIENT_ARRAY_SIZE],
    path_builder: PathBuilder,
    width: Option<f32>,
    first_stack_clearing_op: bool,
    hint_count: usize,
    finished: bool,
    seac: Option<Seac>,
    random_state: u32,
}

impl<'a, 'b> CffCharStringInterpreter<'a, 'b> {
    fn new(ctx: &'b CharStringContext<'a>) -> Self {
        Self {
            ctx,
            operand_stack: VecDeque::new(),
            transient: [0.0; TRANSIENT_ARRAY_SIZE],
            path_builder: PathBuilder::new(),
            width: None,
            first_stack_clearing_op: true,
            hint_count: 0,
            finished: false,
            seac: None,
            random_state: 0x2545_f491,
        }
    }

    /// The first stack clearing operator may be preceded by the glyph's width, recognisable as
    /// one operand more than the operator takes
    fn maybe_calculate_width(&mut self, has_width: bool) -> anyhow::Result<()> {
        if self.first_stack_clearing_op && has_width {
            let width = self.pop_front()?;
            self.width = Some(width);
        }

        self.first_stack_clearing_op = false;

        Ok(())
    }

    fn push(&mut self, n: f32) -> anyhow::Result<()> {
        anyhow::ensure!(self.operand_stack.len() < MAX_STACK, "stack overflow");
        self.operand_stack.push_back(n);
        Ok(())
    }

    fn pop(&mut self) -> anyhow::Result<f32> {
        self.operand_stack
            .pop_back()
            .ok_or(anyhow::anyhow!("stack underflow"))
    }

    fn pop_front(&mut self) -> anyhow::Result<f32> {
        self.operand_stack
            .pop_front()
            .ok_or(anyhow::anyhow!("stack underflow"))
    }

    fn parse_number(&mut self, b0: u8, parser: &mut ByteReader) -> anyhow::Result<()> {
        let n = match b0 {
            28 => f32::from(parser.parse_i16()?),
            32..=246 => f32::from(b0) - 139.0,
            247..=250 => {
                let b1 = parser.next()?;
                (f32::from(b0) - 247.0) * 256.0 + f32::from(b1) + 108.0
            }
            251..=254 => {
                let b1 = parser.next()?;
                -(f32::from(b0) - 251.0) * 256.0 - f32::from(b1) - 108.0
            }
            // 16.16 fixed point
            255 => parser.parse_i32()? as f32 / 65536.0,
            _ => anyhow::bail!("invalid charstring operator: {:?}", b0),
        };

        self.push(n)
    }

    fn execute(&mut self, code: &[u8], depth: usize) -> anyhow::Result<()> {
        anyhow::ensure!(depth <= MAX_CALL_DEPTH, "subroutines nested too deeply");

        let mut parser = ByteReader::new(code);

        while !parser.at_end() && !self.finished {
            match parser.next()? {
                // y dy {dya dyb}* hstem (1)
                // x dx {dxa dxb}* vstem (3)
                // y dy {dya dyb}* hstemhm (18)
                // x dx {dxa dxb}* vstemhm (23)
                1 | 3 | 18 | 23 => self.stem()?,
                // dy1 vmoveto (4)
                4 => self.vmoveto()?,
                // {dxa dya}+ rlineto (5)
                5 => self.rlineto()?,
                // dx1 {dya dxb}* hlineto (6)
                6 => self.alternating_lines(true)?,
                // dy1 {dxa dyb}* vlineto (7)
                7 => self.alternating_lines(false)?,
                // {dxa dya dxb dyb dxc dyc}+ rrcurveto (8)
                8 => self.rrcurveto()?,
                // subr# callsubr (10)
                10 => {
                    let subrs = self
                        .ctx
                        .local_subrs
                        .ok_or(anyhow::anyhow!("callsubr without local subroutines"))?;
                    self.call_subroutine(subrs, depth)?;
                }
                // return (11)
                11 => break,
                12 => self.escaped_operator(parser.next()?)?,
                // endchar (14)
                14 => self.end_char()?,
                // hintmask (19 + mask), cntrmask (20 + mask)
                19 | 20 => {
                    self.hintmask()?;
                    parser.skip((self.hint_count + 7) / 8)?;
                }
                // dx1 dy1 rmoveto (21)
                21 => self.rmoveto()?,
                // dx1 hmoveto (22)
                22 => self.hmoveto()?,
                // {dxa dya dxb dyb dxc dyc}+ dxd dyd rcurveline (24)
                24 => self.rcurveline()?,
                // {dxa dya}+ dxb dyb dxc dyc dxd dyd rlinecurve (25)
                25 => self.rlinecurve()?,
                // dx1? {dya dxb dyb dyc}+ vvcurveto (26)
                26 => self.vvcurveto()?,
                // dy1? {dxa dxb dyb dxc}+ hhcurveto (27)
                27 => self.hhcurveto()?,
                // globalsubr# callgsubr (29)
                29 => {
                    let subrs = self.ctx.global_subrs;
                    self.call_subroutine(subrs, depth)?;
                }
                // dy1 dx2 dy2 dx3 {dxa dxb dyb dyc dyd dxe dye dxf}* dyf? vhcurveto (30)
                30 => self.alternating_curves(false)?,
                // dx1 dx2 dy2 dy3 {dya dxb dyb dxc dxd dxe dye dyf}* dxf? hvcurveto (31)
                31 => self.alternating_curves(true)?,
                b @ 0..=31 => anyhow::bail!("reserved charstring operator: {:?}", b),
                b0 => self.parse_number(b0, &mut parser)?,
            }
        }

        Ok(())
    }

    fn call_subroutine(&mut self, subrs: &CffIndex, depth: usize) -> anyhow::Result<()> {
        let n = self.pop()?;
        let idx = n as i32 + subroutine_bias(subrs.len());

        let subr = usize::try_from(idx)
            .ok()
            .and_then(|idx| subrs.get(self.ctx.data, idx))
            .ok_or(anyhow::anyhow!("invalid subroutine index: {}", idx))?;

        self.execute(subr, depth + 1)
    }

    fn escaped_operator(&mut self, b1: u8) -> anyhow::Result<()> {
        match b1 {
            // num1 num2 and (12 3) 1_or_0
            3 => {
                let (a, b) = (self.pop()?, self.pop()?);
                self.push_bool(a != 0.0 && b != 0.0)?;
            }
            // num1 num2 or (12 4) 1_or_0
            4 => {
                let (a, b) = (self.pop()?, self.pop()?);
                self.push_bool(a != 0.0 || b != 0.0)?;
            }
            // num1 not (12 5) 1_or_0
            5 => {
                let a = self.pop()?;
                self.push_bool(a == 0.0)?;
            }
            // num abs (12 9) num2
            9 => {
                let a = self.pop()?;
                self.push(a.abs())?;
            }
            // num1 num2 add (12 10) sum
            10 => {
                let (b, a) = (self.pop()?, self.pop()?);
                self.push(a + b)?;
            }
            // num1 num2 sub (12 11) difference
            11 => {
                let (b, a) = (self.pop()?, self.pop()?);
                self.push(a - b)?;
            }
            // num1 num2 div (12 12) quotient
            12 => {
                let (b, a) = (self.pop()?, self.pop()?);
                anyhow::ensure!(b != 0.0, "division by zero");
                self.push(a / b)?;
            }
            // num neg (12 14) num2
            14 => {
                let a = self.pop()?;
                self.push(-a)?;
            }
            // num1 num2 eq (12 15) 1_or_0
            15 => {
                let (a, b) = (self.pop()?, self.pop()?);
                self.push_bool(a == b)?;
            }
            // num drop (12 18)
            18 => {
                self.pop()?;
            }
            // val i put (12 20)
            20 => {
                let i = self.pop()?;
                let val = self.pop()?;
                *self.transient_slot(i)? = val;
            }
            // i get (12 21) val
            21 => {
                let i = self.pop()?;
                let val = *self.transient_slot(i)?;
                self.push(val)?;
            }
            // s1 s2 v1 v2 ifelse (12 22) s1_or_s2
            22 => {
                let v2 = self.pop()?;
                let v1 = self.pop()?;
                let s2 = self.pop()?;
                let s1 = self.pop()?;
                self.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            // random (12 23) num2
            23 => {
                let n = self.next_random();
                self.push(n)?;
            }
            // num1 num2 mul (12 24) product
            24 => {
                let (b, a) = (self.pop()?, self.pop()?);
                self.push(a * b)?;
            }
            // num sqrt (12 26) num2
            26 => {
                let a = self.pop()?;
                anyhow::ensure!(a >= 0.0, "square root of negative number");
                self.push(a.sqrt())?;
            }
            // any dup (12 27) any any
            27 => {
                let a = self.pop()?;
                self.push(a)?;
                self.push(a)?;
            }
            // num1 num2 exch (12 28) num2 num1
            28 => {
                let (b, a) = (self.pop()?, self.pop()?);
                self.push(b)?;
                self.push(a)?;
            }
            // numX ... num0 i index (12 29) numX ... num0 num
            29 => {
                let i = self.pop()?;
                let len = self.operand_stack.len();
                anyhow::ensure!(len > 0, "stack underflow");

                let i = if i < 0.0 { 0 } else { i as usize };
                anyhow::ensure!(i < len, "index out of range: {}", i);

                let val = self.operand_stack[len - 1 - i];
                self.push(val)?;
            }
            // num(N–1) ... num0 N J roll (12 30)
            30 => {
                let j = self.pop()? as i32;
                let n = self.pop()?;
                anyhow::ensure!(n >= 0.0, "negative roll count");

                let n = n as usize;
                let len = self.operand_stack.len();
                anyhow::ensure!(n <= len, "stack underflow");

                if n > 0 {
                    let shift = j.rem_euclid(n as i32) as usize;
                    self.operand_stack.make_contiguous()[len - n..].rotate_right(shift);
                }
            }
            // dx1 dx2 dy2 dx3 dx4 dx5 dx6 hflex (12 34)
            34 => self.hflex()?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 dx6 dy6 fd flex (12 35)
            35 => self.flex()?,
            // dx1 dy1 dx2 dy2 dx3 dx4 dx5 dy5 dx6 hflex1 (12 36)
            36 => self.hflex1()?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 d6 flex1 (12 37)
            37 => self.flex1()?,
            b => anyhow::bail!("invalid charstring operator: 12 {:?}", b),
        }

        Ok(())
    }

    fn push_bool(&mut self, b: bool) -> anyhow::Result<()> {
        self.push(if b { 1.0 } else { 0.0 })
    }

    fn transient_slot(&mut self, i: f32) -> anyhow::Result<&mut f32> {
        anyhow::ensure!(i >= 0.0, "negative transient array index");

        self.transient
            .get_mut(i as usize)
            .ok_or(anyhow::anyhow!("transient array index out of range: {}", i))
    }

    /// A number in (0, 1]
    fn next_random(&mut self) -> f32 {
        self.random_state ^= self.random_state << 13;
        self.random_state ^= self.random_state >> 17;
        self.random_state ^= self.random_state << 5;

        ((self.random_state >> 8) as f32 + 1.0) / (1u32 << 24) as f32
    }

    /// Stem hints only matter for hinting, so only the count is kept, to size hint masks
    fn stem(&mut self) -> anyhow::Result<()> {
        let has_width = self.operand_stack.len() % 2 == 1;
        self.maybe_calculate_width(has_width)?;

        self.hint_count += self.operand_stack.len() / 2;
        self.operand_stack.clear();

        Ok(())
    }

    /// Hint masks may follow stem hints directly, in which case the `vstem` can be left out
    fn hintmask(&mut self) -> anyhow::Result<()> {
        if !self.operand_stack.is_empty() {
            return self.stem();
        }

        self.maybe_calculate_width(false)
    }

    fn end_char(&mut self) -> anyhow::Result<()> {
        let len = self.operand_stack.len();
        self.maybe_calculate_width(len == 1 || len == 5)?;

        // the remnant of Type 1 `seac`: adx ady bchar achar endchar
        if self.operand_stack.len() == 4 {
            let adx = self.pop_front()?;
            let ady = self.pop_front()?;
            let bchar = self.pop_front()? as u8;
            let achar = self.pop_front()? as u8;

            self.seac = Some(Seac { adx, ady, bchar, achar });
        }

        self.operand_stack.clear();
        self.finished = true;

        Ok(())
    }

    /// moves the current point dy1 units in the vertical direction
    fn vmoveto(&mut self) -> anyhow::Result<()> {
        let has_width = self.operand_stack.len() > 1;
        self.maybe_calculate_width(has_width)?;

        let dy1 = self.pop_front()?;
        self.path_builder.relative_move_to(0.0, dy1);

        self.operand_stack.clear();
        Ok(())
    }

    /// moves the current point dx1 units in the horizontal direction
    fn hmoveto(&mut self) -> anyhow::Result<()> {
        let has_width = self.operand_stack.len() > 1;
        self.maybe_calculate_width(has_width)?;

        let dx1 = self.pop_front()?;
        self.path_builder.relative_move_to(dx1, 0.0);

        self.operand_stack.clear();
        Ok(())
    }

    /// moves the current point to a position at the relative coordinates (dx1, dy1)
    fn rmoveto(&mut self) -> anyhow::Result<()> {
        let has_width = self.operand_stack.len() > 2;
        self.maybe_calculate_width(has_width)?;

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;
        self.path_builder.relative_move_to(dx, dy);

        self.operand_stack.clear();
        Ok(())
    }

    /// appends a line from the current point to a position at the relative
    /// coordinates dxa, dya. Additional rlineto operations are performed for all
    /// subsequent argument pairs
    fn rlineto(&mut self) -> anyhow::Result<()> {
        while self.operand_stack.len() >= 2 {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;

            self.path_builder.relative_line_to(dx, dy);
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// `hlineto` and `vlineto`: lines alternating between horizontal and vertical, starting
    /// with the given direction
    fn alternating_lines(&mut self, mut horizontal: bool) -> anyhow::Result<()> {
        while let Some(d) = self.operand_stack.pop_front() {
            if horizontal {
                self.path_builder.horizontal_line_to(d);
            } else {
                self.path_builder.vertical_line_to(d);
            }

            horizontal = !horizontal;
        }

        Ok(())
    }

    /// appends a Bézier curve, defined by dxa...dyc, to the current point. For each
    /// subsequent set of six arguments, an additional curve is appended to the
    /// current point
    fn rrcurveto(&mut self) -> anyhow::Result<()> {
        while self.operand_stack.len() >= 6 {
            self.curve_from_stack()?;
        }

        self.operand_stack.clear();
        Ok(())
    }

    fn curve_from_stack(&mut self) -> anyhow::Result<()> {
        let dx1 = self.pop_front()?;
        let dy1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dy3 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);

        Ok(())
    }

    /// is equivalent to one rrcurveto for each set of six arguments dxa...dyc,
    /// followed by exactly one rlineto using the dxd, dyd arguments
    fn rcurveline(&mut self) -> anyhow::Result<()> {
        while self.operand_stack.len() >= 8 {
            self.curve_from_stack()?;
        }

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;
        self.path_builder.relative_line_to(dx, dy);

        self.operand_stack.clear();
        Ok(())
    }

    /// is equivalent to one rlineto for each pair of arguments beyond the six
    /// arguments dxb...dyd needed for the one rrcurveto command
    fn rlinecurve(&mut self) -> anyhow::Result<()> {
        while self.operand_stack.len() >= 8 {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;

            self.path_builder.relative_line_to(dx, dy);
        }

        self.curve_from_stack()?;

        self.operand_stack.clear();
        Ok(())
    }

    /// appends one or more Bézier curves, as described by the dxa...dxc set of
    /// arguments plus an optional dy1, to the current point. All curves begin and end
    /// horizontal
    fn hhcurveto(&mut self) -> anyhow::Result<()> {
        let mut dy1 = if self.operand_stack.len() % 4 == 1 {
            self.pop_front()?
        } else {
            0.0
        };

        while self.operand_stack.len() >= 4 {
            let dxa = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dxc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dxa, dy1, dxb, dyb, dxc, 0.0);
            dy1 = 0.0;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// appends one or more curves to the current point, all beginning and ending
    /// vertical, the first optionally starting at an angle given by dx1
    fn vvcurveto(&mut self) -> anyhow::Result<()> {
        let mut dx1 = if self.operand_stack.len() % 4 == 1 {
            self.pop_front()?
        } else {
            0.0
        };

        while self.operand_stack.len() >= 4 {
            let dya = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dyc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dx1, dya, dxb, dyb, 0.0, dyc);
            dx1 = 0.0;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// `hvcurveto` and `vhcurveto`: curves whose tangents alternate between horizontal and
    /// vertical. A fifth argument left over for the last curve makes its end free
    fn alternating_curves(&mut self, mut horizontal: bool) -> anyhow::Result<()> {
        while self.operand_stack.len() >= 4 {
            let d1 = self.pop_front()?;
            let dx2 = self.pop_front()?;
            let dy2 = self.pop_front()?;
            let d3 = self.pop_front()?;

            let last = if self.operand_stack.len() == 1 {
                self.pop_front()?
            } else {
                0.0
            };

            if horizontal {
                self.path_builder
                    .relative_relative_curve_to(d1, 0.0, dx2, dy2, last, d3);
            } else {
                self.path_builder
                    .relative_relative_curve_to(0.0, d1, dx2, dy2, d3, last);
            }

            horizontal = !horizontal;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// causes two Bézier curves, as described by the arguments, to be rendered as a
    /// straight line when the flex depth is less than fd /100 device pixels, and
    /// as curved lines otherwise. Outlines are never hinted, so always curves
    fn flex(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(self.operand_stack.len() >= 13, "stack underflow");

        self.curve_from_stack()?;
        self.curve_from_stack()?;

        self.operand_stack.clear();
        Ok(())
    }

    /// flex where the starting and ending points, first and last control points all have the
    /// same y value, as do the joining point and its neighbouring control points
    fn hflex(&mut self) -> anyhow::Result<()> {
        let dx1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dx4 = self.pop_front()?;
        let dx5 = self.pop_front()?;
        let dx6 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, 0.0, dx2, dy2, dx3, 0.0);
        self.path_builder
            .relative_relative_curve_to(dx4, 0.0, dx5, -dy2, dx6, 0.0);

        self.operand_stack.clear();
        Ok(())
    }

    /// flex where the starting and ending points have the same y value
    fn hflex1(&mut self) -> anyhow::Result<()> {
        let dx1 = self.pop_front()?;
        let dy1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dx4 = self.pop_front()?;
        let dx5 = self.pop_front()?;
        let dy5 = self.pop_front()?;
        let dx6 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, 0.0);
        self.path_builder
            .relative_relative_curve_to(dx4, 0.0, dx5, dy5, dx6, -(dy1 + dy2 + dy5));

        self.operand_stack.clear();
        Ok(())
    }

    /// The d6 argument is either a dx or dy value. Whichever of the summed x and y
    /// displacements is larger decides: the last point takes d6 along that axis, and returns
    /// to the starting point's coordinate along the other
    fn flex1(&mut self) -> anyhow::Result<()> {
        let mut d = [0.0; 10];
        for v in &mut d {
            *v = self.pop_front()?;
        }
        let d6 = self.pop_front()?;

        let dx: f32 = d.iter().step_by(2).sum();
        let dy: f32 = d.iter().skip(1).step_by(2).sum();

        let (dx6, dy6) = if dx.abs() > dy.abs() {
            (d6, -dy)
        } else {
            (-dx, d6)
        };

        self.path_builder
            .relative_relative_curve_to(d[0], d[1], d[2], d[3], d[4], d[5]);
        self.path_builder
            .relative_relative_curve_to(d[6], d[7], d[8], d[9], dx6, dy6);

        self.operand_stack.clear();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        font::cff::index::build_index,
        geometry::{PathSegment, Point},
    };

    const RMOVETO: u8 = 21;
    const RLINETO: u8 = 5;
    const ENDCHAR: u8 = 14;
    const CALLSUBR: u8 = 10;
    const RETURN: u8 = 11;

    /// Small integers in the one byte encoding
    fn n(v: i32) -> u8 {
        assert!((-107..=107).contains(&v));
        (v + 139) as u8
    }

    struct Fixture {
        data: Vec<u8>,
        charstrings: CffIndex,
        global_subrs: CffIndex,
        local_subrs: CffIndex,
        private: PrivateDict,
        charset: CffCharset,
    }

    impl Fixture {
        fn new(charstrings: &[&[u8]], local_subrs: &[&[u8]], charset: CffCharset) -> Self {
            let mut data = Vec::new();
            let mut indices = Vec::new();

            let no_subrs: &[&[u8]] = &[];

            for entries in [charstrings, no_subrs, local_subrs] {
                let start = data.len();
                data.extend(build_index(entries));
                indices.push(start);
            }

            let parse = |start| CffIndex::parse(&mut ByteReader::at(&data, start)).unwrap();

            Self {
                charstrings: parse(indices[0]),
                global_subrs: parse(indices[1]),
                local_subrs: parse(indices[2]),
                private: PrivateDict {
                    subrs: None,
                    default_width_x: 500.0,
                    nominal_width_x: 600.0,
                },
                charset,
                data,
            }
        }

        fn evaluate(&self, glyph_id: u16) -> anyhow::Result<CharString> {
            CharStringContext {
                data: &self.data,
                charstrings: &self.charstrings,
                global_subrs: &self.global_subrs,
                local_subrs: Some(&self.local_subrs),
                private: &self.private,
                charset: &self.charset,
            }
            .evaluate(glyph_id)
        }
    }

    #[test]
    fn bias_breakpoints() {
        assert_eq!(subroutine_bias(100), 107);
        assert_eq!(subroutine_bias(2000), 1131);
        assert_eq!(subroutine_bias(40000), 32768);
    }

    #[test]
    fn callsubr_adds_bias() {
        let line: &[u8] = &[n(10), n(20), RLINETO, RETURN];
        let mut subrs = vec![&[RETURN][..]; 100];
        subrs[0] = line;

        // -107 + 107 calls subroutine 0
        let glyph: &[u8] = &[n(0), n(0), RMOVETO, n(-107), CALLSUBR, ENDCHAR];
        let fixture = Fixture::new(&[glyph], &subrs, CffCharset::IsoAdobe);

        let glyph = fixture.evaluate(0).unwrap();

        assert_eq!(
            glyph.outline.segments(),
            &[
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(10.0, 20.0)),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn width_precedes_first_stack_clearing_operator() {
        let with_width: &[u8] = &[n(50), n(0), n(0), RMOVETO, ENDCHAR];
        let without: &[u8] = &[n(0), n(0), RMOVETO, ENDCHAR];
        let bare_endchar: &[u8] = &[n(-20), ENDCHAR];

        let fixture = Fixture::new(&[with_width, without, bare_endchar], &[], CffCharset::IsoAdobe);

        assert_eq!(fixture.evaluate(0).unwrap().width, 650.0);
        assert_eq!(fixture.evaluate(1).unwrap().width, 500.0);
        assert_eq!(fixture.evaluate(2).unwrap().width, 580.0);
    }

    #[test]
    fn arithmetic_feeds_path_operators() {
        // 2 3 add 4 rlineto
        let glyph: &[u8] = &[n(2), n(3), 12, 10, n(4), RLINETO, ENDCHAR];
        let fixture = Fixture::new(&[glyph], &[], CffCharset::IsoAdobe);

        let outline = fixture.evaluate(0).unwrap().outline;

        assert_eq!(outline.segments()[1], PathSegment::LineTo(Point::new(5.0, 4.0)));
    }

    #[test]
    fn roll_and_index() {
        let fixture = Fixture::new(&[&[ENDCHAR]], &[], CffCharset::IsoAdobe);
        let ctx = CharStringContext {
            data: &fixture.data,
            charstrings: &fixture.charstrings,
            global_subrs: &fixture.global_subrs,
            local_subrs: None,
            private: &fixture.private,
            charset: &fixture.charset,
        };

        let mut interpreter = CffCharStringInterpreter::new(&ctx);
        // 1 2 3  3 1 roll  ->  3 1 2, then 2 index -> 3 1 2 3
        interpreter
            .execute(&[n(1), n(2), n(3), n(3), n(1), 12, 30, n(2), 12, 29], 0)
            .unwrap();

        assert_eq!(Vec::from(interpreter.operand_stack), vec![3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn trailing_argument_frees_last_curve_end() {
        // dx1 dx2 dy2 dy3 dxf hvcurveto
        let glyph: &[u8] = &[n(10), n(20), n(30), n(40), n(5), 31, ENDCHAR];
        let fixture = Fixture::new(&[glyph], &[], CffCharset::IsoAdobe);

        let outline = fixture.evaluate(0).unwrap().outline;

        assert_eq!(
            outline.segments()[1],
            PathSegment::CubicTo {
                c1: Point::new(10.0, 0.0),
                c2: Point::new(30.0, 30.0),
                end: Point::new(35.0, 70.0),
            }
        );
    }

    #[test]
    fn endchar_composes_accented_glyph() {
        let notdef: &[u8] = &[ENDCHAR];
        let base: &[u8] = &[n(10), n(0), RLINETO, ENDCHAR];
        let accent: &[u8] = &[n(0), n(10), RLINETO, ENDCHAR];
        // 100 200 65 194 endchar: "A" with "acute" offset by (100, 200)
        let composite: &[u8] = &[239, 247, 92, n(65), 247, 86, ENDCHAR];

        // "A" is SID 34, "acute" is SID 125
        let charset = CffCharset::Custom(vec![0, 34, 125, 400]);
        let fixture = Fixture::new(&[notdef, base, accent, composite], &[], charset);

        let glyph = fixture.evaluate(3).unwrap();
        let segments = glyph.outline.segments();

        assert_eq!(glyph.width, 500.0);
        assert!(segments.contains(&PathSegment::LineTo(Point::new(10.0, 0.0))));
        assert!(segments.contains(&PathSegment::MoveTo(Point::new(100.0, 200.0))));
        assert!(segments.contains(&PathSegment::LineTo(Point::new(100.0, 210.0))));
    }

    #[test]
    fn runaway_recursion_is_an_error() {
        // subroutine 0 calls itself
        let recursive: &[u8] = &[n(-107), CALLSUBR, RETURN];
        let glyph: &[u8] = &[n(-107), CALLSUBR, ENDCHAR];
        let fixture = Fixture::new(&[glyph], &[recursive], CffCharset::IsoAdobe);

        assert!(fixture.evaluate(0).is_err());
    }
}
