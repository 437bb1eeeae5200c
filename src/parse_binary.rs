/// Generic trait for parsing big-endian binary formats, as font programs are
pub trait BinaryParser {
    fn buffer(&self) -> &[u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;

    fn next(&mut self) -> anyhow::Result<u8> {
        let b = self.buffer().get(self.cursor()).copied();
        if b.is_some() {
            *self.cursor_mut() += 1;
        }
        b.ok_or(anyhow::anyhow!("unexpected eof"))
    }

    fn peek(&self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied()
    }

    fn at_end(&self) -> bool {
        self.cursor() >= self.buffer().len()
    }

    fn seek(&mut self, pos: usize) -> anyhow::Result<()> {
        anyhow::ensure!(pos <= self.buffer().len(), "seek past end: {}", pos);
        *self.cursor_mut() = pos;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> anyhow::Result<()> {
        let pos = self.cursor() + n;
        self.seek(pos)
    }

    /// The next `n` bytes, consuming them
    fn take(&mut self, n: usize) -> anyhow::Result<&[u8]> {
        let start = self.cursor();
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.buffer().len())
            .ok_or(anyhow::anyhow!("unexpected eof"))?;

        *self.cursor_mut() = end;

        Ok(&self.buffer()[start..end])
    }

    fn parse_u16(&mut self) -> anyhow::Result<u16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(u16::from_be_bytes([b1, b2]))
    }

    fn parse_i16(&mut self) -> anyhow::Result<i16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(i16::from_be_bytes([b1, b2]))
    }

    /// 1 to 4 byte unsigned integers, as used by CFF offsets
    fn parse_sized(&mut self, size: u8) -> anyhow::Result<u32> {
        anyhow::ensure!((1..=4).contains(&size), "invalid offset size: {}", size);

        let mut n = 0;
        for _ in 0..size {
            n = (n << 8) | u32::from(self.next()?);
        }

        Ok(n)
    }

    fn parse_u32(&mut self) -> anyhow::Result<u32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(u32::from_be_bytes([b1, b2, b3, b4]))
    }

    fn parse_i32(&mut self) -> anyhow::Result<i32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(i32::from_be_bytes([b1, b2, b3, b4]))
    }

    /// A 2.14 fixed point number
    fn parse_f2dot14(&mut self) -> anyhow::Result<f32> {
        Ok(f32::from(self.parse_i16()?) / 16384.0)
    }
}

/// A cursor over a borrowed buffer
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn at(buffer: &'a [u8], cursor: usize) -> Self {
        Self { buffer, cursor }
    }

    /// Like `take`, but the slice outlives the reader
    pub fn read_slice(&mut self, n: usize) -> anyhow::Result<&'a [u8]> {
        let start = self.cursor;
        self.take(n)?;

        Ok(&self.buffer[start..self.cursor])
    }
}

impl BinaryParser for ByteReader<'_> {
    fn buffer(&self) -> &[u8] {
        self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}
