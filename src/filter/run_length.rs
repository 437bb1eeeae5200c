/// A length byte `n` in 0..=127 copies the next `n + 1` bytes, 129..=255 repeats the next byte
/// `257 - n` times, and 128 ends the data
pub(crate) fn decode_run_length(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut iter = data.iter().copied();

    while let Some(length) = iter.next() {
        match length {
            0..=127 => out.extend(iter.by_ref().take(usize::from(length) + 1)),
            128 => break,
            129..=255 => match iter.next() {
                Some(b) => out.extend(std::iter::repeat(b).take(257 - usize::from(length))),
                None => break,
            },
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literal_and_repeat_runs() {
        assert_eq!(
            decode_run_length(&[2, b'a', b'b', b'c', 254, b'z', 128, 9]),
            b"abczzz"
        );
    }
}
