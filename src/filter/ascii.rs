use crate::lex::hex_digit;

/// Pairs of hex digits up to `>`. Whitespace is skipped and an odd final digit is padded with `0`
pub(crate) fn decode_ascii_hex(stream: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(stream.len() / 2);

    let mut high: Option<u8> = None;

    for &b in stream {
        if b == b'>' {
            break;
        }

        let Some(digit) = hex_digit(b) else {
            continue;
        };

        match high.take() {
            Some(h) => buffer.push(h * 16 + digit),
            None => high = Some(digit),
        }
    }

    if let Some(h) = high {
        buffer.push(h * 16);
    }

    buffer
}

fn decode_ascii_85_digit(digit: u8, n: &mut u32, count: &mut u8) {
    *n = n.wrapping_mul(85).wrapping_add(u32::from(digit.saturating_sub(b'!')));
    *count += 1;
}

pub(crate) fn decode_ascii_85(mut stream: &[u8]) -> Vec<u8> {
    if stream.starts_with(b"<~") {
        stream = &stream[2..];
    }

    let mut buffer = Vec::with_capacity((stream.len() / 5) * 4);

    let mut iter = stream.iter().filter(|&&b| !b.is_ascii_whitespace());

    let mut n: u32 = 0;
    let mut count = 0;

    while let Some(&digit) = iter.next() {
        if digit == b'~' {
            break;
        }

        // `z` abbreviates a group of four zero bytes
        if digit == b'z' && count == 0 {
            buffer.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }

        if !(b'!'..=b'u').contains(&digit) {
            continue;
        }

        decode_ascii_85_digit(digit, &mut n, &mut count);

        if count == 5 {
            buffer.extend_from_slice(&n.to_be_bytes());
            count = 0;
            n = 0;
        }
    }

    if count != 0 {
        let to_remove = 5 - count as usize;
        while count != 5 {
            decode_ascii_85_digit(b'u', &mut n, &mut count);
        }

        buffer.extend_from_slice(&n.to_be_bytes());

        buffer.drain((buffer.len() - to_remove)..);
    }

    buffer
}
