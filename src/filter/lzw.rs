use weezl::{decode::Decoder, BitOrder};

/// PDF's LZW is MSB-first with 8 bit literals. `early_change` switches code widths one code early,
/// the PDF default, which is the TIFF convention
pub(crate) fn decode_lzw(data: &[u8], early_change: bool) -> Vec<u8> {
    let mut decoder = if early_change {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };

    let mut output = Vec::new();
    let result = decoder.into_vec(&mut output).decode(data);

    if let Err(err) = result.status {
        log::warn!("LZW stream ended early: {}", err);
    }

    output
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_spec_example() {
        // the example from the LZWDecode section of the PDF reference
        let encoded = [0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01];
        assert_eq!(decode_lzw(&encoded, true), [45, 45, 45, 45, 45, 65, 45, 45, 45, 66]);
    }
}
