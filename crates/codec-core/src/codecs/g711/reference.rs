//! ITU-T G.711 companding
//!
//! Bit-exact ports of the STL reference routines. A-law keeps the 13 most
//! significant bits of the input, μ-law keeps 14 and adds a bias of 33.

/// Compress one linear sample to A-law
///
/// Drops the low 4 bits, finds the segment of the remaining magnitude and
/// packs sign, segment and 4-bit mantissa, then applies the even-bit
/// inversion (`0x55`).
///
/// # Arguments
///
/// * `sample` - Linear PCM sample (16-bit signed)
///
/// # Returns
///
/// A-law code word (8-bit)
pub fn alaw_compress(sample: i16) -> u8 {
    let mut ix = if sample < 0 {
        (((!sample) as u16) >> 4) as i16
    } else {
        sample >> 4
    };

    if ix > 15 {
        let mut iexp = 1;
        while ix > 16 + 15 {
            ix >>= 1;
            iexp += 1;
        }
        ix -= 16;
        ix += iexp << 4;
    }

    if sample >= 0 {
        ix |= 0x0080;
    }

    (ix ^ 0x0055) as u8
}

/// Expand one A-law byte to a linear sample
///
/// Reconstructs the midpoint of the quantization interval, so silence
/// (`0xD5`) decodes to 8 rather than 0.
///
/// # Arguments
///
/// * `compressed` - A-law code word (8-bit)
///
/// # Returns
///
/// Linear PCM sample (16-bit signed), at most 32256 in magnitude
pub fn alaw_expand(compressed: u8) -> i16 {
    let ix = ((compressed ^ 0x55) & 0x7F) as i16;
    let iexp = ix >> 4;
    let mut mant = ix & 0x0F;

    if iexp > 0 {
        mant += 16;
    }
    mant = (mant << 4) + 0x08;
    if iexp > 1 {
        mant <<= iexp - 1;
    }

    if compressed > 127 {
        mant
    } else {
        -mant
    }
}

/// Compress one linear sample to μ-law
///
/// Drops the low 2 bits, adds the bias and clips at `0x1FFF` before
/// packing sign, segment and inverted mantissa.
///
/// # Arguments
///
/// * `sample` - Linear PCM sample (16-bit signed)
///
/// # Returns
///
/// μ-law code word (8-bit)
pub fn ulaw_compress(sample: i16) -> u8 {
    let absno = if sample < 0 {
        (((!sample) as u16) >> 2) as i16 + 33
    } else {
        (sample >> 2) + 33
    }
    .min(0x1FFF);

    let mut segno = 1;
    let mut i = absno >> 6;
    while i != 0 {
        segno += 1;
        i >>= 1;
    }

    let high_nibble = 0x0008 - segno;
    let low_nibble = 0x000F - ((absno >> segno) & 0x000F);
    let mut out = (high_nibble << 4) | low_nibble;
    if sample >= 0 {
        out |= 0x0080;
    }
    out as u8
}

/// Expand one μ-law byte to a linear sample
///
/// # Arguments
///
/// * `compressed` - μ-law code word (8-bit)
///
/// # Returns
///
/// Linear PCM sample (16-bit signed), at most 32124 in magnitude
pub fn ulaw_expand(compressed: u8) -> i16 {
    let sign: i16 = if compressed < 0x80 { -1 } else { 1 };
    let inverted = (!compressed) as i16;
    let exponent = (inverted >> 4) & 0x07;
    let mantissa = inverted & 0x0F;
    let step = 4 << (exponent + 1);

    sign * ((0x0080 << exponent) + step * mantissa + step / 2 - 4 * 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_code_words() {
        assert_eq!(alaw_compress(0), 0xD5);
        assert_eq!(ulaw_compress(0), 0xFF);
        assert_eq!(ulaw_expand(0xFF), 0);
        assert_eq!(alaw_expand(0xD5), 8);
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        for sample in [i16::MIN, i16::MIN + 1, -1, 1, i16::MAX] {
            let a = alaw_expand(alaw_compress(sample));
            let u = ulaw_expand(ulaw_compress(sample));
            assert!(a.signum() * sample.signum() >= 0, "a-law sign flip at {}", sample);
            assert!(u.signum() * sample.signum() >= 0, "μ-law sign flip at {}", sample);
        }
        assert_eq!(ulaw_expand(0x00), -32124);
        assert_eq!(ulaw_expand(0x80), 32124);
        assert_eq!(alaw_expand(0xAA), 32256);
    }

    #[test]
    fn test_round_trip_error_is_bounded() {
        for sample in (i16::MIN..=i16::MAX).step_by(97) {
            let err_a = (i32::from(alaw_expand(alaw_compress(sample))) - i32::from(sample)).abs();
            let err_u = (i32::from(ulaw_expand(ulaw_compress(sample))) - i32::from(sample)).abs();
            // top segment step is 1024; μ-law also clips above 32124
            assert!(err_a <= 1024, "a-law error {} at {}", err_a, sample);
            assert!(err_u <= 1024, "μ-law error {} at {}", err_u, sample);
        }
    }
}
