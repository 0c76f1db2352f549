//! G.711 lookup tables
//!
//! Encode tables cover the full 16-bit input range (64 KiB each), decode
//! tables cover all 256 code words. Built lazily from the reference routines.

use super::reference::{alaw_compress, alaw_expand, ulaw_compress, ulaw_expand};
use std::sync::LazyLock;

static ALAW_ENCODE_TABLE: LazyLock<Box<[u8; 65536]>> = LazyLock::new(|| {
    let mut table = Box::new([0u8; 65536]);
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = alaw_compress((i as u16).wrapping_sub(32768) as i16);
    }
    table
});

static ALAW_DECODE_TABLE: LazyLock<[i16; 256]> = LazyLock::new(|| {
    let mut table = [0i16; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = alaw_expand(i as u8);
    }
    table
});

static ULAW_ENCODE_TABLE: LazyLock<Box<[u8; 65536]>> = LazyLock::new(|| {
    let mut table = Box::new([0u8; 65536]);
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = ulaw_compress((i as u16).wrapping_sub(32768) as i16);
    }
    table
});

static ULAW_DECODE_TABLE: LazyLock<[i16; 256]> = LazyLock::new(|| {
    let mut table = [0i16; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = ulaw_expand(i as u8);
    }
    table
});

#[inline]
fn table_index(sample: i16) -> usize {
    (sample as u16).wrapping_add(32768) as usize
}

/// A-law compression through the lookup table
#[inline]
pub fn alaw_compress_table(sample: i16) -> u8 {
    ALAW_ENCODE_TABLE[table_index(sample)]
}

/// A-law expansion through the lookup table
#[inline]
pub fn alaw_expand_table(encoded: u8) -> i16 {
    ALAW_DECODE_TABLE[encoded as usize]
}

/// μ-law compression through the lookup table
#[inline]
pub fn ulaw_compress_table(sample: i16) -> u8 {
    ULAW_ENCODE_TABLE[table_index(sample)]
}

/// μ-law expansion through the lookup table
#[inline]
pub fn ulaw_expand_table(encoded: u8) -> i16 {
    ULAW_DECODE_TABLE[encoded as usize]
}

/// Force table construction so the first frame does not pay for it
pub fn init_tables() {
    LazyLock::force(&ALAW_ENCODE_TABLE);
    LazyLock::force(&ALAW_DECODE_TABLE);
    LazyLock::force(&ULAW_ENCODE_TABLE);
    LazyLock::force(&ULAW_DECODE_TABLE);
}
