use archmage::prelude::*;
use safe_unaligned_simd::x86_64::{_mm256_loadu_si256, _mm256_storeu_si256};

use super::BLOCK_PIXELS;
use crate::format::PixelFormat;

// ===========================================================================
// SIMD constants
// ===========================================================================
//
// All shuffles produce the canonical little-endian byte order [R, G, B, A].
// The -128 entries zero their output lane, which is how the 3-channel
// layouts get their zero alpha byte.

const RGB_BYTES_SHUF_AVX: [i8; 32] = [
    0, 1, 2, -128, 3, 4, 5, -128, 6, 7, 8, -128, 9, 10, 11, -128, 0, 1, 2, -128, 3, 4, 5, -128, 6,
    7, 8, -128, 9, 10, 11, -128,
];

const BGR_BYTES_SHUF_AVX: [i8; 32] = [
    2, 1, 0, -128, 5, 4, 3, -128, 8, 7, 6, -128, 11, 10, 9, -128, 2, 1, 0, -128, 5, 4, 3, -128, 8,
    7, 6, -128, 11, 10, 9, -128,
];

const ARGB_BYTES_SHUF_AVX: [i8; 32] = [
    1, 2, 3, 0, 5, 6, 7, 4, 9, 10, 11, 8, 13, 14, 15, 12, 1, 2, 3, 0, 5, 6, 7, 4, 9, 10, 11, 8, 13,
    14, 15, 12,
];

const ABGR_BYTES_SHUF_AVX: [i8; 32] = [
    3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12, 3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15,
    14, 13, 12,
];

const RGB_INTS_SHUF_AVX: [i8; 32] = [
    2, 1, 0, -128, 6, 5, 4, -128, 10, 9, 8, -128, 14, 13, 12, -128, 2, 1, 0, -128, 6, 5, 4, -128,
    10, 9, 8, -128, 14, 13, 12, -128,
];

const BGR_INTS_SHUF_AVX: [i8; 32] = [
    0, 1, 2, -128, 4, 5, 6, -128, 8, 9, 10, -128, 12, 13, 14, -128, 0, 1, 2, -128, 4, 5, 6, -128,
    8, 9, 10, -128, 12, 13, 14, -128,
];

const ARGB_INTS_SHUF_AVX: [i8; 32] = [
    2, 1, 0, 3, 6, 5, 4, 7, 10, 9, 8, 11, 14, 13, 12, 15, 2, 1, 0, 3, 6, 5, 4, 7, 10, 9, 8, 11, 14,
    13, 12, 15,
];

const ABGR_INTS_SHUF_AVX: [i8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

// Lane alignment for 3bpp input: dword permutation placing 12 source bytes
// at the start of each 128-bit lane so the in-lane shuffle sees pixel 0 at
// offset 0 in both lanes.
const PIX3_ALIGN_PERM_AVX: [i8; 32] = [
    0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0,
];

pub(super) fn byte_shuf(format: PixelFormat) -> &'static [i8; 32] {
    match format {
        PixelFormat::Rgb => &RGB_BYTES_SHUF_AVX,
        PixelFormat::Bgr => &BGR_BYTES_SHUF_AVX,
        PixelFormat::Argb => &ARGB_BYTES_SHUF_AVX,
        PixelFormat::Abgr => &ABGR_BYTES_SHUF_AVX,
    }
}

pub(super) fn int_shuf(format: PixelFormat) -> &'static [i8; 32] {
    match format {
        PixelFormat::Rgb => &RGB_INTS_SHUF_AVX,
        PixelFormat::Bgr => &BGR_INTS_SHUF_AVX,
        PixelFormat::Argb => &ARGB_INTS_SHUF_AVX,
        PixelFormat::Abgr => &ABGR_INTS_SHUF_AVX,
    }
}

// ===========================================================================
// x86-64 AVX2 — rite block implementations
// ===========================================================================

// 3 bytes/px: align 24 source bytes across the two lanes, then shuffle
// 8 pixels out per op. Reads up to src[72..104]; the 128-byte block input
// minimum covers that.
#[rite]
pub(super) fn pix3_block_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[i8; 32],
) {
    let perm = _mm256_loadu_si256(&PIX3_ALIGN_PERM_AVX);
    let mask = _mm256_loadu_si256(shuf);
    let out = bytemuck::cast_slice_mut::<u32, u8>(dst);
    let (mut is, mut id) = (0, 0);
    for _ in 0..4 {
        let s: &[u8; 32] = src[is..is + 32].try_into().unwrap();
        let v = _mm256_loadu_si256(s);
        let aligned = _mm256_permutevar8x32_epi32(v, perm);
        let px = _mm256_shuffle_epi8(aligned, mask);
        let d: &mut [u8; 32] = (&mut out[id..id + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, px);
        is += 24;
        id += 32;
    }
}

// 4 bytes/px (byte layouts and packed ints alike): straight in-lane
// shuffle of 4-byte groups, 8 pixels per op, 128 bytes total.
#[rite]
pub(super) fn pix4_block_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[i8; 32],
) {
    let mask = _mm256_loadu_si256(shuf);
    let out = bytemuck::cast_slice_mut::<u32, u8>(dst);
    let mut i = 0;
    for _ in 0..4 {
        let s: &[u8; 32] = src[i..i + 32].try_into().unwrap();
        let v = _mm256_loadu_si256(s);
        let px = _mm256_shuffle_epi8(v, mask);
        let d: &mut [u8; 32] = (&mut out[i..i + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, px);
        i += 32;
    }
}

// ===========================================================================
// x86-64 arcane wrappers
// ===========================================================================

#[arcane]
pub(super) fn pix3_impl_v3(
    t: X64V3Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[i8; 32],
) {
    pix3_block_v3(t, src, dst, shuf);
}

#[arcane]
pub(super) fn pix4_impl_v3(
    t: X64V3Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[i8; 32],
) {
    pix4_block_v3(t, src, dst, shuf);
}
