use archmage::prelude::*;

use super::BLOCK_PIXELS;
use crate::format::PixelFormat;

// ===========================================================================
// SIMD constants — tbl indices producing canonical [R, G, B, A] bytes.
// 0x80 is out of table range, so vqtbl1q zeroes that lane.
// ===========================================================================

const RGB_BYTES_TBL: [u8; 16] = [0, 1, 2, 0x80, 3, 4, 5, 0x80, 6, 7, 8, 0x80, 9, 10, 11, 0x80];
const BGR_BYTES_TBL: [u8; 16] = [2, 1, 0, 0x80, 5, 4, 3, 0x80, 8, 7, 6, 0x80, 11, 10, 9, 0x80];
const ARGB_BYTES_TBL: [u8; 16] = [1, 2, 3, 0, 5, 6, 7, 4, 9, 10, 11, 8, 13, 14, 15, 12];
const ABGR_BYTES_TBL: [u8; 16] = [3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12];

const RGB_INTS_TBL: [u8; 16] = [2, 1, 0, 0x80, 6, 5, 4, 0x80, 10, 9, 8, 0x80, 14, 13, 12, 0x80];
const BGR_INTS_TBL: [u8; 16] = [0, 1, 2, 0x80, 4, 5, 6, 0x80, 8, 9, 10, 0x80, 12, 13, 14, 0x80];
const ARGB_INTS_TBL: [u8; 16] = [2, 1, 0, 3, 6, 5, 4, 7, 10, 9, 8, 11, 14, 13, 12, 15];
const ABGR_INTS_TBL: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

pub(super) fn byte_shuf(format: PixelFormat) -> &'static [u8; 16] {
    match format {
        PixelFormat::Rgb => &RGB_BYTES_TBL,
        PixelFormat::Bgr => &BGR_BYTES_TBL,
        PixelFormat::Argb => &ARGB_BYTES_TBL,
        PixelFormat::Abgr => &ABGR_BYTES_TBL,
    }
}

pub(super) fn int_shuf(format: PixelFormat) -> &'static [u8; 16] {
    match format {
        PixelFormat::Rgb => &RGB_INTS_TBL,
        PixelFormat::Bgr => &BGR_INTS_TBL,
        PixelFormat::Argb => &ARGB_INTS_TBL,
        PixelFormat::Abgr => &ABGR_INTS_TBL,
    }
}

// ===========================================================================
// ARM NEON — rite block implementations
// ===========================================================================

// 3 bytes/px: 4 pixels per tbl op, advancing 12 source bytes. The last op
// reads src[84..100]; the 128-byte block input minimum covers that.
#[rite]
pub(super) fn pix3_block_arm_v2(
    _token: Arm64V2Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[u8; 16],
) {
    use core::arch::aarch64::vqtbl1q_u8;
    let mask = safe_unaligned_simd::aarch64::vld1q_u8(shuf);
    let out = bytemuck::cast_slice_mut::<u32, u8>(dst);
    let (mut is, mut id) = (0, 0);
    for _ in 0..8 {
        let s: &[u8; 16] = src[is..is + 16].try_into().unwrap();
        let v = safe_unaligned_simd::aarch64::vld1q_u8(s);
        let d: &mut [u8; 16] = (&mut out[id..id + 16]).try_into().unwrap();
        safe_unaligned_simd::aarch64::vst1q_u8(d, vqtbl1q_u8(v, mask));
        is += 12;
        id += 16;
    }
}

// 4 bytes/px (byte layouts and packed ints alike): 4 pixels per tbl op,
// 128 source bytes total.
#[rite]
pub(super) fn pix4_block_arm_v2(
    _token: Arm64V2Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[u8; 16],
) {
    use core::arch::aarch64::vqtbl1q_u8;
    let mask = safe_unaligned_simd::aarch64::vld1q_u8(shuf);
    let out = bytemuck::cast_slice_mut::<u32, u8>(dst);
    let mut i = 0;
    for _ in 0..8 {
        let s: &[u8; 16] = src[i..i + 16].try_into().unwrap();
        let v = safe_unaligned_simd::aarch64::vld1q_u8(s);
        let d: &mut [u8; 16] = (&mut out[i..i + 16]).try_into().unwrap();
        safe_unaligned_simd::aarch64::vst1q_u8(d, vqtbl1q_u8(v, mask));
        i += 16;
    }
}

// ===========================================================================
// aarch64 arcane wrappers
// ===========================================================================

#[arcane]
pub(super) fn pix3_impl_arm_v2(
    t: Arm64V2Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[u8; 16],
) {
    pix3_block_arm_v2(t, src, dst, shuf);
}

#[arcane]
pub(super) fn pix4_impl_arm_v2(
    t: Arm64V2Token,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
    shuf: &[u8; 16],
) {
    pix4_block_arm_v2(t, src, dst, shuf);
}
