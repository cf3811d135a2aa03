use archmage::prelude::*;

use super::BLOCK_PIXELS;
use crate::format::PixelFormat;

// ===========================================================================
// Scalar block implementations — the correctness reference for every
// SIMD backend.
// ===========================================================================

pub(super) fn byte_block_scalar(
    _token: ScalarToken,
    format: PixelFormat,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
) {
    let bpp = format.bytes_per_pixel();
    for (i, d) in dst.iter_mut().enumerate() {
        *d = format.pixel_from_bytes(src, i * bpp);
    }
}

pub(super) fn int_block_scalar(
    _token: ScalarToken,
    format: PixelFormat,
    src: &[u32],
    dst: &mut [u32; BLOCK_PIXELS],
) {
    for (s, d) in src[..BLOCK_PIXELS].iter().zip(dst.iter_mut()) {
        *d = format.pixel_from_u32(*s);
    }
}
