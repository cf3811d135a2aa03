// ---------------------------------------------------------------------------
// 32-pixel block codec with SIMD dispatch.
//
// Architecture: #[rite] block functions contain the SIMD shuffles, one set
// per target arch. The backend is resolved once per process by summoning a
// capability token; the result (and any failure) is memoized so callers can
// query why acceleration is off.
// ---------------------------------------------------------------------------

use std::sync::OnceLock;

use archmage::prelude::*;

use crate::error::ProbeError;
use crate::format::PixelFormat;

mod scalar;

#[cfg(target_arch = "x86_64")]
mod avx2;

#[cfg(target_arch = "aarch64")]
mod neon;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(test)]
mod tests;

/// Pixels converted per block codec call.
pub const BLOCK_PIXELS: usize = 32;

// ===========================================================================
// Backend selection
// ===========================================================================

/// Resolved conversion backend. Carries the capability token proving the
/// tier is available, so block calls need no per-call feature checks.
#[derive(Clone, Copy)]
pub(crate) enum Backend {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Avx2(X64V3Token),
    #[cfg(target_arch = "aarch64")]
    Neon(Arm64V2Token),
    #[cfg(target_arch = "wasm32")]
    Simd128(Wasm128Token),
}

impl Backend {
    #[inline]
    pub(crate) fn is_simd(self) -> bool {
        !matches!(self, Backend::Scalar)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2(_) => "avx2",
            #[cfg(target_arch = "aarch64")]
            Backend::Neon(_) => "neon",
            #[cfg(target_arch = "wasm32")]
            Backend::Simd128(_) => "simd128",
        }
    }

    /// Bytes that must remain in the input when a byte block starts.
    ///
    /// The SIMD kernels load full 4-byte lanes even for 3-byte pixels, so
    /// they need `32 * 4` bytes available; the scalar kernel reads exactly
    /// what the block holds.
    #[inline]
    pub(crate) fn byte_block_min_len(self, format: PixelFormat) -> usize {
        match self {
            Backend::Scalar => BLOCK_PIXELS * format.bytes_per_pixel(),
            _ => BLOCK_PIXELS * 4,
        }
    }
}

struct Probe {
    backend: Backend,
    error: Option<ProbeError>,
}

static PROBE: OnceLock<Probe> = OnceLock::new();

fn probe() -> &'static Probe {
    PROBE.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        {
            match X64V3Token::summon() {
                Some(token) => Probe {
                    backend: Backend::Avx2(token),
                    error: None,
                },
                None => Probe {
                    backend: Backend::Scalar,
                    error: Some(ProbeError::TierUnavailable { arch: "x86_64" }),
                },
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            match Arm64V2Token::summon() {
                Some(token) => Probe {
                    backend: Backend::Neon(token),
                    error: None,
                },
                None => Probe {
                    backend: Backend::Scalar,
                    error: Some(ProbeError::TierUnavailable { arch: "aarch64" }),
                },
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            match Wasm128Token::summon() {
                Some(token) => Probe {
                    backend: Backend::Simd128(token),
                    error: None,
                },
                None => Probe {
                    backend: Backend::Scalar,
                    error: Some(ProbeError::TierUnavailable { arch: "wasm32" }),
                },
            }
        }
        #[cfg(not(any(
            target_arch = "x86_64",
            target_arch = "aarch64",
            target_arch = "wasm32"
        )))]
        {
            Probe {
                backend: Backend::Scalar,
                error: Some(ProbeError::UnsupportedArch {
                    arch: std::env::consts::ARCH,
                }),
            }
        }
    })
}

/// The backend every new [`crate::Converter`] starts with.
pub(crate) fn probed_backend() -> Backend {
    probe().backend
}

/// Whether the process-wide probe resolved to a SIMD backend.
pub fn simd_active() -> bool {
    probe().backend.is_simd()
}

/// The failure recorded by the one-time capability probe, if it fell back
/// to scalar code. `None` while SIMD is active.
pub fn simd_probe_error() -> Option<&'static ProbeError> {
    probe().error.as_ref()
}

// ===========================================================================
// Block dispatch
// ===========================================================================

/// Convert 32 byte-layout pixels starting at `src[0]` into canonical
/// packed values.
///
/// `src` must hold at least `backend.byte_block_min_len(format)` bytes.
pub(crate) fn convert_byte_block(
    backend: Backend,
    format: PixelFormat,
    src: &[u8],
    dst: &mut [u32; BLOCK_PIXELS],
) {
    debug_assert!(
        src.len() >= backend.byte_block_min_len(format),
        "byte block input below backend minimum"
    );
    match backend {
        Backend::Scalar => scalar::byte_block_scalar(ScalarToken, format, src, dst),
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2(t) => {
            if format.bytes_per_pixel() == 3 {
                avx2::pix3_impl_v3(t, src, dst, avx2::byte_shuf(format));
            } else {
                avx2::pix4_impl_v3(t, src, dst, avx2::byte_shuf(format));
            }
        }
        #[cfg(target_arch = "aarch64")]
        Backend::Neon(t) => {
            if format.bytes_per_pixel() == 3 {
                neon::pix3_impl_arm_v2(t, src, dst, neon::byte_shuf(format));
            } else {
                neon::pix4_impl_arm_v2(t, src, dst, neon::byte_shuf(format));
            }
        }
        #[cfg(target_arch = "wasm32")]
        Backend::Simd128(t) => {
            if format.bytes_per_pixel() == 3 {
                wasm::pix3_impl_wasm128(t, src, dst, wasm::byte_shuf(format));
            } else {
                wasm::pix4_impl_wasm128(t, src, dst, wasm::byte_shuf(format));
            }
        }
    }
}

/// Convert 32 packed-int pixels starting at `src[0]` into canonical
/// packed values. `src` must hold at least [`BLOCK_PIXELS`] values.
pub(crate) fn convert_int_block(
    backend: Backend,
    format: PixelFormat,
    src: &[u32],
    dst: &mut [u32; BLOCK_PIXELS],
) {
    debug_assert!(src.len() >= BLOCK_PIXELS, "int block input below minimum");
    match backend {
        Backend::Scalar => scalar::int_block_scalar(ScalarToken, format, src, dst),
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2(t) => avx2::pix4_impl_v3(
            t,
            bytemuck::cast_slice(&src[..BLOCK_PIXELS]),
            dst,
            avx2::int_shuf(format),
        ),
        #[cfg(target_arch = "aarch64")]
        Backend::Neon(t) => neon::pix4_impl_arm_v2(
            t,
            bytemuck::cast_slice(&src[..BLOCK_PIXELS]),
            dst,
            neon::int_shuf(format),
        ),
        #[cfg(target_arch = "wasm32")]
        Backend::Simd128(t) => wasm::pix4_impl_wasm128(
            t,
            bytemuck::cast_slice(&src[..BLOCK_PIXELS]),
            dst,
            wasm::int_shuf(format),
        ),
    }
}
