use thiserror::Error;

/// Buffer validation failure for a whole-buffer conversion call.
///
/// Returned by the [`crate::Converter`] decode entry points before any
/// pixel is touched. The hot loops never re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SizeError {
    /// Input buffer holds fewer than the requested number of pixels.
    #[error("input buffer too short: needed {needed}, got {actual}")]
    InputTooShort { needed: usize, actual: usize },
    /// `pixel_count * bytes_per_pixel` does not fit in `usize`.
    #[error("pixel count overflows the addressable byte range")]
    PixelCountOverflow,
}

/// Why the one-time capability probe resolved to scalar code.
///
/// Recorded at most once per process; see [`crate::simd_probe_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// The target architecture has a SIMD backend, but this CPU (or the
    /// runtime) does not expose the required feature tier.
    #[error("simd tier unavailable on this {arch} cpu")]
    TierUnavailable { arch: &'static str },
    /// No SIMD backend exists for the compile target at all.
    #[error("no simd backend for target arch {arch}")]
    UnsupportedArch { arch: &'static str },
}
