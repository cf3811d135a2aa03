//! # packrgb
//!
//! *Pack your pixels tight.*
//!
//! Decodes raw pixel buffers — interleaved RGB / BGR / ARGB / ABGR bytes or
//! packed ints — into one canonical packed value: a `u32` whose
//! little-endian bytes are `[R, G, B, A]`. Layouts without alpha decode
//! with alpha = 0.
//!
//! Conversion runs in 32-pixel blocks with SIMD kernels on x86-64 AVX2,
//! ARM NEON and WASM SIMD128, falling back to scalar code everywhere else.
//! The capability probe runs once per process and its outcome is queryable
//! via [`simd_active`] and [`simd_probe_error`].
//!
//! ```
//! use packrgb::Converter;
//!
//! let conv = Converter::rgb();
//! let mut pixels = [0u32; 2];
//! conv.bytes_to_pixels(&[10, 20, 30, 40, 50, 60], &mut pixels).unwrap();
//! assert_eq!(pixels, [0x001E_140A, 0x003C_3228]);
//! ```
//!
//! Whole-frame work can fan out over scoped worker threads with the
//! `*_parallel` entry points on [`Converter`].

#![forbid(unsafe_code)]

mod block;
mod convert;
mod error;
mod format;

pub use block::{BLOCK_PIXELS, simd_active, simd_probe_error};
pub use convert::Converter;
pub use error::{ProbeError, SizeError};
pub use format::PixelFormat;
