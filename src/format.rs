use core::fmt;

/// Source pixel layout, named by channel order in memory (byte inputs) or
/// from the most significant byte down (packed-int inputs).
///
/// Every layout converts to the same canonical packed value: a `u32` whose
/// little-endian bytes are `[R, G, B, A]` — red in bits 0–7, green 8–15,
/// blue 16–23, alpha 24–31. Layouts without an alpha channel produce
/// alpha = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel, `[R, G, B]`; packed int `0x00RRGGBB`.
    Rgb,
    /// 3 bytes per pixel, `[B, G, R]`; packed int `0x00BBGGRR`.
    Bgr,
    /// 4 bytes per pixel, `[A, R, G, B]`; packed int `0xAARRGGBB`.
    Argb,
    /// 4 bytes per pixel, `[A, B, G, R]`; packed int `0xAABBGGRR`.
    Abgr,
}

impl PixelFormat {
    /// Width of one pixel in the byte representation: 3 without alpha,
    /// 4 with.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Argb | PixelFormat::Abgr => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Argb | PixelFormat::Abgr)
    }

    /// Convert one pixel starting at `input[offset]` to the canonical
    /// packed value. Reads exactly [`Self::bytes_per_pixel`] bytes.
    ///
    /// Panics if the slice is too short; whole-buffer entry points
    /// validate once so this never fires there.
    #[inline]
    pub fn pixel_from_bytes(self, input: &[u8], offset: usize) -> u32 {
        match self {
            PixelFormat::Rgb => {
                input[offset] as u32
                    | (input[offset + 1] as u32) << 8
                    | (input[offset + 2] as u32) << 16
            }
            PixelFormat::Bgr => {
                (input[offset] as u32) << 16
                    | (input[offset + 1] as u32) << 8
                    | input[offset + 2] as u32
            }
            PixelFormat::Argb => {
                (input[offset] as u32) << 24
                    | input[offset + 1] as u32
                    | (input[offset + 2] as u32) << 8
                    | (input[offset + 3] as u32) << 16
            }
            PixelFormat::Abgr => {
                (input[offset] as u32) << 24
                    | (input[offset + 1] as u32) << 16
                    | (input[offset + 2] as u32) << 8
                    | input[offset + 3] as u32
            }
        }
    }

    /// Convert one packed-int pixel to the canonical packed value.
    ///
    /// For the 3-channel layouts any high-byte garbage in the input is
    /// masked off. The ARGB reorder is an R/B lane swap and therefore
    /// self-inverse; ABGR is already canonical.
    #[inline]
    pub const fn pixel_from_u32(self, v: u32) -> u32 {
        match self {
            PixelFormat::Rgb => ((v >> 16) & 0xFF) | (v & 0xFF00) | ((v & 0xFF) << 16),
            PixelFormat::Bgr => v & 0x00FF_FFFF,
            PixelFormat::Argb => ((v >> 16) & 0xFF) | (v & 0xFF00_FF00) | ((v & 0xFF) << 16),
            PixelFormat::Abgr => v,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PixelFormat::Rgb => "rgb",
            PixelFormat::Bgr => "bgr",
            PixelFormat::Argb => "argb",
            PixelFormat::Abgr => "abgr",
        })
    }
}
