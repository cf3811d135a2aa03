// ---------------------------------------------------------------------------
// Whole-buffer decode drivers over the 32-pixel block codec.
//
// Loop shape: whole blocks while the read position stays strictly below
// `total - block_minimum`, then a per-pixel remainder. The strict bound
// means a block never starts close enough to the end to overread, so the
// SIMD kernels need no tail handling of their own.
// ---------------------------------------------------------------------------

use std::fmt;
use std::sync::OnceLock;

use crate::block::{self, BLOCK_PIXELS, Backend};
use crate::error::{ProbeError, SizeError};
use crate::format::PixelFormat;

/// Fewer whole blocks than this per worker and the parallel entry points
/// run single-threaded instead of spawning.
const MIN_BLOCKS_PER_WORKER: usize = 4;

// ===========================================================================
// Validation helpers
// ===========================================================================

#[inline]
fn check_bytes(len: usize, pixel_count: usize, bpp: usize) -> Result<usize, SizeError> {
    let needed = pixel_count
        .checked_mul(bpp)
        .ok_or(SizeError::PixelCountOverflow)?;
    if len < needed {
        return Err(SizeError::InputTooShort {
            needed,
            actual: len,
        });
    }
    Ok(needed)
}

#[inline]
fn check_ints(len: usize, pixel_count: usize) -> Result<(), SizeError> {
    if len < pixel_count {
        return Err(SizeError::InputTooShort {
            needed: pixel_count,
            actual: len,
        });
    }
    Ok(())
}

fn effective_workers(requested: Option<usize>) -> usize {
    static WORKERS: OnceLock<usize> = OnceLock::new();
    let auto = *WORKERS.get_or_init(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    requested.unwrap_or(auto).max(1)
}

// ===========================================================================
// Converter
// ===========================================================================

/// Format-bound conversion handle.
///
/// Cheap to copy; [`Converter::new`] binds the backend the one-time
/// capability probe resolved, [`Converter::scalar`] forces the scalar
/// reference path on an existing handle.
///
/// ```
/// use packrgb::Converter;
///
/// let conv = Converter::rgb();
/// let mut out = [0u32; 2];
/// conv.bytes_to_pixels(&[10, 20, 30, 40, 50, 60], &mut out).unwrap();
/// assert_eq!(out, [0x001E_140A, 0x003C_3228]);
/// ```
#[derive(Clone, Copy)]
pub struct Converter {
    format: PixelFormat,
    backend: Backend,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("format", &self.format)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Converter {
    /// Handle for `format`, backed by whatever the capability probe
    /// resolved for this process.
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            backend: block::probed_backend(),
        }
    }

    pub fn rgb() -> Self {
        Self::new(PixelFormat::Rgb)
    }

    pub fn bgr() -> Self {
        Self::new(PixelFormat::Bgr)
    }

    pub fn argb() -> Self {
        Self::new(PixelFormat::Argb)
    }

    pub fn abgr() -> Self {
        Self::new(PixelFormat::Abgr)
    }

    /// Same format, scalar backend. Deterministic reference path; also the
    /// escape hatch when acceleration is unwanted.
    pub fn scalar(self) -> Self {
        Self {
            format: self.format,
            backend: Backend::Scalar,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Whether this handle converts blocks with SIMD kernels.
    pub fn is_accelerated(&self) -> bool {
        self.backend.is_simd()
    }

    /// Backend identifier for diagnostics: `"scalar"`, `"avx2"`, `"neon"`
    /// or `"simd128"`.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The process-wide capability probe failure, if any. `None` while
    /// SIMD is active process-wide — including on handles forced down
    /// with [`Self::scalar`], whose backend is a choice, not a fault.
    pub fn probe_error(&self) -> Option<&'static ProbeError> {
        block::simd_probe_error()
    }

    /// Convert one pixel starting at `input[offset]`.
    #[inline]
    pub fn pixel_from_bytes(&self, input: &[u8], offset: usize) -> u32 {
        self.format.pixel_from_bytes(input, offset)
    }

    /// Convert one packed-int pixel.
    #[inline]
    pub fn pixel_from_u32(&self, v: u32) -> u32 {
        self.format.pixel_from_u32(v)
    }

    /// Bytes one 32-pixel block consumes: `32 * bytes_per_pixel()`.
    pub fn byte_block_len(&self) -> usize {
        BLOCK_PIXELS * self.format.bytes_per_pixel()
    }

    /// Bytes that must remain in the input when a block starts. At least
    /// [`Self::byte_block_len`]; the SIMD backends need `32 * 4` even for
    /// 3-byte pixels because they load full 4-byte lanes.
    pub fn byte_block_min_len(&self) -> usize {
        self.backend.byte_block_min_len(self.format)
    }

    /// Convert the 32 byte-layout pixels at `input[offset..]` and return
    /// the offset advanced by [`Self::byte_block_len`].
    ///
    /// `input[offset..]` must hold at least [`Self::byte_block_min_len`]
    /// bytes; the decode drivers guarantee this by construction.
    pub fn convert_block_bytes(
        &self,
        input: &[u8],
        offset: usize,
        dst: &mut [u32; BLOCK_PIXELS],
    ) -> usize {
        block::convert_byte_block(self.backend, self.format, &input[offset..], dst);
        offset + self.byte_block_len()
    }

    /// Convert the 32 packed-int pixels at `input[offset..]` and return
    /// the offset advanced by 32. `input[offset..]` must hold at least 32
    /// values.
    pub fn convert_block_u32s(
        &self,
        input: &[u32],
        offset: usize,
        dst: &mut [u32; BLOCK_PIXELS],
    ) -> usize {
        block::convert_int_block(self.backend, self.format, &input[offset..], dst);
        offset + BLOCK_PIXELS
    }

    // =======================================================================
    // Single-threaded decode
    // =======================================================================

    /// Decode `pixel_count` byte-layout pixels, invoking `emit(index, value)`
    /// for each in ascending index order.
    ///
    /// `input` may be longer than `pixel_count * bytes_per_pixel()`; the
    /// excess is ignored.
    pub fn decode_bytes(
        &self,
        input: &[u8],
        pixel_count: usize,
        mut emit: impl FnMut(usize, u32),
    ) -> Result<(), SizeError> {
        let bpp = self.format.bytes_per_pixel();
        let total = check_bytes(input.len(), pixel_count, bpp)?;
        let max_start = total.saturating_sub(self.byte_block_min_len());
        let mut pos = 0;
        let mut index = 0;
        let mut block = [0u32; BLOCK_PIXELS];
        while pos < max_start {
            pos = self.convert_block_bytes(input, pos, &mut block);
            for v in block {
                emit(index, v);
                index += 1;
            }
        }
        while index < pixel_count {
            emit(index, self.format.pixel_from_bytes(input, pos));
            pos += bpp;
            index += 1;
        }
        Ok(())
    }

    /// Decode `pixel_count` packed-int pixels, invoking `emit(index, value)`
    /// for each in ascending index order.
    pub fn decode_u32s(
        &self,
        input: &[u32],
        pixel_count: usize,
        mut emit: impl FnMut(usize, u32),
    ) -> Result<(), SizeError> {
        check_ints(input.len(), pixel_count)?;
        let max_start = pixel_count.saturating_sub(BLOCK_PIXELS);
        let mut pos = 0;
        let mut index = 0;
        let mut block = [0u32; BLOCK_PIXELS];
        while pos < max_start {
            pos = self.convert_block_u32s(input, pos, &mut block);
            for v in block {
                emit(index, v);
                index += 1;
            }
        }
        while index < pixel_count {
            emit(index, self.format.pixel_from_u32(input[index]));
            index += 1;
        }
        Ok(())
    }

    /// Decode `dst.len()` byte-layout pixels straight into `dst`.
    pub fn bytes_to_pixels(&self, input: &[u8], dst: &mut [u32]) -> Result<(), SizeError> {
        let bpp = self.format.bytes_per_pixel();
        let total = check_bytes(input.len(), dst.len(), bpp)?;
        let max_start = total.saturating_sub(self.byte_block_min_len());
        let mut pos = 0;
        let mut rest = dst;
        while pos < max_start {
            let (blk, tail) = rest.split_at_mut(BLOCK_PIXELS);
            pos = self.convert_block_bytes(input, pos, blk.try_into().unwrap());
            rest = tail;
        }
        for d in rest.iter_mut() {
            *d = self.format.pixel_from_bytes(input, pos);
            pos += bpp;
        }
        Ok(())
    }

    /// Decode `dst.len()` packed-int pixels straight into `dst`.
    pub fn u32s_to_pixels(&self, input: &[u32], dst: &mut [u32]) -> Result<(), SizeError> {
        check_ints(input.len(), dst.len())?;
        let max_start = dst.len().saturating_sub(BLOCK_PIXELS);
        let mut pos = 0;
        let mut rest = dst;
        while pos < max_start {
            let (blk, tail) = rest.split_at_mut(BLOCK_PIXELS);
            pos = self.convert_block_u32s(input, pos, blk.try_into().unwrap());
            rest = tail;
        }
        for (s, d) in input[pos..].iter().zip(rest.iter_mut()) {
            *d = self.format.pixel_from_u32(*s);
        }
        Ok(())
    }

    /// Decode `dst.len()` byte-layout pixels and map each canonical value
    /// through `palette` (for example a color-cube lookup) into `dst`.
    pub fn map_bytes(
        &self,
        input: &[u8],
        mut palette: impl FnMut(u32) -> u8,
        dst: &mut [u8],
    ) -> Result<(), SizeError> {
        self.decode_bytes(input, dst.len(), |i, v| dst[i] = palette(v))
    }

    /// Decode `dst.len()` packed-int pixels and map each canonical value
    /// through `palette` into `dst`.
    pub fn map_u32s(
        &self,
        input: &[u32],
        mut palette: impl FnMut(u32) -> u8,
        dst: &mut [u8],
    ) -> Result<(), SizeError> {
        self.decode_u32s(input, dst.len(), |i, v| dst[i] = palette(v))
    }

    // =======================================================================
    // Parallel decode
    // =======================================================================

    /// Like [`Self::decode_bytes`], fanning whole blocks out over scoped
    /// worker threads.
    ///
    /// `workers` is the thread budget; `None` uses the machine's available
    /// parallelism (resolved once per process). Each worker delivers its
    /// contiguous range in ascending index order, but arrival order across
    /// workers is unspecified; `emit` must tolerate concurrent calls.
    /// Leftover blocks and the non-block tail run on the calling thread
    /// after the workers join. With one worker, or fewer than four blocks
    /// per worker, this is plain [`Self::decode_bytes`].
    pub fn decode_bytes_parallel<F>(
        &self,
        input: &[u8],
        pixel_count: usize,
        workers: Option<usize>,
        emit: F,
    ) -> Result<(), SizeError>
    where
        F: Fn(usize, u32) + Sync,
    {
        let bpp = self.format.bytes_per_pixel();
        let total = check_bytes(input.len(), pixel_count, bpp)?;
        let block_len = self.byte_block_len();
        let max_start = total.saturating_sub(self.byte_block_min_len());
        let full_blocks = max_start.div_ceil(block_len);
        let workers = effective_workers(workers);
        let per_worker = full_blocks / workers;
        if workers <= 1 || per_worker < MIN_BLOCKS_PER_WORKER {
            return self.decode_bytes(input, pixel_count, |i, v| emit(i, v));
        }
        let conv = *self;
        std::thread::scope(|s| {
            for w in 0..workers {
                let emit = &emit;
                s.spawn(move || {
                    let mut block = [0u32; BLOCK_PIXELS];
                    let mut pos = w * per_worker * block_len;
                    let mut index = w * per_worker * BLOCK_PIXELS;
                    for _ in 0..per_worker {
                        pos = conv.convert_block_bytes(input, pos, &mut block);
                        for v in block {
                            emit(index, v);
                            index += 1;
                        }
                    }
                });
            }
        });
        let done = workers * per_worker;
        let mut pos = done * block_len;
        let mut index = done * BLOCK_PIXELS;
        let mut block = [0u32; BLOCK_PIXELS];
        while pos < max_start {
            pos = self.convert_block_bytes(input, pos, &mut block);
            for v in block {
                emit(index, v);
                index += 1;
            }
        }
        while index < pixel_count {
            emit(index, self.format.pixel_from_bytes(input, pos));
            pos += bpp;
            index += 1;
        }
        Ok(())
    }

    /// Like [`Self::decode_u32s`], fanning whole blocks out over scoped
    /// worker threads. Same delivery contract as
    /// [`Self::decode_bytes_parallel`].
    pub fn decode_u32s_parallel<F>(
        &self,
        input: &[u32],
        pixel_count: usize,
        workers: Option<usize>,
        emit: F,
    ) -> Result<(), SizeError>
    where
        F: Fn(usize, u32) + Sync,
    {
        check_ints(input.len(), pixel_count)?;
        let max_start = pixel_count.saturating_sub(BLOCK_PIXELS);
        let full_blocks = max_start.div_ceil(BLOCK_PIXELS);
        let workers = effective_workers(workers);
        let per_worker = full_blocks / workers;
        if workers <= 1 || per_worker < MIN_BLOCKS_PER_WORKER {
            return self.decode_u32s(input, pixel_count, |i, v| emit(i, v));
        }
        let conv = *self;
        std::thread::scope(|s| {
            for w in 0..workers {
                let emit = &emit;
                s.spawn(move || {
                    let mut block = [0u32; BLOCK_PIXELS];
                    let mut pos = w * per_worker * BLOCK_PIXELS;
                    let mut index = pos;
                    for _ in 0..per_worker {
                        pos = conv.convert_block_u32s(input, pos, &mut block);
                        for v in block {
                            emit(index, v);
                            index += 1;
                        }
                    }
                });
            }
        });
        let done = workers * per_worker;
        let mut pos = done * BLOCK_PIXELS;
        let mut index = pos;
        let mut block = [0u32; BLOCK_PIXELS];
        while pos < max_start {
            pos = self.convert_block_u32s(input, pos, &mut block);
            for v in block {
                emit(index, v);
                index += 1;
            }
        }
        while index < pixel_count {
            emit(index, self.format.pixel_from_u32(input[index]));
            index += 1;
        }
        Ok(())
    }

    /// Like [`Self::bytes_to_pixels`], splitting `dst` into disjoint
    /// whole-block chunks converted on scoped worker threads.
    pub fn bytes_to_pixels_parallel(
        &self,
        input: &[u8],
        dst: &mut [u32],
        workers: Option<usize>,
    ) -> Result<(), SizeError> {
        let bpp = self.format.bytes_per_pixel();
        let total = check_bytes(input.len(), dst.len(), bpp)?;
        let block_len = self.byte_block_len();
        let max_start = total.saturating_sub(self.byte_block_min_len());
        let full_blocks = max_start.div_ceil(block_len);
        let workers = effective_workers(workers);
        let per_worker = full_blocks / workers;
        if workers <= 1 || per_worker < MIN_BLOCKS_PER_WORKER {
            return self.bytes_to_pixels(input, dst);
        }
        let conv = *self;
        std::thread::scope(|s| {
            let mut rest = dst;
            for w in 0..workers {
                let (chunk, tail) = rest.split_at_mut(per_worker * BLOCK_PIXELS);
                rest = tail;
                s.spawn(move || {
                    let mut pos = w * per_worker * block_len;
                    for blk in chunk.chunks_exact_mut(BLOCK_PIXELS) {
                        pos = conv.convert_block_bytes(input, pos, blk.try_into().unwrap());
                    }
                });
            }
            let done = workers * per_worker;
            let mut pos = done * block_len;
            while pos < max_start {
                let (blk, tail) = rest.split_at_mut(BLOCK_PIXELS);
                pos = conv.convert_block_bytes(input, pos, blk.try_into().unwrap());
                rest = tail;
            }
            for d in rest.iter_mut() {
                *d = conv.format.pixel_from_bytes(input, pos);
                pos += bpp;
            }
        });
        Ok(())
    }

    /// Like [`Self::u32s_to_pixels`], splitting `dst` into disjoint
    /// whole-block chunks converted on scoped worker threads.
    pub fn u32s_to_pixels_parallel(
        &self,
        input: &[u32],
        dst: &mut [u32],
        workers: Option<usize>,
    ) -> Result<(), SizeError> {
        check_ints(input.len(), dst.len())?;
        let max_start = dst.len().saturating_sub(BLOCK_PIXELS);
        let full_blocks = max_start.div_ceil(BLOCK_PIXELS);
        let workers = effective_workers(workers);
        let per_worker = full_blocks / workers;
        if workers <= 1 || per_worker < MIN_BLOCKS_PER_WORKER {
            return self.u32s_to_pixels(input, dst);
        }
        let conv = *self;
        std::thread::scope(|s| {
            let mut rest = dst;
            for w in 0..workers {
                let (chunk, tail) = rest.split_at_mut(per_worker * BLOCK_PIXELS);
                rest = tail;
                s.spawn(move || {
                    let mut pos = w * per_worker * BLOCK_PIXELS;
                    for blk in chunk.chunks_exact_mut(BLOCK_PIXELS) {
                        pos = conv.convert_block_u32s(input, pos, blk.try_into().unwrap());
                    }
                });
            }
            let done = workers * per_worker;
            let mut pos = done * BLOCK_PIXELS;
            while pos < max_start {
                let (blk, tail) = rest.split_at_mut(BLOCK_PIXELS);
                pos = conv.convert_block_u32s(input, pos, blk.try_into().unwrap());
                rest = tail;
            }
            for (v, d) in input[pos..].iter().zip(rest.iter_mut()) {
                *d = conv.format.pixel_from_u32(*v);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const FORMATS: [PixelFormat; 4] = [
        PixelFormat::Rgb,
        PixelFormat::Bgr,
        PixelFormat::Argb,
        PixelFormat::Abgr,
    ];

    // Sizes around the block boundary plus bulk counts that engage the
    // parallel path.
    const PIXEL_COUNTS: &[usize] = &[0, 1, 2, 31, 32, 33, 63, 64, 65, 100, 1000];

    fn make_bytes(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    fn make_ints(n: usize) -> Vec<u32> {
        (0..n).map(|i| (i as u32).wrapping_mul(2_654_435_761)).collect()
    }

    fn ref_bytes(format: PixelFormat, input: &[u8], n: usize) -> Vec<u32> {
        (0..n)
            .map(|i| format.pixel_from_bytes(input, i * format.bytes_per_pixel()))
            .collect()
    }

    fn ref_ints(format: PixelFormat, input: &[u32], n: usize) -> Vec<u32> {
        input[..n].iter().map(|&v| format.pixel_from_u32(v)).collect()
    }

    #[test]
    fn decode_bytes_known_values() {
        let mut out = Vec::new();
        Converter::rgb()
            .decode_bytes(&[10, 20, 30, 40, 50, 60], 2, |_, v| out.push(v))
            .unwrap();
        assert_eq!(out, [0x001E_140A, 0x003C_3228]);
    }

    #[test]
    fn decode_u32s_known_values() {
        let mut out = Vec::new();
        Converter::argb()
            .decode_u32s(&[0xFF10_2030], 1, |_, v| out.push(v))
            .unwrap();
        assert_eq!(out, [0xFF30_2010]);
    }

    #[test]
    fn decode_bytes_matches_reference_at_every_count() {
        for format in FORMATS {
            let conv = Converter::new(format);
            for &n in PIXEL_COUNTS {
                // Slack bytes past the needed length must be ignored.
                let input = make_bytes(n * format.bytes_per_pixel() + 5);
                let expected = ref_bytes(format, &input, n);
                let mut got = Vec::with_capacity(n);
                conv.decode_bytes(&input, n, |i, v| {
                    assert_eq!(i, got.len(), "{format} n={n} out of order");
                    got.push(v);
                })
                .unwrap();
                assert_eq!(got, expected, "{format} n={n}");

                let mut buf = vec![0u32; n];
                conv.bytes_to_pixels(&input, &mut buf).unwrap();
                assert_eq!(buf, expected, "{format} n={n} buffered");
            }
        }
    }

    #[test]
    fn decode_u32s_matches_reference_at_every_count() {
        for format in FORMATS {
            let conv = Converter::new(format);
            for &n in PIXEL_COUNTS {
                let input = make_ints(n + 3);
                let expected = ref_ints(format, &input, n);
                let mut got = Vec::with_capacity(n);
                conv.decode_u32s(&input, n, |i, v| {
                    assert_eq!(i, got.len(), "{format} n={n} out of order");
                    got.push(v);
                })
                .unwrap();
                assert_eq!(got, expected, "{format} n={n}");

                let mut buf = vec![0u32; n];
                conv.u32s_to_pixels(&input, &mut buf).unwrap();
                assert_eq!(buf, expected, "{format} n={n} buffered");
            }
        }
    }

    #[test]
    fn scalar_handle_agrees_with_probed_handle() {
        for format in FORMATS {
            let conv = Converter::new(format);
            let input = make_bytes(500 * format.bytes_per_pixel());
            let mut fast = vec![0u32; 500];
            let mut slow = vec![0u32; 500];
            conv.bytes_to_pixels(&input, &mut fast).unwrap();
            conv.scalar().bytes_to_pixels(&input, &mut slow).unwrap();
            assert_eq!(fast, slow, "{format}");
            assert!(!conv.scalar().is_accelerated());
        }
    }

    #[test]
    fn opaque_formats_zero_alpha_bits() {
        for format in [PixelFormat::Rgb, PixelFormat::Bgr] {
            let conv = Converter::new(format);
            let input = vec![0xFFu8; 100 * 3];
            conv.decode_bytes(&input, 100, |i, v| {
                assert_eq!(v >> 24, 0, "{format} index {i}");
            })
            .unwrap();
            let ints = vec![u32::MAX; 100];
            conv.decode_u32s(&ints, 100, |i, v| {
                assert_eq!(v >> 24, 0, "{format} index {i}");
            })
            .unwrap();
        }
    }

    #[test]
    fn block_op_advances_and_converts() {
        let conv = Converter::abgr();
        let input = make_bytes(BLOCK_PIXELS * 4 + 7);
        let mut block = [0u32; BLOCK_PIXELS];
        let next = conv.convert_block_bytes(&input, 0, &mut block);
        assert_eq!(next, conv.byte_block_len());
        assert_eq!(block.to_vec(), ref_bytes(PixelFormat::Abgr, &input, BLOCK_PIXELS));

        let ints = make_ints(BLOCK_PIXELS + 1);
        let next = conv.convert_block_u32s(&ints, 0, &mut block);
        assert_eq!(next, BLOCK_PIXELS);
        assert_eq!(block.to_vec(), ref_ints(PixelFormat::Abgr, &ints, BLOCK_PIXELS));
    }

    #[test]
    fn parallel_decode_delivers_same_index_value_pairs() {
        for format in [PixelFormat::Rgb, PixelFormat::Abgr] {
            let conv = Converter::new(format);
            let n = 4096;
            let input = make_bytes(n * format.bytes_per_pixel());
            let expected = ref_bytes(format, &input, n);

            for workers in [Some(2), Some(3), Some(7), None] {
                let seen = Mutex::new(vec![None::<u32>; n]);
                conv.decode_bytes_parallel(&input, n, workers, |i, v| {
                    let prev = seen.lock().unwrap()[i].replace(v);
                    assert!(prev.is_none(), "{format} index {i} delivered twice");
                })
                .unwrap();
                let got: Vec<u32> = seen
                    .into_inner()
                    .unwrap()
                    .into_iter()
                    .map(|v| v.expect("missing index"))
                    .collect();
                assert_eq!(got, expected, "{format} workers={workers:?}");
            }
        }
    }

    #[test]
    fn parallel_int_decode_delivers_same_index_value_pairs() {
        let conv = Converter::argb();
        let n = 2048;
        let input = make_ints(n);
        let expected = ref_ints(PixelFormat::Argb, &input, n);
        let seen = Mutex::new(vec![None::<u32>; n]);
        conv.decode_u32s_parallel(&input, n, Some(4), |i, v| {
            let prev = seen.lock().unwrap()[i].replace(v);
            assert!(prev.is_none(), "index {i} delivered twice");
        })
        .unwrap();
        let got: Vec<u32> = seen
            .into_inner()
            .unwrap()
            .into_iter()
            .map(|v| v.expect("missing index"))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn parallel_buffer_fill_matches_serial() {
        for format in FORMATS {
            let conv = Converter::new(format);
            for n in [100usize, 1000, 4097] {
                let input = make_bytes(n * format.bytes_per_pixel());
                let mut serial = vec![0u32; n];
                let mut parallel = vec![0u32; n];
                conv.bytes_to_pixels(&input, &mut serial).unwrap();
                conv.bytes_to_pixels_parallel(&input, &mut parallel, Some(3))
                    .unwrap();
                assert_eq!(serial, parallel, "{format} n={n} bytes");

                let ints = make_ints(n);
                let mut serial = vec![0u32; n];
                let mut parallel = vec![0u32; n];
                conv.u32s_to_pixels(&ints, &mut serial).unwrap();
                conv.u32s_to_pixels_parallel(&ints, &mut parallel, Some(3))
                    .unwrap();
                assert_eq!(serial, parallel, "{format} n={n} ints");
            }
        }
    }

    #[test]
    fn single_worker_falls_back_to_serial() {
        let conv = Converter::bgr();
        let n = 1000;
        let input = make_bytes(n * 3);
        let mut out = vec![0u32; n];
        conv.bytes_to_pixels_parallel(&input, &mut out, Some(1)).unwrap();
        assert_eq!(out, ref_bytes(PixelFormat::Bgr, &input, n));
    }

    #[test]
    fn map_wrappers_apply_palette_in_order() {
        let conv = Converter::rgb();
        let n = 70;
        let input = make_bytes(n * 3);
        let expected: Vec<u8> = ref_bytes(PixelFormat::Rgb, &input, n)
            .iter()
            .map(|v| (v & 0xFF) as u8)
            .collect();
        let mut out = vec![0u8; n];
        conv.map_bytes(&input, |v| (v & 0xFF) as u8, &mut out).unwrap();
        assert_eq!(out, expected);

        let ints = make_ints(n);
        let expected: Vec<u8> = ref_ints(PixelFormat::Rgb, &ints, n)
            .iter()
            .map(|v| (v >> 8) as u8)
            .collect();
        let mut out = vec![0u8; n];
        conv.map_u32s(&ints, |v| (v >> 8) as u8, &mut out).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn short_buffers_are_rejected() {
        let conv = Converter::argb();
        assert_eq!(
            conv.decode_bytes(&[0u8; 7], 2, |_, _| {}),
            Err(SizeError::InputTooShort { needed: 8, actual: 7 })
        );
        assert_eq!(
            conv.decode_u32s(&[0u32; 1], 2, |_, _| {}),
            Err(SizeError::InputTooShort { needed: 2, actual: 1 })
        );
        let mut out = [0u32; 4];
        assert_eq!(
            conv.bytes_to_pixels(&[0u8; 15], &mut out),
            Err(SizeError::InputTooShort { needed: 16, actual: 15 })
        );
        assert_eq!(
            conv.decode_bytes_parallel(&[0u8; 3], 1, Some(2), |_, _| {}),
            Err(SizeError::InputTooShort { needed: 4, actual: 3 })
        );
        // pixel_count * bytes_per_pixel past usize::MAX must fail the
        // overflow check, not wrap into a bogus length.
        assert_eq!(
            conv.decode_bytes(&[], usize::MAX, |_, _| {}),
            Err(SizeError::PixelCountOverflow)
        );
    }

    #[test]
    fn probe_surface_is_consistent() {
        let conv = Converter::rgb();
        assert_eq!(conv.is_accelerated(), crate::simd_active());
        if conv.is_accelerated() {
            assert!(conv.probe_error().is_none());
            assert_ne!(conv.backend_name(), "scalar");
        } else {
            assert!(conv.probe_error().is_some());
            assert_eq!(conv.backend_name(), "scalar");
        }
        // A forced-scalar handle reports the process probe state, not its
        // own backend choice.
        assert_eq!(
            conv.scalar().probe_error().is_some(),
            conv.probe_error().is_some()
        );
    }
}
