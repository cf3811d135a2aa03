use super::*;
use archmage::testing::{CompileTimePolicy, for_each_token_permutation};

fn policy() -> CompileTimePolicy {
    if std::env::var_os("CI").is_some() {
        CompileTimePolicy::Fail
    } else {
        CompileTimePolicy::WarnStderr
    }
}

const FORMATS: [PixelFormat; 4] = [
    PixelFormat::Rgb,
    PixelFormat::Bgr,
    PixelFormat::Argb,
    PixelFormat::Abgr,
];

// --- Helpers to generate test data ---

fn make_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

fn make_ints(n: usize) -> Vec<u32> {
    (0..n).map(|i| (i as u32).wrapping_mul(2_654_435_761)).collect()
}

// Backends whose tokens summon under the current permutation. Empty on
// architectures without a SIMD backend.
fn simd_backends() -> Vec<Backend> {
    #[allow(unused_mut)]
    let mut v = Vec::new();
    #[cfg(target_arch = "x86_64")]
    if let Some(t) = X64V3Token::summon() {
        v.push(Backend::Avx2(t));
    }
    #[cfg(target_arch = "aarch64")]
    if let Some(t) = Arm64V2Token::summon() {
        v.push(Backend::Neon(t));
    }
    #[cfg(target_arch = "wasm32")]
    if let Some(t) = Wasm128Token::summon() {
        v.push(Backend::Simd128(t));
    }
    v
}

// -----------------------------------------------------------------------
// SIMD blocks against the scalar reference — at every capability tier
// -----------------------------------------------------------------------

#[test]
fn permutation_byte_blocks_match_scalar() {
    let report = for_each_token_permutation(policy(), |perm| {
        // Slack beyond the 128-byte minimum, plus unaligned start offsets.
        let buf = make_bytes(BLOCK_PIXELS * 4 + 64);
        for backend in simd_backends() {
            for format in FORMATS {
                for off in [0usize, 1, 3, 17] {
                    let src = &buf[off..];
                    let mut expected = [0u32; BLOCK_PIXELS];
                    scalar::byte_block_scalar(ScalarToken, format, src, &mut expected);
                    let mut got = [0u32; BLOCK_PIXELS];
                    convert_byte_block(backend, format, src, &mut got);
                    assert_eq!(
                        got,
                        expected,
                        "byte block {format} off={off} backend={} tier={perm}",
                        backend.name()
                    );
                }
            }
        }
    });
    eprintln!("byte_blocks: {report}");
}

#[test]
fn permutation_int_blocks_match_scalar() {
    let report = for_each_token_permutation(policy(), |perm| {
        let buf = make_ints(BLOCK_PIXELS + 8);
        for backend in simd_backends() {
            for format in FORMATS {
                for off in [0usize, 1, 5] {
                    let src = &buf[off..];
                    let mut expected = [0u32; BLOCK_PIXELS];
                    scalar::int_block_scalar(ScalarToken, format, src, &mut expected);
                    let mut got = [0u32; BLOCK_PIXELS];
                    convert_int_block(backend, format, src, &mut got);
                    assert_eq!(
                        got,
                        expected,
                        "int block {format} off={off} backend={} tier={perm}",
                        backend.name()
                    );
                }
            }
        }
    });
    eprintln!("int_blocks: {report}");
}

#[test]
fn permutation_opaque_blocks_zero_alpha() {
    let report = for_each_token_permutation(policy(), |perm| {
        // All-0xFF input: any alpha leak shows up in bits 24-31.
        let bytes = vec![0xFFu8; BLOCK_PIXELS * 4];
        let ints = vec![u32::MAX; BLOCK_PIXELS];
        let mut backends = vec![Backend::Scalar];
        backends.extend(simd_backends());
        for backend in backends {
            for format in [PixelFormat::Rgb, PixelFormat::Bgr] {
                let mut out = [0u32; BLOCK_PIXELS];
                convert_byte_block(backend, format, &bytes, &mut out);
                assert!(
                    out.iter().all(|v| v >> 24 == 0),
                    "byte alpha leak {format} backend={} tier={perm}",
                    backend.name()
                );
                let mut out = [0u32; BLOCK_PIXELS];
                convert_int_block(backend, format, &ints, &mut out);
                assert!(
                    out.iter().all(|v| v >> 24 == 0),
                    "int alpha leak {format} backend={} tier={perm}",
                    backend.name()
                );
            }
        }
    });
    eprintln!("opaque_blocks: {report}");
}

// -----------------------------------------------------------------------
// Backend metadata
// -----------------------------------------------------------------------

#[test]
fn scalar_minimum_is_exact_block_width() {
    assert_eq!(Backend::Scalar.byte_block_min_len(PixelFormat::Rgb), 96);
    assert_eq!(Backend::Scalar.byte_block_min_len(PixelFormat::Argb), 128);
}

#[test]
fn simd_minimum_is_full_lane_width() {
    for backend in simd_backends() {
        for format in FORMATS {
            assert_eq!(backend.byte_block_min_len(format), 128);
        }
    }
}

#[test]
fn probe_resolves_once_and_is_queryable() {
    let first = simd_active();
    // Resolved state never flips within a process.
    assert_eq!(simd_active(), first);
    if first {
        assert!(simd_probe_error().is_none());
    } else {
        assert!(simd_probe_error().is_some());
    }
}
