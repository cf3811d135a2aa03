//! Validates the code examples from README.md compile and behave correctly.

use packrgb::{Converter, PixelFormat};

#[test]
fn readme_core_api() {
    let conv = Converter::rgb();
    let mut pixels = [0u32; 2];
    conv.bytes_to_pixels(&[10, 20, 30, 40, 50, 60], &mut pixels)
        .unwrap();
    assert_eq!(pixels, [0x001E_140A, 0x003C_3228]);

    let conv = Converter::argb();
    assert_eq!(conv.pixel_from_u32(0xFF10_2030), 0xFF30_2010);
}

#[test]
fn readme_callback_decode() {
    let frame = vec![0x80u8; 64 * 4];
    let mut count = 0;
    Converter::abgr()
        .decode_bytes(&frame, 64, |_, v| {
            assert_eq!(v, 0x8080_8080);
            count += 1;
        })
        .unwrap();
    assert_eq!(count, 64);
}

#[test]
fn readme_parallel() {
    let conv = Converter::new(PixelFormat::Bgr);
    let frame: Vec<u8> = (0..1920 * 3).map(|i| (i % 256) as u8).collect();
    let mut serial = vec![0u32; 1920];
    let mut parallel = vec![0u32; 1920];
    conv.bytes_to_pixels(&frame, &mut serial).unwrap();
    conv.bytes_to_pixels_parallel(&frame, &mut parallel, None)
        .unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn readme_probe() {
    let conv = Converter::rgb();
    if packrgb::simd_active() {
        assert!(conv.is_accelerated());
    } else {
        // The recorded probe failure explains the scalar fallback.
        assert!(packrgb::simd_probe_error().is_some());
        assert_eq!(conv.backend_name(), "scalar");
    }
}
