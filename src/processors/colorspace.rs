//! Color-space conversions for the enhancement pipeline.
//!
//! Contrast correction operates on a luma or lightness plane and white balance
//! operates on chrominance planes, so the engine needs 8-bit conversions
//! between RGB and two working spaces:
//!
//! * **YUV** (BT.601 full range) for global histogram equalization
//! * **CIELAB** (D65, L scaled to 0-255, a/b biased at 128) for CLAHE and
//!   white-balance correction
//!
//! All conversions are per-pixel, pure, and clamp to the 0-255 range. The
//! round trip is not bit-exact (both spaces quantize to 8 bits) but stays
//! within a couple of intensity levels.

/// Reference white (D65) used for the CIELAB conversion.
const D65: [f32; 3] = [0.950_47, 1.0, 1.088_83];

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Converts an RGB pixel to full-range BT.601 YUV.
///
/// Chrominance channels are biased at 128 so that neutral gray maps to
/// `(y, 128, 128)`.
#[inline]
pub fn rgb_to_yuv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 0.492 * (b - y) + 128.0;
    let v = 0.877 * (r - y) + 128.0;
    [clamp_u8(y), clamp_u8(u), clamp_u8(v)]
}

/// Converts a full-range BT.601 YUV pixel back to RGB.
#[inline]
pub fn yuv_to_rgb(yuv: [u8; 3]) -> [u8; 3] {
    let y = f32::from(yuv[0]);
    let u = f32::from(yuv[1]) - 128.0;
    let v = f32::from(yuv[2]) - 128.0;
    let r = y + 1.139_83 * v;
    let g = y - 0.394_65 * u - 0.580_60 * v;
    let b = y + 2.032_11 * u;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

#[inline]
fn srgb_expand(c: u8) -> f32 {
    let c = f32::from(c) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn srgb_compress(c: f32) -> u8 {
    let c = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    clamp_u8(c * 255.0)
}

#[inline]
fn lab_f(t: f32) -> f32 {
    // (6/29)^3 threshold of the CIE L* function.
    const EPS: f32 = 0.008_856_452;
    const KAPPA: f32 = 903.296_3;
    if t > EPS {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if f > DELTA {
        f * f * f
    } else {
        3.0 * DELTA * DELTA * (f - 4.0 / 29.0)
    }
}

/// Converts an sRGB pixel to 8-bit CIELAB.
///
/// L is scaled from `[0, 100]` to `[0, 255]`; a and b are offset by 128 so a
/// neutral pixel maps to `(l, 128, 128)`.
#[inline]
pub fn rgb_to_lab(rgb: [u8; 3]) -> [u8; 3] {
    let r = srgb_expand(rgb[0]);
    let g = srgb_expand(rgb[1]);
    let b = srgb_expand(rgb[2]);

    let x = 0.412_456 * r + 0.357_576 * g + 0.180_437 * b;
    let y = 0.212_672 * r + 0.715_152 * g + 0.072_175 * b;
    let z = 0.019_334 * r + 0.119_192 * g + 0.950_304 * b;

    let fx = lab_f(x / D65[0]);
    let fy = lab_f(y / D65[1]);
    let fz = lab_f(z / D65[2]);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [
        clamp_u8(l * 255.0 / 100.0),
        clamp_u8(a + 128.0),
        clamp_u8(b + 128.0),
    ]
}

/// Converts an 8-bit CIELAB pixel (as produced by [`rgb_to_lab`]) back to sRGB.
#[inline]
pub fn lab_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l = f32::from(lab[0]) * 100.0 / 255.0;
    let a = f32::from(lab[1]) - 128.0;
    let b = f32::from(lab[2]) - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = D65[0] * lab_f_inv(fx);
    let y = D65[1] * lab_f_inv(fy);
    let z = D65[2] * lab_f_inv(fz);

    let r = 3.240_454 * x - 1.537_139 * y - 0.498_531 * z;
    let g = -0.969_266 * x + 1.876_011 * y + 0.041_556 * z;
    let b = 0.055_643 * x - 0.204_026 * y + 1.057_225 * z;

    [srgb_compress(r), srgb_compress(g), srgb_compress(b)]
}
