//! Byte/float sample conversion at the pipeline edges.
//!
//! `byte_to_float` widens the 8-bit source into a margin matrix, zeroing
//! the margin and the lane padding so the first convolution pass can run
//! in place. `float_to_byte_transpose` fuses the final transpose with
//! quantization back to bytes.
//!
//! Quantization is round-half-up with clamping:
//! `trunc(clamp(v + 0.5, 0, 255))`. The scalar and SIMD paths evaluate the
//! same formula, so they agree for every finite input.

use crate::image::{MarginMat, LANES};
use imgref::{ImgRef, ImgRefMut};
use multiversion::multiversion;
use wide::f32x4;

/// Widens `src` into the payloads of `dst`, one row per source row.
///
/// The margin and payload columns past `src.width()` are zero-filled.
/// Requires `dst.width() >= src.width()` and `dst.rows() >= src.height()`.
// `multiversion` cannot expand elided lifetimes, hence the named one.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
pub fn byte_to_float<'a>(dst: &'a mut MarginMat, src: ImgRef<'a, u8>) {
    debug_assert!(dst.width() >= src.width());
    debug_assert!(dst.rows() >= src.height());
    let margin = dst.margin();
    let width = src.width();

    for (y, src_row) in src.rows().enumerate() {
        let out = dst.row_mut(y);
        out[..margin].fill(0.0);
        let payload = &mut out[margin..];
        for (d, &s) in payload[..width].iter_mut().zip(src_row) {
            *d = f32::from(s);
        }
        payload[width..].fill(0.0);
    }
}

/// Rounds half-up and clamps to the byte range.
#[inline]
#[must_use]
pub fn quantize(v: f32) -> u8 {
    (v + 0.5).clamp(0.0, 255.0) as u8
}

#[inline(always)]
fn quantize4(v: f32x4) -> [i32; LANES] {
    let half = f32x4::splat(0.5);
    let lo = f32x4::splat(0.0);
    let hi = f32x4::splat(255.0);
    (v + half).max(lo).min(hi).trunc_int().to_array()
}

/// Transposes `src` into `dst`, quantizing each sample to a byte:
/// `dst[r][c] = quantize(src.row(c)[col0 + r])`.
///
/// Destination columns past the available source rows are zero-filled.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
pub fn float_to_byte_transpose<'a>(mut dst: ImgRefMut<'a, u8>, src: &'a MarginMat, col0: usize) {
    let out_w = dst.width();
    let avail = src.rows().min(out_w);
    let chunked = avail & !(LANES - 1);

    for (r, dst_row) in dst.rows_mut().enumerate() {
        // Gather four source rows per lane group, as the reference's
        // strided loads do.
        let mut c = 0;
        while c < chunked {
            let v = f32x4::from([
                src.row(c)[col0 + r],
                src.row(c + 1)[col0 + r],
                src.row(c + 2)[col0 + r],
                src.row(c + 3)[col0 + r],
            ]);
            let q = quantize4(v);
            dst_row[c] = q[0] as u8;
            dst_row[c + 1] = q[1] as u8;
            dst_row[c + 2] = q[2] as u8;
            dst_row[c + 3] = q[3] as u8;
            c += LANES;
        }
        while c < avail {
            dst_row[c] = quantize(src.row(c)[col0 + r]);
            c += 1;
        }
        for b in &mut dst_row[avail..] {
            *b = 0;
        }
    }
}
