//! 1D convolution kernels over margin rows.
//!
//! A pass computes a shifted correlation: with margin `m`, lane-padded
//! payload width `W` and taps `t[0..fw)`, every row position
//! `p in [m - fw_ex, m + W)` (`fw_ex` = `fw` rounded up to the lane width)
//! is overwritten with
//!
//! ```text
//! out[p] = sum(k in 0..fw) srcval(p + k) * t[k]
//! ```
//!
//! where `srcval(q)` is the pre-pass row content for `q in [m, m + W)` and
//! zero outside. Any tap whose source sample falls outside the payload
//! contributes nothing, which is exactly zero-padded convolution with the
//! active window narrowed near the edges.
//!
//! Processing left to right makes the pass safe in place: the output for
//! position `p` only reads positions `>= p`, and everything at `>= p` still
//! holds pre-pass content. The margin cells double as the zeroed
//! out-of-range source samples, so producing stages must leave the margin
//! zeroed (debug-asserted here).
//!
//! Three implementations agree within a few ULPs:
//! - a portable scalar reference (arbitrary tap count),
//! - a generic `f32x4` kernel (lane-multiple tap count),
//! - compile-time-specialized kernels for tap counts up to 28, fully
//!   unrolled via a const-generic inner loop, plus a symmetric 3-tap path
//!   that halves the multiply count.

use crate::image::{round_up_lanes, MarginMat, LANES};
use multiversion::multiversion;
use wide::f32x4;

/// Scalar reference for one row. Handles arbitrary `taps.len()`.
///
/// Requires `round_up_lanes(taps.len()) <= margin`.
pub fn convolve_row_scalar(row: &mut [f32], margin: usize, taps: &[f32]) {
    let fwx = round_up_lanes(taps.len());
    debug_assert!(fwx <= margin);
    let lo = margin;
    let hi = row.len();
    for p in (margin - fwx)..hi {
        let k0 = lo.saturating_sub(p);
        let k1 = taps.len().min(hi - p);
        let mut sum = 0.0f32;
        for k in k0..k1 {
            sum += row[p + k] * taps[k];
        }
        row[p] = sum;
    }
}

/// Scalar reference applied to every row of a matrix.
pub fn convolve_image_scalar(buf: &mut MarginMat, taps: &[f32]) {
    let margin = buf.margin();
    for y in 0..buf.rows() {
        convolve_row_scalar(buf.row_mut(y), margin, taps);
    }
}

/// Loads four consecutive samples starting at `q`, substituting zero for
/// lanes at or beyond `hi`.
#[inline(always)]
fn load_zfill(row: &[f32], q: usize, hi: usize) -> f32x4 {
    let mut lanes = [0.0f32; LANES];
    let n = (hi - q).min(LANES);
    lanes[..n].copy_from_slice(&row[q..q + n]);
    f32x4::from(lanes)
}

/// Vectorized row kernel shared by the generic and specialized paths.
///
/// `tapv` holds one splatted vector per tap. The left margin needs no
/// special casing: those cells are zero on entry and are only written after
/// every read of them, so the full-window loop already sees the zero
/// out-of-range samples. When the payload is narrower than the filter the
/// two margins overlap and the clipped right-margin loop degenerates into
/// the merged shrinking-then-growing window.
#[inline(always)]
fn convolve_row_lanes(row: &mut [f32], margin: usize, tapv: &[f32x4]) {
    let fwx = round_up_lanes(tapv.len());
    debug_assert!(fwx <= margin);
    debug_assert!(row[margin - fwx..margin].iter().all(|&v| v == 0.0));
    let hi = row.len();
    let interior_end = hi - fwx;

    // Interior: full tap window, every read lands inside the row.
    let mut p = margin - fwx;
    while p < interior_end {
        let mut sum = f32x4::splat(0.0);
        for (k, &t) in tapv.iter().enumerate() {
            let win: [f32; LANES] = row[p + k..p + k + LANES].try_into().unwrap();
            sum += f32x4::from(win) * t;
        }
        row[p..p + LANES].copy_from_slice(&sum.to_array());
        p += LANES;
    }

    // Right margin: the active window shrinks as reads run past the row.
    while p < hi {
        let mut sum = f32x4::splat(0.0);
        for (k, &t) in tapv.iter().enumerate().take(hi - p) {
            sum += load_zfill(row, p + k, hi) * t;
        }
        row[p..p + LANES].copy_from_slice(&sum.to_array());
        p += LANES;
    }
}

/// Generic vectorized kernel for an arbitrary lane-multiple tap count.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
pub fn convolve_image_generic(buf: &mut MarginMat, taps: &[f32]) {
    debug_assert_eq!(taps.len() % LANES, 0);
    let tapv: Vec<f32x4> = taps.iter().map(|&t| f32x4::splat(t)).collect();
    let margin = buf.margin();
    for y in 0..buf.rows() {
        convolve_row_lanes(buf.row_mut(y), margin, &tapv);
    }
}

/// Specialized kernel body; monomorphization unrolls the tap loop.
#[inline(always)]
fn convolve_image_fixed<const FW: usize>(buf: &mut MarginMat, taps: &[f32]) {
    let tapv: [f32x4; FW] = core::array::from_fn(|k| f32x4::splat(taps[k]));
    let margin = buf.margin();
    for y in 0..buf.rows() {
        convolve_row_lanes(buf.row_mut(y), margin, &tapv);
    }
}

macro_rules! fixed_kernels {
    ($(($name:ident, $fw:literal)),+ $(,)?) => {
        $(
            #[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
            pub(crate) fn $name(buf: &mut MarginMat, taps: &[f32]) {
                convolve_image_fixed::<$fw>(buf, taps);
            }
        )+
    };
}

// One specialized kernel per dispatchable tap count (N or the next
// multiple of four, mirroring the dispatch table in `dispatch`).
fixed_kernels!(
    (filter_fixed_1, 1),
    (filter_fixed_4, 4),
    (filter_fixed_5, 5),
    (filter_fixed_8, 8),
    (filter_fixed_9, 9),
    (filter_fixed_12, 12),
    (filter_fixed_13, 13),
    (filter_fixed_16, 16),
    (filter_fixed_17, 17),
    (filter_fixed_20, 20),
    (filter_fixed_21, 21),
    (filter_fixed_24, 24),
    (filter_fixed_25, 25),
    (filter_fixed_28, 28),
);

/// Symmetric 3-tap fast path for taps `[edge, center, edge]`.
///
/// The two equal-weight source windows are added before multiplying, which
/// halves the multiplies per output lane.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
pub fn convolve_image_sym3(buf: &mut MarginMat, edge: f32, center: f32) {
    let a = f32x4::splat(edge);
    let b = f32x4::splat(center);
    let margin = buf.margin();
    for y in 0..buf.rows() {
        let row = buf.row_mut(y);
        debug_assert!(row[margin - LANES..margin].iter().all(|&v| v == 0.0));
        let hi = row.len();
        let interior_end = hi - LANES;

        let mut p = margin - LANES;
        while p < interior_end {
            let w0: [f32; LANES] = row[p..p + LANES].try_into().unwrap();
            let w1: [f32; LANES] = row[p + 1..p + 1 + LANES].try_into().unwrap();
            let w2: [f32; LANES] = row[p + 2..p + 2 + LANES].try_into().unwrap();
            let sum = (f32x4::from(w0) + f32x4::from(w2)) * a + f32x4::from(w1) * b;
            row[p..p + LANES].copy_from_slice(&sum.to_array());
            p += LANES;
        }
        // Final group straddles the end of the row.
        while p < hi {
            let w0 = load_zfill(row, p, hi);
            let w1 = load_zfill(row, p + 1, hi);
            let w2 = load_zfill(row, p + 2, hi);
            let sum = (w0 + w2) * a + w1 * b;
            row[p..p + LANES].copy_from_slice(&sum.to_array());
            p += LANES;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rows: usize, margin: usize, width: usize, f: impl Fn(usize, usize) -> f32) -> MarginMat {
        let mut m = MarginMat::new(rows, margin, width);
        for y in 0..rows {
            for (x, v) in m.payload_mut(y).iter_mut().enumerate() {
                *v = f(y, x);
            }
        }
        m
    }

    fn max_rel_diff(a: &MarginMat, b: &MarginMat) -> f32 {
        let mut worst = 0.0f32;
        for y in 0..a.rows() {
            for (&va, &vb) in a.row(y).iter().zip(b.row(y)) {
                let scale = va.abs().max(vb.abs()).max(1.0);
                worst = worst.max((va - vb).abs() / scale);
            }
        }
        worst
    }

    #[test]
    fn test_zero_kernel_zero_output() {
        let mut buf = filled(2, 8, 16, |y, x| (y * 31 + x * 7) as f32);
        convolve_image_generic(&mut buf, &[0.0; 8]);
        for y in 0..2 {
            assert!(buf.row(y).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_identity_kernel() {
        let src = filled(1, 4, 8, |_, x| x as f32 + 1.0);
        let mut buf = src.clone();
        filter_fixed_1(&mut buf, &[1.0, 0.0, 0.0, 0.0]);
        // Output window starts one lane group before the payload.
        for x in 0..8 {
            assert!((buf.payload(0)[x] - src.payload(0)[x]).abs() < 1e-6);
        }
        assert!(buf.row(0)[..4].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_boundary_scenario() {
        // width 5 row [0,0,5,0,0] with taps [1,1,1]: zero-boundary
        // correlation shifted one lane group to the left.
        let mut buf = MarginMat::new(1, 4, 8);
        buf.payload_mut(0)[2] = 5.0;
        let margin = buf.margin();
        convolve_row_scalar(buf.row_mut(0), margin, &[1.0, 1.0, 1.0]);
        // out[p] = src[p] + src[p+1] + src[p+2]; logical sample i sits at
        // row index margin + i, its centered output at margin + i - 1.
        let row = buf.row(0);
        let centered: Vec<f32> = (0..5).map(|i| row[margin + i - 1]).collect();
        assert_eq!(centered, vec![0.0, 5.0, 5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_scalar_vector_equivalence_all_lengths() {
        for &fw in &[1usize, 2, 3, 4, 5, 8, 12, 16, 20, 24, 28] {
            let margin = round_up_lanes(fw).max(LANES);
            let taps: Vec<f32> = (0..fw).map(|k| 0.3 + 0.1 * k as f32).collect();
            let mut padded = taps.clone();
            padded.resize(round_up_lanes(fw), 0.0);

            let mut scalar = filled(3, margin, 32, |y, x| ((y * 97 + x * 13) % 23) as f32);
            let mut vector = scalar.clone();
            convolve_image_scalar(&mut scalar, &taps);
            convolve_image_generic(&mut vector, &padded);
            assert!(
                max_rel_diff(&scalar, &vector) < 1e-4,
                "generic path diverged for fw={fw}"
            );
        }
    }

    #[test]
    fn test_merged_margins_when_row_narrower_than_filter() {
        // Payload of 4 with an 8-tap filter: left and right margins overlap.
        let taps: Vec<f32> = (0..8).map(|k| 1.0 / (k + 1) as f32).collect();
        let mut scalar = filled(1, 8, 4, |_, x| (x + 1) as f32);
        let mut vector = scalar.clone();
        convolve_image_scalar(&mut scalar, &taps);
        convolve_image_generic(&mut vector, &taps);
        assert!(max_rel_diff(&scalar, &vector) < 1e-4);
    }

    #[test]
    fn test_linearity() {
        let taps = [0.25f32, 0.5, 0.25, 0.0];
        let x = filled(1, 4, 16, |_, i| (i as f32).sin());
        let y = filled(1, 4, 16, |_, i| ((i * i) % 11) as f32);
        let (a, b) = (2.0f32, -0.5f32);

        let mut combined = MarginMat::new(1, 4, 16);
        for i in 0..16 {
            combined.payload_mut(0)[i] = a * x.payload(0)[i] + b * y.payload(0)[i];
        }
        convolve_image_generic(&mut combined, &taps);

        let mut cx = x.clone();
        let mut cy = y.clone();
        convolve_image_generic(&mut cx, &taps);
        convolve_image_generic(&mut cy, &taps);

        for p in 0..combined.row(0).len() {
            let expect = a * cx.row(0)[p] + b * cy.row(0)[p];
            assert!((combined.row(0)[p] - expect).abs() < 1e-3);
        }
    }

    #[test]
    fn test_sym3_matches_generic() {
        let (a, b) = (0.25f32, 0.5f32);
        let mut sym = filled(2, 4, 16, |y, x| ((y + 2) * x % 17) as f32);
        let mut gen = sym.clone();
        convolve_image_sym3(&mut sym, a, b);
        convolve_image_generic(&mut gen, &[a, b, a, 0.0]);
        assert!(max_rel_diff(&sym, &gen) < 1e-4);
    }

    #[test]
    fn test_fixed_paths_match_scalar() {
        type Kernel = fn(&mut MarginMat, &[f32]);
        let cases: &[(usize, Kernel)] = &[
            (1, filter_fixed_1),
            (4, filter_fixed_4),
            (5, filter_fixed_5),
            (8, filter_fixed_8),
            (12, filter_fixed_12),
            (16, filter_fixed_16),
            (20, filter_fixed_20),
            (24, filter_fixed_24),
            (28, filter_fixed_28),
        ];
        for &(fw, kernel) in cases {
            let margin = round_up_lanes(fw);
            let taps: Vec<f32> = (0..fw).map(|k| ((k % 5) as f32 - 2.0) * 0.2).collect();
            let mut padded = taps.clone();
            padded.resize(margin, 0.0);

            let mut scalar = filled(2, margin, 32, |y, x| ((x * 3 + y) % 29) as f32);
            let mut fixed = scalar.clone();
            convolve_image_scalar(&mut scalar, &taps);
            kernel(&mut fixed, &padded);
            assert!(
                max_rel_diff(&scalar, &fixed) < 1e-4,
                "fixed path diverged for fw={fw}"
            );
        }
    }
}
