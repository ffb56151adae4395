//! Kernel selection for a runtime filter length.
//!
//! The dispatcher receives lane-padded taps (zero tail) and picks the best
//! kernel: the generic path when the filter is longer than 28 taps or
//! wider than the row payload, otherwise a specialized kernel for the
//! trimmed length. Up to three trailing taps that are numerically
//! indistinguishable from zero are trimmed first; a trimmed length of
//! exactly 3 with equal outer taps takes the symmetric fast path.
//!
//! Dispatch is pure: the same `(taps, tolerance)` pair always selects the
//! same kernel.

use crate::filter;
use crate::image::MarginMat;
use crate::ulp;

/// Longest filter with a specialized kernel.
pub const MAX_FIXED_FILTER: usize = 28;

/// Rounds a trimmed length onto the specialized-kernel table: lengths
/// congruent to 1 mod 4 are kept, everything else rounds up to the next
/// multiple of 4.
#[inline]
fn table_length(len: usize) -> usize {
    if len % 4 == 1 {
        len
    } else {
        (len + 3) & !3
    }
}

/// Runs one convolution pass over `buf` with the given padded taps.
///
/// `taps.len()` must be a lane multiple no larger than `buf.margin()`;
/// `zero_ulps` is the near-zero tolerance used when trimming trailing
/// taps. Trimmed taps are zeroed before dispatch, so a kernel with a
/// near-zero tail produces bit-identical results to the honest kernel of
/// the trimmed length.
pub fn run_filter(buf: &mut MarginMat, taps: &[f32], zero_ulps: i32) {
    let fw = taps.len();
    debug_assert!(fw % crate::image::LANES == 0 && fw > 0);
    debug_assert!(fw <= buf.margin());

    if fw > MAX_FIXED_FILTER || fw > buf.width() {
        filter::convolve_image_generic(buf, taps);
        return;
    }

    // Skip trailing zeros; at most three, so the trimmed length still
    // rounds back onto the same padded tap storage.
    let mut len = fw;
    while fw - len < 3 && ulp::almost_equal(taps[len - 1], 0.0, zero_ulps) {
        len -= 1;
    }

    if len == 3 && taps[0] == taps[2] {
        filter::convolve_image_sym3(buf, taps[0], taps[1]);
        return;
    }

    // The specialized kernels run over the full table width, so zero the
    // trimmed tail: dispatching the trimmed filter is then bit-identical
    // to dispatching an honest kernel of the trimmed length.
    let mut trimmed = [0.0f32; MAX_FIXED_FILTER];
    trimmed[..len].copy_from_slice(&taps[..len]);
    let taps = &trimmed[..table_length(len)];

    match table_length(len) {
        1 => filter::filter_fixed_1(buf, taps),
        4 => filter::filter_fixed_4(buf, taps),
        5 => filter::filter_fixed_5(buf, taps),
        8 => filter::filter_fixed_8(buf, taps),
        9 => filter::filter_fixed_9(buf, taps),
        12 => filter::filter_fixed_12(buf, taps),
        13 => filter::filter_fixed_13(buf, taps),
        16 => filter::filter_fixed_16(buf, taps),
        17 => filter::filter_fixed_17(buf, taps),
        20 => filter::filter_fixed_20(buf, taps),
        21 => filter::filter_fixed_21(buf, taps),
        24 => filter::filter_fixed_24(buf, taps),
        25 => filter::filter_fixed_25(buf, taps),
        _ => filter::filter_fixed_28(buf, taps),
    }
}
