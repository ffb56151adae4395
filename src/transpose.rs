//! Row/column layout transformation.
//!
//! Transposing the horizontal-pass result turns the vertical convolution
//! into another cache-sequential horizontal pass. The transpose is a pure
//! copy (no arithmetic), so applying it twice reproduces the non-padded
//! region bit-exactly.

use crate::image::{MarginMat, LANES};
use multiversion::multiversion;

/// Copies `cols` columns of `src` (starting at row index `col0`) into the
/// payloads of `dst`, transposed: `dst.payload(c)[r] = src.row(r)[col0 + c]`.
///
/// `rows` is the number of source rows consumed; requires
/// `dst.width() >= rows` and `dst.rows() >= cols`. Destination payload
/// columns past `rows` are zero-filled and the destination margin is
/// zeroed, so the result is ready for an in-place convolution pass.
#[multiversion(targets("x86_64+avx2+fma", "x86_64+sse2", "aarch64+neon"))]
pub fn transpose_into(dst: &mut MarginMat, src: &MarginMat, col0: usize, cols: usize, rows: usize) {
    debug_assert!(dst.width() >= rows);
    debug_assert!(dst.rows() >= cols);
    debug_assert!(src.rows() >= rows);
    let margin = dst.margin();

    for c in 0..cols {
        let out = dst.row_mut(c);
        out[..margin].fill(0.0);
        let payload = &mut out[margin..];

        // Gather four source rows per step, mirroring the reference's
        // strided 4-wide loads.
        let chunked = rows & !(LANES - 1);
        let mut r = 0;
        while r < chunked {
            payload[r] = src.row(r)[col0 + c];
            payload[r + 1] = src.row(r + 1)[col0 + c];
            payload[r + 2] = src.row(r + 2)[col0 + c];
            payload[r + 3] = src.row(r + 3)[col0 + c];
            r += LANES;
        }
        while r < rows {
            payload[r] = src.row(r)[col0 + c];
            r += 1;
        }
        payload[rows..].fill(0.0);
    }
}
