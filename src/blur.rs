//! Separable Gaussian blur pipeline.
//!
//! A blur is two 1D convolution passes stitched together with layout
//! transformations so both passes run cache-sequentially:
//!
//! 1. widen source bytes into a float matrix with a reserved margin
//! 2. horizontal convolution pass, in place
//! 3. transpose (including the shifted output in the margin) into the
//!    vertical matrix
//! 4. vertical convolution pass, in place, on the transposed rows
//! 5. transpose back into the destination bytes, rounding each sample
//!
//! The output canvas grows by the kernel radius on every side: a blurred
//! glyph bleeds past its original bounding box, which is the whole point
//! of a soft edge. The destination must therefore be exactly
//! `(width + 2 * radius_x) x (height + 2 * radius_y)`.
//!
//! All scratch memory is owned by a single invocation and released before
//! return; concurrent calls are independent.

use crate::convert::{byte_to_float, float_to_byte_transpose};
use crate::dispatch::run_filter;
use crate::image::{round_up_lanes, MarginMat, LANES};
use crate::transpose::transpose_into;
use crate::{BlurError, BlurParams};
use imgref::{ImgRef, ImgRefMut};

/// Computes a normalized symmetric Gaussian kernel of length
/// `2 * radius + 1`.
///
/// A non-positive `sigma` degenerates to the identity kernel (single unit
/// tap at the center).
#[must_use]
pub fn gaussian_kernel(radius: usize, sigma: f32) -> Vec<f32> {
    let len = 2 * radius + 1;
    let mut taps = vec![0.0f32; len];
    if sigma <= 0.0 {
        taps[radius] = 1.0;
        return taps;
    }
    let scaler = -1.0 / (2.0 * sigma * sigma);
    let r = radius as i64;
    for i in -r..=r {
        taps[(i + r) as usize] = (scaler * (i * i) as f32).exp();
    }
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

/// Blurs an 8-bit single-channel image with separable kernels, using the
/// default parameters. See [`gaussian_blur_with_params`].
///
/// # Errors
/// Returns [`BlurError`] on empty dimensions, kernel/radius mismatch,
/// destination size mismatch or scratch-size overflow.
pub fn gaussian_blur(
    dst: ImgRefMut<'_, u8>,
    src: ImgRef<'_, u8>,
    kernel_x: &[f32],
    radius_x: usize,
    kernel_y: &[f32],
    radius_y: usize,
) -> Result<(), BlurError> {
    gaussian_blur_with_params(
        dst,
        src,
        kernel_x,
        radius_x,
        kernel_y,
        radius_y,
        &BlurParams::default(),
    )
}

/// Blurs an 8-bit single-channel image with separable kernels.
///
/// `kernel_x`/`kernel_y` must have length `2 * radius + 1` for their
/// declared radius; trailing near-zero taps are permitted and are trimmed
/// during dispatch. Samples outside the source are treated as zero.
/// `dst` must be exactly `(width + 2 * radius_x) x (height + 2 * radius_y)`.
///
/// An all-zero kernel is accepted and produces an all-zero output.
/// Buffers need no particular alignment; alignment is re-established
/// internally when the source is widened to floats. Zero-width buffers
/// are unrepresentable in `imgref` (it requires a positive stride at
/// construction); a zero-height source is rejected here as
/// [`BlurError::EmptyImage`].
///
/// # Errors
/// Returns [`BlurError`] on empty dimensions, kernel/radius mismatch,
/// destination size mismatch or scratch-size overflow.
#[allow(clippy::similar_names)]
pub fn gaussian_blur_with_params(
    dst: ImgRefMut<'_, u8>,
    src: ImgRef<'_, u8>,
    kernel_x: &[f32],
    radius_x: usize,
    kernel_y: &[f32],
    radius_y: usize,
    params: &BlurParams,
) -> Result<(), BlurError> {
    let width = src.width();
    let height = src.height();
    if width == 0 || height == 0 {
        return Err(BlurError::EmptyImage { width, height });
    }
    // Checked so an absurd radius reports a mismatch instead of
    // overflowing `2 * radius + 1`.
    if expected_taps(radius_x) != Some(kernel_x.len()) {
        return Err(BlurError::KernelLengthMismatch {
            len: kernel_x.len(),
            radius: radius_x,
        });
    }
    if expected_taps(radius_y) != Some(kernel_y.len()) {
        return Err(BlurError::KernelLengthMismatch {
            len: kernel_y.len(),
            radius: radius_y,
        });
    }
    let out_w = width + 2 * radius_x;
    let out_h = height + 2 * radius_y;
    if dst.width() != out_w || dst.height() != out_h {
        return Err(BlurError::DimensionMismatch {
            expected_width: out_w,
            expected_height: out_h,
            width: dst.width(),
            height: dst.height(),
        });
    }

    // Extended (lane-rounded) filter widths double as the margins the
    // passes write into.
    let ex_x = round_up_lanes(kernel_x.len());
    let ex_y = round_up_lanes(kernel_y.len());
    let fwidth = checked_round_up(width)?;
    let fheight = checked_round_up(height)?;

    // Scratch sizing, checked before anything is allocated.
    let hor_cells = scratch_cells(ex_x, fwidth, height)?;
    let ver_cells = scratch_cells(ex_y, fheight, out_w)?;
    hor_cells
        .checked_add(ver_cells)
        .and_then(|cells| cells.checked_mul(core::mem::size_of::<f32>()))
        .ok_or(BlurError::ScratchOverflow)?;

    // Lane-padded taps with a zero tail, as the dispatcher expects.
    let mut taps_x = vec![0.0f32; ex_x];
    taps_x[..kernel_x.len()].copy_from_slice(kernel_x);
    let mut taps_y = vec![0.0f32; ex_y];
    taps_y[..kernel_y.len()].copy_from_slice(kernel_y);

    // Horizontal pass.
    let mut hor = MarginMat::new(height, ex_x, fwidth);
    byte_to_float(&mut hor, src);
    run_filter(&mut hor, &taps_x, params.zero_ulp_tolerance());

    // The filtered row occupies `[ex_x - 2 * radius_x, ex_x + width)`:
    // transpose that window so the vertical pass is horizontal again.
    let mut ver = MarginMat::new(out_w, ex_y, fheight);
    transpose_into(&mut ver, &hor, ex_x - 2 * radius_x, out_w, height);
    drop(hor);
    run_filter(&mut ver, &taps_y, params.zero_ulp_tolerance());

    // Transpose back, rounding to bytes.
    float_to_byte_transpose(dst, &ver, ex_y - 2 * radius_y);
    Ok(())
}

#[inline]
fn expected_taps(radius: usize) -> Option<usize> {
    radius.checked_mul(2).and_then(|v| v.checked_add(1))
}

/// Cell count of one scratch matrix: `(margin + width) * rows`, checked.
#[inline]
fn scratch_cells(margin: usize, width: usize, rows: usize) -> Result<usize, BlurError> {
    margin
        .checked_add(width)
        .and_then(|cols| cols.checked_mul(rows))
        .ok_or(BlurError::ScratchOverflow)
}

#[inline]
fn checked_round_up(n: usize) -> Result<usize, BlurError> {
    n.checked_add(LANES - 1)
        .map(|v| v & !(LANES - 1))
        .ok_or(BlurError::ScratchOverflow)
}
