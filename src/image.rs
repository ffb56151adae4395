//! Float scratch matrices with a reserved per-row margin.
//!
//! Every convolution pass writes its result into a window that begins
//! `filter` samples before the logical start of the row, so the scratch
//! rows reserve addressable space in front of column 0. A row is laid out
//! as `[margin | payload]` where both spans are multiples of the SIMD lane
//! width. The backing store is `simd_aligned::MatSimd`, which guarantees
//! aligned rows so the kernels never see a misaligned lane group.

use simd_aligned::{MatSimd, Rows};
use wide::f32x4;

/// Number of samples in one SIMD lane group.
pub const LANES: usize = 4;

/// Rounds `n` up to a multiple of the lane width.
#[inline]
#[must_use]
pub fn round_up_lanes(n: usize) -> usize {
    (n + (LANES - 1)) & !(LANES - 1)
}

/// Single-channel f32 matrix whose rows carry a leading margin.
///
/// The payload holds the logical samples (plus lane padding); the margin
/// holds out-of-range convolution output. Producing stages zero the margin
/// so the kernels can treat it as zero-padded source data.
#[derive(Debug, Clone)]
pub struct MarginMat {
    data: MatSimd<f32x4, Rows>,
    rows: usize,
    margin: usize,
    width: usize,
}

impl MarginMat {
    /// Creates a zeroed matrix with `rows` rows of `margin + width` floats.
    ///
    /// # Panics
    /// Panics if `margin` or `width` is not a multiple of [`LANES`].
    #[must_use]
    pub fn new(rows: usize, margin: usize, width: usize) -> Self {
        assert_eq!(margin % LANES, 0, "margin must be a lane multiple");
        assert_eq!(width % LANES, 0, "width must be a lane multiple");
        let data = MatSimd::with_dimension(rows, margin + width);
        Self {
            data,
            rows,
            margin,
            width,
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Floats reserved before the payload of each row.
    #[inline]
    #[must_use]
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Payload width in floats (lane-padded).
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Full row including the margin.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data.row_as_flat(y)[..self.margin + self.width]
    }

    /// Mutable full row including the margin.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let len = self.margin + self.width;
        &mut self.data.row_as_flat_mut(y)[..len]
    }

    /// Payload of a row (margin excluded).
    #[inline]
    #[must_use]
    pub fn payload(&self, y: usize) -> &[f32] {
        &self.row(y)[self.margin..]
    }

    /// Mutable payload of a row.
    #[inline]
    pub fn payload_mut(&mut self, y: usize) -> &mut [f32] {
        let margin = self.margin;
        &mut self.row_mut(y)[margin..]
    }
}
