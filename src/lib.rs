//! # softedge
//!
//! Separable Gaussian-style blur over 8-bit single-channel images, built
//! for synthesizing soft edges (glow, shadow) around overlay graphics
//! such as subtitle glyphs.
//!
//! The blur runs as two 1D convolution passes. Each pass is a horizontal,
//! cache-sequential sweep; a transpose between the passes turns the
//! vertical convolution into another horizontal one. Samples outside the
//! source image contribute as zero, and the output canvas grows by the
//! kernel radius on every side so the soft edge has room to bleed.
//!
//! The convolution kernels come in three flavors that agree within a few
//! ULPs: a portable scalar reference, a generic 4-lane SIMD kernel for
//! arbitrary filter lengths, and compile-time-specialized kernels for
//! lengths up to 28 (including a symmetric 3-tap fast path). A dispatcher
//! picks the best match at runtime.
//!
//! ## Example
//!
//! ```rust
//! use softedge::{gaussian_blur, gaussian_kernel, Img};
//!
//! // An 8x8 mask with a single lit pixel.
//! let mut mask = vec![0u8; 8 * 8];
//! mask[3 * 8 + 3] = 255;
//!
//! // Radius-2 blur grows the canvas to 12x12.
//! let kernel = gaussian_kernel(2, 1.0);
//! let mut out = vec![0u8; 12 * 12];
//! gaussian_blur(
//!     Img::new(out.as_mut_slice(), 12, 12),
//!     Img::new(mask, 8, 8).as_ref(),
//!     &kernel,
//!     2,
//!     &kernel,
//!     2,
//! )?;
//!
//! // The lit pixel spread into its neighborhood.
//! assert!(out[5 * 12 + 5] < 255);
//! assert!(out[5 * 12 + 4] > 0);
//! # Ok::<(), softedge::BlurError>(())
//! ```
//!
//! ## Features
//!
//! - **`internals`**: expose internal modules for testing/benchmarking
//!   (unstable API)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::inline_always)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod convert;
#[cfg(not(feature = "internals"))]
pub(crate) mod convert;

#[cfg(feature = "internals")]
pub mod dispatch;
#[cfg(not(feature = "internals"))]
pub(crate) mod dispatch;

#[cfg(feature = "internals")]
pub mod filter;
#[cfg(not(feature = "internals"))]
pub(crate) mod filter;

#[cfg(feature = "internals")]
pub mod image;
#[cfg(not(feature = "internals"))]
pub(crate) mod image;

#[cfg(feature = "internals")]
pub mod transpose;
#[cfg(not(feature = "internals"))]
pub(crate) mod transpose;

#[cfg(feature = "internals")]
pub mod ulp;
#[cfg(not(feature = "internals"))]
pub(crate) mod ulp;

mod blur;

pub use blur::{gaussian_blur, gaussian_blur_with_params, gaussian_kernel};

// Re-export imgref types for convenience
pub use imgref::{Img, ImgRef, ImgRefMut, ImgVec};

/// Error type for blur operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlurError {
    /// Source image has a zero dimension.
    EmptyImage {
        /// Source width.
        width: usize,
        /// Source height.
        height: usize,
    },
    /// Kernel length is not `2 * radius + 1`.
    KernelLengthMismatch {
        /// Supplied kernel length.
        len: usize,
        /// Declared radius.
        radius: usize,
    },
    /// Destination is not `(width + 2*radius_x) x (height + 2*radius_y)`.
    DimensionMismatch {
        /// Required destination width.
        expected_width: usize,
        /// Required destination height.
        expected_height: usize,
        /// Supplied destination width.
        width: usize,
        /// Supplied destination height.
        height: usize,
    },
    /// Scratch buffer size does not fit in memory arithmetic.
    ScratchOverflow,
}

impl std::fmt::Display for BlurError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyImage { width, height } => {
                write!(f, "source image is empty: {width}x{height}")
            }
            Self::KernelLengthMismatch { len, radius } => {
                write!(
                    f,
                    "kernel length {len} does not match radius {radius} (expected {})",
                    radius.saturating_mul(2).saturating_add(1)
                )
            }
            Self::DimensionMismatch {
                expected_width,
                expected_height,
                width,
                height,
            } => {
                write!(
                    f,
                    "destination is {width}x{height}, blur output needs \
                     {expected_width}x{expected_height}"
                )
            }
            Self::ScratchOverflow => write!(f, "scratch buffer size overflows"),
        }
    }
}

impl std::error::Error for BlurError {}

/// Blur tuning parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use softedge::BlurParams;
///
/// let params = BlurParams::new().with_zero_ulp_tolerance(4);
/// ```
#[derive(Debug, Clone)]
pub struct BlurParams {
    zero_ulp_tolerance: i32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            zero_ulp_tolerance: 0,
        }
    }
}

impl BlurParams {
    /// Creates a new `BlurParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ULP distance under which a trailing kernel tap counts as
    /// zero during dispatch trimming. The comparison is meaningless for
    /// non-finite taps; callers must not pass NaN or infinite weights.
    #[must_use]
    pub fn with_zero_ulp_tolerance(mut self, ulps: i32) -> Self {
        self.zero_ulp_tolerance = ulps;
        self
    }

    /// Returns the trailing-tap trimming tolerance in ULPs.
    #[must_use]
    pub fn zero_ulp_tolerance(&self) -> i32 {
        self.zero_ulp_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlurError::KernelLengthMismatch { len: 4, radius: 2 };
        assert_eq!(
            err.to_string(),
            "kernel length 4 does not match radius 2 (expected 5)"
        );
    }

    #[test]
    fn test_params_builder() {
        let params = BlurParams::new().with_zero_ulp_tolerance(7);
        assert_eq!(params.zero_ulp_tolerance(), 7);
        assert_eq!(BlurParams::default().zero_ulp_tolerance(), 0);
    }
}
