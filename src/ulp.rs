//! ULP-based near-equality for f32.
//!
//! Floats are remapped to lexicographically ordered two's-complement
//! integers (Dawson, "Comparing floating point numbers"), so the distance
//! between two values is the number of representable floats between them.
//! The comparison is not meaningful for NaN or infinities; callers must
//! not pass non-finite values.

/// Remaps a float so adjacent representable values differ by 1.
#[inline]
fn lexicographic(v: f32) -> i32 {
    let bits = v.to_bits() as i32;
    if bits < 0 {
        (0x8000_0000u32.wrapping_sub(bits as u32)) as i32
    } else {
        bits
    }
}

/// Returns true when `a` and `b` are within `max_ulps` representable
/// values of each other. `max_ulps == 0` accepts only bit-equal values
/// (and `-0.0 == 0.0`).
#[inline]
#[must_use]
pub fn almost_equal(a: f32, b: f32, max_ulps: i32) -> bool {
    debug_assert!((0..4 * 1024 * 1024).contains(&max_ulps));
    let diff = i64::from(lexicographic(a)) - i64::from(lexicographic(b));
    diff.abs() <= i64::from(max_ulps)
}
