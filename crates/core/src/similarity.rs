//! Similarity primitive and vector helpers.
//!
//! [`dot_product`] is the only scoring function the search stage uses. For
//! unit-length vectors it equals cosine similarity. NEON (aarch64) and
//! AVX2+FMA (x86_64) kernels are selected at runtime, falling back to scalar
//! on other platforms or when AVX2 is unavailable. Both SIMD kernels keep
//! two FMA accumulators per block and finish the tail in scalar code.

use crate::config;
use crate::error::DimensionMismatch;

/// Dot product of two equal-length vectors.
///
/// Returns [`DimensionMismatch`] when the lengths differ. Inputs are not
/// checked for normalization.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(dot_product_unchecked(a, b))
}

/// Dispatches to the fastest kernel. Caller guarantees `a.len() == b.len()`.
#[inline]
#[allow(unreachable_code)]
fn dot_product_unchecked(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON is mandatory on aarch64 and both slices have equal length.
        return unsafe { neon_dot_product_f32(a, b) };
    }
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") && std::arch::is_x86_feature_detected!("fma")
        {
            // SAFETY: features checked above; both slices have equal length.
            return unsafe { avx2_dot_product_f32(a, b) };
        }
    }
    scalar_dot_product_f32(a, b)
}

/// Returns a unit-length copy of `v`. A zero vector is returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = scalar_dot_product_f32(v, v).sqrt();
    if norm < f32::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Whether `v` has unit length within [`config::NORMALIZATION_TOLERANCE`].
pub fn is_normalized(v: &[f32]) -> bool {
    (scalar_dot_product_f32(v, v) - 1.0).abs() <= config::NORMALIZATION_TOLERANCE
}

/// Element-wise `a - b`.
pub fn subtract(a: &[f32], b: &[f32]) -> Result<Vec<f32>, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

fn scalar_dot_product_f32(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

#[cfg(target_arch = "aarch64")]
unsafe fn neon_dot_product_f32(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut s0 = vdupq_n_f32(0.0);
    let mut s1 = vdupq_n_f32(0.0);

    let chunks = len / 8;
    for i in 0..chunks {
        let base = i * 8;
        s0 = vfmaq_f32(s0, vld1q_f32(a_ptr.add(base)), vld1q_f32(b_ptr.add(base)));
        s1 = vfmaq_f32(
            s1,
            vld1q_f32(a_ptr.add(base + 4)),
            vld1q_f32(b_ptr.add(base + 4)),
        );
    }

    let mut sum = vaddvq_f32(vaddq_f32(s0, s1));
    for i in (chunks * 8)..len {
        sum += *a_ptr.add(i) * *b_ptr.add(i);
    }
    sum
}

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Sums the eight lanes of an accumulator.
#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx")]
unsafe fn reduce_f32x8(v: __m256) -> f32 {
    let half = _mm_add_ps(_mm256_castps256_ps128(v), _mm256_extractf128_ps(v, 1));
    let mut lanes = [0.0f32; 4];
    _mm_storeu_ps(lanes.as_mut_ptr(), half);
    lanes.iter().sum()
}

/// Two independent FMA accumulators over 16-float blocks; the tail is scalar.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_dot_product_f32(a: &[f32], b: &[f32]) -> f32 {
    let a_blocks = a.chunks_exact(16);
    let b_blocks = b.chunks_exact(16);
    let tail = scalar_dot_product_f32(a_blocks.remainder(), b_blocks.remainder());

    let mut acc_lo = _mm256_setzero_ps();
    let mut acc_hi = _mm256_setzero_ps();
    for (xa, xb) in a_blocks.zip(b_blocks) {
        let (pa, pb) = (xa.as_ptr(), xb.as_ptr());
        acc_lo = _mm256_fmadd_ps(_mm256_loadu_ps(pa), _mm256_loadu_ps(pb), acc_lo);
        acc_hi = _mm256_fmadd_ps(_mm256_loadu_ps(pa.add(8)), _mm256_loadu_ps(pb.add(8)), acc_hi);
    }

    reduce_f32x8(_mm256_add_ps(acc_lo, acc_hi)) + tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_basic() {
        let d = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!((d - 32.0).abs() < 1e-5, "expected 32, got {d}");
    }

    #[test]
    fn test_dot_product_length_mismatch() {
        let err = dot_product(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_dot_product_empty() {
        assert_eq!(dot_product(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_simd_matches_scalar_with_tail() {
        // 37 = two 16-wide chunks plus a 5 element tail
        let a: Vec<f32> = (0..37).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..37).map(|i| (i as f32 * 0.11).cos()).collect();
        let fast = dot_product(&a, &b).unwrap();
        let slow = scalar_dot_product_f32(&a, &b);
        assert!((fast - slow).abs() < 1e-4, "simd {fast} vs scalar {slow}");
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!(is_normalized(&v));
        assert!(!is_normalized(&[3.0, 4.0]));
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalized_dot_is_cosine() {
        let a = normalize(&[1.0, 1.0, 0.0]);
        let b = normalize(&[1.0, 0.0, 0.0]);
        let cos = dot_product(&a, &b).unwrap();
        assert!((cos - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_subtract() {
        assert_eq!(subtract(&[1.0, 2.0], &[0.5, 3.0]).unwrap(), vec![0.5, -1.0]);
        assert!(subtract(&[1.0], &[1.0, 2.0]).is_err());
    }
}
