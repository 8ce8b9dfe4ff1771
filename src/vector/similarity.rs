//! Vector Arithmetic
//!
//! Dot products, magnitudes and component-wise updates on `f32` slices.

/// Magnitude and in-place accumulation on embedding vectors
pub trait VectorOps {
    fn magnitude(&self) -> f32;
    fn add_assign(&mut self, other: &Self);
    fn sub_assign(&mut self, other: &Self);
}

impl VectorOps for [f32] {
    #[inline]
    fn magnitude(&self) -> f32 {
        dot_product(self, self).sqrt()
    }

    fn add_assign(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len(), "Vector dimensions must match");
        for (x, y) in self.iter_mut().zip(other) {
            *x += y;
        }
    }

    fn sub_assign(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len(), "Vector dimensions must match");
        for (x, y) in self.iter_mut().zip(other) {
            *x -= y;
        }
    }
}

/// Compute dot product of two vectors
///
/// Uses unrolled loop for better CPU performance.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let mut sum = 0.0f32;

    // Process 4 elements at a time (manual unrolling)
    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] * b[idx];
        sum += a[idx + 1] * b[idx + 1];
        sum += a[idx + 2] * b[idx + 2];
        sum += a[idx + 3] * b[idx + 3];
    }

    for i in (len - remainder)..len {
        sum += a[i] * b[i];
    }

    sum
}

/// Compute cosine similarity between two vectors
///
/// Returns value in range [-1, 1] where 1 means identical direction.
/// Zero-magnitude input yields 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = a.magnitude() * b.magnitude();
    if denom > 0.0 {
        dot_product(a, b) / denom
    } else {
        0.0
    }
}

/// Normalize a vector in place. Zero vectors are left as they are.
pub fn normalize_vector(v: &mut [f32]) {
    let mag = v.magnitude();
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

/// Normalize and return a new vector
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    normalize_vector(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!((dot_product(&a, &b) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_product_unrolled_with_remainder() {
        let a: Vec<f32> = (1..=7).map(|x| x as f32).collect();
        let b = vec![1.0f32; 7];
        assert!((dot_product(&a, &b) - 28.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = [1.0, 0.0, 0.0];
        let b = [-2.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_normalize() {
        let v = [3.0, 4.0, 0.0];
        let n = normalized(&v);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
        assert!(n[2].abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_unchanged() {
        let mut v = [0.0f32; 4];
        normalize_vector(&mut v);
        assert_eq!(v, [0.0; 4]);
    }

    #[test]
    fn test_add_and_sub_assign() {
        let mut v = vec![1.0f32, 1.0];
        v.add_assign(&[2.0, 3.0]);
        assert_eq!(v, vec![3.0, 4.0]);
        v.sub_assign(&[1.0, 5.0]);
        assert_eq!(v, vec![2.0, -1.0]);
    }
}
