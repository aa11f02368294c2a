use ndarray::Array1;

/// Dense embedding vector.
pub type Embedding = Array1<f32>;

/// Cosine similarity in [-1, 1].
///
/// Returns 0 for vectors of different length and whenever either vector has
/// zero norm, so the result is never NaN or infinite.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = a.dot(b) / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Scale to unit length. A zero vector stays zero.
pub fn l2_normalize(mut vector: Embedding) -> Embedding {
    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector.mapv_inplace(|x| x / norm);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine_identical_is_one() {
        let a = array![0.3, 0.5, 0.2];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let a = array![1.0, 0.0];
        let b = array![0.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_opposite_is_minus_one() {
        let a = array![1.0, -2.0, 3.0];
        let b = a.mapv(|x| -x);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_lengths_is_zero() {
        let a = array![1.0, 2.0];
        let b = array![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        let zero = Embedding::zeros(3);
        let a = array![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert_eq!(cosine_similarity(&Embedding::zeros(0), &Embedding::zeros(0)), 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(array![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let zero = l2_normalize(Embedding::zeros(4));
        assert!(zero.iter().all(|&x| x == 0.0));
    }
}
