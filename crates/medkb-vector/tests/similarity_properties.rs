use medkb_vector::cosine_similarity;
use proptest::prelude::*;

fn vector(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, len)
}

proptest! {
    #[test]
    fn similarity_is_symmetric((a, b) in (1usize..64).prop_flat_map(|n| (vector(n), vector(n)))) {
        prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn self_similarity_is_one(a in vector(32)) {
        prop_assume!(a.iter().any(|x| x.abs() > 1e-3));
        prop_assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similarity_is_bounded((a, b) in (1usize..64).prop_flat_map(|n| (vector(n), vector(n)))) {
        let s = cosine_similarity(&a, &b);
        prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&s));
    }
}

#[test]
fn zero_norm_and_length_mismatch_score_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn opposite_vectors_score_minus_one() {
    assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
}
