//! Brute-force cosine similarity ranking over stored embeddings.

use std::cmp::Ordering;

/// Cosine similarity of two vectors.
///
/// Returns `None` when the lengths differ, either vector is empty, or either
/// has zero magnitude, so callers never see NaN or infinity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    Some(score.clamp(-1.0, 1.0) as f32)
}

/// Rank candidates by cosine similarity to `query`, best first.
///
/// Candidates that cannot be scored (length mismatch, zero vector) are
/// dropped. Equal scores keep their input order. At most `k` are returned.
pub fn rank<I, V>(query: &[f32], candidates: impl IntoIterator<Item = (I, V)>, k: usize) -> Vec<(I, f32)>
where
    V: AsRef<[f32]>,
{
    let mut scored: Vec<(I, f32)> = candidates
        .into_iter()
        .filter_map(|(id, vector)| cosine_similarity(query, vector.as_ref()).map(|score| (id, score)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_by_cosine_descending() {
        let candidates = vec![
            ("A", vec![1.0, 0.0]),
            ("B", vec![0.0, 1.0]),
            ("C", vec![0.7071, 0.7071]),
            ("D", vec![1.0, 0.0, 0.0]),
        ];

        let ranked = rank(&[1.0, 0.0], candidates, 10);
        let ids: Vec<_> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);
        assert!((ranked[0].1 - 1.0).abs() < 1e-6);
        assert!((ranked[1].1 - 0.7071).abs() < 1e-3);
        assert!(ranked[2].1.abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_k() {
        let candidates: Vec<(usize, Vec<f32>)> =
            (0..15).map(|i| (i, vec![1.0, i as f32 / 10.0])).collect();

        let ranked = rank(&[1.0, 0.0], candidates, 10);
        assert_eq!(ranked.len(), 10);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ranked[0].0, 0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let candidates = vec![(1, vec![2.0, 0.0]), (2, vec![1.0, 0.0]), (3, vec![5.0, 0.0])];
        let ranked = rank(&[1.0, 0.0], candidates, 10);
        let ids: Vec<_> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_vectors_are_skipped() {
        let candidates = vec![(1, vec![0.0, 0.0]), (2, vec![0.0, 3.0])];
        let ranked = rank(&[1.0, 0.0], candidates.clone(), 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 2);

        assert!(rank(&[0.0, 0.0], candidates, 10).is_empty());
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        let score = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }
}
