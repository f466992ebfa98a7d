//! Normalized edit-distance similarity between two text fragments.

/// Score awarded when one folded input contains the other.
pub const CONTAINMENT_SCORE: f64 = 0.9;

/// Similarity in `[0, 1]`, 1 meaning identical after case folding.
///
/// - either input empty: `0.0`
/// - equal after folding: `1.0`
/// - one contains the other: [`CONTAINMENT_SCORE`] (fixed, not distance-derived)
/// - otherwise `(max_len - distance) / max_len` over Unicode scalar values
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return CONTAINMENT_SCORE;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longer = a.len().max(b.len());
    let distance = levenshtein(&a, &b);

    (longer - distance) as f64 / longer as f64
}

/// Classic edit distance; insertion, deletion and substitution each cost 1.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    // Keep the shorter sequence in the row.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            let substitution = previous[j] + usize::from(lc != sc);
            current[j + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}
