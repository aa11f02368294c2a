//! Typo-tolerant matching based on Levenshtein edit distance.

/// True if `query` approximately matches `target`.
///
/// An empty query matches everything. A case-insensitive substring hit is
/// accepted immediately; otherwise `target` is split into words on space,
/// underscore and dash, and the query matches if any word is within
/// `clamp(len(query) / 3, 1, 3)` edits of it.
pub fn fuzzy_match(query: &str, target: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let query = query.to_lowercase();
    let target = target.to_lowercase();

    if target.contains(&query) {
        return true;
    }

    let max_distance = (query.chars().count() / 3).clamp(1, 3);

    target
        .split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|word| !word.is_empty())
        .any(|word| levenshtein_distance(&query, word) <= max_distance)
}

/// Exact edit distance where insertion, deletion and substitution each cost 1.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the DP matrix
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
