//! "Did you mean" suggestions for unknown identifiers, fields and methods.

/// Levenshtein distance over chars, computed row by row.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut current = Vec::with_capacity(b_chars.len() + 1);
        current.push(i + 1);
        for (j, b_char) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(a_char != *b_char);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current.push(substitution.min(deletion).min(insertion));
        }
        previous = current;
    }

    previous[b_chars.len()]
}

/// Returns up to `max_suggestions` candidates close to `target`, prefix
/// matches first, then by edit distance, then alphabetically. Exact
/// (case-insensitive) matches are skipped.
pub fn find_similar_names(target: &str, candidates: &[String], max_suggestions: usize) -> Vec<String> {
    let target_lower = target.to_lowercase();
    let target_len = target.chars().count();
    let max_distance = match target_len {
        0..=3 => 1,
        4..=6 => 2,
        len => 3.max(len / 3),
    };

    let mut scored: Vec<(bool, usize, &String)> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            if candidate_lower == target_lower {
                return None;
            }
            let distance = edit_distance(&target_lower, &candidate_lower);
            let is_prefix = !target_lower.is_empty()
                && (candidate_lower.starts_with(&target_lower)
                    || target_lower.starts_with(&candidate_lower));
            (distance <= max_distance || is_prefix).then_some((is_prefix, distance, candidate))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(b.2))
    });
    scored.dedup_by(|a, b| a.2 == b.2);

    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, _, name)| name.clone())
        .collect()
}
