use crate::models::ScoredCandidate;

/// Derives the key used to decide whether two records describe the same person.
///
/// Priority: email, candidate name, filename, then `idx-<position>`. Values are
/// trimmed and lowercased; blank values are skipped. This is a heuristic, not
/// a business key.
pub fn identity_key(candidate: &ScoredCandidate, position: usize) -> String {
    [
        candidate.email.as_deref(),
        candidate.candidate_name.as_deref(),
        Some(candidate.filename.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|value| !value.is_empty())
    .map(str::to_lowercase)
    .unwrap_or_else(|| format!("idx-{position}"))
}
