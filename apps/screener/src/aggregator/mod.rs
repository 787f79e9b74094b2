//! Candidate aggregation: collapses duplicate scored records and ranks the
//! survivors by overall score.
//!
//! All display-side selection (the header "sample", truncation, grouping) is
//! computed from a `RankedReport`, never from the raw service payload.

pub mod identity;

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;

use crate::models::ScoredCandidate;

pub use identity::identity_key;

/// Candidates ordered by effective overall score, descending, with at most one
/// entry per identity key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedReport {
    candidates: Vec<ScoredCandidate>,
}

impl RankedReport {
    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best-ranked candidate, shown as the report header.
    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.candidates.iter()
    }
}

/// De-duplicates and ranks `raw` using the default `identity_key`.
pub fn reduce(raw: &[ScoredCandidate]) -> RankedReport {
    reduce_with(raw, identity_key)
}

/// Same as `reduce`, with a caller-supplied identity function taking the
/// candidate and its input position.
///
/// Merge: first occurrence of a key claims its slot; a later record replaces
/// it only with a strictly greater effective overall score. Rank: stable sort
/// descending, so ties keep merge order.
pub fn reduce_with<F>(raw: &[ScoredCandidate], key_fn: F) -> RankedReport
where
    F: Fn(&ScoredCandidate, usize) -> String,
{
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(raw.len());
    let mut survivors: Vec<&ScoredCandidate> = Vec::with_capacity(raw.len());

    for (position, candidate) in raw.iter().enumerate() {
        match slots.entry(key_fn(candidate, position)) {
            Entry::Vacant(slot) => {
                slot.insert(survivors.len());
                survivors.push(candidate);
            }
            Entry::Occupied(slot) => {
                let best = &mut survivors[*slot.get()];
                if candidate.effective_overall_score() > best.effective_overall_score() {
                    *best = candidate;
                }
            }
        }
    }

    survivors.sort_by(|a, b| {
        b.effective_overall_score()
            .partial_cmp(&a.effective_overall_score())
            .unwrap_or(Ordering::Equal)
    });

    RankedReport {
        candidates: survivors.into_iter().cloned().collect(),
    }
}
