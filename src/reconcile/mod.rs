//! Identity reconciliation: match a scraped inbox ordering against the
//! canonical message set.
//!
//! The scrape and the backend disagree about identity (the scrape often
//! recovers no stable id) and about order (the backend listing is
//! unordered). This module produces a best-effort total order over
//! canonical ids by claiming, for each observation in scrape order, the
//! best unclaimed canonical message.
//!
//! The assignment is greedy and insertion-order dependent: when several
//! observations are near-duplicates of each other the pairing can be
//! suboptimal compared to a max-weight bipartite matching. That behavior
//! is deliberate and kept stable, including the first-candidate-wins
//! tie-break.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{FUZZY_ACCEPT_THRESHOLD, SENDER_WEIGHT, SUBJECT_WEIGHT};

/// One entry of the externally scraped ordering, read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalObservation {
    pub position: usize,
    pub sender: String,
    pub subject: String,
    pub timestamp: String,
    /// Backend id if the scrape recovered one; empty when unknown.
    pub external_id: String,
    pub raw_text: String,
}

/// Authoritative representation of a message, keyed by its backend id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub sender_address: String,
    pub snippet: String,
    pub received_at: String,
}

/// How an observation was matched, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    None,
}

/// Match outcome for a single observation.
#[derive(Debug, Clone, Serialize)]
pub struct MappingResult {
    pub position: usize,
    pub matched: Option<CanonicalMessage>,
    pub method: MatchMethod,
    /// In [0, 1]; 1.0 for exact matches, the weighted similarity score for
    /// fuzzy ones, 0.0 when unmatched.
    pub confidence: f64,
}

/// Output of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One result per observation, in observation order.
    pub mappings: Vec<MappingResult>,
}

impl Reconciliation {
    /// Matched canonical messages sorted by observation position, unmatched
    /// observations dropped. The single source of the resolved ordering.
    pub fn matched_in_order(&self) -> Vec<&CanonicalMessage> {
        let mut matched: Vec<_> = self
            .mappings
            .iter()
            .filter_map(|m| m.matched.as_ref().map(|c| (m.position, c)))
            .collect();
        matched.sort_by_key(|(position, _)| *position);
        matched.into_iter().map(|(_, msg)| msg).collect()
    }

    /// Ids of [`Self::matched_in_order`].
    pub fn ordered_ids(&self) -> Vec<String> {
        self.matched_in_order()
            .into_iter()
            .map(|msg| msg.id.clone())
            .collect()
    }
}

/// Match every observation against the canonical set, claiming each
/// canonical message at most once.
pub fn reconcile(
    observations: &[ExternalObservation],
    canonical: &[CanonicalMessage],
) -> Reconciliation {
    // Indices, not ids: duplicate canonical ids are tolerated and the first
    // unused entry wins.
    let mut used: HashSet<usize> = HashSet::new();
    let mut mappings = Vec::with_capacity(observations.len());

    for obs in observations {
        let (claimed, mapping) = match_observation(obs, canonical, &used);
        if let Some(idx) = claimed {
            used.insert(idx);
        }
        mappings.push(mapping);
    }

    Reconciliation { mappings }
}

fn match_observation(
    obs: &ExternalObservation,
    canonical: &[CanonicalMessage],
    used: &HashSet<usize>,
) -> (Option<usize>, MappingResult) {
    // Exact id match first: the scrape recovered the backend id.
    if !obs.external_id.is_empty()
        && let Some(idx) = canonical
            .iter()
            .enumerate()
            .find_map(|(i, c)| (!used.contains(&i) && c.id == obs.external_id).then_some(i))
    {
        return (
            Some(idx),
            MappingResult {
                position: obs.position,
                matched: Some(canonical[idx].clone()),
                method: MatchMethod::Exact,
                confidence: 1.0,
            },
        );
    }

    // Fuzzy: best unclaimed candidate by weighted token overlap. A strict
    // `>` keeps the first-encountered candidate on ties.
    let obs_subject = normalize_tokens(&obs.subject);
    let obs_sender = normalize_tokens(extract_address(&obs.sender));

    let mut best: Option<(usize, f64)> = None;
    for (idx, cand) in canonical.iter().enumerate() {
        if used.contains(&idx) {
            continue;
        }
        let subject_sim = token_overlap(&obs_subject, &normalize_tokens(&cand.subject));
        let sender_sim = token_overlap(&obs_sender, &canonical_sender_tokens(cand));
        let score = SUBJECT_WEIGHT * subject_sim + SENDER_WEIGHT * sender_sim;
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((idx, score));
        }
    }

    if let Some((idx, score)) = best
        && score > FUZZY_ACCEPT_THRESHOLD
    {
        return (
            Some(idx),
            MappingResult {
                position: obs.position,
                matched: Some(canonical[idx].clone()),
                method: MatchMethod::Fuzzy,
                confidence: score,
            },
        );
    }

    (
        None,
        MappingResult {
            position: obs.position,
            matched: None,
            method: MatchMethod::None,
            confidence: 0.0,
        },
    )
}

/// Token set for the canonical side of the sender comparison. The address
/// field is authoritative; the display sender is the fallback.
fn canonical_sender_tokens(cand: &CanonicalMessage) -> HashSet<String> {
    let source = if cand.sender_address.is_empty() {
        &cand.sender
    } else {
        &cand.sender_address
    };
    normalize_tokens(extract_address(source))
}

/// Normalize a string into its token set: lowercase, punctuation stripped,
/// whitespace collapsed.
fn normalize_tokens(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Overlap coefficient between two token sets: |A ∩ B| / min(|A|, |B|).
/// Two empty sets count as identical; one empty set as fully dissimilar.
fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let intersection = a.intersection(b).count();
            intersection as f64 / a.len().min(b.len()) as f64
        }
    }
}

/// Pull the email address out of a sender string: the bracketed form of
/// "Name <addr>" if present, otherwise the first bare token containing '@',
/// otherwise the string itself.
fn extract_address(sender: &str) -> &str {
    if let Some(start) = sender.find('<')
        && let Some(end) = sender[start..].find('>')
    {
        return sender[start + 1..start + end].trim();
    }
    sender
        .split_whitespace()
        .find(|t| t.contains('@'))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.'))
        .unwrap_or(sender)
}
