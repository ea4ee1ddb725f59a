//! Replacement security search: finds candidates similar enough to serve
//! as a like-kind substitute without being so correlated that holding
//! both (or swapping one for the other) would itself risk a wash sale on
//! a "substantially identical" security.

use std::collections::HashMap;

use taxalpha_core::{Security, SecurityId};

/// Sector match contributes this much to the similarity score.
pub const SECTOR_WEIGHT: f64 = 0.5;
/// Industry match contributes this much.
pub const INDUSTRY_WEIGHT: f64 = 0.3;
/// Exchange match contributes this much.
pub const EXCHANGE_WEIGHT: f64 = 0.1;
/// Security-type match contributes this much.
pub const SECURITY_TYPE_WEIGHT: f64 = 0.1;
/// Candidates correlated with the target at or above this level over the
/// trailing return window are dropped as too similar to be a safe swap.
pub const CORRELATION_THRESHOLD: f64 = 0.7;
/// Trailing daily return window used for the correlation filter.
pub const CORRELATION_WINDOW_DAYS: usize = 252;

/// A candidate replacement and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplacementCandidate {
    /// The candidate security.
    pub security_id: SecurityId,
    /// Similarity score in `[0, 1]`.
    pub similarity: f64,
}

/// A single attribute match contributes its full weight; this function
/// sums sector/industry/exchange/security-type matches between `target`
/// and `candidate`.
#[must_use]
pub fn similarity(target: &Security, candidate: &Security) -> f64 {
    let mut score = 0.0;
    if target.sector == candidate.sector {
        score += SECTOR_WEIGHT;
    }
    if target.industry == candidate.industry {
        score += INDUSTRY_WEIGHT;
    }
    if target.exchange == candidate.exchange {
        score += EXCHANGE_WEIGHT;
    }
    if target.security_type == candidate.security_type {
        score += SECURITY_TYPE_WEIGHT;
    }
    score
}

/// Pearson correlation of two equal-length return series. `None` if
/// either series has no variance or the lengths differ.
#[must_use]
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a < 1e-12 || var_b < 1e-12 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Finds and ranks replacement candidates for `target`: scores every
/// candidate by [`similarity`], drops any whose trailing return
/// correlation with `target` meets or exceeds [`CORRELATION_THRESHOLD`],
/// and sorts the rest descending by similarity (ties broken by security
/// id for determinism).
#[must_use]
pub fn find_replacements(
    target: &Security,
    candidates: &[Security],
    returns_by_security: &HashMap<SecurityId, Vec<f64>>,
) -> Vec<ReplacementCandidate> {
    let target_returns = returns_by_security.get(&target.id);

    let mut ranked: Vec<ReplacementCandidate> = candidates
        .iter()
        .filter(|c| c.id != target.id)
        .filter(|c| {
            match (target_returns, returns_by_security.get(&c.id)) {
                (Some(t), Some(cand)) => correlation(t, cand).is_none_or(|r| r < CORRELATION_THRESHOLD),
                _ => true,
            }
        })
        .map(|c| ReplacementCandidate {
            security_id: c.id,
            similarity: similarity(target, c),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap()
            .then_with(|| a.security_id.cmp(&b.security_id))
    });
    ranked
}

/// Average similarity of the top `n` ranked candidates (fewer than `n` if
/// the list is shorter). Used by the opportunity-scoring bonus.
#[must_use]
pub fn average_top_n_similarity(ranked: &[ReplacementCandidate], n: usize) -> f64 {
    if ranked.is_empty() {
        return 0.0;
    }
    let take = ranked.len().min(n);
    ranked[..take].iter().map(|c| c.similarity).sum::<f64>() / take as f64
}
