//! Match scoring: a pluggable, trait-based scorer that ranks candidate
//! profiles against a subject profile.
//!
//! Default: `OverlapScorer` (shared tags + same-city bonus).
//! Alternative: `WeightedScorer` (0-100 compatibility scale).
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, chosen at startup via config.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

/// One ranked candidate: the profile itself plus what it has in common with
/// the subject.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    #[serde(flatten)]
    pub profile: ProfileRow,
    pub match_score: u32,
    pub shared_interests: Vec<String>,
    pub shared_activities: Vec<String>,
    pub same_city: bool,
}

/// What two profiles share, independent of how it is weighted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlap {
    pub shared_interests: Vec<String>,
    pub shared_activities: Vec<String>,
    pub same_city: bool,
    pub same_availability: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the handler.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    /// Scores every candidate against `subject` and returns them best first.
    async fn rank(
        &self,
        subject: &ProfileRow,
        candidates: Vec<ProfileRow>,
    ) -> Result<Vec<MatchResult>, AppError>;

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    Overlap,
    Weighted,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown match scorer '{0}' (expected overlap or weighted)")]
pub struct UnknownScorer(pub String);

impl FromStr for ScorerKind {
    type Err = UnknownScorer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overlap" => Ok(ScorerKind::Overlap),
            "weighted" => Ok(ScorerKind::Weighted),
            other => Err(UnknownScorer(other.to_string())),
        }
    }
}

pub fn build_scorer(kind: ScorerKind) -> Arc<dyn MatchScorer> {
    match kind {
        ScorerKind::Overlap => Arc::new(OverlapScorer),
        ScorerKind::Weighted => Arc::new(WeightedScorer),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OverlapScorer (default)
// ────────────────────────────────────────────────────────────────────────────

/// score = shared interests + shared activities + 1 if same city.
pub struct OverlapScorer;

#[async_trait]
impl MatchScorer for OverlapScorer {
    async fn rank(
        &self,
        subject: &ProfileRow,
        candidates: Vec<ProfileRow>,
    ) -> Result<Vec<MatchResult>, AppError> {
        Ok(rank_with(subject, candidates, overlap_score))
    }

    fn backend(&self) -> &'static str {
        "overlap"
    }
}

pub fn overlap_score(o: &Overlap) -> u32 {
    (o.shared_interests.len() + o.shared_activities.len()) as u32 + u32::from(o.same_city)
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedScorer
// ────────────────────────────────────────────────────────────────────────────

const INTEREST_WEIGHT: u32 = 20;
const ACTIVITY_WEIGHT: u32 = 15;
const CITY_WEIGHT: u32 = 15;
const AVAILABILITY_WEIGHT: u32 = 20;
const WEIGHTED_CAP: u32 = 100;

/// Compatibility on a 0-100 scale: 20 per shared interest, 15 per shared
/// activity, 15 for the same city, 20 for identical availability.
pub struct WeightedScorer;

#[async_trait]
impl MatchScorer for WeightedScorer {
    async fn rank(
        &self,
        subject: &ProfileRow,
        candidates: Vec<ProfileRow>,
    ) -> Result<Vec<MatchResult>, AppError> {
        Ok(rank_with(subject, candidates, weighted_score))
    }

    fn backend(&self) -> &'static str {
        "weighted"
    }
}

pub fn weighted_score(o: &Overlap) -> u32 {
    let raw = o.shared_interests.len() as u32 * INTEREST_WEIGHT
        + o.shared_activities.len() as u32 * ACTIVITY_WEIGHT
        + if o.same_city { CITY_WEIGHT } else { 0 }
        + if o.same_availability { AVAILABILITY_WEIGHT } else { 0 };
    raw.min(WEIGHTED_CAP)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared algorithm
// ────────────────────────────────────────────────────────────────────────────

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Tags of `mine` (in my order and spelling) that also appear in `theirs`,
/// compared trimmed and lowercase. Repeats on my side count once.
fn shared_tags(mine: &[String], theirs: &[String]) -> Vec<String> {
    let theirs: HashSet<String> = theirs.iter().map(|t| normalize(t)).collect();
    let mut seen = HashSet::new();
    mine.iter()
        .filter(|t| {
            let key = normalize(t);
            !key.is_empty() && theirs.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}

fn same_place(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(normalize), b.map(normalize)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

pub fn compute_overlap(subject: &ProfileRow, candidate: &ProfileRow) -> Overlap {
    let same_availability = match (subject.availability(), candidate.availability()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    Overlap {
        shared_interests: shared_tags(&subject.interests, &candidate.interests),
        shared_activities: shared_tags(&subject.activities, &candidate.activities),
        same_city: same_place(subject.city.as_deref(), candidate.city.as_deref()),
        same_availability,
    }
}

/// Scores each candidate with `score_fn`, skipping the subject itself, and
/// sorts by score descending, then name, then id.
pub fn rank_with(
    subject: &ProfileRow,
    candidates: Vec<ProfileRow>,
    score_fn: fn(&Overlap) -> u32,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = candidates
        .into_iter()
        .filter(|c| c.id != subject.id)
        .map(|candidate| {
            let overlap = compute_overlap(subject, &candidate);
            MatchResult {
                match_score: score_fn(&overlap),
                shared_interests: overlap.shared_interests,
                shared_activities: overlap.shared_activities,
                same_city: overlap.same_city,
                profile: candidate,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| compare_names(&a.profile.name, &b.profile.name))
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });
    results
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
