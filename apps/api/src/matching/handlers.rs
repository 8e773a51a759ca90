use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scoring::MatchResult;
use crate::profiles::handlers::profile_not_found;
use crate::profiles::store;
use crate::state::AppState;

const DEFAULT_MIN_SCORE: u32 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct MatchQuery {
    pub min_score: Option<u32>,
    pub limit: Option<usize>,
}

/// Drops candidates under the threshold, then truncates to `limit`.
pub fn select_matches(ranked: Vec<MatchResult>, query: &MatchQuery) -> Vec<MatchResult> {
    let min_score = query.min_score.unwrap_or(DEFAULT_MIN_SCORE);
    let kept = ranked.into_iter().filter(|m| m.match_score >= min_score);
    match query.limit {
        Some(limit) => kept.take(limit).collect(),
        None => kept.collect(),
    }
}

/// GET /api/profiles/:id/matches
pub async fn handle_get_matches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    let subject = store::get_profile(&state.db, id)
        .await?
        .ok_or_else(|| profile_not_found(id))?;
    let candidates = store::list_profiles_except(&state.db, id).await?;
    let candidate_count = candidates.len();

    let ranked = state.scorer.rank(&subject, candidates).await?;
    let matches = select_matches(ranked, &query);

    debug!(
        "Ranked {candidate_count} candidates for profile {id} with {} scorer, returning {}",
        state.scorer.backend(),
        matches.len()
    );
    Ok(Json(matches))
}
