//! End-of-game result aggregation: leaderboard computation over the live
//! registry and the persistence sweep into durable storage.

use std::time::{Duration, UNIX_EPOCH};

use tracing::warn;

use crate::{
    config::RankTieBreak,
    dao::models::ParticipantResultUpdate,
    dto::admin::RankedEntry,
    error::ServiceError,
    state::{SharedState, epoch_ms, registry::{ParticipantProgress, ParticipantStatus}},
};

/// Compute the leaderboard: finished participants with a perfect run, ranked
/// by completion duration ascending, truncated to the configured size.
///
/// Eligibility requires status Done, zero wrong answers, a correct count
/// equal to the frozen question total and a recorded duration. Ties keep the
/// configured secondary order; the registration-order default makes repeated
/// calls deterministic.
pub async fn compute_top_ranked(state: &SharedState) -> Result<Vec<RankedEntry>, ServiceError> {
    let game = state.game_state().await;
    let total = game.total_questions().unwrap_or(0) as u32;

    let mut eligible: Vec<ParticipantProgress> = state
        .registry()
        .progress_in_order()
        .await
        .into_iter()
        .filter(|progress| {
            progress.status == ParticipantStatus::Done
                && progress.wrong_count == 0
                && progress.correct_count == total
                && progress.duration_ms.is_some()
        })
        .collect();

    match state.config().rank_tie_break() {
        // The scan is already in registration order; a stable sort keeps it
        // as the secondary key.
        RankTieBreak::RegistrationOrder => {
            eligible.sort_by_key(|progress| progress.duration_ms);
        }
        RankTieBreak::FinishedAt => {
            eligible.sort_by_key(|progress| (progress.duration_ms, progress.finished_at));
        }
    }
    eligible.truncate(state.config().top_ranked_count());

    if eligible.is_empty() {
        return Ok(Vec::new());
    }

    let store = state.require_quiz_store().await?;
    let ids = eligible.iter().map(|progress| progress.participant_id).collect();
    let entities = store.participants_by_ids(ids).await?;

    let mut top = Vec::with_capacity(eligible.len());
    for progress in &eligible {
        let Some(entity) = entities
            .iter()
            .find(|entity| entity.id == progress.participant_id)
        else {
            warn!(participant_id = %progress.participant_id, "ranked participant missing from storage");
            continue;
        };
        // Rank follows the emitted entries so a skipped identity cannot
        // leave a gap in the numbering.
        top.push(RankedEntry::from_progress(top.len() + 1, progress, entity));
    }

    Ok(top)
}

/// Sweep every live progress record into durable storage.
///
/// Walks the registry in registration order and commits counters, completion
/// timestamp and duration per participant. Unfinished participants get a
/// wall-clock fallback duration, but only when they actually joined the
/// round; one failed write is logged and skipped so the sweep still covers
/// the rest.
pub async fn persist_all(state: &SharedState) -> Result<usize, ServiceError> {
    let store = state.require_quiz_store().await?;
    let now = epoch_ms();
    let mut persisted = 0;

    for progress in state.registry().progress_in_order().await {
        let duration_ms = match progress.duration_ms {
            Some(duration) if duration > 0 => Some(duration),
            _ => progress
                .joined_at
                .map(|joined_at| now.saturating_sub(joined_at).max(1)),
        };

        let update = ParticipantResultUpdate {
            participant_id: progress.participant_id,
            correct_count: progress.correct_count,
            wrong_count: progress.wrong_count,
            finished_at: progress
                .finished_at
                .map(|ms| UNIX_EPOCH + Duration::from_millis(ms)),
            duration_ms,
        };

        match store.update_participant_result(update).await {
            Ok(()) => persisted += 1,
            Err(err) => {
                warn!(
                    participant_id = %progress.participant_id,
                    error = %err,
                    "failed to persist participant result"
                );
            }
        }
    }

    Ok(persisted)
}
