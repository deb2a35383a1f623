use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use indexmap::IndexSet;
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::snapshot::QuestionSnapshot;

/// Progress state of one registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    /// Registered but not yet contacted during a running round.
    Pending,
    /// Actively answering questions.
    InGame,
    /// Answered the final question; progress is frozen.
    Done,
}

/// One entry of the per-question answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// 0-based position of the question in the snapshot.
    pub index: usize,
    /// Question text at answer time.
    pub question: String,
    /// Answer submitted by the participant.
    pub given: String,
    /// The correct option.
    pub correct: String,
    /// Verdict of the exact string comparison.
    pub is_correct: bool,
}

/// Result of applying one answer submission to a participant's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Submission was silently dropped (done, out of range, stale).
    Ignored,
    /// Cursor advanced; the next question is servable.
    Advanced {
        /// Verdict for the submitted answer.
        correct: bool,
        /// New cursor position, also the index of the next question.
        next_index: usize,
    },
    /// The final question was answered; the participant is now done.
    Finished {
        /// Verdict for the submitted answer.
        correct: bool,
        /// Completion duration, floored at 1 ms.
        duration_ms: u64,
    },
}

/// Live progress record for one registered session token.
///
/// Mutated exclusively through [`SessionRegistry::with_progress_mut`], which
/// runs the mutation as a single atomic read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantProgress {
    /// Durable participant record this session belongs to.
    pub participant_id: Uuid,
    /// Registration ordinal, used as the default ranking tie-break.
    pub seq: u64,
    /// Current progress status.
    pub status: ParticipantStatus,
    /// 0-based cursor into the question snapshot; only ever increases.
    pub question_index: usize,
    /// Correct answers so far.
    pub correct_count: u32,
    /// Wrong answers so far.
    pub wrong_count: u32,
    /// First running-phase contact, epoch ms; set once, never updated.
    pub joined_at: Option<u64>,
    /// Completion timestamp, epoch ms; set exactly once.
    pub finished_at: Option<u64>,
    /// Completion duration; `Some` iff status is Done.
    pub duration_ms: Option<u64>,
    /// Ordered per-question answer log.
    pub answers: Vec<AnswerRecord>,
}

impl ParticipantProgress {
    fn new(participant_id: Uuid, seq: u64) -> Self {
        Self {
            participant_id,
            seq,
            status: ParticipantStatus::Pending,
            question_index: 0,
            correct_count: 0,
            wrong_count: 0,
            joined_at: None,
            finished_at: None,
            duration_ms: None,
            answers: Vec::new(),
        }
    }

    /// Record running-phase contact: flip to in-game and pin `joined_at` on
    /// the first contact only.
    pub fn mark_in_game(&mut self, now_ms: u64) {
        if self.status == ParticipantStatus::Done {
            return;
        }
        self.status = ParticipantStatus::InGame;
        self.joined_at.get_or_insert(now_ms);
    }

    /// Apply one answer submission against the frozen snapshot.
    ///
    /// Grades the answer, appends the log entry, bumps exactly one counter and
    /// the cursor by exactly one, and flips to Done when the cursor reaches
    /// `total`. Must run inside an atomic read-modify-write so a duplicate
    /// submission observes the already-advanced cursor.
    pub fn apply_answer(
        &mut self,
        snapshot: &QuestionSnapshot,
        total: usize,
        answer: &str,
        now_ms: u64,
    ) -> AnswerOutcome {
        if self.status == ParticipantStatus::Done || self.question_index >= total {
            return AnswerOutcome::Ignored;
        }

        let Some(question) = snapshot.get(self.question_index) else {
            return AnswerOutcome::Ignored;
        };

        let correct = answer == question.correct;
        self.answers.push(AnswerRecord {
            index: self.question_index,
            question: question.text.clone(),
            given: answer.to_owned(),
            correct: question.correct.clone(),
            is_correct: correct,
        });

        if correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
        }
        self.question_index += 1;

        if self.question_index >= total {
            let duration_ms = self.finish(now_ms);
            AnswerOutcome::Finished {
                correct,
                duration_ms,
            }
        } else {
            AnswerOutcome::Advanced {
                correct,
                next_index: self.question_index,
            }
        }
    }

    /// Transition to Done, computing the completion duration exactly once.
    ///
    /// Idempotent: once Done, the stored completion fields are frozen and a
    /// repeat call only returns the recorded duration. The 1 ms floor guards
    /// against zero or negative durations from clock skew between `joined_at`
    /// and now.
    pub fn finish(&mut self, now_ms: u64) -> u64 {
        if self.status == ParticipantStatus::Done {
            return self.duration_ms.unwrap_or(1);
        }
        let joined_at = *self.joined_at.get_or_insert(now_ms);
        let duration_ms = now_ms.saturating_sub(joined_at).max(1);
        self.status = ParticipantStatus::Done;
        self.finished_at = Some(now_ms);
        self.duration_ms = Some(duration_ms);
        duration_ms
    }
}

/// Maps opaque session tokens to live participant progress.
///
/// The `DashMap` provides the per-session atomic read-modify-write primitive;
/// the `IndexSet` mirrors registration order for ranking and persistence
/// scans. Different participants' records are independent and mutate in
/// parallel.
pub struct SessionRegistry {
    sessions: DashMap<String, ParticipantProgress>,
    order: RwLock<IndexSet<String>>,
    next_seq: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            sessions: DashMap::new(),
            order: RwLock::new(IndexSet::new()),
            next_seq: AtomicU64::new(0),
        }
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session for a durable participant record.
    pub async fn register(&self, token: String, participant_id: Uuid) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .insert(token.clone(), ParticipantProgress::new(participant_id, seq));
        self.order.write().await.insert(token);
    }

    /// Snapshot the progress bound to a token, if the session is known.
    pub fn lookup(&self, token: &str) -> Option<ParticipantProgress> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    /// Whether the token resolves to a registered session.
    pub fn contains(&self, token: &str) -> bool {
        self.sessions.contains_key(token)
    }

    /// Run a mutation against one session's progress as a single atomic
    /// read-modify-write.
    ///
    /// The closure executes under the map shard lock and must not suspend;
    /// two concurrent calls for the same token serialize, so the second
    /// observes the state left by the first.
    pub fn with_progress_mut<T>(
        &self,
        token: &str,
        mutate: impl FnOnce(&mut ParticipantProgress) -> T,
    ) -> Option<T> {
        self.sessions
            .get_mut(token)
            .map(|mut entry| mutate(entry.value_mut()))
    }

    /// Tokens in registration order.
    pub async fn tokens_in_order(&self) -> Vec<String> {
        self.order.read().await.iter().cloned().collect()
    }

    /// Progress records in registration order.
    pub async fn progress_in_order(&self) -> Vec<ParticipantProgress> {
        let order = self.order.read().await;
        order
            .iter()
            .filter_map(|token| self.lookup(token))
            .collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session, invalidating all outstanding tokens.
    pub async fn clear(&self) {
        let mut order = self.order.write().await;
        self.sessions.clear();
        order.clear();
    }
}

/// Generate a cryptographically random, unguessable session token.
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    let mut token = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> ParticipantProgress {
        ParticipantProgress::new(Uuid::new_v4(), 0)
    }

    #[test]
    fn session_tokens_are_long_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn cursor_advances_by_exactly_one_per_accepted_answer() {
        let snapshot = QuestionSnapshot::fixture(3);
        let mut p = progress();
        p.mark_in_game(100);

        assert_eq!(
            p.apply_answer(&snapshot, 3, "a", 200),
            AnswerOutcome::Advanced {
                correct: true,
                next_index: 1,
            }
        );
        assert_eq!(
            p.apply_answer(&snapshot, 3, "b", 300),
            AnswerOutcome::Advanced {
                correct: false,
                next_index: 2,
            }
        );
        assert_eq!(p.question_index, 2);
        assert_eq!(p.correct_count + p.wrong_count, p.question_index as u32);
    }

    #[test]
    fn counters_match_cursor_after_every_submission() {
        let snapshot = QuestionSnapshot::fixture(4);
        let mut p = progress();
        p.mark_in_game(0);

        for answer in ["a", "x", "a", "x"] {
            p.apply_answer(&snapshot, 4, answer, 50);
            assert_eq!(p.correct_count + p.wrong_count, p.question_index as u32);
        }
        assert_eq!(p.correct_count, 2);
        assert_eq!(p.wrong_count, 2);
    }

    #[test]
    fn last_answer_finishes_exactly_once() {
        let snapshot = QuestionSnapshot::fixture(1);
        let mut p = progress();
        p.mark_in_game(1_000);

        let outcome = p.apply_answer(&snapshot, 1, "a", 1_500);
        assert_eq!(
            outcome,
            AnswerOutcome::Finished {
                correct: true,
                duration_ms: 500,
            }
        );
        assert_eq!(p.status, ParticipantStatus::Done);
        assert_eq!(p.finished_at, Some(1_500));

        // Late duplicates are absorbed without touching counters.
        assert_eq!(p.apply_answer(&snapshot, 1, "a", 2_000), AnswerOutcome::Ignored);
        assert_eq!(p.correct_count, 1);
        assert_eq!(p.wrong_count, 0);
        assert_eq!(p.question_index, 1);
        assert_eq!(p.duration_ms, Some(500));
    }

    #[test]
    fn finish_is_idempotent_once_done() {
        let snapshot = QuestionSnapshot::fixture(1);
        let mut p = progress();
        p.mark_in_game(1_000);
        p.apply_answer(&snapshot, 1, "a", 1_500);
        assert_eq!(p.duration_ms, Some(500));

        // A stray explicit finish long after completion returns the stored
        // duration and leaves every completion field untouched.
        assert_eq!(p.finish(9_000), 500);
        assert_eq!(p.finished_at, Some(1_500));
        assert_eq!(p.duration_ms, Some(500));
        assert_eq!(p.status, ParticipantStatus::Done);
    }

    #[test]
    fn duration_is_floored_at_one_millisecond() {
        let snapshot = QuestionSnapshot::fixture(1);
        let mut p = progress();
        p.mark_in_game(5_000);

        // Clock skew: completion timestamp not after joined_at.
        let outcome = p.apply_answer(&snapshot, 1, "a", 5_000);
        assert_eq!(
            outcome,
            AnswerOutcome::Finished {
                correct: true,
                duration_ms: 1,
            }
        );
    }

    #[test]
    fn cursor_never_exceeds_total() {
        let snapshot = QuestionSnapshot::fixture(2);
        let mut p = progress();
        p.mark_in_game(0);
        p.apply_answer(&snapshot, 2, "a", 1);
        p.apply_answer(&snapshot, 2, "a", 2);
        p.apply_answer(&snapshot, 2, "a", 3);
        p.apply_answer(&snapshot, 2, "a", 4);
        assert_eq!(p.question_index, 2);
    }

    #[test]
    fn joined_at_is_pinned_on_first_contact() {
        let mut p = progress();
        p.mark_in_game(100);
        p.mark_in_game(900);
        assert_eq!(p.joined_at, Some(100));
        assert_eq!(p.status, ParticipantStatus::InGame);
    }

    #[tokio::test]
    async fn registry_preserves_registration_order_and_clears() {
        let registry = SessionRegistry::new();
        registry.register("t1".into(), Uuid::new_v4()).await;
        registry.register("t2".into(), Uuid::new_v4()).await;
        registry.register("t3".into(), Uuid::new_v4()).await;

        assert_eq!(registry.tokens_in_order().await, vec!["t1", "t2", "t3"]);
        let seqs: Vec<u64> = registry
            .progress_in_order()
            .await
            .into_iter()
            .map(|p| p.seq)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);

        registry.clear().await;
        assert!(registry.is_empty());
        assert!(registry.lookup("t1").is_none());
    }
}
