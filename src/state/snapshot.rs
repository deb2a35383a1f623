use uuid::Uuid;

use crate::dao::models::QuestionEntity;

/// One question inside a frozen snapshot, including the correct option.
///
/// Only ever exposed to clients through
/// [`crate::dto::ws::PublicQuestion`], which strips `correct`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuestion {
    /// Durable question id.
    pub id: Uuid,
    /// Question text.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The correct option, compared by exact string equality.
    pub correct: String,
}

impl From<QuestionEntity> for SnapshotQuestion {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct: value.correct,
        }
    }
}

/// Immutable, ordered copy of the question bank captured at game start.
///
/// Captured exactly once at the pending → running transition and held fixed
/// for the remainder of the run, so mid-game edits to the durable bank never
/// affect an in-progress game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSnapshot {
    questions: Vec<SnapshotQuestion>,
}

impl QuestionSnapshot {
    /// Freeze an ordered question listing into a snapshot.
    pub fn capture(questions: Vec<QuestionEntity>) -> Self {
        Self {
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of questions in the snapshot.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the snapshot holds no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at the given 0-based cursor position, if in range.
    pub fn get(&self, index: usize) -> Option<&SnapshotQuestion> {
        self.questions.get(index)
    }
}

#[cfg(test)]
impl QuestionSnapshot {
    /// Test helper building a snapshot of `n` questions whose correct answer
    /// is always option "a".
    pub fn fixture(n: usize) -> Self {
        let questions = (0..n)
            .map(|i| SnapshotQuestion {
                id: Uuid::new_v4(),
                text: format!("question {i}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct: "a".into(),
            })
            .collect();
        Self { questions }
    }
}
