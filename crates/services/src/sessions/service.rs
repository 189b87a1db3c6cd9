use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use quiz_core::model::{Question, QuestionId, QuizSettings, SubmittedAnswer, UserAnswer};
use quiz_core::{Clock, Grader};

use super::progress::SessionProgress;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz session.
///
/// `NoQuestions` and `Failed` are displayable terminal states; only a new
/// bootstrap leaves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
    NoQuestions,
    Failed(String),
}

impl SessionStatus {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Ready => f.write_str("ready"),
            Self::NoQuestions => f.write_str("no questions"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Per-question state. Answered questions are always shown revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState<'a> {
    Unanswered,
    Answered(&'a UserAnswer),
}

/// Result of a submit attempt. Only `Recorded` changes the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Recorded(UserAnswer),
    AlreadyAnswered,
    Blank,
    NotReady,
}

/// Read-only copy of answers and favorites for collaborators outside the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Answers in question order.
    pub answers: Vec<UserAnswer>,
    pub favorites: Vec<QuestionId>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session.
///
/// Owns the question batch, the cursor, one answer per question and the
/// favorite set. The batch is fixed between bootstraps and the cursor is
/// clamped to it.
#[derive(Debug, Clone)]
pub struct QuizSession {
    status: SessionStatus,
    questions: Vec<Question>,
    cursor: usize,
    answers: HashMap<QuestionId, UserAnswer>,
    favorites: BTreeSet<QuestionId>,
    grader: Grader,
    clock: Clock,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(Grader::default(), Clock::default())
    }
}

impl QuizSession {
    /// Create an empty session waiting for its first batch.
    #[must_use]
    pub fn new(grader: Grader, clock: Clock) -> Self {
        Self {
            status: SessionStatus::Loading,
            questions: Vec::new(),
            cursor: 0,
            answers: HashMap::new(),
            favorites: BTreeSet::new(),
            grader,
            clock,
        }
    }

    #[must_use]
    pub fn with_settings(settings: &QuizSettings, clock: Clock) -> Self {
        Self::new(Grader::from_settings(settings), clock)
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────────

    /// Enter `Loading` ahead of a new batch. Favorites are left for the next bootstrap to decide.
    pub fn begin_loading(&mut self) {
        self.status = SessionStatus::Loading;
        self.questions.clear();
        self.answers.clear();
        self.cursor = 0;
    }

    /// Seed the session with a validated batch, clearing answers and favorites.
    pub fn bootstrap(&mut self, questions: Vec<Question>) -> &SessionStatus {
        self.favorites.clear();
        self.seed(questions)
    }

    /// Like [`QuizSession::bootstrap`], but keeps the current favorites.
    pub fn bootstrap_carrying_favorites(&mut self, questions: Vec<Question>) -> &SessionStatus {
        self.seed(questions)
    }

    fn seed(&mut self, questions: Vec<Question>) -> &SessionStatus {
        let mut seen = HashSet::with_capacity(questions.len());
        let mut batch = Vec::with_capacity(questions.len());
        for question in questions {
            if seen.insert(question.id()) {
                batch.push(question);
            } else {
                log::warn!("dropping duplicate question {}", question.id());
            }
        }

        self.questions = batch;
        self.answers.clear();
        self.cursor = 0;
        self.status = if self.questions.is_empty() {
            SessionStatus::NoQuestions
        } else {
            SessionStatus::Ready
        };
        log::debug!(
            "session seeded with {} questions ({})",
            self.questions.len(),
            self.status
        );
        &self.status
    }

    /// Record a failed load. The message is shown to the user as-is.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.questions.clear();
        self.answers.clear();
        self.cursor = 0;
        self.status = SessionStatus::Failed(message.into());
    }

    /// Drop everything, including favorites, and wait for a new batch.
    pub fn reset(&mut self) {
        self.begin_loading();
        self.favorites.clear();
    }

    /// Forget all recorded answers; questions and cursor are kept.
    pub fn clear_answers(&mut self) {
        self.answers.clear();
    }

    // ─── Answering ─────────────────────────────────────────────────────────────

    /// Grade and record an answer for the current question.
    ///
    /// Blank answers, repeated submissions and submissions outside `Ready` are
    /// ignored and reported through the outcome.
    pub fn submit(&mut self, answer: SubmittedAnswer) -> SubmitOutcome {
        let Some(question) = self.current_question() else {
            return SubmitOutcome::NotReady;
        };
        if answer.is_blank() {
            return SubmitOutcome::Blank;
        }
        let question_id = question.id();
        if self.answers.contains_key(&question_id) {
            return SubmitOutcome::AlreadyAnswered;
        }

        let is_correct = self.grader.grade(question, Some(&answer));
        let recorded = UserAnswer::new(question_id, answer, is_correct, self.clock.now());
        self.answers.insert(question_id, recorded.clone());
        log::debug!("question {question_id} answered, correct: {is_correct}");
        SubmitOutcome::Recorded(recorded)
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// Move forward one question; stays on the last one.
    pub fn next(&mut self) {
        if self.status.is_ready() && self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
        }
    }

    /// Move back one question; stays on the first one.
    pub fn prev(&mut self) {
        if self.status.is_ready() {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Move on without answering. Leaves no answer behind.
    pub fn skip(&mut self) {
        self.next();
    }

    /// Jump to `index`. Out-of-range indexes are ignored.
    pub fn go_to(&mut self, index: usize) {
        if self.status.is_ready() && index < self.questions.len() {
            self.cursor = index;
        }
    }

    // ─── Favorites ─────────────────────────────────────────────────────────────

    /// Flip the favorite flag for `question_id` and return the new flag.
    pub fn toggle_favorite(&mut self, question_id: QuestionId) -> bool {
        if self.favorites.remove(&question_id) {
            false
        } else {
            self.favorites.insert(question_id);
            true
        }
    }

    /// Toggle the current question; `None` when there is no current question.
    pub fn toggle_favorite_current(&mut self) -> Option<bool> {
        let id = self.current_question()?.id();
        Some(self.toggle_favorite(id))
    }

    /// Mark `ids` as favorites without un-marking anything. Returns how many were new.
    pub fn restore_favorites(&mut self, ids: &[QuestionId]) -> usize {
        ids.iter().filter(|id| self.favorites.insert(**id)).count()
    }

    // ─── Queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.status.is_ready() {
            self.questions.get(self.cursor)
        } else {
            None
        }
    }

    #[must_use]
    pub fn current_state(&self) -> Option<QuestionState<'_>> {
        let question = self.current_question()?;
        Some(match self.answers.get(&question.id()) {
            Some(answer) => QuestionState::Answered(answer),
            None => QuestionState::Unanswered,
        })
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&UserAnswer> {
        self.answers.get(&question_id)
    }

    #[must_use]
    pub fn is_favorite(&self, question_id: QuestionId) -> bool {
        self.favorites.contains(&question_id)
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            answers: self
                .questions
                .iter()
                .filter_map(|q| self.answers.get(&q.id()).cloned())
                .collect(),
            favorites: self.favorites.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let position = if total == 0 { 0 } else { self.cursor + 1 };
        SessionProgress {
            position,
            total,
            answered: self.answers.len(),
            correct: self.answers.values().filter(|a| a.is_correct).count(),
            percent: SessionProgress::percent_of(position, total),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use quiz_core::model::{ChoiceCode, QuestionDraft};
    use quiz_core::time::fixed_now;

    use super::*;

    fn code(value: &str) -> ChoiceCode {
        ChoiceCode::new(value).unwrap()
    }

    fn single(id: u64) -> Question {
        QuestionDraft::single_choice(id, "Virtual DOM", &["A", "B", "C"], "B")
            .validate()
            .unwrap()
    }

    fn multiple(id: u64) -> Question {
        QuestionDraft::multiple_choice(id, "Flexbox", &["A", "B", "C", "D"], &["A", "D"])
            .validate()
            .unwrap()
    }

    fn text(id: u64) -> Question {
        QuestionDraft::text_answer(id, "Prototype chain", "Prototype chain is inheritance")
            .validate()
            .unwrap()
    }

    fn ready(questions: Vec<Question>) -> QuizSession {
        let mut session = QuizSession::new(Grader::default(), Clock::fixed(fixed_now()));
        session.bootstrap(questions);
        session
    }

    #[test]
    fn new_session_is_loading() {
        let session = QuizSession::default();
        assert_eq!(session.status(), &SessionStatus::Loading);
        assert!(session.current_question().is_none());
        assert!(session.current_state().is_none());
    }

    #[test]
    fn bootstrap_empty_batch_is_no_questions() {
        let mut session = QuizSession::default();
        assert_eq!(session.bootstrap(Vec::new()), &SessionStatus::NoQuestions);
        assert!(session.current_question().is_none());
        assert_eq!(session.submit(SubmittedAnswer::Text("x".into())), SubmitOutcome::NotReady);
        assert_eq!(session.progress().position, 0);
    }

    #[test]
    fn bootstrap_drops_duplicate_ids() {
        let session = ready(vec![single(1), text(1), multiple(2)]);
        let ids: Vec<_> = session.questions().iter().map(Question::id).collect();
        assert_eq!(ids, vec![QuestionId::new(1), QuestionId::new(2)]);
    }

    #[test]
    fn single_choice_scenario() {
        let mut session = ready(vec![single(1)]);
        let outcome = session.submit(SubmittedAnswer::SingleChoice(code("B")));
        let SubmitOutcome::Recorded(answer) = outcome else {
            panic!("expected recorded outcome");
        };
        assert!(answer.is_correct);
        assert_eq!(answer.answered_at, fixed_now());

        let mut fresh = ready(vec![single(1)]);
        let outcome = fresh.submit(SubmittedAnswer::SingleChoice(code("A")));
        assert!(matches!(outcome, SubmitOutcome::Recorded(ref a) if !a.is_correct));
    }

    #[test]
    fn partial_multiple_choice_is_incorrect() {
        let mut session = ready(vec![multiple(1)]);
        session.submit(SubmittedAnswer::MultipleChoice(BTreeSet::from([code("A")])));
        assert!(!session.answer_for(QuestionId::new(1)).unwrap().is_correct);
    }

    #[test]
    fn second_submit_is_ignored() {
        let mut session = ready(vec![single(1)]);
        session.submit(SubmittedAnswer::SingleChoice(code("A")));
        let first = session.answer_for(QuestionId::new(1)).cloned();

        assert_eq!(
            session.submit(SubmittedAnswer::SingleChoice(code("B"))),
            SubmitOutcome::AlreadyAnswered
        );
        assert_eq!(session.answer_for(QuestionId::new(1)).cloned(), first);
    }

    #[test]
    fn blank_submit_is_a_no_op() {
        let mut session = ready(vec![text(1), multiple(2)]);
        assert_eq!(session.submit(SubmittedAnswer::Text("   ".into())), SubmitOutcome::Blank);
        session.next();
        assert_eq!(
            session.submit(SubmittedAnswer::MultipleChoice(BTreeSet::new())),
            SubmitOutcome::Blank
        );
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn mismatched_answer_is_recorded_as_incorrect() {
        let mut session = ready(vec![single(1)]);
        let outcome = session.submit(SubmittedAnswer::Text("B".into()));
        assert!(matches!(outcome, SubmitOutcome::Recorded(ref a) if !a.is_correct));
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = ready(vec![single(1), multiple(2), text(3)]);
        let moves = [false, false, true, true, true, true, false, true, false, false, false];
        for forward in moves {
            if forward {
                session.next();
            } else {
                session.prev();
            }
            assert!(session.cursor() < session.questions().len());
        }
        session.next();
        session.next();
        session.next();
        assert_eq!(session.cursor(), 2);
        assert!(session.is_last());
        session.go_to(0);
        assert!(session.is_first());
        session.go_to(7);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn skip_leaves_no_answer() {
        let mut session = ready(vec![single(1), single(2)]);
        session.skip();
        assert_eq!(session.cursor(), 1);
        assert!(session.answer_for(QuestionId::new(1)).is_none());
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn revisiting_an_answered_question_restores_it() {
        let mut session = ready(vec![single(1), single(2)]);
        session.submit(SubmittedAnswer::SingleChoice(code("B")));
        session.next();
        assert_eq!(session.current_state(), Some(QuestionState::Unanswered));
        session.prev();
        let Some(QuestionState::Answered(answer)) = session.current_state() else {
            panic!("expected answered state");
        };
        assert_eq!(answer.answer, SubmittedAnswer::SingleChoice(code("B")));
    }

    #[test]
    fn toggle_favorite_is_its_own_inverse() {
        let mut session = ready(vec![single(1), single(2)]);
        session.toggle_favorite(QuestionId::new(2));
        let before = session.snapshot().favorites;

        assert!(session.toggle_favorite(QuestionId::new(1)));
        assert!(!session.toggle_favorite(QuestionId::new(1)));
        assert_eq!(session.snapshot().favorites, before);
    }

    #[test]
    fn favorites_do_not_touch_answers_and_work_in_any_state() {
        let mut session = QuizSession::default();
        assert!(session.toggle_favorite(QuestionId::new(9)));
        assert_eq!(session.toggle_favorite_current(), None);

        session.bootstrap_carrying_favorites(vec![single(1)]);
        assert!(session.is_favorite(QuestionId::new(9)));
        assert_eq!(session.toggle_favorite_current(), Some(true));
        assert!(session.snapshot().answers.is_empty());
    }

    #[test]
    fn bootstrap_clears_favorites_unless_carried() {
        let mut session = ready(vec![single(1)]);
        session.toggle_favorite(QuestionId::new(1));
        session.submit(SubmittedAnswer::SingleChoice(code("B")));

        session.bootstrap_carrying_favorites(vec![single(1)]);
        assert!(session.is_favorite(QuestionId::new(1)));
        assert!(session.answer_for(QuestionId::new(1)).is_none());

        session.bootstrap(vec![single(1)]);
        assert!(!session.is_favorite(QuestionId::new(1)));
    }

    #[test]
    fn restore_favorites_only_adds() {
        let mut session = ready(vec![single(1), single(2)]);
        session.toggle_favorite(QuestionId::new(1));
        let added = session.restore_favorites(&[QuestionId::new(1), QuestionId::new(2)]);
        assert_eq!(added, 1);
        assert_eq!(
            session.snapshot().favorites,
            vec![QuestionId::new(1), QuestionId::new(2)]
        );
    }

    #[test]
    fn fail_and_reset() {
        let mut session = ready(vec![single(1)]);
        session.toggle_favorite(QuestionId::new(1));
        session.fail("Failed to load questions");
        assert_eq!(
            session.status(),
            &SessionStatus::Failed("Failed to load questions".into())
        );
        assert!(session.questions().is_empty());
        assert!(session.is_favorite(QuestionId::new(1)));

        session.reset();
        assert_eq!(session.status(), &SessionStatus::Loading);
        assert!(!session.is_favorite(QuestionId::new(1)));
    }

    #[test]
    fn clear_answers_keeps_position() {
        let mut session = ready(vec![single(1), single(2)]);
        session.submit(SubmittedAnswer::SingleChoice(code("B")));
        session.next();
        session.clear_answers();
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.progress().answered, 0);
        session.prev();
        assert_eq!(session.current_state(), Some(QuestionState::Unanswered));
    }

    #[test]
    fn progress_and_snapshot_follow_question_order() {
        let mut session = ready(vec![single(1), multiple(2), text(3)]);
        session.go_to(2);
        session.submit(SubmittedAnswer::Text("Prototype chain is how it works".into()));
        session.go_to(0);
        session.submit(SubmittedAnswer::SingleChoice(code("C")));

        let progress = session.progress();
        assert_eq!(progress.position, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.correct, 1);
        assert_eq!(progress.percent, 33);

        let ids: Vec<_> = session
            .snapshot()
            .answers
            .iter()
            .map(|a| a.question_id)
            .collect();
        assert_eq!(ids, vec![QuestionId::new(1), QuestionId::new(3)]);
    }
}
