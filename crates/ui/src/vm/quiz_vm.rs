use std::cell::RefCell;
use std::rc::Rc;

use quiz_core::model::{ChoiceCode, QuestionId, QuestionKind, UserAnswer};
use services::{QuizSession, SessionStatus, SubmitOutcome};

use super::question_vm::{AnswerInput, CardContext, QuestionCardVm};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizIntent {
    SelectChoice(ChoiceCode),
    ToggleChoice(ChoiceCode),
    EditText(String),
    Submit,
    Next,
    Prev,
    Skip,
    GoTo(usize),
    ToggleFavorite,
    ToggleHint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizOutcome {
    Updated,
    Answered(UserAnswer),
    FavoriteChanged { question_id: QuestionId, is_favorite: bool },
    /// Nothing changed, e.g. an empty submit or editing a revealed question.
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizScreen {
    Loading,
    Empty,
    Error(String),
    Question(Box<QuestionCardVm>),
}

/// Screen state for a quiz: the shared session plus the answer being typed.
pub struct QuizVm {
    session: Rc<RefCell<QuizSession>>,
    input: Option<(QuestionId, AnswerInput)>,
    show_hint: bool,
}

impl QuizVm {
    #[must_use]
    pub fn new(session: Rc<RefCell<QuizSession>>) -> Self {
        Self {
            session,
            input: None,
            show_hint: false,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Rc<RefCell<QuizSession>> {
        &self.session
    }

    pub fn apply(&mut self, intent: QuizIntent) -> QuizOutcome {
        match intent {
            QuizIntent::SelectChoice(code) | QuizIntent::ToggleChoice(code)
                if !self.offers_choice(&code) =>
            {
                QuizOutcome::Ignored
            }
            QuizIntent::SelectChoice(code) => self.edit(|input| match input {
                AnswerInput::Single(selected) => {
                    *selected = Some(code);
                    true
                }
                _ => false,
            }),
            QuizIntent::ToggleChoice(code) => self.edit(|input| match input {
                AnswerInput::Multiple(selected) => {
                    if !selected.remove(&code) {
                        selected.insert(code);
                    }
                    true
                }
                _ => false,
            }),
            QuizIntent::EditText(text) => self.edit(|input| match input {
                AnswerInput::Text(current) => {
                    *current = text;
                    true
                }
                _ => false,
            }),
            QuizIntent::Submit => self.submit(),
            QuizIntent::Next => self.navigate(QuizSession::next),
            QuizIntent::Prev => self.navigate(QuizSession::prev),
            QuizIntent::Skip => self.navigate(QuizSession::skip),
            QuizIntent::GoTo(index) => self.navigate(|s| s.go_to(index)),
            QuizIntent::ToggleFavorite => {
                let mut session = self.session.borrow_mut();
                let Some(question_id) = session.current_question().map(|q| q.id()) else {
                    return QuizOutcome::Ignored;
                };
                let is_favorite = session.toggle_favorite(question_id);
                QuizOutcome::FavoriteChanged {
                    question_id,
                    is_favorite,
                }
            }
            QuizIntent::ToggleHint => {
                if self.current_key().is_none() {
                    return QuizOutcome::Ignored;
                }
                self.sync_input();
                self.show_hint = !self.show_hint;
                QuizOutcome::Updated
            }
        }
    }

    #[must_use]
    pub fn screen(&self) -> QuizScreen {
        let session = self.session.borrow();
        match session.status() {
            SessionStatus::Loading => return QuizScreen::Loading,
            SessionStatus::NoQuestions => return QuizScreen::Empty,
            SessionStatus::Failed(message) => return QuizScreen::Error(message.clone()),
            SessionStatus::Ready => {}
        }
        let Some(question) = session.current_question() else {
            return QuizScreen::Empty;
        };

        let fresh;
        let input = match &self.input {
            Some((owner, input)) if *owner == question.id() => input,
            _ => {
                fresh = AnswerInput::empty_for(question.kind());
                &fresh
            }
        };
        let show_hint = self
            .input
            .as_ref()
            .is_some_and(|(owner, _)| *owner == question.id())
            && self.show_hint;

        QuizScreen::Question(Box::new(QuestionCardVm::build(&CardContext {
            question,
            answer: session.answer_for(question.id()),
            input,
            show_hint,
            is_favorite: session.is_favorite(question.id()),
            is_first: session.is_first(),
            is_last: session.is_last(),
            progress: session.progress(),
        })))
    }

    fn offers_choice(&self, code: &ChoiceCode) -> bool {
        self.session
            .borrow()
            .current_question()
            .is_some_and(|question| question.has_choice(code))
    }

    fn current_key(&self) -> Option<(QuestionId, QuestionKind, bool)> {
        let session = self.session.borrow();
        let question = session.current_question()?;
        let answered = session.answer_for(question.id()).is_some();
        Some((question.id(), question.kind(), answered))
    }

    /// Reset the input when the current question changed since the last edit.
    fn sync_input(&mut self) {
        let Some((id, kind, _)) = self.current_key() else {
            self.input = None;
            return;
        };
        if self.input.as_ref().is_none_or(|(owner, _)| *owner != id) {
            self.input = Some((id, AnswerInput::empty_for(kind)));
            self.show_hint = false;
        }
    }

    fn edit(&mut self, change: impl FnOnce(&mut AnswerInput) -> bool) -> QuizOutcome {
        match self.current_key() {
            Some((_, _, false)) => {}
            // Revealed questions are read-only.
            _ => return QuizOutcome::Ignored,
        }
        self.sync_input();
        let Some((_, input)) = self.input.as_mut() else {
            return QuizOutcome::Ignored;
        };
        if change(input) {
            QuizOutcome::Updated
        } else {
            QuizOutcome::Ignored
        }
    }

    fn submit(&mut self) -> QuizOutcome {
        self.sync_input();
        let Some(answer) = self.input.as_ref().and_then(|(_, input)| input.to_submitted()) else {
            return QuizOutcome::Ignored;
        };
        match self.session.borrow_mut().submit(answer) {
            SubmitOutcome::Recorded(recorded) => QuizOutcome::Answered(recorded),
            SubmitOutcome::AlreadyAnswered | SubmitOutcome::Blank | SubmitOutcome::NotReady => {
                QuizOutcome::Ignored
            }
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut QuizSession)) -> QuizOutcome {
        let before = self.session.borrow().cursor();
        step(&mut self.session.borrow_mut());
        if self.session.borrow().cursor() == before {
            return QuizOutcome::Ignored;
        }
        self.sync_input();
        QuizOutcome::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::question_vm::ChoiceMark;
    use quiz_core::model::{QuestionDraft, SubmittedAnswer};

    fn code(value: &str) -> ChoiceCode {
        ChoiceCode::new(value).unwrap()
    }

    fn vm() -> QuizVm {
        let mut session = QuizSession::default();
        session.bootstrap(vec![
            QuestionDraft::single_choice(1, "Virtual DOM", &["A", "B", "C"], "B")
                .validate()
                .unwrap(),
            QuestionDraft::multiple_choice(2, "Flexbox", &["A", "B", "C", "D"], &["A", "D"])
                .validate()
                .unwrap(),
            QuestionDraft::text_answer(3, "Prototype chain", "Prototype chain is inheritance")
                .validate()
                .unwrap(),
        ]);
        QuizVm::new(Rc::new(RefCell::new(session)))
    }

    fn card(vm: &QuizVm) -> QuestionCardVm {
        match vm.screen() {
            QuizScreen::Question(card) => *card,
            other => panic!("expected question screen, got {other:?}"),
        }
    }

    #[test]
    fn screen_follows_session_status() {
        let vm = QuizVm::new(Rc::new(RefCell::new(QuizSession::default())));
        assert_eq!(vm.screen(), QuizScreen::Loading);

        vm.session().borrow_mut().bootstrap(Vec::new());
        assert_eq!(vm.screen(), QuizScreen::Empty);

        vm.session().borrow_mut().fail("Failed to load");
        assert_eq!(vm.screen(), QuizScreen::Error("Failed to load".into()));
    }

    #[test]
    fn empty_submit_is_ignored() {
        let mut vm = vm();
        assert_eq!(vm.apply(QuizIntent::Submit), QuizOutcome::Ignored);
        assert!(!card(&vm).revealed);
    }

    #[test]
    fn submit_reveals_and_locks_the_question() {
        let mut vm = vm();
        assert_eq!(vm.apply(QuizIntent::SelectChoice(code("B"))), QuizOutcome::Updated);
        let QuizOutcome::Answered(answer) = vm.apply(QuizIntent::Submit) else {
            panic!("expected answered outcome");
        };
        assert!(answer.is_correct);

        let revealed = card(&vm);
        assert!(revealed.revealed);
        assert_eq!(revealed.is_correct, Some(true));

        assert_eq!(vm.apply(QuizIntent::SelectChoice(code("A"))), QuizOutcome::Ignored);
        assert_eq!(vm.apply(QuizIntent::Submit), QuizOutcome::Ignored);
    }

    #[test]
    fn navigating_back_restores_revealed_answer() {
        let mut vm = vm();
        vm.apply(QuizIntent::Next);
        vm.apply(QuizIntent::ToggleChoice(code("A")));
        vm.apply(QuizIntent::ToggleChoice(code("D")));
        vm.apply(QuizIntent::ToggleChoice(code("C")));
        vm.apply(QuizIntent::ToggleChoice(code("C")));
        vm.apply(QuizIntent::Submit);

        vm.apply(QuizIntent::Next);
        assert!(!card(&vm).revealed);
        vm.apply(QuizIntent::Prev);

        let card = card(&vm);
        assert!(card.revealed);
        assert_eq!(card.is_correct, Some(true));
        assert_eq!(
            vm.session().borrow().answer_for(QuestionId::new(2)).map(|a| a.answer.clone()),
            Some(SubmittedAnswer::MultipleChoice([code("A"), code("D")].into()))
        );
    }

    #[test]
    fn unsubmitted_input_is_dropped_on_navigation() {
        let mut vm = vm();
        vm.apply(QuizIntent::GoTo(2));
        vm.apply(QuizIntent::EditText("Prototype chain".into()));
        assert_eq!(card(&vm).text_input.as_deref(), Some("Prototype chain"));

        vm.apply(QuizIntent::Prev);
        vm.apply(QuizIntent::Next);
        assert_eq!(card(&vm).text_input.as_deref(), Some(""));
    }

    #[test]
    fn unknown_choice_codes_are_ignored() {
        let mut vm = vm();
        assert_eq!(vm.apply(QuizIntent::SelectChoice(code("E"))), QuizOutcome::Ignored);
        assert_eq!(vm.apply(QuizIntent::Submit), QuizOutcome::Ignored);

        vm.apply(QuizIntent::Next);
        assert_eq!(vm.apply(QuizIntent::ToggleChoice(code("a"))), QuizOutcome::Ignored);
        assert_eq!(vm.apply(QuizIntent::ToggleChoice(code("A"))), QuizOutcome::Updated);
    }

    #[test]
    fn boundary_navigation_is_ignored() {
        let mut vm = vm();
        assert_eq!(vm.apply(QuizIntent::Prev), QuizOutcome::Ignored);
        assert_eq!(vm.apply(QuizIntent::GoTo(9)), QuizOutcome::Ignored);
        assert_eq!(vm.apply(QuizIntent::Skip), QuizOutcome::Updated);
        assert!(vm.session().borrow().answer_for(QuestionId::new(1)).is_none());
    }

    #[test]
    fn favorite_and_hint_toggles() {
        let mut vm = vm();
        assert_eq!(
            vm.apply(QuizIntent::ToggleFavorite),
            QuizOutcome::FavoriteChanged {
                question_id: QuestionId::new(1),
                is_favorite: true
            }
        );
        assert!(card(&vm).is_favorite);

        assert_eq!(vm.apply(QuizIntent::ToggleHint), QuizOutcome::Updated);
        // No hint on this question, so nothing is rendered.
        assert_eq!(card(&vm).hint_html, None);
    }

    #[test]
    fn swipe_moves_are_picked_up_by_the_screen() {
        let mut vm = vm();
        vm.apply(QuizIntent::SelectChoice(code("C")));
        vm.session().borrow_mut().skip();

        let card = card(&vm);
        assert_eq!(card.title, "Flexbox");
        assert!(card.choices.iter().all(|c| c.mark == ChoiceMark::Neutral));
        assert_eq!(vm.apply(QuizIntent::Submit), QuizOutcome::Ignored);
    }
}
