use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use quiz_core::model::QuizSettings;
use services::{QuizLoopService, QuizSession};
use storage::repository::QuestionFilter;

use crate::gesture::SwipeController;
use crate::vm::QuizVm;

pub trait UiApp: Send + Sync {
    fn quiz_loop(&self) -> Arc<QuizLoopService>;
    fn settings(&self) -> QuizSettings;

    /// Filter used for the first batch, e.g. a category picked on the command line.
    fn default_filter(&self) -> QuestionFilter;
}

#[derive(Clone)]
pub struct AppContext {
    quiz_loop: Arc<QuizLoopService>,
    settings: QuizSettings,
    default_filter: QuestionFilter,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            quiz_loop: app.quiz_loop(),
            settings: app.settings(),
            default_filter: app.default_filter(),
        }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn default_filter(&self) -> &QuestionFilter {
        &self.default_filter
    }

    /// A fresh session in `Loading`, wrapped in a screen model.
    #[must_use]
    pub fn new_quiz(&self) -> QuizVm {
        let session = self.quiz_loop.new_session(&self.settings);
        QuizVm::new(Rc::new(RefCell::new(session)))
    }

    /// Swipe handling bound to the session behind `vm`.
    #[must_use]
    pub fn swipe_controller(&self, vm: &QuizVm) -> SwipeController<QuizSession> {
        SwipeController::new(vm.session(), &self.settings)
    }
}

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::Clock;
    use quiz_core::time::fixed_now;
    use services::SessionStatus;
    use storage::repository::Storage;
    use storage::sample::sample_questions;

    struct TestApp {
        quiz_loop: Arc<QuizLoopService>,
    }

    impl UiApp for TestApp {
        fn quiz_loop(&self) -> Arc<QuizLoopService> {
            Arc::clone(&self.quiz_loop)
        }

        fn settings(&self) -> QuizSettings {
            QuizSettings::default()
        }

        fn default_filter(&self) -> QuestionFilter {
            QuestionFilter::category("CSS")
        }
    }

    fn context() -> AppContext {
        let storage = Storage::from_in_memory(
            storage::repository::InMemoryRepository::with_drafts(sample_questions()),
        );
        let quiz_loop = QuizLoopService::new(
            Clock::fixed(fixed_now()),
            storage.source,
            storage.favorites,
            storage.answers,
        );
        let app: Arc<dyn UiApp> = Arc::new(TestApp {
            quiz_loop: Arc::new(quiz_loop),
        });
        build_app_context(&app)
    }

    #[test]
    fn new_quiz_starts_loading() {
        let ctx = context();
        let vm = ctx.new_quiz();
        assert_eq!(*vm.session().borrow().status(), SessionStatus::Loading);
        assert_eq!(ctx.default_filter().category_tag.as_deref(), Some("CSS"));
    }

    #[tokio::test]
    async fn default_filter_drives_the_first_batch() {
        let ctx = context();
        let vm = ctx.new_quiz();
        let loaded = ctx.quiz_loop().load_batch(ctx.default_filter()).await;
        let status = ctx.quiz_loop().seed(&mut vm.session().borrow_mut(), loaded);

        assert_eq!(status, SessionStatus::Ready);
        assert_eq!(vm.session().borrow().questions().len(), 1);
        assert!(!ctx.swipe_controller(&vm).is_busy());
    }
}
