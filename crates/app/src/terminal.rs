use std::fmt::Write as _;

use quiz_core::model::{ChoiceCode, QuestionId, QuestionKind};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use ui::gesture::{GestureDecision, PointerKind};
use ui::vm::{ChoiceMark, QuestionCardVm, html_to_markdown};
use ui::{AppContext, QuizIntent, QuizOutcome, QuizScreen, QuizVm, SwipeController, SwipeDirection};

pub const HELP: &str = "\
Commands:
  a | a,c        answer with choice codes
  answer <text>  answer a free-text question
  n / p          next / previous question
  s              skip
  f              toggle favorite
  h              toggle hint
  < / >          swipe left (skip) / right (favorite)
  history        earlier answers to this question
  q              quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Choose(Vec<ChoiceCode>),
    Answer(String),
    Next,
    Prev,
    Skip,
    Favorite,
    Hint,
    Swipe(SwipeDirection),
    History,
    Help,
    Quit,
}

/// Parse one input line. `None` for blank or unrecognized input.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(text) = line.strip_prefix("answer ") {
        return Some(Command::Answer(text.trim().to_string()));
    }
    let command = match line {
        "" => return None,
        "n" => Command::Next,
        "p" => Command::Prev,
        "s" => Command::Skip,
        "f" => Command::Favorite,
        "h" => Command::Hint,
        "<" => Command::Swipe(SwipeDirection::Left),
        ">" => Command::Swipe(SwipeDirection::Right),
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "q" | "quit" => Command::Quit,
        codes => return parse_choice_codes(codes).map(Command::Choose),
    };
    Some(command)
}

fn parse_choice_codes(raw: &str) -> Option<Vec<ChoiceCode>> {
    raw.split(',')
        .map(str::trim)
        .map(|code| {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_alphabetic() => {
                    ChoiceCode::new(letter.to_ascii_uppercase().to_string()).ok()
                }
                _ => None,
            }
        })
        .collect()
}

fn mark_symbol(mark: ChoiceMark) -> char {
    match mark {
        ChoiceMark::Neutral => ' ',
        ChoiceMark::Selected => '*',
        ChoiceMark::Correct => '+',
        ChoiceMark::WrongSelection => 'x',
    }
}

fn render_card(card: &QuestionCardVm) -> String {
    let mut out = String::new();
    let favorite = if card.is_favorite { " [favorite]" } else { "" };
    let _ = writeln!(
        out,
        "[{}] {} ({}){favorite}",
        card.progress_label, card.title, card.difficulty_label
    );
    if !card.tags.is_empty() {
        let _ = writeln!(out, "tags: {}", card.tags.join(", "));
    }
    let content = html_to_markdown(&card.content_html);
    if !content.is_empty() {
        let _ = writeln!(out, "{content}");
    }

    for choice in &card.choices {
        let _ = writeln!(
            out,
            "  [{}] {}. {}",
            mark_symbol(choice.mark),
            choice.code,
            html_to_markdown(&choice.content_html)
        );
    }
    if let Some(text) = card.text_input.as_deref().filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "  > {text}");
    }

    if let Some(hint) = &card.hint_html {
        let _ = writeln!(out, "hint: {}", html_to_markdown(hint));
    } else if card.has_hint && !card.revealed {
        let _ = writeln!(out, "(hint available: h)");
    }

    if let Some(is_correct) = card.is_correct {
        let _ = writeln!(out, "{}", if is_correct { "Correct!" } else { "Incorrect." });
    }
    if let Some(reference) = &card.reference_answer_html {
        let _ = writeln!(out, "answer: {}", html_to_markdown(reference));
    }
    if let Some(at) = &card.answered_at_label {
        let _ = writeln!(out, "answered {at}");
    }
    let _ = write!(out, "{} ({}%)", card.stats_label, card.progress_percent);
    out
}

pub fn render_screen(screen: &QuizScreen) -> String {
    match screen {
        QuizScreen::Loading => "Loading questions...".to_string(),
        QuizScreen::Empty => "No questions available.".to_string(),
        QuizScreen::Error(message) => message.clone(),
        QuizScreen::Question(card) => render_card(card),
    }
}

/// Drives a `QuizVm` from line commands and persists what the session records.
pub struct Terminal {
    ctx: AppContext,
    vm: QuizVm,
    swipes: SwipeController<services::QuizSession>,
}

impl Terminal {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        let vm = ctx.new_quiz();
        let swipes = ctx.swipe_controller(&vm);
        Self { ctx, vm, swipes }
    }

    #[must_use]
    pub fn vm(&self) -> &QuizVm {
        &self.vm
    }

    /// Load the first batch and mark stored favorites.
    pub async fn start(&mut self) {
        let quiz_loop = self.ctx.quiz_loop();
        self.vm.session().borrow_mut().begin_loading();
        let loaded = quiz_loop.load_batch(self.ctx.default_filter()).await;
        let status = quiz_loop.seed(&mut self.vm.session().borrow_mut(), loaded);
        log::info!("session status: {status}");

        if !status.is_ready() {
            return;
        }
        match quiz_loop.stored_favorites().await {
            Ok(ids) => {
                let restored = self.vm.session().borrow_mut().restore_favorites(&ids);
                log::debug!("restored {restored} favorites");
            }
            Err(err) => log::warn!("failed to read favorites: {err}"),
        }
    }

    /// Run one command. Returns `false` once the user quits.
    pub async fn handle(&mut self, command: Command, out: &mut String) -> bool {
        match command {
            Command::Choose(codes) => self.choose(codes, out).await,
            Command::Answer(text) => {
                self.vm.apply(QuizIntent::EditText(text));
                self.submit(out).await;
            }
            Command::Next => self.apply(QuizIntent::Next, out).await,
            Command::Prev => self.apply(QuizIntent::Prev, out).await,
            Command::Skip => self.apply(QuizIntent::Skip, out).await,
            Command::Favorite => self.apply(QuizIntent::ToggleFavorite, out).await,
            Command::Hint => self.apply(QuizIntent::ToggleHint, out).await,
            Command::Swipe(direction) => self.swipe(direction, out).await,
            Command::History => self.history(out).await,
            Command::Help => {
                let _ = writeln!(out, "{HELP}");
                return true;
            }
            Command::Quit => {
                self.swipes.teardown();
                return false;
            }
        }
        let _ = writeln!(out, "{}", render_screen(&self.vm.screen()));
        true
    }

    async fn choose(&mut self, codes: Vec<ChoiceCode>, out: &mut String) {
        let kind = match self.vm.screen() {
            QuizScreen::Question(card) => card.kind,
            _ => return,
        };
        match kind {
            QuestionKind::SingleChoice => {
                let [code] = codes.as_slice() else {
                    let _ = writeln!(out, "pick exactly one choice");
                    return;
                };
                self.vm.apply(QuizIntent::SelectChoice(code.clone()));
            }
            QuestionKind::MultipleChoice => {
                for code in codes {
                    self.vm.apply(QuizIntent::ToggleChoice(code));
                }
            }
            QuestionKind::TextAnswer => {
                let _ = writeln!(out, "type: answer <text>");
                return;
            }
        }
        self.submit(out).await;
    }

    async fn submit(&mut self, out: &mut String) {
        self.apply(QuizIntent::Submit, out).await;
    }

    async fn apply(&mut self, intent: QuizIntent, out: &mut String) {
        match self.vm.apply(intent) {
            QuizOutcome::Answered(answer) => {
                if let Err(err) = self.ctx.quiz_loop().log_answer(&answer).await {
                    log::warn!("failed to log answer: {err}");
                    let _ = writeln!(out, "(answer not saved)");
                }
            }
            QuizOutcome::FavoriteChanged { .. } => self.persist_favorites(out).await,
            QuizOutcome::Updated | QuizOutcome::Ignored => {}
        }
    }

    async fn swipe(&mut self, direction: SwipeDirection, out: &mut String) {
        if !self.swipes.pointer_down(PointerKind::Touch, 0.0) {
            let _ = writeln!(out, "(still settling)");
            return;
        }
        let favorites_before = self.vm.session().borrow().snapshot().favorites;
        let distance = self.ctx.settings().swipe_exit_offset() * direction.sign();
        self.swipes.pointer_move(distance);
        if self.swipes.pointer_up() == GestureDecision::Cancel {
            return;
        }

        tokio::time::sleep(self.ctx.settings().swipe_settle()).await;
        while self.swipes.is_busy() {
            tokio::task::yield_now().await;
        }
        // Only a toggle that landed is written; an empty screen has nothing to flip.
        let favorites_after = self.vm.session().borrow().snapshot().favorites;
        if favorites_after != favorites_before {
            self.persist_favorites(out).await;
        }
    }

    async fn persist_favorites(&self, out: &mut String) {
        let snapshot = self.vm.session().borrow().snapshot();
        if let Err(err) = self.ctx.quiz_loop().persist_favorites(&snapshot).await {
            log::warn!("failed to save favorites: {err}");
            let _ = writeln!(out, "(favorites not saved)");
        }
    }

    async fn history(&self, out: &mut String) {
        let Some(id) = self.current_id() else {
            return;
        };
        match self.ctx.quiz_loop().question_history(id).await {
            Ok(answers) if answers.is_empty() => {
                let _ = writeln!(out, "no earlier answers");
            }
            Ok(answers) => {
                for answer in answers {
                    let verdict = if answer.is_correct { "correct" } else { "incorrect" };
                    let _ = writeln!(
                        out,
                        "  {} {verdict}",
                        ui::vm::format_datetime(answer.answered_at)
                    );
                }
            }
            Err(err) => {
                log::warn!("failed to read history for {id}: {err}");
                let _ = writeln!(out, "(history unavailable)");
            }
        }
    }

    fn current_id(&self) -> Option<QuestionId> {
        self.vm.session().borrow().current_question().map(|q| q.id())
    }
}

/// Read commands from `input` until `q` or end of input.
///
/// # Errors
///
/// Returns I/O errors from reading `input` or writing `output`.
pub async fn run_loop<R, W>(terminal: &mut Terminal, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut out = render_screen(&terminal.vm().screen());
    out.push('\n');

    loop {
        output.write_all(out.as_bytes()).await?;
        output.flush().await?;
        out.clear();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Some(command) => {
                if !terminal.handle(command, &mut out).await {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => {
                let _ = writeln!(out, "unknown command: {} (help: ?)", line.trim());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use quiz_core::Clock;
    use quiz_core::model::QuizSettings;
    use quiz_core::time::fixed_now;
    use services::QuizLoopService;
    use storage::repository::{
        AnswerLogRepository, FavoriteRepository, InMemoryRepository, QuestionFilter, Storage,
    };
    use storage::sample::sample_questions;
    use tokio::task::LocalSet;
    use ui::{UiApp, build_app_context};

    struct TestApp {
        quiz_loop: Arc<QuizLoopService>,
        filter: QuestionFilter,
    }

    impl UiApp for TestApp {
        fn quiz_loop(&self) -> Arc<QuizLoopService> {
            Arc::clone(&self.quiz_loop)
        }

        fn settings(&self) -> QuizSettings {
            QuizSettings::default()
        }

        fn default_filter(&self) -> QuestionFilter {
            self.filter.clone()
        }
    }

    fn terminal(repo: &InMemoryRepository) -> Terminal {
        terminal_with_filter(repo, QuestionFilter::all())
    }

    fn terminal_with_filter(repo: &InMemoryRepository, filter: QuestionFilter) -> Terminal {
        let storage = Storage::from_in_memory(repo.clone());
        let quiz_loop = QuizLoopService::new(
            Clock::fixed(fixed_now()),
            storage.source,
            storage.favorites,
            storage.answers,
        );
        let app: Arc<dyn UiApp> = Arc::new(TestApp {
            quiz_loop: Arc::new(quiz_loop),
            filter,
        });
        Terminal::new(build_app_context(&app))
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command(" n "), Some(Command::Next));
        assert_eq!(
            parse_command("a, c"),
            Some(Command::Choose(vec![
                ChoiceCode::new("A").unwrap(),
                ChoiceCode::new("C").unwrap()
            ]))
        );
        assert_eq!(
            parse_command("answer  prototype chain"),
            Some(Command::Answer("prototype chain".into()))
        );
        assert_eq!(parse_command(">"), Some(Command::Swipe(SwipeDirection::Right)));
        assert_eq!(parse_command("ab"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn renders_status_screens() {
        assert_eq!(render_screen(&QuizScreen::Loading), "Loading questions...");
        assert_eq!(
            render_screen(&QuizScreen::Error("Failed to load".into())),
            "Failed to load"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_logs_answers_and_favorites() {
        LocalSet::new()
            .run_until(async {
                let repo = InMemoryRepository::with_drafts(sample_questions());
                let mut terminal = terminal(&repo);
                terminal.start().await;

                let script = b"answer The prototype chain links objects\n>\nn\nb\n<\nq\n";
                let mut output = Vec::new();
                run_loop(&mut terminal, &script[..], &mut output).await.unwrap();
                let output = String::from_utf8(output).unwrap();

                assert!(output.contains("Correct!"));
                assert!(output.contains("[favorite]"));

                let session = terminal.vm().session().borrow();
                assert_eq!(session.cursor(), 2);
                assert!(session.is_favorite(QuestionId::new(1)));
                assert_eq!(session.progress().correct, 2);
                drop(session);

                let storage = Storage::from_in_memory(repo);
                assert_eq!(
                    storage.favorites.list_favorites().await.unwrap(),
                    vec![QuestionId::new(1)]
                );
                let logged = storage
                    .answers
                    .answers_for_question(QuestionId::new(2))
                    .await
                    .unwrap();
                assert_eq!(logged.len(), 1);
                assert!(logged[0].is_correct);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn right_swipe_on_empty_screen_keeps_stored_favorites() {
        LocalSet::new()
            .run_until(async {
                let repo = InMemoryRepository::with_drafts(sample_questions());
                let stored = vec![QuestionId::new(1), QuestionId::new(3)];
                let storage = Storage::from_in_memory(repo.clone());
                storage.favorites.replace_favorites(&stored).await.unwrap();

                let mut terminal = terminal_with_filter(&repo, QuestionFilter::category("Rust"));
                terminal.start().await;
                assert_eq!(render_screen(&terminal.vm().screen()), "No questions available.");

                let mut output = Vec::new();
                run_loop(&mut terminal, &b">\nq\n"[..], &mut output).await.unwrap();

                assert_eq!(storage.favorites.list_favorites().await.unwrap(), stored);
            })
            .await;
    }

    #[tokio::test]
    async fn fetch_failure_shows_message() {
        let repo = InMemoryRepository::with_drafts(sample_questions());
        repo.set_fail_fetch(true);
        let mut terminal = terminal(&repo);
        terminal.start().await;

        assert_eq!(
            render_screen(&terminal.vm().screen()),
            services::LOAD_FAILED_MESSAGE
        );
    }
}
