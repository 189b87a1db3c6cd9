#![forbid(unsafe_code)]

pub mod context;
pub mod gesture;
pub mod vm;

pub use context::{AppContext, UiApp, build_app_context};
pub use gesture::{SwipeController, SwipeDirection};
pub use vm::{QuizIntent, QuizOutcome, QuizScreen, QuizVm};
