use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use quiz_core::model::QuizSettings;
use services::QuizSession;
use tokio::task::JoinHandle;

use super::decision::{GestureDecision, GestureTransaction, PointerKind, SwipeDirection, decide};

/// Session actions a committed swipe can trigger.
pub trait SwipeTarget {
    /// Left swipe.
    fn skip(&mut self);
    /// Right swipe.
    fn toggle_favorite_current(&mut self);
}

impl SwipeTarget for QuizSession {
    fn skip(&mut self) {
        QuizSession::skip(self);
    }

    fn toggle_favorite_current(&mut self) {
        let _ = QuizSession::toggle_favorite_current(self);
    }
}

#[derive(Default)]
struct GestureState {
    transaction: Option<GestureTransaction>,
    pending: Option<JoinHandle<()>>,
}

/// Maps drags to session actions with an exit animation in between.
///
/// A committed swipe jumps the offset to the exit position, waits for the
/// settle delay, runs the action, then returns the offset to 0. New gestures
/// are refused until that reset. The target is held weakly; a dropped target
/// turns the pending action into a no-op.
pub struct SwipeController<T: SwipeTarget + 'static> {
    target: Weak<RefCell<T>>,
    state: Rc<RefCell<GestureState>>,
    threshold: f32,
    exit_offset: f32,
    settle: Duration,
}

impl<T: SwipeTarget + 'static> SwipeController<T> {
    #[must_use]
    pub fn new(target: &Rc<RefCell<T>>, settings: &QuizSettings) -> Self {
        Self {
            target: Rc::downgrade(target),
            state: Rc::new(RefCell::new(GestureState::default())),
            threshold: settings.swipe_commit_threshold(),
            exit_offset: settings.swipe_exit_offset(),
            settle: settings.swipe_settle(),
        }
    }

    /// Start a gesture. Returns `false` while a previous one is still live.
    pub fn pointer_down(&self, pointer: PointerKind, x: f32) -> bool {
        let mut state = self.state.borrow_mut();
        if state.transaction.is_some() {
            return false;
        }
        state.transaction = Some(GestureTransaction::begin(pointer, x));
        true
    }

    pub fn pointer_move(&self, x: f32) {
        if let Some(tx) = self.state.borrow_mut().transaction.as_mut() {
            tx.drag_to(x);
        }
    }

    /// Release the pointer and settle the gesture.
    ///
    /// # Panics
    ///
    /// A commit schedules its action with `tokio::task::spawn_local`, so this
    /// must run inside a `LocalSet`.
    pub fn pointer_up(&self) -> GestureDecision {
        let mut state = self.state.borrow_mut();
        let Some(tx) = state.transaction.as_mut() else {
            return GestureDecision::Cancel;
        };
        if tx.is_committed() {
            return GestureDecision::Cancel;
        }

        let decision = decide(tx.offset(), self.threshold);
        match decision {
            GestureDecision::Cancel => {
                state.transaction = None;
            }
            GestureDecision::Commit(direction) => {
                tx.commit(direction, self.exit_offset);
                log::debug!("{:?} swipe committed: {direction:?}", tx.pointer());
                state.pending = Some(self.schedule(direction));
            }
        }
        decision
    }

    /// Pointer left the surface or the platform cancelled the drag.
    /// A committed swipe still finishes.
    pub fn pointer_cancel(&self) {
        let mut state = self.state.borrow_mut();
        if state.transaction.is_some_and(|tx| !tx.is_committed()) {
            state.transaction = None;
        }
    }

    /// Abort any pending action and clear the gesture.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.transaction = None;
    }

    /// Current animated offset; 0 when idle.
    #[must_use]
    pub fn offset(&self) -> f32 {
        self.state
            .borrow()
            .transaction
            .map_or(0.0, |tx| tx.offset())
    }

    #[must_use]
    pub fn direction(&self) -> SwipeDirection {
        self.state
            .borrow()
            .transaction
            .map_or(SwipeDirection::None, |tx| tx.direction())
    }

    /// A gesture is in progress or its commit has not settled yet.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.borrow().transaction.is_some()
    }

    fn schedule(&self, direction: SwipeDirection) -> JoinHandle<()> {
        let target = self.target.clone();
        let state = Rc::downgrade(&self.state);
        let settle = self.settle;

        tokio::task::spawn_local(async move {
            tokio::time::sleep(settle).await;

            if let Some(target) = target.upgrade() {
                match target.try_borrow_mut() {
                    Ok(mut target) => match direction {
                        SwipeDirection::Left => target.skip(),
                        SwipeDirection::Right => target.toggle_favorite_current(),
                        SwipeDirection::None => {}
                    },
                    Err(_) => log::debug!("swipe target busy; dropping {direction:?}"),
                }
            } else {
                log::debug!("swipe target gone; dropping {direction:?}");
            }

            if let Some(state) = state.upgrade() {
                let mut state = state.borrow_mut();
                state.transaction = None;
                state.pending = None;
            }
        })
    }
}

impl<T: SwipeTarget + 'static> Drop for SwipeController<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
