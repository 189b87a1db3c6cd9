//! Swipe gestures mapped onto session actions.
//!
//! Left skips the current question, right toggles its favorite flag.

mod controller;
mod decision;

pub use controller::{SwipeController, SwipeTarget};
pub use decision::{GestureDecision, GestureTransaction, PointerKind, SwipeDirection, decide};
