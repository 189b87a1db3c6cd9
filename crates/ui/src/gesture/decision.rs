/// Input device behind a drag. Touch and mouse drags behave the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Touch,
    Mouse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SwipeDirection {
    #[default]
    None,
    Left,
    Right,
}

impl SwipeDirection {
    #[must_use]
    pub fn from_offset(offset: f32) -> Self {
        if offset < 0.0 {
            Self::Left
        } else if offset > 0.0 {
            Self::Right
        } else {
            Self::None
        }
    }

    /// Sign applied to the exit offset when animating off-screen.
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
            Self::None => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureDecision {
    Commit(SwipeDirection),
    Cancel,
}

/// Decide what a released drag means. Offsets at or past `threshold` commit.
#[must_use]
pub fn decide(offset: f32, threshold: f32) -> GestureDecision {
    if !offset.is_finite() || !threshold.is_finite() || threshold <= 0.0 {
        return GestureDecision::Cancel;
    }
    if offset <= -threshold {
        GestureDecision::Commit(SwipeDirection::Left)
    } else if offset >= threshold {
        GestureDecision::Commit(SwipeDirection::Right)
    } else {
        GestureDecision::Cancel
    }
}

/// One drag from pointer-down to the end of its animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureTransaction {
    pointer: PointerKind,
    origin: f32,
    offset: f32,
    direction: SwipeDirection,
    committed: bool,
}

impl GestureTransaction {
    #[must_use]
    pub fn begin(pointer: PointerKind, x: f32) -> Self {
        Self {
            pointer,
            origin: x,
            offset: 0.0,
            direction: SwipeDirection::None,
            committed: false,
        }
    }

    /// Track the pointer. Ignored once committed.
    pub fn drag_to(&mut self, x: f32) {
        if self.committed || !x.is_finite() {
            return;
        }
        self.offset = x - self.origin;
        self.direction = SwipeDirection::from_offset(self.offset);
    }

    /// Lock in `direction` and jump the offset to the exit position.
    pub(crate) fn commit(&mut self, direction: SwipeDirection, exit_offset: f32) {
        self.committed = true;
        self.direction = direction;
        self.offset = direction.sign() * exit_offset;
    }

    #[must_use]
    pub fn pointer(&self) -> PointerKind {
        self.pointer
    }

    #[must_use]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    #[must_use]
    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}
