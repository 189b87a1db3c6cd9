use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("text match prefix must be at least 1 character")]
    InvalidTextMatchPrefix,

    #[error("swipe commit threshold must be a positive distance")]
    InvalidSwipeThreshold,

    #[error("swipe exit offset must exceed the commit threshold")]
    InvalidSwipeExitOffset,

    #[error("swipe settle delay must be between 1 and 5000 ms")]
    InvalidSwipeSettle,
}

/// Tunables for grading and gesture handling.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    text_match_prefix_chars: usize,
    swipe_commit_threshold: f32,
    swipe_exit_offset: f32,
    swipe_settle_ms: u32,
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the prefix is zero, the threshold is not a
    /// positive finite distance, the exit offset does not clear the threshold,
    /// or the settle delay is outside 1..=5000 ms.
    pub fn new(
        text_match_prefix_chars: usize,
        swipe_commit_threshold: f32,
        swipe_exit_offset: f32,
        swipe_settle_ms: u32,
    ) -> Result<Self, SettingsError> {
        if text_match_prefix_chars == 0 {
            return Err(SettingsError::InvalidTextMatchPrefix);
        }
        if !swipe_commit_threshold.is_finite() || swipe_commit_threshold <= 0.0 {
            return Err(SettingsError::InvalidSwipeThreshold);
        }
        if !swipe_exit_offset.is_finite() || swipe_exit_offset <= swipe_commit_threshold {
            return Err(SettingsError::InvalidSwipeExitOffset);
        }
        if !(1..=5000).contains(&swipe_settle_ms) {
            return Err(SettingsError::InvalidSwipeSettle);
        }

        Ok(Self {
            text_match_prefix_chars,
            swipe_commit_threshold,
            swipe_exit_offset,
            swipe_settle_ms,
        })
    }

    /// Number of leading reference characters a free-text answer must contain.
    #[must_use]
    pub fn text_match_prefix_chars(&self) -> usize {
        self.text_match_prefix_chars
    }

    /// Horizontal drag distance (px) past which a release commits the swipe.
    #[must_use]
    pub fn swipe_commit_threshold(&self) -> f32 {
        self.swipe_commit_threshold
    }

    /// Offset (px) the card animates to when a swipe commits.
    #[must_use]
    pub fn swipe_exit_offset(&self) -> f32 {
        self.swipe_exit_offset
    }

    #[must_use]
    pub fn swipe_settle(&self) -> Duration {
        Duration::from_millis(u64::from(self.swipe_settle_ms))
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            text_match_prefix_chars: 10,
            swipe_commit_threshold: 80.0,
            swipe_exit_offset: 300.0,
            swipe_settle_ms: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let d = QuizSettings::default();
        let rebuilt = QuizSettings::new(
            d.text_match_prefix_chars(),
            d.swipe_commit_threshold(),
            d.swipe_exit_offset(),
            300,
        )
        .unwrap();
        assert_eq!(d, rebuilt);
        assert_eq!(d.swipe_settle(), Duration::from_millis(300));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            QuizSettings::new(0, 80.0, 300.0, 300),
            Err(SettingsError::InvalidTextMatchPrefix)
        );
        assert_eq!(
            QuizSettings::new(10, f32::NAN, 300.0, 300),
            Err(SettingsError::InvalidSwipeThreshold)
        );
        assert_eq!(
            QuizSettings::new(10, 80.0, 50.0, 300),
            Err(SettingsError::InvalidSwipeExitOffset)
        );
        assert_eq!(
            QuizSettings::new(10, 80.0, 300.0, 0),
            Err(SettingsError::InvalidSwipeSettle)
        );
    }
}
