/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionProgress {
    /// 1-based position of the cursor; 0 when there are no questions.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    /// Position through the batch, 0-100.
    pub percent: u8,
}

impl SessionProgress {
    pub(crate) fn percent_of(position: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        u8::try_from(position.min(total) * 100 / total).unwrap_or(100)
    }
}
