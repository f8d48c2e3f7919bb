/// Number of items already rendered for the current channel and filter.
///
/// Owned by [`super::ViewState`] and only moved by it, so the offset sent to
/// the server can never drift from what is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    offset: u64,
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset for the next fetch.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn advance(&mut self, items: usize) {
        self.offset = self.offset.saturating_add(items as u64);
    }

    pub(crate) fn reset(&mut self) {
        self.offset = 0;
    }
}
