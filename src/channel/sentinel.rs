/// Detects when the content panel has been scrolled to its end.
#[derive(Debug, Clone, Copy)]
pub struct ScrollSentinel {
    threshold: usize,
}

impl ScrollSentinel {
    /// `threshold` is how many lines before the true end still count as the
    /// bottom.
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn reached_bottom(
        &self,
        scroll_top: usize,
        viewport_height: usize,
        content_height: usize,
    ) -> bool {
        scroll_top
            .saturating_add(viewport_height)
            .saturating_add(self.threshold)
            >= content_height
    }
}

impl Default for ScrollSentinel {
    fn default() -> Self {
        Self::new(1)
    }
}
