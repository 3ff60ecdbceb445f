/// How far a link collector may go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectBudget {
    /// Result pages to visit (paginated sources)
    pub pages: usize,
    /// Stop scrolling once this many links are known (infinite-scroll sources)
    pub target_links: usize,
    /// Hard cap on scroll steps, in case the feed runs dry
    pub max_scrolls: usize,
}

impl CollectBudget {
    pub fn pages(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn scroll(target_links: usize, max_scrolls: usize) -> Self {
        Self {
            target_links,
            max_scrolls,
            ..Self::default()
        }
    }

    /// Applies command-line overrides on top of a source default
    pub fn with_overrides(
        mut self,
        pages: Option<usize>,
        target_links: Option<usize>,
        max_scrolls: Option<usize>,
    ) -> Self {
        if let Some(pages) = pages {
            self.pages = pages;
        }
        if let Some(target) = target_links {
            self.target_links = target;
        }
        if let Some(max) = max_scrolls {
            self.max_scrolls = max;
        }
        self
    }
}

impl Default for CollectBudget {
    fn default() -> Self {
        Self {
            pages: 1,
            target_links: 50,
            max_scrolls: 40,
        }
    }
}
