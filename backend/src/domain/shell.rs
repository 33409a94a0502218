//! Layout state for the dashboard shell.
//!
//! The sidebar flag lives only as long as the mounted session; nothing here
//! is persisted.

use serde::Serialize;

/// Widest viewport, in CSS pixels, that still renders the compact layout.
pub const COMPACT_MAX_WIDTH: u32 = 768;

/// Responsive layout variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Narrow screens: no search field, collapsible sidebar.
    Compact,
    /// Everything else.
    #[default]
    Full,
}

impl Layout {
    /// Pick the layout for a viewport `width` in CSS pixels.
    ///
    /// # Examples
    /// ```
    /// use ecobin::domain::Layout;
    ///
    /// assert_eq!(Layout::for_viewport_width(768), Layout::Compact);
    /// assert_eq!(Layout::for_viewport_width(769), Layout::Full);
    /// ```
    pub const fn for_viewport_width(width: u32) -> Self {
        if width <= COMPACT_MAX_WIDTH {
            Self::Compact
        } else {
            Self::Full
        }
    }

    /// Whether the header shows the search field.
    pub const fn shows_search(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Sidebar and layout flags of a mounted shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellState {
    sidebar_open: bool,
    layout: Layout,
}

impl ShellState {
    /// Closed sidebar, layout chosen from `viewport_width`.
    pub const fn new(viewport_width: u32) -> Self {
        Self {
            sidebar_open: false,
            layout: Layout::for_viewport_width(viewport_width),
        }
    }

    /// Flip the sidebar and return its new state.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    /// Re-evaluate the layout after a resize.
    pub fn set_viewport_width(&mut self, width: u32) {
        self.layout = Layout::for_viewport_width(width);
    }

    /// Whether the sidebar is open.
    pub const fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Current layout.
    pub const fn layout(&self) -> Layout {
        self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(320, Layout::Compact)]
    #[case(768, Layout::Compact)]
    #[case(769, Layout::Full)]
    #[case(1440, Layout::Full)]
    fn layout_breakpoint(#[case] width: u32, #[case] expected: Layout) {
        assert_eq!(Layout::for_viewport_width(width), expected);
    }

    #[rstest]
    fn search_only_in_full_layout() {
        assert!(Layout::Full.shows_search());
        assert!(!Layout::Compact.shows_search());
    }

    #[rstest]
    fn sidebar_toggles_and_survives_resize() {
        let mut shell = ShellState::new(1024);
        assert!(!shell.sidebar_open());

        assert!(shell.toggle_sidebar());
        shell.set_viewport_width(600);

        assert!(shell.sidebar_open());
        assert_eq!(shell.layout(), Layout::Compact);
        assert!(!shell.toggle_sidebar());
    }
}
