use page::Element;
use std::time::Instant;

/// Number of notices rendered on the page.
pub const VISIBLE_NOTICES: usize = 5;
const MAX_RETAINED: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn class(self) -> &'static str {
        match self {
            Self::Info => "notice-info",
            Self::Warning => "notice-warning",
            Self::Error => "notice-error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    /// Whether repeating the action that failed may succeed.
    pub retryable: bool,
    pub created_at: Instant,
}

/// User-visible notices raised by the session.
///
/// Notices are kept in creation order. Only the most recent ones are
/// rendered, and the oldest are dropped once the board is full.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows an informational notice.
    ///
    /// # Parameters
    /// - `title`: Short heading
    /// - `message`: Detail shown under the heading
    pub fn show_info(&mut self, title: &str, message: &str) {
        self.push(NoticeLevel::Info, title, message, false);
    }

    /// Shows a warning, used for input the client rejected before sending.
    pub fn show_warning(&mut self, title: &str, message: &str) {
        self.push(NoticeLevel::Warning, title, message, false);
    }

    /// Shows an error notice.
    ///
    /// # Parameters
    /// - `title`: Short heading
    /// - `message`: Detail shown under the heading
    /// - `retryable`: Adds a hint that the action can be repeated
    pub fn show_error(&mut self, title: &str, message: &str, retryable: bool) {
        self.push(NoticeLevel::Error, title, message, retryable);
    }

    fn push(&mut self, level: NoticeLevel, title: &str, message: &str, retryable: bool) {
        self.notices.push(Notice {
            level,
            title: title.to_string(),
            message: message.to_string(),
            retryable,
            created_at: Instant::now(),
        });
        if self.notices.len() > MAX_RETAINED {
            let excess = self.notices.len() - MAX_RETAINED;
            self.notices.drain(..excess);
        }
    }

    /// Returns the most recent notices, newest first.
    pub fn recent(&self) -> Vec<&Notice> {
        self.notices.iter().rev().take(VISIBLE_NOTICES).collect()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    pub fn render(&self) -> Vec<Element> {
        self.recent()
            .into_iter()
            .map(|notice| {
                let mut el = Element::new("div")
                    .with_class("notice")
                    .with_class(notice.level.class())
                    .with_child(Element::new("strong").with_text(&notice.title))
                    .with_child(Element::new("span").with_text(&notice.message));
                if notice.retryable {
                    el.append(
                        Element::new("span")
                            .with_class("notice-retry")
                            .with_text("Try again."),
                    );
                }
                el
            })
            .collect()
    }
}
