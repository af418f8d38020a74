//! Show/hide behaviour of suggestion dropdowns.
//!
//! A field shows its dropdown content while focused. On blur the content
//! stays visible for a short delay so a click on a suggestion can land.

use page::Element;
use std::time::{Duration, Instant};

pub const DROPDOWN_CLASS: &str = "dropdown";
pub const DROPDOWN_FIELD_CLASS: &str = "dropdown-field";
pub const DROPDOWN_CONTENT_CLASS: &str = "dropdown-content";
pub const SHOW_CLASS: &str = "show";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Hidden,
    Shown,
}

#[derive(Debug, Clone)]
pub struct DropdownController {
    state: DropdownState,
    hide_delay: Duration,
    pending_hide: Option<Instant>,
}

impl DropdownController {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            state: DropdownState::Hidden,
            hide_delay,
            pending_hide: None,
        }
    }

    pub fn state(&self) -> DropdownState {
        self.state
    }

    pub fn pending_hide(&self) -> Option<Instant> {
        self.pending_hide
    }

    /// Focus shows the content and cancels any scheduled hide.
    pub fn focus(&mut self) {
        self.pending_hide = None;
        self.state = DropdownState::Shown;
    }

    pub fn blur(&mut self, now: Instant) {
        if self.state == DropdownState::Shown {
            self.pending_hide = Some(now + self.hide_delay);
        }
    }

    /// Applies a due hide. Returns true when the state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_hide {
            Some(at) if now >= at => {
                self.pending_hide = None;
                self.state = DropdownState::Hidden;
                true
            }
            _ => false,
        }
    }

    pub fn is_shown(&self, now: Instant) -> bool {
        match self.state {
            DropdownState::Hidden => false,
            DropdownState::Shown => self.pending_hide.map_or(true, |at| now < at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DropdownBinding {
    pub field_id: String,
    pub content_id: String,
    pub controller: DropdownController,
}

impl DropdownBinding {
    /// Mirrors the controller state onto the content element's classes.
    pub fn sync(&self, root: &mut Element) {
        if let Some(content) = root.find_by_id_mut(&self.content_id) {
            match self.controller.state() {
                DropdownState::Shown => content.add_class(SHOW_CLASS),
                DropdownState::Hidden => content.remove_class(SHOW_CLASS),
            }
        }
    }
}

/// Pairs every `.dropdown-field` with the `.dropdown-content` sharing its
/// `.dropdown` container. Both need ids to be bound.
pub fn bind_dropdowns(root: &Element, hide_delay: Duration) -> Vec<DropdownBinding> {
    let mut bindings = Vec::new();
    for container in root.find_all_by_class(DROPDOWN_CLASS) {
        let field = container.find_first_by_class(DROPDOWN_FIELD_CLASS);
        let content = container.find_first_by_class(DROPDOWN_CONTENT_CLASS);
        match (field.and_then(Element::id), content.and_then(Element::id)) {
            (Some(field_id), Some(content_id)) => bindings.push(DropdownBinding {
                field_id: field_id.to_string(),
                content_id: content_id.to_string(),
                controller: DropdownController::new(hide_delay),
            }),
            _ => log::warn!("skipping dropdown without an identified field and content"),
        }
    }
    bindings
}
