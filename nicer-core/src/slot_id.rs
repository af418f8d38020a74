use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Identifier of one plot slot on the page, also used as the element id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotIdError {
    #[error("plot markup carries no title")]
    MissingTitle,
    #[error("title pattern failed to compile: {0}")]
    Pattern(String),
}

fn title_pattern() -> Result<&'static Regex, SlotIdError> {
    static PATTERN: OnceLock<Result<Regex, String>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#""title":\{"text":"([^"]+)""#).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| SlotIdError::Pattern(e.clone()))
}

/// Lowercases and replaces spaces with underscores.
pub fn slugify_title(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// Derives a slot id from the first embedded `"title":{"text":"..."}`.
pub fn derive_slot_id(fragment: &str) -> Result<SlotId, SlotIdError> {
    let captures = title_pattern()?
        .captures(fragment)
        .ok_or(SlotIdError::MissingTitle)?;
    Ok(SlotId(slugify_title(&captures[1])))
}

/// Uses the server-supplied id when it is non-blank, else the title.
pub fn resolve_slot_id(explicit: Option<&str>, fragment: &str) -> Result<SlotId, SlotIdError> {
    match explicit.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Ok(SlotId::new(id)),
        None => derive_slot_id(fragment),
    }
}
