use page::Element;
use serde::{Deserialize, Serialize};

pub const SUGGESTION_CLASS: &str = "suggestion";
pub const SUGGESTION_INDEX_ATTR: &str = "data-index";

/// How a chosen suggestion is written back into the search field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMode {
    /// The suggestion replaces the whole field value.
    #[default]
    Replace,
    /// The suggestion replaces the text after the last `/`.
    PathSegment,
}

impl SuggestionMode {
    pub fn default_param(self) -> &'static str {
        match self {
            Self::Replace => "obs_id",
            Self::PathSegment => "path",
        }
    }

    pub fn complete(self, current: &str, suggestion: &str) -> String {
        match self {
            Self::Replace => suggestion.to_string(),
            Self::PathSegment => match current.rfind('/') {
                Some(idx) => format!("{}{}", &current[..=idx], suggestion),
                None => suggestion.to_string(),
            },
        }
    }
}

/// Suggestion state for the observation search field.
///
/// Responses are tagged with the sequence number of their request; only a
/// response newer than the last applied one replaces the list.
#[derive(Debug, Clone)]
pub struct Autocomplete {
    mode: SuggestionMode,
    param: String,
    limit: usize,
    last_issued: u64,
    last_applied: u64,
    suggestions: Vec<String>,
}

impl Autocomplete {
    pub fn new(mode: SuggestionMode, param: &str, limit: usize) -> Self {
        Self {
            mode,
            param: param.to_string(),
            limit,
            last_issued: 0,
            last_applied: 0,
            suggestions: Vec::new(),
        }
    }

    pub fn mode(&self) -> SuggestionMode {
        self.mode
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn record_query(&mut self, seq: u64) {
        self.last_issued = self.last_issued.max(seq);
    }

    /// Replaces the list if `seq` is newer than what is shown.
    pub fn apply(&mut self, seq: u64, mut names: Vec<String>) -> bool {
        if seq <= self.last_applied {
            return false;
        }
        if self.limit > 0 {
            names.truncate(self.limit);
        }
        self.last_applied = seq;
        self.suggestions = names;
        true
    }

    pub fn completion(&self, index: usize, current: &str) -> Option<String> {
        self.suggestions
            .get(index)
            .map(|suggestion| self.mode.complete(current, suggestion))
    }

    pub fn render_options(&self) -> Vec<Element> {
        self.suggestions
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                Element::new("a")
                    .with_class(SUGGESTION_CLASS)
                    .with_attr(SUGGESTION_INDEX_ATTR, &idx.to_string())
                    .with_text(name)
            })
            .collect()
    }
}
