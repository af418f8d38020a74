/// Quality level chosen through the quality buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualitySelector {
    current: Option<String>,
}

impl QualitySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the lowercased label of the activated button and returns the
    /// original-case label for the quality select.
    pub fn change_quality(&mut self, label: &str) -> String {
        let label = label.trim();
        self.current = Some(label.to_lowercase());
        label.to_string()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Value sent with refinement requests; empty until a level is chosen.
    pub fn form_value(&self) -> &str {
        self.current.as_deref().unwrap_or("")
    }
}
