//! Wire shapes exchanged with the plotting server.

use crate::error::PlotError;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const FIELD_OBS_ID: &str = "obs_id";
pub const FIELD_QUALITY: &str = "quality";
pub const FIELD_CSRF: &str = page::document::CSRF_FIELD;
pub const FIELD_PLOT_TYPE: &str = "plot_type";
pub const FIELD_GTI_SEARCH: &str = "gti-search";
pub const FIELD_MIN_VALUE: &str = "min_value";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObservationSuggestion {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObservationSuggestions {
    pub dir_suggestions: Vec<ObservationSuggestion>,
}

impl ObservationSuggestions {
    pub fn parse(body: &str) -> Result<Self, PlotError> {
        serde_json::from_str(body).map_err(|e| PlotError::Malformed(e.to_string()))
    }

    pub fn names(self) -> Vec<String> {
        self.dir_suggestions.into_iter().map(|s| s.name).collect()
    }
}

/// Answer to a bulk plot request. `slotIds` is optional; when present it
/// names each fragment's slot directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkPlotResponse {
    #[serde(rename = "plotDivs")]
    pub plot_divs: Vec<String>,
    #[serde(rename = "maxGTI", default)]
    pub max_gti: Vec<Value>,
    #[serde(rename = "obsID", default)]
    pub obs_id: Option<Value>,
    #[serde(default)]
    pub info: Option<Vec<Map<String, Value>>>,
    #[serde(rename = "slotIds", default)]
    pub slot_ids: Vec<Option<String>>,
}

impl BulkPlotResponse {
    pub fn parse(body: &str) -> Result<Self, PlotError> {
        serde_json::from_str(body).map_err(|e| PlotError::Malformed(e.to_string()))
    }

    /// GTI count for fragment `index`, if the server sent a usable one.
    pub fn max_gti_at(&self, index: usize) -> Option<u32> {
        self.max_gti.get(index).and_then(gti_count)
    }

    pub fn slot_id_at(&self, index: usize) -> Option<&str> {
        self.slot_ids.get(index).and_then(|id| id.as_deref())
    }

    pub fn observation_id(&self) -> Option<String> {
        let id = match self.obs_id.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!id.is_empty()).then_some(id)
    }
}

fn gti_count(value: &Value) -> Option<u32> {
    let count = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })?;
    u32::try_from(count).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefinementResponse {
    #[serde(rename = "plotDivs")]
    pub plot_divs: Vec<String>,
    #[serde(rename = "slotId", default)]
    pub slot_id: Option<String>,
}

impl RefinementResponse {
    pub fn parse(body: &str) -> Result<Self, PlotError> {
        serde_json::from_str(body).map_err(|e| PlotError::Malformed(e.to_string()))
    }
}

/// Renders `info` records as a table; columns follow the first record.
pub fn info_table(records: &[Map<String, Value>]) -> page::Element {
    use page::Element;

    let columns: Vec<&String> = records.first().map(|r| r.keys().collect()).unwrap_or_default();
    let head = Element::new("thead").with_child(
        Element::new("tr")
            .with_children(columns.iter().map(|c| Element::new("th").with_text(c))),
    );
    let body = Element::new("tbody").with_children(records.iter().map(|record| {
        Element::new("tr").with_children(columns.iter().map(|column| {
            let cell = match record.get(column.as_str()) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Element::new("td").with_text(&cell)
        }))
    }));
    Element::new("table")
        .with_class("info-table")
        .with_child(head)
        .with_child(body)
}
