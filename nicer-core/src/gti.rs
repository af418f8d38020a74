//! Per-slot GTI selection form and selection parsing.

use crate::protocol::{FIELD_GTI_SEARCH, FIELD_MIN_VALUE, FIELD_PLOT_TYPE};
use crate::settings::MinCounts;
use crate::slot_id::SlotId;
use page::{column_layout, Element};
use std::collections::BTreeSet;

pub const GTI_FORM_CLASS: &str = "fetch-gti";
pub const GTI_UNAVAILABLE_CLASS: &str = "gti-unavailable";
pub const SLOT_ATTR: &str = "data-slot";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GtiSpecError {
    #[error("no GTIs are available for this plot")]
    NoGtis,
    #[error("GTI selection is empty")]
    Empty,
    #[error("'{0}' is not a GTI number")]
    InvalidNumber(String),
    #[error("range {start}-{end} runs backwards")]
    ReversedRange { start: u32, end: u32 },
    #[error("GTI {value} is outside 0..={last}")]
    OutOfRange { value: u32, last: u32 },
}

pub fn slider_id(slot: &SlotId) -> String {
    format!("{slot}-min-slider")
}

pub fn min_value_label_id(slot: &SlotId) -> String {
    format!("{slot}-min-value")
}

pub fn min_value_label(value: u32) -> String {
    format!("Value: {value} counts")
}

pub fn search_placeholder(max_gti: u32) -> String {
    if max_gti == 0 {
        "No GTIs available".to_string()
    } else {
        format!(
            "GTI numbers (,) and/or range (-) between 0 and {}",
            max_gti - 1
        )
    }
}

pub fn clamp_min_value(value: i64, counts: &MinCounts) -> u32 {
    let clamped = value.clamp(i64::from(counts.min), i64::from(counts.max));
    u32::try_from(clamped).unwrap_or(counts.min)
}

/// Builds the refinement form shown under a plot slot.
///
/// `slot` tags the form and its element ids. Hidden `plot_type` carries the
/// plot's own id, which differs from `slot` once a duplicate got a suffix.
/// The search row holds the GTI text field and submit button, the slider row
/// the min-counts range and its label.
pub fn build_gti_form(
    max_gti: u32,
    slot: &SlotId,
    plot_type: &SlotId,
    counts: &MinCounts,
) -> Element {
    let mut search = Element::new("input")
        .with_attr("type", "text")
        .with_attr("name", FIELD_GTI_SEARCH)
        .with_attr("placeholder", &search_placeholder(max_gti));
    if max_gti == 0 {
        search.set_attr("disabled", "");
    }
    let submit = Element::new("button")
        .with_attr("type", "submit")
        .with_text("Submit");
    let slider = Element::new("input")
        .with_id(&slider_id(slot))
        .with_attr("type", "range")
        .with_attr("name", FIELD_MIN_VALUE)
        .with_attr("min", &counts.min.to_string())
        .with_attr("max", &counts.max.to_string())
        .with_attr("value", &counts.default.to_string());
    let label = Element::new("p")
        .with_id(&min_value_label_id(slot))
        .with_text(&min_value_label(counts.default));

    Element::new("form")
        .with_class(GTI_FORM_CLASS)
        .with_attr(SLOT_ATTR, slot.as_str())
        .with_child(
            Element::new("input")
                .with_attr("type", "hidden")
                .with_attr("name", FIELD_PLOT_TYPE)
                .with_attr("value", plot_type.as_str()),
        )
        .with_child(column_layout([search, submit]))
        .with_child(column_layout([slider, label]))
}

pub fn gti_unavailable(slot: &SlotId) -> Element {
    Element::new("p")
        .with_class(GTI_UNAVAILABLE_CLASS)
        .with_attr(SLOT_ATTR, slot.as_str())
        .with_text("GTI selection unavailable")
}

fn parse_index(token: &str, last: u32) -> Result<u32, GtiSpecError> {
    let value: u32 = token
        .trim()
        .parse()
        .map_err(|_| GtiSpecError::InvalidNumber(token.trim().to_string()))?;
    if value > last {
        return Err(GtiSpecError::OutOfRange { value, last });
    }
    Ok(value)
}

/// Parses `"0,3,5-7"` into sorted, de-duplicated GTI indices below `max_gti`.
pub fn parse_gti_spec(text: &str, max_gti: u32) -> Result<Vec<u32>, GtiSpecError> {
    if max_gti == 0 {
        return Err(GtiSpecError::NoGtis);
    }
    let last = max_gti - 1;
    let mut selected = BTreeSet::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start, last)?;
                let end = parse_index(end, last)?;
                if start > end {
                    return Err(GtiSpecError::ReversedRange { start, end });
                }
                selected.extend(start..=end);
            }
            None => {
                selected.insert(parse_index(token, last)?);
            }
        }
    }
    if selected.is_empty() {
        return Err(GtiSpecError::Empty);
    }
    Ok(selected.into_iter().collect())
}
