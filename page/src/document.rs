use crate::layout::column_layout;
use crate::markup::Element;
use std::fs;
use std::path::Path;

pub const PLOT_FORM_ID: &str = "plot-graph";
pub const OBSERVATION_SEARCH_ID: &str = "observation-search";
pub const OBSERVATION_OPTIONS_ID: &str = "observation-options";
pub const QUALITY_SELECT_ID: &str = "quality-select";
pub const QUALITY_BUTTON_CLASS: &str = "change-quality";
pub const OBSERVATION_INFO_ID: &str = "observation-info";
pub const NOTICES_ID: &str = "notices";
pub const PLOTS_ID: &str = "plots";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("page has no element with id '{0}'")]
    MissingElement(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotTypeField {
    pub label: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct PageSkeleton {
    pub title: String,
    pub csrf_token: String,
    pub quality_levels: Vec<String>,
    pub plot_types: Vec<PlotTypeField>,
}

/// The live page a session mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.root.find_by_id(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_by_id_mut(id)
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut Element, PageError> {
        self.root
            .find_by_id_mut(id)
            .ok_or_else(|| PageError::MissingElement(id.to_string()))
    }

    pub fn to_html(&self) -> String {
        format!("<!DOCTYPE html>\n{}\n", self.root.to_html())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_html())?;
        log::debug!("page written to {}", path.display());
        Ok(())
    }
}

fn search_dropdown() -> Element {
    Element::new("div")
        .with_class("dropdown")
        .with_child(
            Element::new("input")
                .with_id(OBSERVATION_SEARCH_ID)
                .with_class("dropdown-field")
                .with_attr("name", "obs_id")
                .with_attr("type", "text")
                .with_attr("placeholder", "Observation ID")
                .with_attr("autocomplete", "off"),
        )
        .with_child(
            Element::new("div")
                .with_id(OBSERVATION_OPTIONS_ID)
                .with_class("dropdown-content"),
        )
}

fn quality_controls(levels: &[String]) -> Element {
    let buttons = levels.iter().map(|level| {
        Element::new("button")
            .with_class(QUALITY_BUTTON_CLASS)
            .with_attr("type", "button")
            .with_text(level)
    });
    let select = Element::new("select")
        .with_id(QUALITY_SELECT_ID)
        .with_attr("name", "quality")
        .with_children(levels.iter().map(|level| {
            Element::new("option")
                .with_attr("value", level)
                .with_text(level)
        }));
    Element::new("div")
        .with_class("quality")
        .with_children(buttons)
        .with_child(select)
}

fn plot_type_checkboxes(plot_types: &[PlotTypeField]) -> Element {
    column_layout(plot_types.iter().map(|plot_type| {
        Element::new("label")
            .with_child(
                Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("name", &plot_type.name)
                    .with_attr("value", &plot_type.value),
            )
            .with_text(&format!(" {}", plot_type.label))
    }))
}

/// Builds the interactive plot page: search form, info table, notices and
/// the (initially empty) plot panel.
pub fn plot_page(skeleton: &PageSkeleton) -> Document {
    let form = Element::new("form")
        .with_id(PLOT_FORM_ID)
        .with_attr("method", "post")
        .with_child(
            Element::new("input")
                .with_attr("type", "hidden")
                .with_attr("name", CSRF_FIELD)
                .with_attr("value", &skeleton.csrf_token),
        )
        .with_child(column_layout([
            search_dropdown(),
            quality_controls(&skeleton.quality_levels),
        ]))
        .with_child(plot_type_checkboxes(&skeleton.plot_types))
        .with_child(
            Element::new("button")
                .with_attr("type", "submit")
                .with_text("Plot"),
        );

    let head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"))
        .with_child(Element::new("title").with_text(&skeleton.title));
    let body = Element::new("body")
        .with_child(form)
        .with_child(Element::new("div").with_id(OBSERVATION_INFO_ID))
        .with_child(Element::new("div").with_id(NOTICES_ID))
        .with_child(Element::new("div").with_id(PLOTS_ID));

    Document::new(
        Element::new("html")
            .with_attr("lang", "en")
            .with_child(head)
            .with_child(body),
    )
}
