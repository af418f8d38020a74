pub mod document;
pub mod form;
pub mod layout;
pub mod markup;

pub use document::{plot_page, Document, PageError, PageSkeleton, PlotTypeField};
pub use form::{serialize_form, set_checked, set_select_value};
pub use layout::column_layout;
pub use markup::{Element, Node};
