use crate::markup::Element;

/// Spreads `elements` over a responsive row, one column per element, in
/// input order.
pub fn column_layout<I>(elements: I) -> Element
where
    I: IntoIterator<Item = Element>,
{
    elements
        .into_iter()
        .fold(Element::new("div").with_class("row"), |row, element| {
            row.with_child(Element::new("div").with_class("column").with_child(element))
        })
}
