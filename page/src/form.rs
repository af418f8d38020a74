use crate::markup::Element;

const UNSERIALIZED_INPUT_TYPES: [&str; 5] = ["button", "file", "image", "reset", "submit"];

/// Collects the successful controls of `form` in document order, the way a
/// browser builds an `application/x-www-form-urlencoded` body.
///
/// Unnamed and disabled controls are skipped, unchecked checkboxes and radios
/// are skipped, and buttons never contribute.
pub fn serialize_form(form: &Element) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for el in form.descendants() {
        let Some(name) = el.attr("name") else {
            continue;
        };
        if name.is_empty() || el.has_attr("disabled") {
            continue;
        }
        match el.tag() {
            "input" => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                if UNSERIALIZED_INPUT_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                if (kind == "checkbox" || kind == "radio") && !el.has_attr("checked") {
                    continue;
                }
                let default = if kind == "checkbox" || kind == "radio" {
                    "on"
                } else {
                    ""
                };
                let value = el.attr("value").unwrap_or(default);
                fields.push((name.to_string(), value.to_string()));
            }
            "select" => {
                if let Some(value) = selected_value(el) {
                    fields.push((name.to_string(), value));
                }
            }
            "textarea" => fields.push((name.to_string(), el.text_content())),
            _ => {}
        }
    }
    fields
}

fn option_value(option: &Element) -> String {
    option
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| option.text_content())
}

/// Value of the selected option, falling back to the first option.
pub fn selected_value(select: &Element) -> Option<String> {
    let options: Vec<&Element> = select
        .descendants()
        .into_iter()
        .filter(|el| el.tag() == "option")
        .collect();
    options
        .iter()
        .find(|option| option.has_attr("selected"))
        .or_else(|| options.first())
        .map(|option| option_value(option))
}

/// Marks the option whose value equals `value` as selected. Returns false and
/// leaves the select untouched when no option matches.
pub fn set_select_value(select: &mut Element, value: &str) -> bool {
    if !select
        .descendants()
        .into_iter()
        .any(|el| el.tag() == "option" && option_value(el) == value)
    {
        return false;
    }
    select.visit_mut(&mut |el: &mut Element| {
        if el.tag() != "option" {
            return;
        }
        if option_value(el) == value {
            el.set_attr("selected", "");
        } else {
            el.remove_attr("selected");
        }
    });
    true
}

pub fn set_checked(input: &mut Element, checked: bool) {
    if checked {
        input.set_attr("checked", "");
    } else {
        input.remove_attr("checked");
    }
}

/// Value attribute of the first named input under `root`.
pub fn field_value<'a>(root: &'a Element, name: &str) -> Option<&'a str> {
    root.find(&|el: &Element| el.tag() == "input" && el.attr("name") == Some(name))
        .and_then(|el| el.attr("value"))
}

pub fn field_mut<'a>(root: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    root.find_mut(&|el: &Element| {
        matches!(el.tag(), "input" | "select" | "textarea") && el.attr("name") == Some(name)
    })
}
