/// Elements rendered without a closing tag.
const VOID_TAGS: [&str; 6] = ["br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Markup inserted verbatim. Server-rendered plot fragments live here and
    /// are never parsed, so ids inside them are invisible to queries.
    Raw(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attr("id", id)
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn with_raw(mut self, markup: &str) -> Self {
        self.children.push(Node::Raw(markup.to_string()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr("class", &joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", &joined);
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Concatenated text of all descendant text nodes. Raw markup is skipped.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(el) => el.collect_text(out),
                Node::Text(text) => out.push_str(text),
                Node::Raw(_) => {}
            }
        }
    }

    /// Pre-order list of descendant elements, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for el in self.child_elements() {
            out.push(el);
            el.collect_descendants(out);
        }
    }

    /// Calls `f` on every descendant element in document order.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                f(el);
                el.visit_mut(f);
            }
        }
    }

    /// First element in document order (including `self`) matching `predicate`.
    pub fn find<F>(&self, predicate: &F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        self.child_elements().find_map(|el| el.find(predicate))
    }

    pub fn find_mut<F>(&mut self, predicate: &F) -> Option<&mut Element>
    where
        F: Fn(&Element) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                if let Some(found) = el.find_mut(predicate) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|el: &Element| el.id() == Some(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(&|el: &Element| el.id() == Some(id))
    }

    pub fn find_first_by_class(&self, class: &str) -> Option<&Element> {
        self.child_elements()
            .find_map(|el| el.find(&|e: &Element| e.has_class(class)))
    }

    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| el.has_class(class))
            .collect()
    }

    pub fn count_by_id(&self, id: &str) -> usize {
        let own = usize::from(self.id() == Some(id));
        own + self
            .descendants()
            .into_iter()
            .filter(|el| el.id() == Some(id))
            .count()
    }

    /// Replaces the first descendant carrying `id` with `replacement`.
    pub fn replace_by_id(&mut self, id: &str, replacement: Element) -> bool {
        let mut replacement = Some(replacement);
        self.replace_inner(id, &mut replacement)
    }

    fn replace_inner(&mut self, id: &str, replacement: &mut Option<Element>) -> bool {
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                if el.id() == Some(id) {
                    return match replacement.take() {
                        Some(new) => {
                            *el = new;
                            true
                        }
                        None => false,
                    };
                }
                if el.replace_inner(id, replacement) {
                    return true;
                }
            }
        }
        false
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_html(out),
                Node::Text(text) => out.push_str(&escape_text(text)),
                Node::Raw(markup) => out.push_str(markup),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
