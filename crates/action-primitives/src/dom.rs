//! Parsed view of a [`MemoryPage`](crate::MemoryPage) document
//!
//! Markup is parsed with `scraper` and CSS anchors go through its selector
//! engine. Element handles are positions in document order; they stay stable
//! because the source never changes, only the visibility overrides and input
//! values layered on top of it. ARIA roles, accessible names and visibility
//! are computed here.

use std::collections::{HashMap, HashSet};

use scraper::{node::Node, ElementRef, Html, Selector};

use crate::{
    matching::{normalize_whitespace, MatchMode, TextMatcher},
    types::{AnchorDescriptor, ContainerPattern, NodeId, SearchScope},
};

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "checkbox",
    "radio",
    "switch",
    "textbox",
    "searchbox",
    "combobox",
    "listbox",
    "option",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "tab",
    "slider",
    "spinbutton",
];

/// Elements whose text is never rendered.
const SILENT_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Document source plus the state changed at runtime.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    source: String,
    hidden: HashSet<NodeId>,
    values: HashMap<NodeId, String>,
}

impl Dom {
    pub fn parse(markup: &str) -> Self {
        Self {
            source: markup.to_string(),
            ..Self::default()
        }
    }

    /// Run `read` against a freshly parsed tree.
    ///
    /// `scraper` trees are neither `Send` nor `Sync`, so a parsed tree never
    /// outlives the call that built it.
    pub fn view<R>(&self, read: impl FnOnce(&Document<'_>) -> R) -> R {
        let html = Html::parse_document(&self.source);
        read(&Document::new(&html, self))
    }

    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if hidden {
            self.hidden.insert(node);
        } else {
            self.hidden.remove(&node);
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.values.insert(node, value.to_string());
    }
}

/// One parse of a [`Dom`]. Unknown handles answer `None`, `false` or empty.
pub struct Document<'a> {
    html: &'a Html,
    state: &'a Dom,
    elements: Vec<ElementRef<'a>>,
}

impl<'a> Document<'a> {
    fn new(html: &'a Html, state: &'a Dom) -> Self {
        let elements = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        Self {
            html,
            state,
            elements,
        }
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'a>> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.elements.get(idx).copied())
    }

    fn handle(&self, element: ElementRef<'a>) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|known| *known == element)
            .map(|idx| NodeId(idx as u64))
    }

    fn handles(&self, elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<NodeId> {
        elements.filter_map(|element| self.handle(element)).collect()
    }

    fn all(&self) -> Vec<NodeId> {
        (0..self.elements.len()).map(|idx| NodeId(idx as u64)).collect()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&'a str> {
        self.element(id).map(|element| element.value().name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&'a str> {
        self.element(id)?.value().attr(name)
    }

    pub fn element_by_id(&self, wanted: &str) -> Option<NodeId> {
        self.all()
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(wanted))
    }

    /// Strict ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        match self.element(id) {
            Some(element) => self.handles(element.ancestors().filter_map(ElementRef::wrap)),
            None => Vec::new(),
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.element(id) {
            Some(element) => self.handles(element.children().filter_map(ElementRef::wrap)),
            None => Vec::new(),
        }
    }

    /// Descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        match self.element(id) {
            Some(element) => {
                self.handles(element.descendants().skip(1).filter_map(ElementRef::wrap))
            }
            None => Vec::new(),
        }
    }

    /// Whitespace-normalised rendered text.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return String::new();
        };
        if SILENT_TAGS.contains(&element.value().name()) {
            return String::new();
        }
        let mut raw = String::new();
        for node in element.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let silent = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|ancestor| *ancestor != element)
                .any(|ancestor| SILENT_TAGS.contains(&ancestor.value().name()));
            if !silent {
                raw.push(' ');
                raw.push_str(text);
            }
        }
        normalize_whitespace(&raw)
    }

    /// Rendered: neither the node nor any ancestor is hidden.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.contains(id)
            && std::iter::once(id)
                .chain(self.ancestors(id))
                .all(|node| !self.hides_itself(node))
    }

    fn hides_itself(&self, id: NodeId) -> bool {
        if self.state.hidden.contains(&id) || self.attr(id, "hidden").is_some() {
            return true;
        }
        if self.tag(id) == Some("input") && self.input_type(id) == "hidden" {
            return true;
        }
        self.attr(id, "style")
            .map(|style| {
                let compact: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                compact.contains("display:none") || compact.contains("visibility:hidden")
            })
            .unwrap_or(false)
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.attr(id, "disabled").is_some()
            || self
                .attr(id, "aria-disabled")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
    }

    fn input_type(&self, id: NodeId) -> String {
        self.attr(id, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    }

    /// Explicit `role` attribute, otherwise the implicit ARIA role of the tag.
    pub fn role(&self, id: NodeId) -> Option<String> {
        if let Some(first) = self
            .attr(id, "role")
            .and_then(|role| role.split_whitespace().next())
        {
            return Some(first.to_ascii_lowercase());
        }
        let implicit = match self.tag(id)? {
            "button" => "button",
            "a" | "area" if self.attr(id, "href").is_some() => "link",
            "input" => match self.input_type(id).as_str() {
                "button" | "submit" | "reset" | "image" => "button",
                "checkbox" => "checkbox",
                "radio" => "radio",
                "range" => "slider",
                "number" => "spinbutton",
                "search" => "searchbox",
                "hidden" => return None,
                _ => "textbox",
            },
            "textarea" => "textbox",
            "select" if self.attr(id, "multiple").is_some() => "listbox",
            "select" => "combobox",
            "option" => "option",
            "table" => "table",
            "tr" => "row",
            "td" => "cell",
            "th" => "columnheader",
            "form" => "form",
            "dialog" => "dialog",
            "nav" => "navigation",
            "ul" | "ol" => "list",
            "li" => "listitem",
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
            _ => return None,
        };
        Some(implicit.to_string())
    }

    pub fn is_interactive(&self, id: NodeId) -> bool {
        self.role(id)
            .map(|role| INTERACTIVE_ROLES.contains(&role.as_str()))
            .unwrap_or(false)
    }

    pub fn is_editable(&self, id: NodeId) -> bool {
        if self
            .attr(id, "contenteditable")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false)
        {
            return true;
        }
        match self.tag(id) {
            Some("textarea") => true,
            Some("input") => !matches!(
                self.input_type(id).as_str(),
                "button"
                    | "submit"
                    | "reset"
                    | "image"
                    | "checkbox"
                    | "radio"
                    | "hidden"
                    | "file"
                    | "range"
                    | "color"
            ),
            _ => false,
        }
    }

    /// Accessible name, following a reduced version of the accname rules.
    pub fn accessible_name(&self, id: NodeId) -> String {
        if let Some(label) = self.attr(id, "aria-label").map(normalize_whitespace) {
            if !label.is_empty() {
                return label;
            }
        }
        if let Some(ids) = self.attr(id, "aria-labelledby") {
            let joined = ids
                .split_whitespace()
                .filter_map(|ref_id| self.element_by_id(ref_id))
                .map(|node| self.text_content(node))
                .collect::<Vec<_>>()
                .join(" ");
            let joined = normalize_whitespace(&joined);
            if !joined.is_empty() {
                return joined;
            }
        }
        let tag = self.tag(id).unwrap_or_default();
        if matches!(tag, "input" | "select" | "textarea") {
            if tag == "input"
                && matches!(self.input_type(id).as_str(), "button" | "submit" | "reset")
            {
                if let Some(value) = self.attr(id, "value") {
                    return normalize_whitespace(value);
                }
            }
            if let Some(label) = self.associated_label(id) {
                return label;
            }
            if let Some(placeholder) = self.attr(id, "placeholder") {
                return normalize_whitespace(placeholder);
            }
        } else {
            let text = self.text_content(id);
            if !text.is_empty() {
                return text;
            }
        }
        self.attr(id, "title")
            .map(normalize_whitespace)
            .unwrap_or_default()
    }

    fn associated_label(&self, id: NodeId) -> Option<String> {
        if let Some(own_id) = self.attr(id, "id") {
            let label = self.all().into_iter().find(|node| {
                self.tag(*node) == Some("label") && self.attr(*node, "for") == Some(own_id)
            });
            if let Some(label) = label {
                return Some(self.text_content(label));
            }
        }
        self.ancestors(id)
            .into_iter()
            .find(|node| self.tag(*node) == Some("label"))
            .map(|label| self.text_content(label))
    }

    fn scope_nodes(&self, scope: &SearchScope) -> Vec<NodeId> {
        match scope {
            SearchScope::Document => self.all(),
            SearchScope::Within(container) => self.descendants(*container),
        }
    }

    /// First rendered element in scope with one of `roles` and a matching name.
    ///
    /// Hidden elements are not part of the accessibility tree and are skipped.
    pub fn find_by_role(
        &self,
        scope: &SearchScope,
        roles: &[String],
        name: &TextMatcher,
    ) -> Option<NodeId> {
        self.scope_nodes(scope).into_iter().find(|node| {
            let role_ok = self
                .role(*node)
                .map(|role| roles.iter().any(|r| r.eq_ignore_ascii_case(&role)))
                .unwrap_or(false);
            role_ok && self.is_visible(*node) && name.matches(&self.accessible_name(*node))
        })
    }

    /// First element in scope whose text matches and none of whose element
    /// children match on their own.
    pub fn find_by_text(&self, scope: &SearchScope, text: &TextMatcher) -> Option<NodeId> {
        self.scope_nodes(scope).into_iter().find(|node| {
            if self
                .tag(*node)
                .map(|tag| SILENT_TAGS.contains(&tag))
                .unwrap_or(true)
            {
                return false;
            }
            text.matches(&self.text_content(*node))
                && !self
                    .children(*node)
                    .into_iter()
                    .any(|child| text.matches(&self.text_content(child)))
        })
    }

    /// Nearest ancestor matching `pattern`. The climb never leaves `scope`;
    /// a scope container may itself be the match.
    pub fn closest_ancestor(
        &self,
        id: NodeId,
        pattern: &ContainerPattern,
        scope: &SearchScope,
    ) -> Option<NodeId> {
        let boundary = match scope {
            SearchScope::Document => None,
            SearchScope::Within(container) => Some(*container),
        };
        for ancestor in self.ancestors(id) {
            let tag = self.tag(ancestor).unwrap_or_default();
            if pattern.matches(tag, self.attr(ancestor, "class")) {
                return Some(ancestor);
            }
            if Some(ancestor) == boundary {
                break;
            }
        }
        None
    }

    pub fn first_interactive_within(&self, container: NodeId) -> Option<NodeId> {
        self.descendants(container)
            .into_iter()
            .find(|node| self.is_interactive(*node))
    }

    /// First element matching a CSS selector; `None` when it does not parse.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector).ok()?;
        let first = self.html.select(&selector).next()?;
        self.handle(first)
    }

    /// Resolve any anchor against the current tree.
    pub fn resolve(&self, anchor: &AnchorDescriptor) -> Option<NodeId> {
        match anchor {
            AnchorDescriptor::Css(selector) => self.query_selector(selector),
            AnchorDescriptor::Aria { role, name } => self.find_by_role(
                &SearchScope::Document,
                std::slice::from_ref(role),
                &TextMatcher::substring(name),
            ),
            AnchorDescriptor::Text { content, exact } => {
                let matcher = if *exact {
                    TextMatcher::new(content, MatchMode::Exact)
                        .unwrap_or_else(|_| TextMatcher::substring(content))
                } else {
                    TextMatcher::substring(content)
                };
                self.find_by_text(&SearchScope::Document, &matcher)
            }
            AnchorDescriptor::Node(id) => self.contains(*id).then_some(*id),
        }
    }

    /// Current value of a form control: what was filled, else the markup's.
    pub fn value(&self, id: NodeId) -> Option<String> {
        if let Some(value) = self.state.values.get(&id) {
            return Some(value.clone());
        }
        match self.tag(id) {
            Some("input") => self.attr(id, "value").map(str::to_string),
            _ => None,
        }
    }
}
