//! Core types shared by the locator capability and its callers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned handle for one element of the current document.
///
/// Handles are only meaningful against the document snapshot that produced
/// them; they are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element anchor descriptor
///
/// The caller's primary reference is usually a `Css` anchor; anchors produced
/// by recovery are `Node` handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorDescriptor {
    /// CSS selector
    Css(String),

    /// ARIA role and accessible name
    Aria { role: String, name: String },

    /// Text content (exact or partial match)
    Text { content: String, exact: bool },

    /// Concrete element discovered at runtime
    Node(NodeId),
}

impl AnchorDescriptor {
    pub fn css(selector: impl Into<String>) -> Self {
        AnchorDescriptor::Css(selector.into())
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            AnchorDescriptor::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for AnchorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorDescriptor::Css(s) => write!(f, "css:{}", s),
            AnchorDescriptor::Aria { role, name } => write!(f, "aria:{}[name='{}']", role, name),
            AnchorDescriptor::Text { content, exact } => {
                if *exact {
                    write!(f, "text:exact:'{}'", content)
                } else {
                    write!(f, "text:partial:'{}'", content)
                }
            }
            AnchorDescriptor::Node(id) => write!(f, "node:{}", id),
        }
    }
}

/// Structural boundary inside which discovery searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchScope {
    /// The whole document
    #[default]
    Document,

    /// Descendants of one container element
    Within(NodeId),
}

/// Pattern describing a "row / section / record" container.
///
/// An element matches when its tag is one of `tags` or its `class`
/// attribute contains one of `classes` as a substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerPattern {
    pub classes: Vec<String>,
    pub tags: Vec<String>,
}

impl ContainerPattern {
    pub fn matches(&self, tag: &str, class_attr: Option<&str>) -> bool {
        if self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return true;
        }
        match class_attr {
            Some(classes) => self
                .classes
                .iter()
                .any(|needle| !needle.is_empty() && classes.contains(needle.as_str())),
            None => false,
        }
    }
}

impl Default for ContainerPattern {
    fn default() -> Self {
        Self {
            classes: vec!["row".into(), "section".into(), "record".into()],
            tags: vec!["tr".into()],
        }
    }
}

impl fmt::Display for ContainerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .tags
            .iter()
            .cloned()
            .chain(self.classes.iter().map(|c| format!(".{}", c)))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_display() {
        assert_eq!(AnchorDescriptor::css("#submit").to_string(), "css:#submit");
        assert_eq!(
            AnchorDescriptor::Aria {
                role: "button".into(),
                name: "Submit".into()
            }
            .to_string(),
            "aria:button[name='Submit']"
        );
        assert_eq!(AnchorDescriptor::Node(NodeId(7)).to_string(), "node:#7");
    }

    #[test]
    fn container_pattern_matches_tags_and_classes() {
        let pattern = ContainerPattern::default();
        assert!(pattern.matches("TR", None));
        assert!(pattern.matches("div", Some("form-row mt-2")));
        assert!(pattern.matches("div", Some("record-card")));
        assert!(!pattern.matches("td", None));
        assert!(!pattern.matches("div", Some("card")));
    }
}
