//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Text content (CDATA is folded in)
    Text,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the root element)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Element name, empty for text nodes
    pub name: String,
    /// Text content, empty for elements
    pub text: String,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u16,
    /// Depth below the root element
    pub depth: u16,
}

impl XmlNode {
    /// Create a new element node
    pub fn element(name: String, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind: NodeKind::Element,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name,
            text: String::new(),
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Create a new text node
    pub fn text(text: String, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind: NodeKind::Text,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name: String::new(),
            text,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Check if this element has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.attr_count > 0
    }

    /// Attribute arena range for this node
    #[inline]
    pub fn attr_range(&self) -> std::ops::Range<usize> {
        let start = self.attr_start as usize;
        start..start + self.attr_count as usize
    }
}

/// An XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kinds() {
        let elem = XmlNode::element("token".into(), None, 0);
        assert!(elem.is_element());
        assert!(!elem.has_attributes());
        assert_eq!(elem.name, "token");

        let text = XmlNode::text("Школа".into(), Some(0), 1);
        assert!(text.is_text());
        assert_eq!(text.parent, Some(0));
    }

    #[test]
    fn test_attr_range() {
        let mut elem = XmlNode::element("l".into(), None, 0);
        elem.attr_start = 3;
        elem.attr_count = 2;
        assert_eq!(elem.attr_range(), 3..5);
    }
}
