//! XML Tree - Arena-based DOM for one captured element
//!
//! Owned storage with:
//! - Arena allocation for nodes
//! - A flat attribute arena indexed by (start, count)
//! - NodeId indices for traversal
//!
//! Parsing is lenient: unclosed elements are closed at end of input and
//! stray end tags are ignored. Comments, PIs and DOCTYPE are dropped.

use super::node::{NodeId, XmlAttribute, XmlNode};
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use std::borrow::Cow;

/// An owned XML tree stored in arena format
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Arena of attributes
    attributes: Vec<XmlAttribute>,
    /// Root element node ID
    root_element: Option<NodeId>,
}

impl XmlTree {
    /// Parse an XML fragment into a tree
    ///
    /// The first top-level element becomes the root; anything after it is ignored.
    pub fn parse(input: &str) -> Self {
        let mut tree = XmlTree {
            nodes: Vec::with_capacity(input.len() / 32),
            attributes: Vec::new(),
            root_element: None,
        };

        let mut stack: Vec<NodeId> = Vec::with_capacity(16);
        let mut reader = SliceReader::new(input.as_bytes());

        while let Some(event) = reader.next_event() {
            match event {
                XmlEvent::StartElement(elem) => {
                    if tree.root_element.is_some() && stack.is_empty() {
                        break;
                    }
                    let id = tree.add_element(&elem, stack.last().copied());
                    stack.push(id);
                }
                XmlEvent::EmptyElement(elem) => {
                    if tree.root_element.is_some() && stack.is_empty() {
                        break;
                    }
                    tree.add_element(&elem, stack.last().copied());
                }
                XmlEvent::EndElement(elem) => {
                    let name = String::from_utf8_lossy(elem.name);
                    if let Some(depth) = stack.iter().rposition(|&id| tree.nodes[id as usize].name == name) {
                        stack.truncate(depth);
                    }
                }
                XmlEvent::Text(content) | XmlEvent::CData(content) => {
                    if let Some(&parent) = stack.last() {
                        tree.add_text(content, parent);
                    }
                }
                XmlEvent::EndDocument => break,
                _ => {}
            }
        }

        tree
    }

    fn add_element(&mut self, elem: &StartElement<'_>, parent: Option<NodeId>) -> NodeId {
        let depth = parent
            .and_then(|p| self.nodes.get(p as usize))
            .map(|p| p.depth.saturating_add(1))
            .unwrap_or(0);

        let mut node = XmlNode::element(String::from_utf8_lossy(elem.name).into_owned(), parent, depth);
        node.attr_start = self.attributes.len() as u32;
        for attr in elem.attributes.iter().take(u16::MAX as usize) {
            self.attributes.push(XmlAttribute::new(
                String::from_utf8_lossy(&attr.name),
                String::from_utf8_lossy(&attr.value),
            ));
            node.attr_count += 1;
        }

        let id = self.push_node(node);
        if parent.is_none() && self.root_element.is_none() {
            self.root_element = Some(id);
        }
        id
    }

    fn add_text(&mut self, content: Cow<'_, [u8]>, parent: NodeId) {
        let text = String::from_utf8_lossy(&content);

        // Merge with a preceding text sibling (text split around CDATA or stray '<')
        if let Some(last) = self.nodes[parent as usize].last_child {
            let last = &mut self.nodes[last as usize];
            if last.is_text() {
                last.text.push_str(&text);
                return;
            }
        }

        let depth = self.nodes[parent as usize].depth.saturating_add(1);
        self.push_node(XmlNode::text(text.into_owned(), Some(parent), depth));
    }

    fn push_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let parent = node.parent;
        self.nodes.push(node);

        if let Some(parent_id) = parent {
            let prev_last = self.nodes[parent_id as usize].last_child;
            if let Some(prev) = prev_last {
                self.nodes[prev as usize].next_sibling = Some(id);
            } else {
                self.nodes[parent_id as usize].first_child = Some(id);
            }
            self.nodes[parent_id as usize].last_child = Some(id);
        }
        id
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get element name
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.get_node(id).filter(|n| n.is_element()).map(|n| n.name.as_str())
    }

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) => &self.attributes[node.attr_range()],
            None => &[],
        }
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get_node(id).and_then(|n| n.first_child),
        }
    }

    /// Iterate over all descendants in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.get_node(id).and_then(|n| n.first_child),
        }
    }

    /// Direct child elements with the given name
    pub fn find_children<'t>(&'t self, id: NodeId, name: &'t str) -> impl Iterator<Item = NodeId> + 't {
        self.children(id).filter(move |&c| self.node_name(c) == Some(name))
    }

    /// Descendant elements with the given name, in document order
    pub fn find_descendants<'t>(&'t self, id: NodeId, name: &'t str) -> impl Iterator<Item = NodeId> + 't {
        self.descendants(id).filter(move |&c| self.node_name(c) == Some(name))
    }

    /// First direct child element with the given name
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.find_children(id, name).next()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get_node(id) {
            Some(node) if node.is_text() => node.text.clone(),
            Some(_) => self
                .descendants(id)
                .filter_map(|d| self.get_node(d))
                .filter(|n| n.is_text())
                .map(|n| n.text.as_str())
                .collect(),
            None => String::new(),
        }
    }
}

/// Iterator over the children of a node
pub struct Children<'t> {
    tree: &'t XmlTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node
pub struct Descendants<'t> {
    tree: &'t XmlTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let node = self.tree.get_node(current)?;

        self.next = if let Some(child) = node.first_child {
            Some(child)
        } else {
            // Climb until a sibling exists, stopping at the subtree root
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break None;
                }
                let n = self.tree.get_node(cursor)?;
                if let Some(sibling) = n.next_sibling {
                    break Some(sibling);
                }
                match n.parent {
                    Some(parent) if parent != self.root => cursor = parent,
                    _ => break None,
                }
            }
        };

        Some(current)
    }
}
