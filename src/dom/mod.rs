//! DOM Module - Arena-based XML tree
//!
//! Every document, sentence and token view in the corpus layer walks one of these:
//! - Arena allocation for nodes and attributes
//! - NodeId (u32) indices for cache-friendly traversal
//! - Pre-order descendant iteration without recursion

pub mod document;
pub mod node;

pub use document::{Children, Descendants, XmlTree};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
