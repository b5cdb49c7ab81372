//! The DOM surface the renderer drives.
//!
//! Implementations are cheap handles: every method takes `&self`, and node
//! values are identities that can be cloned and compared. Inserting a node
//! that already has a parent moves it; inserting a fragment moves the
//! fragment's children.
use crate::value::{Handler, Value};
use std::fmt;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

pub trait Dom: 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn create_element(&self, name: &str, namespace: Namespace) -> Self::Node;
    fn create_text(&self, text: &str) -> Self::Node;
    fn create_comment(&self, text: &str) -> Self::Node;
    fn create_fragment(&self) -> Self::Node;

    /// Deep copy of structure, attributes, classes and styles. Properties and
    /// listeners are not copied.
    fn clone_deep(&self, node: &Self::Node) -> Self::Node;

    fn kind(&self, node: &Self::Node) -> NodeKind;
    fn tag_name(&self, node: &Self::Node) -> Option<String>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Inserts `child` before `reference`, or appends when `reference` is `None`.
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
    /// Detaches `node` from its parent. No-op for detached nodes.
    fn remove(&self, node: &Self::Node);
    fn set_text(&self, node: &Self::Node, text: &str);

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);
    /// `value == None` removes the attribute.
    fn set_attribute_ns(&self, node: &Self::Node, namespace: &str, name: &str, value: Option<&str>);
    fn set_property(&self, node: &Self::Node, name: &str, value: Value<Self::Node>);
    /// `delegated` asks the implementation to route the event through a
    /// document-level listener instead of one per node.
    fn add_event_listener(
        &self,
        node: &Self::Node,
        event: &str,
        handler: Handler<Self::Node>,
        delegated: bool,
    );
    fn toggle_class(&self, node: &Self::Node, class: &str, on: bool);
    /// `value == None` removes the declaration.
    fn set_style(&self, node: &Self::Node, property: &str, value: Option<&str>);

    /// Direct children in order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut next = self.first_child(node);
        while let Some(child) = next {
            next = self.next_sibling(&child);
            out.push(child);
        }
        out
    }
}
