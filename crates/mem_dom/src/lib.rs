//! Arena-backed in-memory DOM.
//!
//! `Document` is a cheap handle over a shared arena; every node ever created
//! stays in the arena, addressed by `NodeId`. Detached nodes simply have no
//! parent.
//!
//! Reflection rules:
//! - Classes and inline styles live in the `class` and `style` attributes, so
//!   serialization and `clone_deep` see one source of truth.
//! - Properties and listeners are per node and are not copied by `clone_deep`.
mod events;
mod serialize;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use template::dom::{Dom, Namespace, NodeKind};
use template::value::{Handler, Value};

pub use crate::serialize::escape_text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Attribute {
    namespace: Option<String>,
    name: String,
    value: String,
}

struct Listener {
    event: String,
    handler: Handler<NodeId>,
    delegated: bool,
}

struct ElementData {
    name: String,
    namespace: Namespace,
    attributes: Vec<Attribute>,
    properties: Vec<(String, Value<NodeId>)>,
    listeners: Vec<Listener>,
}

enum Data {
    Element(ElementData),
    Text(String),
    Comment(String),
    Fragment,
}

struct NodeData {
    data: Data,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn push(&mut self, data: Data) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            Data::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).data {
            Data::Element(element) => Some(element),
            _ => None,
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|child| *child != id);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.node(node).parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if Some(child) == reference {
            return;
        }
        if self.is_ancestor_or_self(child, parent) {
            log::warn!(target: "mem_dom", "refusing to insert {child} into its own subtree {parent}");
            return;
        }
        if matches!(self.node(child).data, Data::Fragment) {
            let moved = std::mem::take(&mut self.node_mut(child).children);
            for grandchild in moved {
                self.node_mut(grandchild).parent = None;
                self.insert(parent, grandchild, reference);
            }
            return;
        }
        self.detach(child);
        let children = &mut self.node_mut(parent).children;
        let at = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(at, child);
        self.node_mut(child).parent = Some(parent);
    }

    fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let data = match &self.node(id).data {
            Data::Element(element) => Data::Element(ElementData {
                name: element.name.clone(),
                namespace: element.namespace,
                attributes: element.attributes.clone(),
                properties: Vec::new(),
                listeners: Vec::new(),
            }),
            Data::Text(text) => Data::Text(text.clone()),
            Data::Comment(text) => Data::Comment(text.clone()),
            Data::Fragment => Data::Fragment,
        };
        let copy = self.push(data);
        let children = self.node(id).children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.node_mut(child_copy).parent = Some(copy);
            self.node_mut(copy).children.push(child_copy);
        }
        copy
    }
}

impl ElementData {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    fn set_attribute(&mut self, namespace: Option<&str>, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.value = value.to_string();
                attr.namespace = namespace.map(str::to_string);
            }
            None => self.attributes.push(Attribute {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|value| value.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn styles(&self) -> Vec<(String, String)> {
        let Some(style) = self.attribute("style") else {
            return Vec::new();
        };
        style
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}

/// Handle to an in-memory document. Clones share the same arena.
#[derive(Clone, Default)]
pub struct Document {
    arena: Rc<RefCell<Arena>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.borrow().nodes.len())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena(&self) -> Ref<'_, Arena> {
        self.arena.borrow()
    }

    fn arena_mut(&self) -> RefMut<'_, Arena> {
        self.arena.borrow_mut()
    }

    pub fn node_count(&self) -> usize {
        self.arena().nodes.len()
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena()
            .element(node)
            .and_then(|element| element.attribute(name))
            .map(str::to_string)
    }

    /// Attributes in insertion order, by qualified name.
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.arena()
            .element(node)
            .map(|element| {
                element
                    .attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn attribute_namespace(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena()
            .element(node)?
            .attributes
            .iter()
            .find(|a| a.name == name)?
            .namespace
            .clone()
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<Value<NodeId>> {
        self.arena()
            .element(node)?
            .properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.arena()
            .element(node)
            .map(ElementData::classes)
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let arena = self.arena();
        let styles = arena.element(node)?.styles();
        styles
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        self.arena().element(node).map(|element| element.namespace)
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.arena().element(node).map_or(0, |element| {
            element
                .listeners
                .iter()
                .filter(|l| l.event == event)
                .count()
        })
    }

    pub fn is_delegated(&self, node: NodeId, event: &str) -> bool {
        self.arena().element(node).is_some_and(|element| {
            element
                .listeners
                .iter()
                .any(|l| l.event == event && l.delegated)
        })
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let arena = self.arena();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let data = arena.node(id);
            if let Data::Text(text) = &data.data {
                out.push_str(text);
            }
            stack.extend(data.children.iter().rev());
        }
        out
    }

    /// Finds the first element named `name` at or below `node`, in document order.
    pub fn find_element(&self, node: NodeId, name: &str) -> Option<NodeId> {
        let arena = self.arena();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if arena.element(id).is_some_and(|element| element.name == name) {
                return Some(id);
            }
            stack.extend(arena.node(id).children.iter().rev());
        }
        None
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn create_element(&self, name: &str, namespace: Namespace) -> NodeId {
        self.arena_mut().push(Data::Element(ElementData {
            name: name.to_string(),
            namespace,
            attributes: Vec::new(),
            properties: Vec::new(),
            listeners: Vec::new(),
        }))
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.arena_mut().push(Data::Text(text.to_string()))
    }

    fn create_comment(&self, text: &str) -> NodeId {
        self.arena_mut().push(Data::Comment(text.to_string()))
    }

    fn create_fragment(&self) -> NodeId {
        self.arena_mut().push(Data::Fragment)
    }

    fn clone_deep(&self, node: &NodeId) -> NodeId {
        self.arena_mut().clone_subtree(*node)
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.arena().node(*node).data {
            Data::Element(_) => NodeKind::Element,
            Data::Text(_) => NodeKind::Text,
            Data::Comment(_) => NodeKind::Comment,
            Data::Fragment => NodeKind::Fragment,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.arena()
            .element(*node)
            .map(|element| element.name.clone())
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.arena().node(*node).parent
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.arena().node(*node).children.first().copied()
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let arena = self.arena();
        let parent = arena.node(*node).parent?;
        let siblings = &arena.node(parent).children;
        let at = siblings.iter().position(|c| c == node)?;
        siblings.get(at + 1).copied()
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.arena_mut().insert(*parent, *child, None);
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        self.arena_mut()
            .insert(*parent, *child, reference.copied());
    }

    fn remove(&self, node: &NodeId) {
        self.arena_mut().detach(*node);
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        match &mut self.arena_mut().node_mut(*node).data {
            Data::Text(value) | Data::Comment(value) => *value = text.to_string(),
            _ => log::warn!(target: "mem_dom", "set_text on non-text node {node}"),
        }
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        if let Some(element) = self.arena_mut().element_mut(*node) {
            element.set_attribute(None, name, value);
        }
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        if let Some(element) = self.arena_mut().element_mut(*node) {
            element.remove_attribute(name);
        }
    }

    fn set_attribute_ns(&self, node: &NodeId, namespace: &str, name: &str, value: Option<&str>) {
        if let Some(element) = self.arena_mut().element_mut(*node) {
            match value {
                Some(value) => element.set_attribute(Some(namespace), name, value),
                None => element.remove_attribute(name),
            }
        }
    }

    fn set_property(&self, node: &NodeId, name: &str, value: Value<NodeId>) {
        let mut arena = self.arena_mut();
        let Some(element) = arena.element_mut(*node) else {
            return;
        };
        match element.properties.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => element.properties.push((name.to_string(), value)),
        }
    }

    fn add_event_listener(&self, node: &NodeId, event: &str, handler: Handler<NodeId>, delegated: bool) {
        if let Some(element) = self.arena_mut().element_mut(*node) {
            element.listeners.push(Listener {
                event: event.to_string(),
                handler,
                delegated,
            });
        }
    }

    fn toggle_class(&self, node: &NodeId, class: &str, on: bool) {
        let mut arena = self.arena_mut();
        let Some(element) = arena.element_mut(*node) else {
            return;
        };
        let mut classes = element.classes();
        let present = classes.iter().any(|c| c == class);
        if on == present {
            return;
        }
        if on {
            classes.push(class.to_string());
        } else {
            classes.retain(|c| c != class);
        }
        element.set_attribute(None, "class", &classes.join(" "));
    }

    fn set_style(&self, node: &NodeId, property: &str, value: Option<&str>) {
        let mut arena = self.arena_mut();
        let Some(element) = arena.element_mut(*node) else {
            return;
        };
        let mut styles = element.styles();
        styles.retain(|(name, _)| name != property);
        if let Some(value) = value {
            styles.push((property.to_string(), value.to_string()));
        }
        if styles.is_empty() {
            element.remove_attribute("style");
            return;
        }
        let css = styles
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        element.set_attribute(None, "style", &css);
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, NodeId};
    use template::dom::{Dom, Namespace, NodeKind};
    use template::value::{Event, Value};

    fn div(doc: &Document) -> NodeId {
        doc.create_element("div", Namespace::Html)
    }

    #[test]
    fn insert_before_moves_nodes_and_unpacks_fragments() {
        let doc = Document::new();
        let parent = div(&doc);
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(&parent, &a);

        let fragment = doc.create_fragment();
        doc.append_child(&fragment, &b);
        doc.insert_before(&parent, &fragment, Some(&a));

        assert_eq!(doc.children(&parent), vec![b, a]);
        assert!(doc.first_child(&fragment).is_none());
        assert_eq!(doc.parent(&b), Some(parent));

        let other = div(&doc);
        doc.append_child(&other, &a);
        assert_eq!(doc.children(&parent), vec![b]);
    }

    #[test]
    fn clone_deep_copies_structure_but_not_properties_or_listeners() {
        let doc = Document::new();
        let root = div(&doc);
        doc.set_attribute(&root, "id", "x");
        doc.set_property(&root, "value", Value::from("v"));
        doc.add_event_listener(&root, "click", std::rc::Rc::new(|_: &Event<NodeId>| {}), false);
        let child = doc.create_comment("");
        doc.append_child(&root, &child);

        let copy = doc.clone_deep(&root);
        assert_ne!(copy, root);
        assert_eq!(doc.attribute(copy, "id").as_deref(), Some("x"));
        assert!(doc.property(copy, "value").is_none());
        assert_eq!(doc.listener_count(copy, "click"), 0);
        let copied_child = doc.first_child(&copy);
        assert!(copied_child.is_some_and(|c| c != child));
        assert_eq!(copied_child.map(|c| doc.kind(&c)), Some(NodeKind::Comment));
    }

    #[test]
    fn classes_and_styles_reflect_into_attributes() {
        let doc = Document::new();
        let node = div(&doc);
        doc.set_attribute(&node, "class", "a");
        doc.toggle_class(&node, "b", true);
        doc.toggle_class(&node, "a", false);
        assert_eq!(doc.attribute(node, "class").as_deref(), Some("b"));

        doc.set_style(&node, "color", Some("red"));
        doc.set_style(&node, "width", Some("2px"));
        assert_eq!(doc.attribute(node, "style").as_deref(), Some("color: red; width: 2px"));
        doc.set_style(&node, "color", None);
        assert_eq!(doc.style(node, "width").as_deref(), Some("2px"));
        doc.set_style(&node, "width", None);
        assert!(doc.attribute(node, "style").is_none());
    }

    #[test]
    fn refuses_cycles() {
        let doc = Document::new();
        let outer = div(&doc);
        let inner = div(&doc);
        doc.append_child(&outer, &inner);
        doc.append_child(&inner, &outer);
        assert_eq!(doc.parent(&outer), None);
    }
}
