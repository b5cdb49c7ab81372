//! Registry of components addressed by capitalized tag names.
use crate::types::Element;
use crate::value::{Component, Props, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub struct ComponentRegistry<N> {
    components: HashMap<String, Component<N>>,
}

impl<N> Default for ComponentRegistry<N> {
    fn default() -> Self {
        Self {
            components: HashMap::new(),
        }
    }
}

impl<N> ComponentRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component` under the exact tag name. Re-registering replaces.
    pub fn register(&mut self, name: &str, component: impl Fn(Props<N>) -> Value<N> + 'static) {
        self.components.insert(name.to_string(), Rc::new(component));
    }

    pub fn get(&self, name: &str) -> Option<&Component<N>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Component an element renders through, if any. Only slotted
    /// (capitalized) elements are looked up.
    pub fn component_for(&self, element: &Element) -> Option<&Component<N>> {
        element.slot.and_then(|_| self.get(&element.name))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<N> fmt::Debug for ComponentRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .finish()
    }
}
