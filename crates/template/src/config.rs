//! Element-name tables and factory configuration.

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose body is never interpreted as markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Event types handed to the DOM as delegated listeners.
pub const DELEGATED_EVENTS: &[&str] = &[
    "beforeinput",
    "click",
    "contextmenu",
    "dblclick",
    "focusin",
    "focusout",
    "input",
    "keydown",
    "keyup",
    "mousedown",
    "mousemove",
    "mouseout",
    "mouseover",
    "mouseup",
    "pointerdown",
    "pointermove",
    "pointerout",
    "pointerover",
    "pointerup",
    "touchend",
    "touchmove",
    "touchstart",
];

/// Small set of ASCII names matched case-insensitively.
///
/// The tables are a dozen entries at most, so a linear scan beats hashing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameSet {
    names: Vec<String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: &[&str]) -> Self {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    pub fn insert(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_ascii_lowercase());
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.names.retain(|n| !n.eq_ignore_ascii_case(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct TemplateConfig {
    pub void_elements: NameSet,
    pub raw_text_elements: NameSet,
    pub delegated_events: NameSet,
    /// Fail on capitalized tags without a registered component instead of
    /// warning and rendering them as plain elements.
    pub strict_components: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            void_elements: NameSet::from_names(VOID_ELEMENTS),
            raw_text_elements: NameSet::from_names(RAW_TEXT_ELEMENTS),
            delegated_events: NameSet::from_names(DELEGATED_EVENTS),
            strict_components: true,
        }
    }
}
