//! Values interpolated into templates and the props handed to components.
//!
//! `Value` is the dynamic currency of the renderer. Readers (`Value::Reactive`)
//! are zero-argument closures the runtime may re-invoke; every other variant is
//! applied once.
use std::fmt;
use std::rc::Rc;

pub type Reader<N> = Rc<dyn Fn() -> Value<N>>;
pub type Handler<N> = Rc<dyn Fn(&Event<N>)>;
pub type RefCallback<N> = Rc<dyn Fn(&N)>;
pub type Func<N> = Rc<dyn Fn(Value<N>) -> Value<N>>;
pub type Component<N> = Rc<dyn Fn(Props<N>) -> Value<N>>;

/// Event delivered to a `Handler`.
#[derive(Clone, Debug)]
pub struct Event<N> {
    pub name: String,
    pub target: N,
    pub current_target: N,
}

#[derive(Clone)]
pub enum Value<N> {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Node(N),
    List(Vec<Value<N>>),
    Reactive(Reader<N>),
    Handler(Handler<N>),
    Ref(RefCallback<N>),
    /// One-argument callable, e.g. a per-item child renderer.
    Func(Func<N>),
    Spread(Props<N>),
}

impl<N> Value<N> {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn node(node: N) -> Self {
        Value::Node(node)
    }

    pub fn reactive(reader: impl Fn() -> Value<N> + 'static) -> Self {
        Value::Reactive(Rc::new(reader))
    }

    pub fn handler(handler: impl Fn(&Event<N>) + 'static) -> Self {
        Value::Handler(Rc::new(handler))
    }

    pub fn reference(callback: impl Fn(&N) + 'static) -> Self {
        Value::Ref(Rc::new(callback))
    }

    pub fn func(f: impl Fn(Value<N>) -> Value<N> + 'static) -> Self {
        Value::Func(Rc::new(f))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, Value::Reactive(_))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(text) => !text.is_empty(),
            Value::List(_)
            | Value::Node(_)
            | Value::Reactive(_)
            | Value::Handler(_)
            | Value::Ref(_)
            | Value::Func(_)
            | Value::Spread(_) => true,
        }
    }

    /// Scalar rendering used for attribute values and text content.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Text(text) => Some(text.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Reads through readers until a non-reactive value is reached.
    pub fn resolve(self) -> Value<N> {
        let mut value = self;
        while let Value::Reactive(reader) = value {
            value = reader();
        }
        value
    }
}

impl<N: fmt::Debug> fmt::Debug for Value<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("Empty"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Reactive(_) => f.write_str("Reactive(..)"),
            Value::Handler(_) => f.write_str("Handler(..)"),
            Value::Ref(_) => f.write_str("Ref(..)"),
            Value::Func(_) => f.write_str("Func(..)"),
            Value::Spread(props) => f.debug_tuple("Spread").field(props).finish(),
        }
    }
}

impl<N> From<&str> for Value<N> {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl<N> From<String> for Value<N> {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl<N> From<bool> for Value<N> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<N> From<f64> for Value<N> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<N> From<i32> for Value<N> {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl<N> From<Vec<Value<N>>> for Value<N> {
    fn from(items: Vec<Value<N>>) -> Self {
        Value::List(items)
    }
}

impl<N> From<Props<N>> for Value<N> {
    fn from(props: Props<N>) -> Self {
        Value::Spread(props)
    }
}

impl<N, T: Into<Value<N>>> From<Option<T>> for Value<N> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

/// Formats a number the way a script engine prints it: integral values
/// without a fraction, non-finite values by name.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Covers -0.
        return "0".to_string();
    }
    // Display never uses exponent notation and drops a zero fraction.
    format!("{n}")
}

/// A prop value that is either fixed or re-read on demand.
#[derive(Clone)]
pub enum MaybeReactive<N> {
    Immediate(Value<N>),
    Reactive(Reader<N>),
}

impl<N> MaybeReactive<N> {
    /// Readers become lazy accessors unless the prop is a ref or an event
    /// handler, which must keep their identity. Any name starting with `on`
    /// counts as a handler here, so `online` or `one` also pass through as given.
    pub fn for_prop(name: &str, value: Value<N>) -> Self {
        match value {
            Value::Reactive(reader) if !is_passthrough_name(name) => MaybeReactive::Reactive(reader),
            value => MaybeReactive::Immediate(value),
        }
    }

    pub fn get(&self) -> Value<N>
    where
        N: Clone,
    {
        match self {
            MaybeReactive::Immediate(value) => value.clone(),
            MaybeReactive::Reactive(reader) => reader(),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, MaybeReactive::Reactive(_))
    }
}

impl<N: fmt::Debug> fmt::Debug for MaybeReactive<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeReactive::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            MaybeReactive::Reactive(_) => f.write_str("Reactive(..)"),
        }
    }
}

fn is_passthrough_name(name: &str) -> bool {
    name == "ref" || name.starts_with("on") || name.starts_with('@')
}

/// Ordered props bag. Setting an existing name replaces it in place.
#[derive(Clone)]
pub struct Props<N> {
    entries: Vec<(String, MaybeReactive<N>)>,
}

impl<N> Default for Props<N> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<N> Props<N> {
    pub const CHILDREN: &'static str = "children";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of an immediate value.
    pub fn with(mut self, name: &str, value: impl Into<Value<N>>) -> Self {
        self.set(name, MaybeReactive::Immediate(value.into()));
        self
    }

    pub fn set(&mut self, name: &str, value: MaybeReactive<N>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MaybeReactive<N>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &MaybeReactive<N>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Clone> Props<N> {
    /// Current value of `name`, reading through an accessor if it has one.
    pub fn value(&self, name: &str) -> Value<N> {
        self.get(name).map_or(Value::Empty, MaybeReactive::get)
    }

    /// Renders the component's children. Each call produces fresh nodes.
    pub fn children(&self) -> Value<N> {
        self.value(Self::CHILDREN)
    }
}

impl<N: fmt::Debug> fmt::Debug for Props<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(n, v)| (n, v)))
            .finish()
    }
}
