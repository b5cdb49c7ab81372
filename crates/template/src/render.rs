//! Binds a call's values onto a clone of the cached skeleton.
//!
//! Pairing contract:
//! - `collect` recurses over the AST while a `Walker` steps forward through the
//!   clone in pre-order, visiting elements and comments only. Both sides visit
//!   in the same order, so the n-th dynamic AST node pairs with the n-th
//!   element or placeholder of the clone.
//! - Every pair is collected before any binding mutates the clone.
//!
//! Binding:
//! - Props bind in source order, skipping those prebound on the skeleton.
//! - A reader value bound through a reactive rule runs inside a runtime effect.
//! - An immediate child value replaces its placeholder. A reader keeps the
//!   placeholder as an anchor and reconciles the nodes before it on each run.
//! - Components run untracked with props built from their attributes and a
//!   `children` accessor that renders their own container on each read.
use crate::attrs::AttrRule;
use crate::cache::{CacheStats, Strings, Template, TemplateCache};
use crate::component::ComponentRegistry;
use crate::config::TemplateConfig;
use crate::context::Context;
use crate::dom::{Dom, NodeKind};
use crate::error::TemplateError;
use crate::reactive::Runtime;
use crate::skeleton::{is_component, is_prebound, materialize, static_value};
use crate::types::{AttrPart, Element, Node, Prop, ROOT_SLOT};
use crate::value::{MaybeReactive, Props, Reader, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Template factory: one cache, one DOM, one runtime.
pub struct Html<D: Dom> {
    cx: Rc<Context<D>>,
    cache: RefCell<TemplateCache<D::Node>>,
}

impl<D: Dom> Html<D> {
    pub fn new(dom: D, runtime: Rc<dyn Runtime>) -> Self {
        HtmlBuilder::new().build(dom, runtime)
    }

    pub fn builder() -> HtmlBuilder<D> {
        HtmlBuilder::new()
    }

    pub fn context(&self) -> &Context<D> {
        &self.cx
    }

    pub fn dom(&self) -> &D {
        &self.cx.dom
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    /// Returns the cached template for `strings`, compiling it on first use.
    pub fn compile(&self, strings: Strings) -> Result<Rc<Template<D::Node>>, TemplateError> {
        let cx = &*self.cx;
        self.cache
            .borrow_mut()
            .get_or_compile(strings, |segments| compile_template(cx, segments))
    }

    /// Renders one call of the template literal `strings` with `values`.
    ///
    /// The result is a single node when the template has exactly one top-level
    /// node, `Value::Empty` when it has none, and a `Value::List` otherwise.
    /// Without a skeleton, hole values at the top level pass through as given.
    pub fn render(
        &self,
        strings: Strings,
        values: Vec<Value<D::Node>>,
    ) -> Result<Value<D::Node>, TemplateError> {
        let expected = strings.hole_count();
        if values.len() != expected {
            return Err(TemplateError::HoleCount {
                expected,
                found: values.len(),
            });
        }
        let template = self.compile(strings)?;
        let binder = Binder {
            cx: self.cx.clone(),
            template,
            values: Rc::new(values),
        };
        Ok(binder.render_container(&binder.template.root.children, ROOT_SLOT))
    }

    /// Appends `value` to `parent`. Readers stay live behind a placeholder.
    pub fn mount(&self, parent: &D::Node, value: Value<D::Node>) {
        let marker = self.cx.dom.create_comment("");
        self.cx.dom.append_child(parent, &marker);
        insert(&self.cx, marker, value);
    }
}

fn compile_template<D: Dom>(cx: &Context<D>, segments: &[&str]) -> Result<Template<D::Node>, TemplateError> {
    let root = crate::parse_template(segments, &cx.config)?;
    materialize(cx, root)
}

pub struct HtmlBuilder<D: Dom> {
    config: TemplateConfig,
    components: ComponentRegistry<D::Node>,
    rules: Vec<AttrRule<D>>,
}

impl<D: Dom> Default for HtmlBuilder<D> {
    fn default() -> Self {
        Self {
            config: TemplateConfig::default(),
            components: ComponentRegistry::new(),
            rules: Vec::new(),
        }
    }
}

impl<D: Dom> HtmlBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: TemplateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict_components(mut self, strict: bool) -> Self {
        self.config.strict_components = strict;
        self
    }

    pub fn component(
        mut self,
        name: &str,
        component: impl Fn(Props<D::Node>) -> Value<D::Node> + 'static,
    ) -> Self {
        self.components.register(name, component);
        self
    }

    /// Custom rules take priority over the built-in ones, earlier calls first.
    pub fn rule(mut self, rule: AttrRule<D>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self, dom: D, runtime: Rc<dyn Runtime>) -> Html<D> {
        let mut cx = Context::new(dom, runtime);
        for rule in self.rules.into_iter().rev() {
            cx.policy.prepend(rule);
        }
        cx.components = self.components;
        cx.config = self.config;
        Html {
            cx: Rc::new(cx),
            cache: RefCell::new(TemplateCache::new()),
        }
    }
}

/// One render call: the shared context, the template and this call's values.
struct Binder<D: Dom> {
    cx: Rc<Context<D>>,
    template: Rc<Template<D::Node>>,
    values: Rc<Vec<Value<D::Node>>>,
}

impl<D: Dom> Clone for Binder<D> {
    fn clone(&self) -> Self {
        Self {
            cx: self.cx.clone(),
            template: self.template.clone(),
            values: self.values.clone(),
        }
    }
}

enum Pair<'t, N> {
    Element(N, &'t Element),
    Insert(N, usize),
    Component(N, &'t Rc<Element>),
}

impl<D: Dom> Binder<D> {
    fn value(&self, index: usize) -> Value<D::Node> {
        self.values.get(index).cloned().unwrap_or(Value::Empty)
    }

    fn render_container(&self, children: &[Node], slot: usize) -> Value<D::Node> {
        let dom = &self.cx.dom;
        let Some(skeleton) = self.template.skeleton(slot) else {
            let items = children
                .iter()
                .map(|child| match child {
                    Node::Text(text) => Value::Node(dom.create_text(text)),
                    Node::Expr(index) => self.value(*index),
                    Node::Element(element) => self.invoke_component(element),
                })
                .collect();
            return flatten(items);
        };

        let root = dom.clone_deep(skeleton);
        let mut walker = Walker::new(dom, root.clone());
        let mut pairs = Vec::new();
        if collect(&self.cx, children, &mut walker, &mut pairs).is_none() {
            log::error!(
                target: "template.render",
                "skeleton for slot {slot} ran out of nodes after {} bindings",
                pairs.len()
            );
        }
        for pair in pairs {
            match pair {
                Pair::Element(node, element) => self.bind_props(&node, element),
                Pair::Insert(marker, index) => insert(&self.cx, marker, self.value(index)),
                Pair::Component(marker, element) => {
                    let out = self.invoke_component(element);
                    insert(&self.cx, marker, out);
                }
            }
        }
        flatten(dom.children(&root).into_iter().map(Value::Node).collect())
    }

    fn bind_props(&self, node: &D::Node, element: &Element) {
        for (index, prop) in element.props.iter().enumerate() {
            if is_prebound(&self.cx, element, index) {
                continue;
            }
            match prop {
                Prop::Boolean { name } | Prop::Static { name, .. } => {
                    bind_value(&self.cx, node, name, static_value(prop));
                }
                Prop::Expr { name, index, .. } => {
                    bind_value(&self.cx, node, name, self.value(*index));
                }
                Prop::Mixed { name, parts, .. } => {
                    bind_value(&self.cx, node, name, self.mixed_value(parts));
                }
                Prop::Spread { index: hole } => {
                    let shadowed = shadowed_after(element, index);
                    bind_spread(&self.cx, node, self.value(*hole), shadowed);
                }
            }
        }
    }

    /// Joins a mixed attribute; reactive if any hole holds a reader.
    fn mixed_value(&self, parts: &[AttrPart]) -> Value<D::Node> {
        let pieces: Vec<Value<D::Node>> = parts
            .iter()
            .map(|part| match part {
                AttrPart::Text(text) => Value::Text(text.clone()),
                AttrPart::Hole(index) => self.value(*index),
            })
            .collect();
        if pieces.iter().any(Value::is_reactive) {
            Value::reactive(move || Value::Text(join(&pieces)))
        } else {
            Value::Text(join(&pieces))
        }
    }

    fn invoke_component(&self, element: &Rc<Element>) -> Value<D::Node> {
        let Some(component) = self.cx.components.component_for(element).cloned() else {
            log::error!(
                target: "template.render",
                "<{}> reached component invocation without a registration",
                element.name
            );
            return Value::Empty;
        };
        let mut out = Value::Empty;
        self.cx.runtime.untracked(&mut || {
            let props = self.build_props(element);
            out = component(props);
        });
        out
    }

    fn build_props(&self, element: &Rc<Element>) -> Props<D::Node> {
        let mut props = Props::new();
        for prop in &element.props {
            match prop {
                Prop::Boolean { name } | Prop::Static { name, .. } => {
                    props.set(name, MaybeReactive::Immediate(static_value(prop)));
                }
                Prop::Expr { name, index, .. } => {
                    props.set(name, MaybeReactive::for_prop(name, self.value(*index)));
                }
                Prop::Mixed { name, parts, .. } => {
                    props.set(name, MaybeReactive::for_prop(name, self.mixed_value(parts)));
                }
                Prop::Spread { index } => match self.value(*index).resolve() {
                    Value::Spread(spread) => {
                        for (name, entry) in spread.entries() {
                            props.set(name, entry.clone());
                        }
                    }
                    Value::Empty => {}
                    other => log::warn!(
                        target: "template.render",
                        "spread on <{}> expects props, got {other:?}",
                        element.name
                    ),
                },
            }
        }
        if let (Some(slot), false) = (element.slot, element.children.is_empty()) {
            let binder = self.clone();
            let element = element.clone();
            props.set(
                Props::<D::Node>::CHILDREN,
                MaybeReactive::Reactive(Rc::new(move || {
                    binder.render_container(&element.children, slot)
                })),
            );
        }
        props
    }
}

fn join<N>(pieces: &[Value<N>]) -> String
where
    N: Clone,
{
    pieces
        .iter()
        .map(|piece| piece.clone().resolve().to_text().unwrap_or_default())
        .collect()
}

fn flatten<N>(mut items: Vec<Value<N>>) -> Value<N> {
    match items.len() {
        0 => Value::Empty,
        1 => items.pop().unwrap_or(Value::Empty),
        _ => Value::List(items),
    }
}

/// Pairs dynamic AST nodes with clone nodes. `None` means the clone ran out,
/// which only a skeleton built under a different layout can cause.
fn collect<'t, D: Dom>(
    cx: &Context<D>,
    nodes: &'t [Node],
    walker: &mut Walker<'_, D>,
    pairs: &mut Vec<Pair<'t, D::Node>>,
) -> Option<()> {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Expr(index) => pairs.push(Pair::Insert(walker.next()?, *index)),
            Node::Element(element) => {
                let dom_node = walker.next()?;
                if is_component(cx, element) {
                    pairs.push(Pair::Component(dom_node, element));
                    continue;
                }
                let dynamic = (0..element.props.len()).any(|i| !is_prebound(cx, element, i));
                if dynamic {
                    pairs.push(Pair::Element(dom_node, element));
                }
                collect(cx, &element.children, walker, pairs)?;
            }
        }
    }
    Some(())
}

/// Forward pre-order walk below `root` yielding elements and comments.
struct Walker<'a, D: Dom> {
    dom: &'a D,
    root: D::Node,
    current: Option<D::Node>,
}

impl<'a, D: Dom> Walker<'a, D> {
    fn new(dom: &'a D, root: D::Node) -> Self {
        Self {
            dom,
            root,
            current: None,
        }
    }

    fn next(&mut self) -> Option<D::Node> {
        loop {
            let next = match &self.current {
                None => self.dom.first_child(&self.root),
                Some(node) => self.advance(node),
            }?;
            self.current = Some(next.clone());
            if matches!(self.dom.kind(&next), NodeKind::Element | NodeKind::Comment) {
                return Some(next);
            }
        }
    }

    fn advance(&self, node: &D::Node) -> Option<D::Node> {
        if let Some(child) = self.dom.first_child(node) {
            return Some(child);
        }
        let mut node = node.clone();
        while node != self.root {
            if let Some(sibling) = self.dom.next_sibling(&node) {
                return Some(sibling);
            }
            node = self.dom.parent(&node)?;
        }
        None
    }
}

/// Applies `value` to `name` on `node`, inside an effect when the value is a
/// reader and the rule is reactive.
fn bind_value<D: Dom>(cx: &Rc<Context<D>>, node: &D::Node, name: &str, value: Value<D::Node>) {
    let (rule, stripped) = cx.policy.resolve(name);
    match value {
        Value::Reactive(reader) if rule.reactive => {
            let apply = rule.apply;
            let weak = Rc::downgrade(cx);
            let node = node.clone();
            let name = stripped.to_string();
            cx.runtime.effect(Box::new(move || {
                let Some(cx) = weak.upgrade() else {
                    return;
                };
                let value = reader().resolve();
                apply(&cx.target(&node), &name, &value);
            }));
        }
        value => (rule.apply)(&cx.target(node), stripped, &value),
    }
}

/// Names written explicitly after the prop at `index`. A spread never applies
/// these keys, so the explicit value wins on every run.
fn shadowed_after(element: &Element, index: usize) -> Rc<[String]> {
    element.props[index + 1..]
        .iter()
        .filter_map(Prop::name)
        .map(str::to_string)
        .collect()
}

fn is_shadowed(shadowed: &[String], name: &str) -> bool {
    shadowed.iter().any(|later| later.eq_ignore_ascii_case(name))
}

/// Spread entries bind in order, minus the keys in `shadowed`. A reader spread
/// is re-applied whole on each run; keys it stops producing are left as they
/// were.
fn bind_spread<D: Dom>(
    cx: &Rc<Context<D>>,
    node: &D::Node,
    value: Value<D::Node>,
    shadowed: Rc<[String]>,
) {
    match value {
        Value::Spread(props) => {
            for (name, entry) in props.entries() {
                if is_shadowed(&shadowed, name) {
                    continue;
                }
                let value = match entry {
                    MaybeReactive::Immediate(value) => value.clone(),
                    MaybeReactive::Reactive(reader) => Value::Reactive(reader.clone()),
                };
                bind_value(cx, node, name, value);
            }
        }
        Value::Reactive(reader) => {
            let weak = Rc::downgrade(cx);
            let node = node.clone();
            cx.runtime.effect(Box::new(move || {
                let Some(cx) = weak.upgrade() else {
                    return;
                };
                match reader().resolve() {
                    Value::Spread(props) => {
                        let target = cx.target(&node);
                        for (name, entry) in props.entries() {
                            if !is_shadowed(&shadowed, name) {
                                cx.policy.apply(&target, name, &entry.get().resolve());
                            }
                        }
                    }
                    Value::Empty => {}
                    other => log::warn!(target: "template.render", "spread expects props, got {other:?}"),
                }
            }));
        }
        Value::Empty => {}
        other => log::warn!(target: "template.render", "spread expects props, got {other:?}"),
    }
}

/// Puts `value` where `marker` stands. Immediate values replace the marker;
/// readers keep it as an anchor.
fn insert<D: Dom>(cx: &Rc<Context<D>>, marker: D::Node, value: Value<D::Node>) {
    let dom = &cx.dom;
    match value {
        Value::Reactive(reader) => insert_reactive(cx, marker, reader),
        value => {
            let mut nodes = Vec::new();
            push_nodes(dom, value, &mut nodes);
            let Some(parent) = dom.parent(&marker) else {
                log::warn!(target: "template.render", "insertion point {marker:?} is detached");
                return;
            };
            for node in &nodes {
                dom.insert_before(&parent, node, Some(&marker));
            }
            dom.remove(&marker);
        }
    }
}

fn insert_reactive<D: Dom>(cx: &Rc<Context<D>>, marker: D::Node, reader: Reader<D::Node>) {
    let weak = Rc::downgrade(cx);
    let mut current: Vec<D::Node> = Vec::new();
    cx.runtime.effect(Box::new(move || {
        let Some(cx) = weak.upgrade() else {
            return;
        };
        let dom = &cx.dom;
        let value = reader().resolve();

        if let ([node], Value::Text(_) | Value::Number(_)) = (current.as_slice(), &value) {
            if dom.kind(node) == NodeKind::Text {
                dom.set_text(node, &value.to_text().unwrap_or_default());
                return;
            }
        }

        for node in current.drain(..) {
            dom.remove(&node);
        }
        let mut nodes = Vec::new();
        push_nodes(dom, value, &mut nodes);
        let Some(parent) = dom.parent(&marker) else {
            log::warn!(target: "template.render", "insertion point {marker:?} is detached");
            return;
        };
        for node in &nodes {
            dom.insert_before(&parent, node, Some(&marker));
        }
        current = nodes;
    }));
}

/// Flattens a child value into insertable nodes. Fragments contribute their
/// children so later removal finds them; readers nested in lists are read once.
fn push_nodes<D: Dom>(dom: &D, value: Value<D::Node>, out: &mut Vec<D::Node>) {
    match value {
        Value::Empty | Value::Bool(_) => {}
        Value::Text(text) => out.push(dom.create_text(&text)),
        Value::Number(_) => out.push(dom.create_text(&value.to_text().unwrap_or_default())),
        Value::Node(node) => {
            if dom.kind(&node) == NodeKind::Fragment {
                out.extend(dom.children(&node));
            } else {
                out.push(node);
            }
        }
        Value::List(items) => {
            for item in items {
                push_nodes(dom, item, out);
            }
        }
        Value::Reactive(reader) => push_nodes(dom, reader(), out),
        other @ (Value::Handler(_) | Value::Ref(_) | Value::Func(_) | Value::Spread(_)) => {
            log::warn!(target: "template.render", "cannot insert {other:?} as content");
        }
    }
}
