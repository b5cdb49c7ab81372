//! Attribute assignment policy.
//!
//! Every dynamic attribute name is matched against an ordered rule list; the
//! first match wins and unmatched names fall back to plain attribute set/remove.
//! Prefix matchers hand the rule the name with the prefix stripped.
//!
//! Rule flags:
//! - `reactive`: a reader value is wrapped in an effect and re-applied on change.
//!   Rules without it receive the reader itself (events, refs).
//! - `cloneable`: a static value may be applied once on the skeleton, since
//!   `Dom::clone_deep` carries its effect into every clone.
use crate::config::TemplateConfig;
use crate::dom::{Dom, XLINK_NS, XML_NS};
use crate::value::{Event, Handler, Value};
use std::fmt;
use std::rc::Rc;

/// Node an attribute is being applied to.
pub struct Target<'a, D: Dom> {
    pub dom: &'a D,
    pub node: &'a D::Node,
    pub config: &'a TemplateConfig,
}

pub type Apply<D> = fn(&Target<'_, D>, &str, &Value<<D as Dom>::Node>);

#[derive(Clone, Debug)]
pub enum Matcher {
    Prefix(String),
    Exact(String),
    Predicate(fn(&str) -> bool),
}

impl Matcher {
    pub fn prefix(prefix: &str) -> Self {
        Matcher::Prefix(prefix.to_string())
    }

    pub fn exact(name: &str) -> Self {
        Matcher::Exact(name.to_string())
    }

    /// Returns the name the rule should see, or `None` if it does not match.
    fn matches<'n>(&self, name: &'n str) -> Option<&'n str> {
        match self {
            Matcher::Prefix(prefix) => name.strip_prefix(prefix.as_str()),
            Matcher::Exact(exact) => (name == exact).then_some(name),
            Matcher::Predicate(pred) => pred(name).then_some(name),
        }
    }
}

pub struct AttrRule<D: Dom> {
    pub matcher: Matcher,
    pub apply: Apply<D>,
    pub reactive: bool,
    pub cloneable: bool,
}

impl<D: Dom> AttrRule<D> {
    pub fn new(matcher: Matcher, apply: Apply<D>) -> Self {
        Self {
            matcher,
            apply,
            reactive: true,
            cloneable: false,
        }
    }

    pub fn reactive(mut self, reactive: bool) -> Self {
        self.reactive = reactive;
        self
    }

    pub fn cloneable(mut self, cloneable: bool) -> Self {
        self.cloneable = cloneable;
        self
    }
}

impl<D: Dom> Clone for AttrRule<D> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            apply: self.apply,
            reactive: self.reactive,
            cloneable: self.cloneable,
        }
    }
}

impl<D: Dom> fmt::Debug for AttrRule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrRule")
            .field("matcher", &self.matcher)
            .field("reactive", &self.reactive)
            .field("cloneable", &self.cloneable)
            .finish()
    }
}

pub struct AttributePolicy<D: Dom> {
    rules: Vec<AttrRule<D>>,
    fallback: AttrRule<D>,
}

impl<D: Dom> AttributePolicy<D> {
    pub fn builtin() -> Self {
        let rules = vec![
            AttrRule::new(Matcher::prefix("@"), apply_event).reactive(false),
            AttrRule::new(Matcher::prefix("on:"), apply_event).reactive(false),
            AttrRule::new(Matcher::prefix("."), apply_property),
            AttrRule::new(Matcher::prefix("prop:"), apply_property),
            AttrRule::new(Matcher::prefix("?"), apply_bool).cloneable(true),
            AttrRule::new(Matcher::prefix("bool:"), apply_bool).cloneable(true),
            AttrRule::new(Matcher::prefix("attr:"), apply_attribute).cloneable(true),
            AttrRule::new(Matcher::exact("ref"), apply_ref).reactive(false),
            AttrRule::new(Matcher::prefix("ref:"), apply_ref).reactive(false),
            AttrRule::new(Matcher::prefix("class:"), apply_class).cloneable(true),
            AttrRule::new(Matcher::prefix("style:"), apply_style).cloneable(true),
            AttrRule::new(Matcher::prefix("xlink:"), apply_xlink).cloneable(true),
            AttrRule::new(Matcher::prefix("xml:"), apply_xml).cloneable(true),
        ];
        Self {
            rules,
            fallback: AttrRule::new(Matcher::Predicate(|_| true), apply_attribute).cloneable(true),
        }
    }

    /// Adds a rule ahead of every existing one.
    pub fn prepend(&mut self, rule: AttrRule<D>) {
        self.rules.insert(0, rule);
    }

    pub fn rules(&self) -> &[AttrRule<D>] {
        &self.rules
    }

    /// First matching rule and the name it should receive.
    pub fn resolve<'n>(&self, name: &'n str) -> (&AttrRule<D>, &'n str) {
        self.rules
            .iter()
            .find_map(|rule| rule.matcher.matches(name).map(|stripped| (rule, stripped)))
            .unwrap_or((&self.fallback, name))
    }

    /// Applies `value` under the rule selected for `name`, without any
    /// reactive wrapping.
    pub fn apply(&self, target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
        let (rule, stripped) = self.resolve(name);
        (rule.apply)(target, stripped, value);
    }
}

impl<D: Dom> Default for AttributePolicy<D> {
    fn default() -> Self {
        Self::builtin()
    }
}

fn unsupported<N: fmt::Debug>(rule: &str, name: &str, value: &Value<N>) {
    log::warn!(
        target: "template.render",
        "{rule} `{name}` cannot take {value:?}; ignored"
    );
}

pub fn apply_event<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    let handler: Handler<D::Node> = match value {
        Value::Handler(handler) => handler.clone(),
        Value::Reactive(reader) => {
            let reader = reader.clone();
            Rc::new(move |_: &Event<D::Node>| {
                reader();
            })
        }
        Value::Func(func) => {
            let func = func.clone();
            Rc::new(move |event: &Event<D::Node>| {
                func(Value::Text(event.name.clone()));
            })
        }
        Value::Empty => return,
        other => return unsupported("event", name, other),
    };
    let delegated = target.config.delegated_events.contains(name);
    target
        .dom
        .add_event_listener(target.node, name, handler, delegated);
}

pub fn apply_property<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    target.dom.set_property(target.node, name, value.clone());
}

pub fn apply_bool<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    if value.is_truthy() {
        target.dom.set_attribute(target.node, name, "");
    } else {
        target.dom.remove_attribute(target.node, name);
    }
}

pub fn apply_attribute<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    match value {
        Value::Empty | Value::Bool(false) => target.dom.remove_attribute(target.node, name),
        Value::Bool(true) => target.dom.set_attribute(target.node, name, ""),
        Value::Text(_) | Value::Number(_) => {
            if let Some(text) = value.to_text() {
                target.dom.set_attribute(target.node, name, &text);
            }
        }
        other => unsupported("attribute", name, other),
    }
}

pub fn apply_ref<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    match value {
        Value::Ref(callback) => callback(target.node),
        Value::Func(func) => {
            func(Value::Node(target.node.clone()));
        }
        Value::Empty => {}
        other => unsupported("ref", name, other),
    }
}

pub fn apply_class<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    target
        .dom
        .toggle_class(target.node, name, value.is_truthy());
}

pub fn apply_style<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    match value {
        Value::Empty | Value::Bool(false) => target.dom.set_style(target.node, name, None),
        Value::Text(_) | Value::Number(_) => {
            let text = value.to_text();
            target.dom.set_style(target.node, name, text.as_deref());
        }
        other => unsupported("style", name, other),
    }
}

fn apply_namespaced<D: Dom>(
    target: &Target<'_, D>,
    namespace: &str,
    qualified: &str,
    value: &Value<D::Node>,
) {
    match value {
        Value::Empty | Value::Bool(false) => {
            target
                .dom
                .set_attribute_ns(target.node, namespace, qualified, None);
        }
        Value::Bool(true) => {
            target
                .dom
                .set_attribute_ns(target.node, namespace, qualified, Some(""));
        }
        Value::Text(_) | Value::Number(_) => {
            let text = value.to_text();
            target
                .dom
                .set_attribute_ns(target.node, namespace, qualified, text.as_deref());
        }
        other => unsupported("attribute", qualified, other),
    }
}

pub fn apply_xlink<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    apply_namespaced(target, XLINK_NS, &format!("xlink:{name}"), value);
}

pub fn apply_xml<D: Dom>(target: &Target<'_, D>, name: &str, value: &Value<D::Node>) {
    apply_namespaced(target, XML_NS, &format!("xml:{name}"), value);
}
