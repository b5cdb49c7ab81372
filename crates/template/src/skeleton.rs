//! Materializes cloneable DOM skeletons from a parsed template.
//!
//! Layout contract, relied on by the binder's lockstep walk:
//! - A container (the root or a component element) gets a fragment skeleton
//!   only if it has a direct child that renders as a plain element.
//! - Text becomes a text node with its content. Holes and component elements
//!   become empty comments.
//! - Plain elements are created in their namespace, with every prebound prop
//!   already applied.
//! - A component's own children form a separate container in its slot.
use crate::cache::Template;
use crate::context::Context;
use crate::dom::{Dom, Namespace};
use crate::error::TemplateError;
use crate::types::{Element, Node, Prop, ROOT_SLOT, Root};
use crate::value::Value;

/// Whether the prop at `index` is applied on the skeleton instead of per render.
///
/// Only holeless props qualify, and only when no spread precedes them (a spread
/// applied at render time must not override an explicit value written after it)
/// and the rule's effect survives `clone_deep`.
pub(crate) fn is_prebound<D: Dom>(cx: &Context<D>, element: &Element, index: usize) -> bool {
    let prop = &element.props[index];
    let Some(name) = prop.name() else {
        return false;
    };
    prop.is_static() && !element.spread_before(index) && cx.policy.resolve(name).0.cloneable
}

/// The value a holeless prop carries.
pub(crate) fn static_value<N>(prop: &Prop) -> Value<N> {
    match prop {
        Prop::Boolean { .. } => Value::Bool(true),
        Prop::Static { value, .. } => Value::Text(value.clone()),
        _ => Value::Empty,
    }
}

/// Whether `element` renders through a component. Under lenient component
/// resolution an unregistered capitalized tag is a plain element.
pub(crate) fn is_component<D: Dom>(cx: &Context<D>, element: &Element) -> bool {
    cx.components.component_for(element).is_some()
}

/// Validates component usage and builds the skeleton of every container.
pub fn materialize<D: Dom>(cx: &Context<D>, root: Root) -> Result<Template<D::Node>, TemplateError> {
    let mut skeletons = vec![None; root.slot_count];
    skeletons[ROOT_SLOT] = build_container(cx, &root.children, &mut skeletons)?;
    Ok(Template { root, skeletons })
}

fn build_container<D: Dom>(
    cx: &Context<D>,
    children: &[Node],
    skeletons: &mut [Option<D::Node>],
) -> Result<Option<D::Node>, TemplateError> {
    let needs_skeleton = children.iter().any(|child| match child {
        Node::Element(element) => !is_component(cx, element),
        _ => false,
    });
    if !needs_skeleton {
        build_slots(cx, children, skeletons)?;
        return Ok(None);
    }
    let fragment = cx.dom.create_fragment();
    append_children(cx, &fragment, children, skeletons)?;
    Ok(Some(fragment))
}

/// Builds the slots of component children of a skeleton-less container.
fn build_slots<D: Dom>(
    cx: &Context<D>,
    children: &[Node],
    skeletons: &mut [Option<D::Node>],
) -> Result<(), TemplateError> {
    for child in children {
        if let Node::Element(element) = child {
            build_component_slot(cx, element, skeletons)?;
        }
    }
    Ok(())
}

fn build_component_slot<D: Dom>(
    cx: &Context<D>,
    element: &Element,
    skeletons: &mut [Option<D::Node>],
) -> Result<(), TemplateError> {
    if let Some(slot) = element.slot {
        let skeleton = build_container(cx, &element.children, skeletons)?;
        skeletons[slot] = skeleton;
    }
    Ok(())
}

fn check_component<D: Dom>(cx: &Context<D>, element: &Element) -> Result<(), TemplateError> {
    if element.slot.is_none() || is_component(cx, element) {
        return Ok(());
    }
    if cx.config.strict_components {
        return Err(TemplateError::UnknownComponent {
            name: element.name.clone(),
        });
    }
    log::warn!(
        target: "template.render",
        "no component registered for <{}>; rendering it as a plain element",
        element.name
    );
    Ok(())
}

fn append_children<D: Dom>(
    cx: &Context<D>,
    parent: &D::Node,
    children: &[Node],
    skeletons: &mut [Option<D::Node>],
) -> Result<(), TemplateError> {
    for child in children {
        match child {
            Node::Text(text) => cx.dom.append_child(parent, &cx.dom.create_text(text)),
            Node::Expr(_) => cx.dom.append_child(parent, &cx.dom.create_comment("")),
            Node::Element(element) => {
                check_component(cx, element)?;
                if is_component(cx, element) {
                    cx.dom.append_child(parent, &cx.dom.create_comment(""));
                    build_component_slot(cx, element, skeletons)?;
                } else {
                    let node = build_element(cx, element);
                    cx.dom.append_child(parent, &node);
                    append_children(cx, &node, &element.children, skeletons)?;
                }
            }
        }
    }
    Ok(())
}

fn build_element<D: Dom>(cx: &Context<D>, element: &Element) -> D::Node {
    let namespace = if element.svg {
        Namespace::Svg
    } else {
        Namespace::Html
    };
    let node = cx.dom.create_element(&element.name, namespace);
    let target = cx.target(&node);
    for (index, prop) in element.props.iter().enumerate() {
        if !is_prebound(cx, element, index) {
            continue;
        }
        if let Some(name) = prop.name() {
            cx.policy.apply(&target, name, &static_value(prop));
        }
    }
    node
}
