use mem_dom::{Document, NodeId};
use std::cell::Cell;
use std::rc::Rc;
use template::dom::XLINK_NS;
use template::{Dom, Html, Namespace, Props, StaticRuntime, TemplateError, Value, strings};
use template_test_support::{html_with, mount, render_html};

fn html() -> Html<Document> {
    html_with(Rc::new(StaticRuntime))
}

fn rendered(html: &Html<Document>, strings: template::Strings, values: Vec<Value<NodeId>>) -> NodeId {
    let value = html
        .render(strings, values)
        .unwrap_or_else(|err| panic!("render failed: {err}"));
    mount(html, value)
}

/// First `<name>` below the mount container, never the container itself.
fn find(html: &Html<Document>, root: NodeId, name: &str) -> NodeId {
    let dom = html.dom();
    dom.children(&root)
        .into_iter()
        .find_map(|child| dom.find_element(child, name))
        .unwrap_or_else(|| panic!("no <{name}> below {root}"))
}

#[test]
fn static_markup_round_trips() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<p class=\"a\">hi <b>there</b></p>"],
        vec![],
    );
    assert_eq!(out, "<p class=\"a\">hi <b>there</b></p>");
}

#[test]
fn text_holes_fill_in_place() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<p>Hello ", "! You are ", ".</p>"],
        vec![Value::from("World"), Value::from(3)],
    );
    assert_eq!(out, "<p>Hello World! You are 3.</p>");
}

#[test]
fn inserted_text_is_never_markup() {
    let html = html();
    let out = render_html(&html, strings!["<p>", "</p>"], vec![Value::from("<b>&</b>")]);
    assert_eq!(out, "<p>&lt;b&gt;&amp;&lt;/b&gt;</p>");
}

#[test]
fn dynamic_attributes_follow_static_ones() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<a class=\"c\" href=", ">x</a>"],
        vec![Value::from("/home")],
    );
    assert_eq!(out, "<a class=\"c\" href=\"/home\">x</a>");
}

#[test]
fn mixed_attribute_joins_text_and_values() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<div class=\"btn ", " lg\" data-n=\"", "\"></div>"],
        vec![Value::from("primary"), Value::from(2.5)],
    );
    assert_eq!(out, "<div class=\"btn primary lg\" data-n=\"2.5\"></div>");
}

#[test]
fn boolean_attributes() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<input disabled ?checked=", ">"],
        vec![Value::from(true)],
    );
    assert_eq!(out, "<input disabled=\"\" checked=\"\">");

    let out = render_html(
        &html,
        strings!["<input disabled ?checked=", ">"],
        vec![Value::from(false)],
    );
    assert_eq!(out, "<input disabled=\"\">");
}

#[test]
fn absent_values_remove_attributes() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<a title=", " href=", "></a>"],
        vec![Value::Empty, Value::from(None::<&str>)],
    );
    assert_eq!(out, "<a></a>");
}

fn spread() -> Value<NodeId> {
    Value::Spread(Props::new().with("value", "spread").with("name", "n"))
}

#[test]
fn explicit_prop_after_spread_wins() {
    let html = html();
    let out = render_html(&html, strings!["<input ...", " value=\"x\">"], vec![spread()]);
    assert_eq!(out, "<input name=\"n\" value=\"x\">");
}

#[test]
fn spread_after_explicit_prop_wins() {
    let html = html();
    let out = render_html(&html, strings!["<input value=\"x\" ...", ">"], vec![spread()]);
    assert_eq!(out, "<input value=\"spread\" name=\"n\">");
}

#[test]
fn spread_keys_yield_to_every_later_explicit_prop() {
    let html = html();
    let props = || Value::Spread(Props::new().with("id", "spread").with("class", "blue").with("lang", "en"));
    let out = render_html(
        &html,
        strings!["<div ...", " id=\"static\" class=\"red\"></div>"],
        vec![props()],
    );
    assert_eq!(out, "<div lang=\"en\" id=\"static\" class=\"red\"></div>");

    let out = render_html(
        &html,
        strings!["<div id=\"static\" class=\"red\" ...", "></div>"],
        vec![props()],
    );
    assert_eq!(out, "<div id=\"spread\" class=\"blue\" lang=\"en\"></div>");
}

#[test]
fn unquoted_values_join_adjacent_holes() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<a class=btn-", " href=", "/page>x</a>"],
        vec![Value::from("red"), Value::from("/base")],
    );
    assert_eq!(out, "<a class=\"btn-red\" href=\"/base/page\">x</a>");
}

#[test]
fn holes_inside_comments_render_nothing() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<div><!-- ", " -->", "</div>"],
        vec![Value::from("secret"), Value::from("shown")],
    );
    assert_eq!(out, "<div>shown</div>");
}

#[test]
fn void_elements_have_no_children() {
    let html = html();
    let out = render_html(&html, strings!["<p>a<br>b<img src=", ">c</p>"], vec![Value::from("x.png")]);
    assert_eq!(out, "<p>a<br>b<img src=\"x.png\">c</p>");
}

#[test]
fn raw_text_bodies_are_not_markup() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<script>if (a < b && c) {}</script><textarea><i>", "</i></textarea>"],
        vec![Value::from("x")],
    );
    assert_eq!(
        out,
        "<script>if (a < b && c) {}</script><textarea>&lt;i&gt;x&lt;/i&gt;</textarea>"
    );
}

#[test]
fn entities_decode_in_text_and_static_attributes() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<a title=\"a &amp; b\">&lt;&#x41;&gt;</a>"],
        vec![],
    );
    assert_eq!(out, "<a title=\"a &amp; b\">&lt;A&gt;</a>");
}

#[test]
fn top_level_nodes_flatten() {
    let html = html();
    let two = html.render(strings!["<li>a</li><li>b</li>"], vec![]);
    assert!(matches!(two, Ok(Value::List(ref items)) if items.len() == 2));

    let one = html.render(strings!["<li>a</li>"], vec![]);
    assert!(matches!(one, Ok(Value::Node(_))));

    let none = html.render(strings![""], vec![]);
    assert!(matches!(none, Ok(Value::Empty)));

    let bare = html.render(strings!["", ""], vec![Value::from("x")]);
    assert!(matches!(bare, Ok(Value::Text(ref text)) if text == "x"));
}

#[test]
fn lists_of_rendered_templates_insert_in_order() {
    let html = html();
    let items: Vec<Value<NodeId>> = (0..3i32)
        .map(|i| match html.render(strings!["<li>", "</li>"], vec![Value::from(i)]) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        })
        .collect();
    let out = render_html(&html, strings!["<ul>", "</ul>"], vec![Value::List(items)]);
    assert_eq!(out, "<ul><li>0</li><li>1</li><li>2</li></ul>");
}

#[test]
fn hole_count_must_match() {
    let html = html();
    let result = html.render(strings!["<p>", "</p>"], vec![]);
    assert!(matches!(
        result,
        Err(TemplateError::HoleCount {
            expected: 1,
            found: 0
        })
    ));
}

#[test]
fn parse_errors_surface_through_render() {
    let html = html();
    let result = html.render(strings!["<div><span></div>"], vec![]);
    assert!(matches!(result, Err(TemplateError::Parse(_))));
}

#[test]
fn event_listeners_attach_and_fire() {
    let html = html();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    let root = rendered(
        &html,
        strings!["<div><button @click=", " on:focus=", ">go</button></div>"],
        vec![
            Value::handler(move |_| counter.set(counter.get() + 1)),
            Value::handler(|_| {}),
        ],
    );
    let button = find(&html, root, "button");
    assert_eq!(html.dom().listener_count(button, "click"), 1);
    assert!(html.dom().is_delegated(button, "click"));
    assert!(!html.dom().is_delegated(button, "focus"));

    let div = find(&html, root, "div");
    assert_eq!(html.dom().dispatch(div, "click"), 0);
    assert_eq!(html.dom().dispatch(button, "click"), 1);
    assert_eq!(clicks.get(), 1);
    assert_eq!(html.dom().inner_html(root), "<div><button>go</button></div>");
}

#[test]
fn property_prefixes_set_properties_not_attributes() {
    let html = html();
    let root = rendered(
        &html,
        strings!["<input .value=", " prop:checked=", ">"],
        vec![Value::from("abc"), Value::from(true)],
    );
    let input = find(&html, root, "input");
    let value = html.dom().property(input, "value").and_then(|v| v.to_text());
    assert_eq!(value.as_deref(), Some("abc"));
    assert!(matches!(html.dom().property(input, "checked"), Some(Value::Bool(true))));
    assert!(html.dom().attributes(input).is_empty());
}

#[test]
fn class_and_style_prefixes() {
    let html = html();
    let out = render_html(
        &html,
        strings!["<div class=\"base\" class:active=", " class:hidden=", " style:color=", "></div>"],
        vec![Value::from(true), Value::from(false), Value::from("red")],
    );
    assert_eq!(out, "<div class=\"base active\" style=\"color: red\"></div>");
}

#[test]
fn ref_callbacks_receive_the_element() {
    let html = html();
    let seen = Rc::new(Cell::new(None));
    let slot = seen.clone();
    let root = rendered(
        &html,
        strings!["<section><div ref=", "></div></section>"],
        vec![Value::reference(move |node: &NodeId| slot.set(Some(*node)))],
    );
    assert_eq!(seen.get(), Some(find(&html, root, "div")));
}

#[test]
fn dynamic_attribute_name_degrades_to_ref() {
    let html = html();
    let seen = Rc::new(Cell::new(None));
    let slot = seen.clone();
    let root = rendered(
        &html,
        strings!["<p><span ", "=\"ignored\"></span></p>"],
        vec![Value::reference(move |node: &NodeId| slot.set(Some(*node)))],
    );
    let span = find(&html, root, "span");
    assert_eq!(seen.get(), Some(span));
    assert!(html.dom().attributes(span).is_empty());
}

#[test]
fn svg_subtrees_use_the_svg_namespace() {
    let html = html();
    let root = rendered(
        &html,
        strings![
            "<div><svg><use xlink:href=",
            " r=",
            "/><foreignObject><p></p></foreignObject></svg></div>"
        ],
        vec![Value::from("#icon"), Value::from(4)],
    );
    let dom = html.dom();
    let svg_use = find(&html, root, "use");
    assert_eq!(dom.namespace(find(&html, root, "div")), Some(Namespace::Html));
    assert_eq!(dom.namespace(svg_use), Some(Namespace::Svg));
    assert_eq!(dom.namespace(find(&html, root, "foreignObject")), Some(Namespace::Svg));
    assert_eq!(dom.namespace(find(&html, root, "p")), Some(Namespace::Html));
    assert_eq!(
        dom.attribute_namespace(svg_use, "xlink:href").as_deref(),
        Some(XLINK_NS)
    );
    assert_eq!(dom.attribute(svg_use, "r").as_deref(), Some("4"));
}

#[test]
fn custom_rules_take_priority() {
    fn upper<D: template::Dom>(target: &template::Target<'_, D>, name: &str, value: &Value<D::Node>) {
        let text = value.to_text().unwrap_or_default().to_uppercase();
        target.dom.set_attribute(target.node, name, &text);
    }
    let html = Html::builder()
        .rule(template::AttrRule::new(template::Matcher::prefix("up:"), upper))
        .build(Document::new(), Rc::new(StaticRuntime));
    let out = render_html(&html, strings!["<b up:title=", "></b>"], vec![Value::from("loud")]);
    assert_eq!(out, "<b title=\"LOUD\"></b>");
}

#[test]
fn rendering_twice_yields_independent_nodes() {
    let html = html();
    let render = |label: &str| rendered(&html, strings!["<p>", "</p>"], vec![Value::from(label)]);
    let first = render("one");
    let second = render("two");
    assert_ne!(first, second);
    assert_eq!(html.dom().inner_html(first), "<p>one</p>");
    assert_eq!(html.dom().inner_html(second), "<p>two</p>");
    assert_eq!(html.stats().parses, 1);
}
