use crate::types::{AttrPart, Element, Node, Prop, Root};

/// Pre-order walk over every element, parents before children.
pub fn for_each_element(root: &Root, mut f: impl FnMut(&Element)) {
    let mut stack: Vec<&Node> = root.children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if let Node::Element(element) = node {
            f(element);
            stack.extend(element.children.iter().rev());
        }
    }
}

/// Every hole index referenced by the AST, in source order: an element's props
/// come before its children.
pub fn holes(root: &Root) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack: Vec<&Node> = root.children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Text(_) => {}
            Node::Expr(index) => out.push(*index),
            Node::Element(element) => {
                for prop in &element.props {
                    match prop {
                        Prop::Boolean { .. } | Prop::Static { .. } => {}
                        Prop::Expr { index, .. } | Prop::Spread { index } => out.push(*index),
                        Prop::Mixed { parts, .. } => {
                            out.extend(parts.iter().filter_map(|part| match part {
                                AttrPart::Hole(index) => Some(*index),
                                AttrPart::Text(_) => None,
                            }));
                        }
                    }
                }
                stack.extend(element.children.iter().rev());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{for_each_element, holes};
    use crate::config::TemplateConfig;
    use crate::parse_template;
    use crate::types::Root;

    fn parse(segments: &[&str]) -> Root {
        match parse_template(segments, &TemplateConfig::default()) {
            Ok(root) => root,
            Err(err) => panic!("{err}"),
        }
    }

    #[test]
    fn holes_cover_every_index_once_in_source_order() {
        let segments = [
            "<ul class=\"list ",
            "\" ...",
            "><li @click=",
            ">",
            "</li><li>",
            " and ",
            "</li></ul><textarea>",
            "</textarea>",
            "",
        ];
        let root = parse(&segments);
        let found = holes(&root);
        let expected: Vec<usize> = (0..segments.len() - 1).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn visits_parents_before_children() {
        let root = parse(&["<a><b><c/></b></a><d/>"]);
        let mut names = Vec::new();
        for_each_element(&root, |element| names.push(element.name.clone()));
        assert_eq!(names, ["a", "b", "c", "d"]);
    }
}
