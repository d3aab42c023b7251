//! Path queries over an element tree: tag steps, `*`, `.`, `//` and bracket predicates.

use std::collections::HashSet;

use crate::error::Error;

use super::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    Any,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
    ChildTextEquals(String, String),
    TextEquals(String),
    Position(usize),
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Terminal {
    Text,
    Attribute(String),
}

#[derive(Debug)]
pub(super) struct ParsedPath {
    pub(super) absolute: bool,
    pub(super) steps: Vec<Step>,
    pub(super) terminal: Option<Terminal>,
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Node<'a> {
    /// The virtual node above the root element
    Document(&'a Element),
    Element(&'a Element),
}

impl<'a> Node<'a> {
    pub(super) fn element(self) -> Option<&'a Element> {
        match self {
            Node::Document(_) => None,
            Node::Element(el) => Some(el),
        }
    }

    fn children(self) -> Vec<&'a Element> {
        match self {
            Node::Document(root) => vec![root],
            Node::Element(el) => el.children.iter().collect(),
        }
    }

    fn descendants(self) -> Vec<&'a Element> {
        match self {
            Node::Document(root) => std::iter::once(root).chain(root.descendants()).collect(),
            Node::Element(el) => el.descendants(),
        }
    }
}

fn invalid_path(path: &str, reason: &str) -> Error {
    Error::InvalidArgument(format!("invalid path {path:?}: {reason}"))
}

pub(super) fn parse_path(path: &str) -> Result<ParsedPath, Error> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(invalid_path(path, "empty path"));
    }

    let absolute = trimmed.starts_with('/');
    let mut steps = Vec::new();
    let mut terminal = None;
    let mut rest = trimmed;
    let mut first = true;

    while !rest.is_empty() {
        let axis = if let Some(after) = rest.strip_prefix("//") {
            rest = after;
            Axis::Descendant
        } else if let Some(after) = rest.strip_prefix('/') {
            if first && !absolute {
                return Err(invalid_path(path, "unexpected '/'"));
            }
            rest = after;
            Axis::Child
        } else if first {
            Axis::Child
        } else {
            return Err(invalid_path(path, "expected '/' between steps"));
        };
        first = false;

        if terminal.is_some() {
            return Err(invalid_path(path, "text() and @attr must be the last step"));
        }

        let end = step_end(rest);
        let raw_step = &rest[..end];
        rest = &rest[end..];
        if raw_step.is_empty() {
            return Err(invalid_path(path, "empty step"));
        }

        if raw_step == "text()" || raw_step.starts_with('@') {
            if axis == Axis::Descendant {
                steps.push(Step {
                    axis,
                    test: NodeTest::Current,
                    predicates: Vec::new(),
                });
            }
            terminal = Some(match raw_step.strip_prefix('@') {
                Some(name) if !name.is_empty() => Terminal::Attribute(name.to_string()),
                Some(_) => return Err(invalid_path(path, "missing attribute name")),
                None => Terminal::Text,
            });
            continue;
        }

        steps.push(parse_step(path, raw_step, axis)?);
    }

    Ok(ParsedPath {
        absolute,
        steps,
        terminal,
    })
}

/// Index of the next step separator, ignoring slashes inside predicates and quotes.
fn step_end(rest: &str) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in rest.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => return idx,
            _ => {}
        }
    }
    rest.len()
}

fn parse_step(path: &str, raw: &str, axis: Axis) -> Result<Step, Error> {
    let (name, mut remainder) = match raw.find('[') {
        Some(idx) => (&raw[..idx], &raw[idx..]),
        None => (raw, ""),
    };

    let test = match name.trim() {
        "" => return Err(invalid_path(path, "step without a name")),
        "." => NodeTest::Current,
        "*" => NodeTest::Any,
        ".." => return Err(invalid_path(path, "parent steps are not supported")),
        other => NodeTest::Name(other.to_string()),
    };

    let mut predicates = Vec::new();
    while !remainder.is_empty() {
        let Some(inner) = remainder.strip_prefix('[') else {
            return Err(invalid_path(path, "expected '['"));
        };
        let close = predicate_end(inner).ok_or_else(|| invalid_path(path, "unclosed '['"))?;
        predicates.push(parse_predicate(path, inner[..close].trim())?);
        remainder = &inner[close + 1..];
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn predicate_end(inner: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in inner.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ']') => return Some(idx),
            _ => {}
        }
    }
    None
}

fn parse_predicate(path: &str, raw: &str) -> Result<Predicate, Error> {
    if raw == "last()" {
        return Ok(Predicate::Last);
    }
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return match raw.parse::<usize>() {
            Ok(position) if position > 0 => Ok(Predicate::Position(position)),
            _ => Err(invalid_path(path, "positions start at 1")),
        };
    }

    let (lhs, rhs) = match raw.split_once('=') {
        Some((lhs, rhs)) => (lhs.trim(), Some(unquote(path, rhs.trim())?)),
        None => (raw, None),
    };

    let predicate = match (lhs.strip_prefix('@'), rhs) {
        (Some(""), _) => return Err(invalid_path(path, "missing attribute name")),
        (Some(attr), None) => Predicate::HasAttribute(attr.to_string()),
        (Some(attr), Some(value)) => Predicate::AttributeEquals(attr.to_string(), value),
        (None, _) if lhs.is_empty() => return Err(invalid_path(path, "empty predicate")),
        (None, Some(value)) if lhs == "." => Predicate::TextEquals(value),
        (None, None) => Predicate::HasChild(lhs.to_string()),
        (None, Some(value)) => Predicate::ChildTextEquals(lhs.to_string(), value),
    };
    Ok(predicate)
}

fn unquote(path: &str, raw: &str) -> Result<String, Error> {
    let quoted = ['\'', '"']
        .iter()
        .find_map(|q| raw.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)));
    quoted
        .map(str::to_string)
        .ok_or_else(|| invalid_path(path, "predicate values must be quoted"))
}

/// Applies the steps in turn. Predicates see the candidates of one parent at a time, so `[1]` and `last()` on a
/// descendant step pick per parent rather than across the whole subtree.
pub(super) fn select<'a>(mut context: Vec<Node<'a>>, steps: &[Step]) -> Vec<Node<'a>> {
    for step in steps {
        let mut next: Vec<Node<'a>> = Vec::new();
        for node in &context {
            let selected = match (step.axis, &step.test) {
                (Axis::Child, NodeTest::Current) => apply_predicates(vec![*node], &step.predicates),
                (Axis::Descendant, NodeTest::Current) => node_and_descendants(*node)
                    .into_iter()
                    .flat_map(|candidate| apply_predicates(vec![candidate], &step.predicates))
                    .collect(),
                (Axis::Child, test) => apply_predicates(matching_children(*node, test), &step.predicates),
                (Axis::Descendant, test) => matching_descendants(*node, test, &step.predicates),
            };

            for selected in selected {
                if !next.iter().any(|seen| same_node(*seen, selected)) {
                    next.push(selected);
                }
            }
        }
        context = next;
    }
    context
}

fn matching_children<'a>(node: Node<'a>, test: &NodeTest) -> Vec<Node<'a>> {
    node.children()
        .into_iter()
        .filter(|el| matches_test(el, test))
        .map(Node::Element)
        .collect()
}

/// Descendants passing the test and the predicates, in document order.
fn matching_descendants<'a>(node: Node<'a>, test: &NodeTest, predicates: &[Predicate]) -> Vec<Node<'a>> {
    let kept: HashSet<*const Element> = node_and_descendants(node)
        .into_iter()
        .flat_map(|parent| apply_predicates(matching_children(parent, test), predicates))
        .filter_map(Node::element)
        .map(std::ptr::from_ref)
        .collect();

    node.descendants()
        .into_iter()
        .filter(|el| kept.contains(&std::ptr::from_ref(*el)))
        .map(Node::Element)
        .collect()
}

fn node_and_descendants(node: Node<'_>) -> Vec<Node<'_>> {
    std::iter::once(node)
        .chain(node.descendants().into_iter().map(Node::Element))
        .collect()
}

fn matches_test(el: &Element, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name) => el.tag == *name,
        NodeTest::Any => true,
        NodeTest::Current => true,
    }
}

fn apply_predicates<'a>(mut nodes: Vec<Node<'a>>, predicates: &[Predicate]) -> Vec<Node<'a>> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(position) => nodes.get(position - 1).copied().into_iter().collect(),
            Predicate::Last => nodes.last().copied().into_iter().collect(),
            other => nodes
                .into_iter()
                .filter(|node| node.element().is_some_and(|el| matches_predicate(el, other)))
                .collect(),
        };
    }
    nodes
}

fn matches_predicate(el: &Element, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::HasAttribute(name) => el.attributes.contains_key(name),
        Predicate::AttributeEquals(name, value) => el.attribute(name) == Some(value.as_str()),
        Predicate::HasChild(tag) => el.children.iter().any(|c| c.tag == *tag),
        Predicate::ChildTextEquals(tag, value) => el
            .children
            .iter()
            .any(|c| c.tag == *tag && c.text_content() == *value),
        Predicate::TextEquals(value) => el.text_content() == *value,
        Predicate::Position(_) | Predicate::Last => true,
    }
}

fn same_node(a: Node<'_>, b: Node<'_>) -> bool {
    match (a, b) {
        (Node::Document(x), Node::Document(y)) | (Node::Element(x), Node::Element(y)) => {
            std::ptr::eq(x, y)
        }
        _ => false,
    }
}
