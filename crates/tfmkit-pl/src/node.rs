use tfmkit_num::{NumValue, PrefixKind};

/// A node in a property-list tree (§9 "Cyclic/recursive trees").
///
/// A cooked number shadows the original token it was parsed from in
/// `literal`, so that re-emitting an unchanged value is byte-exact;
/// any mutation through [`Node::set_value`] clears it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A symbolic identifier, e.g. `CHARWD`.
    Bareword(String),
    /// A string atom not yet interpreted as a number.
    Raw(String),
    /// A typed numeric atom.
    Cooked {
        value: NumValue,
        prefix: PrefixKind,
        literal: Option<String>,
    },
    /// A nested list; by convention its first element is a [`Node::Bareword`].
    List(Vec<Node>),
}

impl Node {
    /// Construct a cooked number with no preserved literal.
    pub fn cooked(prefix: PrefixKind, value: NumValue) -> Self {
        Node::Cooked { value, prefix, literal: None }
    }

    /// Construct a cooked number carrying its original source token.
    pub fn cooked_with_literal(prefix: PrefixKind, value: NumValue, literal: impl Into<String>) -> Self {
        Node::Cooked { value, prefix, literal: Some(literal.into()) }
    }

    /// The head symbol of a list node, if this is a non-empty list
    /// headed by a bareword.
    pub fn head(&self) -> Option<&str> {
        match self {
            Node::List(items) => match items.first() {
                Some(Node::Bareword(s)) => Some(s.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The list's remaining elements (everything after the head).
    pub fn args(&self) -> &[Node] {
        match self {
            Node::List(items) if !items.is_empty() => &items[1..],
            Node::List(_) => &[],
            _ => &[],
        }
    }

    /// Replace a cooked number's value in place, clearing its literal
    /// (§3 invariant: "mutation clears the token").
    pub fn set_value(&mut self, new_value: NumValue) {
        if let Node::Cooked { value, literal, .. } = self {
            *value = new_value;
            *literal = None;
        }
    }

    /// The numeric value of a cooked atom, widened to `i64`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Cooked { value, .. } => Some(value.as_i64()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Find the first sub-list directly under this list whose head
    /// matches `head`.
    pub fn find(&self, head: &str) -> Option<&Node> {
        self.as_list()?.iter().find(|n| n.head() == Some(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_and_args() {
        let list = Node::List(vec![
            Node::Bareword("CHARWD".into()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(1 << 20)),
        ]);
        assert_eq!(list.head(), Some("CHARWD"));
        assert_eq!(list.args().len(), 1);
    }

    #[test]
    fn mutation_clears_literal() {
        let mut n = Node::cooked_with_literal(PrefixKind::D, NumValue::Int(5), "5");
        n.set_value(NumValue::Int(6));
        match n {
            Node::Cooked { value, literal, .. } => {
                assert_eq!(value, NumValue::Int(6));
                assert_eq!(literal, None);
            }
            _ => panic!("not cooked"),
        }
    }
}
