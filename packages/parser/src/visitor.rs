use crate::ast::*;

/// Visitor pattern for traversing a document immutably
///
/// Default implementations walk every node in order. Override the
/// `visit_*` methods you care about.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_text(&mut self, _run: &TextRun) {
        // Leaf node, no children to walk
    }

    fn visit_placeholder(&mut self, _node: &PlaceholderNode) {
        // Leaf node, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for node in &doc.nodes {
        match node {
            Node::Text(run) => visitor.visit_text(run),
            Node::Placeholder(p) => visitor.visit_placeholder(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TypeCollector(Vec<String>);

    impl Visitor for TypeCollector {
        fn visit_placeholder(&mut self, node: &PlaceholderNode) {
            self.0.push(node.component_type.clone());
        }
    }

    fn doc() -> Document {
        Document::from_nodes(vec![
            Node::text("hi "),
            Node::Placeholder(PlaceholderNode::new("1", "emoji", RawValue::Set("a".into()))),
            Node::Placeholder(PlaceholderNode::new("2", "nickname", RawValue::Unset)),
        ])
    }

    #[test]
    fn test_visitor_order() {
        let mut collector = TypeCollector(Vec::new());
        collector.visit_document(&doc());
        assert_eq!(collector.0, vec!["emoji", "nickname"]);
    }
}
