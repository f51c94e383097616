use crate::Document;

/// A pre-order tree traverser for a [Document](crate::Document)
#[derive(Clone)]
pub struct TreeTraverser<'a> {
    doc: &'a Document,
    stack: Vec<usize>,
}

impl<'a> TreeTraverser<'a> {
    /// Creates a new tree traverser for the given document which starts at the root node
    pub fn new(doc: &'a Document) -> Self {
        Self::new_with_root(doc, 0)
    }

    /// Creates a new tree traverser for the given document which starts at the specified node
    pub fn new_with_root(doc: &'a Document, root: usize) -> Self {
        let mut stack = Vec::with_capacity(32);
        stack.push(root);
        TreeTraverser { doc, stack }
    }
}

impl Iterator for TreeTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.doc.get_node(id)?;
        self.stack.extend(node.children.iter().rev());
        Some(id)
    }
}

/// An ancestor traverser for a [Document](crate::Document). Yields the
/// parent chain of the starting node, exclusive of the node itself.
#[derive(Clone)]
pub struct AncestorTraverser<'a> {
    doc: &'a Document,
    current: usize,
}

impl<'a> AncestorTraverser<'a> {
    /// Creates a new ancestor traverser for the given document and node ID
    pub fn new(doc: &'a Document, node_id: usize) -> Self {
        AncestorTraverser {
            doc,
            current: node_id,
        }
    }
}

impl Iterator for AncestorTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let current_node = self.doc.get_node(self.current)?;
        self.current = current_node.parent?;
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentConfig, qual_name};

    fn sample_doc() -> (Document, [usize; 4]) {
        let mut doc = Document::new(DocumentConfig::default());
        let outer = doc.create_element(qual_name!("div"), vec![]);
        let first = doc.create_element(qual_name!("span"), vec![]);
        let second = doc.create_element(qual_name!("span"), vec![]);
        let inner = doc.create_element(qual_name!("a"), vec![]);
        doc.append(0, &[outer]);
        doc.append(outer, &[first, second]);
        doc.append(second, &[inner]);
        (doc, [outer, first, second, inner])
    }

    #[test]
    fn tree_traversal_is_preorder() {
        let (doc, [outer, first, second, inner]) = sample_doc();
        let order: Vec<usize> = TreeTraverser::new(&doc).collect();
        assert_eq!(order, vec![0, outer, first, second, inner]);
    }

    #[test]
    fn subtree_traversal_starts_at_root() {
        let (doc, [_, _, second, inner]) = sample_doc();
        let order: Vec<usize> = TreeTraverser::new_with_root(&doc, second).collect();
        assert_eq!(order, vec![second, inner]);
    }

    #[test]
    fn ancestor_traversal_excludes_self() {
        let (doc, [outer, _, second, inner]) = sample_doc();
        let chain: Vec<usize> = AncestorTraverser::new(&doc, inner).collect();
        assert_eq!(chain, vec![second, outer, 0]);
    }
}
