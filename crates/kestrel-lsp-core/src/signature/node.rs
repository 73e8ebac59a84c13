//! Confirms that a scanned call start is backed by a call-like syntax node

/// Kind of the syntax node found at an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A call expression; `arguments` is `None` when the parser could not count them
    Call { arguments: Option<usize> },
    /// A member reference inside documentation, such as `#resize(int, int)`
    MemberRef { parameters: usize },
    /// A braced block or statement list
    Block,
    Other,
}

/// A node accepted as the target of signature help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallNode {
    Call { arguments: Option<usize> },
    MemberRef { parameters: usize },
    /// Incomplete call text the parser recovered as a block
    Block,
}

impl CallNode {
    /// Number of arguments already present at the call site, if known
    pub fn argument_count(&self) -> Option<usize> {
        match self {
            CallNode::Call { arguments } => *arguments,
            CallNode::MemberRef { parameters } => Some(*parameters),
            CallNode::Block => None,
        }
    }
}

/// A parsed document that can be probed by offset
pub trait SyntaxTree: Send + Sync {
    /// Smallest node covering the range `offset..offset + length`
    fn covering_node(&self, offset: usize, length: usize) -> Option<NodeKind>;
}

/// Check the node at `call_start` and return it when it can carry a signature.
pub fn validate(tree: &dyn SyntaxTree, call_start: usize, parameter_index: i32) -> Option<CallNode> {
    match tree.covering_node(call_start, 0)? {
        NodeKind::Call { arguments } => Some(CallNode::Call { arguments }),
        NodeKind::MemberRef { parameters } => Some(CallNode::MemberRef { parameters }),
        // A block is only trusted once a comma has been seen
        NodeKind::Block if parameter_index > 0 => Some(CallNode::Block),
        NodeKind::Block | NodeKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FixedTree {
        kind: Option<NodeKind>,
        probe: Mutex<Option<(usize, usize)>>,
    }

    impl FixedTree {
        fn new(kind: Option<NodeKind>) -> Self {
            Self {
                kind,
                probe: Mutex::new(None),
            }
        }
    }

    impl SyntaxTree for FixedTree {
        fn covering_node(&self, offset: usize, length: usize) -> Option<NodeKind> {
            *self.probe.lock() = Some((offset, length));
            self.kind
        }
    }

    #[test]
    fn test_call_is_accepted() {
        let tree = FixedTree::new(Some(NodeKind::Call { arguments: Some(2) }));
        assert_eq!(
            validate(&tree, 7, 0),
            Some(CallNode::Call { arguments: Some(2) })
        );
        assert_eq!(*tree.probe.lock(), Some((7, 0)));
    }

    #[test]
    fn test_member_ref_is_accepted() {
        let tree = FixedTree::new(Some(NodeKind::MemberRef { parameters: 1 }));
        assert_eq!(
            validate(&tree, 3, -1),
            Some(CallNode::MemberRef { parameters: 1 })
        );
    }

    #[test]
    fn test_block_requires_a_seen_comma() {
        let tree = FixedTree::new(Some(NodeKind::Block));
        assert_eq!(validate(&tree, 3, 0), None);
        assert_eq!(validate(&tree, 3, 1), Some(CallNode::Block));
    }

    #[test]
    fn test_other_nodes_are_rejected() {
        let tree = FixedTree::new(Some(NodeKind::Other));
        assert_eq!(validate(&tree, 3, 4), None);
        let empty = FixedTree::new(None);
        assert_eq!(validate(&empty, 3, 4), None);
    }

    #[test]
    fn test_argument_count() {
        assert_eq!(CallNode::Call { arguments: None }.argument_count(), None);
        assert_eq!(CallNode::MemberRef { parameters: 3 }.argument_count(), Some(3));
        assert_eq!(CallNode::Block.argument_count(), None);
    }
}
