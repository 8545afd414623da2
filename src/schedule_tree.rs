//! ## Schedule Trees
//! This module contains an arena based representation of polyhedral schedule trees. The key
//! exported data structures are:
//! - [ScheduleNodeType] the closed set of node kinds, including the pattern-only wildcard `Any`
//! - [ScheduleTree] the arena owning all nodes of one tree
//! - [ScheduleNode] a cheap, copyable handle to a node inside a [ScheduleTree] that allows
//!   navigating to children, the parent and the whole subtree.

use std::fmt;

/// The type of a schedule tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleNodeType {
    Band,
    Context,
    Domain,
    Extension,
    Filter,
    Guard,
    Mark,
    Leaf,
    Sequence,
    Set,
    /// Wildcard that only occurs in matchers, never in concrete trees.
    Any,
}

impl ScheduleNodeType {
    /// Check whether a node of this type may have more than one child.
    pub fn is_variadic(&self) -> bool {
        matches!(self, ScheduleNodeType::Sequence | ScheduleNodeType::Set)
    }

    fn name(&self) -> &'static str {
        match self {
            ScheduleNodeType::Band => "band",
            ScheduleNodeType::Context => "context",
            ScheduleNodeType::Domain => "domain",
            ScheduleNodeType::Extension => "extension",
            ScheduleNodeType::Filter => "filter",
            ScheduleNodeType::Guard => "guard",
            ScheduleNodeType::Mark => "mark",
            ScheduleNodeType::Leaf => "leaf",
            ScheduleNodeType::Sequence => "sequence",
            ScheduleNodeType::Set => "set",
            ScheduleNodeType::Any => "any",
        }
    }

    /// Parse the lowercase name of a concrete node type, `any` is rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "band" => ScheduleNodeType::Band,
            "context" => ScheduleNodeType::Context,
            "domain" => ScheduleNodeType::Domain,
            "extension" => ScheduleNodeType::Extension,
            "filter" => ScheduleNodeType::Filter,
            "guard" => ScheduleNodeType::Guard,
            "mark" => ScheduleNodeType::Mark,
            "leaf" => ScheduleNodeType::Leaf,
            "sequence" => ScheduleNodeType::Sequence,
            "set" => ScheduleNodeType::Set,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ScheduleNodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

#[derive(Debug)]
struct NodeData {
    node_type: ScheduleNodeType,
    annotation: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A concrete schedule tree, all nodes are owned by the tree and addressed through [NodeId].
#[derive(Debug)]
pub struct ScheduleTree {
    nodes: Vec<NodeData>,
}

impl ScheduleTree {
    /// Create a tree consisting only of a root node of type `root_type`.
    pub fn new(root_type: ScheduleNodeType) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.push_node(root_type, None, None);
        tree
    }

    /// Create a tree whose root carries `annotation`.
    pub fn with_annotation(root_type: ScheduleNodeType, annotation: impl Into<String>) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.push_node(root_type, Some(annotation.into()), None);
        tree
    }

    fn push_node(
        &mut self,
        node_type: ScheduleNodeType,
        annotation: Option<String>,
        parent: Option<NodeId>,
    ) -> NodeId {
        assert!(
            node_type != ScheduleNodeType::Any,
            "Concrete schedule trees cannot contain wildcard nodes"
        );
        let id = NodeId(self.nodes.len().try_into().unwrap());
        self.nodes.push(NodeData {
            node_type,
            annotation,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> ScheduleNode<'_> {
        self.node(self.root_id())
    }

    pub fn node(&self, id: NodeId) -> ScheduleNode<'_> {
        assert!((id.0 as usize) < self.nodes.len(), "Node id not part of this tree");
        ScheduleNode { tree: self, id }
    }

    /// Append a new child of type `node_type` to `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, node_type: ScheduleNodeType) -> NodeId {
        self.add_child_inner(parent, node_type, None)
    }

    /// Append a new annotated child (e.g. a mark id or the statements of a filter) to `parent`.
    pub fn add_annotated_child(
        &mut self,
        parent: NodeId,
        node_type: ScheduleNodeType,
        annotation: impl Into<String>,
    ) -> NodeId {
        self.add_child_inner(parent, node_type, Some(annotation.into()))
    }

    fn add_child_inner(
        &mut self,
        parent: NodeId,
        node_type: ScheduleNodeType,
        annotation: Option<String>,
    ) -> NodeId {
        let parent_data = &self.nodes[parent.0 as usize];
        match parent_data.node_type {
            ScheduleNodeType::Leaf => panic!("Leaf nodes cannot have children"),
            ty if !ty.is_variadic() && !parent_data.children.is_empty() => {
                panic!("{} nodes have exactly one child", ty)
            }
            _ => {}
        }
        let id = self.push_node(node_type, annotation, Some(parent));
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// The overall amount of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A handle to a node inside of a [ScheduleTree].
#[derive(Clone, Copy)]
pub struct ScheduleNode<'a> {
    tree: &'a ScheduleTree,
    id: NodeId,
}

impl<'a> ScheduleNode<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id.0 as usize]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a ScheduleTree {
        self.tree
    }

    pub fn node_type(&self) -> ScheduleNodeType {
        self.data().node_type
    }

    pub fn annotation(&self) -> Option<&'a str> {
        self.data().annotation.as_deref()
    }

    pub fn n_children(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, pos: usize) -> ScheduleNode<'a> {
        self.tree.node(self.data().children[pos])
    }

    pub fn children(self) -> impl Iterator<Item = ScheduleNode<'a>> {
        let tree = self.tree;
        self.data().children.iter().map(move |id| tree.node(*id))
    }

    pub fn has_parent(&self) -> bool {
        self.data().parent.is_some()
    }

    pub fn parent(&self) -> Option<ScheduleNode<'a>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    /// The position of this node among the children of its parent, `None` for the root.
    pub fn child_position(&self) -> Option<usize> {
        let parent = self.data().parent?;
        self.tree.nodes[parent.0 as usize]
            .children
            .iter()
            .position(|id| *id == self.id)
    }

    /// Iterate over all nodes strictly below this one in pre-order.
    pub fn descendants(&self) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.data().children.clone();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }
}

impl PartialEq for ScheduleNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for ScheduleNode<'_> {}

impl fmt::Debug for ScheduleNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleNode")
            .field("id", &self.id)
            .field("type", &self.node_type())
            .field("annotation", &self.annotation())
            .finish()
    }
}

/// Pre-order iterator over the strict descendants of a [ScheduleNode].
pub struct Descendants<'a> {
    tree: &'a ScheduleTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = ScheduleNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let data = &self.tree.nodes[id.0 as usize];
        self.stack.extend(data.children.iter().rev());
        Some(self.tree.node(id))
    }
}

#[cfg(test)]
mod test {
    use super::{ScheduleNodeType, ScheduleTree};

    #[test]
    fn navigation_test() {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Domain);
        let seq = tree.add_child(tree.root_id(), ScheduleNodeType::Sequence);
        let f1 = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S1");
        let l1 = tree.add_child(f1, ScheduleNodeType::Leaf);
        let f2 = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S2");
        let l2 = tree.add_child(f2, ScheduleNodeType::Leaf);

        let root = tree.root();
        assert_eq!(tree.len(), 6);
        assert!(!root.has_parent());
        assert_eq!(root.child_position(), None);
        assert_eq!(root.n_children(), 1);

        let seq_node = tree.node(seq);
        assert_eq!(seq_node.n_children(), 2);
        assert_eq!(seq_node.child(1).annotation(), Some("S2"));
        assert_eq!(tree.node(f2).child_position(), Some(1));
        assert_eq!(tree.node(l1).parent(), Some(tree.node(f1)));

        let order: Vec<_> = root.descendants().map(|n| n.id()).collect();
        assert_eq!(order, vec![seq, f1, l1, f2, l2]);
        assert_eq!(tree.node(l2).descendants().count(), 0);
    }

    #[test]
    #[should_panic]
    fn leaf_has_no_children_test() {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Leaf);
        tree.add_child(tree.root_id(), ScheduleNodeType::Leaf);
    }

    #[test]
    #[should_panic]
    fn single_child_test() {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Band);
        tree.add_child(tree.root_id(), ScheduleNodeType::Leaf);
        tree.add_child(tree.root_id(), ScheduleNodeType::Leaf);
    }

    #[test]
    #[should_panic]
    fn no_wildcard_test() {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Domain);
        tree.add_child(tree.root_id(), ScheduleNodeType::Any);
    }

    #[test]
    fn type_names_test() {
        assert_eq!(
            ScheduleNodeType::from_name("sequence"),
            Some(ScheduleNodeType::Sequence)
        );
        assert_eq!(ScheduleNodeType::from_name("any"), None);
        assert_eq!(ScheduleNodeType::Extension.to_string(), "extension");
        assert!(ScheduleNodeType::Set.is_variadic());
        assert!(!ScheduleNodeType::Filter.is_variadic());
    }
}
