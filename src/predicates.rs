//! ## Sibling and Descendant Predicates
//! Guards for [ScheduleNodeMatcher] that themselves run a matcher against the siblings or the
//! descendants of the guarded node. They are meant to be passed to the `*_if` builders of
//! [node_matcher](crate::node_matcher):
//!
//! ```
//! use pmlib::node_matcher::{band, filter_if, leaf};
//! use pmlib::predicates::has_next_sibling;
//!
//! let m = filter_if(has_next_sibling(band(leaf())), leaf());
//! ```
//!
//! Captures made by the inner matcher are not visible to the outer match.

use crate::{node_matcher::ScheduleNodeMatcher, schedule_tree::ScheduleNode};

fn siblings_before(node: ScheduleNode<'_>) -> Vec<ScheduleNode<'_>> {
    match (node.parent(), node.child_position()) {
        (Some(parent), Some(pos)) => parent.children().take(pos).collect(),
        _ => Vec::new(),
    }
}

fn siblings_after(node: ScheduleNode<'_>) -> Vec<ScheduleNode<'_>> {
    match (node.parent(), node.child_position()) {
        (Some(parent), Some(pos)) => parent.children().skip(pos + 1).collect(),
        _ => Vec::new(),
    }
}

/// Holds if any sibling preceding the node matches `sibling_matcher`.
pub fn has_previous_sibling(
    sibling_matcher: ScheduleNodeMatcher,
) -> impl Fn(ScheduleNode<'_>) -> bool + 'static {
    move |node: ScheduleNode<'_>| {
        siblings_before(node)
            .into_iter()
            .any(|sibling| ScheduleNodeMatcher::is_matching(&sibling_matcher, sibling))
    }
}

/// Holds if any sibling following the node matches `sibling_matcher`.
pub fn has_next_sibling(
    sibling_matcher: ScheduleNodeMatcher,
) -> impl Fn(ScheduleNode<'_>) -> bool + 'static {
    move |node: ScheduleNode<'_>| {
        siblings_after(node)
            .into_iter()
            .any(|sibling| ScheduleNodeMatcher::is_matching(&sibling_matcher, sibling))
    }
}

/// Holds if any sibling, preceding or following, matches `sibling_matcher`.
pub fn has_sibling(
    sibling_matcher: ScheduleNodeMatcher,
) -> impl Fn(ScheduleNode<'_>) -> bool + 'static {
    let previous = has_previous_sibling(sibling_matcher.clone());
    let next = has_next_sibling(sibling_matcher);
    move |node: ScheduleNode<'_>| previous(node) || next(node)
}

/// Holds if any node strictly below the node matches `descendant_matcher`.
pub fn has_descendant(
    descendant_matcher: ScheduleNodeMatcher,
) -> impl Fn(ScheduleNode<'_>) -> bool + 'static {
    move |node: ScheduleNode<'_>| {
        node.descendants()
            .any(|descendant| ScheduleNodeMatcher::is_matching(&descendant_matcher, descendant))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        node_matcher::{ScheduleNodeMatcher, band, domain, filter, filter_if, leaf, mark, sequence},
        schedule_tree::{NodeId, ScheduleNodeType, ScheduleTree},
    };

    use super::{has_descendant, has_next_sibling, has_previous_sibling, has_sibling};

    /// `domain -> sequence(filter S1 -> band -> leaf, filter S2 -> leaf, filter S3 -> mark -> leaf)`
    fn three_statements() -> (ScheduleTree, Vec<NodeId>) {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Domain);
        let seq = tree.add_child(tree.root_id(), ScheduleNodeType::Sequence);
        let f1 = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S1");
        let b = tree.add_child(f1, ScheduleNodeType::Band);
        tree.add_child(b, ScheduleNodeType::Leaf);
        let f2 = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S2");
        tree.add_child(f2, ScheduleNodeType::Leaf);
        let f3 = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S3");
        let m = tree.add_annotated_child(f3, ScheduleNodeType::Mark, "kernel");
        tree.add_child(m, ScheduleNodeType::Leaf);
        (tree, vec![f1, f2, f3])
    }

    #[test]
    fn previous_and_next_test() {
        let (tree, filters) = three_statements();
        let banded = filter(band(leaf()));
        let marked = filter(mark(leaf()));
        let prev_band = has_previous_sibling(banded.clone());
        let next_band = has_next_sibling(banded);
        let next_mark = has_next_sibling(marked.clone());
        let prev_mark = has_previous_sibling(marked);

        let f1 = tree.node(filters[0]);
        let f2 = tree.node(filters[1]);
        let f3 = tree.node(filters[2]);
        assert!(!prev_band(f1));
        assert!(!next_band(f1));
        assert!(prev_band(f2));
        assert!(next_mark(f2));
        assert!(prev_band(f3));
        assert!(!next_mark(f3));
        assert!(!prev_mark(f3));
        assert!(next_mark(f1));
    }

    #[test]
    fn sibling_is_or_test() {
        let (tree, filters) = three_statements();
        let target = filter(band(leaf()));
        let prev = has_previous_sibling(target.clone());
        let next = has_next_sibling(target.clone());
        let either = has_sibling(target);
        for id in filters {
            let node = tree.node(id);
            assert_eq!(either(node), prev(node) || next(node));
        }
    }

    #[test]
    fn no_siblings_test() {
        let (tree, filters) = three_statements();
        let root = tree.root();
        let only_child = tree.node(filters[0]).child(0);
        let anything = crate::node_matcher::any();
        for node in [root, only_child] {
            assert!(!has_previous_sibling(anything.clone())(node));
            assert!(!has_next_sibling(anything.clone())(node));
            assert!(!has_sibling(anything.clone())(node));
        }
    }

    #[test]
    fn descendant_test() {
        let (tree, filters) = three_statements();
        let has_mark = has_descendant(mark(leaf()));
        assert!(has_mark(tree.root()));
        assert!(!has_mark(tree.node(filters[0])));
        assert!(has_mark(tree.node(filters[2])));

        let mark_node = tree.node(filters[2]).child(0);
        assert!(!has_mark(mark_node));
    }

    #[test]
    fn predicate_as_guard_test() {
        let (tree, _) = three_statements();
        let m = domain(sequence(vec![
            filter_if(has_next_sibling(filter(mark(leaf()))), band(leaf())),
            filter(leaf()),
            filter(mark(leaf())),
        ]));
        assert!(ScheduleNodeMatcher::is_matching(&m, tree.root()));

        let m = domain(sequence(vec![
            filter_if(has_previous_sibling(filter(leaf())), band(leaf())),
            filter(leaf()),
            filter(mark(leaf())),
        ]));
        assert!(!ScheduleNodeMatcher::is_matching(&m, tree.root()));
    }
}
