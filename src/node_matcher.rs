//! ## Structural Schedule Tree Matchers
//! This module contains structural matchers on schedule trees. A [ScheduleNodeMatcher] is a tree
//! itself where every node is assigned a [ScheduleNodeType]. It can be compared against a subtree
//! of a concrete [ScheduleTree](crate::schedule_tree::ScheduleTree) to determine whether it has
//! the same node types and parent/child relationships. Matchers are built through nested calls to
//! the builder functions of this module, for example
//!
//! ```
//! use pmlib::node_matcher::{context, domain, filter, leaf, sequence};
//!
//! let m = domain(context(sequence(vec![filter(leaf()), filter(leaf())])));
//! ```
//!
//! matches a subtree that starts at a domain node, having a context as its only child, which in
//! turn has a sequence as its only child with two filters below it. The matcher is not anchored at
//! any position of the tree and a matcher node without children accepts a concrete node with an
//! arbitrary amount of children.
//!
//! Every builder comes in three flavours:
//! - `band(child)` the plain structural matcher
//! - `band_if(pred, child)` additionally runs `pred` on the concrete node before its children are
//!   looked at, if it returns `false` the match fails immediately
//! - `band_capture(&capture, child)` binds the concrete node to `capture` in the resulting [Match]
//!
//! Only [sequence] and [set] take a list of children, all other builders take exactly one child
//! except for the terminal [leaf], [any] and [any_capture].

use std::{fmt, rc::Rc};

use log::debug;
use rustc_hash::FxHashMap;

use crate::schedule_tree::{ScheduleNode, ScheduleNodeType};

/// A predicate on concrete schedule tree nodes, used to guard matchers.
pub type NodePredicate = Rc<dyn Fn(ScheduleNode<'_>) -> bool>;

/// A caller chosen name that a matcher binds the concrete node it matched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capture(Rc<str>);

impl Capture {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn get_name(&self) -> &str {
        &self.0
    }
}

/// The bindings produced by a successful match.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    captures: FxHashMap<Capture, ScheduleNode<'a>>,
}

impl<'a> Match<'a> {
    /// Obtain the node bound to `capture`, `None` if the capture is not part of the matcher.
    pub fn get(&self, capture: &Capture) -> Option<ScheduleNode<'a>> {
        self.captures.get(capture).copied()
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Capture, &ScheduleNode<'a>)> {
        self.captures.iter()
    }
}

/// Node type matcher for schedule trees, see the module documentation.
#[derive(Clone)]
pub struct ScheduleNodeMatcher {
    current: ScheduleNodeType,
    children: Vec<ScheduleNodeMatcher>,
    node_callback: Option<NodePredicate>,
    capture: Option<Capture>,
}

impl ScheduleNodeMatcher {
    fn new(
        current: ScheduleNodeType,
        children: Vec<ScheduleNodeMatcher>,
        node_callback: Option<NodePredicate>,
        capture: Option<Capture>,
    ) -> Self {
        Self {
            current,
            children,
            node_callback,
            capture,
        }
    }

    pub fn get_type(&self) -> ScheduleNodeType {
        self.current
    }

    pub fn get_children(&self) -> &[ScheduleNodeMatcher] {
        &self.children
    }

    pub fn has_guard(&self) -> bool {
        self.node_callback.is_some()
    }

    pub fn get_capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    /// Check whether the subtree rooted at `node` has the structure described by `matcher`.
    pub fn is_matching(matcher: &ScheduleNodeMatcher, node: ScheduleNode<'_>) -> bool {
        let mut captures = FxHashMap::default();
        matcher.match_into(node, &mut captures)
    }

    /// Match the subtree rooted at `node` and return the captured nodes on success.
    pub fn match_node<'a>(&self, node: ScheduleNode<'a>) -> Option<Match<'a>> {
        let mut captures = FxHashMap::default();
        if self.match_into(node, &mut captures) {
            Some(Match { captures })
        } else {
            None
        }
    }

    fn match_into<'a>(
        &self,
        node: ScheduleNode<'a>,
        captures: &mut FxHashMap<Capture, ScheduleNode<'a>>,
    ) -> bool {
        if self.current != ScheduleNodeType::Any && self.current != node.node_type() {
            debug!(
                "Type mismatch: expected {} but found {}",
                self.current,
                node.node_type()
            );
            return false;
        }

        if let Some(callback) = &self.node_callback {
            if !callback(node) {
                debug!("Guard rejected {} node", node.node_type());
                return false;
            }
        }

        if !self.children.is_empty() {
            if self.children.len() != node.n_children() {
                debug!(
                    "Child count mismatch at {}: expected {} but found {}",
                    node.node_type(),
                    self.children.len(),
                    node.n_children()
                );
                return false;
            }

            let all_children = self
                .children
                .iter()
                .zip(node.children())
                .all(|(child_matcher, child)| child_matcher.match_into(child, captures));
            if !all_children {
                return false;
            }
        }

        if let Some(capture) = &self.capture {
            captures.insert(capture.clone(), node);
        }
        true
    }
}

impl fmt::Debug for ScheduleNodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleNodeMatcher")
            .field("current", &self.current)
            .field("children", &self.children)
            .field("guarded", &self.node_callback.is_some())
            .field("capture", &self.capture)
            .finish()
    }
}

macro_rules! single_child_builders {
    ($($ty:ident => $plain:ident, $guarded:ident, $captured:ident;)*) => {
        $(
            #[doc = concat!("Match a `", stringify!($plain), "` node whose only child matches `child`.")]
            pub fn $plain(child: ScheduleNodeMatcher) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(ScheduleNodeType::$ty, vec![child], None, None)
            }

            #[doc = concat!("Like [", stringify!($plain), "] but `pred` has to hold on the node first.")]
            pub fn $guarded(
                pred: impl Fn(ScheduleNode<'_>) -> bool + 'static,
                child: ScheduleNodeMatcher,
            ) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(ScheduleNodeType::$ty, vec![child], Some(Rc::new(pred)), None)
            }

            #[doc = concat!("Like [", stringify!($plain), "] but binds the node to `capture`.")]
            pub fn $captured(capture: &Capture, child: ScheduleNodeMatcher) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(
                    ScheduleNodeType::$ty,
                    vec![child],
                    None,
                    Some(capture.clone()),
                )
            }
        )*
    };
}

single_child_builders! {
    Band => band, band_if, band_capture;
    Context => context, context_if, context_capture;
    Domain => domain, domain_if, domain_capture;
    Extension => extension, extension_if, extension_capture;
    Filter => filter, filter_if, filter_capture;
    Guard => guard, guard_if, guard_capture;
    Mark => mark, mark_if, mark_capture;
}

macro_rules! multi_child_builders {
    ($($ty:ident => $plain:ident, $guarded:ident, $captured:ident;)*) => {
        $(
            #[doc = concat!("Match a `", stringify!($plain), "` node whose children match `children` pairwise.")]
            #[doc = ""]
            #[doc = "An empty `children` accepts any amount of children."]
            pub fn $plain(children: Vec<ScheduleNodeMatcher>) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(ScheduleNodeType::$ty, children, None, None)
            }

            #[doc = concat!("Like [", stringify!($plain), "] but `pred` has to hold on the node first.")]
            pub fn $guarded(
                pred: impl Fn(ScheduleNode<'_>) -> bool + 'static,
                children: Vec<ScheduleNodeMatcher>,
            ) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(ScheduleNodeType::$ty, children, Some(Rc::new(pred)), None)
            }

            #[doc = concat!("Like [", stringify!($plain), "] but binds the node to `capture`.")]
            pub fn $captured(
                capture: &Capture,
                children: Vec<ScheduleNodeMatcher>,
            ) -> ScheduleNodeMatcher {
                ScheduleNodeMatcher::new(ScheduleNodeType::$ty, children, None, Some(capture.clone()))
            }
        )*
    };
}

multi_child_builders! {
    Sequence => sequence, sequence_if, sequence_capture;
    Set => set, set_if, set_capture;
}

/// Match a leaf node.
pub fn leaf() -> ScheduleNodeMatcher {
    ScheduleNodeMatcher::new(ScheduleNodeType::Leaf, Vec::new(), None, None)
}

/// Match any node, regardless of its type and children.
pub fn any() -> ScheduleNodeMatcher {
    ScheduleNodeMatcher::new(ScheduleNodeType::Any, Vec::new(), None, None)
}

/// Match any node and bind it to `capture`.
pub fn any_capture(capture: &Capture) -> ScheduleNodeMatcher {
    ScheduleNodeMatcher::new(ScheduleNodeType::Any, Vec::new(), None, Some(capture.clone()))
}
