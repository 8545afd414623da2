//! ## Pretty Printing
//! This module contains the [PrettyPrint] trait which is implemented for the matchers, constraints
//! and schedule trees of this crate to produce textual dumps for debugging.

use crate::{
    constraints::{Constraint, ConstraintsList},
    node_matcher::ScheduleNodeMatcher,
    relation_matcher::RelationMatcher,
    schedule_tree::ScheduleNode,
};

/// Types that can be rendered into a textual dump.
pub trait PrettyPrint {
    /// Print the representation of `self` into `acc`.
    fn print_into(&self, acc: &mut String);
}

/// Pretty print some value that implements [PrettyPrint] to a string.
pub fn pretty_print<T: PrettyPrint + ?Sized>(t: &T) -> String {
    let mut acc = String::new();
    t.print_into(&mut acc);
    acc
}

fn print_node_into_aux(node: ScheduleNode<'_>, depth: usize, acc: &mut String) {
    for _ in 0..depth {
        acc.push_str("  ");
    }
    acc.push_str(&node.node_type().to_string());
    if let Some(annotation) = node.annotation() {
        acc.push(' ');
        acc.push_str(annotation);
    }
    acc.push('\n');
    for child in node.children() {
        print_node_into_aux(child, depth + 1, acc);
    }
}

/// Renders the subtree in the indented format also accepted by [crate::scop].
impl PrettyPrint for ScheduleNode<'_> {
    fn print_into(&self, acc: &mut String) {
        print_node_into_aux(*self, 0, acc);
    }
}

/// Renders the nested builder syntax, guarded nodes are marked with `?` and captures with `@name`,
/// e.g. `domain(sequence@seq(filter?(leaf()), any()))`.
impl PrettyPrint for ScheduleNodeMatcher {
    fn print_into(&self, acc: &mut String) {
        acc.push_str(&self.get_type().to_string());
        if self.has_guard() {
            acc.push('?');
        }
        if let Some(capture) = self.get_capture() {
            acc.push('@');
            acc.push_str(capture.get_name());
        }
        acc.push('(');
        let children = self.get_children();
        for (idx, child) in children.iter().enumerate() {
            if idx > 0 {
                acc.push_str(", ");
            }
            child.print_into(acc);
        }
        acc.push(')');
    }
}

impl PrettyPrint for Constraint {
    fn print_into(&self, acc: &mut String) {
        acc.push('(');
        acc.push(self.get_label());
        acc.push(',');
        acc.push_str(&self.get_expr().to_string());
        acc.push(')');
    }
}

impl PrettyPrint for [Constraint] {
    fn print_into(&self, acc: &mut String) {
        acc.push('[');
        for (idx, constraint) in self.iter().enumerate() {
            if idx > 0 {
                acc.push(',');
            }
            constraint.print_into(acc);
        }
        acc.push(']');
    }
}

impl PrettyPrint for ConstraintsList {
    fn print_into(&self, acc: &mut String) {
        acc.push_str("{\n");
        match self.get_dims_involved() {
            Some(dims) => {
                acc.push_str(&format!("Involved Dims = {}\n", dims));
                acc.push_str("Constraints = ");
                self.get_constraints().print_into(acc);
                acc.push('\n');
            }
            None => acc.push_str("Involved Dims = -1\nConstraints = empty\n"),
        }
        acc.push('}');
    }
}

/// Renders the kind and label layout, followed by one line per recorded binding.
impl PrettyPrint for RelationMatcher {
    fn print_into(&self, acc: &mut String) {
        acc.push_str(&self.get_kind().to_string());
        acc.push('(');
        for (idx, label) in self.get_labels().iter().enumerate() {
            if idx > 0 {
                acc.push_str(", ");
            }
            acc.push(*label);
        }
        acc.push(')');
        if self.is_set() {
            for binding in self.get_bindings() {
                acc.push_str("\n  ");
                for (idx, (label, expr)) in self.get_labels().iter().zip(binding).enumerate() {
                    if idx > 0 {
                        acc.push_str(", ");
                    }
                    acc.push(*label);
                    acc.push_str(" = ");
                    acc.push_str(&expr.linear_form());
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::{
        affine::{AffineExpr, Tuple},
        constraints::{ConstraintsList, build_matcher_constraints},
        node_matcher::{Capture, any, domain, filter, filter_if, leaf, sequence_capture},
        relation::{AccessMap, UnionMap},
        relation_matcher::read,
        schedule_tree::{ScheduleNodeType, ScheduleTree},
    };

    use super::pretty_print;

    #[test]
    fn tree_test() {
        let mut tree = ScheduleTree::new(ScheduleNodeType::Domain);
        let seq = tree.add_child(tree.root_id(), ScheduleNodeType::Sequence);
        let f = tree.add_annotated_child(seq, ScheduleNodeType::Filter, "S1");
        tree.add_child(f, ScheduleNodeType::Leaf);
        assert_eq!(
            pretty_print(&tree.root()),
            "domain\n  sequence\n    filter S1\n      leaf\n"
        );
    }

    #[test]
    fn matcher_test() {
        let seq = Capture::new("seq");
        let m = domain(sequence_capture(
            &seq,
            vec![filter_if(|_| true, leaf()), filter(any())],
        ));
        assert_eq!(
            pretty_print(&m),
            "domain(sequence@seq(filter?(leaf()), filter(any())))"
        );
    }

    #[test]
    fn constraints_test() {
        let s = Rc::new(Tuple::new("S", vec!["i".to_string()]));
        let i = AffineExpr::dim(s.clone(), 0);
        let accesses = UnionMap::of_vec(vec![AccessMap::new(s, "A", vec![i + 1])]);
        let list = build_matcher_constraints(&read(&['a']), &accesses);
        assert_eq!(
            pretty_print(&list),
            "{\nInvolved Dims = 1\nConstraints = [(a,{ S[i] -> [(i + 1)] })]\n}"
        );
        assert_eq!(
            pretty_print(&ConstraintsList::empty()),
            "{\nInvolved Dims = -1\nConstraints = empty\n}"
        );
    }

    #[test]
    fn relation_matcher_test() {
        let s = Rc::new(Tuple::new("S", vec!["i".to_string(), "j".to_string()]));
        let i = AffineExpr::dim(s.clone(), 0);
        let j = AffineExpr::dim(s.clone(), 1);
        let accesses = UnionMap::of_vec(vec![AccessMap::new(s, "A", vec![i, j + 2])]);
        let mut m = read(&['i', 'j']);
        assert_eq!(pretty_print(&m), "read(i, j)");

        let list = build_matcher_constraints(&m, &accesses);
        m.set_dims(list.get_constraints());
        m.set();
        assert_eq!(pretty_print(&m), "read(i, j)\n  i = i, j = j + 2");
    }
}
